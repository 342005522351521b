//! Capability gate for conditionally shown actions (edit buttons,
//! delete links, admin menus).

use camwatch_core::models::role::Role;
use camwatch_core::policy::Capability;

use crate::session::AuthContext;

/// Every condition that is set must hold. An empty gate admits any
/// authenticated session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gate {
    pub role: Option<Role>,
    pub roles: Vec<Role>,
    pub permission: Option<Capability>,
}

impl Gate {
    pub fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            ..Default::default()
        }
    }

    pub fn any_role(roles: &[Role]) -> Self {
        Self {
            roles: roles.to_vec(),
            ..Default::default()
        }
    }

    pub fn permission(capability: Capability) -> Self {
        Self {
            permission: Some(capability),
            ..Default::default()
        }
    }

    pub fn allows(&self, auth: &dyn AuthContext) -> bool {
        let Some(identity) = auth.identity() else {
            return false;
        };
        if self.role.is_some_and(|role| role != identity.role) {
            return false;
        }
        if !self.roles.is_empty() && !self.roles.contains(&identity.role) {
            return false;
        }
        self.permission.is_none_or(|capability| auth.can(capability))
    }

    /// `children` if the gate admits the session, else `fallback`.
    pub fn render<T>(&self, auth: &dyn AuthContext, children: T, fallback: Option<T>) -> Option<T> {
        if self.allows(auth) {
            Some(children)
        } else {
            fallback
        }
    }
}
