//! Authorization policy.
//!
//! Every role check in the workspace goes through [`decide`]. It is a
//! pure function of its inputs: no I/O, no caching, safe to call on
//! every render or request.

use std::fmt;

use crate::models::LocationId;
use crate::models::role::Role;

/// A named permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ReadResource,
    CreateResource,
    EditResource,
    DeleteResource,
    ManageUsers,
    AccessLocation(LocationId),
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::ReadResource => f.write_str("read-resource"),
            Capability::CreateResource => f.write_str("create-resource"),
            Capability::EditResource => f.write_str("edit-resource"),
            Capability::DeleteResource => f.write_str("delete-resource"),
            Capability::ManageUsers => f.write_str("manage-users"),
            Capability::AccessLocation(id) => write!(f, "access-location({id})"),
        }
    }
}

/// Identity attributes the policy needs beyond the role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyContext {
    /// `None` is treated as "all locations".
    pub assigned_location: Option<LocationId>,
}

impl PolicyContext {
    pub fn assigned_to(location: LocationId) -> Self {
        Self {
            assigned_location: Some(location),
        }
    }
}

/// Decide whether `role` holds `capability`.
///
/// `None` is the unauthenticated role and is denied everything.
pub fn decide(role: Option<Role>, capability: Capability, context: &PolicyContext) -> bool {
    let Some(role) = role else {
        return false;
    };

    match capability {
        Capability::ReadResource => true,
        Capability::CreateResource | Capability::EditResource => {
            matches!(role, Role::Administrator | Role::Operator)
        }
        Capability::DeleteResource | Capability::ManageUsers => role == Role::Administrator,
        Capability::AccessLocation(location) => match role {
            Role::Administrator => true,
            Role::Operator | Role::Viewer => context
                .assigned_location
                .is_none_or(|assigned| assigned == location),
        },
    }
}

/// `true` iff every capability is granted.
///
/// An empty list is granted to any authenticated role and still denied
/// to the unauthenticated one.
pub fn decide_all(role: Option<Role>, capabilities: &[Capability], context: &PolicyContext) -> bool {
    if role.is_none() {
        return false;
    }
    capabilities
        .iter()
        .all(|capability| decide(role, *capability, context))
}

/// Edit permission for a record that may be pinned to a location.
pub fn can_modify_in_location(
    role: Option<Role>,
    context: &PolicyContext,
    location: Option<LocationId>,
) -> bool {
    if !decide(role, Capability::EditResource, context) {
        return false;
    }
    match location {
        Some(location) => decide(role, Capability::AccessLocation(location), context),
        None => true,
    }
}

/// The one location `role` is confined to, or `None` if it may access
/// every location.
pub fn confined_location(role: Option<Role>, context: &PolicyContext) -> Option<LocationId> {
    match role {
        Some(Role::Operator | Role::Viewer) => context.assigned_location,
        _ => None,
    }
}

/// Edit permission for a record moving from `current` to `target`.
///
/// Both ends must be modifiable, and a confined role cannot take a
/// record out of its location by clearing the location.
pub fn can_move_between_locations(
    role: Option<Role>,
    context: &PolicyContext,
    current: Option<LocationId>,
    target: Option<LocationId>,
) -> bool {
    let leaves_confinement =
        target.is_none() && current.is_some() && confined_location(role, context).is_some();
    can_modify_in_location(role, context, current)
        && can_modify_in_location(role, context, target)
        && !leaves_confinement
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_CAPABILITIES: [Capability; 7] = [
        Capability::ReadResource,
        Capability::CreateResource,
        Capability::EditResource,
        Capability::DeleteResource,
        Capability::ManageUsers,
        Capability::AccessLocation(1),
        Capability::AccessLocation(42),
    ];

    fn unrestricted() -> PolicyContext {
        PolicyContext::default()
    }

    #[test]
    fn unauthenticated_is_denied_everything() {
        for context in [unrestricted(), PolicyContext::assigned_to(1)] {
            for capability in ALL_CAPABILITIES {
                assert!(!decide(None, capability, &context), "{capability} leaked");
            }
        }
    }

    #[test]
    fn administrator_is_granted_everything() {
        // Even an administrator pinned to a location keeps global access.
        for context in [unrestricted(), PolicyContext::assigned_to(7)] {
            for capability in ALL_CAPABILITIES {
                assert!(decide(Some(Role::Administrator), capability, &context));
            }
        }
    }

    #[test]
    fn viewer_reads_but_never_writes() {
        let ctx = unrestricted();
        assert!(decide(Some(Role::Viewer), Capability::ReadResource, &ctx));
        assert!(!decide(Some(Role::Viewer), Capability::CreateResource, &ctx));
        assert!(!decide(Some(Role::Viewer), Capability::EditResource, &ctx));
        assert!(!decide(Some(Role::Viewer), Capability::DeleteResource, &ctx));
        assert!(!decide(Some(Role::Viewer), Capability::ManageUsers, &ctx));
    }

    #[test]
    fn operator_edits_but_cannot_delete() {
        let ctx = unrestricted();
        assert!(decide(Some(Role::Operator), Capability::EditResource, &ctx));
        assert!(decide(Some(Role::Operator), Capability::CreateResource, &ctx));
        assert!(!decide(Some(Role::Operator), Capability::DeleteResource, &ctx));
        assert!(!decide(Some(Role::Operator), Capability::ManageUsers, &ctx));
    }

    #[test]
    fn location_access_follows_assignment() {
        let ctx = PolicyContext::assigned_to(5);
        for role in [Role::Operator, Role::Viewer] {
            assert!(decide(Some(role), Capability::AccessLocation(5), &ctx));
            assert!(!decide(Some(role), Capability::AccessLocation(6), &ctx));
        }
        for id in [1, 5, 6, 1_000] {
            assert!(decide(
                Some(Role::Administrator),
                Capability::AccessLocation(id),
                &ctx
            ));
        }
    }

    #[test]
    fn unassigned_identity_reaches_all_locations() {
        let ctx = unrestricted();
        assert!(decide(Some(Role::Viewer), Capability::AccessLocation(99), &ctx));
        assert!(decide(Some(Role::Operator), Capability::AccessLocation(3), &ctx));
    }

    #[test]
    fn decisions_are_deterministic() {
        let ctx = PolicyContext::assigned_to(2);
        for _ in 0..100 {
            assert!(!decide(Some(Role::Operator), Capability::AccessLocation(3), &ctx));
        }
    }

    #[test]
    fn decide_all_requires_every_capability() {
        let ctx = PolicyContext::assigned_to(3);
        let needed = [Capability::EditResource, Capability::AccessLocation(3)];
        assert!(decide_all(Some(Role::Operator), &needed, &ctx));
        let needed = [Capability::EditResource, Capability::AccessLocation(4)];
        assert!(!decide_all(Some(Role::Operator), &needed, &ctx));
        assert!(decide_all(Some(Role::Viewer), &[], &ctx));
        assert!(!decide_all(None, &[], &ctx));
    }

    #[test]
    fn modify_in_location_combines_edit_and_location() {
        let ctx = PolicyContext::assigned_to(3);
        assert!(can_modify_in_location(Some(Role::Operator), &ctx, Some(3)));
        assert!(!can_modify_in_location(Some(Role::Operator), &ctx, Some(4)));
        assert!(can_modify_in_location(Some(Role::Operator), &ctx, None));
        assert!(!can_modify_in_location(Some(Role::Viewer), &ctx, Some(3)));
    }

    #[test]
    fn moves_must_stay_within_reach() {
        let pinned = PolicyContext::assigned_to(4);
        let operator = Some(Role::Operator);
        assert!(can_move_between_locations(operator, &pinned, Some(4), Some(4)));
        assert!(can_move_between_locations(operator, &pinned, None, Some(4)));
        assert!(can_move_between_locations(operator, &pinned, None, None));
        assert!(!can_move_between_locations(operator, &pinned, Some(7), Some(4)));
        assert!(!can_move_between_locations(operator, &pinned, Some(4), Some(7)));
        assert!(!can_move_between_locations(operator, &pinned, Some(4), None));

        assert!(can_move_between_locations(operator, &unrestricted(), Some(7), None));
        assert!(can_move_between_locations(
            Some(Role::Administrator),
            &pinned,
            Some(7),
            None
        ));
        assert!(!can_move_between_locations(
            Some(Role::Viewer),
            &unrestricted(),
            None,
            None
        ));
    }

    #[test]
    fn only_non_administrators_are_confined() {
        let ctx = PolicyContext::assigned_to(8);
        assert_eq!(confined_location(Some(Role::Viewer), &ctx), Some(8));
        assert_eq!(confined_location(Some(Role::Operator), &ctx), Some(8));
        assert_eq!(confined_location(Some(Role::Administrator), &ctx), None);
        assert_eq!(confined_location(Some(Role::Viewer), &unrestricted()), None);
    }

    #[test]
    fn capability_display_uses_kebab_names() {
        assert_eq!(Capability::ManageUsers.to_string(), "manage-users");
        assert_eq!(
            Capability::AccessLocation(4).to_string(),
            "access-location(4)"
        );
    }
}
