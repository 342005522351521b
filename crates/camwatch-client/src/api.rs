//! Authenticated API client and the HTTP credential verifier.

use std::sync::Arc;

use camwatch_core::error::{CamwatchError, CamwatchResult};
use camwatch_core::models::user::{Identity, LoginRequest, LoginResponse};
use camwatch_core::models::LocationId;
use camwatch_core::policy::{self, Capability};
use camwatch_core::repository::{CredentialApi, Pagination, Sort};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::status_error;
use crate::session::{AuthContext, AuthHeader};
use crate::transport::{ApiRequest, ApiResponse, Method, Transport};

/// Escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-encode `value` so it stays one path segment.
pub fn segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT).to_string()
}

/// Query-string builder that skips absent values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.0.push((key.to_string(), value.to_string()));
        self
    }

    pub fn opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Adds a trimmed, non-empty string value.
    pub fn text(self, key: &str, value: Option<&str>) -> Self {
        self.opt(key, value.map(str::trim).filter(|v| !v.is_empty()))
    }

    pub fn flag(self, key: &str, on: bool) -> Self {
        if on { self.param(key, true) } else { self }
    }

    pub fn page(self, pagination: Pagination) -> Self {
        self.param("skip", pagination.skip)
            .param("limit", pagination.limit)
    }

    /// Adds `sort_by`/`sort_order`; the field must be one of `allowed`.
    pub fn sort(self, sort: &Sort, allowed: &[&str]) -> CamwatchResult<Self> {
        let Some(field) = &sort.field else {
            return Ok(self);
        };
        if !allowed.contains(&field.as_str()) {
            return Err(CamwatchError::validation(format!(
                "Cannot sort by '{field}'; expected one of: {}",
                allowed.join(", ")
            )));
        }
        Ok(self
            .param("sort_by", field)
            .param("sort_order", sort.order.as_str()))
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.0
    }
}

fn encode<B: Serialize>(body: &B) -> CamwatchResult<serde_json::Value> {
    serde_json::to_value(body).map_err(|e| CamwatchError::Internal(format!("encoding body: {e}")))
}

fn decode<R: DeserializeOwned>(response: &ApiResponse) -> CamwatchResult<R> {
    response.decode().map_err(CamwatchError::from)
}

/// Client for the resource API.
///
/// Attaches the session's bearer token to every request and applies the
/// HTTP status convention centrally; a 401 ends the session.
pub struct ApiClient<T: Transport> {
    transport: T,
    auth: Arc<dyn AuthContext>,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, auth: Arc<dyn AuthContext>) -> Self {
        Self { transport, auth }
    }

    pub fn auth(&self) -> &dyn AuthContext {
        self.auth.as_ref()
    }

    fn signed_in(&self) -> CamwatchResult<Identity> {
        self.auth
            .identity()
            .ok_or_else(|| CamwatchError::AuthenticationFailed {
                reason: "Not authenticated".into(),
            })
    }

    /// The one location this session is confined to, if any.
    pub fn confined_location(&self) -> Option<LocationId> {
        self.auth.identity().and_then(|identity| {
            policy::confined_location(Some(identity.role), &identity.policy_context())
        })
    }

    /// Edit check for a record that sits in `current` and ends up in
    /// `target`.
    pub fn require_move(
        &self,
        current: Option<LocationId>,
        target: Option<LocationId>,
    ) -> CamwatchResult<()> {
        self.require(Capability::EditResource)?;
        let identity = self.signed_in()?;
        if policy::can_move_between_locations(
            Some(identity.role),
            &identity.policy_context(),
            current,
            target,
        ) {
            Ok(())
        } else {
            Err(CamwatchError::AuthorizationDenied {
                reason: "Your account can only modify records in its assigned location".into(),
            })
        }
    }

    /// Client-side capability check, before any request.
    pub fn require(&self, capability: Capability) -> CamwatchResult<()> {
        self.signed_in()?;
        if self.auth.can(capability) {
            Ok(())
        } else {
            Err(CamwatchError::AuthorizationDenied {
                reason: format!("Your role does not permit {capability}"),
            })
        }
    }

    async fn execute(&self, request: ApiRequest) -> CamwatchResult<ApiResponse> {
        let header: AuthHeader = self
            .auth
            .auth_header()
            .ok_or_else(|| CamwatchError::AuthenticationFailed {
                reason: "Not authenticated".into(),
            })?;
        let request = request.with_header(AuthHeader::NAME, header.value());
        let (method, path) = (request.method, request.path.clone());

        let response = self.transport.send(request).await.map_err(|e| {
            warn!(%method, %path, error = %e, "request failed");
            CamwatchError::from(e)
        })?;
        debug!(%method, %path, status = response.status, "response");

        if response.is_success() {
            return Ok(response);
        }
        if response.status == 401 {
            self.auth.reject(&header, "token rejected by server");
        }
        Err(status_error(response.status, &path, &response.body))
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str, query: Query) -> CamwatchResult<R> {
        let request = ApiRequest::new(Method::Get, path).with_query(query.into_pairs());
        decode(&self.execute(request).await?)
    }

    pub async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> CamwatchResult<R> {
        let request = ApiRequest::new(Method::Post, path).with_body(encode(body)?);
        decode(&self.execute(request).await?)
    }

    pub async fn put<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> CamwatchResult<R> {
        let request = ApiRequest::new(Method::Put, path).with_body(encode(body)?);
        decode(&self.execute(request).await?)
    }

    /// `PUT` whose response body is ignored.
    pub async fn put_unit<B: Serialize>(&self, path: &str, body: &B) -> CamwatchResult<()> {
        let request = ApiRequest::new(Method::Put, path).with_body(encode(body)?);
        self.execute(request).await.map(|_| ())
    }

    pub async fn delete(&self, path: &str) -> CamwatchResult<()> {
        self.execute(ApiRequest::new(Method::Delete, path))
            .await
            .map(|_| ())
    }
}

/// [`CredentialApi`] over `POST /auth/login` and `GET /auth/me`.
///
/// Failures here are reported to the caller and never end a session:
/// the session holder decides what a rejected credential means.
#[derive(Debug, Clone)]
pub struct HttpCredentials<T: Transport> {
    transport: T,
}

impl<T: Transport> HttpCredentials<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    async fn call(&self, request: ApiRequest) -> CamwatchResult<ApiResponse> {
        let path = request.path.clone();
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(status_error(response.status, &path, &response.body))
        }
    }
}

impl<T: Transport> CredentialApi for HttpCredentials<T> {
    async fn login(&self, request: LoginRequest) -> CamwatchResult<LoginResponse> {
        let request = ApiRequest::new(Method::Post, "/auth/login").with_body(encode(&request)?);
        decode(&self.call(request).await?)
    }

    async fn profile(&self, token: &str) -> CamwatchResult<Identity> {
        let request = ApiRequest::new(Method::Get, "/auth/me")
            .with_header(AuthHeader::NAME, format!("Bearer {token}"));
        decode(&self.call(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_escapes_url_delimiters() {
        assert_eq!(segment("Rack #2/B?x"), "Rack%20%232%2FB%3Fx");
        assert_eq!(segment("100%"), "100%25");
        assert_eq!(segment("nvr-01.local"), "nvr-01.local");
    }

    #[test]
    fn blank_text_is_skipped() {
        let pairs = Query::new()
            .text("search", Some("  "))
            .text("brand", Some(" Axis "))
            .flag("include_cameras", false)
            .into_pairs();
        assert_eq!(pairs, vec![("brand".to_string(), "Axis".to_string())]);
    }
}
