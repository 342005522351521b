//! Transport errors and the HTTP status convention.

use camwatch_core::error::CamwatchError;
use serde_json::Value;
use thiserror::Error;

/// Failure to obtain any HTTP response at all.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("could not connect: {0}")]
    Connect(String),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

impl From<TransportError> for CamwatchError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Decode(msg) => CamwatchError::Internal(format!("invalid response body: {msg}")),
            other => CamwatchError::Network(other.to_string()),
        }
    }
}

/// Messages carried in an error body.
///
/// Understands `{"detail": "..."}` and the list form
/// `{"detail": [{"msg": "..."}]}` used for field validation errors.
pub fn error_messages(body: &[u8]) -> Vec<String> {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        let text = String::from_utf8_lossy(body).trim().to_string();
        return if text.is_empty() { Vec::new() } else { vec![text] };
    };
    match value.get("detail") {
        Some(Value::String(detail)) => vec![detail.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                other => other.get("msg").and_then(Value::as_str).map(str::to_string),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Map a non-2xx response onto the error taxonomy.
///
/// `path` names the resource for 404s (`/cameras/7` becomes entity
/// `cameras`, id `7`).
pub fn status_error(status: u16, path: &str, body: &[u8]) -> CamwatchError {
    let mut messages = error_messages(body);
    let first_message = messages.first().cloned();
    let first = |fallback: &str| first_message.clone().unwrap_or_else(|| fallback.to_string());

    match status {
        401 => CamwatchError::AuthenticationFailed {
            reason: first("Could not validate credentials"),
        },
        403 => CamwatchError::AuthorizationDenied {
            reason: first("Access denied"),
        },
        404 => {
            let mut segments = path.trim_matches('/').rsplitn(2, '/');
            let id = segments.next().unwrap_or_default().to_string();
            let entity = segments.next().unwrap_or("resource").to_string();
            CamwatchError::NotFound { entity, id }
        }
        400 | 422 => {
            if messages.is_empty() {
                messages.push("Request was rejected".into());
            }
            CamwatchError::Validation { messages }
        }
        _ => CamwatchError::Server {
            status,
            message: first("Unexpected server error"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_and_list() {
        assert_eq!(
            error_messages(br#"{"detail":"Location not found"}"#),
            vec!["Location not found"]
        );
        assert_eq!(
            error_messages(br#"{"detail":[{"loc":["body","ip"],"msg":"bad ip"},{"msg":"x"}]}"#),
            vec!["bad ip", "x"]
        );
        assert_eq!(error_messages(b"Bad Gateway"), vec!["Bad Gateway"]);
        assert!(error_messages(b"").is_empty());
    }

    #[test]
    fn statuses_map_onto_taxonomy() {
        assert!(matches!(
            status_error(401, "/auth/me", b""),
            CamwatchError::AuthenticationFailed { reason } if reason == "Could not validate credentials"
        ));
        assert!(matches!(
            status_error(403, "/cameras", br#"{"detail":"nope"}"#),
            CamwatchError::AuthorizationDenied { reason } if reason == "nope"
        ));
        assert!(matches!(
            status_error(404, "/cameras/7", b""),
            CamwatchError::NotFound { entity, id } if entity == "cameras" && id == "7"
        ));
        assert!(matches!(
            status_error(422, "/cameras", b"{}"),
            CamwatchError::Validation { messages } if messages.len() == 1
        ));
        assert!(matches!(
            status_error(502, "/nvrs", b""),
            CamwatchError::Server { status: 502, .. }
        ));
    }

    #[test]
    fn transport_failures_are_network_errors() {
        let err: CamwatchError = TransportError::Timeout.into();
        assert!(matches!(err, CamwatchError::Network(_)));
    }
}
