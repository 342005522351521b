//! Input validation run before any request is sent.
//!
//! Input models derive [`Validate`]. The helpers here fold every failure
//! into one [`CamwatchError::Validation`] so a form can show all its
//! messages at once.

use validator::{Validate, ValidateIp, ValidationError, ValidationErrors};

use crate::error::{CamwatchError, CamwatchResult};
use crate::models::user::{CreateUser, PasswordChange};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 100;

/// Fails on empty or whitespace-only text.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("required"))
    } else {
        Ok(())
    }
}

pub fn mac_address_shape(value: &str) -> Result<(), ValidationError> {
    if is_mac_address(value) {
        Ok(())
    } else {
        Err(ValidationError::new("mac_address"))
    }
}

pub fn username_charset(value: &str) -> Result<(), ValidationError> {
    if value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_charset"))
    }
}

pub fn is_ipv4(value: &str) -> bool {
    value.validate_ipv4()
}

/// Six hex octets separated by `:` or `-` (not mixed).
pub fn is_mac_address(value: &str) -> bool {
    let separator = if value.contains(':') { ':' } else { '-' };
    let octets: Vec<&str> = value.split(separator).collect();
    octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()))
}

pub fn password_violations(value: &str, min_length: usize) -> Vec<String> {
    let mut messages = Vec::new();
    let length = value.chars().count();
    if length < min_length {
        messages.push(format!(
            "Password must be at least {min_length} characters long"
        ));
    }
    if length > MAX_PASSWORD_LENGTH {
        messages.push(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} characters long"
        ));
    }
    if !value.chars().any(|c| c.is_ascii_uppercase()) {
        messages.push("Password must contain at least one uppercase letter".into());
    }
    if !value.chars().any(|c| c.is_ascii_lowercase()) {
        messages.push("Password must contain at least one lowercase letter".into());
    }
    if !value.chars().any(|c| c.is_ascii_digit()) {
        messages.push("Password must contain at least one digit".into());
    }
    messages
}

/// Messages ordered by field name, then in the order each field's rules ran.
fn messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));
    fields
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect()
}

impl From<ValidationErrors> for CamwatchError {
    fn from(errors: ValidationErrors) -> Self {
        CamwatchError::Validation {
            messages: messages(&errors),
        }
    }
}

fn finish(derived: Result<(), ValidationErrors>, extra: Vec<String>) -> CamwatchResult<()> {
    let mut all = match derived {
        Ok(()) => Vec::new(),
        Err(errors) => messages(&errors),
    };
    all.extend(extra);
    if all.is_empty() {
        Ok(())
    } else {
        Err(CamwatchError::Validation { messages: all })
    }
}

/// Run the rules derived on `input`.
pub fn check<T: Validate>(input: &T) -> CamwatchResult<()> {
    input.validate().map_err(CamwatchError::from)
}

/// Derived rules plus the password policy, whose minimum length is
/// configurable.
pub fn validate_new_user(input: &CreateUser, min_password_length: usize) -> CamwatchResult<()> {
    finish(
        input.validate(),
        password_violations(&input.password, min_password_length),
    )
}

/// `require_current` is set when a user changes their own password.
pub fn validate_password_change(
    input: &PasswordChange,
    require_current: bool,
    min_password_length: usize,
) -> CamwatchResult<()> {
    let mut extra = Vec::new();
    if require_current && input.current_password.is_empty() {
        extra.push("Current password is required".to_string());
    }
    extra.extend(password_violations(&input.new_password, min_password_length));
    finish(Ok(()), extra)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::camera::CameraInput;
    use crate::models::camera_action::{CreateCameraAction, UpdateCameraAction};
    use crate::models::location::LocationInput;
    use crate::models::nvr::NvrInput;
    use crate::models::role::Role;
    use crate::models::user::{LoginRequest, UpdateUser};

    fn messages_of(result: CamwatchResult<()>) -> Vec<String> {
        match result {
            Err(CamwatchError::Validation { messages }) => messages,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn new_user(username: &str, full_name: &str, password: &str) -> CreateUser {
        CreateUser {
            username: username.into(),
            email: "a@b.io".into(),
            full_name: full_name.into(),
            password: password.into(),
            role: Role::Viewer,
            assigned_location_id: None,
        }
    }

    #[test]
    fn ip_address_shape() {
        assert!(is_ipv4("192.168.1.20"));
        assert!(!is_ipv4("192.168.1"));
        assert!(!is_ipv4("256.1.1.1"));
        assert!(!is_ipv4("cam-01.local"));
    }

    #[test]
    fn mac_address_shape_accepts_one_separator() {
        assert!(is_mac_address("AA:BB:CC:00:11:22"));
        assert!(is_mac_address("aa-bb-cc-00-11-22"));
        assert!(!is_mac_address("AA:BB:CC:00:11"));
        assert!(!is_mac_address("AA:BB-CC:00:11:22"));
        assert!(!is_mac_address("GG:BB:CC:00:11:22"));
    }

    #[test]
    fn camera_collects_every_message() {
        let mut input = CameraInput::new("  ");
        input.ip_address = Some("10.0.0".into());
        input.mac_address = Some("nope".into());
        input.sd_capacity = Some(-1);
        let msgs = messages_of(check(&input));
        assert_eq!(
            msgs,
            vec![
                "IP address must be a valid IPv4 address",
                "MAC address must look like AA:BB:CC:DD:EE:FF",
                "SD capacity cannot be negative",
                "Serial number is required",
            ]
        );
    }

    #[test]
    fn absent_optional_fields_are_skipped() {
        let input = CameraInput::new("SN-1");
        assert!(check(&input).is_ok());

        let mut nvr = NvrInput::new("Rack A");
        assert!(check(&nvr).is_ok());
        nvr.ip_address = Some(String::new());
        assert_eq!(
            messages_of(check(&nvr)),
            vec!["IP address must be a valid IPv4 address"]
        );
    }

    #[test]
    fn location_and_nvr_names_are_required() {
        assert_eq!(
            messages_of(check(&LocationInput::new(" "))),
            vec!["Location name is required"]
        );
        assert_eq!(
            messages_of(check(&NvrInput::new(""))),
            vec!["NVR name is required"]
        );
    }

    #[test]
    fn password_policy() {
        assert!(password_violations("Secret123", MIN_PASSWORD_LENGTH).is_empty());
        assert_eq!(password_violations("short", MIN_PASSWORD_LENGTH).len(), 3);
        assert_eq!(password_violations("alllowercase1", MIN_PASSWORD_LENGTH).len(), 1);
    }

    #[test]
    fn password_has_an_upper_bound() {
        let long = format!("Aa1{}", "x".repeat(MAX_PASSWORD_LENGTH));
        assert_eq!(
            password_violations(&long, MIN_PASSWORD_LENGTH),
            vec!["Password must be at most 100 characters long"]
        );
        let exact = format!("Aa1{}", "x".repeat(MAX_PASSWORD_LENGTH - 3));
        assert!(password_violations(&exact, MIN_PASSWORD_LENGTH).is_empty());
    }

    #[test]
    fn new_user_lengths() {
        let msgs = messages_of(validate_new_user(
            &new_user("ab", "X", "Secret123"),
            MIN_PASSWORD_LENGTH,
        ));
        assert_eq!(
            msgs,
            vec![
                "Full name must be between 2 and 100 characters",
                "Username must be between 3 and 50 characters",
            ]
        );
    }

    #[test]
    fn new_user_reports_form_and_password_together() {
        let mut input = new_user("ops user", "Ops Person", "weak");
        input.email = "ops.example.com".into();
        let msgs = messages_of(validate_new_user(&input, MIN_PASSWORD_LENGTH));
        assert_eq!(msgs[0], "Email address is invalid");
        assert_eq!(
            msgs[1],
            "Username may only contain letters, digits, '.', '_' and '-'"
        );
        assert!(msgs[2..].iter().all(|m| m.starts_with("Password must")));
        assert_eq!(msgs.len(), 5);
    }

    #[test]
    fn email_shape() {
        let mut update = UpdateUser {
            email: Some("ops@example.com".into()),
            ..Default::default()
        };
        assert!(check(&update).is_ok());
        for bad in ["ops.example.com", "@example.com", "o ps@example.com"] {
            update.email = Some(bad.into());
            assert_eq!(messages_of(check(&update)), vec!["Email address is invalid"]);
        }
    }

    #[test]
    fn own_password_change_needs_current() {
        let change = PasswordChange {
            current_password: String::new(),
            new_password: "Secret123".into(),
        };
        assert!(validate_password_change(&change, false, MIN_PASSWORD_LENGTH).is_ok());
        let msgs = messages_of(validate_password_change(&change, true, MIN_PASSWORD_LENGTH));
        assert_eq!(msgs, vec!["Current password is required"]);
    }

    #[test]
    fn action_requires_camera_and_type() {
        let input = CreateCameraAction {
            camera_id: 0,
            action_type: String::new(),
            old_value: None,
            new_value: None,
            notes: None,
        };
        assert_eq!(
            messages_of(check(&input)),
            vec!["Action type is required", "Camera is required"]
        );

        let update = UpdateCameraAction {
            action_type: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(messages_of(check(&update)), vec!["Action type is required"]);
        assert!(check(&UpdateCameraAction::default()).is_ok());
    }

    #[test]
    fn blank_login_fields() {
        let request = LoginRequest {
            username: " ".into(),
            password: String::new(),
        };
        assert_eq!(
            messages_of(check(&request)),
            vec!["Password is required", "Username is required"]
        );
    }
}
