//! Camera action (history log) domain model.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ActionId, CameraId};
use crate::validation::not_blank;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraAction {
    pub id: ActionId,
    pub camera_id: CameraId,
    pub action_type: String,
    #[serde(default)]
    pub old_value: Option<String>,
    #[serde(default)]
    pub new_value: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Naive UTC timestamp assigned by the server.
    pub action_date: NaiveDateTime,
    #[serde(default)]
    pub camera: Option<ActionCamera>,
}

/// Camera columns shown next to an action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionCamera {
    pub id: CameraId,
    #[serde(default)]
    pub camera_name: Option<String>,
    pub serial_no: String,
    #[serde(default)]
    pub rta_tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct CreateCameraAction {
    #[validate(range(min = 1, message = "Camera is required"))]
    pub camera_id: CameraId,
    /// e.g. "Status Change", "Maintenance", "Location Change".
    #[validate(custom(function = "not_blank", message = "Action type is required"))]
    pub action_type: String,
    #[serde(default)]
    pub old_value: Option<String>,
    #[serde(default)]
    pub new_value: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update of a logged action (`PUT /actions/{id}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Validate)]
pub struct UpdateCameraAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "not_blank", message = "Action type is required"))]
    pub action_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ActionFilter {
    pub camera_id: Option<CameraId>,
    pub action_type: Option<String>,
    /// Matches action type, old/new values and notes.
    pub search: Option<String>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub include_camera: bool,
}

impl ActionFilter {
    pub const SORT_FIELDS: &'static [&'static str] =
        &["id", "action_date", "action_type", "camera_id"];
}
