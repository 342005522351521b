//! Location domain model.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::LocationId;
use super::camera::CameraSummary;
use crate::validation::not_blank;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub id: LocationId,
    #[serde(flatten)]
    pub fields: LocationInput,
    /// Present when fetched with `include_cameras`; `None` means unknown.
    #[serde(default)]
    pub cameras: Option<Vec<CameraSummary>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct LocationInput {
    #[validate(custom(function = "not_blank", message = "Location name is required"))]
    pub location_name: String,
    /// Building, Room, Outdoor, ...
    #[serde(default)]
    pub location_type: Option<String>,
    #[serde(default)]
    pub item_location: Option<String>,
    #[serde(default)]
    pub old_location: Option<String>,
}

impl LocationInput {
    pub fn new(location_name: impl Into<String>) -> Self {
        Self {
            location_name: location_name.into(),
            location_type: None,
            item_location: None,
            old_location: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LocationFilter {
    /// Matches name, type, item location and old location.
    pub search: Option<String>,
    pub location_type: Option<String>,
    pub include_cameras: bool,
}

impl LocationFilter {
    pub const SORT_FIELDS: &'static [&'static str] =
        &["id", "location_name", "location_type", "item_location"];
}
