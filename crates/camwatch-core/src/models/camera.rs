//! Camera domain model.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{CameraId, LocationId, NvrId};
use crate::validation::{mac_address_shape, not_blank};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Camera {
    pub id: CameraId,
    #[serde(flatten)]
    pub fields: CameraInput,
    /// Present when listed with `include_relations`.
    #[serde(default)]
    pub location: Option<LocationInfo>,
    #[serde(default)]
    pub nvr: Option<NvrInfo>,
}

/// Writable camera fields (create and full update).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct CameraInput {
    #[validate(custom(function = "not_blank", message = "Serial number is required"))]
    pub serial_no: String,
    #[serde(default)]
    pub item_description: Option<String>,
    #[serde(default)]
    pub model_no: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub rta_tag: Option<String>,
    #[serde(default)]
    pub camera_name: Option<String>,
    #[serde(default)]
    #[validate(ip(v4, message = "IP address must be a valid IPv4 address"))]
    pub ip_address: Option<String>,
    #[serde(default)]
    #[validate(custom(
        function = "mac_address_shape",
        message = "MAC address must look like AA:BB:CC:DD:EE:FF"
    ))]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub sd_card: bool,
    #[serde(default)]
    #[validate(range(min = 0, message = "SD capacity cannot be negative"))]
    pub sd_capacity: Option<i64>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_camera_status")]
    pub camera_status: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default = "default_is_asset")]
    pub is_asset: bool,
    #[serde(default)]
    pub location_id: Option<LocationId>,
    #[serde(default)]
    pub nvr_id: Option<NvrId>,
}

fn default_status() -> String {
    "Inactive".into()
}

fn default_camera_status() -> String {
    "Offline".into()
}

fn default_is_asset() -> bool {
    true
}

impl CameraInput {
    /// A camera with only the required serial number and API defaults.
    pub fn new(serial_no: impl Into<String>) -> Self {
        Self {
            serial_no: serial_no.into(),
            item_description: None,
            model_no: None,
            brand: None,
            rta_tag: None,
            camera_name: None,
            ip_address: None,
            mac_address: None,
            firmware_version: None,
            protocol: None,
            sd_card: false,
            sd_capacity: None,
            status: default_status(),
            camera_status: default_camera_status(),
            details: None,
            comments: None,
            is_asset: default_is_asset(),
            location_id: None,
            nvr_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationInfo {
    pub id: LocationId,
    pub location_name: String,
    #[serde(default)]
    pub location_type: Option<String>,
    #[serde(default)]
    pub item_location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NvrInfo {
    pub id: NvrId,
    pub nvr_name: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub channel_number: Option<String>,
}

/// Camera row embedded in location and NVR responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraSummary {
    pub id: CameraId,
    #[serde(default)]
    pub camera_name: Option<String>,
    pub serial_no: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub camera_status: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
}

/// Filters for `GET /cameras`.
#[derive(Debug, Clone, Default)]
pub struct CameraFilter {
    /// Matches camera name, serial number, RTA tag, IP address and model.
    pub search: Option<String>,
    pub status: Option<String>,
    pub camera_status: Option<String>,
    pub location_id: Option<LocationId>,
    pub nvr_id: Option<NvrId>,
    pub brand: Option<String>,
    pub include_relations: bool,
}

impl CameraFilter {
    pub const SORT_FIELDS: &'static [&'static str] = &[
        "id",
        "camera_name",
        "serial_no",
        "status",
        "camera_status",
        "brand",
        "ip_address",
        "rta_tag",
    ];
}
