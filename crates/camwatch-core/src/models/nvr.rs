//! NVR device domain model.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::NvrId;
use super::camera::CameraSummary;
use crate::validation::not_blank;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NvrDevice {
    pub id: NvrId,
    #[serde(flatten)]
    pub fields: NvrInput,
    /// Present when fetched with `include_cameras`; `None` means unknown.
    #[serde(default)]
    pub cameras: Option<Vec<CameraSummary>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct NvrInput {
    #[validate(custom(function = "not_blank", message = "NVR name is required"))]
    pub nvr_name: String,
    #[serde(default)]
    #[validate(ip(v4, message = "IP address must be a valid IPv4 address"))]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub channel_number: Option<String>,
    #[serde(default)]
    pub switch_port: Option<String>,
}

impl NvrInput {
    pub fn new(nvr_name: impl Into<String>) -> Self {
        Self {
            nvr_name: nvr_name.into(),
            ip_address: None,
            channel_number: None,
            switch_port: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NvrFilter {
    /// Matches name, IP address, channel number and switch port.
    pub search: Option<String>,
    pub include_cameras: bool,
}

impl NvrFilter {
    pub const SORT_FIELDS: &'static [&'static str] =
        &["id", "nvr_name", "ip_address", "channel_number", "switch_port"];
}
