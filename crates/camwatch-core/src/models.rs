//! Domain models for camwatch.
//!
//! Field names follow the JSON payloads of the camera management API so
//! the same types serve as request bodies and response rows.

pub mod camera;
pub mod camera_action;
pub mod location;
pub mod nvr;
pub mod role;
pub mod user;

pub type CameraId = i64;
pub type LocationId = i64;
pub type NvrId = i64;
pub type ActionId = i64;
pub type UserId = i64;
