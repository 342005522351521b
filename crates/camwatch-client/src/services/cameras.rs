use std::sync::Arc;

use camwatch_core::error::{CamwatchError, CamwatchResult};
use camwatch_core::models::{CameraId, LocationId};
use camwatch_core::models::camera::{Camera, CameraFilter, CameraInput};
use camwatch_core::policy::Capability;
use camwatch_core::repository::{PaginatedResult, Pagination, Sort};
use camwatch_core::validation;
use tracing::info;

use super::PendingDeletion;
use crate::api::{ApiClient, Query};
use crate::transport::Transport;

pub struct CameraService<T: Transport> {
    api: Arc<ApiClient<T>>,
}

impl<T: Transport> Clone for CameraService<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
        }
    }
}

impl<T: Transport> CameraService<T> {
    pub fn new(api: Arc<ApiClient<T>>) -> Self {
        Self { api }
    }

    fn require_location(&self, location: Option<LocationId>) -> CamwatchResult<()> {
        match location {
            Some(id) => self.api.require(Capability::AccessLocation(id)),
            None => Ok(()),
        }
    }

    /// List cameras. Sessions pinned to a location only see that
    /// location's cameras.
    pub async fn list(
        &self,
        filter: &CameraFilter,
        pagination: Pagination,
        sort: &Sort,
    ) -> CamwatchResult<PaginatedResult<Camera>> {
        self.api.require(Capability::ReadResource)?;

        let location_id = match filter.location_id {
            Some(id) => {
                self.api.require(Capability::AccessLocation(id))?;
                Some(id)
            }
            None => self.api.confined_location(),
        };

        let query = Query::new()
            .page(pagination)
            .text("search", filter.search.as_deref())
            .text("status", filter.status.as_deref())
            .text("camera_status", filter.camera_status.as_deref())
            .opt("location_id", location_id)
            .opt("nvr_id", filter.nvr_id)
            .text("brand", filter.brand.as_deref())
            .flag("include_relations", filter.include_relations)
            .sort(sort, CameraFilter::SORT_FIELDS)?;
        self.api.get("/cameras", query).await
    }

    pub async fn get(&self, id: CameraId) -> CamwatchResult<Camera> {
        self.api.require(Capability::ReadResource)?;
        let camera: Camera = self
            .api
            .get(&format!("/cameras/{id}"), Query::new().flag("include_relations", true))
            .await?;
        self.require_location(camera.fields.location_id)?;
        Ok(camera)
    }

    pub async fn create(&self, input: &CameraInput) -> CamwatchResult<Camera> {
        self.api.require(Capability::CreateResource)?;
        self.require_location(input.location_id)?;
        validation::check(input)?;

        let camera: Camera = self.api.post("/cameras", input).await?;
        info!(camera_id = camera.id, serial_no = %camera.fields.serial_no, "camera created");
        Ok(camera)
    }

    /// Replace `camera`'s fields with `input`. Both the camera's current
    /// location and the one in `input` must be within the session's reach.
    pub async fn update(&self, camera: &Camera, input: &CameraInput) -> CamwatchResult<Camera> {
        self.api.require_move(camera.fields.location_id, input.location_id)?;
        validation::check(input)?;

        let id = camera.id;
        let updated: Camera = self.api.put(&format!("/cameras/{id}"), input).await?;
        if updated.fields.location_id != camera.fields.location_id {
            info!(
                camera_id = id,
                from = ?camera.fields.location_id,
                to = ?updated.fields.location_id,
                "camera moved"
            );
        } else {
            info!(camera_id = id, "camera updated");
        }
        Ok(updated)
    }

    pub fn prepare_delete(&self, camera: &Camera) -> CamwatchResult<PendingDeletion<T>> {
        self.api.require(Capability::DeleteResource)?;
        let label = camera
            .fields
            .camera_name
            .clone()
            .unwrap_or_else(|| camera.fields.serial_no.clone());
        Ok(PendingDeletion::new(
            self.api.clone(),
            format!("/cameras/{}", camera.id),
            "Delete",
            format!("camera '{label}'"),
        ))
    }

    /// Look up by exact serial number.
    pub async fn find_by_serial(&self, serial_no: &str) -> CamwatchResult<Camera> {
        let filter = CameraFilter {
            search: Some(serial_no.to_string()),
            ..Default::default()
        };
        let page = self.list(&filter, Pagination::default(), &Sort::default()).await?;
        page.items
            .into_iter()
            .find(|c| c.fields.serial_no == serial_no)
            .ok_or_else(|| CamwatchError::not_found("cameras", serial_no))
    }
}
