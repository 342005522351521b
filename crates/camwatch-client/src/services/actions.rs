use std::sync::Arc;

use camwatch_core::error::{CamwatchError, CamwatchResult};
use camwatch_core::models::camera::Camera;
use camwatch_core::models::camera_action::{
    ActionFilter, CameraAction, CreateCameraAction, UpdateCameraAction,
};
use camwatch_core::models::{ActionId, CameraId};
use camwatch_core::policy::Capability;
use camwatch_core::repository::{PaginatedResult, Pagination, Sort};
use camwatch_core::validation;
use tracing::info;

use super::PendingDeletion;
use crate::api::{ApiClient, Query};
use crate::transport::Transport;

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Camera history log.
pub struct ActionService<T: Transport> {
    api: Arc<ApiClient<T>>,
}

impl<T: Transport> Clone for ActionService<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
        }
    }
}

impl<T: Transport> ActionService<T> {
    pub fn new(api: Arc<ApiClient<T>>) -> Self {
        Self { api }
    }

    /// Newest first unless `sort` says otherwise.
    pub async fn list(
        &self,
        filter: &ActionFilter,
        pagination: Pagination,
        sort: &Sort,
    ) -> CamwatchResult<PaginatedResult<CameraAction>> {
        self.api.require(Capability::ReadResource)?;
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if start > end {
                return Err(CamwatchError::validation(
                    "Start date must not be after end date",
                ));
            }
        }

        let query = Query::new()
            .page(pagination)
            .opt("camera_id", filter.camera_id)
            .text("action_type", filter.action_type.as_deref())
            .text("search", filter.search.as_deref())
            .opt("start_date", filter.start_date.map(|d| d.format(DATE_FORMAT)))
            .opt("end_date", filter.end_date.map(|d| d.format(DATE_FORMAT)))
            .flag("include_camera", filter.include_camera)
            .sort(sort, ActionFilter::SORT_FIELDS)?;
        self.api.get("/actions", query).await
    }

    pub async fn for_camera(
        &self,
        camera_id: CameraId,
        pagination: Pagination,
    ) -> CamwatchResult<PaginatedResult<CameraAction>> {
        let filter = ActionFilter {
            camera_id: Some(camera_id),
            ..Default::default()
        };
        self.list(&filter, pagination, &Sort::default()).await
    }

    pub async fn get(&self, id: ActionId) -> CamwatchResult<CameraAction> {
        self.api.require(Capability::ReadResource)?;
        self.api
            .get(&format!("/actions/{id}"), Query::new().flag("include_camera", true))
            .await
    }

    /// Sessions confined to a location may only touch the history of
    /// cameras in it. Everyone else skips the lookup.
    async fn require_camera_in_reach(&self, camera_id: CameraId) -> CamwatchResult<()> {
        if self.api.confined_location().is_none() {
            return Ok(());
        }
        let camera: Camera = self
            .api
            .get(&format!("/cameras/{camera_id}"), Query::new())
            .await?;
        let location = camera.fields.location_id;
        self.api.require_move(location, location)
    }

    pub async fn create(&self, input: &CreateCameraAction) -> CamwatchResult<CameraAction> {
        self.api.require(Capability::CreateResource)?;
        validation::check(input)?;
        self.require_camera_in_reach(input.camera_id).await?;
        let action: CameraAction = self.api.post("/actions", input).await?;
        info!(
            action_id = action.id,
            camera_id = action.camera_id,
            action_type = %action.action_type,
            "camera action logged"
        );
        Ok(action)
    }

    pub async fn update(
        &self,
        action: &CameraAction,
        input: &UpdateCameraAction,
    ) -> CamwatchResult<CameraAction> {
        self.api.require(Capability::EditResource)?;
        validation::check(input)?;
        self.require_camera_in_reach(action.camera_id).await?;
        let updated: CameraAction = self
            .api
            .put(&format!("/actions/{}", action.id), input)
            .await?;
        info!(action_id = updated.id, "camera action updated");
        Ok(updated)
    }

    pub fn prepare_delete(&self, action: &CameraAction) -> CamwatchResult<PendingDeletion<T>> {
        self.api.require(Capability::DeleteResource)?;
        Ok(PendingDeletion::new(
            self.api.clone(),
            format!("/actions/{}", action.id),
            "Delete",
            format!("'{}' entry #{}", action.action_type, action.id),
        ))
    }
}
