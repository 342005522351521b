use std::sync::Arc;

use camwatch_core::error::{CamwatchError, CamwatchResult};
use camwatch_core::models::LocationId;
use camwatch_core::models::location::{Location, LocationFilter, LocationInput};
use camwatch_core::policy::Capability;
use camwatch_core::repository::{PaginatedResult, Pagination, Sort};
use camwatch_core::validation;
use tracing::info;

use super::{PendingDeletion, plural};
use crate::api::{ApiClient, Query};
use crate::transport::Transport;

pub struct LocationService<T: Transport> {
    api: Arc<ApiClient<T>>,
}

impl<T: Transport> Clone for LocationService<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
        }
    }
}

impl<T: Transport> LocationService<T> {
    pub fn new(api: Arc<ApiClient<T>>) -> Self {
        Self { api }
    }

    pub async fn list(
        &self,
        filter: &LocationFilter,
        pagination: Pagination,
        sort: &Sort,
    ) -> CamwatchResult<PaginatedResult<Location>> {
        self.api.require(Capability::ReadResource)?;
        let query = Query::new()
            .page(pagination)
            .text("search", filter.search.as_deref())
            .text("location_type", filter.location_type.as_deref())
            .flag("include_cameras", filter.include_cameras)
            .sort(sort, LocationFilter::SORT_FIELDS)?;
        self.api.get("/locations", query).await
    }

    pub async fn get(&self, id: LocationId, include_cameras: bool) -> CamwatchResult<Location> {
        self.api.require(Capability::ReadResource)?;
        self.api
            .get(
                &format!("/locations/{id}"),
                Query::new().flag("include_cameras", include_cameras),
            )
            .await
    }

    pub async fn create(&self, input: &LocationInput) -> CamwatchResult<Location> {
        self.api.require(Capability::CreateResource)?;
        validation::check(input)?;
        let location: Location = self.api.post("/locations", input).await?;
        info!(location_id = location.id, name = %location.fields.location_name, "location created");
        Ok(location)
    }

    pub async fn update(&self, id: LocationId, input: &LocationInput) -> CamwatchResult<Location> {
        self.api.require(Capability::EditResource)?;
        self.api.require(Capability::AccessLocation(id))?;
        validation::check(input)?;
        let location: Location = self.api.put(&format!("/locations/{id}"), input).await?;
        info!(location_id = id, "location updated");
        Ok(location)
    }

    /// Check that `location` may be deleted.
    ///
    /// Refused while cameras are assigned to it. If `location` was
    /// loaded without its cameras they are fetched first.
    pub async fn prepare_delete(&self, location: &Location) -> CamwatchResult<PendingDeletion<T>> {
        self.api.require(Capability::DeleteResource)?;

        let assigned = match &location.cameras {
            Some(cameras) => cameras.len(),
            None => self
                .get(location.id, true)
                .await?
                .cameras
                .map_or(0, |cameras| cameras.len()),
        };
        let name = &location.fields.location_name;
        if assigned > 0 {
            return Err(CamwatchError::validation(format!(
                "Cannot delete location '{name}': {} still assigned. Reassign or remove them first.",
                plural(assigned, "camera")
            )));
        }

        Ok(PendingDeletion::new(
            self.api.clone(),
            format!("/locations/{}", location.id),
            "Delete",
            format!("location '{name}'"),
        ))
    }
}
