use std::sync::Arc;

use camwatch_core::error::{CamwatchError, CamwatchResult};
use camwatch_core::models::NvrId;
use camwatch_core::models::nvr::{NvrDevice, NvrFilter, NvrInput};
use camwatch_core::policy::Capability;
use camwatch_core::repository::{PaginatedResult, Pagination, Sort};
use camwatch_core::validation;
use tracing::info;

use super::{PendingDeletion, plural};
use crate::api::{ApiClient, Query, segment};
use crate::transport::Transport;

pub struct NvrService<T: Transport> {
    api: Arc<ApiClient<T>>,
}

impl<T: Transport> Clone for NvrService<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
        }
    }
}

impl<T: Transport> NvrService<T> {
    pub fn new(api: Arc<ApiClient<T>>) -> Self {
        Self { api }
    }

    pub async fn list(
        &self,
        filter: &NvrFilter,
        pagination: Pagination,
        sort: &Sort,
    ) -> CamwatchResult<PaginatedResult<NvrDevice>> {
        self.api.require(Capability::ReadResource)?;
        let query = Query::new()
            .page(pagination)
            .text("search", filter.search.as_deref())
            .flag("include_cameras", filter.include_cameras)
            .sort(sort, NvrFilter::SORT_FIELDS)?;
        self.api.get("/nvrs", query).await
    }

    pub async fn get(&self, id: NvrId, include_cameras: bool) -> CamwatchResult<NvrDevice> {
        self.api.require(Capability::ReadResource)?;
        self.api
            .get(
                &format!("/nvrs/{id}"),
                Query::new().flag("include_cameras", include_cameras),
            )
            .await
    }

    pub async fn find_by_name(&self, name: &str) -> CamwatchResult<NvrDevice> {
        self.api.require(Capability::ReadResource)?;
        self.api
            .get(&format!("/nvrs/name/{}", segment(name)), Query::new())
            .await
    }

    pub async fn find_by_ip(&self, ip_address: &str) -> CamwatchResult<NvrDevice> {
        self.api.require(Capability::ReadResource)?;
        if !validation::is_ipv4(ip_address) {
            return Err(CamwatchError::validation(
                "IP address must be a valid IPv4 address",
            ));
        }
        self.api.get(&format!("/nvrs/ip/{ip_address}"), Query::new()).await
    }

    pub async fn create(&self, input: &NvrInput) -> CamwatchResult<NvrDevice> {
        self.api.require(Capability::CreateResource)?;
        validation::check(input)?;
        let nvr: NvrDevice = self.api.post("/nvrs", input).await?;
        info!(nvr_id = nvr.id, name = %nvr.fields.nvr_name, "NVR created");
        Ok(nvr)
    }

    pub async fn update(&self, id: NvrId, input: &NvrInput) -> CamwatchResult<NvrDevice> {
        self.api.require(Capability::EditResource)?;
        validation::check(input)?;
        let nvr: NvrDevice = self.api.put(&format!("/nvrs/{id}"), input).await?;
        info!(nvr_id = id, "NVR updated");
        Ok(nvr)
    }

    /// Refused while cameras are connected to the NVR.
    pub async fn prepare_delete(&self, nvr: &NvrDevice) -> CamwatchResult<PendingDeletion<T>> {
        self.api.require(Capability::DeleteResource)?;

        let connected = match &nvr.cameras {
            Some(cameras) => cameras.len(),
            None => self
                .get(nvr.id, true)
                .await?
                .cameras
                .map_or(0, |cameras| cameras.len()),
        };
        let name = &nvr.fields.nvr_name;
        if connected > 0 {
            return Err(CamwatchError::validation(format!(
                "Cannot delete NVR '{name}': {} still connected. Reassign or remove them first.",
                plural(connected, "camera")
            )));
        }

        Ok(PendingDeletion::new(
            self.api.clone(),
            format!("/nvrs/{}", nvr.id),
            "Delete",
            format!("NVR '{name}'"),
        ))
    }
}
