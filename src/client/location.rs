//! Clients for location resources: regions and zones.

use serde_json::json;

use crate::error::Result;
use crate::states::ResourceKind;

use super::http::SandwichClient;
use super::types::{RegionSnapshot, ZoneSnapshot};

/// Client for region operations.
#[derive(Debug, Clone, Copy)]
pub struct RegionClient<'a> {
    http: &'a SandwichClient,
}

impl<'a> RegionClient<'a> {
    pub(crate) const fn new(http: &'a SandwichClient) -> Self {
        Self { http }
    }

    /// Gets a region by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is not found or the API call fails.
    pub async fn get(&self, id: &str) -> Result<RegionSnapshot> {
        self.http
            .get_json(
                &format!("/v1/regions/{id}"),
                ResourceKind::Region.as_str(),
                id,
            )
            .await
    }

    /// Creates a region.
    ///
    /// # Errors
    ///
    /// Returns an error if the region cannot be created.
    pub async fn create(
        &self,
        name: &str,
        datacenter: &str,
        image_datastore: &str,
        image_folder: Option<&str>,
    ) -> Result<RegionSnapshot> {
        let body = json!({
            "name": name,
            "datacenter": datacenter,
            "image_datastore": image_datastore,
            "image_folder": image_folder,
        });
        self.http
            .post_json("/v1/regions", &body, ResourceKind::Region.as_str(), name)
            .await
    }

    /// Deletes a region.
    ///
    /// # Errors
    ///
    /// Returns an error if the region cannot be deleted.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.http
            .delete(
                &format!("/v1/regions/{id}"),
                ResourceKind::Region.as_str(),
                id,
            )
            .await
    }

    /// Marks the region schedulable or unschedulable.
    ///
    /// # Errors
    ///
    /// Returns an error if the action fails.
    pub async fn schedule(&self, id: &str, schedulable: bool) -> Result<()> {
        self.http
            .post_empty(
                &format!("/v1/regions/{id}/action/schedule"),
                &json!({ "schedulable": schedulable }),
                ResourceKind::Region.as_str(),
                id,
            )
            .await
    }

    /// One state poll: the current snapshot and its state label.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn refresh_state(self, id: &str) -> Result<(RegionSnapshot, String)> {
        let region = self.get(id).await?;
        let state = region.state.clone();
        Ok((region, state))
    }
}

/// Client for zone operations.
#[derive(Debug, Clone, Copy)]
pub struct ZoneClient<'a> {
    http: &'a SandwichClient,
}

impl<'a> ZoneClient<'a> {
    pub(crate) const fn new(http: &'a SandwichClient) -> Self {
        Self { http }
    }

    /// Gets a zone by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the zone is not found or the API call fails.
    pub async fn get(&self, id: &str) -> Result<ZoneSnapshot> {
        self.http
            .get_json(&format!("/v1/zones/{id}"), ResourceKind::Zone.as_str(), id)
            .await
    }

    /// Creates a zone.
    ///
    /// # Errors
    ///
    /// Returns an error if the zone cannot be created.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        name: &str,
        region_id: &str,
        vm_cluster: &str,
        vm_datastore: &str,
        vm_folder: Option<&str>,
        core_provision_percent: u32,
        ram_provision_percent: u32,
    ) -> Result<ZoneSnapshot> {
        let body = json!({
            "name": name,
            "region_id": region_id,
            "vm_cluster": vm_cluster,
            "vm_datastore": vm_datastore,
            "vm_folder": vm_folder,
            "core_provision_percent": core_provision_percent,
            "ram_provision_percent": ram_provision_percent,
        });
        self.http
            .post_json("/v1/zones", &body, ResourceKind::Zone.as_str(), name)
            .await
    }

    /// Deletes a zone.
    ///
    /// # Errors
    ///
    /// Returns an error if the zone cannot be deleted.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.http
            .delete(&format!("/v1/zones/{id}"), ResourceKind::Zone.as_str(), id)
            .await
    }

    /// Marks the zone schedulable or unschedulable.
    ///
    /// # Errors
    ///
    /// Returns an error if the action fails.
    pub async fn schedule(&self, id: &str, schedulable: bool) -> Result<()> {
        self.http
            .post_empty(
                &format!("/v1/zones/{id}/action/schedule"),
                &json!({ "schedulable": schedulable }),
                ResourceKind::Zone.as_str(),
                id,
            )
            .await
    }

    /// One state poll: the current snapshot and its state label.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn refresh_state(self, id: &str) -> Result<(ZoneSnapshot, String)> {
        let zone = self.get(id).await?;
        let state = zone.state.clone();
        Ok((zone, state))
    }
}
