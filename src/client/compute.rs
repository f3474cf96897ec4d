//! Clients for compute resources: networks, images, keypairs, flavors,
//! instances, network ports and volumes.

use serde_json::json;
use uuid::Uuid;

use crate::error::Result;
use crate::states::ResourceKind;

use super::http::SandwichClient;
use super::types::{
    CreateInstanceRequest, FlavorSnapshot, ImageMemberList, ImageSnapshot, InstanceSnapshot,
    KeypairSnapshot, NetworkPortSnapshot, NetworkSnapshot, VolumeSnapshot,
};

/// Client for network operations.
#[derive(Debug, Clone, Copy)]
pub struct NetworkClient<'a> {
    http: &'a SandwichClient,
}

impl<'a> NetworkClient<'a> {
    pub(crate) const fn new(http: &'a SandwichClient) -> Self {
        Self { http }
    }

    /// Gets a network by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the network is not found or the API call fails.
    pub async fn get(&self, name: &str) -> Result<NetworkSnapshot> {
        self.http
            .get_json(
                &format!("/v1/networks/{name}"),
                ResourceKind::Network.as_str(),
                name,
            )
            .await
    }

    /// Creates a network.
    ///
    /// # Errors
    ///
    /// Returns an error if the network cannot be created.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        name: &str,
        region_name: &str,
        port_group: &str,
        cidr: &str,
        gateway: std::net::IpAddr,
        pool_start: std::net::IpAddr,
        pool_end: std::net::IpAddr,
        dns_servers: &[std::net::IpAddr],
    ) -> Result<NetworkSnapshot> {
        let body = json!({
            "name": name,
            "region_name": region_name,
            "port_group": port_group,
            "cidr": cidr,
            "gateway": gateway,
            "pool_start": pool_start,
            "pool_end": pool_end,
            "dns_servers": dns_servers,
        });
        self.http
            .post_json("/v1/networks", &body, ResourceKind::Network.as_str(), name)
            .await
    }

    /// Deletes a network.
    ///
    /// # Errors
    ///
    /// Returns an error if the network cannot be deleted.
    pub async fn delete(&self, name: &str) -> Result<()> {
        self.http
            .delete(
                &format!("/v1/networks/{name}"),
                ResourceKind::Network.as_str(),
                name,
            )
            .await
    }

    /// One state poll: the current snapshot and its state label.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn refresh_state(self, name: &str) -> Result<(NetworkSnapshot, String)> {
        let network = self.get(name).await?;
        let state = network.state.clone();
        Ok((network, state))
    }
}

/// Client for image operations within one project.
#[derive(Debug, Clone, Copy)]
pub struct ImageClient<'a> {
    http: &'a SandwichClient,
    project: &'a str,
}

impl<'a> ImageClient<'a> {
    pub(crate) const fn new(http: &'a SandwichClient, project: &'a str) -> Self {
        Self { http, project }
    }

    fn path(&self, name: &str) -> String {
        format!("/v1/projects/{}/images/{name}", self.project)
    }

    /// Gets an image by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is not found or the API call fails.
    pub async fn get(&self, name: &str) -> Result<ImageSnapshot> {
        self.http
            .get_json(&self.path(name), ResourceKind::Image.as_str(), name)
            .await
    }

    /// Creates an image from a file already present in the region's image
    /// datastore.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be created.
    pub async fn create(
        &self,
        name: &str,
        region_name: &str,
        file_name: &str,
    ) -> Result<ImageSnapshot> {
        let body = json!({
            "name": name,
            "region_name": region_name,
            "file_name": file_name,
        });
        self.http
            .post_json(
                &format!("/v1/projects/{}/images", self.project),
                &body,
                ResourceKind::Image.as_str(),
                name,
            )
            .await
    }

    /// Deletes an image.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be deleted.
    pub async fn delete(&self, name: &str) -> Result<()> {
        self.http
            .delete(&self.path(name), ResourceKind::Image.as_str(), name)
            .await
    }

    /// One state poll: the current snapshot and its state label.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn refresh_state(self, name: &str) -> Result<(ImageSnapshot, String)> {
        let image = self.get(name).await?;
        let state = image.state.clone();
        Ok((image, state))
    }
}

/// Client for image member grants. Grants are addressed by the image's
/// server-assigned identifier, independent of the owning project.
#[derive(Debug, Clone, Copy)]
pub struct ImageMemberClient<'a> {
    http: &'a SandwichClient,
}

impl<'a> ImageMemberClient<'a> {
    pub(crate) const fn new(http: &'a SandwichClient) -> Self {
        Self { http }
    }

    /// Grants a project access to an image.
    ///
    /// # Errors
    ///
    /// Returns an error if the grant fails.
    pub async fn add(&self, image_id: &str, project_id: &str) -> Result<()> {
        self.http
            .post_empty(
                &format!("/v1/images/{image_id}/members"),
                &json!({ "project_id": project_id }),
                ResourceKind::Image.as_str(),
                image_id,
            )
            .await
    }

    /// Lists the projects granted access to an image.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is not found or the API call fails.
    pub async fn list(&self, image_id: &str) -> Result<ImageMemberList> {
        self.http
            .get_json(
                &format!("/v1/images/{image_id}/members"),
                ResourceKind::Image.as_str(),
                image_id,
            )
            .await
    }

    /// Revokes a project's access to an image.
    ///
    /// # Errors
    ///
    /// Returns an error if the revocation fails.
    pub async fn remove(&self, image_id: &str, project_id: &str) -> Result<()> {
        self.http
            .delete(
                &format!("/v1/images/{image_id}/members/{project_id}"),
                ResourceKind::Image.as_str(),
                image_id,
            )
            .await
    }
}

/// Client for keypair operations within one project.
#[derive(Debug, Clone, Copy)]
pub struct KeypairClient<'a> {
    http: &'a SandwichClient,
    project: &'a str,
}

impl<'a> KeypairClient<'a> {
    pub(crate) const fn new(http: &'a SandwichClient, project: &'a str) -> Self {
        Self { http, project }
    }

    fn path(&self, name: &str) -> String {
        format!("/v1/projects/{}/keypairs/{name}", self.project)
    }

    /// Gets a keypair by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypair is not found or the API call fails.
    pub async fn get(&self, name: &str) -> Result<KeypairSnapshot> {
        self.http
            .get_json(&self.path(name), ResourceKind::Keypair.as_str(), name)
            .await
    }

    /// Creates a keypair from public key material.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypair cannot be created.
    pub async fn create(&self, name: &str, public_key: &str) -> Result<KeypairSnapshot> {
        let body = json!({
            "name": name,
            "public_key": public_key,
        });
        self.http
            .post_json(
                &format!("/v1/projects/{}/keypairs", self.project),
                &body,
                ResourceKind::Keypair.as_str(),
                name,
            )
            .await
    }

    /// Deletes a keypair.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypair cannot be deleted.
    pub async fn delete(&self, name: &str) -> Result<()> {
        self.http
            .delete(&self.path(name), ResourceKind::Keypair.as_str(), name)
            .await
    }
}

/// Client for flavor operations.
#[derive(Debug, Clone, Copy)]
pub struct FlavorClient<'a> {
    http: &'a SandwichClient,
}

impl<'a> FlavorClient<'a> {
    pub(crate) const fn new(http: &'a SandwichClient) -> Self {
        Self { http }
    }

    /// Gets a flavor by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the flavor is not found or the API call fails.
    pub async fn get(&self, id: &str) -> Result<FlavorSnapshot> {
        self.http
            .get_json(
                &format!("/v1/flavors/{id}"),
                ResourceKind::Flavor.as_str(),
                id,
            )
            .await
    }

    /// Creates a flavor.
    ///
    /// # Errors
    ///
    /// Returns an error if the flavor cannot be created.
    pub async fn create(&self, name: &str, vcpus: u32, ram: u32, disk: u32) -> Result<FlavorSnapshot> {
        let body = json!({
            "name": name,
            "vcpus": vcpus,
            "ram": ram,
            "disk": disk,
        });
        self.http
            .post_json("/v1/flavors", &body, ResourceKind::Flavor.as_str(), name)
            .await
    }

    /// Deletes a flavor.
    ///
    /// # Errors
    ///
    /// Returns an error if the flavor cannot be deleted.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.http
            .delete(
                &format!("/v1/flavors/{id}"),
                ResourceKind::Flavor.as_str(),
                id,
            )
            .await
    }
}

/// Client for instance operations.
#[derive(Debug, Clone, Copy)]
pub struct InstanceClient<'a> {
    http: &'a SandwichClient,
}

impl<'a> InstanceClient<'a> {
    pub(crate) const fn new(http: &'a SandwichClient) -> Self {
        Self { http }
    }

    /// Gets an instance by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance is not found or the API call fails.
    pub async fn get(&self, id: &str) -> Result<InstanceSnapshot> {
        self.http
            .get_json(
                &format!("/v1/instances/{id}"),
                ResourceKind::Instance.as_str(),
                id,
            )
            .await
    }

    /// Creates an instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance cannot be created.
    pub async fn create(&self, request: &CreateInstanceRequest) -> Result<InstanceSnapshot> {
        let body = serde_json::to_value(request).map_err(|e| {
            crate::error::ApiError::invalid_response(format!("Failed to encode request: {e}"))
        })?;
        self.http
            .post_json(
                "/v1/instances",
                &body,
                ResourceKind::Instance.as_str(),
                &request.name,
            )
            .await
    }

    /// Deletes an instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance cannot be deleted.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.http
            .delete(
                &format!("/v1/instances/{id}"),
                ResourceKind::Instance.as_str(),
                id,
            )
            .await
    }

    /// One state poll: the current snapshot and its state label.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn refresh_state(self, id: &str) -> Result<(InstanceSnapshot, String)> {
        let instance = self.get(id).await?;
        let state = instance.state.clone();
        Ok((instance, state))
    }
}

/// Client for network port reads.
#[derive(Debug, Clone, Copy)]
pub struct NetworkPortClient<'a> {
    http: &'a SandwichClient,
}

impl<'a> NetworkPortClient<'a> {
    pub(crate) const fn new(http: &'a SandwichClient) -> Self {
        Self { http }
    }

    /// Gets a network port by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the port is not found or the API call fails.
    pub async fn get(&self, id: &str) -> Result<NetworkPortSnapshot> {
        self.http
            .get_json(&format!("/v1/network-ports/{id}"), "network port", id)
            .await
    }
}

/// Client for volume operations.
#[derive(Debug, Clone, Copy)]
pub struct VolumeClient<'a> {
    http: &'a SandwichClient,
}

impl<'a> VolumeClient<'a> {
    pub(crate) const fn new(http: &'a SandwichClient) -> Self {
        Self { http }
    }

    /// Gets a volume by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the volume is not found or the API call fails.
    pub async fn get(&self, id: &str) -> Result<VolumeSnapshot> {
        self.http
            .get_json(
                &format!("/v1/volumes/{id}"),
                ResourceKind::Volume.as_str(),
                id,
            )
            .await
    }

    /// Creates a volume.
    ///
    /// # Errors
    ///
    /// Returns an error if the volume cannot be created.
    pub async fn create(&self, name: &str, zone_id: Uuid, size: u32) -> Result<VolumeSnapshot> {
        let body = json!({
            "name": name,
            "zone_id": zone_id,
            "size": size,
        });
        self.http
            .post_json("/v1/volumes", &body, ResourceKind::Volume.as_str(), name)
            .await
    }

    /// Deletes a volume.
    ///
    /// # Errors
    ///
    /// Returns an error if the volume cannot be deleted.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.http
            .delete(
                &format!("/v1/volumes/{id}"),
                ResourceKind::Volume.as_str(),
                id,
            )
            .await
    }

    /// Clones an existing volume into a new one.
    ///
    /// # Errors
    ///
    /// Returns an error if the clone fails.
    pub async fn clone_from(&self, id: &str, name: &str) -> Result<VolumeSnapshot> {
        self.http
            .post_json(
                &format!("/v1/volumes/{id}/action/clone"),
                &json!({ "name": name }),
                ResourceKind::Volume.as_str(),
                id,
            )
            .await
    }

    /// Attaches the volume to an instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the attach fails.
    pub async fn attach(&self, id: &str, instance_id: Uuid) -> Result<()> {
        self.http
            .post_empty(
                &format!("/v1/volumes/{id}/action/attach"),
                &json!({ "instance_id": instance_id }),
                ResourceKind::Volume.as_str(),
                id,
            )
            .await
    }

    /// Detaches the volume from its instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the detach fails; a detach of an already
    /// detached volume surfaces as a conflict.
    pub async fn detach(&self, id: &str) -> Result<()> {
        self.http
            .post_empty(
                &format!("/v1/volumes/{id}/action/detach"),
                &json!({}),
                ResourceKind::Volume.as_str(),
                id,
            )
            .await
    }

    /// Grows the volume to a new size.
    ///
    /// # Errors
    ///
    /// Returns an error if the grow fails.
    pub async fn grow(&self, id: &str, size: u32) -> Result<()> {
        self.http
            .post_empty(
                &format!("/v1/volumes/{id}/action/grow"),
                &json!({ "size": size }),
                ResourceKind::Volume.as_str(),
                id,
            )
            .await
    }

    /// One state poll: the current snapshot and its state label.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn refresh_state(self, id: &str) -> Result<(VolumeSnapshot, String)> {
        let volume = self.get(id).await?;
        let state = volume.state.clone();
        Ok((volume, state))
    }

    /// One task poll: the current snapshot and its task label (empty when
    /// the volume is at rest).
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn refresh_task(self, id: &str) -> Result<(VolumeSnapshot, String)> {
        let volume = self.get(id).await?;
        let task = volume.task_label();
        Ok((volume, task))
    }
}
