//! Instance lifecycle driver.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::SandwichClient;
use crate::client::types::CreateInstanceRequest;
use crate::error::{ProvisionError, Result};
use crate::identity::ResourceHandle;
use crate::states::{Operation, ResourceKind, poll_template};
use crate::waiter::{PollSpec, WaitSettings, await_state};

use super::{ReadOutcome, ResourceLifecycle};

/// Declarative record of one instance. Every field is create-time-only;
/// changed fields require replacement by the engine.
#[derive(Debug, Clone, Default)]
pub struct InstanceRecord {
    /// Handle of the remote instance, assigned at creation.
    pub id: Option<ResourceHandle>,
    /// Instance name.
    pub name: String,
    /// Source image.
    pub image_id: Uuid,
    /// Service account the instance runs as, if any.
    pub service_account_id: Option<Uuid>,
    /// Network to attach to.
    pub network_id: Uuid,
    /// Region to create in.
    pub region_id: Uuid,
    /// Placement zone preference; assigned by the scheduler when unset.
    pub zone_id: Option<Uuid>,
    /// Size preset.
    pub flavor_id: Uuid,
    /// Root disk override in gigabytes.
    pub disk: Option<u32>,
    /// Authorized keypairs.
    pub keypair_ids: Vec<Uuid>,
    /// Free-form tags.
    pub tags: HashMap<String, String>,
    /// Boot-time user data.
    pub user_data: Option<String>,
}

/// Lifecycle driver for instances.
#[derive(Debug)]
pub struct InstanceDriver {
    client: SandwichClient,
    wait: WaitSettings,
}

impl InstanceDriver {
    /// Creates a new instance driver.
    #[must_use]
    pub fn new(client: SandwichClient) -> Self {
        Self {
            client,
            wait: WaitSettings::default(),
        }
    }

    /// Overrides the polling deadline and cadence.
    #[must_use]
    pub const fn with_wait_settings(mut self, wait: WaitSettings) -> Self {
        self.wait = wait;
        self
    }

    async fn await_instance(&self, handle: &ResourceHandle, operation: Operation) -> Result<()> {
        let spec = PollSpec::new(
            ResourceKind::Instance,
            handle,
            poll_template(ResourceKind::Instance, operation),
            self.wait,
        );
        let instances = self.client.instances();
        await_state(&spec, || instances.refresh_state(handle.as_str())).await?;
        Ok(())
    }

    fn build_create_request(record: &InstanceRecord) -> CreateInstanceRequest {
        let mut request = CreateInstanceRequest::new(
            &record.name,
            record.image_id,
            record.network_id,
            record.region_id,
            record.flavor_id,
        )
        .with_keypairs(record.keypair_ids.clone())
        .with_tags(record.tags.clone());

        if let Some(zone_id) = record.zone_id {
            request = request.with_zone(zone_id);
        }
        if let Some(service_account_id) = record.service_account_id {
            request = request.with_service_account(service_account_id);
        }
        if let Some(disk) = record.disk {
            request = request.with_disk(disk);
        }
        if let Some(user_data) = &record.user_data {
            request = request.with_user_data(user_data);
        }

        request
    }
}

#[async_trait]
impl ResourceLifecycle for InstanceDriver {
    type Record = InstanceRecord;

    fn kind(&self) -> &'static str {
        ResourceKind::Instance.as_str()
    }

    async fn create(&self, record: &mut InstanceRecord) -> Result<()> {
        info!("Creating instance: {}", record.name);

        let request = Self::build_create_request(record);
        let snapshot = self.client.instances().create(&request).await?;

        let handle = ResourceHandle::from(snapshot.id);
        record.id = Some(handle.clone());

        self.await_instance(&handle, Operation::Create).await?;
        info!("Instance created: {} (ID: {handle})", record.name);

        self.read(record).await.map(|_| ())
    }

    async fn read(&self, record: &mut InstanceRecord) -> Result<ReadOutcome> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };

        let instance = match self.client.instances().get(handle.as_str()).await {
            Ok(instance) => instance,
            Err(err) if err.is_not_found() => {
                debug!("Instance {handle} no longer exists, clearing record");
                record.id = None;
                return Ok(ReadOutcome::Gone);
            }
            Err(err) => return Err(err),
        };

        // The attached network is only reachable through the instance's
        // network port.
        let port = self
            .client
            .network_ports()
            .get(&instance.network_port_id.to_string())
            .await?;

        record.name = instance.name;
        record.image_id = instance.image_id;
        record.service_account_id = instance.service_account_id;
        record.network_id = port.network_id;
        record.region_id = instance.region_id;
        record.zone_id = instance.zone_id;
        record.flavor_id = instance.flavor_id;
        record.disk = Some(instance.disk);
        record.keypair_ids = instance.keypair_ids;
        record.tags = instance.tags;
        record.user_data = instance.user_data;

        Ok(ReadOutcome::Present)
    }

    async fn delete(&self, record: &mut InstanceRecord) -> Result<()> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        info!("Deleting instance: {handle}");

        self.client.instances().delete(handle.as_str()).await?;
        self.await_instance(&handle, Operation::Delete).await?;

        record.id = None;
        info!("Instance deleted: {handle}");
        Ok(())
    }
}
