//! Zone lifecycle driver.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::SandwichClient;
use crate::error::{ProvisionError, Result};
use crate::identity::ResourceHandle;
use crate::states::{Operation, ResourceKind, poll_template};
use crate::waiter::{PollSpec, WaitSettings, await_state};

use super::{ReadOutcome, ResourceLifecycle};

/// Declarative record of one zone.
#[derive(Debug, Clone)]
pub struct ZoneRecord {
    /// Handle of the remote zone, assigned at creation.
    pub id: Option<ResourceHandle>,
    /// Zone name.
    pub name: String,
    /// Owning region.
    pub region_id: String,
    /// Backing VM cluster.
    pub vm_cluster: String,
    /// Backing VM datastore.
    pub vm_datastore: String,
    /// Optional folder for VM placement.
    pub vm_folder: Option<String>,
    /// Core overprovisioning percentage.
    pub core_provision_percent: u32,
    /// RAM overprovisioning percentage.
    pub ram_provision_percent: u32,
    /// Whether the zone accepts new workloads.
    pub schedulable: bool,
}

impl Default for ZoneRecord {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            region_id: String::new(),
            vm_cluster: String::new(),
            vm_datastore: String::new(),
            vm_folder: None,
            core_provision_percent: 100,
            ram_provision_percent: 100,
            schedulable: false,
        }
    }
}

/// Lifecycle driver for zones.
#[derive(Debug)]
pub struct ZoneDriver {
    client: SandwichClient,
    wait: WaitSettings,
}

impl ZoneDriver {
    /// Creates a new zone driver.
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

    async fn await_zone(&self, handle: &ResourceHandle, operation: Operation) -> Result<()> {
        let spec = PollSpec::new(
            ResourceKind::Zone,
            handle,
            poll_template(ResourceKind::Zone, operation),
            self.wait,
        );
        let zones = self.client.zones();
        await_state(&spec, || zones.refresh_state(handle.as_str())).await?;
        Ok(())
    }
}

#[async_trait]
impl ResourceLifecycle for ZoneDriver {
    type Record = ZoneRecord;

    fn kind(&self) -> &'static str {
        ResourceKind::Zone.as_str()
    }

    async fn create(&self, record: &mut ZoneRecord) -> Result<()> {
        let zones = self.client.zones();
        info!("Creating zone: {}", record.name);

        let snapshot = zones
            .create(
                &record.name,
                &record.region_id,
                &record.vm_cluster,
                &record.vm_datastore,
                record.vm_folder.as_deref(),
                record.core_provision_percent,
                record.ram_provision_percent,
            )
            .await?;

        let handle = ResourceHandle::from(snapshot.id);
        record.id = Some(handle.clone());

        self.await_zone(&handle, Operation::Create).await?;
        info!("Zone created: {} (ID: {handle})", record.name);

        self.update(record).await
    }

    async fn read(&self, record: &mut ZoneRecord) -> Result<ReadOutcome> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };

        match self.client.zones().get(handle.as_str()).await {
            Ok(zone) => {
                record.name = zone.name;
                record.region_id = zone.region_id.to_string();
                record.vm_cluster = zone.vm_cluster;
                record.vm_datastore = zone.vm_datastore;
                record.vm_folder = zone.vm_folder;
                record.core_provision_percent = zone.core_provision_percent;
                record.ram_provision_percent = zone.ram_provision_percent;
                record.schedulable = zone.schedulable;
                Ok(ReadOutcome::Present)
            }
            Err(err) if err.is_not_found() => {
                debug!("Zone {handle} no longer exists, clearing record");
                record.id = None;
                Ok(ReadOutcome::Gone)
            }
            Err(err) => Err(err),
        }
    }

    async fn update(&self, record: &mut ZoneRecord) -> Result<()> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };

        self.client
            .zones()
            .schedule(handle.as_str(), record.schedulable)
            .await?;

        self.read(record).await.map(|_| ())
    }

    async fn delete(&self, record: &mut ZoneRecord) -> Result<()> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        info!("Deleting zone: {handle}");

        self.client.zones().delete(handle.as_str()).await?;
        self.await_zone(&handle, Operation::Delete).await?;

        record.id = None;
        info!("Zone deleted: {handle}");
        Ok(())
    }
}
