//! Region lifecycle driver.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::SandwichClient;
use crate::error::{ProvisionError, Result};
use crate::identity::ResourceHandle;
use crate::states::{Operation, ResourceKind, poll_template};
use crate::waiter::{PollSpec, WaitSettings, await_state};

use super::{ReadOutcome, ResourceLifecycle};

/// Declarative record of one region.
#[derive(Debug, Clone, Default)]
pub struct RegionRecord {
    /// Handle of the remote region, assigned at creation.
    pub id: Option<ResourceHandle>,
    /// Region name.
    pub name: String,
    /// Backing datacenter.
    pub datacenter: String,
    /// Datastore holding image files.
    pub image_datastore: String,
    /// Optional folder within the image datastore.
    pub image_folder: Option<String>,
    /// Whether the region accepts new workloads.
    pub schedulable: bool,
}

/// Lifecycle driver for regions.
#[derive(Debug)]
pub struct RegionDriver {
    client: SandwichClient,
    wait: WaitSettings,
}

impl RegionDriver {
    /// Creates a new region driver.
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

    async fn await_region(&self, handle: &ResourceHandle, operation: Operation) -> Result<()> {
        let spec = PollSpec::new(
            ResourceKind::Region,
            handle,
            poll_template(ResourceKind::Region, operation),
            self.wait,
        );
        let regions = self.client.regions();
        await_state(&spec, || regions.refresh_state(handle.as_str())).await?;
        Ok(())
    }
}

#[async_trait]
impl ResourceLifecycle for RegionDriver {
    type Record = RegionRecord;

    fn kind(&self) -> &'static str {
        ResourceKind::Region.as_str()
    }

    async fn create(&self, record: &mut RegionRecord) -> Result<()> {
        let regions = self.client.regions();
        info!("Creating region: {}", record.name);

        let snapshot = regions
            .create(
                &record.name,
                &record.datacenter,
                &record.image_datastore,
                record.image_folder.as_deref(),
            )
            .await?;

        let handle = ResourceHandle::from(snapshot.id);
        record.id = Some(handle.clone());

        self.await_region(&handle, Operation::Create).await?;
        info!("Region created: {} (ID: {handle})", record.name);

        // Schedulability converges through the update path.
        self.update(record).await
    }

    async fn read(&self, record: &mut RegionRecord) -> Result<ReadOutcome> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };

        match self.client.regions().get(handle.as_str()).await {
            Ok(region) => {
                record.name = region.name;
                record.datacenter = region.datacenter;
                record.image_datastore = region.image_datastore;
                record.image_folder = region.image_folder;
                record.schedulable = region.schedulable;
                Ok(ReadOutcome::Present)
            }
            Err(err) if err.is_not_found() => {
                debug!("Region {handle} no longer exists, clearing record");
                record.id = None;
                Ok(ReadOutcome::Gone)
            }
            Err(err) => Err(err),
        }
    }

    async fn update(&self, record: &mut RegionRecord) -> Result<()> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };

        self.client
            .regions()
            .schedule(handle.as_str(), record.schedulable)
            .await?;

        self.read(record).await.map(|_| ())
    }

    async fn delete(&self, record: &mut RegionRecord) -> Result<()> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        let regions = self.client.regions();
        info!("Deleting region: {handle}");

        // A schedulable region cannot be torn down.
        regions.schedule(handle.as_str(), false).await?;
        regions.delete(handle.as_str()).await?;

        self.await_region(&handle, Operation::Delete).await?;
        record.id = None;
        info!("Region deleted: {handle}");
        Ok(())
    }
}
