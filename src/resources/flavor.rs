//! Flavor lifecycle driver. Flavors are plain presets with no state
//! machine, so no polling is involved.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::SandwichClient;
use crate::error::{ProvisionError, Result};
use crate::identity::ResourceHandle;
use crate::states::ResourceKind;

use super::{ReadOutcome, ResourceLifecycle};

/// Declarative record of one flavor.
#[derive(Debug, Clone, Default)]
pub struct FlavorRecord {
    /// Handle of the remote flavor, assigned at creation.
    pub id: Option<ResourceHandle>,
    /// Flavor name.
    pub name: String,
    /// Virtual CPU count.
    pub vcpus: u32,
    /// RAM in megabytes.
    pub ram: u32,
    /// Disk in gigabytes.
    pub disk: u32,
}

/// Lifecycle driver for flavors.
#[derive(Debug)]
pub struct FlavorDriver {
    client: SandwichClient,
}

impl FlavorDriver {
    /// Creates a new flavor driver.
    #[must_use]
    pub const fn new(client: SandwichClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceLifecycle for FlavorDriver {
    type Record = FlavorRecord;

    fn kind(&self) -> &'static str {
        ResourceKind::Flavor.as_str()
    }

    async fn create(&self, record: &mut FlavorRecord) -> Result<()> {
        info!("Creating flavor: {}", record.name);

        let snapshot = self
            .client
            .flavors()
            .create(&record.name, record.vcpus, record.ram, record.disk)
            .await?;

        record.id = Some(ResourceHandle::from(snapshot.id));
        self.read(record).await.map(|_| ())
    }

    async fn read(&self, record: &mut FlavorRecord) -> Result<ReadOutcome> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };

        match self.client.flavors().get(handle.as_str()).await {
            Ok(flavor) => {
                record.name = flavor.name;
                record.vcpus = flavor.vcpus;
                record.ram = flavor.ram;
                record.disk = flavor.disk;
                Ok(ReadOutcome::Present)
            }
            Err(err) if err.is_not_found() => {
                debug!("Flavor {handle} no longer exists, clearing record");
                record.id = None;
                Ok(ReadOutcome::Gone)
            }
            Err(err) => Err(err),
        }
    }

    async fn delete(&self, record: &mut FlavorRecord) -> Result<()> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        info!("Deleting flavor: {handle}");

        self.client.flavors().delete(handle.as_str()).await?;
        record.id = None;
        Ok(())
    }
}
