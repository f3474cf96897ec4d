//! Keypair lifecycle driver. Keypairs are ready as soon as the control
//! plane stores them, so no polling is involved.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::SandwichClient;
use crate::error::{ProvisionError, Result};
use crate::identity::ResourceHandle;
use crate::states::ResourceKind;

use super::{ReadOutcome, ResourceLifecycle, resolve_project};

/// Declarative record of one keypair.
#[derive(Debug, Clone, Default)]
pub struct KeypairRecord {
    /// Handle of the remote keypair, assigned at creation.
    pub id: Option<ResourceHandle>,
    /// Keypair name.
    pub name: String,
    /// Owning project; filled from the provider default when unset.
    pub project_name: Option<String>,
    /// Public key material.
    pub public_key: String,
}

/// Lifecycle driver for keypairs.
#[derive(Debug)]
pub struct KeypairDriver {
    client: SandwichClient,
    default_project: Option<String>,
}

impl KeypairDriver {
    /// Creates a new keypair driver.
    #[must_use]
    pub const fn new(client: SandwichClient, default_project: Option<String>) -> Self {
        Self {
            client,
            default_project,
        }
    }

    fn project_of(&self, record: &KeypairRecord) -> Result<String> {
        resolve_project(record.project_name.as_deref(), self.default_project.as_deref())
    }
}

#[async_trait]
impl ResourceLifecycle for KeypairDriver {
    type Record = KeypairRecord;

    fn kind(&self) -> &'static str {
        ResourceKind::Keypair.as_str()
    }

    async fn create(&self, record: &mut KeypairRecord) -> Result<()> {
        let project = self.project_of(record)?;
        record.project_name = Some(project.clone());
        info!("Creating keypair: {} in project {project}", record.name);

        let snapshot = self
            .client
            .keypairs(&project)
            .create(&record.name, &record.public_key)
            .await?;

        record.id = Some(ResourceHandle::from(snapshot.name));
        self.read(record).await.map(|_| ())
    }

    async fn read(&self, record: &mut KeypairRecord) -> Result<ReadOutcome> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        let project = self.project_of(record)?;

        match self.client.keypairs(&project).get(handle.as_str()).await {
            Ok(keypair) => {
                record.name = keypair.name;
                record.public_key = keypair.public_key;
                Ok(ReadOutcome::Present)
            }
            Err(err) if err.is_not_found() => {
                debug!("Keypair {handle} no longer exists, clearing record");
                record.id = None;
                Ok(ReadOutcome::Gone)
            }
            Err(err) => Err(err),
        }
    }

    async fn delete(&self, record: &mut KeypairRecord) -> Result<()> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        let project = self.project_of(record)?;
        info!("Deleting keypair: {handle}");

        match self.client.keypairs(&project).delete(handle.as_str()).await {
            Err(err) if err.is_not_found() => {}
            other => other?,
        }

        record.id = None;
        Ok(())
    }
}
