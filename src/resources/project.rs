//! Project lifecycle driver.
//!
//! Projects create synchronously but tear down asynchronously: a deleted
//! project keeps answering reads as `Created` until the control plane has
//! drained it, so only the delete path polls.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::SandwichClient;
use crate::error::{ProvisionError, Result};
use crate::identity::ResourceHandle;
use crate::states::{Operation, ResourceKind, poll_template};
use crate::waiter::{PollSpec, WaitSettings, await_state};

use super::{ReadOutcome, ResourceLifecycle};

/// Declarative record of one project.
#[derive(Debug, Clone, Default)]
pub struct ProjectRecord {
    /// Handle of the remote project, assigned at creation.
    pub id: Option<ResourceHandle>,
    /// Project name.
    pub name: String,
}

/// Lifecycle driver for projects.
#[derive(Debug)]
pub struct ProjectDriver {
    client: SandwichClient,
    wait: WaitSettings,
}

impl ProjectDriver {
    /// Creates a new project driver.
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
}

#[async_trait]
impl ResourceLifecycle for ProjectDriver {
    type Record = ProjectRecord;

    fn kind(&self) -> &'static str {
        ResourceKind::Project.as_str()
    }

    async fn create(&self, record: &mut ProjectRecord) -> Result<()> {
        info!("Creating project: {}", record.name);

        let snapshot = self.client.projects().create(&record.name).await?;
        record.id = Some(ResourceHandle::from(snapshot.name));

        self.read(record).await.map(|_| ())
    }

    async fn read(&self, record: &mut ProjectRecord) -> Result<ReadOutcome> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };

        match self.client.projects().get(handle.as_str()).await {
            Ok(project) => {
                record.name = project.name;
                Ok(ReadOutcome::Present)
            }
            Err(err) if err.is_not_found() => {
                debug!("Project {handle} no longer exists, clearing record");
                record.id = None;
                Ok(ReadOutcome::Gone)
            }
            Err(err) => Err(err),
        }
    }

    async fn delete(&self, record: &mut ProjectRecord) -> Result<()> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        let projects = self.client.projects();
        info!("Deleting project: {handle}");

        match projects.delete(handle.as_str()).await {
            Err(err) if err.is_not_found() => {
                record.id = None;
                return Ok(());
            }
            other => other?,
        }

        let spec = PollSpec::new(
            ResourceKind::Project,
            &handle,
            poll_template(ResourceKind::Project, Operation::Delete),
            self.wait,
        );
        await_state(&spec, || projects.refresh_state(handle.as_str())).await?;

        record.id = None;
        info!("Project deleted: {handle}");
        Ok(())
    }
}
