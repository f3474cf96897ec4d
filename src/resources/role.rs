//! Role lifecycle driver, shared by the system and project IAM scopes.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::SandwichClient;
use crate::error::{ProvisionError, Result};
use crate::iam::IamScope;
use crate::identity::ResourceHandle;
use crate::states::{Operation, ResourceKind, poll_template};
use crate::waiter::{PollSpec, WaitSettings, await_state};

use super::{ReadOutcome, ResourceLifecycle};

/// Declarative record of one role.
#[derive(Debug, Clone, Default)]
pub struct RoleRecord {
    /// Handle of the remote role, assigned at creation.
    pub id: Option<ResourceHandle>,
    /// Role name.
    pub name: String,
    /// Permissions granted by the role.
    pub permissions: Vec<String>,
}

/// Lifecycle driver for roles within one IAM scope.
#[derive(Debug)]
pub struct RoleDriver {
    client: SandwichClient,
    scope: IamScope,
    wait: WaitSettings,
}

impl RoleDriver {
    /// Creates a new role driver for the given scope.
    #[must_use]
    pub fn new(client: SandwichClient, scope: IamScope) -> Self {
        Self {
            client,
            scope,
            wait: WaitSettings::default(),
        }
    }

    /// Overrides the polling deadline and cadence.
    #[must_use]
    pub const fn with_wait_settings(mut self, wait: WaitSettings) -> Self {
        self.wait = wait;
        self
    }

    async fn await_role(&self, handle: &ResourceHandle, operation: Operation) -> Result<()> {
        let spec = PollSpec::new(
            ResourceKind::Role,
            handle,
            poll_template(ResourceKind::Role, operation),
            self.wait,
        );
        let roles = self.client.roles(&self.scope);
        await_state(&spec, || roles.refresh_state(handle.as_str())).await?;
        Ok(())
    }
}

#[async_trait]
impl ResourceLifecycle for RoleDriver {
    type Record = RoleRecord;

    fn kind(&self) -> &'static str {
        ResourceKind::Role.as_str()
    }

    async fn create(&self, record: &mut RoleRecord) -> Result<()> {
        info!("Creating role: {} in scope {}", record.name, self.scope);

        let snapshot = self
            .client
            .roles(&self.scope)
            .create(&record.name, &record.permissions)
            .await?;

        let handle = ResourceHandle::from(snapshot.name);
        record.id = Some(handle.clone());

        self.await_role(&handle, Operation::Create).await?;
        info!("Role created: {handle}");

        self.read(record).await.map(|_| ())
    }

    async fn read(&self, record: &mut RoleRecord) -> Result<ReadOutcome> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };

        match self.client.roles(&self.scope).get(handle.as_str()).await {
            Ok(role) => {
                record.name = role.name;
                record.permissions = role.permissions;
                Ok(ReadOutcome::Present)
            }
            Err(err) if err.is_not_found() => {
                debug!("Role {handle} no longer exists, clearing record");
                record.id = None;
                Ok(ReadOutcome::Gone)
            }
            Err(err) => Err(err),
        }
    }

    async fn update(&self, record: &mut RoleRecord) -> Result<()> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };

        match self
            .client
            .roles(&self.scope)
            .update(handle.as_str(), &record.permissions)
            .await
        {
            Err(err) if err.is_not_found() => {
                record.id = None;
                return Ok(());
            }
            other => other?,
        }

        self.read(record).await.map(|_| ())
    }

    async fn delete(&self, record: &mut RoleRecord) -> Result<()> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        info!("Deleting role: {handle}");

        match self.client.roles(&self.scope).delete(handle.as_str()).await {
            Err(err) if err.is_not_found() => {
                record.id = None;
                return Ok(());
            }
            other => other?,
        }

        self.await_role(&handle, Operation::Delete).await?;
        record.id = None;
        info!("Role deleted: {handle}");
        Ok(())
    }
}
