//! Service-account lifecycle driver, shared by the system and project IAM
//! scopes.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::SandwichClient;
use crate::error::{ProvisionError, Result};
use crate::iam::IamScope;
use crate::identity::ResourceHandle;
use crate::states::{Operation, ResourceKind, poll_template};
use crate::waiter::{PollSpec, WaitSettings, await_state};

use super::{ReadOutcome, ResourceLifecycle};

/// Declarative record of one service account.
#[derive(Debug, Clone, Default)]
pub struct ServiceAccountRecord {
    /// Handle of the remote account, assigned at creation.
    pub id: Option<ResourceHandle>,
    /// Account name.
    pub name: String,
    /// Server-assigned email address.
    pub email: Option<String>,
}

/// Lifecycle driver for service accounts within one IAM scope.
#[derive(Debug)]
pub struct ServiceAccountDriver {
    client: SandwichClient,
    scope: IamScope,
    wait: WaitSettings,
}

impl ServiceAccountDriver {
    /// Creates a new service-account driver for the given scope.
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

    async fn await_account(&self, handle: &ResourceHandle, operation: Operation) -> Result<()> {
        let spec = PollSpec::new(
            ResourceKind::ServiceAccount,
            handle,
            poll_template(ResourceKind::ServiceAccount, operation),
            self.wait,
        );
        let accounts = self.client.service_accounts(&self.scope);
        await_state(&spec, || accounts.refresh_state(handle.as_str())).await?;
        Ok(())
    }
}

#[async_trait]
impl ResourceLifecycle for ServiceAccountDriver {
    type Record = ServiceAccountRecord;

    fn kind(&self) -> &'static str {
        ResourceKind::ServiceAccount.as_str()
    }

    async fn create(&self, record: &mut ServiceAccountRecord) -> Result<()> {
        info!(
            "Creating service account: {} in scope {}",
            record.name, self.scope
        );

        let snapshot = self
            .client
            .service_accounts(&self.scope)
            .create(&record.name)
            .await?;

        let handle = ResourceHandle::from(snapshot.name);
        record.email = snapshot.email;
        record.id = Some(handle.clone());

        self.await_account(&handle, Operation::Create).await?;
        info!("Service account created: {handle}");

        self.read(record).await.map(|_| ())
    }

    async fn read(&self, record: &mut ServiceAccountRecord) -> Result<ReadOutcome> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };

        match self
            .client
            .service_accounts(&self.scope)
            .get(handle.as_str())
            .await
        {
            Ok(account) => {
                record.name = account.name;
                record.email = account.email;
                Ok(ReadOutcome::Present)
            }
            Err(err) if err.is_not_found() => {
                debug!("Service account {handle} no longer exists, clearing record");
                record.id = None;
                Ok(ReadOutcome::Gone)
            }
            Err(err) => Err(err),
        }
    }

    async fn delete(&self, record: &mut ServiceAccountRecord) -> Result<()> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        info!("Deleting service account: {handle}");

        match self
            .client
            .service_accounts(&self.scope)
            .delete(handle.as_str())
            .await
        {
            Err(err) if err.is_not_found() => {
                record.id = None;
                return Ok(());
            }
            other => other?,
        }

        self.await_account(&handle, Operation::Delete).await?;
        record.id = None;
        info!("Service account deleted: {handle}");
        Ok(())
    }
}
