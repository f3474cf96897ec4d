//! Policy lifecycle driver: owns the whole binding list of one IAM scope.
//!
//! The policy document always exists on the control plane; this resource
//! only manages its content. The record's handle is a synthetic UUID, and
//! deleting the record leaves the remote document in place.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::client::SandwichClient;
use crate::client::types::PolicyBinding;
use crate::error::{ProvisionError, Result};
use crate::iam::{IamScope, KeyedMutex, read_modify_write};
use crate::identity::ResourceHandle;

use super::{ReadOutcome, ResourceLifecycle};

/// Declarative record of one scope's policy.
#[derive(Debug, Clone, Default)]
pub struct PolicyRecord {
    /// Synthetic handle, assigned at creation.
    pub id: Option<ResourceHandle>,
    /// Desired bindings, replacing the remote list wholesale.
    pub bindings: Vec<PolicyBinding>,
}

/// Lifecycle driver for scope policies.
#[derive(Debug)]
pub struct PolicyDriver {
    client: SandwichClient,
    scope: IamScope,
    locks: Arc<KeyedMutex>,
}

impl PolicyDriver {
    /// Creates a new policy driver for the given scope.
    #[must_use]
    pub const fn new(client: SandwichClient, scope: IamScope, locks: Arc<KeyedMutex>) -> Self {
        Self {
            client,
            scope,
            locks,
        }
    }
}

#[async_trait]
impl ResourceLifecycle for PolicyDriver {
    type Record = PolicyRecord;

    fn kind(&self) -> &'static str {
        "policy"
    }

    async fn create(&self, record: &mut PolicyRecord) -> Result<()> {
        record.id = Some(ResourceHandle::from(Uuid::new_v4()));
        self.update(record).await
    }

    async fn read(&self, record: &mut PolicyRecord) -> Result<ReadOutcome> {
        if record.id.is_none() {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        }

        let policy = self.client.policies(&self.scope).get().await?;
        record.bindings = policy.bindings;
        Ok(ReadOutcome::Present)
    }

    async fn update(&self, record: &mut PolicyRecord) -> Result<()> {
        if record.id.is_none() {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        }
        info!(
            "Replacing policy bindings for {} ({} bindings)",
            self.scope,
            record.bindings.len()
        );

        let bindings = record.bindings.clone();
        let policies = self.client.policies(&self.scope);
        read_modify_write(&self.locks, &self.scope, &policies, move |policy| {
            policy.bindings = bindings;
        })
        .await?;

        self.read(record).await.map(|_| ())
    }

    async fn delete(&self, record: &mut PolicyRecord) -> Result<()> {
        // The remote document outlives the record.
        record.id = None;
        Ok(())
    }
}
