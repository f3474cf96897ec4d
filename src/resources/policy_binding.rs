//! Policy binding lifecycle driver: owns one role's member list within a
//! scope policy.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::SandwichClient;
use crate::client::types::PolicyBinding;
use crate::error::{ProvisionError, Result};
use crate::iam::{IamScope, KeyedMutex, read_modify_write};
use crate::identity::PolicyBindingId;

use super::{ReadOutcome, ResourceLifecycle};

/// Declarative record of one policy binding.
#[derive(Debug, Clone, Default)]
pub struct PolicyBindingRecord {
    /// Identifier of the binding, assigned at creation.
    pub id: Option<PolicyBindingId>,
    /// The bound role.
    pub role: String,
    /// Members granted the role.
    pub members: Vec<String>,
}

/// Lifecycle driver for policy bindings within one IAM scope.
#[derive(Debug)]
pub struct PolicyBindingDriver {
    client: SandwichClient,
    scope: IamScope,
    locks: Arc<KeyedMutex>,
}

impl PolicyBindingDriver {
    /// Creates a new policy binding driver for the given scope.
    #[must_use]
    pub const fn new(client: SandwichClient, scope: IamScope, locks: Arc<KeyedMutex>) -> Self {
        Self {
            client,
            scope,
            locks,
        }
    }

    fn binding_id(&self, role: &str) -> PolicyBindingId {
        PolicyBindingId {
            project: self.scope.project_name().map(str::to_string),
            role: role.to_string(),
        }
    }
}

#[async_trait]
impl ResourceLifecycle for PolicyBindingDriver {
    type Record = PolicyBindingRecord;

    fn kind(&self) -> &'static str {
        "policy binding"
    }

    async fn create(&self, record: &mut PolicyBindingRecord) -> Result<()> {
        record.id = Some(self.binding_id(&record.role));
        self.update(record).await
    }

    async fn read(&self, record: &mut PolicyBindingRecord) -> Result<ReadOutcome> {
        let Some(id) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };

        let policy = self.client.policies(&self.scope).get().await?;
        match policy.bindings.into_iter().find(|b| b.role == id.role) {
            Some(binding) => {
                record.role = binding.role;
                record.members = binding.members;
                Ok(ReadOutcome::Present)
            }
            None => {
                debug!(
                    "Binding for role '{}' is gone from {}, clearing record",
                    id.role, self.scope
                );
                record.id = None;
                Ok(ReadOutcome::Gone)
            }
        }
    }

    async fn update(&self, record: &mut PolicyBindingRecord) -> Result<()> {
        let Some(id) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        info!(
            "Setting binding for role '{}' in {} ({} members)",
            id.role,
            self.scope,
            record.members.len()
        );

        let binding = PolicyBinding {
            role: record.role.clone(),
            members: record.members.clone(),
        };
        let policies = self.client.policies(&self.scope);
        read_modify_write(&self.locks, &self.scope, &policies, move |policy| {
            match policy.bindings.iter_mut().find(|b| b.role == id.role) {
                Some(existing) => *existing = binding,
                None => policy.bindings.push(binding),
            }
        })
        .await?;

        self.read(record).await.map(|_| ())
    }

    async fn delete(&self, record: &mut PolicyBindingRecord) -> Result<()> {
        let Some(id) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        info!("Removing binding for role '{}' from {}", id.role, self.scope);

        let policies = self.client.policies(&self.scope);
        read_modify_write(&self.locks, &self.scope, &policies, move |policy| {
            policy.bindings.retain(|b| b.role != id.role);
        })
        .await?;

        record.id = None;
        Ok(())
    }
}
