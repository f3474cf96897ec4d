//! Policy member lifecycle driver: owns one member entry within one role
//! binding of a scope policy.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::SandwichClient;
use crate::client::types::PolicyBinding;
use crate::error::{ProvisionError, Result};
use crate::iam::{IamScope, KeyedMutex, read_modify_write};
use crate::identity::PolicyMemberId;

use super::{ReadOutcome, ResourceLifecycle};

/// Declarative record of one policy member entry.
#[derive(Debug, Clone, Default)]
pub struct PolicyMemberRecord {
    /// Identifier of the entry, assigned at creation.
    pub id: Option<PolicyMemberId>,
    /// The bound role.
    pub role: String,
    /// The member entry.
    pub member: String,
}

/// Lifecycle driver for policy member entries within one IAM scope.
#[derive(Debug)]
pub struct PolicyMemberDriver {
    client: SandwichClient,
    scope: IamScope,
    locks: Arc<KeyedMutex>,
}

impl PolicyMemberDriver {
    /// Creates a new policy member driver for the given scope.
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
impl ResourceLifecycle for PolicyMemberDriver {
    type Record = PolicyMemberRecord;

    fn kind(&self) -> &'static str {
        "policy member"
    }

    async fn create(&self, record: &mut PolicyMemberRecord) -> Result<()> {
        let role = record.role.clone();
        let member = record.member.clone();
        info!(
            "Adding member '{member}' to role '{role}' in {}",
            self.scope
        );

        let policies = self.client.policies(&self.scope);
        read_modify_write(&self.locks, &self.scope, &policies, {
            let role = role.clone();
            let member = member.clone();
            move |policy| {
                if let Some(binding) = policy.bindings.iter_mut().find(|b| b.role == role) {
                    if !binding.members.contains(&member) {
                        binding.members.push(member);
                    }
                } else {
                    policy.bindings.push(PolicyBinding {
                        role,
                        members: vec![member],
                    });
                }
            }
        })
        .await?;

        record.id = Some(PolicyMemberId {
            project: self.scope.project_name().map(str::to_string),
            role,
            member,
        });

        self.read(record).await.map(|_| ())
    }

    async fn read(&self, record: &mut PolicyMemberRecord) -> Result<ReadOutcome> {
        let Some(id) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };

        let policy = self.client.policies(&self.scope).get().await?;
        let present = policy
            .bindings
            .iter()
            .filter(|binding| binding.role == id.role)
            .any(|binding| binding.members.contains(&id.member));

        if present {
            record.role = id.role;
            record.member = id.member;
            Ok(ReadOutcome::Present)
        } else {
            debug!(
                "Member '{}' is gone from role '{}' in {}, clearing record",
                id.member, id.role, self.scope
            );
            record.id = None;
            Ok(ReadOutcome::Gone)
        }
    }

    async fn delete(&self, record: &mut PolicyMemberRecord) -> Result<()> {
        let Some(id) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        info!(
            "Removing member '{}' from role '{}' in {}",
            id.member, id.role, self.scope
        );

        let policies = self.client.policies(&self.scope);
        read_modify_write(&self.locks, &self.scope, &policies, move |policy| {
            if let Some(binding) = policy.bindings.iter_mut().find(|b| b.role == id.role) {
                binding.members.retain(|m| *m != id.member);
            }
        })
        .await?;

        record.id = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    use super::*;
    use crate::client::types::Policy;

    /// In-memory policy document shared between the GET and PUT mocks.
    #[derive(Clone, Default)]
    struct PolicyStore(Arc<Mutex<Policy>>);

    struct GetPolicy(PolicyStore);

    impl Respond for GetPolicy {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            let policy = self.0.0.lock().unwrap().clone();
            ResponseTemplate::new(200).set_body_json(policy)
        }
    }

    struct PutPolicy(PolicyStore);

    impl Respond for PutPolicy {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let policy: Policy = serde_json::from_slice(&request.body).unwrap();
            *self.0.0.lock().unwrap() = policy;
            ResponseTemplate::new(204)
        }
    }

    async fn policy_server(store: &PolicyStore) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/iam/system/policy"))
            .respond_with(GetPolicy(store.clone()))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/v1/iam/system/policy"))
            .respond_with(PutPolicy(store.clone()))
            .mount(&server)
            .await;
        server
    }

    fn member_record(member: &str) -> PolicyMemberRecord {
        PolicyMemberRecord {
            id: None,
            role: String::from("viewer"),
            member: member.to_string(),
        }
    }

    #[tokio::test]
    async fn test_concurrent_adds_keep_both_members() {
        let store = PolicyStore::default();
        let server = policy_server(&store).await;

        let client = SandwichClient::new(&server.uri(), "test-token").unwrap();
        let locks = Arc::new(KeyedMutex::new());
        let driver = Arc::new(PolicyMemberDriver::new(client, IamScope::System, locks));

        let mut handles = Vec::new();
        for member in ["user:amara", "user:noor"] {
            let driver = Arc::clone(&driver);
            handles.push(tokio::spawn(async move {
                let mut record = member_record(member);
                driver.create(&mut record).await.unwrap();
                record
            }));
        }
        for handle in handles {
            let record = handle.await.unwrap();
            assert!(record.id.is_some());
        }

        let policy = store.0.lock().unwrap().clone();
        assert_eq!(policy.bindings.len(), 1);
        let binding = &policy.bindings[0];
        assert_eq!(binding.role, "viewer");
        assert!(binding.members.contains(&String::from("user:amara")));
        assert!(binding.members.contains(&String::from("user:noor")));
        assert_eq!(binding.members.len(), 2);
    }

    #[tokio::test]
    async fn test_repeated_add_is_idempotent() {
        let store = PolicyStore::default();
        let server = policy_server(&store).await;

        let client = SandwichClient::new(&server.uri(), "test-token").unwrap();
        let locks = Arc::new(KeyedMutex::new());
        let driver = PolicyMemberDriver::new(client, IamScope::System, locks);

        let mut first = member_record("user:amara");
        driver.create(&mut first).await.unwrap();
        let mut second = member_record("user:amara");
        driver.create(&mut second).await.unwrap();

        let policy = store.0.lock().unwrap().clone();
        assert_eq!(policy.bindings[0].members, vec![String::from("user:amara")]);
    }

    #[tokio::test]
    async fn test_delete_removes_only_the_member() {
        let store = PolicyStore::default();
        {
            let mut policy = store.0.lock().unwrap();
            policy.bindings.push(PolicyBinding {
                role: String::from("viewer"),
                members: vec![String::from("user:amara"), String::from("user:noor")],
            });
        }
        let server = policy_server(&store).await;

        let client = SandwichClient::new(&server.uri(), "test-token").unwrap();
        let locks = Arc::new(KeyedMutex::new());
        let driver = PolicyMemberDriver::new(client, IamScope::System, locks);

        let mut record = PolicyMemberRecord {
            id: Some(PolicyMemberId {
                project: None,
                role: String::from("viewer"),
                member: String::from("user:amara"),
            }),
            role: String::from("viewer"),
            member: String::from("user:amara"),
        };
        driver.delete(&mut record).await.unwrap();

        assert_eq!(record.id, None);
        let policy = store.0.lock().unwrap().clone();
        assert_eq!(policy.bindings[0].members, vec![String::from("user:noor")]);
    }
}
