//! Project quota lifecycle driver.
//!
//! A quota is not created or destroyed — every project owns exactly one —
//! so "create" adopts the existing quota and "delete" merely forgets the
//! record.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::SandwichClient;
use crate::error::{ApiError, ProvisionError, Result};
use crate::identity::ResourceHandle;
use crate::states::ResourceKind;

use super::{ReadOutcome, ResourceLifecycle, resolve_project};

/// Declarative record of one project quota.
#[derive(Debug, Clone, Default)]
pub struct ProjectQuotaRecord {
    /// Handle (the project name), assigned at creation.
    pub id: Option<ResourceHandle>,
    /// Owning project; filled from the provider default when unset.
    pub project_name: Option<String>,
    /// Virtual CPU budget.
    pub vcpu: i64,
    /// RAM budget in megabytes.
    pub ram: i64,
    /// Disk budget in gigabytes.
    pub disk: i64,
}

/// Lifecycle driver for project quotas.
#[derive(Debug)]
pub struct ProjectQuotaDriver {
    client: SandwichClient,
    default_project: Option<String>,
}

impl ProjectQuotaDriver {
    /// Creates a new project quota driver.
    #[must_use]
    pub const fn new(client: SandwichClient, default_project: Option<String>) -> Self {
        Self {
            client,
            default_project,
        }
    }
}

#[async_trait]
impl ResourceLifecycle for ProjectQuotaDriver {
    type Record = ProjectQuotaRecord;

    fn kind(&self) -> &'static str {
        ResourceKind::Project.as_str()
    }

    async fn create(&self, record: &mut ProjectQuotaRecord) -> Result<()> {
        let project = resolve_project(
            record.project_name.as_deref(),
            self.default_project.as_deref(),
        )?;

        // Adopt the project's existing quota; a missing quota means the
        // project itself is unknown.
        match self.client.projects().get_quota(&project).await {
            Err(err) if err.is_not_found() => {
                return Err(ApiError::not_found(self.kind(), project).into());
            }
            other => other.map(|_| ())?,
        }

        record.project_name = Some(project.clone());
        record.id = Some(ResourceHandle::from(project));

        self.update(record).await
    }

    async fn read(&self, record: &mut ProjectQuotaRecord) -> Result<ReadOutcome> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };

        match self.client.projects().get_quota(handle.as_str()).await {
            Ok(quota) => {
                record.vcpu = quota.vcpu;
                record.ram = quota.ram;
                record.disk = quota.disk;
                Ok(ReadOutcome::Present)
            }
            Err(err) if err.is_not_found() => {
                debug!("Quota for project {handle} is gone, clearing record");
                record.id = None;
                Ok(ReadOutcome::Gone)
            }
            Err(err) => Err(err),
        }
    }

    async fn update(&self, record: &mut ProjectQuotaRecord) -> Result<()> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        info!(
            "Setting quota for project {handle}: vcpu={} ram={} disk={}",
            record.vcpu, record.ram, record.disk
        );

        self.client
            .projects()
            .set_quota(handle.as_str(), record.vcpu, record.ram, record.disk)
            .await?;

        self.read(record).await.map(|_| ())
    }

    async fn delete(&self, record: &mut ProjectQuotaRecord) -> Result<()> {
        // Quotas live and die with their project.
        record.id = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_create_adopts_and_sets_quota() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/web/quota"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "vcpu": 4, "ram": 8192, "disk": 100,
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/v1/projects/web/quota"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/web/quota"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "vcpu": 8, "ram": 16384, "disk": 200,
            })))
            .mount(&server)
            .await;

        let client = SandwichClient::new(&server.uri(), "test-token").unwrap();
        let driver = ProjectQuotaDriver::new(client, Some(String::from("web")));

        let mut record = ProjectQuotaRecord {
            vcpu: 8,
            ram: 16384,
            disk: 200,
            ..ProjectQuotaRecord::default()
        };

        driver.create(&mut record).await.unwrap();
        assert_eq!(record.id.as_ref().unwrap().as_str(), "web");
        assert_eq!(record.vcpu, 8);
        assert_eq!(record.ram, 16384);
    }

    #[tokio::test]
    async fn test_create_fails_for_unknown_project() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/missing/quota"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = SandwichClient::new(&server.uri(), "test-token").unwrap();
        let driver = ProjectQuotaDriver::new(client, None);

        let mut record = ProjectQuotaRecord {
            project_name: Some(String::from("missing")),
            ..ProjectQuotaRecord::default()
        };

        let err = driver.create(&mut record).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(record.id, None);
    }
}
