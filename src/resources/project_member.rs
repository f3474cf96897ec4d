//! Project member lifecycle driver. Memberships apply synchronously, so no
//! polling is involved.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::SandwichClient;
use crate::error::{ProvisionError, Result};
use crate::identity::ResourceHandle;

use super::{ReadOutcome, ResourceLifecycle, resolve_project};

/// Declarative record of one project membership.
#[derive(Debug, Clone, Default)]
pub struct ProjectMemberRecord {
    /// Handle of the remote membership, assigned at creation.
    pub id: Option<ResourceHandle>,
    /// Owning project; filled from the provider default when unset.
    pub project_name: Option<String>,
    /// Member username.
    pub username: String,
    /// Authentication driver the username belongs to.
    pub driver: String,
    /// Roles granted to the member.
    pub roles: Vec<String>,
}

/// Lifecycle driver for project memberships.
#[derive(Debug)]
pub struct ProjectMemberDriver {
    client: SandwichClient,
    default_project: Option<String>,
}

impl ProjectMemberDriver {
    /// Creates a new project member driver.
    #[must_use]
    pub const fn new(client: SandwichClient, default_project: Option<String>) -> Self {
        Self {
            client,
            default_project,
        }
    }

    fn project_of(&self, record: &ProjectMemberRecord) -> Result<String> {
        resolve_project(record.project_name.as_deref(), self.default_project.as_deref())
    }
}

#[async_trait]
impl ResourceLifecycle for ProjectMemberDriver {
    type Record = ProjectMemberRecord;

    fn kind(&self) -> &'static str {
        "project member"
    }

    async fn create(&self, record: &mut ProjectMemberRecord) -> Result<()> {
        let project = self.project_of(record)?;
        record.project_name = Some(project.clone());
        info!("Adding member {} to project {project}", record.username);

        let member = self
            .client
            .projects()
            .add_member(&project, &record.username, &record.driver)
            .await?;

        record.id = Some(ResourceHandle::from(member.id));

        // Role grants converge through the update path.
        self.update(record).await
    }

    async fn read(&self, record: &mut ProjectMemberRecord) -> Result<ReadOutcome> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        let project = self.project_of(record)?;

        match self
            .client
            .projects()
            .get_member(&project, handle.as_str())
            .await
        {
            Ok(member) => {
                record.username = member.username;
                record.driver = member.driver;
                record.roles = member.roles;
                Ok(ReadOutcome::Present)
            }
            Err(err) if err.is_not_found() => {
                debug!("Project member {handle} no longer exists, clearing record");
                record.id = None;
                Ok(ReadOutcome::Gone)
            }
            Err(err) => Err(err),
        }
    }

    async fn update(&self, record: &mut ProjectMemberRecord) -> Result<()> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        let project = self.project_of(record)?;

        self.client
            .projects()
            .update_member(&project, handle.as_str(), &record.roles)
            .await?;

        self.read(record).await.map(|_| ())
    }

    async fn delete(&self, record: &mut ProjectMemberRecord) -> Result<()> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        let project = self.project_of(record)?;
        info!("Removing member {handle} from project {project}");

        self.client
            .projects()
            .remove_member(&project, handle.as_str())
            .await?;

        record.id = None;
        Ok(())
    }
}
