//! Image member lifecycle driver.
//!
//! An image member is a relationship resource: one project's access to one
//! shared image. It has no state of its own and never polls; its identity
//! is the structured [`ImageMemberId`] pair.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::SandwichClient;
use crate::error::{ProvisionError, Result};
use crate::identity::ImageMemberId;
use crate::states::ResourceKind;

use super::{ReadOutcome, ResourceLifecycle};

/// Declarative record of one image member grant.
#[derive(Debug, Clone, Default)]
pub struct ImageMemberRecord {
    /// Identifier of the grant, assigned at creation.
    pub id: Option<ImageMemberId>,
    /// The shared image.
    pub image_id: String,
    /// The project granted access.
    pub project_id: String,
}

/// Lifecycle driver for image member grants.
#[derive(Debug)]
pub struct ImageMemberDriver {
    client: SandwichClient,
}

impl ImageMemberDriver {
    /// Creates a new image member driver.
    #[must_use]
    pub const fn new(client: SandwichClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceLifecycle for ImageMemberDriver {
    type Record = ImageMemberRecord;

    fn kind(&self) -> &'static str {
        ResourceKind::Image.as_str()
    }

    async fn create(&self, record: &mut ImageMemberRecord) -> Result<()> {
        info!(
            "Granting project {} access to image {}",
            record.project_id, record.image_id
        );

        self.client
            .image_members()
            .add(&record.image_id, &record.project_id)
            .await?;

        record.id = Some(ImageMemberId {
            image_id: record.image_id.clone(),
            project_id: record.project_id.clone(),
        });

        self.read(record).await.map(|_| ())
    }

    async fn read(&self, record: &mut ImageMemberRecord) -> Result<ReadOutcome> {
        let Some(id) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };

        let members = match self.client.image_members().list(&id.image_id).await {
            Ok(members) => members,
            Err(err) if err.is_not_found() => {
                debug!("Image {} no longer exists, clearing grant record", id.image_id);
                record.id = None;
                return Ok(ReadOutcome::Gone);
            }
            Err(err) => return Err(err),
        };

        if members
            .members
            .iter()
            .any(|member| member.project_id == id.project_id)
        {
            record.image_id = id.image_id;
            record.project_id = id.project_id;
            return Ok(ReadOutcome::Present);
        }

        debug!(
            "Project {} is no longer a member of image {}, clearing grant record",
            id.project_id, id.image_id
        );
        record.id = None;
        Ok(ReadOutcome::Gone)
    }

    async fn delete(&self, record: &mut ImageMemberRecord) -> Result<()> {
        let Some(id) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        info!(
            "Revoking project {} access to image {}",
            id.project_id, id.image_id
        );

        self.client
            .image_members()
            .remove(&id.image_id, &id.project_id)
            .await?;

        record.id = None;
        Ok(())
    }
}
