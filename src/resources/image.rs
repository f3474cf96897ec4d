//! Image lifecycle driver.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::SandwichClient;
use crate::error::{ProvisionError, Result};
use crate::identity::ResourceHandle;
use crate::states::{Operation, ResourceKind, poll_template};
use crate::waiter::{PollSpec, WaitSettings, await_state};

use super::{ReadOutcome, ResourceLifecycle, resolve_project};

/// Declarative record of one image. Images are addressed by name within
/// their project.
#[derive(Debug, Clone, Default)]
pub struct ImageRecord {
    /// Handle of the remote image, assigned at creation.
    pub id: Option<ResourceHandle>,
    /// Image name.
    pub name: String,
    /// Owning project; filled from the provider default when unset.
    pub project_name: Option<String>,
    /// Region the image file lives in.
    pub region_name: String,
    /// Backing file name in the region's image datastore.
    pub file_name: String,
}

/// Lifecycle driver for images.
#[derive(Debug)]
pub struct ImageDriver {
    client: SandwichClient,
    default_project: Option<String>,
    wait: WaitSettings,
}

impl ImageDriver {
    /// Creates a new image driver.
    #[must_use]
    pub fn new(client: SandwichClient, default_project: Option<String>) -> Self {
        Self {
            client,
            default_project,
            wait: WaitSettings::default(),
        }
    }

    /// Overrides the polling deadline and cadence.
    #[must_use]
    pub const fn with_wait_settings(mut self, wait: WaitSettings) -> Self {
        self.wait = wait;
        self
    }

    fn project_of(&self, record: &ImageRecord) -> Result<String> {
        resolve_project(record.project_name.as_deref(), self.default_project.as_deref())
    }

    async fn await_image(
        &self,
        project: &str,
        handle: &ResourceHandle,
        operation: Operation,
    ) -> Result<()> {
        let spec = PollSpec::new(
            ResourceKind::Image,
            handle,
            poll_template(ResourceKind::Image, operation),
            self.wait,
        );
        let images = self.client.images(project);
        await_state(&spec, || images.refresh_state(handle.as_str())).await?;
        Ok(())
    }
}

#[async_trait]
impl ResourceLifecycle for ImageDriver {
    type Record = ImageRecord;

    fn kind(&self) -> &'static str {
        ResourceKind::Image.as_str()
    }

    async fn create(&self, record: &mut ImageRecord) -> Result<()> {
        let project = self.project_of(record)?;
        record.project_name = Some(project.clone());
        info!("Creating image: {} in project {project}", record.name);

        let snapshot = self
            .client
            .images(&project)
            .create(&record.name, &record.region_name, &record.file_name)
            .await?;

        let handle = ResourceHandle::from(snapshot.name);
        record.id = Some(handle.clone());

        self.await_image(&project, &handle, Operation::Create).await?;
        info!("Image created: {handle}");

        self.read(record).await.map(|_| ())
    }

    async fn read(&self, record: &mut ImageRecord) -> Result<ReadOutcome> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        let project = self.project_of(record)?;

        match self.client.images(&project).get(handle.as_str()).await {
            Ok(image) => {
                record.name = image.name;
                record.region_name = image.region_name;
                record.file_name = image.file_name;
                Ok(ReadOutcome::Present)
            }
            Err(err) if err.is_not_found() => {
                debug!("Image {handle} no longer exists, clearing record");
                record.id = None;
                Ok(ReadOutcome::Gone)
            }
            Err(err) => Err(err),
        }
    }

    async fn delete(&self, record: &mut ImageRecord) -> Result<()> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        let project = self.project_of(record)?;
        info!("Deleting image: {handle}");

        match self.client.images(&project).delete(handle.as_str()).await {
            Err(err) if err.is_not_found() => {
                record.id = None;
                return Ok(());
            }
            other => other?,
        }

        self.await_image(&project, &handle, Operation::Delete).await?;
        record.id = None;
        info!("Image deleted: {handle}");
        Ok(())
    }
}
