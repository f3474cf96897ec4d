//! Volume lifecycle driver.
//!
//! Volumes are the only kind with long-running sub-operations: attach,
//! detach and grow run as tasks reported through a `task` field distinct
//! from the volume's rest state, and each action is followed by its own
//! task poll.

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::SandwichClient;
use crate::client::types::VolumeSnapshot;
use crate::error::{ProvisionError, Result};
use crate::identity::ResourceHandle;
use crate::states::{Operation, ResourceKind, TaskAction, poll_template, task_template};
use crate::waiter::{PollSpec, WaitSettings, await_state};

use super::{ReadOutcome, ResourceLifecycle};

/// Declarative record of one volume.
#[derive(Debug, Clone, Default)]
pub struct VolumeRecord {
    /// Handle of the remote volume, assigned at creation.
    pub id: Option<ResourceHandle>,
    /// Volume name.
    pub name: String,
    /// Placement zone.
    pub zone_id: Uuid,
    /// Desired size in gigabytes.
    pub size: u32,
    /// Optional source volume to clone instead of creating empty.
    pub cloned_from: Option<String>,
    /// Desired attachment target, if any.
    pub attached_to: Option<Uuid>,
}

/// Lifecycle driver for volumes.
#[derive(Debug)]
pub struct VolumeDriver {
    client: SandwichClient,
    wait: WaitSettings,
}

impl VolumeDriver {
    /// Creates a new volume driver.
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

    /// Waits for the volume to finish a lifecycle transition.
    async fn await_volume(
        &self,
        handle: &ResourceHandle,
        operation: Operation,
    ) -> Result<Option<VolumeSnapshot>> {
        let spec = PollSpec::new(
            ResourceKind::Volume,
            handle,
            poll_template(ResourceKind::Volume, operation),
            self.wait,
        );
        let volumes = self.client.volumes();
        await_state(&spec, || volumes.refresh_state(handle.as_str())).await
    }

    /// Waits for an attach/detach/grow task to clear.
    async fn await_task(&self, handle: &ResourceHandle, action: TaskAction) -> Result<()> {
        let spec = PollSpec::new(
            ResourceKind::Volume,
            handle,
            task_template(action),
            self.wait,
        );
        let volumes = self.client.volumes();
        await_state(&spec, || volumes.refresh_task(handle.as_str())).await?;
        Ok(())
    }

    /// Detaches the volume, treating "already detached" as success.
    async fn detach_tolerant(&self, handle: &ResourceHandle) -> Result<()> {
        match self.client.volumes().detach(handle.as_str()).await {
            Err(err) if err.is_conflict() => {
                debug!("Volume {handle} already detached");
                Ok(())
            }
            other => other,
        }
    }
}

#[async_trait]
impl ResourceLifecycle for VolumeDriver {
    type Record = VolumeRecord;

    fn kind(&self) -> &'static str {
        ResourceKind::Volume.as_str()
    }

    async fn create(&self, record: &mut VolumeRecord) -> Result<()> {
        let volumes = self.client.volumes();
        info!("Creating volume: {}", record.name);

        let snapshot = match &record.cloned_from {
            None => {
                volumes
                    .create(&record.name, record.zone_id, record.size)
                    .await?
            }
            Some(source) => {
                let source = volumes.get(source).await?;
                volumes
                    .clone_from(&source.id.to_string(), &record.name)
                    .await?
            }
        };

        // Record the handle before polling so an interrupted wait leaves a
        // recoverable record behind.
        let handle = ResourceHandle::from(snapshot.id);
        record.id = Some(handle.clone());

        self.await_volume(&handle, Operation::Create).await?;
        info!("Volume created: {} (ID: {handle})", record.name);

        // Size and attachment converge through the update path.
        self.update(record).await
    }

    async fn read(&self, record: &mut VolumeRecord) -> Result<ReadOutcome> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };

        match self.client.volumes().get(handle.as_str()).await {
            Ok(volume) => {
                record.name = volume.name;
                record.zone_id = volume.zone_id;
                record.size = volume.size;
                record.attached_to = volume.attached_to;
                Ok(ReadOutcome::Present)
            }
            Err(err) if err.is_not_found() => {
                debug!("Volume {handle} no longer exists, clearing record");
                record.id = None;
                Ok(ReadOutcome::Gone)
            }
            Err(err) => Err(err),
        }
    }

    async fn update(&self, record: &mut VolumeRecord) -> Result<()> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        let volumes = self.client.volumes();

        let volume = match volumes.get(handle.as_str()).await {
            Ok(volume) => volume,
            Err(err) if err.is_not_found() => {
                record.id = None;
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let attachment_changed = volume.attached_to != record.attached_to;

        if attachment_changed && volume.attached_to.is_some() {
            info!("Detaching volume: {handle}");
            self.detach_tolerant(&handle).await?;
            self.await_task(&handle, TaskAction::Detach).await?;
        }

        if volume.size != record.size {
            info!(
                "Growing volume {handle} from {} GB to {} GB",
                volume.size, record.size
            );
            volumes.grow(handle.as_str(), record.size).await?;
            self.await_task(&handle, TaskAction::Grow).await?;
        }

        if attachment_changed {
            if let Some(instance_id) = record.attached_to {
                info!("Attaching volume {handle} to instance {instance_id}");
                volumes.attach(handle.as_str(), instance_id).await?;
                self.await_task(&handle, TaskAction::Attach).await?;
            }
        }

        self.read(record).await.map(|_| ())
    }

    async fn delete(&self, record: &mut VolumeRecord) -> Result<()> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        let volumes = self.client.volumes();
        info!("Deleting volume: {handle}");

        self.detach_tolerant(&handle).await?;
        self.await_task(&handle, TaskAction::Detach).await?;

        volumes.delete(handle.as_str()).await?;
        self.await_volume(&handle, Operation::Delete).await?;

        record.id = None;
        info!("Volume deleted: {handle}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const VOLUME_ID: &str = "1f0e938e-9e43-4e6c-a2b5-14f79b1cb5a1";
    const ZONE_ID: &str = "74a9b5f1-5d77-4b63-9bb4-9d8f7b9f3f01";
    const INSTANCE_ID: &str = "e3b31f52-6c91-41f7-8c33-0a5c67d6e0cd";

    fn fast_wait() -> WaitSettings {
        WaitSettings::default()
            .with_timeout(Duration::from_secs(2))
            .with_initial_delay(Duration::ZERO)
            .with_poll_interval(Duration::from_millis(10))
    }

    async fn driver_for(server: &MockServer) -> VolumeDriver {
        let client = SandwichClient::new(&server.uri(), "test-token").unwrap();
        VolumeDriver::new(client).with_wait_settings(fast_wait())
    }

    fn volume_body(state: &str, task: Option<&str>, attached_to: Option<&str>, size: u32) -> serde_json::Value {
        json!({
            "id": VOLUME_ID,
            "name": "data",
            "zone_id": ZONE_ID,
            "size": size,
            "attached_to": attached_to,
            "state": state,
            "task": task,
        })
    }

    #[tokio::test]
    async fn test_create_polls_until_created() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/volumes"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(volume_body("ToCreate", None, None, 10)),
            )
            .expect(1)
            .mount(&server)
            .await;

        // Two pending polls, then ready; the trailing mock also serves the
        // final read.
        Mock::given(method("GET"))
            .and(path(format!("/v1/volumes/{VOLUME_ID}")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(volume_body("Creating", None, None, 10)),
            )
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/v1/volumes/{VOLUME_ID}")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(volume_body("Created", None, None, 10)),
            )
            .mount(&server)
            .await;

        let driver = driver_for(&server).await;
        let mut record = VolumeRecord {
            name: String::from("data"),
            zone_id: ZONE_ID.parse().unwrap(),
            size: 10,
            ..VolumeRecord::default()
        };

        driver.create(&mut record).await.unwrap();

        assert_eq!(record.id.as_ref().unwrap().as_str(), VOLUME_ID);
        assert_eq!(record.size, 10);
        assert_eq!(record.attached_to, None);
    }

    #[tokio::test]
    async fn test_delete_tolerates_conflict_and_absence() {
        let server = MockServer::start().await;

        // Already detached: the pre-delete detach conflicts, which the
        // driver treats as success.
        Mock::given(method("POST"))
            .and(path(format!("/v1/volumes/{VOLUME_ID}/action/detach")))
            .respond_with(ResponseTemplate::new(409).set_body_string("volume is not attached"))
            .expect(1)
            .mount(&server)
            .await;

        // One read for the task poll (at rest), then the volume vanishes
        // and the deletion poll completes through absence on its first
        // refresh.
        Mock::given(method("GET"))
            .and(path(format!("/v1/volumes/{VOLUME_ID}")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(volume_body("Created", None, None, 10)),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("/v1/volumes/{VOLUME_ID}")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/v1/volumes/{VOLUME_ID}")))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let driver = driver_for(&server).await;
        let mut record = VolumeRecord {
            id: Some(ResourceHandle::from(VOLUME_ID)),
            name: String::from("data"),
            zone_id: ZONE_ID.parse().unwrap(),
            size: 10,
            ..VolumeRecord::default()
        };

        driver.delete(&mut record).await.unwrap();
        assert_eq!(record.id, None);
    }

    #[tokio::test]
    async fn test_update_detaches_when_attachment_removed() {
        let server = MockServer::start().await;

        // Observed: attached. Desired: detached.
        Mock::given(method("GET"))
            .and(path(format!("/v1/volumes/{VOLUME_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(volume_body(
                "Created",
                None,
                Some(INSTANCE_ID),
                10,
            )))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("/v1/volumes/{VOLUME_ID}/action/detach")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/v1/volumes/{VOLUME_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(volume_body(
                "Created",
                Some("DETACHING"),
                Some(INSTANCE_ID),
                10,
            )))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/v1/volumes/{VOLUME_ID}")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(volume_body("Created", None, None, 10)),
            )
            .mount(&server)
            .await;

        // An unchanged size and a removed attachment must not grow or
        // re-attach anything.
        Mock::given(method("POST"))
            .and(path(format!("/v1/volumes/{VOLUME_ID}/action/attach")))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("/v1/volumes/{VOLUME_ID}/action/grow")))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let driver = driver_for(&server).await;
        let mut record = VolumeRecord {
            id: Some(ResourceHandle::from(VOLUME_ID)),
            name: String::from("data"),
            zone_id: ZONE_ID.parse().unwrap(),
            size: 10,
            ..VolumeRecord::default()
        };

        driver.update(&mut record).await.unwrap();
        assert_eq!(record.attached_to, None);
    }
}
