//! Network lifecycle driver.

use std::net::IpAddr;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::SandwichClient;
use crate::error::{ProvisionError, Result};
use crate::identity::ResourceHandle;
use crate::states::{Operation, ResourceKind, poll_template};
use crate::waiter::{PollSpec, WaitSettings, await_state};

use super::{ReadOutcome, ResourceLifecycle};

/// Declarative record of one network. Networks are addressed by name.
#[derive(Debug, Clone)]
pub struct NetworkRecord {
    /// Handle of the remote network, assigned at creation.
    pub id: Option<ResourceHandle>,
    /// Network name.
    pub name: String,
    /// Owning region name.
    pub region_name: String,
    /// Backing port group.
    pub port_group: String,
    /// Network CIDR.
    pub cidr: String,
    /// Gateway address.
    pub gateway: IpAddr,
    /// First allocatable address.
    pub pool_start: IpAddr,
    /// Last allocatable address.
    pub pool_end: IpAddr,
    /// DNS servers handed to instances.
    pub dns_servers: Vec<IpAddr>,
}

/// Lifecycle driver for networks.
#[derive(Debug)]
pub struct NetworkDriver {
    client: SandwichClient,
    wait: WaitSettings,
}

impl NetworkDriver {
    /// Creates a new network driver.
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

    async fn await_network(&self, handle: &ResourceHandle, operation: Operation) -> Result<()> {
        let spec = PollSpec::new(
            ResourceKind::Network,
            handle,
            poll_template(ResourceKind::Network, operation),
            self.wait,
        );
        let networks = self.client.networks();
        await_state(&spec, || networks.refresh_state(handle.as_str())).await?;
        Ok(())
    }
}

#[async_trait]
impl ResourceLifecycle for NetworkDriver {
    type Record = NetworkRecord;

    fn kind(&self) -> &'static str {
        ResourceKind::Network.as_str()
    }

    async fn create(&self, record: &mut NetworkRecord) -> Result<()> {
        let networks = self.client.networks();
        info!("Creating network: {}", record.name);

        let snapshot = networks
            .create(
                &record.name,
                &record.region_name,
                &record.port_group,
                &record.cidr,
                record.gateway,
                record.pool_start,
                record.pool_end,
                &record.dns_servers,
            )
            .await?;

        let handle = ResourceHandle::from(snapshot.name);
        record.id = Some(handle.clone());

        self.await_network(&handle, Operation::Create).await?;
        info!("Network created: {handle}");

        self.read(record).await.map(|_| ())
    }

    async fn read(&self, record: &mut NetworkRecord) -> Result<ReadOutcome> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };

        match self.client.networks().get(handle.as_str()).await {
            Ok(network) => {
                record.name = network.name;
                record.region_name = network.region_name;
                record.port_group = network.port_group;
                record.cidr = network.cidr;
                record.gateway = network.gateway;
                record.pool_start = network.pool_start;
                record.pool_end = network.pool_end;
                record.dns_servers = network.dns_servers;
                Ok(ReadOutcome::Present)
            }
            Err(err) if err.is_not_found() => {
                debug!("Network {handle} no longer exists, clearing record");
                record.id = None;
                Ok(ReadOutcome::Gone)
            }
            Err(err) => Err(err),
        }
    }

    async fn delete(&self, record: &mut NetworkRecord) -> Result<()> {
        let Some(handle) = record.id.clone() else {
            return Err(ProvisionError::MissingHandle { kind: self.kind() });
        };
        info!("Deleting network: {handle}");

        match self.client.networks().delete(handle.as_str()).await {
            Err(err) if err.is_not_found() => {
                record.id = None;
                return Ok(());
            }
            other => other?,
        }

        self.await_network(&handle, Operation::Delete).await?;
        record.id = None;
        info!("Network deleted: {handle}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_delete_of_absent_network_clears_record() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/networks/internal"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = SandwichClient::new(&server.uri(), "test-token").unwrap();
        let driver = NetworkDriver::new(client).with_wait_settings(
            WaitSettings::default()
                .with_timeout(Duration::from_secs(1))
                .with_initial_delay(Duration::ZERO)
                .with_poll_interval(Duration::from_millis(10)),
        );

        let mut record = NetworkRecord {
            id: Some(ResourceHandle::from("internal")),
            name: String::from("internal"),
            region_name: String::from("us-east"),
            port_group: String::from("pg-1"),
            cidr: String::from("10.0.0.0/24"),
            gateway: "10.0.0.1".parse().unwrap(),
            pool_start: "10.0.0.10".parse().unwrap(),
            pool_end: "10.0.0.200".parse().unwrap(),
            dns_servers: vec!["10.0.0.2".parse().unwrap()],
        };

        driver.delete(&mut record).await.unwrap();
        assert_eq!(record.id, None);
    }
}
