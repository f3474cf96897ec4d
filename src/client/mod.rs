//! Sandwich control-plane API client.
//!
//! [`SandwichClient`] owns the transport (auth, timeouts, retry, error
//! classification); the per-kind clients borrow it and express one
//! endpoint family each. Drivers obtain them through the accessors below.

pub mod compute;
pub mod http;
pub mod iam;
pub mod location;
pub mod types;

pub use compute::{
    FlavorClient, ImageClient, ImageMemberClient, InstanceClient, KeypairClient, NetworkClient,
    NetworkPortClient, VolumeClient,
};
pub use http::SandwichClient;
pub use iam::{PolicyClient, ProjectClient, RoleClient, ServiceAccountClient};
pub use location::{RegionClient, ZoneClient};

use crate::iam::IamScope;

impl SandwichClient {
    /// Region operations.
    #[must_use]
    pub const fn regions(&self) -> RegionClient<'_> {
        RegionClient::new(self)
    }

    /// Zone operations.
    #[must_use]
    pub const fn zones(&self) -> ZoneClient<'_> {
        ZoneClient::new(self)
    }

    /// Network operations.
    #[must_use]
    pub const fn networks(&self) -> NetworkClient<'_> {
        NetworkClient::new(self)
    }

    /// Image operations within a project.
    #[must_use]
    pub const fn images<'a>(&'a self, project: &'a str) -> ImageClient<'a> {
        ImageClient::new(self, project)
    }

    /// Image member grants.
    #[must_use]
    pub const fn image_members(&self) -> ImageMemberClient<'_> {
        ImageMemberClient::new(self)
    }

    /// Keypair operations within a project.
    #[must_use]
    pub const fn keypairs<'a>(&'a self, project: &'a str) -> KeypairClient<'a> {
        KeypairClient::new(self, project)
    }

    /// Flavor operations.
    #[must_use]
    pub const fn flavors(&self) -> FlavorClient<'_> {
        FlavorClient::new(self)
    }

    /// Instance operations.
    #[must_use]
    pub const fn instances(&self) -> InstanceClient<'_> {
        InstanceClient::new(self)
    }

    /// Network port reads.
    #[must_use]
    pub const fn network_ports(&self) -> NetworkPortClient<'_> {
        NetworkPortClient::new(self)
    }

    /// Volume operations.
    #[must_use]
    pub const fn volumes(&self) -> VolumeClient<'_> {
        VolumeClient::new(self)
    }

    /// Project operations.
    #[must_use]
    pub const fn projects(&self) -> ProjectClient<'_> {
        ProjectClient::new(self)
    }

    /// Role operations within an IAM scope.
    #[must_use]
    pub const fn roles<'a>(&'a self, scope: &'a IamScope) -> RoleClient<'a> {
        RoleClient::new(self, scope)
    }

    /// Service-account operations within an IAM scope.
    #[must_use]
    pub const fn service_accounts<'a>(&'a self, scope: &'a IamScope) -> ServiceAccountClient<'a> {
        ServiceAccountClient::new(self, scope)
    }

    /// Policy-document operations within an IAM scope.
    #[must_use]
    pub const fn policies<'a>(&'a self, scope: &'a IamScope) -> PolicyClient<'a> {
        PolicyClient::new(self, scope)
    }
}
