//! Provider configuration and session bootstrap.
//!
//! A [`ProviderConfig`] carries the API server URL, the session token and
//! an optional default project. [`Provider::connect`] validates the
//! configuration against the control plane once, then hands out lifecycle
//! drivers that share the client and the IAM lock registry.

use std::sync::Arc;

use tracing::debug;

use crate::client::SandwichClient;
use crate::error::{ConfigError, Result};
use crate::iam::{IamScope, KeyedMutex};
use crate::resources::flavor::FlavorDriver;
use crate::resources::image::ImageDriver;
use crate::resources::image_member::ImageMemberDriver;
use crate::resources::instance::InstanceDriver;
use crate::resources::keypair::KeypairDriver;
use crate::resources::network::NetworkDriver;
use crate::resources::policy::PolicyDriver;
use crate::resources::policy_binding::PolicyBindingDriver;
use crate::resources::policy_member::PolicyMemberDriver;
use crate::resources::project::ProjectDriver;
use crate::resources::project_member::ProjectMemberDriver;
use crate::resources::project_quota::ProjectQuotaDriver;
use crate::resources::region::RegionDriver;
use crate::resources::role::RoleDriver;
use crate::resources::service_account::ServiceAccountDriver;
use crate::resources::volume::VolumeDriver;
use crate::resources::zone::ZoneDriver;

/// Environment variable holding the API server URL.
pub const ENV_API_SERVER: &str = "SANDWICH_API_SERVER";

/// Environment variable holding the session token.
pub const ENV_TOKEN: &str = "SANDWICH_TOKEN";

/// Environment variable holding the optional default project.
pub const ENV_PROJECT: &str = "SANDWICH_PROJECT";

/// Provider configuration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API server base URL.
    pub api_server: String,
    /// Session token attached to every request.
    pub token: String,
    /// Default project for project-scoped records that do not name one.
    pub project_name: Option<String>,
}

impl ProviderConfig {
    /// Creates a configuration from explicit values.
    #[must_use]
    pub fn new(api_server: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_server: api_server.into(),
            token: token.into(),
            project_name: None,
        }
    }

    /// Sets the default project.
    #[must_use]
    pub fn with_project(mut self, project_name: impl Into<String>) -> Self {
        self.project_name = Some(project_name.into());
        self
    }

    /// Loads the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if [`ENV_API_SERVER`] or [`ENV_TOKEN`] is unset.
    pub fn from_env() -> Result<Self> {
        let api_server = std::env::var(ENV_API_SERVER).map_err(|_| ConfigError::MissingValue {
            name: String::from(ENV_API_SERVER),
        })?;
        let token = std::env::var(ENV_TOKEN).map_err(|_| ConfigError::MissingValue {
            name: String::from(ENV_TOKEN),
        })?;
        let project_name = std::env::var(ENV_PROJECT).ok().filter(|p| !p.is_empty());

        Ok(Self {
            api_server,
            token,
            project_name,
        })
    }
}

/// A validated provider session: the root object the declarative engine
/// holds for the lifetime of a run.
#[derive(Debug)]
pub struct Provider {
    client: SandwichClient,
    project_name: Option<String>,
    iam_locks: Arc<KeyedMutex>,
}

impl Provider {
    /// Builds the client and validates the configuration against the
    /// control plane. A configured default project must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built or the configured
    /// project does not exist.
    pub async fn connect(config: ProviderConfig) -> Result<Self> {
        let client = SandwichClient::new(&config.api_server, &config.token)?;

        if let Some(name) = &config.project_name {
            debug!("Validating configured project '{name}'");
            match client.projects().get(name).await {
                Err(err) if err.is_not_found() => {
                    return Err(ConfigError::UnknownProject { name: name.clone() }.into());
                }
                other => other.map(|_| ())?,
            }
        }

        Ok(Self {
            client,
            project_name: config.project_name,
            iam_locks: Arc::new(KeyedMutex::new()),
        })
    }

    /// Returns the underlying API client.
    #[must_use]
    pub const fn client(&self) -> &SandwichClient {
        &self.client
    }

    /// Returns the configured default project, if any.
    #[must_use]
    pub fn default_project(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    /// Region lifecycle driver.
    #[must_use]
    pub fn regions(&self) -> RegionDriver {
        RegionDriver::new(self.client.clone())
    }

    /// Zone lifecycle driver.
    #[must_use]
    pub fn zones(&self) -> ZoneDriver {
        ZoneDriver::new(self.client.clone())
    }

    /// Network lifecycle driver.
    #[must_use]
    pub fn networks(&self) -> NetworkDriver {
        NetworkDriver::new(self.client.clone())
    }

    /// Image lifecycle driver.
    #[must_use]
    pub fn images(&self) -> ImageDriver {
        ImageDriver::new(self.client.clone(), self.project_name.clone())
    }

    /// Image member lifecycle driver.
    #[must_use]
    pub fn image_members(&self) -> ImageMemberDriver {
        ImageMemberDriver::new(self.client.clone())
    }

    /// Keypair lifecycle driver.
    #[must_use]
    pub fn keypairs(&self) -> KeypairDriver {
        KeypairDriver::new(self.client.clone(), self.project_name.clone())
    }

    /// Flavor lifecycle driver.
    #[must_use]
    pub fn flavors(&self) -> FlavorDriver {
        FlavorDriver::new(self.client.clone())
    }

    /// Instance lifecycle driver.
    #[must_use]
    pub fn instances(&self) -> InstanceDriver {
        InstanceDriver::new(self.client.clone())
    }

    /// Volume lifecycle driver.
    #[must_use]
    pub fn volumes(&self) -> VolumeDriver {
        VolumeDriver::new(self.client.clone())
    }

    /// Project lifecycle driver.
    #[must_use]
    pub fn projects(&self) -> ProjectDriver {
        ProjectDriver::new(self.client.clone())
    }

    /// Project quota lifecycle driver.
    #[must_use]
    pub fn project_quotas(&self) -> ProjectQuotaDriver {
        ProjectQuotaDriver::new(self.client.clone(), self.project_name.clone())
    }

    /// Project member lifecycle driver.
    #[must_use]
    pub fn project_members(&self) -> ProjectMemberDriver {
        ProjectMemberDriver::new(self.client.clone(), self.project_name.clone())
    }

    /// Role lifecycle driver for an IAM scope.
    #[must_use]
    pub fn roles(&self, scope: IamScope) -> RoleDriver {
        RoleDriver::new(self.client.clone(), scope)
    }

    /// Service-account lifecycle driver for an IAM scope.
    #[must_use]
    pub fn service_accounts(&self, scope: IamScope) -> ServiceAccountDriver {
        ServiceAccountDriver::new(self.client.clone(), scope)
    }

    /// Policy lifecycle driver for an IAM scope.
    #[must_use]
    pub fn policies(&self, scope: IamScope) -> PolicyDriver {
        PolicyDriver::new(self.client.clone(), scope, Arc::clone(&self.iam_locks))
    }

    /// Policy binding lifecycle driver for an IAM scope.
    #[must_use]
    pub fn policy_bindings(&self, scope: IamScope) -> PolicyBindingDriver {
        PolicyBindingDriver::new(self.client.clone(), scope, Arc::clone(&self.iam_locks))
    }

    /// Policy member lifecycle driver for an IAM scope.
    #[must_use]
    pub fn policy_members(&self, scope: IamScope) -> PolicyMemberDriver {
        PolicyMemberDriver::new(self.client.clone(), scope, Arc::clone(&self.iam_locks))
    }

    /// Resolves the IAM scope for a record-level project field, falling
    /// back to the provider default.
    ///
    /// # Errors
    ///
    /// Returns an error if neither the record nor the provider names a
    /// project.
    pub fn project_scope(&self, record_project: Option<&str>) -> Result<IamScope> {
        crate::resources::resolve_project(record_project, self.default_project())
            .map(IamScope::Project)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_connect_validates_configured_project() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/web"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "web" })))
            .expect(1)
            .mount(&server)
            .await;

        let config = ProviderConfig::new(server.uri(), "test-token").with_project("web");
        let provider = Provider::connect(config).await.unwrap();
        assert_eq!(provider.default_project(), Some("web"));
    }

    #[tokio::test]
    async fn test_connect_rejects_unknown_project() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let config = ProviderConfig::new(server.uri(), "test-token").with_project("ghost");
        let err = Provider::connect(config).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::ProvisionError::Config(ConfigError::UnknownProject { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_without_project_skips_validation() {
        let config = ProviderConfig::new("http://127.0.0.1:1", "test-token");
        // No project configured, so no probe is issued and connect
        // succeeds even though nothing listens on the address.
        let provider = Provider::connect(config).await.unwrap();
        assert_eq!(provider.default_project(), None);
    }
}
