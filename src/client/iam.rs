//! Clients for IAM resources: projects, quotas, memberships, roles,
//! service accounts and policies.
//!
//! Roles, service accounts and policies exist at both the system scope and
//! the project scope; their clients are parameterized by [`IamScope`]
//! instead of being duplicated per scope.

use serde_json::json;

use crate::error::Result;
use crate::iam::IamScope;
use crate::states::{ResourceKind, STATE_CREATED};

use super::http::SandwichClient;
use super::types::{
    Policy, ProjectMemberSnapshot, ProjectSnapshot, QuotaSnapshot, RoleSnapshot,
    ServiceAccountSnapshot,
};

/// Client for project operations.
#[derive(Debug, Clone, Copy)]
pub struct ProjectClient<'a> {
    http: &'a SandwichClient,
}

impl<'a> ProjectClient<'a> {
    pub(crate) const fn new(http: &'a SandwichClient) -> Self {
        Self { http }
    }

    /// Gets a project by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the project is not found or the API call fails.
    pub async fn get(&self, name: &str) -> Result<ProjectSnapshot> {
        self.http
            .get_json(
                &format!("/v1/projects/{name}"),
                ResourceKind::Project.as_str(),
                name,
            )
            .await
    }

    /// Creates a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the project cannot be created.
    pub async fn create(&self, name: &str) -> Result<ProjectSnapshot> {
        self.http
            .post_json(
                "/v1/projects",
                &json!({ "name": name }),
                ResourceKind::Project.as_str(),
                name,
            )
            .await
    }

    /// Deletes a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the project cannot be deleted.
    pub async fn delete(&self, name: &str) -> Result<()> {
        self.http
            .delete(
                &format!("/v1/projects/{name}"),
                ResourceKind::Project.as_str(),
                name,
            )
            .await
    }

    /// One state poll. Projects do not report a state label; a present
    /// project is simply `Created`, and deletion completes through the
    /// waiter's absence short-circuit.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn refresh_state(self, name: &str) -> Result<(ProjectSnapshot, String)> {
        let project = self.get(name).await?;
        Ok((project, String::from(STATE_CREATED)))
    }

    /// Gets a project's resource quota.
    ///
    /// # Errors
    ///
    /// Returns an error if the project is not found or the API call fails.
    pub async fn get_quota(&self, name: &str) -> Result<QuotaSnapshot> {
        self.http
            .get_json(
                &format!("/v1/projects/{name}/quota"),
                ResourceKind::Project.as_str(),
                name,
            )
            .await
    }

    /// Replaces a project's resource quota.
    ///
    /// # Errors
    ///
    /// Returns an error if the quota cannot be stored.
    pub async fn set_quota(&self, name: &str, vcpu: i64, ram: i64, disk: i64) -> Result<()> {
        self.http
            .put_empty(
                &format!("/v1/projects/{name}/quota"),
                &json!({ "vcpu": vcpu, "ram": ram, "disk": disk }),
                ResourceKind::Project.as_str(),
                name,
            )
            .await
    }

    /// Adds a member to a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the member cannot be added.
    pub async fn add_member(
        &self,
        project: &str,
        username: &str,
        driver: &str,
    ) -> Result<ProjectMemberSnapshot> {
        self.http
            .post_json(
                &format!("/v1/projects/{project}/members"),
                &json!({ "username": username, "driver": driver }),
                "project member",
                username,
            )
            .await
    }

    /// Gets a project member by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the member is not found or the API call fails.
    pub async fn get_member(&self, project: &str, id: &str) -> Result<ProjectMemberSnapshot> {
        self.http
            .get_json(
                &format!("/v1/projects/{project}/members/{id}"),
                "project member",
                id,
            )
            .await
    }

    /// Replaces the roles granted to a project member.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_member(&self, project: &str, id: &str, roles: &[String]) -> Result<()> {
        self.http
            .put_empty(
                &format!("/v1/projects/{project}/members/{id}"),
                &json!({ "roles": roles }),
                "project member",
                id,
            )
            .await
    }

    /// Removes a member from a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal fails.
    pub async fn remove_member(&self, project: &str, id: &str) -> Result<()> {
        self.http
            .delete(
                &format!("/v1/projects/{project}/members/{id}"),
                "project member",
                id,
            )
            .await
    }
}

/// Client for role operations within one IAM scope.
#[derive(Debug, Clone, Copy)]
pub struct RoleClient<'a> {
    http: &'a SandwichClient,
    scope: &'a IamScope,
}

impl<'a> RoleClient<'a> {
    pub(crate) const fn new(http: &'a SandwichClient, scope: &'a IamScope) -> Self {
        Self { http, scope }
    }

    fn path(&self, name: &str) -> String {
        format!("{}/roles/{name}", self.scope.base_path())
    }

    /// Gets a role by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the role is not found or the API call fails.
    pub async fn get(&self, name: &str) -> Result<RoleSnapshot> {
        self.http
            .get_json(&self.path(name), ResourceKind::Role.as_str(), name)
            .await
    }

    /// Creates a role.
    ///
    /// # Errors
    ///
    /// Returns an error if the role cannot be created.
    pub async fn create(&self, name: &str, permissions: &[String]) -> Result<RoleSnapshot> {
        self.http
            .post_json(
                &format!("{}/roles", self.scope.base_path()),
                &json!({ "name": name, "permissions": permissions }),
                ResourceKind::Role.as_str(),
                name,
            )
            .await
    }

    /// Replaces a role's permissions.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update(&self, name: &str, permissions: &[String]) -> Result<()> {
        self.http
            .put_empty(
                &self.path(name),
                &json!({ "permissions": permissions }),
                ResourceKind::Role.as_str(),
                name,
            )
            .await
    }

    /// Deletes a role.
    ///
    /// # Errors
    ///
    /// Returns an error if the role cannot be deleted.
    pub async fn delete(&self, name: &str) -> Result<()> {
        self.http
            .delete(&self.path(name), ResourceKind::Role.as_str(), name)
            .await
    }

    /// One state poll: the current snapshot and its state label.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn refresh_state(self, name: &str) -> Result<(RoleSnapshot, String)> {
        let role = self.get(name).await?;
        let state = role.state.clone();
        Ok((role, state))
    }
}

/// Client for service-account operations within one IAM scope.
#[derive(Debug, Clone, Copy)]
pub struct ServiceAccountClient<'a> {
    http: &'a SandwichClient,
    scope: &'a IamScope,
}

impl<'a> ServiceAccountClient<'a> {
    pub(crate) const fn new(http: &'a SandwichClient, scope: &'a IamScope) -> Self {
        Self { http, scope }
    }

    fn path(&self, name: &str) -> String {
        format!("{}/service-accounts/{name}", self.scope.base_path())
    }

    /// Gets a service account by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is not found or the API call fails.
    pub async fn get(&self, name: &str) -> Result<ServiceAccountSnapshot> {
        self.http
            .get_json(&self.path(name), ResourceKind::ServiceAccount.as_str(), name)
            .await
    }

    /// Creates a service account.
    ///
    /// # Errors
    ///
    /// Returns an error if the account cannot be created.
    pub async fn create(&self, name: &str) -> Result<ServiceAccountSnapshot> {
        self.http
            .post_json(
                &format!("{}/service-accounts", self.scope.base_path()),
                &json!({ "name": name }),
                ResourceKind::ServiceAccount.as_str(),
                name,
            )
            .await
    }

    /// Deletes a service account.
    ///
    /// # Errors
    ///
    /// Returns an error if the account cannot be deleted.
    pub async fn delete(&self, name: &str) -> Result<()> {
        self.http
            .delete(&self.path(name), ResourceKind::ServiceAccount.as_str(), name)
            .await
    }

    /// One state poll: the current snapshot and its state label.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn refresh_state(self, name: &str) -> Result<(ServiceAccountSnapshot, String)> {
        let account = self.get(name).await?;
        let state = account.state.clone();
        Ok((account, state))
    }
}

/// Client for the policy document of one IAM scope.
#[derive(Debug, Clone, Copy)]
pub struct PolicyClient<'a> {
    http: &'a SandwichClient,
    scope: &'a IamScope,
}

impl<'a> PolicyClient<'a> {
    pub(crate) const fn new(http: &'a SandwichClient, scope: &'a IamScope) -> Self {
        Self { http, scope }
    }

    fn path(&self) -> String {
        format!("{}/policy", self.scope.base_path())
    }

    /// Gets the scope's policy document.
    ///
    /// # Errors
    ///
    /// Returns an error if the policy cannot be fetched.
    pub async fn get(&self) -> Result<Policy> {
        self.http
            .get_json(&self.path(), "policy", self.scope.lock_key())
            .await
    }

    /// Replaces the scope's policy document.
    ///
    /// # Errors
    ///
    /// Returns an error if the policy cannot be stored.
    pub async fn set(&self, policy: &Policy) -> Result<()> {
        let body = serde_json::to_value(policy).map_err(|e| {
            crate::error::ApiError::invalid_response(format!("Failed to encode policy: {e}"))
        })?;
        self.http
            .put_empty(&self.path(), &body, "policy", self.scope.lock_key())
            .await
    }
}
