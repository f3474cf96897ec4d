//! Resource lifecycle drivers.
//!
//! One driver per resource kind translates a declarative record into the
//! Create → Poll → Read, Update → Poll or Delete → Poll sequence against
//! the control plane. Drivers are stateless between invocations and safe
//! to use concurrently for distinct handles; the only cross-invocation
//! coordination is the IAM policy lock owned by the policy drivers.

pub mod flavor;
pub mod image;
pub mod image_member;
pub mod instance;
pub mod keypair;
pub mod lookup;
pub mod network;
pub mod policy;
pub mod policy_binding;
pub mod policy_member;
pub mod project;
pub mod project_member;
pub mod project_quota;
pub mod region;
pub mod role;
pub mod service_account;
pub mod volume;
pub mod zone;

use async_trait::async_trait;

use crate::error::{ConfigError, ProvisionError, Result};

/// Result of a read hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The resource exists; the record was refreshed from the snapshot.
    Present,
    /// The resource no longer exists; the record's handle was cleared and
    /// the engine should drop the record.
    Gone,
}

impl ReadOutcome {
    /// Returns true if the resource still exists.
    #[must_use]
    pub const fn is_present(self) -> bool {
        matches!(self, Self::Present)
    }
}

/// The lifecycle hooks the declarative engine invokes, one record at a
/// time per resource instance.
///
/// Hooks mutate the record in place: `create` assigns the handle before
/// any polling starts (so an interrupted operation stays recoverable),
/// `read` copies every remote field into the record, and `delete` clears
/// the handle only after deletion is confirmed. Absence during `read` is a
/// silent clear ([`ReadOutcome::Gone`]), never an error; absence during
/// `create`/`update`/`delete` sub-steps follows each kind's documented
/// tolerance.
#[async_trait]
pub trait ResourceLifecycle: Send + Sync {
    /// The declarative record this driver reconciles.
    type Record: Send;

    /// Name of the resource kind, used in errors and logs.
    fn kind(&self) -> &'static str;

    /// Creates the remote resource and waits for it to become ready.
    async fn create(&self, record: &mut Self::Record) -> Result<()>;

    /// Refreshes the record from the remote resource.
    async fn read(&self, record: &mut Self::Record) -> Result<ReadOutcome>;

    /// Converges mutable fields with the minimal set of remote actions.
    ///
    /// Kinds whose engine-visible fields are all create-time-only do not
    /// override this.
    async fn update(&self, record: &mut Self::Record) -> Result<()> {
        let _ = record;
        Err(ProvisionError::UnsupportedOperation {
            kind: self.kind(),
            operation: "update",
        })
    }

    /// Deletes the remote resource and waits for it to disappear.
    async fn delete(&self, record: &mut Self::Record) -> Result<()>;
}

/// Resolves the project a record operates in: an explicit record field
/// wins, then the provider-level default.
///
/// # Errors
///
/// Returns [`ConfigError::MissingProjectName`] if neither is set.
pub fn resolve_project(
    record_project: Option<&str>,
    default_project: Option<&str>,
) -> Result<String> {
    record_project
        .or(default_project)
        .map(str::to_string)
        .ok_or_else(|| {
            ConfigError::MissingProjectName {
                field: "project_name",
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_project_prefers_record_field() {
        let project = resolve_project(Some("web"), Some("default")).unwrap();
        assert_eq!(project, "web");
    }

    #[test]
    fn test_resolve_project_falls_back_to_default() {
        let project = resolve_project(None, Some("default")).unwrap();
        assert_eq!(project, "default");
    }

    #[test]
    fn test_resolve_project_requires_some_value() {
        let err = resolve_project(None, None).unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::Config(ConfigError::MissingProjectName { .. })
        ));
    }
}
