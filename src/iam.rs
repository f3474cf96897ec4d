//! IAM policy concurrency control.
//!
//! Policy bindings and members are edited through a shared policy document
//! per scope (system-wide or per-project). Concurrent get-modify-set cycles
//! against the same document would lose updates, so every cycle runs under
//! a named lock keyed by scope, created on demand in [`KeyedMutex`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::client::PolicyClient;
use crate::client::types::Policy;
use crate::error::Result;

/// The policy boundary a read-modify-write cycle operates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IamScope {
    /// The system-wide policy.
    System,
    /// The policy of one project.
    Project(String),
}

impl IamScope {
    /// Creates a project scope.
    #[must_use]
    pub fn project(name: impl Into<String>) -> Self {
        Self::Project(name.into())
    }

    /// Returns the key the scope's mutual-exclusion lock is registered
    /// under.
    #[must_use]
    pub fn lock_key(&self) -> &str {
        match self {
            Self::System => "system",
            Self::Project(name) => name,
        }
    }

    /// Returns the project name, or `None` for the system scope.
    #[must_use]
    pub fn project_name(&self) -> Option<&str> {
        match self {
            Self::System => None,
            Self::Project(name) => Some(name),
        }
    }

    /// Returns the API path prefix for IAM objects in this scope.
    pub(crate) fn base_path(&self) -> String {
        match self {
            Self::System => String::from("/v1/iam/system"),
            Self::Project(name) => format!("/v1/iam/projects/{name}"),
        }
    }
}

impl fmt::Display for IamScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::Project(name) => write!(f, "project '{name}'"),
        }
    }
}

/// Registry of named locks, created on demand.
///
/// The registry map itself is guarded by a blocking mutex held only while
/// looking up or inserting a lock; the per-key lock is asynchronous and may
/// be held across await points for the duration of a get-modify-set cycle.
#[derive(Debug, Default)]
pub struct KeyedMutex {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedMutex {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock registered under `key`, creating it if this is the
    /// first use of the key.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}

/// Runs one policy get-modify-set cycle under the scope's lock.
///
/// The lock is held across the whole cycle, so concurrent binding and
/// member edits within a scope serialize instead of overwriting each
/// other. Distinct scopes proceed independently.
///
/// # Errors
///
/// Returns an error if the policy cannot be fetched or stored.
pub async fn read_modify_write<F>(
    locks: &KeyedMutex,
    scope: &IamScope,
    policies: &PolicyClient<'_>,
    modify: F,
) -> Result<()>
where
    F: FnOnce(&mut Policy) + Send,
{
    let _guard = locks.lock(scope.lock_key()).await;
    debug!("Holding IAM policy lock for {scope}");

    let mut policy = policies.get().await?;
    modify(&mut policy);
    policies.set(&policy).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_same_key_serializes() {
        let locks = Arc::new(KeyedMutex::new());
        let active = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let active = Arc::clone(&active);
            let overlaps = Arc::clone(&overlaps);
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock("system").await;
                if active.fetch_add(1, Ordering::SeqCst) > 0 {
                    overlaps.fetch_add(1, Ordering::SeqCst);
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_are_independent() {
        let locks = KeyedMutex::new();
        let _system = locks.lock("system").await;

        // A different scope must not block behind the held system lock.
        let other = tokio::time::timeout(Duration::from_millis(100), locks.lock("web")).await;
        assert!(other.is_ok());
    }

    #[test]
    fn test_scope_lock_keys() {
        assert_eq!(IamScope::System.lock_key(), "system");
        assert_eq!(IamScope::project("web").lock_key(), "web");
        assert_eq!(IamScope::project("web").project_name(), Some("web"));
        assert_eq!(IamScope::System.project_name(), None);
    }
}
