//! Generic asynchronous state-transition waiter.
//!
//! Mutating control-plane calls return before the resource has converged:
//! a created volume is still `Creating`, a deleted instance lingers in
//! `Deleting`. [`await_state`] drives one resource from a pending state to
//! a caller-specified target state by strictly sequential reads, with a
//! single classification policy shared by every resource kind — absence,
//! timeout and unexpected-state handling are decided here, not at the
//! ~15 call sites.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::{Result, WaitError};
use crate::identity::ResourceHandle;
use crate::states::{PollTemplate, ResourceKind, STATE_DELETED};

/// Default deadline for one lifecycle operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Default delay before the first poll after a mutating call.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(10);

/// Default (and minimum) interval between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Timing configuration for state polls.
#[derive(Debug, Clone, Copy)]
pub struct WaitSettings {
    /// Total deadline, measured from the [`await_state`] call.
    pub timeout: Duration,
    /// Sleep before the first refresh.
    pub initial_delay: Duration,
    /// Sleep between refreshes; also the floor of the growing interval.
    pub poll_interval: Duration,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            initial_delay: DEFAULT_INITIAL_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitSettings {
    /// Replaces the operation deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replaces the delay before the first refresh.
    #[must_use]
    pub const fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Replaces the interval between refreshes.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// One fully specified poll: which resource is watched, which labels mean
/// "still converging", which mean "done", and how long to keep trying.
#[derive(Debug, Clone)]
pub struct PollSpec {
    /// Kind of the polled resource, for diagnostics.
    pub kind: ResourceKind,
    /// Handle of the polled resource.
    pub handle: ResourceHandle,
    /// Labels safe to re-poll. Must be disjoint from `target`.
    pub pending: &'static [&'static str],
    /// Labels that complete the poll.
    pub target: &'static [&'static str],
    /// Total deadline, measured from the [`await_state`] call.
    pub timeout: Duration,
    /// Sleep before the first refresh.
    pub initial_delay: Duration,
    /// Sleep between refreshes; also the floor of the growing interval.
    pub poll_interval: Duration,
}

impl PollSpec {
    /// Builds a spec from a label template and timing settings.
    #[must_use]
    pub fn new(
        kind: ResourceKind,
        handle: &ResourceHandle,
        template: PollTemplate,
        settings: WaitSettings,
    ) -> Self {
        Self {
            kind,
            handle: handle.clone(),
            pending: template.pending,
            target: template.target,
            timeout: settings.timeout,
            initial_delay: settings.initial_delay,
            poll_interval: settings.poll_interval,
        }
    }
}

/// Polls a resource until it reaches a target state.
///
/// `refresh` must be a pure query: one remote read returning the current
/// snapshot and its state label. It is invoked strictly sequentially — at
/// most one refresh is outstanding at any time — and the waiter itself
/// never mutates remote state.
///
/// After an `initial_delay` sleep the waiter loops: a label in `target`
/// returns `Ok(Some(snapshot))`; a label in `pending` sleeps and retries,
/// with the sleep starting at `poll_interval` and doubling each round
/// (never below `poll_interval`, clamped to the remaining deadline budget).
/// The deadline is measured from the call, so the waiter returns no later
/// than `timeout` plus one poll interval.
///
/// Absence is data, not noise: a `NotFound` refresh result completes the
/// poll with `Ok(None)` when [`STATE_DELETED`] is among the targets
/// (deletion flows), and fails it otherwise. The waiter never retries a
/// failed refresh — transient transport errors are the client layer's
/// responsibility.
///
/// # Errors
///
/// - [`WaitError::Timeout`] once the deadline elapses while the resource is
///   still pending, annotated with the last observed label.
/// - [`WaitError::UnexpectedState`] immediately on any label outside both
///   sets.
/// - Any refresh error, propagated unchanged (including `NotFound` when
///   absence is not a target).
pub async fn await_state<T, F, Fut>(spec: &PollSpec, mut refresh: F) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(T, String)>>,
{
    debug_assert!(
        spec.pending.iter().all(|label| !spec.target.contains(label)),
        "pending and target label sets must be disjoint"
    );
    debug_assert!(!spec.timeout.is_zero(), "poll timeout must be positive");

    let started = Instant::now();
    let absence_is_target = spec.target.contains(&STATE_DELETED);

    if !spec.initial_delay.is_zero() {
        tokio::time::sleep(spec.initial_delay).await;
    }

    let mut wait = spec.poll_interval;

    loop {
        let (snapshot, label) = match refresh().await {
            Ok(observed) => observed,
            Err(err) if err.is_not_found() && absence_is_target => {
                debug!(
                    "{} '{}' is gone, treating absence as '{STATE_DELETED}'",
                    spec.kind, spec.handle
                );
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        if spec.target.contains(&label.as_str()) {
            debug!("{} '{}' reached '{label}'", spec.kind, spec.handle);
            return Ok(Some(snapshot));
        }

        if !spec.pending.contains(&label.as_str()) {
            return Err(WaitError::UnexpectedState {
                kind: spec.kind.as_str(),
                handle: spec.handle.to_string(),
                state: label,
            }
            .into());
        }

        let elapsed = started.elapsed();
        if elapsed >= spec.timeout {
            return Err(WaitError::Timeout {
                kind: spec.kind.as_str(),
                handle: spec.handle.to_string(),
                last_state: label,
            }
            .into());
        }

        trace!(
            "{} '{}' still '{label}', sleeping {:?}",
            spec.kind, spec.handle, wait
        );
        let remaining = spec.timeout - elapsed;
        tokio::time::sleep(wait.min(remaining)).await;
        wait = wait.saturating_mul(2);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::{ApiError, ProvisionError};

    const PENDING: &[&str] = &["ToCreate", "Creating"];
    const TARGET: &[&str] = &["Created"];
    const DELETE_PENDING: &[&str] = &["ToDelete", "Deleting"];
    const DELETE_TARGET: &[&str] = &["Deleted"];

    fn spec(pending: &'static [&'static str], target: &'static [&'static str]) -> PollSpec {
        PollSpec {
            kind: ResourceKind::Volume,
            handle: ResourceHandle::from("vol-1"),
            pending,
            target,
            timeout: Duration::from_millis(400),
            initial_delay: Duration::ZERO,
            poll_interval: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn test_target_on_first_refresh_skips_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let started = Instant::now();

        let result = await_state(&spec(PENDING, TARGET), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok((7_u32, String::from("Created"))) }
        })
        .await;

        assert_eq!(result.unwrap(), Some(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // No poll-interval sleep happened.
        assert!(started.elapsed() < Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_pending_then_target_polls_until_done() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let poll_spec = PollSpec {
            initial_delay: Duration::from_millis(20),
            timeout: Duration::from_secs(5),
            ..spec(PENDING, TARGET)
        };
        let started = Instant::now();

        let result = await_state(&poll_spec, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                let label = if n < 2 { "Creating" } else { "Created" };
                Ok((n, String::from(label)))
            }
        })
        .await;

        assert_eq!(result.unwrap(), Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // At least the initial delay plus two poll sleeps elapsed.
        assert!(started.elapsed() >= Duration::from_millis(120));
    }

    #[tokio::test]
    async fn test_forever_pending_times_out_with_last_state() {
        let poll_spec = spec(PENDING, TARGET);
        let started = Instant::now();

        let err = await_state(&poll_spec, || async {
            Ok((0_u32, String::from("Creating")))
        })
        .await
        .unwrap_err();

        let elapsed = started.elapsed();
        assert!(elapsed >= poll_spec.timeout);
        assert!(elapsed < poll_spec.timeout + poll_spec.poll_interval * 2);

        match err {
            ProvisionError::Wait(WaitError::Timeout {
                kind,
                handle,
                last_state,
            }) => {
                assert_eq!(kind, "volume");
                assert_eq!(handle, "vol-1");
                assert_eq!(last_state, "Creating");
            }
            other => panic!("expected timeout, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_absence_completes_deletion_poll() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<Option<u32>> =
            await_state(&spec(DELETE_PENDING, DELETE_TARGET), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::not_found("volume", "vol-1").into()) }
            })
            .await;

        assert_eq!(result.unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_absence_is_fatal_outside_deletion() {
        let result: Result<Option<u32>> = await_state(&spec(PENDING, TARGET), || async {
            Err(ApiError::not_found("volume", "vol-1").into())
        })
        .await;

        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_unexpected_state_fails_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let started = Instant::now();

        let err = await_state(&spec(PENDING, TARGET), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok((0_u32, String::from("Error"))) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_millis(40));
        match err {
            ProvisionError::Wait(WaitError::UnexpectedState { state, .. }) => {
                assert_eq!(state, "Error");
            }
            other => panic!("expected unexpected-state, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_label_target_for_task_polls() {
        let template = crate::states::task_template(crate::states::TaskAction::Detach);
        let poll_spec = PollSpec::new(
            ResourceKind::Volume,
            &ResourceHandle::from("vol-1"),
            template,
            WaitSettings::default()
                .with_timeout(Duration::from_millis(400))
                .with_initial_delay(Duration::ZERO)
                .with_poll_interval(Duration::from_millis(20)),
        );

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let result = await_state(&poll_spec, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                let label = if n == 0 { "DETACHING" } else { "" };
                Ok((n, String::from(label)))
            }
        })
        .await;

        assert_eq!(result.unwrap(), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
