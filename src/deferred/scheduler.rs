//! # Timer scheduling for emit-and-wait timeouts.
//!
//! The emitter never owns a global timer. A [`Scheduler`] is injected at
//! construction and asked for one cancellable one-shot timer per
//! `emit_and_wait` call that actually has something to wait for.
//!
//! ## Rules
//! - `on_fire` runs at most once, and never after [`TimerHandle::cancel`].
//! - `cancel()` is idempotent and safe to call after the timer fired.
//!
//! [`TokioScheduler`] is the default implementation: it spawns one small task
//! per timer that races `tokio::time::sleep` against the handle's token.

use std::fmt;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::error::ScheduleError;

/// Callback run when a timer fires.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Cancellation handle for a scheduled timer.
///
/// Cheap to clone; all clones refer to the same timer.
#[derive(Clone, Default)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    /// Creates a handle for a new timer. Custom schedulers create one per
    /// scheduled callback and watch [`TimerHandle::cancelled`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the timer. No-op if it already fired or was cancelled.
    #[inline]
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once `cancel()` was called on any clone.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the timer is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Schedules cancellable one-shot callbacks.
pub trait Scheduler: Send + Sync + 'static {
    /// Runs `on_fire` once after `delay`, unless the returned handle is
    /// cancelled first.
    fn schedule(&self, delay: Duration, on_fire: TimerCallback)
    -> Result<TimerHandle, ScheduleError>;
}

/// Tokio-backed [`Scheduler`].
///
/// Without an explicit runtime handle, the runtime of the calling context is
/// used; scheduling outside any runtime fails with
/// [`ScheduleError::NoRuntime`].
#[derive(Clone, Debug, Default)]
pub struct TokioScheduler {
    handle: Option<Handle>,
}

impl TokioScheduler {
    /// Uses the runtime of whichever context calls `schedule`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins all timers to the given runtime.
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(
        &self,
        delay: Duration,
        on_fire: TimerCallback,
    ) -> Result<TimerHandle, ScheduleError> {
        let rt = match &self.handle {
            Some(h) => h.clone(),
            None => Handle::try_current().map_err(|_| ScheduleError::NoRuntime { delay })?,
        };

        let timer = TimerHandle::new();
        let token = timer.token.clone();
        rt.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    token.cancel();
                    on_fire();
                }
            }
        });
        Ok(timer)
    }
}
