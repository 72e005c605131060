//! Error types used by the emitter, its listeners and deferred values.
//!
//! This module defines three error enums:
//!
//! - [`EmitError`]: errors returned by [`Emitter`](crate::Emitter) operations.
//! - [`ListenerError`]: errors returned by individual listener invocations.
//! - [`DeferredError`]: the failure channel of a [`Deferred`](crate::Deferred).
//!
//! All of them provide `as_label` (stable snake_case label for logs) and
//! `as_message` helpers.

use thiserror::Error;

/// # Errors produced by emitter operations.
///
/// Every variant is returned synchronously at the call site; none of them
/// is ever delivered through a deferred.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum EmitError {
    /// The event name or spec passed to `op` was empty.
    #[error("event name must not be empty ({op})")]
    EmptyEventName {
        /// Operation that rejected the name (`on`, `emit`, ...).
        op: &'static str,
    },

    /// A pattern spec compiled into a regular expression the engine rejects.
    #[error("invalid event pattern {spec:?}: {source}")]
    InvalidPattern {
        /// The spec as given by the caller.
        spec: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// A listener failed; the remaining listeners of this emission did not run.
    #[error("listener for {event:?} failed: {source}")]
    Listener {
        /// Event being dispatched when the listener failed.
        event: String,
        /// The listener's own error.
        #[source]
        source: ListenerError,
    },

    /// The wait timeout could not be scheduled.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

impl EmitError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use wildemit::EmitError;
    ///
    /// let err = EmitError::EmptyEventName { op: "emit" };
    /// assert_eq!(err.as_label(), "emit_empty_event_name");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EmitError::EmptyEventName { .. } => "emit_empty_event_name",
            EmitError::InvalidPattern { .. } => "emit_invalid_pattern",
            EmitError::Listener { .. } => "emit_listener_failed",
            EmitError::Schedule(_) => "emit_schedule_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            EmitError::EmptyEventName { op } => format!("empty event name in {op}"),
            EmitError::InvalidPattern { spec, source } => {
                format!("pattern {spec:?} rejected: {source}")
            }
            EmitError::Listener { event, source } => {
                format!("event={event:?} {}", source.as_message())
            }
            EmitError::Schedule(e) => e.to_string(),
        }
    }

    /// Returns the listener error if this emission was aborted by a listener.
    pub fn listener_error(&self) -> Option<&ListenerError> {
        match self {
            EmitError::Listener { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// # Errors produced by listener invocations.
///
/// Returning one of these from a listener aborts the current emission.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListenerError {
    /// The listener failed while handling the event.
    #[error("listener failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The listener hit a condition it considers unrecoverable.
    #[error("fatal listener error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },
}

impl ListenerError {
    /// Shorthand for [`ListenerError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        ListenerError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`ListenerError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        ListenerError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use wildemit::ListenerError;
    ///
    /// assert_eq!(ListenerError::fail("boom").as_label(), "listener_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ListenerError::Fail { .. } => "listener_failed",
            ListenerError::Fatal { .. } => "listener_fatal",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ListenerError::Fail { error } => format!("error: {error}"),
            ListenerError::Fatal { error } => format!("fatal: {error}"),
        }
    }
}

/// # Failure channel of a deferred value.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeferredError {
    /// The deferred was rejected by its producer.
    #[error("deferred rejected: {reason}")]
    Rejected {
        /// Rejection reason.
        reason: String,
    },

    /// The deferred was cancelled before it settled.
    #[error("deferred cancelled")]
    Cancelled,
}

impl DeferredError {
    /// Shorthand for [`DeferredError::Rejected`].
    pub fn rejected(reason: impl Into<String>) -> Self {
        DeferredError::Rejected {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            DeferredError::Rejected { .. } => "deferred_rejected",
            DeferredError::Cancelled => "deferred_cancelled",
        }
    }

    /// Indicates whether the deferred ended through cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DeferredError::Cancelled)
    }
}

/// # Errors produced by a [`Scheduler`](crate::Scheduler).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// No async runtime is available to drive the timer.
    #[error("no runtime available to schedule a {delay:?} timer")]
    NoRuntime {
        /// Requested timer delay.
        delay: std::time::Duration,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_error_is_exposed_through_emit_error() {
        let err = EmitError::Listener {
            event: "user.created".into(),
            source: ListenerError::fatal("db down"),
        };
        assert_eq!(err.as_label(), "emit_listener_failed");
        assert_eq!(err.listener_error(), Some(&ListenerError::fatal("db down")));
        assert_eq!(err.as_message(), "event=\"user.created\" fatal: db down");
    }

    #[test]
    fn non_listener_errors_carry_no_listener_error() {
        let err = EmitError::EmptyEventName { op: "on" };
        assert!(err.listener_error().is_none());
        assert_eq!(err.to_string(), "event name must not be empty (on)");
    }

    #[test]
    fn deferred_error_labels() {
        assert!(DeferredError::Cancelled.is_cancelled());
        assert!(!DeferredError::rejected("nope").is_cancelled());
        assert_eq!(DeferredError::rejected("x").as_label(), "deferred_rejected");
    }
}
