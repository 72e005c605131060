//! # Emitter: listener registry, synchronous fan-out and emit-and-wait.
//!
//! The [`Emitter`] owns a four-group listener registry, a pattern compiler and
//! an injected [`Scheduler`]. Owning types hold an emitter and delegate to it.
//!
//! ## Key responsibilities
//! - register listeners for literal names, globs and regular expressions
//! - remove and list listeners
//! - **emit**: invoke matching listeners inline, in a fixed order
//! - **emit-and-wait**: same dispatch, then combine every deferred reply into
//!   one aggregate that settles or is cancelled by a timeout
//!
//! ## High-level architecture
//! ```text
//! on / once(spec, l)                   emit(name, &args)
//!      │                                    │
//!      ▼                                    ▼
//! PatternCompiler ──► Registry ◄── dispatch (lock released per listener)
//!                     [Exact]                 │
//!                     [ExactOnce]             ├─► emit:          discard replies
//!                     [Pattern]               └─► emit_and_wait: aggregate(replies)
//!                     [PatternOnce]                                  │
//!                                                  Scheduler::schedule(timeout, cancel)
//! ```
//!
//! - Cloning an emitter is cheap; clones share the registry.
//! - Listeners may hold a [`WeakEmitter`] to re-enter without creating a cycle.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use wildemit::{Emitter, Listener};
//!
//! let emitter: Emitter<u32> = Emitter::new();
//! let total = Arc::new(AtomicU32::new(0));
//!
//! let t = Arc::clone(&total);
//! emitter
//!     .on("user.*", Listener::new(move |n: &u32| {
//!         t.fetch_add(*n, Ordering::SeqCst);
//!         Ok(())
//!     }))
//!     .unwrap();
//!
//! emitter.emit("user.created", &2).unwrap();
//! emitter.emit("user.deleted", &3).unwrap();
//! emitter.emit("order.created", &100).unwrap();
//! assert_eq!(total.load(Ordering::SeqCst), 5);
//! ```

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use indexmap::IndexMap;
use parking_lot::Mutex;

use super::{aggregate::aggregate, builder::EmitterBuilder, config::EmitterConfig, dispatch::dispatch};
use crate::core::registry::Registry;
use crate::deferred::{Deferred, Scheduler};
use crate::error::EmitError;
use crate::listeners::Listener;

struct Inner<A> {
    cfg: EmitterConfig,
    registry: Mutex<Registry<A>>,
    scheduler: Arc<dyn Scheduler>,
}

/// Event emitter with literal, glob and regex listeners.
pub struct Emitter<A> {
    inner: Arc<Inner<A>>,
}

impl<A> Emitter<A> {
    /// Creates an emitter with default configuration and a [`TokioScheduler`](crate::TokioScheduler).
    pub fn new() -> Self {
        Self::builder(EmitterConfig::default()).build()
    }

    /// Returns a builder for an emitter with custom configuration or scheduler.
    pub fn builder(cfg: EmitterConfig) -> EmitterBuilder<A> {
        EmitterBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: EmitterConfig,
        registry: Mutex<Registry<A>>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cfg,
                registry,
                scheduler,
            }),
        }
    }

    /// Configuration this emitter was built with.
    pub fn config(&self) -> &EmitterConfig {
        &self.inner.cfg
    }

    /// Non-owning handle, for listeners that need to reach their emitter.
    pub fn downgrade(&self) -> WeakEmitter<A> {
        WeakEmitter {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Registers `listener` for every emission matching `spec`.
    ///
    /// # Errors
    /// - [`EmitError::EmptyEventName`] if `spec` is empty
    /// - [`EmitError::InvalidPattern`] if `spec` is a pattern the regex engine rejects
    pub fn on(&self, spec: &str, listener: Listener<A>) -> Result<&Self, EmitError> {
        self.inner.registry.lock().register(spec, listener, false)?;
        Ok(self)
    }

    /// Registers `listener` for the first emission matching `spec` only.
    ///
    /// # Errors
    /// Same as [`Emitter::on`].
    pub fn once(&self, spec: &str, listener: Listener<A>) -> Result<&Self, EmitError> {
        self.inner.registry.lock().register(spec, listener, true)?;
        Ok(self)
    }

    /// Removes one registration of `listener` under `spec` from the persistent
    /// and the once group `spec` belongs to.
    ///
    /// `spec` must be spelled as at registration (or compile to the same key).
    /// Returns `true` if a registration was removed.
    pub fn remove_listener(&self, spec: &str, listener: &Listener<A>) -> Result<bool, EmitError> {
        self.inner.registry.lock().remove_listener(spec, listener)
    }

    /// Removes every listener registered under `spec`, or every listener at
    /// all when `spec` is `None`.
    pub fn remove_all_listeners(&self, spec: Option<&str>) -> Result<(), EmitError> {
        self.inner.registry.lock().remove_all(spec)
    }

    /// Listeners an emission of `event` would invoke, in invocation order.
    pub fn listeners(&self, event: &str) -> Vec<Listener<A>> {
        self.inner.registry.lock().listeners(event)
    }

    /// Every registered key (literal names, then compiled patterns) with its
    /// listeners.
    pub fn all_listeners(&self) -> IndexMap<String, Vec<Listener<A>>> {
        self.inner.registry.lock().all_listeners()
    }

    /// Every registered key, without duplicates.
    pub fn event_names(&self) -> Vec<String> {
        self.inner.registry.lock().event_names()
    }

    /// Total number of registrations.
    pub fn listener_count(&self) -> usize {
        self.inner.registry.lock().len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.registry.lock().is_empty()
    }

    /// Invokes every listener matching `event` with `args`.
    ///
    /// # Errors
    /// - [`EmitError::EmptyEventName`] if `event` is empty
    /// - [`EmitError::Listener`] with the first listener error; later
    ///   listeners of this emission do not run
    pub fn emit(&self, event: &str, args: &A) -> Result<(), EmitError> {
        dispatch(&self.inner.registry, "emit", event, args, drop)?;
        Ok(())
    }

    /// Like [`Emitter::emit`], then waits (asynchronously) for every deferred
    /// reply, for at most [`EmitterConfig::wait_timeout`].
    ///
    /// See [`Emitter::emit_and_wait_timeout`].
    pub fn emit_and_wait(&self, event: &str, args: &A) -> Result<Deferred<bool>, EmitError> {
        self.emit_and_wait_timeout(event, args, self.inner.cfg.wait_timeout)
    }

    /// Invokes every listener matching `event` and returns a deferred that
    /// settles with `true` once every deferred reply has settled.
    ///
    /// Returns immediately. Rejected replies count as settled. If `timeout`
    /// elapses first, the returned deferred (and every reply still pending) is
    /// cancelled and awaiting it yields
    /// [`DeferredError::Cancelled`](crate::DeferredError::Cancelled).
    ///
    /// # Errors
    /// - [`EmitError::EmptyEventName`] if `event` is empty
    /// - [`EmitError::Listener`] if a listener returned an error
    /// - [`EmitError::Schedule`] if the timeout could not be scheduled
    pub fn emit_and_wait_timeout(
        &self,
        event: &str,
        args: &A,
        timeout: Duration,
    ) -> Result<Deferred<bool>, EmitError> {
        let mut replies = Vec::new();
        dispatch(&self.inner.registry, "emit_and_wait", event, args, |r| replies.push(r))?;
        aggregate(event, replies, self.inner.scheduler.as_ref(), timeout)
    }
}

impl<A> Clone for Emitter<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> Default for Emitter<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for Emitter<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("cfg", &self.inner.cfg)
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

/// Weak counterpart of [`Emitter`].
pub struct WeakEmitter<A> {
    inner: Weak<Inner<A>>,
}

impl<A> WeakEmitter<A> {
    /// Returns the emitter if it is still alive.
    pub fn upgrade(&self) -> Option<Emitter<A>> {
        self.inner.upgrade().map(|inner| Emitter { inner })
    }
}

impl<A> Clone for WeakEmitter<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use crate::deferred::DeferredState;
    use crate::error::{DeferredError, ListenerError};

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording<A: fmt::Debug + 'static>(log: &Log, tag: &'static str) -> Listener<A> {
        let log = Arc::clone(log);
        Listener::new(move |args: &A| {
            log.lock().push(format!("{tag}:{args:?}"));
            Ok(())
        })
    }

    fn failing<A: 'static>(msg: &'static str) -> Listener<A> {
        Listener::new(move |_: &A| Err::<(), _>(ListenerError::fail(msg)))
    }

    #[test]
    fn test_listeners_run_in_registration_order_with_args() {
        let log: Log = Arc::default();
        let em: Emitter<Vec<i32>> = Emitter::new();
        em.on("foo", recording(&log, "l1"))
            .unwrap()
            .on("foo", recording(&log, "l2"))
            .unwrap();

        em.emit("foo", &vec![7]).unwrap();
        assert_eq!(*log.lock(), vec!["l1:[7]", "l2:[7]"]);
    }

    #[test]
    fn test_once_runs_on_first_emit_only() {
        let log: Log = Arc::default();
        let em: Emitter<u8> = Emitter::new();
        em.once("foo", recording(&log, "once")).unwrap();

        em.emit("foo", &1).unwrap();
        em.emit("foo", &2).unwrap();
        assert_eq!(*log.lock(), vec!["once:1"]);
        assert!(em.is_empty());
    }

    #[test]
    fn test_pattern_once_runs_on_first_match_only() {
        let log: Log = Arc::default();
        let em: Emitter<u8> = Emitter::new();
        em.once("job.*", recording(&log, "once")).unwrap();

        em.emit("other", &0).unwrap();
        em.emit("job.done", &1).unwrap();
        em.emit("job.done", &2).unwrap();
        assert_eq!(*log.lock(), vec!["once:1"]);
    }

    #[test]
    fn test_glob_and_regex_matching() {
        let log: Log = Arc::default();
        let em: Emitter<()> = Emitter::new();
        em.on("user.*", recording(&log, "user")).unwrap();
        em.on("~^a.b$", recording(&log, "ab")).unwrap();

        for name in ["user.created", "user.deleted", "order.created", "a.b", "a.bc"] {
            em.emit(name, &()).unwrap();
        }
        assert_eq!(*log.lock(), vec!["user:()", "user:()", "ab:()"]);
    }

    #[test]
    fn test_self_removal_during_dispatch() {
        let log: Log = Arc::default();
        let em: Emitter<()> = Emitter::new();
        let me: Arc<OnceLock<Listener<()>>> = Arc::default();

        let weak = em.downgrade();
        let slot = Arc::clone(&me);
        let l = Arc::clone(&log);
        let quitter = Listener::new(move |_: &()| {
            l.lock().push("quitter".into());
            if let (Some(em), Some(me)) = (weak.upgrade(), slot.get()) {
                em.remove_listener("tick", me).map_err(|e| ListenerError::fail(e.to_string()))?;
            }
            Ok(())
        });
        me.set(quitter.clone()).unwrap();

        em.on("tick", quitter).unwrap();
        em.on("tick", recording(&log, "stayer")).unwrap();

        em.emit("tick", &()).unwrap();
        em.emit("tick", &()).unwrap();
        assert_eq!(*log.lock(), vec!["quitter", "stayer:()", "stayer:()"]);
    }

    #[test]
    fn test_once_listener_reemitting_its_event_runs_once() {
        let hits = Arc::new(AtomicU32::new(0));
        let em: Emitter<()> = Emitter::new();
        let weak = em.downgrade();
        let h = Arc::clone(&hits);
        em.once(
            "again",
            Listener::new(move |_: &()| {
                h.fetch_add(1, Ordering::SeqCst);
                if let Some(em) = weak.upgrade() {
                    em.emit("again", &()).map_err(|e| ListenerError::fail(e.to_string()))?;
                }
                Ok(())
            }),
        )
        .unwrap();

        em.emit("again", &()).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_once_added_during_dispatch_waits_for_next_emit() {
        let log: Log = Arc::default();
        let em: Emitter<u8> = Emitter::new();
        let weak = em.downgrade();
        let inner_log = Arc::clone(&log);
        em.once(
            "ev*",
            Listener::new(move |_: &u8| {
                if let Some(em) = weak.upgrade() {
                    em.once("ev*", recording(&inner_log, "late"))
                        .map_err(|e| ListenerError::fail(e.to_string()))?;
                }
                Ok(())
            }),
        )
        .unwrap();

        em.emit("event", &1).unwrap();
        assert!(log.lock().is_empty());
        assert_eq!(em.listeners("event").len(), 1, "late listener kept for the next emission");

        em.emit("event", &2).unwrap();
        assert_eq!(*log.lock(), vec!["late:2"]);
    }

    /// Listener that registers `late` as a once listener under `spec` the
    /// first time it runs.
    fn adds_once_listener(em: &Emitter<u8>, spec: &'static str, late: Listener<u8>) -> Listener<u8> {
        let weak = em.downgrade();
        let armed = Arc::new(std::sync::atomic::AtomicBool::new(true));
        Listener::new(move |_: &u8| {
            if !armed.swap(false, Ordering::SeqCst) {
                return Ok(());
            }
            if let Some(em) = weak.upgrade() {
                em.once(spec, late.clone())
                    .map_err(|e| ListenerError::fail(e.to_string()))?;
            }
            Ok(())
        })
    }

    #[test]
    fn test_exact_once_added_in_exact_step_runs_in_same_emission() {
        let log: Log = Arc::default();
        let em: Emitter<u8> = Emitter::new();
        em.on("foo", adds_once_listener(&em, "foo", recording(&log, "late"))).unwrap();

        em.emit("foo", &1).unwrap();
        assert_eq!(*log.lock(), vec!["late:1"], "exact-once step starts after the exact step");

        em.emit("foo", &2).unwrap();
        assert_eq!(*log.lock(), vec!["late:1"]);
    }

    #[test]
    fn test_exact_once_added_in_exact_once_step_waits_for_next_emit() {
        let log: Log = Arc::default();
        let em: Emitter<u8> = Emitter::new();
        em.once("foo", adds_once_listener(&em, "foo", recording(&log, "late"))).unwrap();

        em.emit("foo", &1).unwrap();
        assert!(log.lock().is_empty());

        em.emit("foo", &2).unwrap();
        assert_eq!(*log.lock(), vec!["late:2"]);
    }

    #[test]
    fn test_pattern_once_added_in_pattern_step_runs_in_same_emission() {
        let log: Log = Arc::default();
        let em: Emitter<u8> = Emitter::new();
        em.on("ev*", adds_once_listener(&em, "ev*", recording(&log, "late"))).unwrap();

        em.emit("event", &1).unwrap();
        assert_eq!(*log.lock(), vec!["late:1"], "pattern-once step starts after the pattern step");
        assert_eq!(em.listeners("event").len(), 1, "only the persistent listener is left");
    }

    #[test]
    fn test_listener_error_propagates_and_halts() {
        let log: Log = Arc::default();
        let em: Emitter<()> = Emitter::new();
        em.on("x", failing("boom")).unwrap();
        em.on("x*", recording(&log, "pattern")).unwrap();

        let err = em.emit("x", &()).unwrap_err();
        assert_eq!(err.listener_error(), Some(&ListenerError::fail("boom")));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_empty_names_are_rejected() {
        let em: Emitter<()> = Emitter::new();
        let l: Listener<()> = Listener::new(|_: &()| Ok(()));
        assert!(matches!(em.on("", l.clone()), Err(EmitError::EmptyEventName { op: "on" })));
        assert!(matches!(em.once("", l.clone()), Err(EmitError::EmptyEventName { op: "once" })));
        assert!(em.remove_listener("", &l).is_err());
        assert!(matches!(em.emit("", &()), Err(EmitError::EmptyEventName { op: "emit" })));
        assert!(matches!(
            em.emit_and_wait("", &()),
            Err(EmitError::EmptyEventName { op: "emit_and_wait" })
        ));
    }

    #[test]
    fn test_listing_and_removal_are_symmetric_for_patterns() {
        let em: Emitter<()> = Emitter::new();
        let l: Listener<()> = Listener::new(|_: &()| Ok(()));
        em.on("user.*", l.clone()).unwrap();
        em.once("user.*", l.clone()).unwrap();
        em.on("user.created", l.clone()).unwrap();

        assert_eq!(em.listeners("user.created").len(), 3);
        assert_eq!(em.event_names(), vec!["user.created".to_string(), r"/user\.(.*)/".to_string()]);
        assert_eq!(em.all_listeners()[r"/user\.(.*)/"].len(), 2);

        assert!(em.remove_listener("user.*", &l).unwrap());
        assert_eq!(em.listeners("user.created").len(), 1);

        em.remove_all_listeners(None).unwrap();
        assert!(em.is_empty());
    }

    #[test]
    fn test_clones_share_registry() {
        let em: Emitter<()> = Emitter::new();
        let other = em.clone();
        other.on("a", Listener::new(|_: &()| Ok(()))).unwrap();
        assert_eq!(em.listener_count(), 1);

        let weak = em.downgrade();
        drop(em);
        assert!(weak.upgrade().is_some());
        drop(other);
        assert!(weak.upgrade().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_without_deferreds_resolves_immediately() {
        let em: Emitter<()> = Emitter::new();
        em.on("x", Listener::new(|_: &()| Ok(()))).unwrap();

        let start = Instant::now();
        let agg = em.emit_and_wait_timeout("x", &(), Duration::from_secs(5)).unwrap();
        assert_eq!(agg.state(), DeferredState::Settled);
        assert_eq!(agg.await, Ok(true));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_waits_for_deferred_replies() {
        let em: Emitter<u64> = Emitter::new();
        em.on(
            "job",
            Listener::new(|ms: &u64| {
                let ms = *ms;
                Ok(Deferred::from_future(async move {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok(())
                }))
            }),
        )
        .unwrap();

        let start = Instant::now();
        let agg = em.emit_and_wait("job", &300).unwrap();
        assert_eq!(agg.await, Ok(true));
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(300) && waited < Duration::from_secs(1), "{waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_settling_reply_is_cancelled_at_timeout() {
        let em: Emitter<()> = Emitter::new();
        em.on(
            "x",
            Listener::new(|_: &()| Ok(Deferred::<()>::from_future(futures::future::pending()))),
        )
        .unwrap();

        let start = Instant::now();
        let agg = em.emit_and_wait_timeout("x", &(), Duration::from_secs(1)).unwrap();
        assert!(agg.is_pending());

        assert_eq!(agg.await, Err(DeferredError::Cancelled));
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_wait_timeout_comes_from_config() {
        let cfg = EmitterConfig {
            wait_timeout: Duration::from_secs(3),
            ..EmitterConfig::default()
        };
        let em: Emitter<()> = Emitter::builder(cfg).build();
        em.on(
            "x",
            Listener::new(|_: &()| Ok(Deferred::<()>::from_future(futures::future::pending()))),
        )
        .unwrap();

        let start = Instant::now();
        assert_eq!(em.emit_and_wait("x", &()).unwrap().await, Err(DeferredError::Cancelled));
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(3) && waited < Duration::from_secs(4), "{waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_is_swallowed_but_sync_error_propagates() {
        let em: Emitter<()> = Emitter::new();
        em.on(
            "x",
            Listener::new(|_: &()| {
                Ok(Deferred::<()>::from_future(async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Err(DeferredError::rejected("remote said no"))
                }))
            }),
        )
        .unwrap();

        assert_eq!(em.emit_and_wait("x", &()).unwrap().await, Ok(true));

        em.on("x", failing("sync boom")).unwrap();
        let err = em.emit_and_wait("x", &()).unwrap_err();
        assert_eq!(err.listener_error(), Some(&ListenerError::fail("sync boom")));
    }

    #[test]
    fn test_wait_outside_runtime_only_fails_when_a_timer_is_needed() {
        let em: Emitter<()> = Emitter::new();
        em.on("plain", Listener::new(|_: &()| Ok(()))).unwrap();
        assert!(em.emit_and_wait("plain", &()).is_ok());

        em.on("settled", Listener::new(|_: &()| Ok(Deferred::resolved(())))).unwrap();
        assert!(em.emit_and_wait("settled", &()).is_ok(), "settled replies need no timer");

        em.on(
            "deferred",
            Listener::new(|_: &()| Ok(Deferred::<()>::from_future(futures::future::pending()))),
        )
        .unwrap();
        let err = em.emit_and_wait("deferred", &()).unwrap_err();
        assert_eq!(err.as_label(), "emit_schedule_failed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_aggregate_settles_before_timeout_without_being_awaited() {
        let em: Emitter<()> = Emitter::new();
        em.on(
            "job",
            Listener::new(|_: &()| {
                Ok(Deferred::from_future(async {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok(())
                }))
            }),
        )
        .unwrap();

        let agg = em.emit_and_wait_timeout("job", &(), Duration::from_secs(1)).unwrap();
        assert!(agg.is_pending());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(agg.state(), DeferredState::Settled);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(agg.state(), DeferredState::Settled, "timeout after settling is a no-op");
        assert_eq!(agg.await, Ok(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_work_finishing_early_is_not_cancelled_by_late_await() {
        let em: Emitter<()> = Emitter::new();
        em.on(
            "job",
            Listener::new(|_: &()| {
                let work = tokio::spawn(tokio::time::sleep(Duration::from_millis(100)));
                Ok(Deferred::from_future(async move {
                    work.await.map_err(|e| DeferredError::rejected(e.to_string()))
                }))
            }),
        )
        .unwrap();

        let agg = em.emit_and_wait_timeout("job", &(), Duration::from_secs(1)).unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(agg.await, Ok(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolved_reply_counts_as_settled_at_emit() {
        let em: Emitter<()> = Emitter::new();
        em.on("x", Listener::new(|_: &()| Ok(Deferred::resolved(())))).unwrap();

        let agg = em.emit_and_wait_timeout("x", &(), Duration::from_secs(1)).unwrap();
        assert_eq!(agg.state(), DeferredState::Settled);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(agg.state(), DeferredState::Settled);
        assert_eq!(agg.await, Ok(true));
    }
}
