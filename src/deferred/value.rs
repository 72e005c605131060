//! # Cancellable deferred values.
//!
//! [`Deferred<T>`] is a boxed future with an observable state and a
//! cancellation channel that works without polling:
//!
//! ```text
//!            settle (value or rejection)
//!   Pending ─────────────────────────────► Settled
//!      │
//!      └──── cancel() ───────────────────► Cancelled
//! ```
//!
//! Both terminal states are final: cancelling a settled deferred is a no-op,
//! and a deferred cancelled while its inner future was about to finish still
//! reports [`DeferredError::Cancelled`].
//!
//! ## Rules
//! - Inside a tokio runtime every pending deferred is driven by its own task
//!   and settles on its own; outside a runtime it runs when awaited.
//! - [`Deferred::cancel`] takes effect immediately and wakes any awaiter.
//! - Derived deferreds ([`Deferred::then`], [`Deferred::map`], [`Deferred::all`])
//!   cancel their sources when they are cancelled.
//!
//! ## Example
//! ```rust
//! use wildemit::{Deferred, DeferredError, DeferredState};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let d = Deferred::<u32>::rejected("no such user")
//!     .then(|_| false, |_| true);
//! assert_eq!(d.await, Ok(true));
//!
//! let never = Deferred::<()>::from_future(futures::future::pending());
//! never.cancel();
//! assert_eq!(never.state(), DeferredState::Cancelled);
//! assert_eq!(never.await, Err(DeferredError::Cancelled));
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::deferred::scheduler::TimerHandle;
use crate::error::DeferredError;

const PENDING: u8 = 0;
const SETTLED: u8 = 1;
const CANCELLED: u8 = 2;

/// Observable lifecycle state of a [`Deferred`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredState {
    /// Not settled yet.
    Pending,
    /// Settled with a value or a rejection.
    Settled,
    /// Cancelled before settling.
    Cancelled,
}

struct Shared {
    state: AtomicU8,
    token: CancellationToken,
    /// Sources cancelled together with this deferred.
    linked: Mutex<Vec<CancelHandle>>,
    /// Timer released as soon as this deferred leaves `Pending`.
    timer: Mutex<Option<TimerHandle>>,
}

impl Shared {
    fn new(state: u8) -> Arc<Self> {
        Arc::new(Self {
            state: AtomicU8::new(state),
            token: CancellationToken::new(),
            linked: Mutex::new(Vec::new()),
            timer: Mutex::new(None),
        })
    }

    fn state(&self) -> DeferredState {
        match self.state.load(Ordering::Acquire) {
            PENDING => DeferredState::Pending,
            SETTLED => DeferredState::Settled,
            _ => DeferredState::Cancelled,
        }
    }

    fn transition(&self, to: u8) -> bool {
        self.state
            .compare_exchange(PENDING, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn cancel(&self) -> bool {
        if !self.transition(CANCELLED) {
            return false;
        }
        self.token.cancel();
        self.release_timer();

        let linked = std::mem::take(&mut *self.linked.lock());
        for source in linked {
            source.cancel();
        }
        true
    }

    fn settle(&self) -> bool {
        if !self.transition(SETTLED) {
            return false;
        }
        self.release_timer();
        self.linked.lock().clear();
        true
    }

    fn release_timer(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.cancel();
        }
    }
}

/// Type-erased handle that can cancel a [`Deferred`] it was taken from.
#[derive(Clone)]
pub struct CancelHandle {
    shared: Arc<Shared>,
}

impl CancelHandle {
    /// Cancels the deferred if it is still pending.
    ///
    /// Returns `true` if this call performed the transition to `Cancelled`.
    #[inline]
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }

    /// Current state of the deferred.
    #[inline]
    pub fn state(&self) -> DeferredState {
        self.shared.state()
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("state", &self.state())
            .finish()
    }
}

/// Cancellable future-like value.
///
/// Awaiting a deferred yields `Ok(value)`, `Err(DeferredError::Rejected)` or
/// `Err(DeferredError::Cancelled)`.
#[must_use = "deferreds do nothing unless awaited"]
pub struct Deferred<T = ()> {
    shared: Arc<Shared>,
    fut: BoxFuture<'static, Result<T, DeferredError>>,
}

impl<T: Send + 'static> Deferred<T> {
    /// Creates an already settled deferred holding `value`.
    pub fn resolved(value: T) -> Self {
        Self {
            shared: Shared::new(SETTLED),
            fut: future::ready(Ok(value)).boxed(),
        }
    }

    /// Creates an already settled, rejected deferred.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            shared: Shared::new(SETTLED),
            fut: future::ready(Err(DeferredError::rejected(reason))).boxed(),
        }
    }

    /// Wraps a future. The deferred settles when the future completes.
    ///
    /// Inside a tokio runtime the future is driven by a spawned task, so the
    /// deferred settles whether or not anyone awaits it. Outside a runtime it
    /// runs when awaited.
    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = Result<T, DeferredError>> + Send + 'static,
    {
        let shared = Shared::new(PENDING);
        let driven = drive(Arc::clone(&shared), fut);

        let fut = match Handle::try_current() {
            Ok(rt) => {
                let (tx, rx) = oneshot::channel();
                rt.spawn(async move {
                    let _ = tx.send(driven.await);
                });
                let state = Arc::clone(&shared);
                async move {
                    match rx.await {
                        Ok(res) => res,
                        // Driver dropped before settling (panic or runtime shutdown).
                        Err(_) => {
                            state.cancel();
                            Err(DeferredError::Cancelled)
                        }
                    }
                }
                .boxed()
            }
            Err(_) => driven.boxed(),
        };

        Self { shared, fut }
    }

    /// Combines `members` into one deferred that settles once all of them
    /// have settled successfully, yielding their values in input order.
    ///
    /// The first rejection rejects the combination. Cancelling the
    /// combination cancels every member.
    pub fn all(members: Vec<Deferred<T>>) -> Deferred<Vec<T>> {
        let handles: Vec<CancelHandle> = members.iter().map(Deferred::cancel_handle).collect();
        let combined = Deferred::from_future(future::try_join_all(members));
        combined.shared.linked.lock().extend(handles);
        combined
    }

    /// Continues with `on_ok` or `on_err`; the derived deferred settles with
    /// whichever handler ran, so a rejection can be turned into a value.
    pub fn then<U, S, E>(self, on_ok: S, on_err: E) -> Deferred<U>
    where
        U: Send + 'static,
        S: FnOnce(T) -> U + Send + 'static,
        E: FnOnce(DeferredError) -> U + Send + 'static,
    {
        let source = self.cancel_handle();
        let next = Deferred::from_future(async move {
            Ok(match self.await {
                Ok(v) => on_ok(v),
                Err(e) => on_err(e),
            })
        });
        next.link(source);
        next
    }

    /// Maps the value, keeping rejections and cancellation as they are.
    pub fn map<U, F>(self, f: F) -> Deferred<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let source = self.cancel_handle();
        let next = Deferred::from_future(async move { self.await.map(f) });
        next.link(source);
        next
    }
}

impl<T> Deferred<T> {
    /// Cancels the deferred if it is still pending.
    ///
    /// Returns `true` if this call performed the transition to `Cancelled`.
    #[inline]
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> DeferredState {
        self.shared.state()
    }

    /// Returns `true` while neither settled nor cancelled.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.state() == DeferredState::Pending
    }

    /// Returns a handle that can cancel this deferred from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Registers `source` to be cancelled together with this deferred.
    fn link(&self, source: CancelHandle) {
        let mut linked = self.shared.linked.lock();
        if self.shared.state() == DeferredState::Pending {
            linked.push(source);
            return;
        }
        drop(linked);
        if self.shared.state() == DeferredState::Cancelled {
            source.cancel();
        }
    }

    /// Ties a timer to this deferred: it is cancelled as soon as the deferred
    /// settles or is cancelled.
    pub(crate) fn attach_timer(&self, timer: TimerHandle) {
        let mut slot = self.shared.timer.lock();
        if self.shared.state() == DeferredState::Pending {
            *slot = Some(timer);
            return;
        }
        drop(slot);
        timer.cancel();
    }
}

/// Runs `fut` until it completes or the deferred is cancelled, then settles.
async fn drive<T, F>(shared: Arc<Shared>, fut: F) -> Result<T, DeferredError>
where
    F: Future<Output = Result<T, DeferredError>>,
{
    let token = shared.token.clone();
    let res = tokio::select! {
        biased;
        _ = token.cancelled() => return Err(DeferredError::Cancelled),
        res = fut => res,
    };
    if shared.settle() {
        res
    } else {
        Err(DeferredError::Cancelled)
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T, DeferredError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.fut.poll_unpin(cx)
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
