//! # Listener handles and listener replies.
//!
//! A [`Listener`] is a shared callable `Fn(&A) -> Result<Reply, ListenerError>`.
//! Handles are compared by **identity**: a clone of a handle is the same
//! listener, two handles built from identical closures are not.
//!
//! ## Example
//! ```rust
//! use wildemit::{Listener, ListenerError};
//!
//! let a: Listener<u32> = Listener::new(|n: &u32| {
//!     if *n == 0 {
//!         return Err(ListenerError::fail("zero"));
//!     }
//!     Ok(())
//! });
//! let b = a.clone();
//! let c: Listener<u32> = Listener::new(|_: &u32| Ok(()));
//!
//! assert!(a.same(&b));
//! assert!(!a.same(&c));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::deferred::Deferred;
use crate::error::ListenerError;

type ListenerFn<A> = dyn Fn(&A) -> Result<Reply, ListenerError> + Send + Sync + 'static;

/// Value returned by a listener invocation.
///
/// Only [`Reply::Deferred`] is meaningful to
/// [`Emitter::emit_and_wait`](crate::Emitter::emit_and_wait); plain replies are
/// discarded by both dispatch modes.
#[derive(Debug, Default)]
pub enum Reply {
    /// The listener finished its work inline.
    #[default]
    Plain,
    /// The listener started work that completes later.
    Deferred(Deferred<()>),
}

impl Reply {
    /// Capability check: does this reply carry a deferred?
    #[inline]
    pub fn is_deferred(&self) -> bool {
        matches!(self, Reply::Deferred(_))
    }

    /// Returns the deferred, if any.
    #[inline]
    pub fn into_deferred(self) -> Option<Deferred<()>> {
        match self {
            Reply::Deferred(d) => Some(d),
            Reply::Plain => None,
        }
    }
}

impl From<()> for Reply {
    fn from((): ()) -> Self {
        Reply::Plain
    }
}

impl From<Deferred<()>> for Reply {
    fn from(d: Deferred<()>) -> Self {
        Reply::Deferred(d)
    }
}

/// Shared, identity-compared listener handle.
pub struct Listener<A> {
    f: Arc<ListenerFn<A>>,
}

impl<A> Listener<A> {
    /// Wraps a closure into a listener handle.
    ///
    /// The closure may return anything convertible into a [`Reply`]: `()` or
    /// a [`Deferred<()>`].
    pub fn new<F, R>(f: F) -> Self
    where
        A: 'static,
        F: Fn(&A) -> Result<R, ListenerError> + Send + Sync + 'static,
        R: Into<Reply> + 'static,
    {
        Self {
            f: Arc::new(move |args: &A| f(args).map(Into::into)),
        }
    }

    /// Invokes the listener.
    #[inline]
    pub fn call(&self, args: &A) -> Result<Reply, ListenerError> {
        (self.f)(args)
    }

    /// Identity comparison.
    #[inline]
    pub fn same(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.f), Arc::as_ptr(&other.f))
    }
}

impl<A> Clone for Listener<A> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
        }
    }
}

impl<A> fmt::Debug for Listener<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Arc::as_ptr(&self.f).cast::<()>())
            .finish()
    }
}
