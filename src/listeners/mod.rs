//! Listener abstractions.
//!
//! - [`Listener`] - shared, identity-compared callable (`Arc<dyn Fn>`)
//! - [`Reply`] - what a listener returns: plain, or a deferred to wait for

mod listener;

pub use listener::{Listener, Reply};
