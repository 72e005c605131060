//! Deferred values and timeout scheduling.
//!
//! ## Contents
//! - [`Deferred`], [`DeferredState`], [`CancelHandle`] cancellable future-like values
//! - [`Scheduler`], [`TimerHandle`], [`TokioScheduler`] one-shot cancellable timers
//!
//! These are the collaborators consumed by `emit_and_wait`; the emitter only
//! uses `resolved`, `all`, `then`, `cancel` and `Scheduler::schedule`.

mod scheduler;
mod value;

pub use scheduler::{Scheduler, TimerCallback, TimerHandle, TokioScheduler};
pub use value::{CancelHandle, Deferred, DeferredState};
