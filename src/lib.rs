//! # wildemit
//!
//! **wildemit** is an in-process event emitter for Rust with wildcard and
//! regular-expression listeners.
//!
//! Components register interest in named events, optionally with glob or
//! regex patterns, and the emitter invokes matching listeners synchronously.
//! A second mode, emit-and-wait, collects listener-returned [`Deferred`]
//! values into one aggregate that settles when all of them complete or a
//! timeout elapses, whichever comes first.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   on("user.created", l1)   on("user.*", l2)   once("~^job\.\d+$", l3)
//!            │                      │                     │
//!            ▼                      ▼                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  PatternCompiler                                                  │
//! │  literal ─► key = name          pattern ─► key = "/regex/"        │
//! └──────┬──────────────────────────────────────┬─────────────────────┘
//!        ▼                                      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Registry (insertion ordered)                                     │
//! │  [Exact]  [ExactOnce]              [Pattern]  [PatternOnce]       │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                    dispatch(name): 1 Exact → 2 ExactOnce (taken)
//!                                    3 Pattern → 4 PatternOnce (taken)
//!                          ┌────────┴─────────┐
//!                          ▼                  ▼
//!                   emit(): replies     emit_and_wait(): Reply::Deferred
//!                   discarded           ─► then(→ true, → true)
//!                                       ─► Deferred::all ─► race Scheduler timer
//! ```
//!
//! ### Dispatch rules
//! - Listeners run inline on the caller's thread, in registration order.
//! - Each dispatch step works on a snapshot; once entries leave the registry
//!   before their listeners run.
//! - A listener error aborts the emission and is returned to the caller.
//! - In emit-and-wait, a deferred that **rejects** still counts as settled;
//!   an error **returned** by a listener still aborts the call.
//!
//! ## Features
//! | Area             | Description                                              | Key types / traits                      |
//! |------------------|----------------------------------------------------------|-----------------------------------------|
//! | **Emitter**      | Register, remove, list and emit.                         | [`Emitter`], [`EmitterBuilder`]         |
//! | **Listeners**    | Identity-compared callables with plain/deferred replies. | [`Listener`], [`Reply`]                 |
//! | **Patterns**     | Glob and regex event specs.                              | [`PatternCompiler`], [`Matcher`]        |
//! | **Deferreds**    | Cancellable values awaited by emit-and-wait.             | [`Deferred`], [`DeferredState`]         |
//! | **Timers**       | Injected timeout scheduling.                             | [`Scheduler`], [`TokioScheduler`]       |
//! | **Errors**       | Typed errors for emitter, listeners and deferreds.       | [`EmitError`], [`ListenerError`]        |
//! | **Configuration**| Wait timeout and pattern limits.                         | [`EmitterConfig`]                       |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use wildemit::{Deferred, Emitter, Listener};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let emitter: Emitter<String> = Emitter::new();
//!
//!     emitter.on("order.*", Listener::new(|id: &String| {
//!         let id = id.clone();
//!         Ok(Deferred::from_future(async move {
//!             tokio::time::sleep(Duration::from_millis(10)).await;
//!             println!("order {id} persisted");
//!             Ok(())
//!         }))
//!     }))?;
//!
//!     let done = emitter.emit_and_wait("order.created", &"42".to_string())?;
//!     assert!(done.await?);
//!     Ok(())
//! }
//! ```
mod core;
mod deferred;
mod error;
mod listeners;
mod patterns;

// ---- Public re-exports ----

pub use self::core::{
    DEFAULT_WAIT_TIMEOUT, Emitter, EmitterBuilder, EmitterConfig, Group, WeakEmitter,
};
pub use deferred::{
    CancelHandle, Deferred, DeferredState, Scheduler, TimerCallback, TimerHandle, TokioScheduler,
};
pub use error::{DeferredError, EmitError, ListenerError, ScheduleError};
pub use listeners::{Listener, Reply};
pub use patterns::{CompiledSpec, Matcher, PatternCompiler, is_pattern, pattern_key};
