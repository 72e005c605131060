//! # Aggregate listener deferreds for emit-and-wait.
//!
//! ## Flow
//! ```text
//! replies ──► keep pending Reply::Deferred ──► then(ok → true, err → true)
//!                                          │
//!                 none left? ──► Deferred::resolved(true)   (no timer)
//!                                          │
//!                                          ▼
//!                              Deferred::all(members).map(→ true)
//!                                          │
//!                  Scheduler::schedule(timeout, cancel aggregate if pending)
//! ```
//!
//! ## Rules
//! - Replies already settled (or cancelled) when the listener returns count as
//!   settled at emit time and are not waited on.
//! - Members and the aggregate are driven by runtime tasks, so the aggregate
//!   settles as soon as its last member does, awaited or not.
//! - A member rejection settles its wrapper with `true`; it never fails the
//!   aggregate.
//! - The timer cancels the aggregate only while it is pending; settling first
//!   releases the timer.
//! - Cancelling the aggregate cancels every member still pending.

use std::time::Duration;

use tracing::{debug, warn};

use crate::deferred::{Deferred, Scheduler};
use crate::error::EmitError;
use crate::listeners::Reply;

/// Builds the aggregate deferred of one `emit_and_wait` call.
pub(crate) fn aggregate(
    event: &str,
    replies: Vec<Reply>,
    scheduler: &dyn Scheduler,
    timeout: Duration,
) -> Result<Deferred<bool>, EmitError> {
    let members: Vec<Deferred<bool>> = replies
        .into_iter()
        .filter_map(Reply::into_deferred)
        .filter(Deferred::is_pending)
        .map(|d| d.then(|()| true, |_| true))
        .collect();

    if members.is_empty() {
        return Ok(Deferred::resolved(true));
    }

    let count = members.len();
    let aggregate = Deferred::all(members).map(|_| true);

    let handle = aggregate.cancel_handle();
    let timed_out = event.to_owned();
    let timer = scheduler
        .schedule(
            timeout,
            Box::new(move || {
                if handle.cancel() {
                    warn!(event = %timed_out, ?timeout, "wait timed out; aggregate cancelled");
                }
            }),
        )
        .inspect_err(|_| {
            aggregate.cancel();
        })?;
    aggregate.attach_timer(timer);

    debug!(event, members = count, ?timeout, "waiting for deferred listeners");
    Ok(aggregate)
}
