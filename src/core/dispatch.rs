//! # Dispatch an event to its listeners.
//!
//! Resolves the listeners of one event and invokes them inline, on the
//! caller's thread, handing every reply to a sink. `emit` discards replies;
//! `emit_and_wait` collects them.
//!
//! ## Order
//! ```text
//! 1. Exact        snapshot(name)                     → invoke
//! 2. ExactOnce    take(name)                         → invoke
//! 3. Pattern      snapshot(matching keys)            → invoke key by key
//! 4. PatternOnce  take(matching keys)                → invoke key by key
//! ```
//!
//! ## Rules
//! - Each step snapshots (or takes) its listeners when the step starts; the
//!   registry lock is released before the first listener of the step runs.
//! - Listeners may register, remove or emit re-entrantly. Changes are seen by
//!   later steps and later emissions, never by the snapshot being invoked.
//! - Once entries are out of the registry before their listeners run, so a
//!   once listener never runs twice, even if it re-emits its own event.
//! - The first listener error aborts the emission and is returned.

use parking_lot::Mutex;
use tracing::debug;

use crate::core::group::Group;
use crate::core::registry::{Registry, ensure_name};
use crate::error::EmitError;
use crate::listeners::{Listener, Reply};

/// Runs the four dispatch steps for `event`.
///
/// Returns the number of listeners invoked.
pub(crate) fn dispatch<A, S>(
    registry: &Mutex<Registry<A>>,
    op: &'static str,
    event: &str,
    args: &A,
    mut sink: S,
) -> Result<usize, EmitError>
where
    S: FnMut(Reply),
{
    ensure_name(event, op)?;
    let mut invoked = 0;

    let exact = registry.lock().snapshot(Group::Exact, event);
    invoke(event, &exact, args, &mut sink, &mut invoked)?;

    let exact_once = registry.lock().take(Group::ExactOnce, event);
    invoke(event, &exact_once, args, &mut sink, &mut invoked)?;

    let pattern = registry.lock().find_pattern_listeners(Some(event), Group::Pattern);
    for listeners in pattern.values() {
        invoke(event, listeners, args, &mut sink, &mut invoked)?;
    }

    let pattern_once = registry.lock().take_matching(Group::PatternOnce, event);
    for listeners in pattern_once.values() {
        invoke(event, listeners, args, &mut sink, &mut invoked)?;
    }

    debug!(event, op, invoked, "event dispatched");
    Ok(invoked)
}

fn invoke<A, S>(
    event: &str,
    listeners: &[Listener<A>],
    args: &A,
    sink: &mut S,
    invoked: &mut usize,
) -> Result<(), EmitError>
where
    S: FnMut(Reply),
{
    for listener in listeners {
        *invoked += 1;
        match listener.call(args) {
            Ok(reply) => sink(reply),
            Err(source) => {
                debug!(event, error = source.as_label(), "listener failed; emission aborted");
                return Err(EmitError::Listener {
                    event: event.to_owned(),
                    source,
                });
            }
        }
    }
    Ok(())
}
