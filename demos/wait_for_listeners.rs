//! # Emit-and-Wait Example
//!
//! Listeners return deferreds; `emit_and_wait` settles once all of them have
//! settled, swallowing rejections, or is cancelled when the timeout elapses.
//!
//! ## Run
//! ```bash
//! RUST_LOG=wildemit=debug cargo run --example wait_for_listeners
//! ```

use std::time::Duration;

use tracing_subscriber::EnvFilter;
use wildemit::{Deferred, DeferredError, Emitter, EmitterConfig, Listener};

fn after(ms: u64, outcome: Result<(), DeferredError>) -> Deferred<()> {
    Deferred::from_future(async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        outcome
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = EmitterConfig {
        wait_timeout: Duration::from_millis(500),
        ..EmitterConfig::default()
    };
    let emitter: Emitter<u64> = Emitter::builder(cfg).build();

    emitter
        .on("shutdown", Listener::new(|ms: &u64| Ok(after(*ms, Ok(())))))?
        .on(
            "shutdown",
            Listener::new(|ms: &u64| Ok(after(*ms / 2, Err(DeferredError::rejected("flush failed"))))),
        )?
        .on(
            "shutdown",
            Listener::new(|_: &u64| {
                println!("plain listener done inline");
                Ok(())
            }),
        )?;

    let started = tokio::time::Instant::now();
    let settled = emitter.emit_and_wait("shutdown", &200)?.await;
    println!("fast shutdown: {settled:?} after {:?}", started.elapsed());

    let started = tokio::time::Instant::now();
    let timed_out = emitter.emit_and_wait("shutdown", &2_000)?.await;
    println!("slow shutdown: {timed_out:?} after {:?}", started.elapsed());

    Ok(())
}
