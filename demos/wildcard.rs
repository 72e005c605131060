//! # Wildcard Listeners Example
//!
//! Shows literal, glob and regex listeners side by side, plus `once`.
//!
//! ## Run
//! ```bash
//! RUST_LOG=wildemit=trace cargo run --example wildcard
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing_subscriber::EnvFilter;
use wildemit::{Emitter, Listener};

#[derive(Debug)]
struct UserEvent {
    id: u64,
    name: &'static str,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let emitter: Emitter<UserEvent> = Emitter::new();
    let audited = Arc::new(AtomicU64::new(0));

    emitter
        .on(
            "user.created",
            Listener::new(|e: &UserEvent| {
                println!("[exact]   welcome, {} (#{})", e.name, e.id);
                Ok(())
            }),
        )?
        .on("user.*", {
            let audited = Arc::clone(&audited);
            Listener::new(move |e: &UserEvent| {
                audited.fetch_add(1, Ordering::Relaxed);
                println!("[glob]    audit user #{}", e.id);
                Ok(())
            })
        })?
        .on(
            r"~^user\.(deleted|banned)$",
            Listener::new(|e: &UserEvent| {
                println!("[regex]   revoke sessions of #{}", e.id);
                Ok(())
            }),
        )?
        .once(
            "user.*",
            Listener::new(|e: &UserEvent| {
                println!("[once]    first user event ever: #{}", e.id);
                Ok(())
            }),
        )?;

    emitter.emit("user.created", &UserEvent { id: 1, name: "ada" })?;
    emitter.emit("user.deleted", &UserEvent { id: 1, name: "ada" })?;
    emitter.emit("order.created", &UserEvent { id: 2, name: "bob" })?;

    println!();
    println!("Registered keys:");
    for (key, listeners) in emitter.all_listeners() {
        println!(" ├─► {key:<28} {} listener(s)", listeners.len());
    }
    println!(" └─► audited events: {}", audited.load(Ordering::Relaxed));
    Ok(())
}
