//! Emitter core: registry, dispatch and aggregation.
//!
//! The public API from this module is [`Emitter`] (with its builder, weak
//! handle and config) and the [`Group`] enum used in logs and listings.
//!
//! Internal modules:
//! - [`registry`]: four-group listener store;
//! - [`dispatch`]: the four-step synchronous fan-out shared by both emit modes;
//! - [`aggregate`]: deferred collection, failure normalization and timeout;
//! - [`emitter`]: the component owners hold and delegate to;
//! - [`builder`], [`config`]: construction.

mod aggregate;
mod builder;
mod config;
mod dispatch;
mod emitter;
mod group;
mod registry;

pub use builder::EmitterBuilder;
pub use config::{DEFAULT_WAIT_TIMEOUT, EmitterConfig};
pub use emitter::{Emitter, WeakEmitter};
pub use group::Group;
