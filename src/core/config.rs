//! # Emitter configuration.
//!
//! Provides [`EmitterConfig`] centralized settings for an [`Emitter`](crate::Emitter).
//!
//! Config is used in two ways:
//! 1. **Emitter creation**: `Emitter::builder(config).build()`
//! 2. **Wait defaults**: `Emitter::emit_and_wait` uses [`EmitterConfig::wait_timeout`]
//!
//! ## Sentinel values
//! - `pattern_size_limit = 0` → regex engine default size limit

use std::time::Duration;

use crate::patterns::PatternCompiler;

/// Default timeout of `emit_and_wait`.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for an emitter.
///
/// ## Field semantics
/// - `wait_timeout`: how long `emit_and_wait` lets the aggregate stay pending
///   before cancelling it
/// - `pattern_size_limit`: compiled size limit for pattern matchers in bytes
///   (`0` = engine default)
#[derive(Clone, Debug)]
pub struct EmitterConfig {
    /// Default timeout applied by `emit_and_wait`.
    ///
    /// Can be overridden per call with `emit_and_wait_timeout`.
    pub wait_timeout: Duration,

    /// Upper bound for the compiled size of a pattern's regular expression.
    ///
    /// Patterns exceeding it are rejected at registration with
    /// `EmitError::InvalidPattern`.
    pub pattern_size_limit: usize,
}

impl EmitterConfig {
    /// Builds the pattern compiler described by this config.
    #[inline]
    pub fn compiler(&self) -> PatternCompiler {
        PatternCompiler::new(self.pattern_size_limit)
    }
}

impl Default for EmitterConfig {
    /// Default configuration:
    ///
    /// - `wait_timeout = 10s`
    /// - `pattern_size_limit = 0` (engine default)
    fn default() -> Self {
        Self {
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            pattern_size_limit: 0,
        }
    }
}
