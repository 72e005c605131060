use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{config::EmitterConfig, emitter::Emitter, registry::Registry};
use crate::deferred::{Scheduler, TokioScheduler};

/// Builder for constructing an [`Emitter`] with optional collaborators.
pub struct EmitterBuilder<A> {
    cfg: EmitterConfig,
    scheduler: Option<Arc<dyn Scheduler>>,
    _args: PhantomData<fn(&A)>,
}

impl<A> EmitterBuilder<A> {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: EmitterConfig) -> Self {
        Self {
            cfg,
            scheduler: None,
            _args: PhantomData,
        }
    }

    /// Sets the scheduler used for `emit_and_wait` timeouts.
    ///
    /// Defaults to [`TokioScheduler::new`], which uses the runtime of the
    /// calling context.
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Builds and returns the emitter.
    ///
    /// This consumes the builder and initializes:
    /// - the pattern compiler (from `pattern_size_limit`)
    /// - an empty four-group registry
    /// - the scheduler
    pub fn build(self) -> Emitter<A> {
        let registry = Mutex::new(Registry::new(self.cfg.compiler()));
        let scheduler = self
            .scheduler
            .unwrap_or_else(|| Arc::new(TokioScheduler::new()));

        Emitter::new_internal(self.cfg, registry, scheduler)
    }
}
