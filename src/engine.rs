//! What an engine receives when the station constructs it.

use std::sync::Arc;

use crate::core::{Link, SyncResult};
use crate::sync::SyncStrategy;
use crate::transmit::Transmitter;

/// Construction context handed to the engine factory.
///
/// Carries the synchronization strategy that will guard the engine's state and
/// the transmit callback for outbound bytes. The engine is expected to attach
/// its state with [`EngineContext::attach`] (or the two `*_init` calls on the
/// strategy, in order) before returning.
#[derive(Debug)]
pub struct EngineContext<S, L> {
    sync: Arc<S>,
    transmitter: Transmitter<L>,
}

impl<S: SyncStrategy, L: Link> EngineContext<S, L> {
    pub(crate) fn new(sync: Arc<S>, transmitter: Transmitter<L>) -> Self {
        Self { sync, transmitter }
    }

    /// Attach `state` to the mutex and bind the condition variable.
    pub fn attach(&self, state: S::State) -> SyncResult<()> {
        self.sync.mutex_init(state)?;
        self.sync.condvar_init()
    }

    /// Split into the strategy and the transmitter for the engine to keep.
    pub fn into_parts(self) -> (Arc<S>, Transmitter<L>) {
        (self.sync, self.transmitter)
    }
}
