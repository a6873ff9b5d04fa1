//! Error types for the DCL2 host layer.

use std::io;

use thiserror::Error;

/// Errors raised by a synchronization strategy.
///
/// These are lifecycle violations: the engine used the adapter out of order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The condition variable was attached before the mutex it binds to.
    #[error("condition variable initialized before its mutex")]
    MutexNotInitialized,
}

/// Result codes reported by the protocol engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid parameters or an external callback failed.
    #[error("engine operation failed")]
    Failure,

    /// The link is not in the connected state.
    #[error("link is not connected")]
    NotConnected,

    /// The peer stopped acknowledging and the link was reset.
    #[error("peer did not acknowledge, link reset")]
    LinkReset,

    /// The transmit callback could not write to the link.
    #[error("transmit failed: {0}")]
    Transmit(#[from] io::Error),
}

/// Errors from the station lifecycle controller.
#[derive(Debug, Error)]
pub enum StationError {
    /// The station completed `stop()` and its engine handle is retired.
    #[error("station is retired")]
    Retired,

    /// The engine factory refused to build an engine.
    #[error("engine initialization failed: {0}")]
    EngineInit(#[from] EngineError),

    /// The engine used the synchronization adapter out of order.
    #[error("synchronization setup failed: {0}")]
    Sync(#[from] SyncError),

    /// The receive pump thread could not be spawned.
    #[error("failed to spawn receive pump: {0}")]
    PumpSpawn(#[source] io::Error),

    /// The receive pump thread panicked before observing link closure.
    #[error("receive pump panicked")]
    PumpPanicked,
}

impl StationError {
    /// Check if this error is a lifecycle violation by the caller.
    pub fn is_lifecycle_violation(&self) -> bool {
        matches!(self, StationError::Retired | StationError::Sync(_))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type for synchronization setup.
pub type SyncResult<T> = Result<T, SyncError>;

/// Result type for station operations.
pub type StationResult<T> = Result<T, StationError>;
