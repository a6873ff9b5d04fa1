//! Lifecycle controller tying engine, synchronization and receive pump together.
//!
//! ```text
//! Constructed ──start──▶ Running ──stop()──▶ Stopping ──pump joined──▶ Stopped
//!                                 (close link)                     (retired)
//! ```
//!
//! `Stopped` is terminal. A retired station rejects every operation; reuse
//! needs a fresh [`Station::start`].

use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread::Builder;

use tracing::{debug, info, warn};

use crate::core::{DEFAULT_PUMP_THREAD_NAME, Engine, Link, StationError, StationResult};
use crate::engine::EngineContext;
use crate::pump::{PumpReport, ReceivePump};
use crate::sync::SyncStrategy;
use crate::transmit::Transmitter;

/// Lifecycle state of a [`Station`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Engine being built, pump not yet started.
    Constructed,
    /// Pump running, engine accepting operations.
    Running,
    /// Link closed, waiting for the pump to exit.
    Stopping,
    /// Pump joined, engine handle retired.
    Stopped,
}

/// Builder for starting a [`Station`] with custom pump options.
#[derive(Debug, Clone)]
pub struct StationBuilder {
    pump_thread_name: String,
    pump_stack_size: Option<usize>,
}

impl Default for StationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StationBuilder {
    /// Create a builder with default options.
    pub fn new() -> Self {
        Self {
            pump_thread_name: DEFAULT_PUMP_THREAD_NAME.to_string(),
            pump_stack_size: None,
        }
    }

    /// Set the receive pump thread name.
    ///
    /// A name containing a NUL byte makes [`StationBuilder::start`] fail with
    /// [`StationError::PumpSpawn`].
    pub fn pump_thread_name(mut self, name: impl Into<String>) -> Self {
        self.pump_thread_name = name.into();
        self
    }

    /// Set the receive pump thread stack size in bytes.
    pub fn pump_stack_size(mut self, size: usize) -> Self {
        self.pump_stack_size = Some(size);
        self
    }

    /// Build the engine and start the receive pump.
    ///
    /// `make_engine` receives the synchronization strategy and the transmit
    /// callback, and must attach its state before returning. Construction either
    /// fully succeeds or returns an error; no partially started station exists.
    /// If the pump cannot be spawned the link is closed before returning.
    pub fn start<S, L, E, F>(
        self,
        link: Arc<L>,
        sync: Arc<S>,
        make_engine: F,
    ) -> StationResult<Station<E, L>>
    where
        S: SyncStrategy,
        L: Link,
        E: Engine,
        F: FnOnce(EngineContext<S, L>) -> StationResult<E>,
    {
        debug!(state = ?LifecycleState::Constructed, "building engine");
        let context = EngineContext::new(sync, Transmitter::new(Arc::clone(&link)));
        let engine = Arc::new(make_engine(context)?);

        let pump = match self.spawn_pump(Arc::clone(&link), Arc::clone(&engine)) {
            Ok(pump) => pump,
            Err(err) => {
                link.close();
                return Err(StationError::PumpSpawn(err));
            }
        };

        info!(pump = %self.pump_thread_name, "station running");
        Ok(Station {
            engine: Some(engine),
            link,
            pump: Some(pump),
            state: LifecycleState::Running,
        })
    }

    fn spawn_pump<L: Link, E: Engine>(
        &self,
        link: Arc<L>,
        engine: Arc<E>,
    ) -> io::Result<ReceivePump> {
        // std panics on an interior NUL at spawn time instead of returning an error.
        if self.pump_thread_name.contains('\0') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "pump thread name contains a NUL byte",
            ));
        }

        let mut builder = Builder::new().name(self.pump_thread_name.clone());
        if let Some(size) = self.pump_stack_size {
            builder = builder.stack_size(size);
        }
        ReceivePump::spawn_with(builder, link, engine)
    }
}

/// One DCL2 link endpoint: an engine, its link, and the pump feeding it.
///
/// Always call [`Station::stop`]. Dropping a running station leaks the pump
/// thread until something else closes the link.
pub struct Station<E, L> {
    /// `None` once retired.
    engine: Option<Arc<E>>,
    link: Arc<L>,
    /// `None` once joined.
    pump: Option<ReceivePump>,
    state: LifecycleState,
}

impl<E: Engine, L: Link> Station<E, L> {
    /// Build the engine and start the receive pump with default options.
    ///
    /// See [`StationBuilder::start`].
    pub fn start<S, F>(link: Arc<L>, sync: Arc<S>, make_engine: F) -> StationResult<Self>
    where
        S: SyncStrategy,
        F: FnOnce(EngineContext<S, L>) -> StationResult<E>,
    {
        StationBuilder::new().start(link, sync, make_engine)
    }

    /// The engine, for protocol operations.
    ///
    /// Returns [`StationError::Retired`] once the station is stopped.
    pub fn engine(&self) -> StationResult<&E> {
        self.engine.as_deref().ok_or(StationError::Retired)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Check if the receive pump thread is still running.
    pub fn is_pump_alive(&self) -> bool {
        self.pump.as_ref().is_some_and(|pump| !pump.is_finished())
    }

    /// Name of the receive pump thread, while it has not been joined.
    pub fn pump_thread_name(&self) -> Option<&str> {
        self.pump.as_ref().and_then(ReceivePump::thread_name)
    }

    /// Close the link, wait for the pump to exit, and retire the engine.
    ///
    /// Blocks until the pump observes closure. With a link whose `read` never
    /// returns after `close`, this never returns. After it returns, every
    /// operation on this station fails with [`StationError::Retired`], even
    /// when the pump panicked.
    pub fn stop(&mut self) -> StationResult<PumpReport> {
        let Some(pump) = self.pump.take() else {
            return Err(StationError::Retired);
        };

        self.transition(LifecycleState::Stopping);
        if !self.link.close_cancels_writes() {
            debug!("link close does not cancel in-flight writes, pump may finish one first");
        }
        self.link.close();

        let joined = pump.join();
        self.engine = None;
        self.transition(LifecycleState::Stopped);

        match &joined {
            Ok(report) => info!(
                forwarded = report.forwarded,
                rejected = report.rejected,
                "station stopped"
            ),
            Err(err) => warn!(%err, "station stopped abnormally"),
        }
        joined
    }

    fn transition(&mut self, next: LifecycleState) {
        debug!(from = ?self.state, to = ?next, "station state change");
        self.state = next;
    }
}

impl<E, L> fmt::Debug for Station<E, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Station")
            .field("state", &self.state)
            .field("retired", &self.engine.is_none())
            .field("pump", &self.pump)
            .finish_non_exhaustive()
    }
}

impl<E, L> Drop for Station<E, L> {
    fn drop(&mut self) {
        if self.state == LifecycleState::Running {
            warn!("station dropped without stop(), receive pump leaks until the link closes");
        }
    }
}
