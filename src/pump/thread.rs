//! Thread-per-link receive pump.

use std::io;
use std::sync::Arc;
use std::thread::{Builder, JoinHandle};

use tracing::debug;

use super::{PumpReport, forward};
use crate::core::{DEFAULT_PUMP_THREAD_NAME, Engine, Link, StationError, StationResult};

/// A dedicated thread forwarding link bytes into the engine.
///
/// The thread exits when [`Link::read`] returns the absence sentinel. Close the
/// link, then [`ReceivePump::join`] it; there is no other way to stop it.
#[derive(Debug)]
pub struct ReceivePump {
    handle: JoinHandle<PumpReport>,
}

impl ReceivePump {
    /// Spawn a pump on a thread named [`DEFAULT_PUMP_THREAD_NAME`].
    pub fn spawn<L: Link, E: Engine>(link: Arc<L>, engine: Arc<E>) -> io::Result<Self> {
        let builder = Builder::new().name(DEFAULT_PUMP_THREAD_NAME.to_string());
        Self::spawn_with(builder, link, engine)
    }

    /// Spawn a pump on a thread configured by `builder`.
    ///
    /// # Panics
    ///
    /// Like [`Builder::spawn`], panics if the builder's name contains a NUL
    /// byte. [`StationBuilder`](crate::station::StationBuilder) checks the
    /// name first and returns an error instead.
    pub fn spawn_with<L: Link, E: Engine>(
        builder: Builder,
        link: Arc<L>,
        engine: Arc<E>,
    ) -> io::Result<Self> {
        let handle = builder.spawn(move || run(&*link, &*engine))?;
        Ok(Self { handle })
    }

    /// Name of the pump thread, if it has one.
    pub fn thread_name(&self) -> Option<&str> {
        self.handle.thread().name()
    }

    /// Check if the pump thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the pump thread to exit.
    ///
    /// Blocks until the link reports closure. If the link never unblocks its
    /// reader, this never returns.
    pub fn join(self) -> StationResult<PumpReport> {
        self.handle.join().map_err(|_| StationError::PumpPanicked)
    }
}

fn run<L: Link, E: Engine>(link: &L, engine: &E) -> PumpReport {
    debug!("receive pump started");

    let mut report = PumpReport::default();
    while let Some(byte) = link.read() {
        forward(engine, byte, &mut report);
    }

    debug!(
        forwarded = report.forwarded,
        rejected = report.rejected,
        "receive pump observed link closure"
    );
    report
}
