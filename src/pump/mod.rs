//! DCL2 Host - Receive Pump
//!
//! Turns a blocking, byte-at-a-time link into a continuous feed into the
//! engine's ingestion entry point:
//!
//! - **Thread pump**: [`ReceivePump`], one dedicated OS thread per link
//! - **Task pump**: [`task`], a tokio task over any `AsyncRead` (feature `async`)
//!
//! Both read one byte, hand it to [`Engine::process_data`], and repeat until
//! the link reports closure. Nothing is buffered across iterations, so bytes
//! reach the engine in exactly the order they were read. A pump never
//! initiates shutdown; it only reacts to the link closing.

mod thread;

#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub mod task;

pub use thread::ReceivePump;

use tracing::warn;

use crate::core::Engine;

/// What a pump did before it observed link closure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Bytes handed to the engine.
    pub forwarded: u64,
    /// Of those, bytes the engine reported an error for.
    pub rejected: u64,
}

/// Hand one received byte to the engine.
///
/// Ingestion errors are the engine's business: they are logged and counted,
/// never retried or translated.
fn forward<E: Engine>(engine: &E, byte: u8, report: &mut PumpReport) {
    report.forwarded += 1;
    if let Err(err) = engine.process_data(&[byte]) {
        report.rejected += 1;
        warn!(%err, byte, "engine rejected received byte");
    }
}
