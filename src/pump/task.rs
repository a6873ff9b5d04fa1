//! Receive pump as a tokio task.
//!
//! Under cooperative scheduling the blocking `Link::read` becomes an await on
//! an [`AsyncRead`]. End of stream plays the role of the absence sentinel: the
//! task returns once the reader is closed. Ordering and shutdown-on-close match
//! the thread pump.
//!
//! The engine is synchronous and may block while ingesting, on its mutex or on
//! a `Link::write` when it answers through the transmitter. On a multi-thread
//! runtime each ingestion call runs under [`block_in_place`], so the worker
//! hands its other tasks off first. A current-thread runtime has no other
//! worker to hand off to: there the engine must not block on anything another
//! task of the same runtime has to drive.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::{JoinHandle, block_in_place};
use tracing::debug;

use super::{PumpReport, forward};
use crate::core::Engine;

/// Forward bytes from `reader` into `engine` until end of stream.
///
/// Read errors other than end of stream are returned unchanged.
pub async fn run<R, E>(mut reader: R, engine: &E) -> io::Result<PumpReport>
where
    R: AsyncRead + Unpin,
    E: Engine,
{
    debug!("receive task started");

    let mut report = PumpReport::default();
    loop {
        let byte = match reader.read_u8().await {
            Ok(byte) => byte,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        };
        ingest(engine, byte, &mut report);
    }

    debug!(
        forwarded = report.forwarded,
        rejected = report.rejected,
        "receive task observed end of stream"
    );
    Ok(report)
}

fn ingest<E: Engine>(engine: &E, byte: u8, report: &mut PumpReport) {
    let flavor = Handle::try_current().map(|handle| handle.runtime_flavor());
    if matches!(flavor, Ok(RuntimeFlavor::MultiThread)) {
        block_in_place(|| forward(engine, byte, report));
    } else {
        forward(engine, byte, report);
    }
}

/// Spawn [`run`] on the current tokio runtime.
pub fn spawn<R, E>(reader: R, engine: Arc<E>) -> JoinHandle<io::Result<PumpReport>>
where
    R: AsyncRead + Unpin + Send + 'static,
    E: Engine,
{
    tokio::spawn(async move { run(reader, &*engine).await })
}
