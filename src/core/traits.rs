//! Contracts this layer consumes: the duplex link and the protocol engine.

use std::io;

use super::error::EngineResult;

/// A duplex, byte-oriented transport (serial line, OS pipe, socket, test double).
///
/// Every method may be called concurrently from the receive pump and from the
/// thread currently transmitting, so implementations must be thread-safe.
///
/// # Contract
///
/// - `read` blocks until one byte arrives or the link closes. After closure it
///   returns `None` (the absence sentinel) and keeps doing so.
/// - `write` blocks until every byte was written. After closure it is a no-op
///   that returns `Ok(())`.
/// - `close` is idempotent. It MUST unblock a `read` that is in progress.
///   Whether it also cancels an in-flight `write` is implementation-defined and
///   reported by [`Link::close_cancels_writes`].
///
/// The absence sentinel is the only shutdown signal the receive pump observes.
/// A link whose `read` never returns after `close` makes `Station::stop` block
/// forever.
///
/// # Example
///
/// ```ignore
/// struct Uart { /* ... */ }
///
/// impl Link for Uart {
///     fn read(&self) -> Option<u8> { self.rx_blocking() }
///     fn write(&self, bytes: &[u8]) -> io::Result<()> { self.tx_all(bytes) }
///     fn close(&self) { self.shutdown() }
/// }
/// ```
pub trait Link: Send + Sync + 'static {
    /// Read one byte, blocking. `None` means the link is closed.
    fn read(&self) -> Option<u8>;

    /// Write all of `bytes`, blocking until complete.
    fn write(&self, bytes: &[u8]) -> io::Result<()>;

    /// Close the link.
    fn close(&self);

    /// Whether `close` aborts a `write` that is already blocked.
    ///
    /// `false` means in-flight writes run to completion and only reads are
    /// unblocked.
    fn close_cancels_writes(&self) -> bool {
        false
    }
}

/// The synchronous protocol engine driven by this layer.
///
/// The engine performs framing, retransmission, acknowledgment and sequencing.
/// It guards its own state with the synchronization strategy it received at
/// construction, so every method takes `&self` and locks internally.
///
/// Only the ingestion entry point is required here. Protocol operations such as
/// connect, send or receive are inherent methods of the concrete engine, called
/// by the embedding application through `Station::engine`.
pub trait Engine: Send + Sync + 'static {
    /// Feed received bytes into the engine.
    ///
    /// The receive pump calls this once per byte, in arrival order.
    fn process_data(&self, data: &[u8]) -> EngineResult<()>;
}
