//! Transmit path: the callback the engine uses to emit bytes.

use std::io;
use std::sync::Arc;

use tracing::trace;

use crate::core::Link;

/// Forwards outbound byte blocks from the engine to the link.
///
/// The engine calls [`Transmitter::transmit`] synchronously from whichever
/// thread holds its mutex. The block goes to [`Link::write`] verbatim: no
/// retry, no chunking. Retransmission belongs to the engine.
#[derive(Debug)]
pub struct Transmitter<L> {
    link: Arc<L>,
}

impl<L: Link> Transmitter<L> {
    /// Create a transmitter writing to `link`.
    pub fn new(link: Arc<L>) -> Self {
        Self { link }
    }

    /// Write `bytes` to the link, blocking until complete.
    ///
    /// Errors from the link are returned unchanged. After the link is closed
    /// this is a no-op.
    pub fn transmit(&self, bytes: &[u8]) -> io::Result<()> {
        trace!(len = bytes.len(), "transmitting");
        self.link.write(bytes)
    }
}

// Manual impl: `L` itself need not be `Clone`.
impl<L> Clone for Transmitter<L> {
    fn clone(&self) -> Self {
        Self {
            link: Arc::clone(&self.link),
        }
    }
}
