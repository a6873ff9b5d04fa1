//! # DCL2 Host
//!
//! Host-side adaptation layer for **D**ead**C**om **L**ayer **2**, a reliable
//! framed link-layer protocol that exchanges opaque payloads over a duplex,
//! byte-oriented, possibly slow transport (serial line, OS pipe, ...).
//!
//! The protocol engine itself (framing, retransmission, acknowledgment,
//! sequencing) is a synchronous state machine supplied by the embedder. This
//! crate provides everything around it:
//!
//! - **Synchronization**: [`sync::SyncStrategy`], the mutex and condition
//!   variable the engine guards its state with, and [`sync::ThreadSync`] for OS
//!   threads
//! - **Link contract**: [`core::Link`], blocking read, blocking write and
//!   idempotent close
//! - **Receive pump**: [`pump::ReceivePump`], a dedicated thread feeding link
//!   bytes into the engine in order
//! - **Transmit path**: [`transmit::Transmitter`], the callback the engine emits
//!   bytes through
//! - **Lifecycle**: [`station::Station`], start and race-free stop
//!
//! ## Feature Flags
//!
//! - `loopback` (default): in-memory [`link::LoopbackLink`] with fault injection
//! - `async` (default): receive pump as a tokio task ([`pump::task`])
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use dcl2::prelude::*;
//!
//! // A stand-in engine that only counts received bytes.
//! struct ByteCounter {
//!     sync: Arc<ThreadSync<usize>>,
//! }
//!
//! impl Engine for ByteCounter {
//!     fn process_data(&self, data: &[u8]) -> EngineResult<()> {
//!         let mut count = self.sync.lock();
//!         *count += data.len();
//!         self.sync.condvar_signal(&count);
//!         Ok(())
//!     }
//! }
//!
//! let (local, remote) = LoopbackLink::pair();
//! let mut station = Station::start(
//!     Arc::new(local),
//!     Arc::new(ThreadSync::new()),
//!     |context| {
//!         context.attach(0)?;
//!         let (sync, _transmitter) = context.into_parts();
//!         Ok(ByteCounter { sync })
//!     },
//! )?;
//!
//! remote.write(&[0x01, 0x02, 0x03])?;
//!
//! let engine = station.engine()?;
//! let mut count = engine.sync.lock();
//! while *count < 3 {
//!     engine.sync.condvar_wait(&mut count, 1000);
//! }
//! drop(count);
//!
//! station.stop()?;
//! assert!(station.engine().is_err());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core contracts (always included)
pub mod core;

pub mod engine;
pub mod pump;
pub mod station;
pub mod sync;
pub mod transmit;

// Loopback link (feature-gated)
#[cfg(feature = "loopback")]
#[cfg_attr(docsrs, doc(cfg(feature = "loopback")))]
pub mod link;

#[cfg(all(test, feature = "loopback"))]
mod testing;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::*;
    pub use crate::engine::EngineContext;
    pub use crate::pump::{PumpReport, ReceivePump};
    pub use crate::station::{LifecycleState, Station, StationBuilder};
    pub use crate::sync::{SyncStrategy, ThreadSync, ThreadSyncGuard, WaitOutcome};
    pub use crate::transmit::Transmitter;

    #[cfg(feature = "loopback")]
    pub use crate::link::{ByteFault, FaultPlan, FaultPlanError, LoopbackLink};
}

// Re-export commonly used items at crate root
pub use crate::core::{Engine, EngineError, Link, StationError};
pub use crate::station::{LifecycleState, Station, StationBuilder};
pub use crate::sync::{SyncStrategy, ThreadSync, WaitOutcome};
