//! DCL2 Host - Synchronization Adapter
//!
//! The engine protects its state and coordinates blocking waits through a
//! [`SyncStrategy`] it receives at construction:
//! - Lazy attachment of one mutex and one bound condition variable
//! - Scoped, non-reentrant lock acquisition
//! - Timed waits where a non-positive timeout means "forever"
//! - Signaling only while the mutex is held

mod strategy;
mod thread;

pub use strategy::*;
pub use thread::*;
