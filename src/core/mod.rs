//! Core contracts, constants, and error types.
//!
//! Nothing here performs I/O or spawns threads.

mod constants;
mod error;
mod traits;

pub use constants::*;
pub use error::*;
pub use traits::*;
