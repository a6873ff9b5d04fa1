//! DCL2 Host - Loopback Link
//!
//! An in-memory implementation of the [`Link`](crate::core::Link) contract for
//! tests and demos:
//!
//! - **Loopback pair**: [`LoopbackLink::pair`] connects two ends back to back
//! - **Fault injection**: [`FaultPlan`] drops, corrupts and injects bytes,
//!   deterministically from position lists and a seeded generator
//!
//! ```text
//!   end A                                end B
//! ┌────────┐  write ──[ a_to_b plan ]──▶ read  ┌────────┐
//! │station │                                   │ remote │
//! └────────┘  read  ◀──[ b_to_a plan ]── write └────────┘
//! ```

mod fault;
mod loopback;

pub use fault::{ByteFault, FaultPlan, FaultPlanError};
pub use loopback::LoopbackLink;
