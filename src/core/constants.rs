//! Engine contract constants and host-layer defaults.
//!
//! The engine values are fixed by the DCL2 protocol and MUST NOT be changed.
//! They are exported so embedders can size buffers and bound shutdown waits.

use std::time::Duration;

// =============================================================================
// ENGINE CONTRACT
// =============================================================================

/// Time the engine waits for a connection response.
pub const CONN_TIMEOUT_MS: u32 = 100;

/// Time the engine waits for a message acknowledgment.
pub const ACK_TIMEOUT_MS: u32 = 100;

/// Largest payload a single message may carry.
pub const PAYLOAD_MAX_LEN: usize = 249;

/// Consecutive failures after which the engine resets the link.
pub const MAX_FAILURE_COUNT: u32 = 3;

/// Worst-case encoded frame length.
///
/// Two flag bytes, up to four bytes of escaped FCS, up to four bytes of
/// escaped address and control, and a fully escaped payload.
pub const MAX_FRAME_LEN: usize = PAYLOAD_MAX_LEN * 2 + 10;

/// Longest the engine can stay busy before it gives up on an unresponsive peer.
///
/// A receive pump that honors link closure exits well within this bound.
pub const ENGINE_GIVE_UP_INTERVAL: Duration =
    Duration::from_millis((CONN_TIMEOUT_MS * MAX_FAILURE_COUNT * 2) as u64);

// =============================================================================
// HOST DEFAULTS
// =============================================================================

/// Default name of the receive pump thread.
pub const DEFAULT_PUMP_THREAD_NAME: &str = "dcl2-rx";
