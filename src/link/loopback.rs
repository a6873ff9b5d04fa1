//! In-memory loopback link pair.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use super::fault::{FaultInjector, FaultPlan, FaultPlanError};
use crate::core::Link;

/// One direction of a loopback pair.
#[derive(Debug)]
struct Channel {
    state: Mutex<ChannelState>,
    readable: Condvar,
}

#[derive(Debug)]
struct ChannelState {
    queue: VecDeque<u8>,
    closed: bool,
    faults: Option<FaultInjector>,
}

impl Channel {
    fn flawless() -> Self {
        Self {
            state: Mutex::new(ChannelState {
                queue: VecDeque::new(),
                closed: false,
                faults: None,
            }),
            readable: Condvar::new(),
        }
    }

    fn with_faults(plan: FaultPlan) -> Result<Self, FaultPlanError> {
        let mut queue = VecDeque::new();
        let faults = FaultInjector::new(plan, &mut queue)?;

        Ok(Self {
            state: Mutex::new(ChannelState {
                queue,
                closed: false,
                faults: Some(faults),
            }),
            readable: Condvar::new(),
        })
    }

    fn push(&self, bytes: &[u8]) {
        let mut state = self.state.lock();
        let ChannelState {
            queue,
            closed,
            faults,
        } = &mut *state;
        if *closed {
            return;
        }

        match faults {
            Some(faults) => {
                for &byte in bytes {
                    faults.transmit(byte, queue);
                }
            }
            None => queue.extend(bytes),
        }
        self.readable.notify_all();
    }

    fn pop(&self) -> Option<u8> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(byte) = state.queue.pop_front() {
                return Some(byte);
            }
            self.readable.wait(&mut state);
        }
    }

    fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.queue.clear();
        self.readable.notify_all();
    }

    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }
}

/// One end of an in-memory duplex link.
///
/// Bytes written on one end are read, in order, on the other. Writes never
/// block: each direction is an unbounded queue.
///
/// Closing either end cuts the wire in both directions. Blocked and future
/// reads on both ends return `None`, bytes not yet read are discarded, and
/// future writes are silently ignored. Because writes never block, a write in
/// flight when `close` is called always completes; `close` only unblocks reads.
#[derive(Debug)]
pub struct LoopbackLink {
    rx: Arc<Channel>,
    tx: Arc<Channel>,
}

impl LoopbackLink {
    /// Create two connected, flawless ends.
    pub fn pair() -> (Self, Self) {
        let a_to_b = Arc::new(Channel::flawless());
        let b_to_a = Arc::new(Channel::flawless());
        Self::join(a_to_b, b_to_a)
    }

    /// Create two connected ends with faults applied per direction.
    ///
    /// `a_to_b` damages bytes written on the first end, `b_to_a` bytes written
    /// on the second.
    pub fn pair_with_faults(
        a_to_b: FaultPlan,
        b_to_a: FaultPlan,
    ) -> Result<(Self, Self), FaultPlanError> {
        let a_to_b = Arc::new(Channel::with_faults(a_to_b)?);
        let b_to_a = Arc::new(Channel::with_faults(b_to_a)?);
        Ok(Self::join(a_to_b, b_to_a))
    }

    fn join(a_to_b: Arc<Channel>, b_to_a: Arc<Channel>) -> (Self, Self) {
        let a = Self {
            rx: Arc::clone(&b_to_a),
            tx: Arc::clone(&a_to_b),
        };
        let b = Self {
            rx: a_to_b,
            tx: b_to_a,
        };
        (a, b)
    }

    /// Check if the link has been cut.
    pub fn is_closed(&self) -> bool {
        self.rx.is_closed()
    }

    /// Bytes waiting to be read on this end.
    pub fn pending(&self) -> usize {
        self.rx.pending()
    }
}

impl Link for LoopbackLink {
    fn read(&self) -> Option<u8> {
        self.rx.pop()
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        self.tx.push(bytes);
        Ok(())
    }

    fn close(&self) {
        if !self.rx.is_closed() {
            debug!("cutting loopback link");
        }
        self.rx.close();
        self.tx.close();
    }
}
