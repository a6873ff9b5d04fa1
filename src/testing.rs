//! Test engine that records what the receive pump feeds it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::core::{
    ACK_TIMEOUT_MS, Engine, EngineError, EngineResult, Link, MAX_FAILURE_COUNT, PAYLOAD_MAX_LEN,
    StationResult,
};
use crate::engine::EngineContext;
use crate::sync::{SyncStrategy, ThreadSync};
use crate::transmit::Transmitter;

pub(crate) type RecorderSync = ThreadSync<Vec<u8>>;

/// Records every ingested byte under the engine mutex.
///
/// Optionally echoes ingested bytes back through the transmitter and rejects
/// one marker byte with `NotConnected`. Every section that holds the mutex is
/// counted, so two of them running at once shows up in [`overlapped`].
///
/// [`overlapped`]: RecordingEngine::overlapped
pub(crate) struct RecordingEngine<L> {
    sync: Arc<RecorderSync>,
    transmitter: Transmitter<L>,
    echo: bool,
    reject: Option<u8>,
    inside: AtomicUsize,
    overlapped: AtomicBool,
}

/// One open mutex-guarded section. Closes on drop.
struct Section<'a> {
    inside: &'a AtomicUsize,
}

impl Drop for Section<'_> {
    fn drop(&mut self) {
        self.inside.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<L: Link> RecordingEngine<L> {
    pub(crate) fn new(context: EngineContext<RecorderSync, L>) -> StationResult<Self> {
        context.attach(Vec::new())?;
        let (sync, transmitter) = context.into_parts();
        Ok(Self {
            sync,
            transmitter,
            echo: false,
            reject: None,
            inside: AtomicUsize::new(0),
            overlapped: AtomicBool::new(false),
        })
    }

    /// Build outside a station, over `link`.
    pub(crate) fn standalone(link: Arc<L>) -> Self {
        let context = EngineContext::new(Arc::new(ThreadSync::new()), Transmitter::new(link));
        Self::new(context).unwrap()
    }

    pub(crate) fn echoing(mut self) -> Self {
        self.echo = true;
        self
    }

    pub(crate) fn rejecting(mut self, byte: u8) -> Self {
        self.reject = Some(byte);
        self
    }

    /// Open a section. Must be called with the mutex held.
    fn enter(&self) -> Section<'_> {
        if self.inside.fetch_add(1, Ordering::SeqCst) != 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        Section {
            inside: &self.inside,
        }
    }

    pub(crate) fn received(&self) -> Vec<u8> {
        let guard = self.sync.lock();
        let _section = self.enter();
        guard.clone()
    }

    /// Wait until at least `count` bytes were ingested or `timeout` elapsed.
    pub(crate) fn wait_for(&self, count: usize, timeout: Duration) -> Vec<u8> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.sync.lock();
        let mut section = self.enter();
        while guard.len() < count {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            // Round up so a sub-millisecond remainder is not an indefinite wait.
            let timeout_ms = remaining.as_millis().max(1) as i64;

            // The mutex is released while waiting.
            drop(section);
            self.sync.condvar_wait(&mut guard, timeout_ms);
            section = self.enter();
        }
        guard.clone()
    }

    /// Run `during` with the engine mutex held.
    ///
    /// Returns how many bytes had been ingested on entry and on exit.
    pub(crate) fn hold_while(&self, during: impl FnOnce()) -> (usize, usize) {
        let guard = self.sync.lock();
        let _section = self.enter();
        let before = guard.len();
        during();
        (before, guard.len())
    }

    /// Transmit `payload`, then wait for the peer to send anything back.
    ///
    /// Sends the way a DCL2 engine does: payloads over [`PAYLOAD_MAX_LEN`] are
    /// refused, each wait lasts [`ACK_TIMEOUT_MS`], and after
    /// [`MAX_FAILURE_COUNT`] silent waits the link counts as reset.
    pub(crate) fn send_message(&self, payload: &[u8]) -> EngineResult<()> {
        if payload.len() > PAYLOAD_MAX_LEN {
            return Err(EngineError::Failure);
        }

        let mut guard = self.sync.lock();
        let mut section = self.enter();
        let seen = guard.len();
        self.transmitter.transmit(payload)?;

        for _ in 0..MAX_FAILURE_COUNT {
            drop(section);
            self.sync.condvar_wait(&mut guard, i64::from(ACK_TIMEOUT_MS));
            section = self.enter();
            if guard.len() > seen {
                return Ok(());
            }
        }
        Err(EngineError::LinkReset)
    }

    pub(crate) fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }
}

impl<L: Link> Engine for RecordingEngine<L> {
    fn process_data(&self, data: &[u8]) -> EngineResult<()> {
        let mut guard = self.sync.lock();
        let _section = self.enter();

        if self.reject.is_some_and(|r| data.contains(&r)) {
            return Err(EngineError::NotConnected);
        }

        guard.extend_from_slice(data);
        self.sync.condvar_signal(&guard);
        if self.echo {
            self.transmitter.transmit(data)?;
        }
        Ok(())
    }
}

/// Poll `done` until it holds or `timeout` elapses.
pub(crate) fn eventually(timeout: Duration, done: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    done()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LoopbackLink;

    fn engine() -> RecordingEngine<LoopbackLink> {
        RecordingEngine::standalone(Arc::new(LoopbackLink::pair().0))
    }

    #[test]
    fn test_nested_sections_flag_overlap() {
        let engine = engine();

        let outer = engine.enter();
        let inner = engine.enter();
        drop(inner);
        drop(outer);

        assert!(engine.overlapped());
    }

    #[test]
    fn test_sequential_sections_do_not_flag_overlap() {
        let engine = engine();

        engine.process_data(&[0x01]).unwrap();
        assert_eq!(engine.received(), vec![0x01]);
        assert_eq!(engine.hold_while(|| ()), (1, 1));
        assert_eq!(engine.wait_for(1, Duration::from_millis(10)), vec![0x01]);

        assert!(!engine.overlapped());
    }
}
