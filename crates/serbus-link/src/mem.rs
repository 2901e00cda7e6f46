use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

use crate::error::{LinkError, Result};
use crate::traits::SerialLink;

/// Default per-direction buffer capacity in bytes.
pub const DEFAULT_CAPACITY: usize = 4096;

/// One direction of a loopback pair: a bounded byte queue.
struct Pipe {
    state: Mutex<PipeState>,
    readable: Condvar,
    writable: Condvar,
}

struct PipeState {
    buf: VecDeque<u8>,
    capacity: usize,
    closed: bool,
}

impl Pipe {
    fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(PipeState {
                buf: VecDeque::with_capacity(capacity),
                capacity,
                closed: false,
            }),
            readable: Condvar::new(),
            writable: Condvar::new(),
        })
    }

    fn close(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.closed = true;
        }
        self.readable.notify_all();
        self.writable.notify_all();
    }
}

/// An in-memory serial link endpoint.
///
/// [`MemoryLink::pair`] creates two connected endpoints backed by a pair of
/// bounded byte queues. Writing into a full queue blocks until the far end
/// drains it; reading from an empty queue blocks until the far end writes.
/// Dropping either endpoint closes both directions, failing the peer's
/// pending and future operations with [`LinkError::Closed`].
///
/// This is the workhorse transport for tests and in-process demos.
pub struct MemoryLink {
    rx: Arc<Pipe>,
    tx: Arc<Pipe>,
}

impl MemoryLink {
    /// Create a connected pair with the default buffer capacity.
    pub fn pair() -> (Self, Self) {
        Self::pair_with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a connected pair with an explicit per-direction capacity.
    pub fn pair_with_capacity(capacity: usize) -> (Self, Self) {
        let a_to_b = Pipe::new(capacity);
        let b_to_a = Pipe::new(capacity);

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
}

impl SerialLink for MemoryLink {
    fn bytes_available(&mut self) -> Result<usize> {
        let state = self.rx.state.lock().map_err(|_| LinkError::Closed)?;
        Ok(state.buf.len())
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut state = self.rx.state.lock().map_err(|_| LinkError::Closed)?;
        loop {
            if let Some(byte) = state.buf.pop_front() {
                self.rx.writable.notify_one();
                return Ok(byte);
            }
            if state.closed {
                return Err(LinkError::Closed);
            }
            state = self
                .rx
                .readable
                .wait(state)
                .map_err(|_| LinkError::Closed)?;
        }
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        let mut state = self.tx.state.lock().map_err(|_| LinkError::Closed)?;
        loop {
            if state.closed {
                return Err(LinkError::Closed);
            }
            if state.buf.len() < state.capacity {
                state.buf.push_back(byte);
                self.tx.readable.notify_one();
                return Ok(());
            }
            state = self
                .tx
                .writable
                .wait(state)
                .map_err(|_| LinkError::Closed)?;
        }
    }
}

impl Drop for MemoryLink {
    fn drop(&mut self) {
        self.rx.close();
        self.tx.close();
    }
}

impl std::fmt::Debug for MemoryLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLink").finish_non_exhaustive()
    }
}
