//! Shared frame buffer fed by the line monitors.
//!
//! Both monitors append to one [`FrameAccumulator`]; the boundary detector
//! polls it with [`FrameAccumulator::take_if_settled`] to cut frames on
//! inter-bit silence. Everything here is synchronous apart from the
//! [`Notify`] wake-up, so frame assembly can be driven deterministically
//! with explicit timestamps.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use tokio::time::Instant;
//! use wiegand_core::LineRole;
//! use wiegand_hardware::accumulator::{FrameAccumulator, Settle, Snapshot};
//!
//! let accumulator = FrameAccumulator::new(26);
//! let start = Instant::now();
//! accumulator.push(LineRole::D1, start);
//! accumulator.push(LineRole::D0, start + Duration::from_millis(2));
//!
//! let timeout = Duration::from_millis(100);
//! assert!(matches!(
//!     accumulator.take_if_settled(start + Duration::from_millis(50), timeout),
//!     Settle::Pending { .. }
//! ));
//! assert_eq!(
//!     accumulator.take_if_settled(start + Duration::from_millis(200), timeout),
//!     Settle::Ready(Snapshot::Frame(vec![1, 0]))
//! );
//! assert!(accumulator.is_empty());
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Notify, futures::Notified};
use tokio::time::Instant;
use wiegand_core::{DecodeOutcome, LineRole, Rejection};

/// Bits received since the last completed frame.
#[derive(Debug, Default)]
struct FrameBuffer {
    /// Stored bits, never longer than the configured maximum
    bits: Vec<u8>,

    /// Time of the most recent bit
    last_bit_at: Option<Instant>,

    /// Every bit seen, including those dropped past the maximum
    received: usize,
}

impl FrameBuffer {
    fn clear(&mut self) {
        self.bits.clear();
        self.last_bit_at = None;
        self.received = 0;
    }
}

/// Result of checking the buffer for a completed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settle {
    /// Nothing buffered.
    Idle,

    /// Bits are buffered but the line has not been quiet long enough.
    Pending { deadline: Instant },

    /// The buffer was quiet for the full timeout and has been cleared.
    Ready(Snapshot),
}

/// Buffer contents taken at a frame boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    /// A complete frame, oldest bit first.
    Frame(Vec<u8>),

    /// More bits arrived than the buffer may hold; contents discarded.
    Overflow { received: usize },
}

impl Snapshot {
    /// Decode the snapshot, turning an overflow into a rejection.
    ///
    /// # Errors
    ///
    /// Returns a contract violation from the decoder; see
    /// [`wiegand_core::decode`].
    pub fn decode(self, max_bits: usize) -> wiegand_core::Result<DecodeOutcome> {
        match self {
            Self::Frame(bits) => wiegand_core::decode(&bits),
            Self::Overflow { received } => Ok(DecodeOutcome::Rejected(Rejection::Overflow {
                received,
                max_bits,
            })),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Frame(bits) => bits.len(),
            Self::Overflow { received } => *received,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lock-guarded frame buffer plus the "new bit" wake-up.
#[derive(Debug)]
pub struct FrameAccumulator {
    buffer: Mutex<FrameBuffer>,
    notify: Notify,
    max_bits: usize,
}

impl FrameAccumulator {
    pub fn new(max_bits: usize) -> Self {
        Self {
            buffer: Mutex::new(FrameBuffer::default()),
            notify: Notify::new(),
            max_bits,
        }
    }

    /// Append the bit carried by `role`, observed at `at`.
    ///
    /// Bits past the maximum are counted but not stored; the frame is then
    /// reported as [`Snapshot::Overflow`] when it settles.
    pub fn push(&self, role: LineRole, at: Instant) {
        {
            let mut buffer = self.lock();
            if buffer.bits.len() < self.max_bits {
                buffer.bits.push(role.bit());
            }
            buffer.received += 1;
            buffer.last_bit_at = Some(at);
        }
        self.notify.notify_one();
    }

    /// Take the buffered frame if no bit has arrived for `timeout` as of `now`.
    pub fn take_if_settled(&self, now: Instant, timeout: Duration) -> Settle {
        let mut buffer = self.lock();

        let Some(last_bit_at) = buffer.last_bit_at else {
            return Settle::Idle;
        };

        let deadline = last_bit_at + timeout;
        if now < deadline {
            return Settle::Pending { deadline };
        }

        let snapshot = if buffer.received > self.max_bits {
            Snapshot::Overflow {
                received: buffer.received,
            }
        } else {
            Snapshot::Frame(std::mem::take(&mut buffer.bits))
        };
        buffer.clear();

        Settle::Ready(snapshot)
    }

    /// Wait for the next pushed bit.
    ///
    /// A push with no waiter leaves a permit, so a bit that lands between a
    /// settle check and this call is not missed.
    pub fn notified(&self) -> Notified<'_> {
        self.notify.notified()
    }

    pub fn len(&self) -> usize {
        self.lock().bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().received == 0
    }

    pub fn last_bit_at(&self) -> Option<Instant> {
        self.lock().last_bit_at
    }

    pub fn max_bits(&self) -> usize {
        self.max_bits
    }

    fn lock(&self) -> MutexGuard<'_, FrameBuffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
