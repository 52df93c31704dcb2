//! Frame boundary detection.
//!
//! The detector is a two-state machine over the shared accumulator:
//!
//! - **Idle**: nothing buffered, wait for the next bit.
//! - **Accumulating**: bits buffered, wait until the silence deadline or the
//!   next bit, whichever comes first. Every bit pushes the deadline back.
//!
//! When the deadline passes with no new bit, the buffer is snapshotted and
//! cleared, the frame is decoded and accepted results are handed to the
//! callbacks.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use wiegand_core::{DecodeOutcome, Rejection};

use crate::{
    Result,
    accumulator::{FrameAccumulator, Settle, Snapshot},
    callback::Callbacks,
};

/// Boundary detector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Empty buffer, no timer.
    Idle,

    /// Bits present, frame closes at `deadline` unless another bit arrives.
    Accumulating { deadline: Instant },
}

/// Cuts frames out of the accumulator on inter-bit silence.
#[derive(Debug)]
pub struct BoundaryDetector {
    accumulator: Arc<FrameAccumulator>,
    timeout: Duration,
    callbacks: Callbacks,
}

impl BoundaryDetector {
    pub fn new(accumulator: Arc<FrameAccumulator>, timeout: Duration, callbacks: Callbacks) -> Self {
        Self {
            accumulator,
            timeout,
            callbacks,
        }
    }

    /// Run until `token` is cancelled.
    ///
    /// No callback is dispatched once cancellation has been observed.
    pub async fn run(self, token: CancellationToken) -> Result<()> {
        debug!(timeout_ms = self.timeout.as_millis() as u64, "Boundary detector started");
        let mut state = DetectorState::Idle;

        loop {
            match state {
                DetectorState::Idle => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = self.accumulator.notified() => {}
                    }
                }
                DetectorState::Accumulating { deadline } => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep_until(deadline) => {}
                        _ = self.accumulator.notified() => {}
                    }
                }
            }

            if token.is_cancelled() {
                break;
            }
            state = self.step(Instant::now());
        }

        debug!("Boundary detector stopped");
        Ok(())
    }

    /// Check the buffer at `now` and handle a completed frame.
    ///
    /// Callable outside a runtime; callbacks for a completed frame then run
    /// on the calling thread before this returns.
    pub fn step(&self, now: Instant) -> DetectorState {
        match self.accumulator.take_if_settled(now, self.timeout) {
            Settle::Idle => DetectorState::Idle,
            Settle::Pending { deadline } => DetectorState::Accumulating { deadline },
            Settle::Ready(snapshot) => {
                self.handle(snapshot);
                DetectorState::Idle
            }
        }
    }

    fn handle(&self, snapshot: Snapshot) {
        debug!(bits = snapshot.len(), "Frame closed");

        match snapshot.decode(self.accumulator.max_bits()) {
            Ok(DecodeOutcome::Accepted(result)) => {
                info!(
                    format = %result.format,
                    site_code = %result.site_code,
                    tag = %result.tag,
                    "Tag decoded"
                );
                self.callbacks.deliver(result);
            }
            Ok(DecodeOutcome::Rejected(rejection @ Rejection::UnrecognizedLength { .. })) => {
                debug!(%rejection, "Frame dropped");
            }
            Ok(DecodeOutcome::Rejected(rejection)) => {
                warn!(%rejection, "Frame dropped");
            }
            Err(e) if e.is_contract_violation() => {
                error!(error = %e, "Internal decode error");
            }
            Err(e) => {
                warn!(error = %e, "Frame decode failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use wiegand_core::{DecodedResult, LineRole, layout::H10301};

    const TIMEOUT: Duration = Duration::from_millis(100);

    type Harness = (
        BoundaryDetector,
        Arc<FrameAccumulator>,
        mpsc::UnboundedReceiver<DecodedResult>,
    );

    fn detector(max_bits: usize) -> Harness {
        let accumulator = Arc::new(FrameAccumulator::new(max_bits));
        let (tx, rx) = mpsc::unbounded_channel();
        let callbacks = Callbacks {
            on_tag: None,
            on_result: Some(Arc::new(move |result| {
                let _ = tx.send(result);
            })),
        };
        let detector = BoundaryDetector::new(Arc::clone(&accumulator), TIMEOUT, callbacks);
        (detector, accumulator, rx)
    }

    fn feed(accumulator: &FrameAccumulator, bits: &[u8], start: Instant) -> Instant {
        let mut at = start;
        for &bit in bits {
            accumulator.push(LineRole::for_bit(bit == 1), at);
            at += Duration::from_millis(2);
        }
        at
    }

    #[tokio::test]
    async fn test_step_state_transitions() {
        let (detector, accumulator, mut rx) = detector(26);
        let start = Instant::now();
        assert_eq!(detector.step(start), DetectorState::Idle);

        let end = feed(&accumulator, &H10301.encode(2, 21845).unwrap(), start);
        let state = detector.step(end);
        assert!(matches!(state, DetectorState::Accumulating { .. }));

        assert_eq!(detector.step(end + TIMEOUT), DetectorState::Idle);
        assert!(accumulator.is_empty());

        let result = rx.recv().await.unwrap();
        assert_eq!(result.tag, "21845");
        assert_eq!(result.site_code, "2");
    }

    #[tokio::test]
    async fn test_bad_parity_produces_no_callback() {
        let (detector, accumulator, mut rx) = detector(26);
        let mut frame = H10301.encode(2, 21845).unwrap();
        frame[5] ^= 1;

        let end = feed(&accumulator, &frame, Instant::now());
        assert_eq!(detector.step(end + TIMEOUT), DetectorState::Idle);
        assert!(accumulator.is_empty());

        drop(detector);
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_step_outside_runtime_delivers_inline() {
        let (detector, accumulator, mut rx) = detector(26);
        let end = feed(&accumulator, &H10301.encode(3, 999).unwrap(), Instant::now());

        assert_eq!(detector.step(end + TIMEOUT), DetectorState::Idle);

        let result = rx.try_recv().unwrap();
        assert_eq!(result.tag, "999");
        assert_eq!(result.site_code, "3");
    }

    #[tokio::test]
    async fn test_contract_violation_is_dropped() {
        let (detector, accumulator, mut rx) = detector(26);
        let snapshot = Snapshot::Frame(vec![2; 26]);
        assert!(
            snapshot
                .clone()
                .decode(26)
                .is_err_and(|e| e.is_contract_violation())
        );

        detector.handle(snapshot);
        assert!(accumulator.is_empty());

        drop(detector);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_closes_frame_after_silence() {
        let (detector, accumulator, mut rx) = detector(26);
        let token = CancellationToken::new();
        let task = tokio::spawn(detector.run(token.clone()));

        for &bit in &H10301.encode(7, 4242).unwrap() {
            accumulator.push(LineRole::for_bit(bit == 1), Instant::now());
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let result = rx.recv().await.unwrap();
        assert_eq!(result.tag, "4242");
        assert!(accumulator.is_empty());

        token.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_exits_on_cancel_while_accumulating() {
        let (detector, accumulator, _rx) = detector(26);
        let token = CancellationToken::new();
        let task = tokio::spawn(detector.run(token.clone()));

        accumulator.push(LineRole::D1, Instant::now());
        tokio::task::yield_now().await;
        token.cancel();

        task.await.unwrap().unwrap();
        assert_eq!(accumulator.len(), 1);
    }
}
