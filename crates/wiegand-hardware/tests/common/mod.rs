//! Common test utilities for reader integration tests.
//!
//! Each test builds a [`Bench`]: a mock provider with a D0/D1 pair, a reader
//! started on it, and a channel that receives every decoded result.

#![allow(dead_code)]

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiegand_core::DecodedResult;
use wiegand_hardware::mock::{MockLineHandle, MockProvider, transmit_frame};
use wiegand_hardware::reader::{Reader, ReaderConfig};

/// Silence that closes a frame in these tests.
pub const FRAME_TIMEOUT: Duration = Duration::from_millis(40);

/// Gap between pulses inside a frame.
pub const BIT_INTERVAL: Duration = Duration::from_millis(1);

/// How long a test waits for a callback that should arrive.
pub const RECV_DEADLINE: Duration = Duration::from_secs(2);

pub const D0: &str = "GPIO4";
pub const D1: &str = "GPIO17";

/// A reader running on mock lines.
pub struct Bench {
    pub provider: MockProvider,
    pub d0: MockLineHandle,
    pub d1: MockLineHandle,
    pub reader: Reader,
    pub tags: mpsc::UnboundedReceiver<String>,
    pub results: mpsc::UnboundedReceiver<DecodedResult>,
}

impl Bench {
    pub async fn start(max_bits: usize) -> Self {
        Self::start_with(max_bits, None).await
    }

    pub async fn start_with(max_bits: usize, parent: Option<&CancellationToken>) -> Self {
        let provider = MockProvider::new();
        let d0 = provider.add_line(D0);
        let d1 = provider.add_line(D1);

        let (tag_tx, tags) = mpsc::unbounded_channel();
        let (result_tx, results) = mpsc::unbounded_channel();
        let config = ReaderConfig::builder(D0, D1)
            .on_tag(move |tag| {
                let _ = tag_tx.send(tag);
            })
            .on_result(move |result| {
                let _ = result_tx.send(result);
            })
            .timeout(FRAME_TIMEOUT)
            .max_bits(max_bits)
            .build();

        let reader = match parent {
            Some(parent) => Reader::start_with_parent(&provider, config, parent).await,
            None => Reader::start(&provider, config).await,
        }
        .expect("reader should start on mock lines");

        Self {
            provider,
            d0,
            d1,
            reader,
            tags,
            results,
        }
    }

    /// Pulse `bits` onto the lines.
    pub async fn send(&self, bits: &[u8]) {
        transmit_frame(&self.d0, &self.d1, bits, BIT_INTERVAL)
            .await
            .expect("mock lines should accept the frame");
    }

    /// Wait for the next tag callback.
    pub async fn next_tag(&mut self) -> String {
        tokio::time::timeout(RECV_DEADLINE, self.tags.recv())
            .await
            .expect("timed out waiting for a tag")
            .expect("tag channel closed")
    }

    pub async fn next_result(&mut self) -> DecodedResult {
        tokio::time::timeout(RECV_DEADLINE, self.results.recv())
            .await
            .expect("timed out waiting for a result")
            .expect("result channel closed")
    }

    /// Assert no tag arrives within a few frame timeouts.
    pub async fn assert_no_tag(&mut self) {
        let outcome = tokio::time::timeout(FRAME_TIMEOUT * 4, self.tags.recv()).await;
        assert!(outcome.is_err(), "unexpected tag: {:?}", outcome);
    }

    /// Wait until the reader's buffer has been cleared by a frame boundary.
    pub async fn wait_until_idle(&self) {
        tokio::time::sleep(FRAME_TIMEOUT * 3).await;
        assert_eq!(self.reader.pending_bits(), 0, "buffer should be empty");
    }
}
