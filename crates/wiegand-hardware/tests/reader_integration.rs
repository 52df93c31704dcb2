//! End-to-end reader tests over mock lines.
//!
//! Pulses are driven onto the mock D0/D1 lines in real time and the tests
//! observe what reaches the callbacks.

mod common;

use std::time::Duration;

use common::{Bench, D0, D1};
use tokio_util::sync::CancellationToken;
use wiegand_core::layout::{H10301, H10304, H10306};
use wiegand_hardware::HardwareError;
use wiegand_hardware::mock::MockProvider;
use wiegand_hardware::reader::{Reader, ReaderConfig};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_single_frame_delivers_tag_and_site_code() {
    let mut bench = Bench::start(26).await;

    bench.send(&H10301.encode(2, 21845).unwrap()).await;

    assert_eq!(bench.next_tag().await, "21845");
    let result = bench.next_result().await;
    assert_eq!(result.site_code, "2");
    assert_eq!(result.format, "H10301");

    bench.assert_no_tag().await;
    assert!(bench.reader.shutdown().await.is_clean());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_consecutive_frames_are_independent() {
    let mut bench = Bench::start(26).await;

    bench.send(&H10301.encode(12, 1001).unwrap()).await;
    assert_eq!(bench.next_tag().await, "1001");
    bench.wait_until_idle().await;

    bench.send(&H10301.encode(12, 1002).unwrap()).await;
    assert_eq!(bench.next_tag().await, "1002");
    bench.wait_until_idle().await;

    bench.assert_no_tag().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_overflow_is_discarded() {
    let mut bench = Bench::start(26).await;

    bench.send(&[1; 30]).await;
    bench.assert_no_tag().await;
    bench.wait_until_idle().await;

    // The reader keeps working after a discarded burst
    bench.send(&H10301.encode(1, 77).unwrap()).await;
    assert_eq!(bench.next_tag().await, "77");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bad_parity_is_dropped() {
    let mut bench = Bench::start(26).await;

    let mut frame = H10301.encode(2, 21845).unwrap();
    frame[20] ^= 1;
    bench.send(&frame).await;

    bench.assert_no_tag().await;
    bench.wait_until_idle().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unrecognized_length_is_dropped() {
    let mut bench = Bench::start(37).await;

    bench.send(&[0, 1, 1, 0, 1, 0, 0, 1, 1, 0]).await;

    bench.assert_no_tag().await;
    bench.wait_until_idle().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_longer_formats_with_raised_limit() {
    let mut bench = Bench::start(37).await;

    bench.send(&H10306.encode(4660, 65535).unwrap()).await;
    let result = bench.next_result().await;
    assert_eq!((result.bit_length, result.site_code.as_str()), (34, "4660"));
    bench.wait_until_idle().await;

    bench.send(&H10304.encode(7, 524287).unwrap()).await;
    let result = bench.next_result().await;
    assert_eq!((result.bit_length, result.tag.as_str()), (37, "524287"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_no_callbacks_after_close() {
    let mut bench = Bench::start(26).await;
    bench.reader.close();
    assert!(!bench.reader.is_running());

    // Monitors have stopped, so the lines may already be gone
    let frame = H10301.encode(2, 21845).unwrap();
    let _ = wiegand_hardware::mock::transmit_frame(&bench.d0, &bench.d1, &frame, Duration::ZERO).await;

    bench.assert_no_tag().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_parent_token_stops_every_reader() {
    let parent = CancellationToken::new();
    let mut first = Bench::start_with(26, Some(&parent)).await;
    let second = Bench::start_with(26, Some(&parent)).await;

    first.send(&H10301.encode(3, 30).unwrap()).await;
    assert_eq!(first.next_tag().await, "30");

    parent.cancel();
    assert!(!first.reader.is_running());
    assert!(!second.reader.is_running());

    let first_report = first.reader.shutdown().await;
    let second_report = second.reader.shutdown().await;
    assert_eq!(first_report.clean, 3);
    assert_eq!(second_report.clean, 3);
}

#[tokio::test]
async fn test_lost_line_is_reported_by_shutdown() {
    let bench = Bench::start(26).await;
    let Bench { reader, d0, .. } = bench;
    drop(d0);

    tokio::time::sleep(Duration::from_millis(50)).await;

    let report = reader.shutdown().await;
    assert_eq!(report.failed, 1);
    assert_eq!(report.clean, 2);
}

#[tokio::test]
async fn test_start_fails_fast_on_bad_config() {
    let provider = MockProvider::new();
    let _d0 = provider.add_line(D0);
    let _d1 = provider.add_unconfigurable_line(D1);

    let config = ReaderConfig::builder(D0, D1).on_tag(|_| {}).build();
    let error = Reader::start(&provider, config).await.unwrap_err();
    assert!(matches!(error, HardwareError::ConfigurationError { .. }));

    let config = ReaderConfig::builder(D0, "").on_tag(|_| {}).build();
    let error = Reader::start(&provider, config).await.unwrap_err();
    assert!(matches!(error, HardwareError::InvalidConfig { .. }));

    let config = ReaderConfig::builder(D0, D1).build();
    let error = Reader::start(&provider, config).await.unwrap_err();
    assert!(error.is_configuration());
}
