//! Wiegand reader lifecycle.
//!
//! A [`Reader`] claims the D0 and D1 lines, then runs three tasks under one
//! cancellation token: a [`LineMonitor`] per line and the
//! [`BoundaryDetector`]. Decoded tags are delivered through the callbacks in
//! [`ReaderConfig`].
//!
//! # Lifecycle
//!
//! 1. Build a [`ReaderConfig`] with [`ReaderConfig::builder`]
//! 2. Call [`Reader::start`] (or [`Reader::start_with_parent`] to share a
//!    shutdown signal between several readers)
//! 3. Call [`Reader::close`] to stop without waiting, or
//!    [`Reader::shutdown`] to stop and join the tasks
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use wiegand_hardware::mock::{MockProvider, transmit_frame};
//! use wiegand_hardware::reader::{Reader, ReaderConfig};
//!
//! #[tokio::main]
//! async fn main() -> wiegand_hardware::Result<()> {
//!     let provider = MockProvider::new();
//!     let d0 = provider.add_line("GPIO4");
//!     let d1 = provider.add_line("GPIO17");
//!
//!     let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//!     let config = ReaderConfig::builder("GPIO4", "GPIO17")
//!         .on_tag(move |tag| {
//!             let _ = tx.send(tag);
//!         })
//!         .timeout(Duration::from_millis(20))
//!         .build();
//!
//!     let reader = Reader::start(&provider, config).await?;
//!
//!     let frame = wiegand_core::layout::H10301.encode(2, 21845)?;
//!     transmit_frame(&d0, &d1, &frame, Duration::from_millis(1)).await?;
//!
//!     assert_eq!(rx.recv().await.as_deref(), Some("21845"));
//!     reader.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use wiegand_core::constants::{DEFAULT_FRAME_TIMEOUT, DEFAULT_MAX_BITS};
use wiegand_core::{DecodedResult, LineRole};

use crate::{
    HardwareError, Result,
    accumulator::FrameAccumulator,
    callback::{Callbacks, ResultCallback, TagCallback},
    detector::BoundaryDetector,
    monitor::LineMonitor,
    traits::LineProvider,
    types::{Bias, Edge},
};

/// Reader configuration.
///
/// Immutable once the reader has started. A zero timeout or bit limit falls
/// back to the defaults when validated.
#[derive(Clone)]
pub struct ReaderConfig {
    /// Name of the line carrying `0` bits.
    pub d0: String,

    /// Name of the line carrying `1` bits.
    pub d1: String,

    /// Inter-bit silence that closes a frame.
    pub timeout: Duration,

    /// Longest frame accepted before the buffer is discarded.
    pub max_bits: usize,

    pub callbacks: Callbacks,
}

impl ReaderConfig {
    pub fn builder(d0: impl Into<String>, d1: impl Into<String>) -> ReaderConfigBuilder {
        ReaderConfigBuilder {
            config: Self {
                d0: d0.into(),
                d1: d1.into(),
                timeout: DEFAULT_FRAME_TIMEOUT,
                max_bits: DEFAULT_MAX_BITS,
                callbacks: Callbacks::default(),
            },
        }
    }

    /// Check the configuration and apply defaults.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InvalidConfig`] if a line name is blank, both
    /// names are the same line, or no callback is set.
    pub fn validate(mut self) -> Result<Self> {
        self.d0 = self.d0.trim().to_string();
        self.d1 = self.d1.trim().to_string();

        if self.d0.is_empty() {
            return Err(HardwareError::invalid_config("D0 line must be specified"));
        }
        if self.d1.is_empty() {
            return Err(HardwareError::invalid_config("D1 line must be specified"));
        }
        if self.d0 == self.d1 {
            return Err(HardwareError::invalid_config(format!(
                "D0 and D1 must be different lines, both are {}",
                self.d0
            )));
        }
        if self.callbacks.is_empty() {
            return Err(HardwareError::invalid_config("a callback must be specified"));
        }

        if self.timeout.is_zero() {
            self.timeout = DEFAULT_FRAME_TIMEOUT;
        }
        if self.max_bits == 0 {
            self.max_bits = DEFAULT_MAX_BITS;
        }

        Ok(self)
    }

    /// Build a config from deserialized settings; callbacks still need setting.
    pub fn from_settings(settings: &ReaderSettings) -> ReaderConfigBuilder {
        Self::builder(&settings.d0, &settings.d1)
            .timeout(Duration::from_millis(settings.timeout_ms))
            .max_bits(settings.max_bits)
    }
}

impl fmt::Debug for ReaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderConfig")
            .field("d0", &self.d0)
            .field("d1", &self.d1)
            .field("timeout", &self.timeout)
            .field("max_bits", &self.max_bits)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

/// Builder for [`ReaderConfig`].
#[derive(Debug, Clone)]
pub struct ReaderConfigBuilder {
    config: ReaderConfig,
}

impl ReaderConfigBuilder {
    /// Called with the decimal tag of every accepted frame.
    pub fn on_tag(mut self, callback: impl Fn(String) + Send + Sync + 'static) -> Self {
        let callback: TagCallback = Arc::new(callback);
        self.config.callbacks.on_tag = Some(callback);
        self
    }

    /// Called with the full result, site code included.
    pub fn on_result(mut self, callback: impl Fn(DecodedResult) + Send + Sync + 'static) -> Self {
        let callback: ResultCallback = Arc::new(callback);
        self.config.callbacks.on_result = Some(callback);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn max_bits(mut self, max_bits: usize) -> Self {
        self.config.max_bits = max_bits;
        self
    }

    pub fn build(self) -> ReaderConfig {
        self.config
    }
}

/// Serializable reader settings, without callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderSettings {
    pub d0: String,
    pub d1: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_bits")]
    pub max_bits: usize,
}

impl ReaderSettings {
    pub fn new(d0: impl Into<String>, d1: impl Into<String>) -> Self {
        Self {
            d0: d0.into(),
            d1: d1.into(),
            timeout_ms: default_timeout_ms(),
            max_bits: default_max_bits(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_FRAME_TIMEOUT.as_millis() as u64
}

fn default_max_bits() -> usize {
    DEFAULT_MAX_BITS
}

/// How the reader's tasks ended during [`Reader::shutdown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Tasks that returned `Ok`.
    pub clean: usize,

    /// Tasks that returned an error before shutdown.
    pub failed: usize,

    /// Tasks that panicked.
    pub panicked: usize,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.panicked == 0
    }
}

/// Task termination classification for shutdown handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    Success,
    Error,
    Cancelled,
    Panic,
}

/// A running Wiegand reader.
///
/// Dropping the reader cancels its tasks without waiting for them.
pub struct Reader {
    config: ReaderConfig,
    token: CancellationToken,
    tasks: JoinSet<Result<()>>,
    accumulator: Arc<FrameAccumulator>,
}

impl Reader {
    /// Validate `config`, claim both lines and start the reader tasks.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the config is invalid or either line
    /// cannot be resolved or configured. Nothing is started in that case.
    pub async fn start<P: LineProvider>(provider: &P, config: ReaderConfig) -> Result<Self> {
        Self::start_with_token(provider, config, CancellationToken::new()).await
    }

    /// Like [`start`](Self::start), stopping when `parent` is cancelled.
    ///
    /// # Errors
    ///
    /// See [`start`](Self::start).
    pub async fn start_with_parent<P: LineProvider>(
        provider: &P,
        config: ReaderConfig,
        parent: &CancellationToken,
    ) -> Result<Self> {
        Self::start_with_token(provider, config, parent.child_token()).await
    }

    async fn start_with_token<P: LineProvider>(
        provider: &P,
        config: ReaderConfig,
        token: CancellationToken,
    ) -> Result<Self> {
        let config = config.validate()?;

        // Both lines are claimed before anything is spawned
        let d0 = provider.claim(&config.d0, Bias::PullUp, Edge::Falling).await?;
        let d1 = match provider.claim(&config.d1, Bias::PullUp, Edge::Falling).await {
            Ok(line) => line,
            Err(e) => {
                provider.release(d0);
                return Err(e);
            }
        };

        let accumulator = Arc::new(FrameAccumulator::new(config.max_bits));
        let mut tasks = JoinSet::new();

        tasks.spawn(LineMonitor::new(d0, LineRole::D0, Arc::clone(&accumulator)).run(token.clone()));
        tasks.spawn(LineMonitor::new(d1, LineRole::D1, Arc::clone(&accumulator)).run(token.clone()));
        tasks.spawn(
            BoundaryDetector::new(
                Arc::clone(&accumulator),
                config.timeout,
                config.callbacks.clone(),
            )
            .run(token.clone()),
        );

        info!(
            d0 = %config.d0,
            d1 = %config.d1,
            timeout_ms = config.timeout.as_millis() as u64,
            max_bits = config.max_bits,
            "Reader started"
        );

        Ok(Self {
            config,
            token,
            tasks,
            accumulator,
        })
    }

    /// Stop all reader tasks and return immediately.
    ///
    /// Callbacks already dispatched may still be running.
    pub fn close(&self) {
        if !self.token.is_cancelled() {
            info!(d0 = %self.config.d0, d1 = %self.config.d1, "Reader closing");
        }
        self.token.cancel();
    }

    /// Stop all reader tasks and wait for them to finish.
    pub async fn shutdown(mut self) -> ShutdownReport {
        self.close();

        let mut report = ShutdownReport::default();
        let mut tasks = std::mem::take(&mut self.tasks);

        while let Some(result) = tasks.join_next().await {
            match Self::classify_task_result(result) {
                TaskTermination::Success | TaskTermination::Cancelled => report.clean += 1,
                TaskTermination::Error => report.failed += 1,
                TaskTermination::Panic => report.panicked += 1,
            }
        }

        if !report.is_clean() {
            warn!(
                failed = report.failed,
                panicked = report.panicked,
                "Reader tasks ended abnormally"
            );
        }
        report
    }

    fn classify_task_result(
        result: std::result::Result<Result<()>, tokio::task::JoinError>,
    ) -> TaskTermination {
        match result {
            Ok(Ok(())) => TaskTermination::Success,
            Ok(Err(_)) => TaskTermination::Error,
            Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
            Err(_) => TaskTermination::Panic,
        }
    }

    /// True until the reader is closed or its parent token is cancelled.
    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Bits buffered for the frame currently being received.
    pub fn pending_bits(&self) -> usize {
        self.accumulator.len()
    }
}

impl fmt::Debug for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl Drop for Reader {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
