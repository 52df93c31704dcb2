//! Pin monitor diagnostic.
//!
//! Watches a set of lines for transitions in both directions and reports
//! the level after each one. Used to check reader wiring before starting a
//! [`Reader`](crate::reader::Reader).
//!
//! # Examples
//!
//! ```
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//! use wiegand_hardware::mock::MockProvider;
//! use wiegand_hardware::pinmon::{self, PinEvent};
//! use wiegand_hardware::types::Level;
//!
//! #[tokio::main]
//! async fn main() -> wiegand_hardware::Result<()> {
//!     let provider = MockProvider::new();
//!     let _handle = provider.add_line("GPIO4");
//!     let names = pinmon::select_lines(&provider, &[]).await?;
//!
//!     let (tx, mut rx) = mpsc::channel(16);
//!     let token = CancellationToken::new();
//!     token.cancel();
//!     pinmon::run(&provider, &names, token, tx).await?;
//!
//!     let event = rx.recv().await;
//!     assert_eq!(
//!         event,
//!         Some(PinEvent::Initial { line: "GPIO4".into(), level: Level::Low })
//!     );
//!     Ok(())
//! }
//! ```

use std::fmt;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use wiegand_core::constants::{
    ALTERNATE_FUNCTION_MARKERS, PIN_MONITOR_RECHECK_INTERVAL, RESERVED_LINES,
};

use crate::{
    HardwareError, Result,
    devices::AnyInputLine,
    traits::{InputLine, LineProvider},
    types::{Bias, Edge, Level, LineInfo},
};

/// Name prefixes of header pins that are not GPIO lines.
const NON_GPIO_PREFIXES: [&str; 3] = ["3.3V", "5V", "GND"];

/// Observation reported by the pin monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinEvent {
    /// Level read right after the line was configured.
    Initial { line: String, level: Level },

    /// Level after a transition.
    Edge { line: String, level: Level },
}

impl PinEvent {
    pub fn line(&self) -> &str {
        match self {
            Self::Initial { line, .. } | Self::Edge { line, .. } => line,
        }
    }

    pub fn level(&self) -> Level {
        match self {
            Self::Initial { level, .. } | Self::Edge { level, .. } => *level,
        }
    }
}

impl fmt::Display for PinEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial { line, level } => write!(f, "Pin {} initial state: {}", line, level),
            Self::Edge { line, level } => write!(f, "Pin {} edge detected, level: {}", line, level),
        }
    }
}

/// Why an enumerated line is left out of the default selection.
fn skip_reason(info: &LineInfo) -> Option<&'static str> {
    if RESERVED_LINES.contains(&info.name.as_str()) {
        return Some("reserved");
    }
    if NON_GPIO_PREFIXES
        .iter()
        .any(|prefix| info.name.starts_with(prefix))
    {
        return Some("not a GPIO line");
    }

    let function = info.function.as_deref()?;
    let is_alternate = function.starts_with("ALT")
        || ALTERNATE_FUNCTION_MARKERS
            .iter()
            .any(|marker| function.contains(marker));
    is_alternate.then_some("alternate function")
}

/// Pick the lines to monitor.
///
/// Requested names are kept if the provider knows them; unknown names are
/// logged and skipped. With no names, every line that is not reserved and
/// not set to an alternate function is selected.
///
/// # Errors
///
/// Returns [`HardwareError::InvalidConfig`] if nothing is left to monitor.
pub async fn select_lines<P: LineProvider>(
    provider: &P,
    requested: &[String],
) -> Result<Vec<String>> {
    let available = provider.lines().await?;

    let selected: Vec<String> = if requested.is_empty() {
        available
            .iter()
            .filter(|line| match skip_reason(line) {
                Some(reason) => {
                    info!(line = %line.name, function = line.function_name(), reason, "Skipping line");
                    false
                }
                None => true,
            })
            .map(|line| line.name.clone())
            .collect()
    } else {
        requested
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .filter_map(|name| match available.iter().find(|line| line.name == name) {
                Some(line) => {
                    info!(line = name, function = line.function_name(), "Selected line");
                    Some(name.to_string())
                }
                None => {
                    warn!(line = name, "Unknown line");
                    None
                }
            })
            .collect()
    };

    if selected.is_empty() {
        let message = if requested.is_empty() {
            "no free lines available"
        } else {
            "no valid lines to monitor"
        };
        return Err(HardwareError::invalid_config(message));
    }
    Ok(selected)
}

/// Monitor `names` until `token` is cancelled, sending events on `tx`.
///
/// Lines that cannot be claimed are logged and skipped. Returns once every
/// line task has stopped.
///
/// # Errors
///
/// Returns a configuration error if none of the lines could be claimed.
pub async fn run<P: LineProvider>(
    provider: &P,
    names: &[String],
    token: CancellationToken,
    tx: mpsc::Sender<PinEvent>,
) -> Result<()> {
    let mut lines = Vec::with_capacity(names.len());
    for name in names {
        match provider.claim(name, Bias::PullDown, Edge::Both).await {
            Ok(line) => lines.push(line),
            Err(e) => error!(line = %name, error = %e, "Failed to configure line"),
        }
    }

    if lines.is_empty() {
        return Err(HardwareError::invalid_config("no line could be configured"));
    }

    let mut tasks = JoinSet::new();
    for line in lines {
        tasks.spawn(watch(line, token.clone(), tx.clone()));
    }
    drop(tx);

    while let Some(result) = tasks.join_next().await {
        if let Ok(Err(e)) = result {
            error!(error = %e, "Line watch ended");
        }
    }
    debug!("Pin monitor stopped");
    Ok(())
}

async fn watch(
    mut line: AnyInputLine,
    token: CancellationToken,
    tx: mpsc::Sender<PinEvent>,
) -> Result<()> {
    let name = line.name().to_string();
    let level = line.read().await?;
    if tx
        .send(PinEvent::Initial {
            line: name.clone(),
            level,
        })
        .await
        .is_err()
    {
        return Ok(());
    }

    loop {
        let edge = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            edge = line.wait_for_edge(PIN_MONITOR_RECHECK_INTERVAL) => edge?,
        };
        if !edge {
            continue;
        }

        let level = line.read().await?;
        let event = PinEvent::Edge {
            line: name.clone(),
            level,
        };
        if tx.send(event).await.is_err() {
            return Ok(());
        }
    }
}
