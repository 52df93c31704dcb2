//! Raspberry Pi GPIO backend.
//!
//! Lines are named `GPIO<n>` after their BCM number (0-27). Edge waits use
//! rppal's synchronous interrupts, run on the blocking pool.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rppal::gpio::{self, Gpio, InputPin, Trigger};
use tracing::debug;

use crate::{
    HardwareError, Result,
    devices::AnyInputLine,
    traits::{InputLine, LineProvider},
    types::{Bias, Edge, Level, LineInfo},
};

/// Highest BCM pin on the 40-pin header.
const MAX_BCM_PIN: u8 = 27;

fn parse_bcm(name: &str) -> Option<u8> {
    let number = name.trim().strip_prefix("GPIO")?;
    number.parse().ok().filter(|&pin| pin <= MAX_BCM_PIN)
}

fn map_get_error(name: &str, error: gpio::Error) -> HardwareError {
    match error {
        gpio::Error::PinUsed(_) => HardwareError::line_busy(name),
        gpio::Error::PinNotAvailable(_) => HardwareError::line_not_found(name),
        other => HardwareError::configuration(name, other.to_string()),
    }
}

fn trigger_for(edge: Edge) -> Trigger {
    match edge {
        Edge::Falling => Trigger::FallingEdge,
        Edge::Rising => Trigger::RisingEdge,
        Edge::Both => Trigger::Both,
    }
}

/// Provider for the Raspberry Pi GPIO header.
#[derive(Debug)]
pub struct RpiProvider {
    gpio: Gpio,
}

impl RpiProvider {
    /// Open the GPIO peripheral.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Gpio`] if `/dev/gpiomem` cannot be opened or
    /// the board is not recognised.
    pub fn new() -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HardwareError::gpio(e.to_string()))?;
        Ok(Self { gpio })
    }
}

impl LineProvider for RpiProvider {
    async fn claim(&self, name: &str, bias: Bias, edge: Edge) -> Result<AnyInputLine> {
        let bcm = parse_bcm(name).ok_or_else(|| HardwareError::line_not_found(name))?;
        let pin = self.gpio.get(bcm).map_err(|e| map_get_error(name, e))?;

        let mut pin = match bias {
            Bias::PullUp => pin.into_input_pullup(),
            Bias::PullDown => pin.into_input_pulldown(),
            Bias::Floating => pin.into_input(),
        };
        pin.set_interrupt(trigger_for(edge), None)
            .map_err(|e| HardwareError::configuration(name, e.to_string()))?;

        debug!(line = name, bcm, ?bias, ?edge, "Claimed GPIO line");

        Ok(AnyInputLine::Rpi(RpiLine {
            name: name.to_string(),
            pin: Arc::new(Mutex::new(pin)),
        }))
    }

    async fn lines(&self) -> Result<Vec<LineInfo>> {
        let mut lines = Vec::with_capacity(usize::from(MAX_BCM_PIN) + 1);
        for bcm in 0..=MAX_BCM_PIN {
            let info = LineInfo::new(format!("GPIO{bcm}"));
            // A pin held elsewhere is still listed, just without a function
            let info = match self.gpio.get(bcm) {
                Ok(pin) => info.with_function(format!("{:?}", pin.mode()).to_uppercase()),
                Err(_) => info,
            };
            lines.push(info);
        }
        Ok(lines)
    }
}

/// A claimed GPIO input pin with interrupts enabled.
#[derive(Debug)]
pub struct RpiLine {
    name: String,
    pin: Arc<Mutex<InputPin>>,
}

impl InputLine for RpiLine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn wait_for_edge(&mut self, timeout: Duration) -> Result<bool> {
        let pin = Arc::clone(&self.pin);
        let name = self.name.clone();

        tokio::task::spawn_blocking(move || {
            let mut pin = pin.lock().unwrap_or_else(PoisonError::into_inner);
            pin.poll_interrupt(false, Some(timeout))
                .map(|event| event.is_some())
                .map_err(|e| HardwareError::gpio(format!("{name}: {e}")))
        })
        .await
        .map_err(|_| HardwareError::disconnected(&self.name))?
    }

    async fn read(&self) -> Result<Level> {
        let pin = self.pin.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(match pin.read() {
            gpio::Level::Low => Level::Low,
            gpio::Level::High => Level::High,
        })
    }
}
