pub mod pinmon;
pub mod read;
pub mod simulate;

use anyhow::Result;
use wiegand_hardware::AnyLineProvider;

/// Open the GPIO header of the board we are running on.
#[cfg(feature = "hardware-rpi")]
pub fn hardware_provider() -> Result<AnyLineProvider> {
    use anyhow::Context;

    let provider = wiegand_hardware::rpi::RpiProvider::new().context("Failed to open GPIO")?;
    Ok(AnyLineProvider::Rpi(provider))
}

#[cfg(not(feature = "hardware-rpi"))]
pub fn hardware_provider() -> Result<AnyLineProvider> {
    anyhow::bail!(
        "no GPIO backend compiled in; rebuild with `--features hardware-rpi` \
         or use `wiegand simulate`"
    )
}
