use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio::sync::mpsc;
use tracing::info;
use wiegand_core::FrameLayout;
use wiegand_hardware::mock::{MockProvider, transmit_frame};
use wiegand_hardware::reader::{Reader, ReaderConfig};

/// Pulse spacing used for the simulated burst.
const BIT_INTERVAL: Duration = Duration::from_millis(2);

pub async fn execute(format: usize, site: u64, tag: u64) -> Result<()> {
    let layout = FrameLayout::for_length(format)
        .ok_or_else(|| anyhow!("unsupported frame length {}; use 26, 34 or 37", format))?;
    let frame = layout
        .encode(site, tag)
        .with_context(|| format!("Cannot encode site {} tag {} as {}", site, tag, layout.name))?;

    let bits: String = frame.iter().map(|bit| char::from(b'0' + bit)).collect();
    info!("Encoded {} frame: {}", layout.name, bits);

    let provider = MockProvider::new();
    let d0 = provider.add_line("SIM_D0");
    let d1 = provider.add_line("SIM_D1");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let config = ReaderConfig::builder("SIM_D0", "SIM_D1")
        .on_result(move |result| {
            let _ = tx.send(result);
        })
        .max_bits(layout.bit_length)
        .build();
    let timeout = config.timeout;

    let reader = Reader::start(&provider, config).await?;
    transmit_frame(&d0, &d1, &frame, BIT_INTERVAL).await?;

    let result = tokio::time::timeout(timeout * 10, rx.recv())
        .await
        .context("No result decoded")?
        .context("Reader stopped before decoding")?;
    println!("{}", result);

    reader.shutdown().await;
    Ok(())
}
