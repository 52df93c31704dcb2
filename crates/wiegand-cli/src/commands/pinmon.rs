use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiegand_hardware::pinmon;

pub async fn execute(pins: &[String]) -> Result<()> {
    let provider = super::hardware_provider()?;
    let names = pinmon::select_lines(&provider, pins).await?;
    println!("Monitoring pins: {}", names.join(", "));

    let token = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel(64);

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("{}", event);
        }
    });

    let monitor = pinmon::run(&provider, &names, token.clone(), tx);
    tokio::pin!(monitor);

    tokio::select! {
        result = &mut monitor => result?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            token.cancel();
            monitor.await?;
        }
    }

    printer.await.context("Event printer failed")?;
    println!("Shutting down");
    Ok(())
}
