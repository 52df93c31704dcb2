use std::fs;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use wiegand_hardware::reader::{Reader, ReaderConfig, ReaderSettings};

/// Merge `--reader` pairs, the config file and the command-line overrides.
pub fn collect_settings(
    pairs: &[String],
    config: Option<&str>,
    timeout_ms: Option<u64>,
    max_bits: Option<usize>,
) -> Result<Vec<ReaderSettings>> {
    let mut settings = Vec::new();

    if let Some(path) = config {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let from_file: Vec<ReaderSettings> = serde_json::from_str(&text)
            .with_context(|| format!("Invalid reader settings in {}", path))?;
        settings.extend(from_file);
    }

    for pair in pairs {
        settings.push(parse_pair(pair)?);
    }

    if settings.is_empty() {
        bail!("no readers configured; pass --reader D0:D1 or --config FILE");
    }

    for entry in &mut settings {
        if let Some(timeout_ms) = timeout_ms {
            entry.timeout_ms = timeout_ms;
        }
        if let Some(max_bits) = max_bits {
            entry.max_bits = max_bits;
        }
    }
    Ok(settings)
}

fn parse_pair(pair: &str) -> Result<ReaderSettings> {
    let Some((d0, d1)) = pair.split_once(':') else {
        bail!("reader must be given as D0:D1, got {:?}", pair);
    };
    Ok(ReaderSettings::new(d0.trim(), d1.trim()))
}

pub async fn execute(settings: Vec<ReaderSettings>, json: bool) -> Result<()> {
    let provider = super::hardware_provider()?;
    let shutdown = CancellationToken::new();
    let mut readers = Vec::with_capacity(settings.len());

    for entry in &settings {
        let label = format!("{}:{}", entry.d0, entry.d1);
        let config = ReaderConfig::from_settings(entry)
            .on_result(move |result| {
                if json {
                    match serde_json::to_string(&result) {
                        Ok(line) => println!("{}", line),
                        Err(e) => warn!("Failed to serialize result: {}", e),
                    }
                } else {
                    println!("[{}] {}", label, result);
                }
            })
            .build();

        let reader = Reader::start_with_parent(&provider, config, &shutdown)
            .await
            .with_context(|| format!("Failed to start reader on {}:{}", entry.d0, entry.d1))?;
        readers.push(reader);
    }

    info!("{} reader(s) running, press Ctrl-C to stop", readers.len());
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    shutdown.cancel();
    for reader in readers {
        let report = reader.shutdown().await;
        if !report.is_clean() {
            warn!(
                "Reader stopped with {} failed and {} panicked task(s)",
                report.failed, report.panicked
            );
        }
    }

    // Let in-flight callbacks print before exiting
    tokio::time::sleep(Duration::from_millis(100)).await;
    println!("Shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_settings_from_pairs() {
        let settings = collect_settings(
            &["GPIO4:GPIO17".to_string(), " GPIO5 : GPIO6 ".to_string()],
            None,
            Some(50),
            None,
        )
        .unwrap();

        assert_eq!(settings.len(), 2);
        assert_eq!(settings[1].d0, "GPIO5");
        assert_eq!(settings[1].d1, "GPIO6");
        assert!(settings.iter().all(|s| s.timeout_ms == 50 && s.max_bits == 26));
    }

    #[test]
    fn test_collect_settings_requires_a_reader() {
        assert!(collect_settings(&[], None, None, None).is_err());
        assert!(collect_settings(&["GPIO4".to_string()], None, None, None).is_err());
    }
}
