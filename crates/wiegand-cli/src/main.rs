mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "wiegand")]
#[command(about = "Wiegand card reader tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read cards until interrupted
    Read {
        /// Reader line pair as D0:D1 (repeatable)
        #[arg(short, long = "reader", value_name = "D0:D1")]
        readers: Vec<String>,

        /// JSON file with an array of reader settings
        #[arg(short, long)]
        config: Option<String>,

        /// Inter-bit silence that closes a frame, in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Longest frame accepted, in bits
        #[arg(long)]
        max_bits: Option<usize>,

        /// Print each read as a JSON line
        #[arg(long)]
        json: bool,
    },

    /// Print level changes on GPIO lines until interrupted
    Pinmon {
        /// Comma-separated line names (default: all free lines)
        #[arg(short, long, value_delimiter = ',')]
        pins: Vec<String>,
    },

    /// Decode an encoded frame on mock lines
    Simulate {
        /// Frame length in bits (26, 34 or 37)
        #[arg(short, long, default_value = "26")]
        format: usize,

        /// Site code to encode
        #[arg(short, long, default_value = "0")]
        site: u64,

        /// Tag to encode
        #[arg(short, long)]
        tag: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Read {
            readers,
            config,
            timeout_ms,
            max_bits,
            json,
        } => {
            let settings = commands::read::collect_settings(
                &readers,
                config.as_deref(),
                timeout_ms,
                max_bits,
            )?;
            commands::read::execute(settings, json).await
        }

        Commands::Pinmon { pins } => commands::pinmon::execute(&pins).await,

        Commands::Simulate { format, site, tag } => {
            commands::simulate::execute(format, site, tag).await
        }
    }
}
