//! livraisons - fleet delivery records
//!
//! A CLI tool that records truck deliveries and their expenses, bills
//! deliveries by tonnage and exports them to CSV.

mod cli;
mod commands;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use livraisons_app::Config;

/// Log filter: RUST_LOG, else the configured level, else "info".
/// `--verbose` forces debug.
fn init_tracing(verbose: bool, config_level: Option<&str>) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::try_new(config_level.unwrap_or("info"))
                .unwrap_or_else(|_| EnvFilter::new("info"))
        })
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(cli.verbose, config.log_level.as_deref());

    if let Err(e) = commands::execute(cli, config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
