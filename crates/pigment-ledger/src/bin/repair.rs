//! # pigment-repair
//!
//! Recomputes every stock unit's refund aggregate from its sales and prints
//! a JSON report.
//!
//! ```text
//! pigment-repair [CONFIG_FILE]
//!
//!   RUST_LOG=debug          verbose logging
//!   PIGMENT_DB_PATH=...     database override
//! ```
//!
//! Exits with status 2 when inconsistencies were found.

use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

use pigment_ledger::{Ledger, LedgerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = LedgerConfig::load(config_path)?;
    info!(path = %config.database.path.display(), "Starting repair pass");

    let ledger = Ledger::open(&config).await?;
    let report = ledger.reconcile_all().await?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.inconsistencies.is_empty() {
        std::process::exit(2);
    }
    Ok(())
}

/// Log filter from `RUST_LOG`, defaulting to debug for pigment crates.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pigment=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
