mod config;
pub mod database;

pub use config::{Config, DayConfig};
pub use database::{Database, DayStats, TotalStats};

use std::path::PathBuf;

/// Returns `~/.config/timewell[-dev]/` based on TIMEWELL_ENV.
///
/// Set TIMEWELL_ENV=dev to use a separate development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TIMEWELL_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("timewell-dev")
    } else {
        base_dir.join("timewell")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
