mod config;
pub mod database;

pub use config::{Config, LifeConfig, NotificationsConfig};
pub use database::Database;

use std::path::PathBuf;

use crate::error::Result;

/// Returns the data directory, creating it if needed.
///
/// `FINITE_DATA_DIR` wins when set. Otherwise `~/.config/finite`, or
/// `~/.config/finite-dev` with `FINITE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("FINITE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FINITE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("finite-dev")
            } else {
                base_dir.join("finite")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
