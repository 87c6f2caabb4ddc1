mod config;
mod store;

pub use config::{AudioConfig, Config, TimerConfig};
pub use store::{ExerciseDraft, Preferences, RoutineDraft, RoutineStore, StorageData};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/rounds[-dev]/` based on ROUNDS_ENV.
///
/// Set ROUNDS_ENV=dev to use a separate development data directory.
///
/// # Errors
/// Returns an error if the config directory cannot be created.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("ROUNDS_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("rounds-dev")
    } else {
        base_dir.join("rounds")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
