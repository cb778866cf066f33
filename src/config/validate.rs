// src/config/validate.rs

use crate::config::model::ConfigFile;
use crate::errors::{BankwatchError, Result};
use crate::refresh::RefreshMode;

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - `[rebuild].cmd` is non-empty
/// - `[rebuild].cache_file` is non-empty
/// - `[refresh].cooldown_seconds` is >= 0 or one of the -1/-2 sentinels
///
/// It does **not**:
/// - verify that the source path exists (an unwatchable path only disables
///   monitoring at runtime, it is not a startup error)
/// - try to parse or resolve the rebuild command
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_rebuild_section(cfg)?;
    ensure_cooldown_range(cfg)?;
    Ok(())
}

fn ensure_rebuild_section(cfg: &ConfigFile) -> Result<()> {
    if cfg.rebuild.cmd.trim().is_empty() {
        return Err(BankwatchError::Config(
            "[rebuild].cmd must be a non-empty command".to_string(),
        ));
    }

    if cfg.rebuild.cache_file.trim().is_empty() {
        return Err(BankwatchError::Config(
            "[rebuild].cache_file must be a non-empty path".to_string(),
        ));
    }

    Ok(())
}

fn ensure_cooldown_range(cfg: &ConfigFile) -> Result<()> {
    // Parsing into a mode performs the range check (>= -2).
    RefreshMode::from_cooldown_seconds(cfg.refresh.cooldown_seconds)?;
    Ok(())
}
