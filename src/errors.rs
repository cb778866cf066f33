// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BankwatchError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid cooldown value {0} (expected >= 0, -1 for prompt, -2 for manual)")]
    InvalidCooldown(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BankwatchError>;
