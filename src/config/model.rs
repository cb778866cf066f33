// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [source]
/// path = "Banks"
///
/// [refresh]
/// cooldown_seconds = 5
/// show_prompt = false
///
/// [rebuild]
/// cmd = "fmodstudio --build project.fspro"
/// cache_file = ".bankwatch/cache"
/// ```
///
/// `[source]` and `[refresh]` are optional and have defaults; `[rebuild]` is
/// required because there is nothing useful to do without a rebuild command.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Watched source directory from `[source]`.
    #[serde(default)]
    pub source: SourceSection,

    /// Cooldown behaviour from `[refresh]`.
    #[serde(default)]
    pub refresh: RefreshSection,

    /// Rebuild command and cache artifact from `[rebuild]`.
    pub rebuild: RebuildSection,
}

/// `[source]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SourceSection {
    /// Directory to watch for bank source changes, relative to the config
    /// file's directory unless absolute.
    ///
    /// An empty path disables change monitoring (the integrity poll still
    /// runs).
    #[serde(default)]
    pub path: String,
}

/// `[refresh]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshSection {
    /// Seconds to wait after the last detected change before an automatic
    /// rebuild may run.
    ///
    /// Sentinels:
    /// - `-1`: prompt before every refresh.
    /// - `-2`: manual only; automatic rebuilds are disabled.
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: i64,

    /// If true, show the approval prompt on every detected change even when a
    /// plain cooldown is configured.
    #[serde(default)]
    pub show_prompt: bool,
}

fn default_cooldown_seconds() -> i64 {
    5
}

impl Default for RefreshSection {
    fn default() -> Self {
        Self {
            cooldown_seconds: default_cooldown_seconds(),
            show_prompt: false,
        }
    }
}

/// `[rebuild]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RebuildSection {
    /// Shell command that rebuilds the banks.
    pub cmd: String,

    /// Cache artifact the rebuild is expected to produce, relative to the
    /// config file's directory unless absolute.
    ///
    /// If this file is missing at a poll tick, a rebuild is triggered
    /// unconditionally (self-healing against manual deletion).
    pub cache_file: String,
}
