//! Configuration loading for the playback engine.
//!
//! All user-tunable settings are centralized here and loaded from
//! `conf/config.toml` if present. Any missing or invalid entries fall back
//! to sensible defaults so a host can always start a session.

use crate::corpus::ScriptId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Lowest accepted pace in tokens per minute.
pub const MIN_PACE_WPM: u32 = 20;
/// Highest accepted pace in tokens per minute.
pub const MAX_PACE_WPM: u32 = 400;

/// High-level engine configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default = "default_primary_script")]
    pub primary_script: ScriptId,
    #[serde(default)]
    pub secondary_script: Option<ScriptId>,
    #[serde(default = "default_pace_wpm")]
    pub pace_wpm: u32,
    #[serde(default = "default_base_ms_per_token")]
    pub base_ms_per_token: u64,
    #[serde(default = "default_hold_watchdog_ms")]
    pub hold_watchdog_ms: u64,
    #[serde(default = "default_media_dir")]
    pub media_dir: String,
    #[serde(default)]
    pub media_base_url: Option<String>,
    #[serde(default = "default_prefetch_depth")]
    pub prefetch_depth: usize,
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            primary_script: default_primary_script(),
            secondary_script: None,
            pace_wpm: default_pace_wpm(),
            base_ms_per_token: default_base_ms_per_token(),
            hold_watchdog_ms: default_hold_watchdog_ms(),
            media_dir: default_media_dir(),
            media_base_url: None,
            prefetch_depth: default_prefetch_depth(),
            log_level: default_log_level(),
        }
    }
}

/// Load configuration from `path`, falling back to defaults on any error.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&contents) {
        Ok(cfg) => {
            debug!("Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err}");
            AppConfig::default()
        }
    }
}

fn default_primary_script() -> ScriptId {
    ScriptId::Gurmukhi
}

fn default_pace_wpm() -> u32 {
    90
}

fn default_base_ms_per_token() -> u64 {
    280
}

fn default_hold_watchdog_ms() -> u64 {
    450
}

fn default_media_dir() -> String {
    String::from(".cache/media")
}

fn default_prefetch_depth() -> usize {
    3
}

fn default_log_level() -> LogLevel {
    LogLevel::Debug
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_config_with_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            pace_wpm = 120
            secondary_script = "roman"
            "#,
        )
        .expect("partial config should parse");
        assert_eq!(cfg.pace_wpm, 120);
        assert_eq!(cfg.secondary_script, Some(ScriptId::Roman));
        assert_eq!(cfg.hold_watchdog_ms, 450);
        assert_eq!(cfg.primary_script, ScriptId::Gurmukhi);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = load_config(Path::new("conf/definitely-not-here.toml"));
        assert_eq!(cfg.pace_wpm, default_pace_wpm());
        assert!(cfg.secondary_script.is_none());
    }
}
