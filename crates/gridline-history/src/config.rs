#![forbid(unsafe_code)]

//! Configuration for the undo/redo controller.
//!
//! # Defaults
//!
//! | Setting | Default | Range | Description |
//! |---------|---------|-------|-------------|
//! | `max_history` | 100 | 1-10000 | Undo entries kept before the oldest is evicted |
//! | `enabled` | true | - | Master switch for tracking and undo/redo |
//! | `debounce` | 300ms | 0-5000ms | Quiet period before an edit batch commits |
//!
//! # Environment Variables
//!
//! | Variable | Type | Default |
//! |----------|------|---------|
//! | `GRIDLINE_MAX_HISTORY` | usize | 100 |
//! | `GRIDLINE_UNDO_ENABLED` | bool | true |
//! | `GRIDLINE_EDIT_DEBOUNCE_MS` | u64 | 300 |
//!
//! # Loading from a file
//!
//! With the `config-file` feature:
//!
//! ```toml
//! # gridline.toml
//! max_history = 250
//! enabled = true
//! debounce_ms = 400
//! ```
//!
//! ```rust,ignore
//! let config = HistoryConfig::from_toml_file("gridline.toml")?;
//! ```

#[cfg(feature = "config-file")]
use std::path::Path;

#[cfg(feature = "config-file")]
use serde::{Deserialize, Serialize};

use gridline_core::keybinding::parse_flag;
use web_time::Duration;

use crate::batcher::DEFAULT_DEBOUNCE_MS;

/// Default number of undo entries kept.
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Smallest accepted `max_history`.
pub const MIN_MAX_HISTORY: usize = 1;

/// Largest accepted `max_history`.
pub const MAX_MAX_HISTORY: usize = 10_000;

/// Largest accepted debounce window.
pub const MAX_DEBOUNCE_MS: u64 = 5_000;

/// Errors raised while loading or checking a [`HistoryConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-file")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config-file")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// One or more values out of range.
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Settings for [`UndoRedo`](crate::UndoRedo).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum undo entries; the oldest is evicted beyond this.
    pub max_history: usize,
    /// When false, tracking and undo/redo are no-ops.
    pub enabled: bool,
    /// Quiet period before a cell-edit batch commits.
    pub debounce: Duration,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            enabled: true,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

impl HistoryConfig {
    /// Set the undo bound.
    #[must_use]
    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    /// Enable or disable the controller.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the debounce window.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Load config from environment variables. Values are clamped.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load config through an arbitrary variable lookup. Values are clamped;
    /// unparseable values keep the default.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = lookup("GRIDLINE_MAX_HISTORY")
            && let Ok(n) = val.trim().parse::<usize>()
        {
            config.max_history = n;
        }

        if let Some(val) = lookup("GRIDLINE_UNDO_ENABLED")
            && let Some(flag) = parse_flag(&val)
        {
            config.enabled = flag;
        }

        if let Some(val) = lookup("GRIDLINE_EDIT_DEBOUNCE_MS")
            && let Ok(ms) = val.trim().parse::<u64>()
        {
            config.debounce = Duration::from_millis(ms);
        }

        config.validated()
    }

    /// Clamp values to their accepted ranges.
    ///
    /// ```
    /// use gridline_history::HistoryConfig;
    ///
    /// let config = HistoryConfig::default().with_max_history(0).validated();
    /// assert_eq!(config.max_history, 1);
    /// ```
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.max_history = self.max_history.clamp(MIN_MAX_HISTORY, MAX_MAX_HISTORY);
        let debounce_ms = (self.debounce.as_millis() as u64).min(MAX_DEBOUNCE_MS);
        self.debounce = Duration::from_millis(debounce_ms);
        self
    }

    /// Describe every out-of-range value. Empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(MIN_MAX_HISTORY..=MAX_MAX_HISTORY).contains(&self.max_history) {
            errors.push(format!(
                "max_history must be in {MIN_MAX_HISTORY}..={MAX_MAX_HISTORY}, got {}",
                self.max_history
            ));
        }
        let debounce_ms = self.debounce.as_millis();
        if debounce_ms > u128::from(MAX_DEBOUNCE_MS) {
            errors.push(format!(
                "debounce must be at most {MAX_DEBOUNCE_MS}ms, got {debounce_ms}ms"
            ));
        }
        errors
    }

    /// Whether every value is within range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Return `self` if valid, otherwise every violation.
    pub fn checked(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(s)?;
        file.into_config().checked()
    }

    /// Read and parse a TOML file.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse a JSON document. Missing keys keep their defaults.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(s)?;
        file.into_config().checked()
    }

    /// Serialize to TOML.
    #[cfg(feature = "config-file")]
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(&ConfigFile::from(self))
    }
}

/// On-disk shape: the debounce is stored in milliseconds.
#[cfg(feature = "config-file")]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    max_history: Option<usize>,
    enabled: Option<bool>,
    debounce_ms: Option<u64>,
}

#[cfg(feature = "config-file")]
impl ConfigFile {
    fn into_config(self) -> HistoryConfig {
        let defaults = HistoryConfig::default();
        HistoryConfig {
            max_history: self.max_history.unwrap_or(defaults.max_history),
            enabled: self.enabled.unwrap_or(defaults.enabled),
            debounce: self
                .debounce_ms
                .map_or(defaults.debounce, Duration::from_millis),
        }
    }
}

#[cfg(feature = "config-file")]
impl From<&HistoryConfig> for ConfigFile {
    fn from(config: &HistoryConfig) -> Self {
        Self {
            max_history: Some(config.max_history),
            enabled: Some(config.enabled),
            debounce_ms: Some(config.debounce.as_millis() as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = HistoryConfig::default();
        assert_eq!(c.max_history, 100);
        assert!(c.enabled);
        assert_eq!(c.debounce, Duration::from_millis(300));
        assert!(c.is_valid());
    }

    #[test]
    fn builders() {
        let c = HistoryConfig::default()
            .with_max_history(5)
            .with_enabled(false)
            .with_debounce(Duration::from_millis(50));
        assert_eq!(c.max_history, 5);
        assert!(!c.enabled);
        assert_eq!(c.debounce.as_millis(), 50);
    }

    #[test]
    fn validated_clamps() {
        let c = HistoryConfig::default()
            .with_max_history(1_000_000)
            .with_debounce(Duration::from_secs(60))
            .validated();
        assert_eq!(c.max_history, MAX_MAX_HISTORY);
        assert_eq!(c.debounce.as_millis(), u128::from(MAX_DEBOUNCE_MS));
        assert!(c.is_valid());
    }

    #[test]
    fn checked_reports_every_violation() {
        let err = HistoryConfig::default()
            .with_max_history(0)
            .with_debounce(Duration::from_secs(10))
            .checked()
            .unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn validation_error_display() {
        let err = ConfigError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "validation errors: a; b");
    }

    #[test]
    fn from_vars_reads_and_clamps() {
        let c = HistoryConfig::from_vars(|k| match k {
            "GRIDLINE_MAX_HISTORY" => Some("20000".into()),
            "GRIDLINE_UNDO_ENABLED" => Some("false".into()),
            "GRIDLINE_EDIT_DEBOUNCE_MS" => Some(" 120 ".into()),
            _ => None,
        });
        assert_eq!(c.max_history, MAX_MAX_HISTORY);
        assert!(!c.enabled);
        assert_eq!(c.debounce.as_millis(), 120);
    }

    #[test]
    fn from_vars_ignores_garbage() {
        let c = HistoryConfig::from_vars(|_| Some("nope".into()));
        assert_eq!(c, HistoryConfig::default());
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn toml_partial_document_keeps_defaults() {
        let c = HistoryConfig::from_toml_str("debounce_ms = 450\n").unwrap();
        assert_eq!(c.debounce.as_millis(), 450);
        assert_eq!(c.max_history, DEFAULT_MAX_HISTORY);
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn toml_round_trip() {
        let c = HistoryConfig::default().with_max_history(42);
        let text = c.to_toml_string().unwrap();
        assert_eq!(HistoryConfig::from_toml_str(&text).unwrap(), c);
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn json_rejects_out_of_range() {
        let err = HistoryConfig::from_json_str(r#"{"max_history": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn unknown_keys_are_rejected() {
        let err = HistoryConfig::from_toml_str("max_histroy = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn missing_file_is_io_error() {
        let err = HistoryConfig::from_toml_file("/nonexistent/gridline.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
