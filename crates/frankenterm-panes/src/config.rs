#![forbid(unsafe_code)]

//! Pane tuning loaded from TOML or JSON.
//!
//! ```toml
//! # panes.toml
//! scroll_speed = 150
//! gesture_idle_ms = 150
//! platform = "mac_os"
//! ```
//!
//! Every field defaults to the built-in constant, so
//! `PaneConfig::default()` behaves exactly like the hardcoded values.

use core::time::Duration;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::input::Platform;
use crate::paste::PASTE_DEDUP_WINDOW;
use crate::resize_guard::{ALT_EXIT_GRACE, RESIZE_GRACE};
use crate::scroll::{DEFAULT_SCROLL_SPEED, GESTURE_IDLE_TIMEOUT, MAX_SCROLL_SPEED, MIN_SCROLL_SPEED};

/// Longest grace or de-dup window a config may request.
const MAX_WINDOW_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaneConfig {
    /// Scroll speed percentage; clamped to 50–250 when applied.
    pub scroll_speed: f64,
    /// Quiet period that ends a wheel gesture.
    pub gesture_idle_ms: u64,
    /// Identical pastes closer than this are dropped.
    pub paste_dedup_ms: u64,
    /// Non-cursor click window after a resize epoch.
    pub resize_grace_ms: u64,
    /// Non-cursor click window after leaving the alternate screen.
    pub alt_exit_grace_ms: u64,
    /// Platform used for paste-chord resolution.
    pub platform: Platform,
}

impl Default for PaneConfig {
    fn default() -> Self {
        Self {
            scroll_speed: DEFAULT_SCROLL_SPEED,
            gesture_idle_ms: GESTURE_IDLE_TIMEOUT.as_millis() as u64,
            paste_dedup_ms: PASTE_DEDUP_WINDOW.as_millis() as u64,
            resize_grace_ms: RESIZE_GRACE.as_millis() as u64,
            alt_exit_grace_ms: ALT_EXIT_GRACE.as_millis() as u64,
            platform: Platform::current(),
        }
    }
}

impl PaneConfig {
    /// Parse TOML without validating.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Parse JSON without validating.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Read, parse and validate a TOML file.
    pub fn load_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)?.validated()
    }

    /// Read, parse and validate a JSON file.
    pub fn load_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)?.validated()
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// An empty list means the config is valid. Out-of-range scroll speeds
    /// are reported even though they would be clamped on use.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.scroll_speed.is_finite()
            || !(MIN_SCROLL_SPEED..=MAX_SCROLL_SPEED).contains(&self.scroll_speed)
        {
            errors.push(format!(
                "scroll_speed must be in [{MIN_SCROLL_SPEED}, {MAX_SCROLL_SPEED}], got {}",
                self.scroll_speed
            ));
        }
        if self.gesture_idle_ms == 0 {
            errors.push("gesture_idle_ms must be > 0".into());
        }
        if self.paste_dedup_ms == 0 || self.paste_dedup_ms > MAX_WINDOW_MS {
            errors.push(format!(
                "paste_dedup_ms must be in [1, {MAX_WINDOW_MS}], got {}",
                self.paste_dedup_ms
            ));
        }
        if self.resize_grace_ms > MAX_WINDOW_MS {
            errors.push(format!(
                "resize_grace_ms must be <= {MAX_WINDOW_MS}, got {}",
                self.resize_grace_ms
            ));
        }
        if self.alt_exit_grace_ms > MAX_WINDOW_MS {
            errors.push(format!(
                "alt_exit_grace_ms must be <= {MAX_WINDOW_MS}, got {}",
                self.alt_exit_grace_ms
            ));
        }

        errors
    }

    fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    #[must_use]
    pub fn gesture_idle(&self) -> Duration {
        Duration::from_millis(self.gesture_idle_ms)
    }

    #[must_use]
    pub fn paste_dedup_window(&self) -> Duration {
        Duration::from_millis(self.paste_dedup_ms)
    }

    #[must_use]
    pub fn resize_grace(&self) -> Duration {
        Duration::from_millis(self.resize_grace_ms)
    }

    #[must_use]
    pub fn alt_exit_grace(&self) -> Duration {
        Duration::from_millis(self.alt_exit_grace_ms)
    }
}

/// Errors that can occur when loading a [`PaneConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_constants() {
        let cfg = PaneConfig::default();
        assert_eq!(cfg.scroll_speed, 100.0);
        assert_eq!(cfg.gesture_idle(), Duration::from_millis(150));
        assert_eq!(cfg.paste_dedup_window(), Duration::from_millis(100));
        assert_eq!(cfg.resize_grace(), Duration::from_millis(100));
        assert_eq!(cfg.alt_exit_grace(), Duration::from_millis(500));
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = PaneConfig::from_toml_str("scroll_speed = 200\nplatform = \"other\"\n")
            .expect("parse");
        assert_eq!(cfg.scroll_speed, 200.0);
        assert_eq!(cfg.platform, Platform::Other);
        assert_eq!(cfg.gesture_idle_ms, 150);
    }

    #[test]
    fn json_round_trip() {
        let cfg = PaneConfig {
            scroll_speed: 75.0,
            platform: Platform::MacOs,
            ..PaneConfig::default()
        };
        let json = serde_json::to_string(&cfg).expect("serialize");
        assert_eq!(PaneConfig::from_json_str(&json).expect("parse"), cfg);
    }

    #[test]
    fn validation_reports_every_problem() {
        let cfg = PaneConfig {
            scroll_speed: 400.0,
            gesture_idle_ms: 0,
            ..PaneConfig::default()
        };
        let errors = cfg.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("scroll_speed"));
    }

    #[test]
    fn load_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "scroll_speed = 10").expect("write");
        let err = PaneConfig::load_toml_file(file.path()).expect_err("invalid");
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().starts_with("validation errors"));
    }

    #[test]
    fn paste_dedup_window_must_be_positive_and_bounded() {
        for bad in [0, 5_001] {
            let cfg = PaneConfig {
                paste_dedup_ms: bad,
                ..PaneConfig::default()
            };
            let errors = cfg.validate();
            assert_eq!(errors.len(), 1, "{bad}: {errors:?}");
            assert!(errors[0].contains("paste_dedup_ms"));
        }
        let err = PaneConfig::from_toml_str("paste_dedup_ms = 0")
            .expect("parse")
            .validated()
            .expect_err("zero window");
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn bad_toml_is_parse_error() {
        let err = PaneConfig::from_toml_str("scroll_speed = [").expect_err("bad toml");
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = PaneConfig::load_json_file("/definitely/not/here.json").expect_err("missing");
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
