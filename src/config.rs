//! Gallery configuration.
//!
//! All fields are optional in config files; anything left out takes the
//! defaults of [`GalleryConfig::default`]. Durations are written in
//! milliseconds and the margin as CSS text:
//!
//! ```toml
//! margin = "0.5vmin"
//! min_height_ratio_window = 0.25
//! fade_in_ms = 1000
//! poll_interval_ms = 100
//! max_poll_attempts = 50
//! auto_adjust = true
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Length;

/// Window ratio applied when neither height ratio is configured.
pub const DEFAULT_WINDOW_RATIO: f32 = 0.25;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Margin applied to the container and every item.
    pub margin: Length,
    /// Row height as a fraction of the viewport height.
    pub min_height_ratio_window: Option<f32>,
    /// Row height as a fraction of the device display height.
    pub min_height_ratio_screen: Option<f32>,
    #[serde(rename = "fade_in_ms", with = "millis")]
    pub fade_in_duration: Duration,
    #[serde(rename = "poll_interval_ms", with = "millis")]
    pub poll_interval: Duration,
    /// Give up resolving an image after this many polls. `None` polls forever.
    pub max_poll_attempts: Option<u32>,
    /// Re-layout this gallery when the viewport is resized.
    pub auto_adjust: bool,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            margin: Length::vmin(0.5),
            min_height_ratio_window: None,
            min_height_ratio_screen: None,
            fade_in_duration: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(100),
            max_poll_attempts: None,
            auto_adjust: true,
        }
    }
}

impl GalleryConfig {
    pub fn with_margin(mut self, margin: Length) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_window_ratio(mut self, ratio: f32) -> Self {
        self.min_height_ratio_window = Some(ratio);
        self
    }

    pub fn with_screen_ratio(mut self, ratio: f32) -> Self {
        self.min_height_ratio_screen = Some(ratio);
        self
    }

    pub fn with_fade_in(mut self, duration: Duration) -> Self {
        self.fade_in_duration = duration;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = Some(attempts);
        self
    }

    pub fn with_auto_adjust(mut self, auto_adjust: bool) -> Self {
        self.auto_adjust = auto_adjust;
        self
    }

    /// The ratio pair actually in force: with neither ratio set, the window
    /// ratio falls back to [`DEFAULT_WINDOW_RATIO`].
    pub fn effective_ratios(&self) -> (Option<f32>, Option<f32>) {
        match (self.min_height_ratio_window, self.min_height_ratio_screen) {
            (None, None) => (Some(DEFAULT_WINDOW_RATIO), None),
            pair => pair,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, ratio) in [
            ("min_height_ratio_window", self.min_height_ratio_window),
            ("min_height_ratio_screen", self.min_height_ratio_screen),
        ] {
            if let Some(r) = ratio {
                if !r.is_finite() || r <= 0.0 {
                    return Err(ConfigError::Validation(format!(
                        "{name} must be a positive number"
                    )));
                }
            }
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Validation(
                "poll_interval_ms must be non-zero".into(),
            ));
        }
        if self.max_poll_attempts == Some(0) {
            return Err(ConfigError::Validation(
                "max_poll_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GalleryConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = GalleryConfig::default();
        assert_eq!(config.margin, Length::vmin(0.5));
        assert_eq!(config.fade_in_duration, Duration::from_millis(1000));
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert!(config.auto_adjust);
        assert_eq!(config.max_poll_attempts, None);
        assert_eq!(config.effective_ratios(), (Some(0.25), None));
    }

    #[test]
    fn test_effective_ratios_keep_explicit_values() {
        let screen_only = GalleryConfig::default().with_screen_ratio(0.3);
        assert_eq!(screen_only.effective_ratios(), (None, Some(0.3)));

        let both = GalleryConfig::default()
            .with_window_ratio(0.2)
            .with_screen_ratio(0.3);
        assert_eq!(both.effective_ratios(), (Some(0.2), Some(0.3)));
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = GalleryConfig::from_toml_str(
            r#"
            margin = "4px"
            min_height_ratio_screen = 0.2
            poll_interval_ms = 50
            auto_adjust = false
            "#,
        )
        .unwrap();
        assert_eq!(config.margin, Length::px(4.0));
        assert_eq!(config.min_height_ratio_screen, Some(0.2));
        assert_eq!(config.min_height_ratio_window, None);
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.fade_in_duration, Duration::from_millis(1000));
        assert!(!config.auto_adjust);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = GalleryConfig::from_toml_str("min_height_ratio = 0.25");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_bad_margin_rejected() {
        let result = GalleryConfig::from_toml_str(r#"margin = "wide""#);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_validation() {
        let negative = GalleryConfig::default().with_window_ratio(-0.1);
        assert!(matches!(negative.validate(), Err(ConfigError::Validation(_))));

        let zero_poll = GalleryConfig::default().with_poll_interval(Duration::ZERO);
        assert!(matches!(zero_poll.validate(), Err(ConfigError::Validation(_))));

        let zero_attempts = GalleryConfig::default().with_max_poll_attempts(0);
        assert!(zero_attempts.validate().is_err());

        assert!(GalleryConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let config = GalleryConfig::load(&dir.path().join("flexgal.toml")).unwrap();
        assert_eq!(config, GalleryConfig::default());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flexgal.toml");
        fs::write(&path, "fade_in_ms = 250\nmax_poll_attempts = 20\n").unwrap();
        let config = GalleryConfig::load(&path).unwrap();
        assert_eq!(config.fade_in_duration, Duration::from_millis(250));
        assert_eq!(config.max_poll_attempts, Some(20));
    }
}
