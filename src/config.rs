//! Configuration management module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::raster::{Rgb, Theme};
use crate::scope::{Acquirer, BAUD_RATE, TimeoutPolicy};

/// Configuration load result.
#[derive(Debug)]
pub enum ConfigLoadResult {
    /// Config loaded successfully.
    Loaded(AppConfig),
    /// Config file missing; defaults apply.
    Missing,
    /// Config file exists but invalid.
    Invalid(ConfigError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Serial line settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Device path of the scope's USB-serial adapter (default: /dev/ttyUSB0).
    #[serde(default = "default_device")]
    pub device: String,
    /// Line rate (default: 1200).
    #[serde(default = "default_baud")]
    pub baud: u32,
}

fn default_device() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_baud() -> u32 {
    BAUD_RATE
}

/// Acquisition timing and retry policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Per-wait receive timeout in milliseconds (default: 200).
    #[serde(default = "default_rx_timeout_ms")]
    pub rx_timeout_ms: u64,
    /// Interval between capture requests in milliseconds (default: 250).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// What to do when the line stalls mid-frame (default: strict).
    #[serde(default)]
    pub timeout_policy: TimeoutPolicy,
    /// Re-sends allowed per capture under the `rearm` policy (default: 3).
    #[serde(default = "default_max_rearms")]
    pub max_rearms: u32,
}

fn default_rx_timeout_ms() -> u64 {
    200
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_max_rearms() -> u32 {
    3
}

/// Rendering preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub theme: Theme,
    /// Colour the raster starts out with before the first decode.
    #[serde(default = "default_background")]
    pub background: Rgb,
}

fn default_background() -> Rgb {
    Rgb::new(0x40, 0x40, 0x40)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Where captures are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,
    /// Also keep the undecoded `.bin` dump next to each image.
    #[serde(default)]
    pub keep_raw: bool,
}

impl AppConfig {
    /// Get config file path (same directory as executable).
    pub fn default_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scopeview.toml")
    }

    /// Attempt to load config with detailed result.
    pub fn try_load(path: &Path) -> ConfigLoadResult {
        if !path.exists() {
            return ConfigLoadResult::Missing;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match Self::parse(&content) {
                Ok(config) => ConfigLoadResult::Loaded(config),
                Err(e) => ConfigLoadResult::Invalid(e),
            },
            Err(e) => ConfigLoadResult::Invalid(ConfigError::Read(e)),
        }
    }

    /// Parse and validate TOML content.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serial.device.trim().is_empty() {
            return Err(ConfigError::Validation("Serial device cannot be empty".to_string()));
        }
        if self.serial.baud == 0 {
            return Err(ConfigError::Validation("Baud rate must be greater than 0".to_string()));
        }
        if !(10..=5000).contains(&self.capture.rx_timeout_ms) {
            return Err(ConfigError::Validation(
                "RX timeout must be between 10 and 5000 ms".to_string(),
            ));
        }
        if !(50..=10_000).contains(&self.capture.poll_interval_ms) {
            return Err(ConfigError::Validation(
                "Poll interval must be between 50 and 10000 ms".to_string(),
            ));
        }
        if self.capture.timeout_policy == TimeoutPolicy::Rearm && self.capture.max_rearms == 0 {
            return Err(ConfigError::Validation(
                "Rearm policy needs max_rearms of at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl CaptureConfig {
    pub fn rx_timeout(&self) -> Duration {
        Duration::from_millis(self.rx_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Build the acquirer these settings describe.
    pub fn acquirer(&self) -> Acquirer {
        Acquirer::new(self.rx_timeout()).with_policy(self.timeout_policy, self.max_rearms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            baud: default_baud(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            rx_timeout_ms: default_rx_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            timeout_policy: TimeoutPolicy::Strict,
            max_rearms: default_max_rearms(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            background: default_background(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            keep_raw: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.serial.baud, 1200);
        assert_eq!(config.capture.timeout_policy, TimeoutPolicy::Strict);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = AppConfig::parse(
            r#"
            [serial]
            device = "/dev/ttyUSB3"

            [display]
            theme = "light"
            "#,
        )
        .unwrap();
        assert_eq!(config.serial.device, "/dev/ttyUSB3");
        assert_eq!(config.serial.baud, 1200);
        assert_eq!(config.display.theme, Theme::Light);
        assert_eq!(config.capture.poll_interval_ms, 250);
    }

    #[test]
    fn test_serial_section_without_device() {
        let config = AppConfig::parse("[serial]\nbaud = 9600\n").unwrap();
        assert_eq!(config.serial.device, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud, 9600);
    }

    #[test]
    fn test_output_section_without_directory() {
        let config = AppConfig::parse("[output]\nkeep_raw = true\n").unwrap();
        assert_eq!(config.output.directory, PathBuf::from("."));
        assert!(config.output.keep_raw);
    }

    #[test]
    fn test_rearm_policy_parses() {
        let config = AppConfig::parse(
            r#"
            [capture]
            timeout_policy = "rearm"
            max_rearms = 5
            "#,
        )
        .unwrap();
        let acquirer = config.capture.acquirer();
        assert_eq!(acquirer.policy(), TimeoutPolicy::Rearm);
        assert_eq!(acquirer.rx_timeout(), Duration::from_millis(200));
    }

    #[test]
    fn test_validation_empty_device() {
        let mut config = AppConfig::default();
        config.serial.device = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_timing_bounds() {
        let mut config = AppConfig::default();

        config.capture.rx_timeout_ms = 5;
        assert!(config.validate().is_err());

        config.capture.rx_timeout_ms = 200;
        config.capture.poll_interval_ms = 20;
        assert!(config.validate().is_err());

        config.capture.poll_interval_ms = 400;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rearm_needs_budget() {
        let mut config = AppConfig::default();
        config.capture.timeout_policy = TimeoutPolicy::Rearm;
        config.capture.max_rearms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_theme_rejected() {
        let result = AppConfig::parse("[display]\ntheme = \"neon\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir().join(format!("scopeview-config-{}.toml", std::process::id()));
        let mut config = AppConfig::default();
        config.display.theme = Theme::Mono;
        config.output.keep_raw = true;

        config.save(&path).unwrap();
        let loaded = AppConfig::try_load(&path);
        std::fs::remove_file(&path).ok();

        match loaded {
            ConfigLoadResult::Loaded(loaded) => assert_eq!(loaded, config),
            other => panic!("unexpected load result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let result = AppConfig::try_load(Path::new("/nonexistent/scopeview.toml"));
        assert!(matches!(result, ConfigLoadResult::Missing));
    }
}
