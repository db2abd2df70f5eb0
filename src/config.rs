use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analytics::AnalyticsSettings;
use crate::error::LiftError;
use crate::goals::GoalSettings;
use crate::logging::LogConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Analyzer tuning
    #[serde(default)]
    pub analytics: AnalyticsSettings,

    /// Goal lifecycle windows
    #[serde(default)]
    pub goals: GoalSettings,

    #[serde(default)]
    pub logging: LogConfig,

    /// Dataset location
    #[serde(default)]
    pub data: DataSettings,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    /// JSON dataset used when `--data` is not given
    pub dataset_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            analytics: AnalyticsSettings::default(),
            goals: GoalSettings::default(),
            logging: LogConfig::default(),
            data: DataSettings::default(),
        }
    }
}

impl Default for DataSettings {
    fn default() -> Self {
        DataSettings {
            dataset_path: AppConfig::config_dir().join("dataset.json"),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".liftrs")
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Using default configuration ({}): {:#}", config_path.display(), e);
                Self::default()
            }
        }
    }

    /// Reject settings the analyzers and goal manager cannot work with
    pub fn validate(&self) -> std::result::Result<(), LiftError> {
        if self.analytics.epley_coefficient <= Decimal::ZERO {
            return Err(LiftError::Configuration(
                "analytics.epley_coefficient must be positive".to_string(),
            ));
        }
        if self.goals.max_horizon_months == 0 {
            return Err(LiftError::Configuration(
                "goals.max_horizon_months must be at least 1".to_string(),
            ));
        }
        if self.goals.deadline_window_days < 0 {
            return Err(LiftError::Configuration(
                "goals.deadline_window_days must not be negative".to_string(),
            ));
        }
        if self.goals.notification_suppression_hours < 0 {
            return Err(LiftError::Configuration(
                "goals.notification_suppression_hours must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::VolumeSetFilter;
    use crate::logging::LogLevel;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.metadata.version, deserialized.metadata.version);
        assert_eq!(deserialized.analytics.epley_coefficient, dec!(0.0333));
        assert_eq!(deserialized.goals, GoalSettings::default());
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = AppConfig::default();
        original.analytics.volume_set_filter = VolumeSetFilter::CompletedOnly;
        original.goals.deadline_window_days = 3;
        original.logging.level = LogLevel::Debug;

        original.save_to_file(&config_path).unwrap();
        let loaded = AppConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded.analytics.volume_set_filter, VolumeSetFilter::CompletedOnly);
        assert_eq!(loaded.goals.deadline_window_days, 3);
        assert_eq!(loaded.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[metadata]
version = "1.0"
created_at = "2024-01-01T00:00:00Z"
updated_at = "2024-01-01T00:00:00Z"
"#,
        )
        .unwrap();

        let loaded = AppConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.goals.max_horizon_months, 18);
        assert_eq!(loaded.analytics.volume_set_filter, VolumeSetFilter::AllSets);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut config = AppConfig::default();
        config.analytics.epley_coefficient = dec!(0);
        assert!(matches!(config.validate(), Err(LiftError::Configuration(_))));

        let mut config = AppConfig::default();
        config.goals.max_horizon_months = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let temp_dir = tempdir().unwrap();
        assert!(AppConfig::load_from_file(temp_dir.path().join("absent.toml")).is_err());
    }
}
