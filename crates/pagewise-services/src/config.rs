//! Controller configuration stored as TOML in the user config directory

use std::path::{Path, PathBuf};

use pagewise_core::{DEFAULT_SHADOW_SIZE, SettleConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid configuration: {key} must be > 0 when {enabled_by} > 0")]
    ZeroSize {
        key: &'static str,
        enabled_by: &'static str,
    },
}

/// Window sizes of every bank in a controller model. A size of zero
/// disables the bank: it is built unbound and answers with empty values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub num_tracks: usize,
    pub num_scenes: usize,
    pub num_sends: usize,
    pub num_devices: usize,
    pub num_layers: usize,
    pub num_drum_pads: usize,
    pub num_params: usize,
    pub num_parameter_pages: usize,
    pub num_markers: usize,
    pub marker_shadow_size: usize,
    pub num_user_pages: usize,
    pub num_user_params_per_page: usize,
    pub settle: SettleConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            num_tracks: 8,
            num_scenes: 8,
            num_sends: 2,
            num_devices: 8,
            num_layers: 8,
            num_drum_pads: 16,
            num_params: 8,
            num_parameter_pages: 8,
            num_markers: 8,
            marker_shadow_size: DEFAULT_SHADOW_SIZE,
            num_user_pages: 4,
            num_user_params_per_page: 8,
            settle: SettleConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Markers need a shadow to search and user pages need parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_markers > 0 && self.marker_shadow_size == 0 {
            return Err(ConfigError::ZeroSize {
                key: "marker_shadow_size",
                enabled_by: "num_markers",
            });
        }
        if self.num_user_pages > 0 && self.num_user_params_per_page == 0 {
            return Err(ConfigError::ZeroSize {
                key: "num_user_params_per_page",
                enabled_by: "num_user_pages",
            });
        }
        Ok(())
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pagewise")
        .join("config.toml")
}

/// Load from the default location, falling back to defaults when the file
/// is missing or unusable
pub fn load_config() -> ControllerConfig {
    let path = config_path();
    if !path.exists() {
        return ControllerConfig::default();
    }
    match load_config_from(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring config file");
            ControllerConfig::default()
        }
    }
}

pub fn load_config_from(path: &Path) -> Result<ControllerConfig, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    let config: ControllerConfig = toml::from_str(&text)?;
    config.validate()?;
    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

pub fn save_config(config: &ControllerConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_path())
}

pub fn save_config_to(config: &ControllerConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(config)?;
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pagewise_core::SettlePolicy;

    use super::*;

    #[test]
    fn test_missing_keys_take_defaults() {
        let config: ControllerConfig = toml::from_str(
            r#"
            num_tracks = 4
            num_sends = 0

            [settle]
            policy = "coalesce"
            "#,
        )
        .unwrap();
        assert_eq!(config.num_tracks, 4);
        assert_eq!(config.num_sends, 0);
        assert_eq!(config.num_scenes, 8);
        assert_eq!(config.marker_shadow_size, 100);
        assert_eq!(config.settle.delay_ms, 75);
        assert_eq!(config.settle.policy, SettlePolicy::Coalesce);
    }

    #[test]
    fn test_save_then_load_from_path() {
        let dir = std::env::temp_dir().join(format!("pagewise-config-{}", std::process::id()));
        let path = dir.join("nested").join("config.toml");
        let config = ControllerConfig {
            num_markers: 0,
            ..Default::default()
        };
        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), config);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_invalid_and_unreadable_files() {
        let dir = std::env::temp_dir().join(format!("pagewise-invalid-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        std::fs::write(&path, "marker_shadow_size = 0").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(ConfigError::ZeroSize { key: "marker_shadow_size", .. })
        ));
        std::fs::write(&path, "num_tracks = \"eight\"").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
        assert!(matches!(
            load_config_from(&dir.join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_zero_size_error_names_the_key() {
        let markers = ControllerConfig {
            marker_shadow_size: 0,
            ..Default::default()
        };
        assert_eq!(
            markers.validate().unwrap_err().to_string(),
            "Invalid configuration: marker_shadow_size must be > 0 when num_markers > 0"
        );

        let user = ControllerConfig {
            num_user_params_per_page: 0,
            ..Default::default()
        };
        let message = user.validate().unwrap_err().to_string();
        assert!(message.contains("num_user_params_per_page"), "{message}");
        assert!(message.contains("num_user_pages"), "{message}");

        let disabled = ControllerConfig {
            num_user_pages: 0,
            num_user_params_per_page: 0,
            num_markers: 0,
            marker_shadow_size: 0,
            ..Default::default()
        };
        assert!(disabled.validate().is_ok());
    }
}
