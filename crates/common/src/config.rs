//! Application configuration loaded from YAML.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides:
//! ```yaml
//! assets:
//!   root: ./assets
//! overlay:
//!   debug_interval_ms: 100
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Wingspan".into(),
        }
    }
}

/// Where model files live. Model paths are relative to `root`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub root: PathBuf,
    pub butterfly: String,
    pub city: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./assets"),
            butterfly: "animated_butterfly.glb".into(),
            city: "models/city.glb".into(),
        }
    }
}

impl AssetConfig {
    /// Resolve an asset path against the root. Leading slashes are treated
    /// as root-relative, the way a static web root would serve them.
    pub fn resolve(&self, asset: &str) -> PathBuf {
        self.root.join(asset.trim_start_matches('/'))
    }

    pub fn butterfly_path(&self) -> PathBuf {
        self.resolve(&self.butterfly)
    }

    pub fn city_path(&self) -> PathBuf {
        self.resolve(&self.city)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Sampling period of the debug position panel.
    pub debug_interval_ms: u64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            debug_interval_ms: 100,
        }
    }
}

impl OverlayConfig {
    pub fn debug_interval(&self) -> Duration {
        Duration::from_millis(self.debug_interval_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub assets: AssetConfig,
    pub overlay: OverlayConfig,
}

impl AppConfig {
    /// Parse a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid("window size must be non-zero".into()));
        }
        if self.overlay.debug_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "overlay.debug_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_shipped_assets() {
        let config = AppConfig::default();
        assert_eq!(config.assets.butterfly, "animated_butterfly.glb");
        assert_eq!(config.assets.city, "models/city.glb");
        assert_eq!(config.overlay.debug_interval(), Duration::from_millis(100));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml("window:\n  width: 800\n").unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.assets, AssetConfig::default());
    }

    #[test]
    fn resolve_strips_leading_slash() {
        let assets = AssetConfig {
            root: PathBuf::from("/srv/public"),
            ..AssetConfig::default()
        };
        assert_eq!(
            assets.resolve("/animated_butterfly.glb"),
            PathBuf::from("/srv/public/animated_butterfly.glb")
        );
        assert_eq!(assets.city_path(), PathBuf::from("/srv/public/models/city.glb"));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = AppConfig::from_yaml("overlay:\n  debug_interval_ms: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "assets:\n  root: ./public\n  city: town.glb").unwrap();
        let config = AppConfig::load(tmp.path()).unwrap();
        assert_eq!(config.assets.root, PathBuf::from("./public"));
        assert_eq!(config.assets.city, "town.glb");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AppConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn no_path_gives_defaults() {
        let config = AppConfig::load_or_default(None).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
