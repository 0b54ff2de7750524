use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use ambit_core::Resolution;

/// Configuration for ambit.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (AMBIT_* prefix)
/// 3. Config file (~/.config/ambit/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the JSON track catalog.
    ///
    /// Can be set via:
    /// - CLI: --catalog /path/to/catalog.json
    /// - ENV: AMBIT_CATALOG_PATH
    /// - Config: catalog_path = "/path/to/catalog.json"
    /// - Default: ~/.local/share/ambit/catalog.json
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Optional TOML file of calibrated radii. Built-in radii are used
    /// when unset.
    ///
    /// Can be set via:
    /// - CLI: --calibration /path/to/calibration.toml
    /// - ENV: AMBIT_CALIBRATION_PATH
    /// - Config: calibration_path = "/path/to/calibration.toml"
    #[serde(default)]
    pub calibration_path: Option<PathBuf>,

    /// Resolution tier used when a command does not name one.
    #[serde(default)]
    pub resolution: Resolution,

    /// Logger settings.
    #[serde(default)]
    pub logging: twyg::Opts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            calibration_path: None,
            resolution: Resolution::default(),
            logging: twyg::Opts::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/ambit/config.toml
    /// Reads environment variables with AMBIT_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("ambit");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;
        log::debug!("Loaded configuration (catalog {})", config.catalog_path.display());

        Ok(config)
    }

    /// Load configuration, then apply the paths given on the command line.
    pub fn load_with_overrides(
        catalog_path: Option<PathBuf>,
        calibration_path: Option<PathBuf>,
    ) -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_overrides(catalog_path, calibration_path);
        Ok(config)
    }

    fn apply_overrides(&mut self, catalog_path: Option<PathBuf>, calibration_path: Option<PathBuf>) {
        if let Some(path) = catalog_path {
            self.catalog_path = path;
        }
        if calibration_path.is_some() {
            self.calibration_path = calibration_path;
        }
    }
}

/// Get the default catalog path.
///
/// Returns: ~/.local/share/ambit/catalog.json (or platform equivalent)
fn default_catalog_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ambit")
        .join("catalog.json")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/ambit/config.toml
/// - macOS: ~/Library/Application Support/ambit/config.toml
/// - Windows: %APPDATA%\ambit\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ambit")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Ambit Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (AMBIT_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the JSON track catalog
#
# A JSON array of tracks with their features and optional PCA / VAE
# embeddings.
#
# Can also be set via:
# - CLI: ambit --catalog /custom/catalog.json explore <TRACK_ID>
# - Environment: AMBIT_CATALOG_PATH=/custom/catalog.json
#
# Default: Platform-specific data directory
#catalog_path = "/path/to/catalog.json"

# Path to calibrated search radii (TOML)
#
# One table per [<resolution>.<discriminator>] with inner_radius and
# outer_radius. Built-in radii are used when unset.
#
# Can also be set via:
# - CLI: ambit --calibration /custom/calibration.toml ...
# - Environment: AMBIT_CALIBRATION_PATH=/custom/calibration.toml
#calibration_path = "/path/to/calibration.toml"

# Default resolution tier: microscope, magnifying_glass or binoculars
resolution = "magnifying_glass"
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;
    log::info!("Created config file {}", config_path.display());

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.catalog_path.ends_with("catalog.json"));
        assert!(config.calibration_path.is_none());
        assert_eq!(config.resolution, Resolution::MagnifyingGlass);
    }

    #[test]
    fn test_config_load() {
        // Should not fail even if config file doesn't exist
        let result = Config::load();
        assert!(result.is_ok());
    }

    #[test]
    fn test_overrides_replace_only_given_paths() {
        let mut config = Config {
            calibration_path: Some(PathBuf::from("/etc/ambit/calibration.toml")),
            ..Config::default()
        };
        config.apply_overrides(Some(PathBuf::from("/tmp/catalog.json")), None);

        assert_eq!(config.catalog_path, PathBuf::from("/tmp/catalog.json"));
        assert_eq!(
            config.calibration_path,
            Some(PathBuf::from("/etc/ambit/calibration.toml"))
        );
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config = toml::from_str(example_config()).unwrap();
        assert_eq!(config.resolution, Resolution::MagnifyingGlass);
        assert!(config.calibration_path.is_none());
    }
}
