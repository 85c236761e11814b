//! Configuration management for the vendor list engine.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{LanguageCode, VendorListVersion};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Placeholder replaced by the numeric vendor list version.
pub const VERSION_PLACEHOLDER: &str = "[VERSION]";

/// Placeholder replaced by the lower-cased language code.
pub const LANGUAGE_PLACEHOLDER: &str = "[LANG]";

/// Main configuration.
///
/// This is loaded from `~/.config/tcf-gvl/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TcfConfig {
    /// Vendor list location and file naming
    pub gvl: GvlConfig,
    /// HTTP transport settings
    pub http: HttpConfig,
}

impl TcfConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file, falling back to defaults if
    /// the file does not exist.
    pub fn load_from(config_path: &Path) -> ConfigResult<Self> {
        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(config_path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `TCF_GVL_BASE_URL`: Override the vendor list base URL
    /// - `TCF_GVL_LANGUAGE`: Override the default language (ignored if unsupported)
    /// - `TCF_GVL_DEFINITIONS_DIR`: Override the local mirror directory
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TCF_GVL_BASE_URL") {
            tracing::debug!("Override gvl.base_url from env: {}", val);
            self.gvl.base_url = Some(val);
        }

        if let Ok(val) = std::env::var("TCF_GVL_LANGUAGE") {
            match LanguageCode::new(&val) {
                Ok(language) => {
                    tracing::debug!("Override gvl.default_language from env: {}", language);
                    self.gvl.default_language = language;
                }
                Err(e) => tracing::warn!("Ignoring TCF_GVL_LANGUAGE: {}", e),
            }
        }

        if let Ok(val) = std::env::var("TCF_GVL_DEFINITIONS_DIR") {
            tracing::debug!("Override gvl.definitions_dir from env: {}", val);
            self.gvl.definitions_dir = Some(PathBuf::from(val));
        }
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file, creating parent directories.
    pub fn save_to(&self, config_path: &Path) -> ConfigResult<()> {
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Check values that would otherwise fail much later, at fetch time.
    pub fn validate(&self) -> ConfigResult<()> {
        self.gvl.validate()
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/tcf-gvl/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("org", "tcf", "tcf-gvl").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Where vendor lists and language files live and how they are named.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GvlConfig {
    /// Base URL serving the vendor list and language files
    pub base_url: Option<String>,
    /// Local directory mirroring the published files
    pub definitions_dir: Option<PathBuf>,
    /// File name of the latest vendor list
    pub latest_filename: String,
    /// File name template for archived versions, containing `[VERSION]`
    pub versioned_filename: String,
    /// File name template for language files, containing `[LANG]`
    pub language_filename: String,
    /// Language the registry starts in
    pub default_language: LanguageCode,
}

impl Default for GvlConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            definitions_dir: None,
            latest_filename: "vendor-list.json".to_string(),
            versioned_filename: "archives/vendor-list-v[VERSION].json".to_string(),
            language_filename: "purposes-[LANG].json".to_string(),
            default_language: LanguageCode::default_language(),
        }
    }
}

impl GvlConfig {
    /// Relative file name for a vendor list version.
    #[must_use]
    pub fn vendor_list_filename(&self, version: VendorListVersion) -> String {
        match version {
            VendorListVersion::Latest => self.latest_filename.clone(),
            VendorListVersion::Specific(number) => self
                .versioned_filename
                .replace(VERSION_PLACEHOLDER, &number.to_string()),
        }
    }

    /// Relative file name for a language file.
    #[must_use]
    pub fn language_file_name(&self, language: &LanguageCode) -> String {
        self.language_filename
            .replace(LANGUAGE_PLACEHOLDER, &language.file_stem())
    }

    /// Validate file name settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.latest_filename.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "gvl.latest_filename".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        if !self.versioned_filename.contains(VERSION_PLACEHOLDER) {
            return Err(ConfigError::InvalidValue {
                field: "gvl.versioned_filename".to_string(),
                reason: format!("must contain {VERSION_PLACEHOLDER}"),
            });
        }

        if !self.language_filename.contains(LANGUAGE_PLACEHOLDER) {
            return Err(ConfigError::InvalidValue {
                field: "gvl.language_filename".to_string(),
                reason: format!("must contain {LANGUAGE_PLACEHOLDER}"),
            });
        }

        Ok(())
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("tcf-gvl/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
