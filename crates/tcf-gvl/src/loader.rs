//! Sources for vendor list and language file payloads.
//!
//! The registry never performs I/O itself; it asks a [`GvlLoader`] for raw
//! JSON text and does all parsing and validation on its side.

use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tcf_core::{GvlConfig, LanguageCode, TcfConfig, VendorListVersion};
use tracing::{debug, info};

/// Fetch capability injected into the registry.
#[async_trait]
pub trait GvlLoader: Send + Sync {
    /// Fetch the vendor list JSON for a version.
    ///
    /// # Errors
    /// Returns error if the payload cannot be retrieved.
    async fn fetch_vendor_list(&self, version: VendorListVersion) -> Result<String, FetchError>;

    /// Fetch the language file JSON for a language.
    ///
    /// # Errors
    /// Returns error if the payload cannot be retrieved.
    async fn fetch_language(&self, language: &LanguageCode) -> Result<String, FetchError>;
}

/// Loader reading a local mirror of the published files.
pub struct DirectoryLoader {
    /// Mirror root
    root: PathBuf,
    /// File naming
    config: GvlConfig,
}

impl DirectoryLoader {
    /// Create a loader over `root` using the default file names.
    ///
    /// # Errors
    /// Returns error if the directory doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, FetchError> {
        Self::with_config(root, GvlConfig::default())
    }

    /// Create a loader over `root` with custom file naming.
    ///
    /// # Errors
    /// Returns error if the directory doesn't exist.
    pub fn with_config(root: impl Into<PathBuf>, config: GvlConfig) -> Result<Self, FetchError> {
        let root = root.into();

        if !root.is_dir() {
            return Err(FetchError::DirectoryNotFound {
                path: root.display().to_string(),
            });
        }

        Ok(Self { root, config })
    }

    /// Mirror root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn read(&self, relative: &str) -> Result<String, FetchError> {
        let path = self.root.join(relative);

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                debug!(path = %path.display(), bytes = contents.len(), "read vendor list file");
                Ok(contents)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::NotFound {
                path: path.display().to_string(),
            }),
            Err(e) => Err(FetchError::Io {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }
}

#[async_trait]
impl GvlLoader for DirectoryLoader {
    async fn fetch_vendor_list(&self, version: VendorListVersion) -> Result<String, FetchError> {
        self.read(&self.config.vendor_list_filename(version)).await
    }

    async fn fetch_language(&self, language: &LanguageCode) -> Result<String, FetchError> {
        self.read(&self.config.language_file_name(language)).await
    }
}

/// Loader fetching the published files over HTTP.
pub struct HttpLoader {
    client: Client,
    base_url: String,
    config: GvlConfig,
}

impl HttpLoader {
    /// Create a loader for `base_url` with default settings.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let config = TcfConfig::default();
        Self::build(base_url.into(), config.gvl, &config.http)
    }

    /// Create a loader from configuration.
    ///
    /// # Errors
    /// Returns error if no base URL is configured or the client cannot be created.
    pub fn from_config(config: &TcfConfig) -> Result<Self, FetchError> {
        let base_url = config
            .gvl
            .base_url
            .clone()
            .ok_or_else(|| FetchError::NotConfigured("gvl.base_url is not set".to_string()))?;
        Self::build(base_url, config.gvl.clone(), &config.http)
    }

    fn build(
        base_url: String,
        config: GvlConfig,
        http: &tcf_core::HttpConfig,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .user_agent(http.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    /// Absolute URL for a relative file name.
    #[must_use]
    pub fn url_for(&self, relative: &str) -> String {
        format!("{}/{}", self.base_url, relative.trim_start_matches('/'))
    }

    async fn get(&self, relative: &str) -> Result<String, FetchError> {
        let url = self.url_for(relative);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { path: url });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        info!(url = %url, bytes = body.len(), "fetched vendor list file");
        Ok(body)
    }
}

#[async_trait]
impl GvlLoader for HttpLoader {
    async fn fetch_vendor_list(&self, version: VendorListVersion) -> Result<String, FetchError> {
        self.get(&self.config.vendor_list_filename(version)).await
    }

    async fn fetch_language(&self, language: &LanguageCode) -> Result<String, FetchError> {
        self.get(&self.config.language_file_name(language)).await
    }
}

/// Loader serving payloads that were fetched elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    vendor_lists: HashMap<VendorListVersion, String>,
    languages: HashMap<LanguageCode, String>,
}

impl MemoryLoader {
    /// Create an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `json` for a vendor list version.
    #[must_use]
    pub fn with_vendor_list(mut self, version: VendorListVersion, json: impl Into<String>) -> Self {
        self.vendor_lists.insert(version, json.into());
        self
    }

    /// Serve `json` for a language.
    #[must_use]
    pub fn with_language(mut self, language: LanguageCode, json: impl Into<String>) -> Self {
        self.languages.insert(language, json.into());
        self
    }
}

#[async_trait]
impl GvlLoader for MemoryLoader {
    async fn fetch_vendor_list(&self, version: VendorListVersion) -> Result<String, FetchError> {
        self.vendor_lists
            .get(&version)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                path: format!("vendor list {version}"),
            })
    }

    async fn fetch_language(&self, language: &LanguageCode) -> Result<String, FetchError> {
        self.languages
            .get(language)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                path: format!("language {language}"),
            })
    }
}
