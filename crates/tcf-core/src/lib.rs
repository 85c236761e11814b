//! TCF Core - Foundation crate for the TCF vendor list engine.
//!
//! This crate provides shared types, error handling and configuration
//! management that the vendor list registry depends on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes and enums (`VendorId`, `LanguageCode`, `VendorListVersion`)
//!
//! # Example
//!
//! ```rust
//! use tcf_core::{LanguageCode, TcfConfig, VendorListVersion};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TcfConfig::default();
//! let file = config.gvl.vendor_list_filename(VendorListVersion::Specific(12));
//! assert_eq!(file, "archives/vendor-list-v12.json");
//!
//! let language = LanguageCode::new("fr")?;
//! assert_eq!(config.gvl.language_file_name(&language), "purposes-fr.json");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{GvlConfig, HttpConfig, TcfConfig};
pub use error::{ConfigError, ConfigResult, TcfError};
pub use types::{
    ConsentLanguages, LanguageCode, VendorId, VendorListVersion, CONSENT_LANGUAGES,
    DEFAULT_LANGUAGE,
};
