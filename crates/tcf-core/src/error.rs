//! Core error types shared by the TCF crates.
//!
//! Subsystem crates define their own error enums and wrap these where a
//! shared type (language code, configuration) is involved.

use thiserror::Error;

/// Errors raised while building the shared newtypes.
#[derive(Error, Debug)]
pub enum TcfError {
    /// Input is not shaped like a language code (`FR`, `PT-BR`, `SR-CYRL`)
    #[error("invalid language code: '{0}'")]
    InvalidLanguageCode(String),

    /// Language code is well formed but not one of the TCF consent languages
    #[error("unsupported consent language: '{0}'")]
    UnsupportedLanguage(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TcfError::UnsupportedLanguage("XX".to_string());
        assert_eq!(err.to_string(), "unsupported consent language: 'XX'");

        let err = ConfigError::InvalidValue {
            field: "gvl.latest_filename".to_string(),
            reason: "cannot be empty".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value for gvl.latest_filename: cannot be empty"
        );
    }

    #[test]
    fn test_invalid_language_code_display() {
        let err = TcfError::InvalidLanguageCode("ENGLISH".to_string());
        assert_eq!(err.to_string(), "invalid language code: 'ENGLISH'");
    }
}
