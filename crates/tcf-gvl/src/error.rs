//! Error types for the vendor list subsystem.

use tcf_core::{LanguageCode, TcfError, VendorId};
use thiserror::Error;

/// Errors that can occur in vendor list operations.
#[derive(Error, Debug)]
pub enum GvlError {
    /// The document violates the vendor list structure
    #[error("malformed vendor list: {0}")]
    MalformedVendorList(#[from] Malformed),

    /// A version field the consent string encoding depends on is absent
    #[error("vendor list is missing required version field {field}")]
    MissingVersionInfo {
        /// JSON name of the missing field
        field: &'static str,
    },

    /// A language file could not be fetched, parsed or applied
    #[error("language load failed: {0}")]
    LanguageLoad(#[from] LanguageLoadError),

    /// A query was issued before the registry finished loading
    #[error("vendor list registry is not ready")]
    NotReady,

    /// The registry already holds a vendor list
    #[error("vendor list registry already holds vendor list version {vendor_list_version}")]
    AlreadyLoaded {
        /// Version currently held
        vendor_list_version: u32,
    },

    /// Language code is malformed or not a TCF consent language
    #[error(transparent)]
    UnsupportedLanguage(#[from] TcfError),

    /// The vendor list document could not be fetched
    #[error("failed to fetch vendor list: {0}")]
    VendorListFetch(#[source] FetchError),

    /// Exporting the document failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Structural violations found while building a vendor list document.
#[derive(Error, Debug)]
pub enum Malformed {
    /// The payload is not valid vendor list JSON
    #[error("invalid vendor list JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// A required table is absent
    #[error("missing required table {table}")]
    MissingTable {
        /// JSON name of the table
        table: &'static str,
    },

    /// A required top-level field is absent
    #[error("missing required field {field}")]
    MissingField {
        /// JSON name of the field
        field: &'static str,
    },

    /// A table entry is stored under a key different from its own id
    #[error("{table} entry keyed {key} declares id {id}")]
    KeyMismatch {
        /// JSON name of the table
        table: &'static str,
        /// Map key the entry was found under
        key: u32,
        /// Id the entry itself declares
        id: u32,
    },

    /// A vendor references an id its document does not define
    #[error("vendor {vendor_id} declares {field} id {declared_id} which the document does not define")]
    DanglingVendorReference {
        /// Offending vendor
        vendor_id: VendorId,
        /// JSON name of the declaration list (e.g. `legIntPurposes`)
        field: &'static str,
        /// The undefined id
        declared_id: u32,
    },

    /// A stack references an id its document does not define
    #[error("stack {stack_id} bundles {field} id {declared_id} which the document does not define")]
    DanglingStackReference {
        /// Offending stack
        stack_id: u32,
        /// JSON name of the list (`purposes` or `specialFeatures`)
        field: &'static str,
        /// The undefined id
        declared_id: u32,
    },
}

/// Failures of a single language change.
#[derive(Error, Debug)]
pub enum LanguageLoadError {
    /// The language file could not be fetched
    #[error("failed to fetch language file for {language}: {source}")]
    Fetch {
        /// Requested language
        language: LanguageCode,
        /// Transport error
        #[source]
        source: FetchError,
    },

    /// The language file is not valid JSON of the expected shape
    #[error("failed to parse language file for {language}: {source}")]
    Parse {
        /// Requested language
        language: LanguageCode,
        /// JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The language file lacks a translation for an entry of the document
    #[error("language file for {language} has no {table} entry {id}")]
    Incomplete {
        /// Requested language
        language: LanguageCode,
        /// JSON name of the table
        table: &'static str,
        /// Untranslated id
        id: u32,
    },
}

/// Transport errors raised by vendor list loaders.
#[derive(Error, Debug)]
pub enum FetchError {
    /// No source is configured for the request
    #[error("no vendor list source configured: {0}")]
    NotConfigured(String),

    /// Mirror directory is missing
    #[error("vendor list directory not found at {path}")]
    DirectoryNotFound {
        /// Expected directory path
        path: String,
    },

    /// Requested file does not exist
    #[error("file not found: {path}")]
    NotFound {
        /// Path or URL that was requested
        path: String,
    },

    /// I/O error while reading a file
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path being read
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("unexpected HTTP status {status} from {url}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },
}

/// Result type for vendor list operations.
pub type Result<T> = std::result::Result<T, GvlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GvlError::MissingVersionInfo {
            field: "tcfPolicyVersion",
        };
        assert_eq!(
            err.to_string(),
            "vendor list is missing required version field tcfPolicyVersion"
        );

        let err = GvlError::from(Malformed::DanglingVendorReference {
            vendor_id: VendorId::new(1),
            field: "purposes",
            declared_id: 99,
        });
        assert_eq!(
            err.to_string(),
            "malformed vendor list: vendor 1 declares purposes id 99 which the document does not define"
        );
    }

    #[test]
    fn test_language_error_wraps() {
        let err: GvlError = LanguageLoadError::Incomplete {
            language: LanguageCode::new("fr").expect("valid language"),
            table: "purposes",
            id: 3,
        }
        .into();
        assert!(matches!(err, GvlError::LanguageLoad(_)));
        assert!(err.to_string().contains("no purposes entry 3"));
    }
}
