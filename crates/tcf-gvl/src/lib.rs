//! TCF GVL - Global Vendor List registry for the IAB Transparency & Consent Framework.
//!
//! This crate ingests a versioned vendor list document, validates every
//! cross-reference between vendors and the purpose/feature tables, builds
//! reverse lookup indices and answers "which vendors declare purpose P"
//! style queries. Working vendor sets can be narrowed and display strings
//! swapped to another language without touching ids or indices.
//!
//! # Architecture
//!
//! - **Document** ([`document`]): Typed vendor list with structural validation
//! - **Index** ([`index`]): Reverse maps from declared ids to vendor ids
//! - **Registry** ([`registry`]): Ready-state machine, queries, narrowing, language changes
//! - **Language** ([`language`]): Per-locale display strings
//! - **Loader** ([`loader`]): Injected fetch capability (directory, HTTP, in-memory)
//! - **Errors** ([`error`]): Vendor list error types
//!
//! # Example
//!
//! ```rust
//! use tcf_gvl::GvlRegistry;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let json = r#"{
//!     "gvlSpecificationVersion": 3, "vendorListVersion": 1, "tcfPolicyVersion": 5,
//!     "lastUpdated": "2024-03-07T16:05:29Z",
//!     "purposes": {"1": {"id": 1, "name": "Store and/or access information", "description": "..."}},
//!     "specialPurposes": {}, "features": {}, "stacks": {},
//!     "vendors": {"7": {"id": 7, "name": "Example Vendor", "purposes": [1]}}
//! }"#;
//!
//! let registry = GvlRegistry::from_document(json)?;
//! let vendors = registry.vendors_with_consent_purpose(1)?;
//! assert_eq!(vendors.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod document;
pub mod error;
pub mod index;
pub mod language;
pub mod loader;
pub mod registry;

// Re-export commonly used types
pub use document::{
    DataCategory, Declaration, Feature, IntoVendorList, Purpose, RawVendorList, Stack, Timestamp,
    Vendor, VendorListDocument, VendorMap,
};
pub use error::{FetchError, GvlError, LanguageLoadError, Malformed, Result};
pub use index::{build_index, VendorIndex, VendorIndices};
pub use language::LanguageFile;
pub use loader::{DirectoryLoader, GvlLoader, HttpLoader, MemoryLoader};
pub use registry::{GvlRegistry, LanguageChange, RegistryState, Snapshot};
