//! Shared types used across the TCF crates.
//!
//! Newtypes here give the vendor list engine type-safe identifiers and a
//! validated language code, matching the id spaces fixed by the IAB
//! Transparency & Consent Framework.

use crate::error::TcfError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Numeric vendor identifier assigned by the IAB.
///
/// Serializes as a bare integer, so it can key JSON maps (`"12": {...}`)
/// exactly like the published vendor list does.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VendorId(u32);

impl VendorId {
    /// Wrap a raw vendor id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for VendorId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Languages a TCF consent UI may be presented in.
///
/// Codes are ISO 639-1, with script/region suffixes where the framework
/// distinguishes variants.
pub const CONSENT_LANGUAGES: &[&str] = &[
    "AR", "BG", "BS", "CA", "CS", "CY", "DA", "DE", "EL", "EN", "ES", "ET", "EU", "FI", "FR", "GL",
    "HE", "HI", "HR", "HU", "ID", "IT", "JA", "KA", "KO", "LT", "LV", "MK", "MS", "MT", "NL", "NO",
    "PL", "PT-BR", "PT-PT", "RO", "RU", "SK", "SL", "SQ", "SR-CYRL", "SR-LATN", "SV", "SW", "TH",
    "TL", "TR", "UK", "VI", "ZH", "ZH-HANT",
];

/// Language the published vendor list ships its display strings in.
pub const DEFAULT_LANGUAGE: &str = "EN";

/// Newtype for consent language codes with validation.
///
/// Codes are normalised to upper case (`"pt-br"` becomes `"PT-BR"`) and must
/// appear in [`CONSENT_LANGUAGES`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Create a new `LanguageCode` from a string.
    ///
    /// # Errors
    /// Returns [`TcfError::InvalidLanguageCode`] if the input is not shaped
    /// like a language code, [`TcfError::UnsupportedLanguage`] if it is but
    /// the framework does not list it.
    pub fn new(code: impl AsRef<str>) -> Result<Self, TcfError> {
        let code = code.as_ref().trim().to_ascii_uppercase();
        Self::validate(&code)?;
        Ok(Self(code))
    }

    /// The default vendor list language (`EN`).
    #[must_use]
    pub fn default_language() -> Self {
        Self(DEFAULT_LANGUAGE.to_string())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased form used in language file names (`purposes-pt-br.json`).
    #[must_use]
    pub fn file_stem(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    fn validate(code: &str) -> Result<(), TcfError> {
        static LANGUAGE_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = LANGUAGE_REGEX.get_or_init(|| {
            Regex::new(r"^[A-Z]{2}(-[A-Z]{2,4})?$").expect("valid regex")
        });

        if !regex.is_match(code) {
            return Err(TcfError::InvalidLanguageCode(code.to_string()));
        }

        if !CONSENT_LANGUAGES.contains(&code) {
            return Err(TcfError::UnsupportedLanguage(code.to_string()));
        }

        Ok(())
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self::default_language()
    }
}

impl FromStr for LanguageCode {
    type Err = TcfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = TcfError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The supported consent languages together with the active one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentLanguages {
    supported: BTreeSet<LanguageCode>,
    active: LanguageCode,
}

impl ConsentLanguages {
    /// Full TCF language table with `active` selected.
    #[must_use]
    pub fn with_active(active: LanguageCode) -> Self {
        let supported = CONSENT_LANGUAGES
            .iter()
            .map(|code| LanguageCode((*code).to_string()))
            .collect();
        Self { supported, active }
    }

    /// Currently active language.
    #[must_use]
    pub fn active(&self) -> &LanguageCode {
        &self.active
    }

    /// Whether a code (in any letter case) is supported.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.supported
            .iter()
            .any(|supported| supported.as_str().eq_ignore_ascii_case(code))
    }

    /// Iterate the supported codes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &LanguageCode> {
        self.supported.iter()
    }

    /// Number of supported languages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.supported.len()
    }

    /// Always false; the table is fixed by the framework.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.supported.is_empty()
    }
}

impl Default for ConsentLanguages {
    fn default() -> Self {
        Self::with_active(LanguageCode::default_language())
    }
}

/// Which vendor list version to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VendorListVersion {
    /// Whatever the publisher currently serves as the latest list
    #[default]
    Latest,
    /// A specific archived `vendorListVersion`
    Specific(u32),
}

impl fmt::Display for VendorListVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Specific(version) => write!(f, "v{version}"),
        }
    }
}
