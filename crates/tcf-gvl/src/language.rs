//! Per-locale display strings and their application to a document.
//!
//! A language file only carries names and descriptions. Ids and declaration
//! lists are not part of these types, so a file that ships them anyway can
//! never leak them into a document or its indices.

use crate::document::{DataCategory, Purpose, Stack, Vendor, VendorListDocument};
use crate::error::LanguageLoadError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tcf_core::{LanguageCode, VendorId};

/// Translated strings of a purpose or feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurposeText {
    /// Display name
    pub name: String,
    /// Display description
    pub description: String,
    /// Legal text, if the locale provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_legal: Option<String>,
    /// Illustrations, if the locale provides them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illustrations: Option<Vec<String>>,
}

/// Translated strings of a stack or data category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryText {
    /// Display name
    pub name: String,
    /// Display description
    pub description: String,
}

/// Translated vendor name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorText {
    /// Display name
    pub name: String,
}

/// Display strings for one language (`purposes-[LANG].json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageFile {
    /// Language the file declares itself to be in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Purposes
    #[serde(default)]
    pub purposes: BTreeMap<u32, PurposeText>,
    /// Special purposes
    #[serde(default)]
    pub special_purposes: BTreeMap<u32, PurposeText>,
    /// Features
    #[serde(default)]
    pub features: BTreeMap<u32, PurposeText>,
    /// Special features
    #[serde(default)]
    pub special_features: BTreeMap<u32, PurposeText>,
    /// Stacks
    #[serde(default)]
    pub stacks: BTreeMap<u32, EntryText>,
    /// Data categories
    #[serde(default)]
    pub data_categories: BTreeMap<u32, EntryText>,
    /// Vendor names; vendors without an entry keep their current name
    #[serde(default)]
    pub vendors: BTreeMap<VendorId, VendorText>,
}

impl LanguageFile {
    /// Parse a language file payload.
    pub fn from_json(language: &LanguageCode, json: &str) -> Result<Self, LanguageLoadError> {
        serde_json::from_str(json).map_err(|source| LanguageLoadError::Parse {
            language: language.clone(),
            source,
        })
    }

    /// Capture the strings a document currently carries.
    ///
    /// Used to seed the language cache with the document's own language.
    #[must_use]
    pub fn from_document(document: &VendorListDocument, language: &LanguageCode) -> Self {
        let purpose_text = |table: &BTreeMap<u32, Purpose>| {
            table
                .iter()
                .map(|(id, purpose)| (*id, PurposeText::from(purpose)))
                .collect()
        };

        Self {
            language: Some(language.file_stem()),
            purposes: purpose_text(document.purposes()),
            special_purposes: purpose_text(document.special_purposes()),
            features: purpose_text(document.features()),
            special_features: document
                .special_features()
                .map(purpose_text)
                .unwrap_or_default(),
            stacks: document
                .stacks()
                .iter()
                .map(|(id, stack)| (*id, EntryText::from(stack)))
                .collect(),
            data_categories: document
                .data_categories()
                .map(|table| {
                    table
                        .iter()
                        .map(|(id, category)| (*id, EntryText::from(category)))
                        .collect()
                })
                .unwrap_or_default(),
            vendors: document
                .full_vendor_list()
                .iter()
                .map(|(id, vendor)| {
                    (
                        *id,
                        VendorText {
                            name: vendor.name.clone(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Produce a copy of `document` carrying this file's strings.
    ///
    /// Every purpose, special purpose, feature, special feature, stack and
    /// data category of the document must have a translation; otherwise
    /// nothing is applied.
    pub fn apply_to(
        &self,
        document: &VendorListDocument,
        language: &LanguageCode,
    ) -> Result<VendorListDocument, LanguageLoadError> {
        let mut translated = document.clone();
        let tables = translated.tables_mut();

        translate_purposes(tables.purposes, &self.purposes, "purposes", language)?;
        translate_purposes(
            tables.special_purposes,
            &self.special_purposes,
            "specialPurposes",
            language,
        )?;
        translate_purposes(tables.features, &self.features, "features", language)?;
        if let Some(table) = tables.special_features {
            translate_purposes(table, &self.special_features, "specialFeatures", language)?;
        }
        translate_entries(tables.stacks, &self.stacks, "stacks", language, |stack, text| {
            stack.name.clone_from(&text.name);
            stack.description.clone_from(&text.description);
        })?;
        if let Some(table) = tables.data_categories {
            translate_entries(
                table,
                &self.data_categories,
                "dataCategories",
                language,
                |category: &mut DataCategory, text| {
                    category.name.clone_from(&text.name);
                    category.description.clone_from(&text.description);
                },
            )?;
        }
        rename_vendors(tables.vendors, &self.vendors);
        rename_vendors(tables.full_vendor_list, &self.vendors);

        Ok(translated)
    }
}

impl From<&Purpose> for PurposeText {
    fn from(purpose: &Purpose) -> Self {
        Self {
            name: purpose.name.clone(),
            description: purpose.description.clone(),
            description_legal: purpose.description_legal.clone(),
            illustrations: purpose.illustrations.clone(),
        }
    }
}

impl From<&Stack> for EntryText {
    fn from(stack: &Stack) -> Self {
        Self {
            name: stack.name.clone(),
            description: stack.description.clone(),
        }
    }
}

impl From<&DataCategory> for EntryText {
    fn from(category: &DataCategory) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone(),
        }
    }
}

fn translate_purposes(
    table: &mut BTreeMap<u32, Purpose>,
    texts: &BTreeMap<u32, PurposeText>,
    name: &'static str,
    language: &LanguageCode,
) -> Result<(), LanguageLoadError> {
    translate_entries(table, texts, name, language, |purpose, text| {
        purpose.name.clone_from(&text.name);
        purpose.description.clone_from(&text.description);
        if text.description_legal.is_some() {
            purpose.description_legal.clone_from(&text.description_legal);
        }
        if text.illustrations.is_some() {
            purpose.illustrations.clone_from(&text.illustrations);
        }
    })
}

fn translate_entries<T, X>(
    table: &mut BTreeMap<u32, T>,
    texts: &BTreeMap<u32, X>,
    name: &'static str,
    language: &LanguageCode,
    apply: impl Fn(&mut T, &X),
) -> Result<(), LanguageLoadError> {
    for (id, entry) in table.iter_mut() {
        let text = texts.get(id).ok_or_else(|| LanguageLoadError::Incomplete {
            language: language.clone(),
            table: name,
            id: *id,
        })?;
        apply(entry, text);
    }
    Ok(())
}

fn rename_vendors(vendors: &mut BTreeMap<VendorId, Vendor>, names: &BTreeMap<VendorId, VendorText>) {
    for (id, vendor) in vendors.iter_mut() {
        if let Some(text) = names.get(id) {
            vendor.name.clone_from(&text.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::IntoVendorList;
    use serde_json::json;

    fn document() -> VendorListDocument {
        json!({
            "gvlSpecificationVersion": 3,
            "vendorListVersion": 7,
            "tcfPolicyVersion": 5,
            "lastUpdated": "2024-03-07T16:05:29Z",
            "purposes": {
                "1": {"id": 1, "name": "Store and/or access information on a device", "description": "Cookies.", "illustrations": []}
            },
            "specialPurposes": {
                "1": {"id": 1, "name": "Ensure security", "description": "Security."}
            },
            "features": {},
            "stacks": {
                "1": {"id": 1, "purposes": [1], "specialFeatures": [], "name": "Storage", "description": "Storage stack."}
            },
            "vendors": {
                "4": {"id": 4, "name": "Vendor Four", "purposes": [1], "legIntPurposes": [], "flexiblePurposes": [], "specialPurposes": [1], "features": [], "specialFeatures": []}
            }
        })
        .into_vendor_list()
        .expect("valid document")
    }

    fn french() -> LanguageCode {
        LanguageCode::new("fr").expect("valid language")
    }

    #[test]
    fn test_apply_replaces_display_strings_only() {
        let document = document();
        let file = LanguageFile::from_json(
            &french(),
            r#"{
                "language": "fr",
                "purposes": {"1": {"id": 1, "name": "Stocker des informations", "description": "Témoins."}},
                "specialPurposes": {"1": {"id": 1, "name": "Assurer la sécurité", "description": "Sécurité."}},
                "stacks": {"1": {"id": 1, "purposes": [99], "name": "Stockage", "description": "Pile."}},
                "vendors": {"4": {"name": "Fournisseur Quatre", "purposes": [42]}}
            }"#,
        )
        .expect("parse language file");

        let translated = file.apply_to(&document, &french()).expect("apply");

        assert_eq!(translated.purposes()[&1].name, "Stocker des informations");
        assert_eq!(translated.purposes()[&1].illustrations, Some(Vec::new()));
        assert_eq!(translated.stacks()[&1].name, "Stockage");
        assert_eq!(translated.stacks()[&1].purpose_ids(), &[1]);

        let vendor = translated.vendor(VendorId::new(4)).expect("vendor 4");
        assert_eq!(vendor.name, "Fournisseur Quatre");
        assert_eq!(vendor.purposes, Some(vec![1]));
        assert_eq!(
            translated.full_vendor_list()[&VendorId::new(4)].name,
            "Fournisseur Quatre"
        );

        // Source document untouched
        assert_eq!(document.purposes()[&1].name, "Store and/or access information on a device");
    }

    #[test]
    fn test_incomplete_file_is_rejected() {
        let file = LanguageFile::from_json(
            &french(),
            r#"{"purposes": {"1": {"name": "Stocker", "description": "Témoins."}}}"#,
        )
        .expect("parse language file");

        let err = file.apply_to(&document(), &french()).expect_err("incomplete");
        assert!(matches!(
            err,
            LanguageLoadError::Incomplete {
                table: "specialPurposes",
                id: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_payload() {
        let err = LanguageFile::from_json(&french(), "[1, 2]").expect_err("not an object");
        assert!(matches!(err, LanguageLoadError::Parse { .. }));
    }

    #[test]
    fn test_from_document_restores_original() {
        let document = document();
        let english = LanguageCode::default_language();
        let snapshot = LanguageFile::from_document(&document, &english);

        let file = LanguageFile::from_json(
            &french(),
            r#"{
                "purposes": {"1": {"name": "Stocker", "description": "Témoins."}},
                "specialPurposes": {"1": {"name": "Sécurité", "description": "Sécurité."}},
                "stacks": {"1": {"name": "Stockage", "description": "Pile."}}
            }"#,
        )
        .expect("parse language file");

        let translated = file.apply_to(&document, &french()).expect("apply french");
        let restored = snapshot.apply_to(&translated, &english).expect("apply english");
        assert_eq!(restored, document);
    }
}
