//! Vendor list document types and structural validation.
//!
//! A [`RawVendorList`] mirrors the published JSON one-to-one with every
//! field optional. Converting it into a [`VendorListDocument`] checks the
//! version fields, the required tables and every cross-reference between
//! vendors/stacks and the purpose, feature and data category tables.

use crate::error::{GvlError, Malformed, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tcf_core::VendorId;
use tracing::debug;

/// Vendor table keyed by vendor id.
pub type VendorMap = BTreeMap<VendorId, Vendor>;

/// An RFC 3339 timestamp that serializes back to its source text.
///
/// `2024-03-07T16:05:29.000+00:00` and `2024-03-07T16:05:29Z` denote the same
/// instant; exporting keeps whichever form the publisher used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp {
    parsed: DateTime<Utc>,
    source: String,
}

impl Timestamp {
    /// The instant, normalised to UTC.
    #[must_use]
    pub fn parsed(&self) -> DateTime<Utc> {
        self.parsed
    }

    /// The text the timestamp was read from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl TryFrom<String> for Timestamp {
    type Error = chrono::ParseError;

    fn try_from(source: String) -> std::result::Result<Self, Self::Error> {
        let parsed = source.parse::<DateTime<Utc>>()?;
        Ok(Self { parsed, source })
    }
}

impl From<Timestamp> for String {
    fn from(timestamp: Timestamp) -> Self {
        timestamp.source
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// The six declaration categories a vendor can list ids under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Declaration {
    /// Purposes processed on the basis of consent (`purposes`)
    ConsentPurpose,
    /// Purposes processed on the basis of legitimate interest (`legIntPurposes`)
    LegitimateInterestPurpose,
    /// Purposes whose legal basis the publisher may switch (`flexiblePurposes`)
    FlexiblePurpose,
    /// Special purposes (`specialPurposes`)
    SpecialPurpose,
    /// Features (`features`)
    Feature,
    /// Special features (`specialFeatures`)
    SpecialFeature,
}

impl Declaration {
    /// Every category, in index order.
    pub const ALL: [Self; 6] = [
        Self::ConsentPurpose,
        Self::LegitimateInterestPurpose,
        Self::FlexiblePurpose,
        Self::SpecialPurpose,
        Self::Feature,
        Self::SpecialFeature,
    ];

    /// JSON field name of the declaration list on a vendor.
    #[must_use]
    pub fn field_name(self) -> &'static str {
        match self {
            Self::ConsentPurpose => "purposes",
            Self::LegitimateInterestPurpose => "legIntPurposes",
            Self::FlexiblePurpose => "flexiblePurposes",
            Self::SpecialPurpose => "specialPurposes",
            Self::Feature => "features",
            Self::SpecialFeature => "specialFeatures",
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// A registered vendor and its declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    /// IAB-assigned vendor id
    pub id: VendorId,

    /// Display name
    pub name: String,

    /// Consent purpose ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purposes: Option<Vec<u32>>,

    /// Legitimate interest purpose ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leg_int_purposes: Option<Vec<u32>>,

    /// Flexible purpose ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flexible_purposes: Option<Vec<u32>>,

    /// Special purpose ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_purposes: Option<Vec<u32>>,

    /// Feature ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<u32>>,

    /// Special feature ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_features: Option<Vec<u32>>,

    /// Data category ids (newer list versions only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_declaration: Option<Vec<u32>>,

    /// Privacy policy URL (older list versions; newer ones use `urls`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_url: Option<String>,

    /// Set once the vendor has left the framework
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_date: Option<Timestamp>,

    /// Fields this crate does not interpret (`urls`, `cookieMaxAgeSeconds`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Vendor {
    /// Ids declared under one category.
    #[must_use]
    pub fn declared(&self, declaration: Declaration) -> &[u32] {
        let ids = match declaration {
            Declaration::ConsentPurpose => &self.purposes,
            Declaration::LegitimateInterestPurpose => &self.leg_int_purposes,
            Declaration::FlexiblePurpose => &self.flexible_purposes,
            Declaration::SpecialPurpose => &self.special_purposes,
            Declaration::Feature => &self.features,
            Declaration::SpecialFeature => &self.special_features,
        };
        ids.as_deref().unwrap_or_default()
    }

    /// Whether the vendor has been removed from the framework.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_date.is_some()
    }
}

/// A purpose or feature entry.
///
/// Purposes, special purposes, features and special features share this
/// shape and live in separate tables with independent numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purpose {
    /// Ordinal id within its table
    pub id: u32,

    /// Display name
    pub name: String,

    /// Display description
    pub description: String,

    /// Legal text (older list versions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_legal: Option<String>,

    /// Illustrative examples (newer list versions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illustrations: Option<Vec<String>>,

    /// Fields this crate does not interpret (`consentable`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Features use the same shape as purposes.
pub type Feature = Purpose;

/// A named bundle of purposes presented together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stack {
    /// Stack id
    pub id: u32,

    /// Bundled purpose ids, in presentation order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purposes: Option<Vec<u32>>,

    /// Bundled special feature ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_features: Option<Vec<u32>>,

    /// Display name
    pub name: String,

    /// Display description
    pub description: String,

    /// Uninterpreted fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Stack {
    /// Bundled purpose ids; empty when the stack lists none.
    #[must_use]
    pub fn purpose_ids(&self) -> &[u32] {
        self.purposes.as_deref().unwrap_or_default()
    }

    /// Bundled special feature ids; empty when the stack lists none.
    #[must_use]
    pub fn special_feature_ids(&self) -> &[u32] {
        self.special_features.as_deref().unwrap_or_default()
    }
}

/// A category of personal data a vendor may process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataCategory {
    /// Category id
    pub id: u32,

    /// Display name
    pub name: String,

    /// Display description
    pub description: String,

    /// Uninterpreted fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The vendor list exactly as published, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVendorList {
    /// Vendor list specification version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gvl_specification_version: Option<u32>,

    /// Vendor list version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_list_version: Option<u32>,

    /// TCF policy version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcf_policy_version: Option<u32>,

    /// Publication timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,

    /// Purposes table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purposes: Option<BTreeMap<u32, Purpose>>,

    /// Special purposes table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_purposes: Option<BTreeMap<u32, Purpose>>,

    /// Features table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<BTreeMap<u32, Feature>>,

    /// Special features table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_features: Option<BTreeMap<u32, Feature>>,

    /// Stacks table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacks: Option<BTreeMap<u32, Stack>>,

    /// Data categories table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_categories: Option<BTreeMap<u32, DataCategory>>,

    /// Vendors table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendors: Option<VendorMap>,
}

/// A validated vendor list.
///
/// `full_vendor_list` is the vendor table as published and never loses
/// members. `vendors` is the working table: it starts as every vendor
/// without a `deletedDate` and shrinks when the registry narrows it.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorListDocument {
    gvl_specification_version: u32,
    vendor_list_version: u32,
    tcf_policy_version: u32,
    last_updated: Timestamp,
    purposes: BTreeMap<u32, Purpose>,
    special_purposes: BTreeMap<u32, Purpose>,
    features: BTreeMap<u32, Feature>,
    special_features: Option<BTreeMap<u32, Feature>>,
    stacks: BTreeMap<u32, Stack>,
    data_categories: Option<BTreeMap<u32, DataCategory>>,
    vendors: VendorMap,
    full_vendor_list: Arc<VendorMap>,
}

impl VendorListDocument {
    /// Parse and validate vendor list JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawVendorList = serde_json::from_str(json).map_err(Malformed::Parse)?;
        Self::try_from(raw)
    }

    /// Vendor list specification version.
    #[must_use]
    pub fn gvl_specification_version(&self) -> u32 {
        self.gvl_specification_version
    }

    /// Vendor list version.
    #[must_use]
    pub fn vendor_list_version(&self) -> u32 {
        self.vendor_list_version
    }

    /// TCF policy version.
    #[must_use]
    pub fn tcf_policy_version(&self) -> u32 {
        self.tcf_policy_version
    }

    /// Publication timestamp.
    #[must_use]
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated.parsed()
    }

    /// Purposes table.
    #[must_use]
    pub fn purposes(&self) -> &BTreeMap<u32, Purpose> {
        &self.purposes
    }

    /// Special purposes table.
    #[must_use]
    pub fn special_purposes(&self) -> &BTreeMap<u32, Purpose> {
        &self.special_purposes
    }

    /// Features table.
    #[must_use]
    pub fn features(&self) -> &BTreeMap<u32, Feature> {
        &self.features
    }

    /// Special features table, `None` if the list version has none.
    #[must_use]
    pub fn special_features(&self) -> Option<&BTreeMap<u32, Feature>> {
        self.special_features.as_ref()
    }

    /// Stacks table.
    #[must_use]
    pub fn stacks(&self) -> &BTreeMap<u32, Stack> {
        &self.stacks
    }

    /// Data categories table, `None` if the list version has none.
    #[must_use]
    pub fn data_categories(&self) -> Option<&BTreeMap<u32, DataCategory>> {
        self.data_categories.as_ref()
    }

    /// Working vendor table.
    #[must_use]
    pub fn vendors(&self) -> &VendorMap {
        &self.vendors
    }

    /// Vendor table as published, including deleted vendors.
    #[must_use]
    pub fn full_vendor_list(&self) -> &VendorMap {
        &self.full_vendor_list
    }

    /// Look up a vendor in the working table.
    #[must_use]
    pub fn vendor(&self, vendor_id: VendorId) -> Option<&Vendor> {
        self.vendors.get(&vendor_id)
    }

    /// Look up a purpose.
    #[must_use]
    pub fn purpose(&self, id: u32) -> Option<&Purpose> {
        self.purposes.get(&id)
    }

    /// Look up a stack.
    #[must_use]
    pub fn stack(&self, id: u32) -> Option<&Stack> {
        self.stacks.get(&id)
    }

    /// Whether the table behind a declaration category defines `id`.
    #[must_use]
    pub fn defines(&self, declaration: Declaration, id: u32) -> bool {
        match declaration {
            Declaration::ConsentPurpose
            | Declaration::LegitimateInterestPurpose
            | Declaration::FlexiblePurpose => self.purposes.contains_key(&id),
            Declaration::SpecialPurpose => self.special_purposes.contains_key(&id),
            Declaration::Feature => self.features.contains_key(&id),
            Declaration::SpecialFeature => self
                .special_features
                .as_ref()
                .is_some_and(|table| table.contains_key(&id)),
        }
    }

    /// Export in the published shape. `vendors` carries the full vendor list.
    #[must_use]
    pub fn to_raw(&self) -> RawVendorList {
        RawVendorList {
            gvl_specification_version: Some(self.gvl_specification_version),
            vendor_list_version: Some(self.vendor_list_version),
            tcf_policy_version: Some(self.tcf_policy_version),
            last_updated: Some(self.last_updated.clone()),
            purposes: Some(self.purposes.clone()),
            special_purposes: Some(self.special_purposes.clone()),
            features: Some(self.features.clone()),
            special_features: self.special_features.clone(),
            stacks: Some(self.stacks.clone()),
            data_categories: self.data_categories.clone(),
            vendors: Some(self.full_vendor_list.as_ref().clone()),
        }
    }

    /// Plain JSON export, see [`Self::to_raw`].
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.to_raw())?)
    }

    /// Copy with the working table replaced by `full_vendor_list ∩ vendor_ids`.
    ///
    /// Deleted vendors never re-enter the working table.
    #[must_use]
    pub(crate) fn narrowed_to(&self, vendor_ids: &BTreeSet<VendorId>) -> Self {
        let vendors = vendor_ids
            .iter()
            .filter_map(|id| self.full_vendor_list.get(id))
            .filter(|vendor| !vendor.is_deleted())
            .map(|vendor| (vendor.id, vendor.clone()))
            .collect();

        Self {
            vendors,
            ..self.clone()
        }
    }

    /// Mutable access to the display-string carrying tables, for translation.
    pub(crate) fn tables_mut(&mut self) -> DisplayTablesMut<'_> {
        DisplayTablesMut {
            purposes: &mut self.purposes,
            special_purposes: &mut self.special_purposes,
            features: &mut self.features,
            special_features: self.special_features.as_mut(),
            stacks: &mut self.stacks,
            data_categories: self.data_categories.as_mut(),
            vendors: &mut self.vendors,
            full_vendor_list: Arc::make_mut(&mut self.full_vendor_list),
        }
    }

    fn validate_vendor(&self, vendor: &Vendor) -> Result<()> {
        for declaration in Declaration::ALL {
            if let Some(&declared_id) = vendor
                .declared(declaration)
                .iter()
                .find(|id| !self.defines(declaration, **id))
            {
                return Err(Malformed::DanglingVendorReference {
                    vendor_id: vendor.id,
                    field: declaration.field_name(),
                    declared_id,
                }
                .into());
            }
        }

        if let Some(declared) = &vendor.data_declaration {
            let defined = |id: &u32| {
                self.data_categories
                    .as_ref()
                    .is_some_and(|table| table.contains_key(id))
            };
            if let Some(&declared_id) = declared.iter().find(|id| !defined(id)) {
                return Err(Malformed::DanglingVendorReference {
                    vendor_id: vendor.id,
                    field: "dataDeclaration",
                    declared_id,
                }
                .into());
            }
        }

        Ok(())
    }

    fn validate_stack(&self, stack: &Stack) -> Result<()> {
        if let Some(&declared_id) = stack
            .purpose_ids()
            .iter()
            .find(|id| !self.defines(Declaration::ConsentPurpose, **id))
        {
            return Err(Malformed::DanglingStackReference {
                stack_id: stack.id,
                field: "purposes",
                declared_id,
            }
            .into());
        }

        if let Some(&declared_id) = stack
            .special_feature_ids()
            .iter()
            .find(|id| !self.defines(Declaration::SpecialFeature, **id))
        {
            return Err(Malformed::DanglingStackReference {
                stack_id: stack.id,
                field: "specialFeatures",
                declared_id,
            }
            .into());
        }

        Ok(())
    }
}

/// Borrowed view over every table holding locale-dependent strings.
pub(crate) struct DisplayTablesMut<'a> {
    pub purposes: &'a mut BTreeMap<u32, Purpose>,
    pub special_purposes: &'a mut BTreeMap<u32, Purpose>,
    pub features: &'a mut BTreeMap<u32, Feature>,
    pub special_features: Option<&'a mut BTreeMap<u32, Feature>>,
    pub stacks: &'a mut BTreeMap<u32, Stack>,
    pub data_categories: Option<&'a mut BTreeMap<u32, DataCategory>>,
    pub vendors: &'a mut VendorMap,
    pub full_vendor_list: &'a mut VendorMap,
}

impl TryFrom<RawVendorList> for VendorListDocument {
    type Error = GvlError;

    fn try_from(raw: RawVendorList) -> Result<Self> {
        let gvl_specification_version =
            raw.gvl_specification_version
                .ok_or(GvlError::MissingVersionInfo {
                    field: "gvlSpecificationVersion",
                })?;
        let vendor_list_version = raw.vendor_list_version.ok_or(GvlError::MissingVersionInfo {
            field: "vendorListVersion",
        })?;
        let tcf_policy_version = raw.tcf_policy_version.ok_or(GvlError::MissingVersionInfo {
            field: "tcfPolicyVersion",
        })?;
        let last_updated = raw.last_updated.ok_or(Malformed::MissingField {
            field: "lastUpdated",
        })?;

        let purposes = required_table(raw.purposes, "purposes")?;
        let special_purposes = required_table(raw.special_purposes, "specialPurposes")?;
        let features = required_table(raw.features, "features")?;
        let stacks = required_table(raw.stacks, "stacks")?;
        let full_vendor_list = required_table(raw.vendors, "vendors")?;

        check_keys("purposes", &purposes, |p| p.id)?;
        check_keys("specialPurposes", &special_purposes, |p| p.id)?;
        check_keys("features", &features, |f| f.id)?;
        if let Some(table) = &raw.special_features {
            check_keys("specialFeatures", table, |f| f.id)?;
        }
        check_keys("stacks", &stacks, |s| s.id)?;
        if let Some(table) = &raw.data_categories {
            check_keys("dataCategories", table, |c| c.id)?;
        }
        for (key, vendor) in &full_vendor_list {
            if *key != vendor.id {
                return Err(Malformed::KeyMismatch {
                    table: "vendors",
                    key: key.get(),
                    id: vendor.id.get(),
                }
                .into());
            }
        }

        let vendors: VendorMap = full_vendor_list
            .iter()
            .filter(|(_, vendor)| !vendor.is_deleted())
            .map(|(id, vendor)| (*id, vendor.clone()))
            .collect();

        let document = Self {
            gvl_specification_version,
            vendor_list_version,
            tcf_policy_version,
            last_updated,
            purposes,
            special_purposes,
            features,
            special_features: raw.special_features,
            stacks,
            data_categories: raw.data_categories,
            vendors,
            full_vendor_list: Arc::new(full_vendor_list),
        };

        for vendor in document.full_vendor_list.values() {
            document.validate_vendor(vendor)?;
        }
        for stack in document.stacks.values() {
            document.validate_stack(stack)?;
        }

        debug!(
            vendor_list_version,
            vendors = document.full_vendor_list.len(),
            working = document.vendors.len(),
            "validated vendor list document"
        );

        Ok(document)
    }
}

fn required_table<T>(table: Option<T>, name: &'static str) -> Result<T> {
    table.ok_or_else(|| Malformed::MissingTable { table: name }.into())
}

fn check_keys<T>(
    table: &'static str,
    entries: &BTreeMap<u32, T>,
    id_of: impl Fn(&T) -> u32,
) -> Result<()> {
    for (key, entry) in entries {
        let id = id_of(entry);
        if *key != id {
            return Err(Malformed::KeyMismatch {
                table,
                key: *key,
                id,
            }
            .into());
        }
    }
    Ok(())
}

/// Anything a registry can be built from.
///
/// Conversion of an already-built [`VendorListDocument`] is the identity:
/// it is neither re-validated nor modified.
pub trait IntoVendorList {
    /// Produce a validated document.
    fn into_vendor_list(self) -> Result<VendorListDocument>;
}

impl IntoVendorList for VendorListDocument {
    fn into_vendor_list(self) -> Result<VendorListDocument> {
        Ok(self)
    }
}

impl IntoVendorList for RawVendorList {
    fn into_vendor_list(self) -> Result<VendorListDocument> {
        VendorListDocument::try_from(self)
    }
}

impl IntoVendorList for Value {
    fn into_vendor_list(self) -> Result<VendorListDocument> {
        let raw: RawVendorList = serde_json::from_value(self).map_err(Malformed::Parse)?;
        VendorListDocument::try_from(raw)
    }
}

impl IntoVendorList for &str {
    fn into_vendor_list(self) -> Result<VendorListDocument> {
        VendorListDocument::from_json(self)
    }
}

impl IntoVendorList for String {
    fn into_vendor_list(self) -> Result<VendorListDocument> {
        VendorListDocument::from_json(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "gvlSpecificationVersion": 3,
            "vendorListVersion": 42,
            "tcfPolicyVersion": 5,
            "lastUpdated": "2024-03-07T16:05:29Z",
            "purposes": {
                "1": {"id": 1, "name": "Store and/or access information on a device", "description": "Cookies and identifiers."},
                "2": {"id": 2, "name": "Use limited data to select advertising", "description": "Basic ads."},
                "3": {"id": 3, "name": "Create profiles for personalised advertising", "description": "Profiles."}
            },
            "specialPurposes": {
                "1": {"id": 1, "name": "Ensure security, prevent and detect fraud", "description": "Security."}
            },
            "features": {
                "1": {"id": 1, "name": "Match and combine data from other data sources", "description": "Matching."}
            },
            "specialFeatures": {
                "1": {"id": 1, "name": "Use precise geolocation data", "description": "Geolocation."}
            },
            "stacks": {
                "1": {"id": 1, "purposes": [2, 3], "specialFeatures": [], "name": "Advertising", "description": "Ads stack."}
            },
            "dataCategories": {
                "1": {"id": 1, "name": "IP addresses", "description": "Network address."}
            },
            "vendors": {
                "1": {
                    "id": 1, "name": "Exponential Interactive",
                    "purposes": [1, 2], "legIntPurposes": [], "flexiblePurposes": [2],
                    "specialPurposes": [1], "features": [1], "specialFeatures": [],
                    "dataDeclaration": [1], "cookieMaxAgeSeconds": 31536000
                },
                "2": {
                    "id": 2, "name": "Captify",
                    "purposes": [1], "legIntPurposes": [2], "flexiblePurposes": [],
                    "specialPurposes": [], "features": [], "specialFeatures": [1]
                }
            }
        })
    }

    #[test]
    fn test_document_from_valid_json() {
        let document = sample().into_vendor_list().expect("valid document");

        assert_eq!(document.gvl_specification_version(), 3);
        assert_eq!(document.vendor_list_version(), 42);
        assert_eq!(document.tcf_policy_version(), 5);
        assert_eq!(document.purposes().len(), 3);
        assert_eq!(document.vendors().len(), 2);
        assert_eq!(document.vendors(), document.full_vendor_list());

        let vendor = document.vendor(VendorId::new(1)).expect("vendor 1");
        assert_eq!(vendor.declared(Declaration::FlexiblePurpose), &[2]);
        assert_eq!(vendor.extra.get("cookieMaxAgeSeconds"), Some(&json!(31_536_000)));
    }

    #[test]
    fn test_dangling_purpose_reference() {
        let mut value = sample();
        value["vendors"]["1"]["purposes"] = json!([1, 99]);

        let err = value.into_vendor_list().expect_err("dangling reference");
        assert!(matches!(
            err,
            GvlError::MalformedVendorList(Malformed::DanglingVendorReference {
                vendor_id,
                field: "purposes",
                declared_id: 99,
            }) if vendor_id == VendorId::new(1)
        ));
    }

    #[test]
    fn test_dangling_reference_per_category() {
        let cases = [
            ("legIntPurposes", "legIntPurposes"),
            ("specialPurposes", "specialPurposes"),
            ("features", "features"),
            ("specialFeatures", "specialFeatures"),
            ("dataDeclaration", "dataDeclaration"),
        ];

        for (json_field, expected) in cases {
            let mut value = sample();
            value["vendors"]["2"][json_field] = json!([7]);

            let err = value.into_vendor_list().expect_err("dangling reference");
            match err {
                GvlError::MalformedVendorList(Malformed::DanglingVendorReference {
                    vendor_id,
                    field,
                    declared_id,
                }) => {
                    assert_eq!(vendor_id, VendorId::new(2));
                    assert_eq!(field, expected);
                    assert_eq!(declared_id, 7);
                }
                other => panic!("unexpected error for {json_field}: {other}"),
            }
        }
    }

    #[test]
    fn test_dangling_stack_reference() {
        let mut value = sample();
        value["stacks"]["1"]["purposes"] = json!([2, 11]);

        let err = value.into_vendor_list().expect_err("dangling stack reference");
        assert!(matches!(
            err,
            GvlError::MalformedVendorList(Malformed::DanglingStackReference {
                stack_id: 1,
                field: "purposes",
                declared_id: 11,
            })
        ));
    }

    #[test]
    fn test_missing_version_fields() {
        for field in ["gvlSpecificationVersion", "vendorListVersion", "tcfPolicyVersion"] {
            let mut value = sample();
            value.as_object_mut().expect("object").remove(field);

            let err = value.into_vendor_list().expect_err("missing version");
            assert!(
                matches!(err, GvlError::MissingVersionInfo { field: f } if f == field),
                "expected MissingVersionInfo for {field}"
            );
        }
    }

    #[test]
    fn test_missing_required_table() {
        let mut value = sample();
        value.as_object_mut().expect("object").remove("features");

        let err = value.into_vendor_list().expect_err("missing table");
        assert!(matches!(
            err,
            GvlError::MalformedVendorList(Malformed::MissingTable { table: "features" })
        ));
    }

    #[test]
    fn test_optional_tables_absent_vs_empty() {
        let mut absent = sample();
        let object = absent.as_object_mut().expect("object");
        object.remove("dataCategories");
        object.remove("specialFeatures");
        object["vendors"]["1"]
            .as_object_mut()
            .expect("vendor object")
            .remove("dataDeclaration");
        object["vendors"]["2"]["specialFeatures"] = json!([]);

        let document = absent.into_vendor_list().expect("valid without optional tables");
        assert!(document.data_categories().is_none());
        assert!(document.special_features().is_none());
        assert!(!document.defines(Declaration::SpecialFeature, 1));

        let mut empty = sample();
        empty["dataCategories"] = json!({});
        empty["vendors"]["1"]["dataDeclaration"] = json!([]);
        let document = empty.into_vendor_list().expect("valid with empty table");
        assert_eq!(document.data_categories().map(BTreeMap::len), Some(0));
    }

    #[test]
    fn test_data_declaration_without_table_is_dangling() {
        let mut value = sample();
        value.as_object_mut().expect("object").remove("dataCategories");

        let err = value.into_vendor_list().expect_err("dangling data category");
        assert!(matches!(
            err,
            GvlError::MalformedVendorList(Malformed::DanglingVendorReference {
                field: "dataDeclaration",
                declared_id: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_key_mismatch() {
        let mut value = sample();
        value["vendors"]["2"]["id"] = json!(3);

        let err = value.into_vendor_list().expect_err("key mismatch");
        assert!(matches!(
            err,
            GvlError::MalformedVendorList(Malformed::KeyMismatch {
                table: "vendors",
                key: 2,
                id: 3,
            })
        ));
    }

    #[test]
    fn test_invalid_json() {
        let err = "{ not json".into_vendor_list().expect_err("invalid json");
        assert!(matches!(
            err,
            GvlError::MalformedVendorList(Malformed::Parse(_))
        ));
    }

    #[test]
    fn test_deleted_vendor_kept_only_in_full_list() {
        let mut value = sample();
        value["vendors"]["2"]["deletedDate"] = json!("2023-06-01T00:00:00Z");

        let document = value.into_vendor_list().expect("valid document");
        assert_eq!(document.full_vendor_list().len(), 2);
        assert_eq!(document.vendors().len(), 1);
        assert!(document.vendor(VendorId::new(2)).is_none());
    }

    #[test]
    fn test_into_vendor_list_is_identity_for_documents() {
        let document = sample().into_vendor_list().expect("valid document");
        let narrowed = document.narrowed_to(&BTreeSet::from([VendorId::new(2)]));

        let again = narrowed.clone().into_vendor_list().expect("identity");
        assert_eq!(again, narrowed);
        assert_eq!(again.vendors().len(), 1);
    }

    #[test]
    fn test_to_json_matches_input() {
        let input = sample();
        let document = input.clone().into_vendor_list().expect("valid document");
        let exported = document.to_json().expect("export");
        assert_eq!(exported, input);
    }

    #[test]
    fn test_to_json_keeps_absent_declaration_lists_absent() {
        let input = json!({
            "gvlSpecificationVersion": 3,
            "vendorListVersion": 9,
            "tcfPolicyVersion": 5,
            "lastUpdated": "2024-03-07T16:05:29Z",
            "purposes": {
                "1": {"id": 1, "name": "Store and/or access information on a device", "description": "Cookies."},
                "2": {"id": 2, "name": "Use limited data to select advertising", "description": "Basic ads."}
            },
            "specialPurposes": {},
            "features": {},
            "stacks": {
                "1": {"id": 1, "purposes": [1, 2], "name": "Storage and ads", "description": "Stack."}
            },
            "vendors": {
                "1": {"id": 1, "name": "One", "purposes": [1, 2]}
            }
        });

        let document = input.clone().into_vendor_list().expect("valid document");
        let vendor = document.vendor(VendorId::new(1)).expect("vendor 1");
        assert_eq!(vendor.declared(Declaration::ConsentPurpose), &[1, 2]);
        assert!(vendor.declared(Declaration::LegitimateInterestPurpose).is_empty());
        assert!(document.stacks()[&1].special_feature_ids().is_empty());

        assert_eq!(document.to_json().expect("export"), input);
    }

    #[test]
    fn test_timestamps_export_source_text() {
        let mut input = sample();
        input["lastUpdated"] = json!("2024-03-07T16:05:29.000+00:00");
        input["vendors"]["2"]["deletedDate"] = json!("2023-06-01T02:00:00+02:00");

        let document = input.clone().into_vendor_list().expect("valid document");
        assert_eq!(
            document.last_updated(),
            "2024-03-07T16:05:29Z"
                .parse::<DateTime<Utc>>()
                .expect("valid timestamp")
        );

        let deleted = document.full_vendor_list()[&VendorId::new(2)]
            .deleted_date
            .as_ref()
            .expect("deleted date");
        assert_eq!(deleted.as_str(), "2023-06-01T02:00:00+02:00");
        assert_eq!(deleted.parsed().to_rfc3339(), "2023-06-01T00:00:00+00:00");

        assert_eq!(document.to_json().expect("export"), input);
    }

    #[test]
    fn test_invalid_timestamp_is_rejected() {
        let mut value = sample();
        value["lastUpdated"] = json!("last tuesday");

        let err = value.into_vendor_list().expect_err("invalid timestamp");
        assert!(matches!(
            err,
            GvlError::MalformedVendorList(Malformed::Parse(_))
        ));
    }

    #[test]
    fn test_declaration_field_names() {
        let names: Vec<&str> = Declaration::ALL.iter().map(|d| d.field_name()).collect();
        assert_eq!(
            names,
            vec![
                "purposes",
                "legIntPurposes",
                "flexiblePurposes",
                "specialPurposes",
                "features",
                "specialFeatures"
            ]
        );
        assert_eq!(Declaration::Feature.to_string(), "features");
    }
}
