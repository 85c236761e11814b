//! Reverse lookup tables from purpose/feature ids to vendor ids.
//!
//! Indices are derived data. They are always rebuilt in full from the
//! working vendor table and never patched incrementally.

use crate::document::{Declaration, Vendor};
use std::collections::{BTreeMap, BTreeSet};
use tcf_core::VendorId;

/// Map from a declared id to the vendors declaring it.
pub type VendorIndex = BTreeMap<u32, BTreeSet<VendorId>>;

/// Build one reverse index using `extractor` to read each vendor's ids.
pub fn build_index<'a, I, F>(vendors: I, extractor: F) -> VendorIndex
where
    I: IntoIterator<Item = &'a Vendor>,
    F: Fn(&Vendor) -> &[u32],
{
    let mut index = VendorIndex::new();
    for vendor in vendors {
        for &id in extractor(vendor) {
            index.entry(id).or_default().insert(vendor.id);
        }
    }
    index
}

/// The six reverse indices over a working vendor table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorIndices {
    consent_purposes: VendorIndex,
    legitimate_interest_purposes: VendorIndex,
    flexible_purposes: VendorIndex,
    special_purposes: VendorIndex,
    features: VendorIndex,
    special_features: VendorIndex,
}

impl VendorIndices {
    /// Build every index from the given vendors.
    #[must_use]
    pub fn build(vendors: &BTreeMap<VendorId, Vendor>) -> Self {
        let build = |declaration: Declaration| {
            build_index(vendors.values(), |vendor| vendor.declared(declaration))
        };

        Self {
            consent_purposes: build(Declaration::ConsentPurpose),
            legitimate_interest_purposes: build(Declaration::LegitimateInterestPurpose),
            flexible_purposes: build(Declaration::FlexiblePurpose),
            special_purposes: build(Declaration::SpecialPurpose),
            features: build(Declaration::Feature),
            special_features: build(Declaration::SpecialFeature),
        }
    }

    /// The index for one declaration category.
    #[must_use]
    pub fn get(&self, declaration: Declaration) -> &VendorIndex {
        match declaration {
            Declaration::ConsentPurpose => &self.consent_purposes,
            Declaration::LegitimateInterestPurpose => &self.legitimate_interest_purposes,
            Declaration::FlexiblePurpose => &self.flexible_purposes,
            Declaration::SpecialPurpose => &self.special_purposes,
            Declaration::Feature => &self.features,
            Declaration::SpecialFeature => &self.special_features,
        }
    }

    /// Vendors declaring `id` under `declaration`, `None` if nobody does.
    #[must_use]
    pub fn vendors_with(&self, declaration: Declaration, id: u32) -> Option<&BTreeSet<VendorId>> {
        self.get(declaration).get(&id)
    }
}
