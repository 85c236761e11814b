//! In-memory vendor list registry with query support.

use crate::{
    document::{Declaration, IntoVendorList, Vendor, VendorListDocument, VendorMap},
    error::{FetchError, GvlError, LanguageLoadError, Result},
    index::VendorIndices,
    language::LanguageFile,
    loader::{DirectoryLoader, GvlLoader, HttpLoader},
};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tcf_core::{ConsentLanguages, LanguageCode, TcfConfig, VendorId, VendorListVersion};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Lifecycle of a registry.
#[derive(Debug, Clone)]
pub enum RegistryState {
    /// Waiting for a vendor list; queries fail with [`GvlError::NotReady`]
    Constructing,
    /// A validated vendor list is installed
    Ready(Snapshot),
}

/// Everything a reader needs, swapped as one unit.
#[derive(Debug, Clone)]
pub struct Snapshot {
    document: Arc<VendorListDocument>,
    indices: Arc<VendorIndices>,
    language: LanguageCode,
}

impl Snapshot {
    fn new(document: VendorListDocument, language: LanguageCode) -> Self {
        let indices = VendorIndices::build(document.vendors());
        Self {
            document: Arc::new(document),
            indices: Arc::new(indices),
            language,
        }
    }

    /// The installed document.
    #[must_use]
    pub fn document(&self) -> &Arc<VendorListDocument> {
        &self.document
    }

    /// Indices over the working vendor table.
    #[must_use]
    pub fn indices(&self) -> &Arc<VendorIndices> {
        &self.indices
    }

    /// Language of the document's display strings.
    #[must_use]
    pub fn language(&self) -> &LanguageCode {
        &self.language
    }
}

/// Outcome of a successful [`GvlRegistry::change_language`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageChange {
    /// The new strings are installed
    Applied,
    /// The registry already was in that language
    Unchanged,
    /// A newer language change was issued while this one was in flight;
    /// its result was discarded
    Superseded,
}

/// Vendor list registry answering which vendors declare what.
///
/// The registry is cheap to clone; clones share state. Readers always see
/// a complete snapshot: mutations build the replacement first and swap it
/// in one step.
#[derive(Clone)]
pub struct GvlRegistry {
    /// Current lifecycle state, also used to wake [`Self::ready`] waiters
    state: Arc<watch::Sender<RegistryState>>,
    /// Parsed language files, keyed by language
    language_cache: Arc<RwLock<HashMap<LanguageCode, Arc<LanguageFile>>>>,
    /// Token of the most recent language change request
    language_requests: Arc<AtomicU64>,
    /// Source for vendor lists and language files
    loader: Option<Arc<dyn GvlLoader>>,
}

impl GvlRegistry {
    /// Create a registry that has no vendor list yet.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(RegistryState::Constructing);
        Self {
            state: Arc::new(state),
            language_cache: Arc::new(RwLock::new(HashMap::new())),
            language_requests: Arc::new(AtomicU64::new(0)),
            loader: None,
        }
    }

    /// Use `loader` for vendor list and language fetches.
    #[must_use]
    pub fn with_loader(mut self, loader: Arc<dyn GvlLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Build a ready registry from an available document.
    ///
    /// # Errors
    /// Returns error if `source` is not a valid vendor list.
    pub fn from_document(source: impl IntoVendorList) -> Result<Self> {
        let registry = Self::new();
        registry.install(source.into_vendor_list()?)?;
        Ok(registry)
    }

    /// Fetch a vendor list through `loader` and build a ready registry.
    ///
    /// # Errors
    /// Returns error if fetching fails or the document is invalid.
    pub async fn from_loader(
        loader: Arc<dyn GvlLoader>,
        version: VendorListVersion,
    ) -> Result<Self> {
        let registry = Self::new().with_loader(loader);
        registry.load(version).await?;
        Ok(registry)
    }

    /// Build a ready registry from configuration.
    ///
    /// Uses the local mirror when `gvl.definitions_dir` is set, HTTP
    /// otherwise, then switches to `gvl.default_language`.
    ///
    /// # Errors
    /// Returns error if no source is configured, loading fails, or the
    /// default language cannot be applied.
    pub async fn from_config(config: &TcfConfig) -> Result<Self> {
        let loader: Arc<dyn GvlLoader> = match &config.gvl.definitions_dir {
            Some(dir) => Arc::new(
                DirectoryLoader::with_config(dir, config.gvl.clone())
                    .map_err(GvlError::VendorListFetch)?,
            ),
            None => Arc::new(HttpLoader::from_config(config).map_err(GvlError::VendorListFetch)?),
        };

        let registry = Self::from_loader(loader, VendorListVersion::Latest).await?;
        registry
            .change_language(config.gvl.default_language.as_str())
            .await?;
        Ok(registry)
    }

    /// Fetch, validate and install a vendor list.
    ///
    /// On failure the registry stays in [`RegistryState::Constructing`].
    ///
    /// # Errors
    /// Returns error if no loader is configured, fetching fails, the
    /// document is invalid, or a vendor list is already installed.
    pub async fn load(&self, version: VendorListVersion) -> Result<()> {
        let loader = self.loader()?;

        let json = loader
            .fetch_vendor_list(version)
            .await
            .map_err(GvlError::VendorListFetch)?;
        let document = VendorListDocument::from_json(&json)?;

        if let VendorListVersion::Specific(requested) = version {
            if requested != document.vendor_list_version() {
                warn!(
                    requested,
                    received = document.vendor_list_version(),
                    "vendor list version differs from the requested one"
                );
            }
        }

        self.install(document)
    }

    /// Wait until the registry is ready.
    pub async fn ready(&self) {
        let mut receiver = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = receiver
            .wait_for(|state| matches!(state, RegistryState::Ready(_)))
            .await;
    }

    /// Whether a vendor list is installed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(*self.state.borrow(), RegistryState::Ready(_))
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RegistryState {
        self.state.borrow().clone()
    }

    /// The installed document.
    ///
    /// # Errors
    /// Returns [`GvlError::NotReady`] before a vendor list is installed.
    pub fn vendor_list(&self) -> Result<Arc<VendorListDocument>> {
        Ok(self.snapshot()?.document)
    }

    /// The current, possibly narrowed, vendor table.
    pub fn working_vendors(&self) -> Result<VendorMap> {
        Ok(self.snapshot()?.document.vendors().clone())
    }

    /// Ids of the current working vendors.
    pub fn vendor_ids(&self) -> Result<BTreeSet<VendorId>> {
        Ok(self.snapshot()?.document.vendors().keys().copied().collect())
    }

    /// Look up a working vendor.
    pub fn vendor(&self, vendor_id: VendorId) -> Result<Option<Vendor>> {
        Ok(self.snapshot()?.document.vendor(vendor_id).cloned())
    }

    /// Indices over the working vendor table.
    pub fn indices(&self) -> Result<Arc<VendorIndices>> {
        Ok(self.snapshot()?.indices)
    }

    /// Language of the installed display strings.
    pub fn language(&self) -> Result<LanguageCode> {
        Ok(self.snapshot()?.language)
    }

    /// Supported consent languages with the active one.
    pub fn consent_languages(&self) -> Result<ConsentLanguages> {
        Ok(ConsentLanguages::with_active(self.snapshot()?.language))
    }

    /// Plain-data export in the published shape; `vendors` is the full list.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        self.snapshot()?.document.to_json()
    }

    /// [`Self::to_json`] rendered as a string.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_json()?)?)
    }

    /// Working vendors declaring `id` under `declaration`.
    ///
    /// Ids the document does not define yield an empty map.
    pub fn vendors_with(&self, declaration: Declaration, id: u32) -> Result<VendorMap> {
        let snapshot = self.snapshot()?;
        let vendors = snapshot.document.vendors();

        Ok(snapshot
            .indices
            .vendors_with(declaration, id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|vendor_id| vendors.get(vendor_id))
                    .map(|vendor| (vendor.id, vendor.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Vendors asking consent for a purpose.
    pub fn vendors_with_consent_purpose(&self, purpose_id: u32) -> Result<VendorMap> {
        self.vendors_with(Declaration::ConsentPurpose, purpose_id)
    }

    /// Vendors claiming legitimate interest for a purpose.
    pub fn vendors_with_legitimate_interest_purpose(&self, purpose_id: u32) -> Result<VendorMap> {
        self.vendors_with(Declaration::LegitimateInterestPurpose, purpose_id)
    }

    /// Vendors declaring a purpose as flexible.
    pub fn vendors_with_flexible_purpose(&self, purpose_id: u32) -> Result<VendorMap> {
        self.vendors_with(Declaration::FlexiblePurpose, purpose_id)
    }

    /// Vendors declaring a special purpose.
    pub fn vendors_with_special_purpose(&self, special_purpose_id: u32) -> Result<VendorMap> {
        self.vendors_with(Declaration::SpecialPurpose, special_purpose_id)
    }

    /// Vendors declaring a feature.
    pub fn vendors_with_feature(&self, feature_id: u32) -> Result<VendorMap> {
        self.vendors_with(Declaration::Feature, feature_id)
    }

    /// Vendors declaring a special feature.
    pub fn vendors_with_special_feature(&self, special_feature_id: u32) -> Result<VendorMap> {
        self.vendors_with(Declaration::SpecialFeature, special_feature_id)
    }

    /// Restrict the working vendor table to `vendor_ids`.
    ///
    /// Each call intersects against the full vendor list, so a later call may
    /// bring back vendors an earlier one excluded. Ids absent from the list
    /// are ignored. All indices are rebuilt.
    ///
    /// # Errors
    /// Returns [`GvlError::NotReady`] before a vendor list is installed.
    pub fn narrow_vendors_to<I>(&self, vendor_ids: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<VendorId>,
    {
        let requested: BTreeSet<VendorId> = vendor_ids.into_iter().map(Into::into).collect();
        let mut outcome = Err(GvlError::NotReady);

        self.state.send_if_modified(|state| {
            let RegistryState::Ready(snapshot) = state else {
                return false;
            };

            let document = snapshot.document.narrowed_to(&requested);
            let indices = VendorIndices::build(document.vendors());

            info!(
                requested = requested.len(),
                working = document.vendors().len(),
                "narrowed working vendor table"
            );

            snapshot.document = Arc::new(document);
            snapshot.indices = Arc::new(indices);
            outcome = Ok(());
            true
        });

        outcome
    }

    /// Switch display strings to another language.
    ///
    /// The previous strings stay visible until the new ones are fully
    /// applied. When calls overlap, only the most recently issued one can
    /// take effect; older ones resolve with [`LanguageChange::Superseded`].
    /// Ids, declarations, the working table and the indices never change.
    ///
    /// # Errors
    /// Returns [`GvlError::UnsupportedLanguage`] for codes outside the
    /// consent language table, [`GvlError::NotReady`] before a vendor list is
    /// installed, and [`GvlError::LanguageLoad`] if the file cannot be
    /// fetched, parsed or fully applied. The registry is unchanged on error.
    pub async fn change_language(&self, code: &str) -> Result<LanguageChange> {
        let language = LanguageCode::new(code)?;
        let current = self.snapshot()?.language;
        let token = self.language_requests.fetch_add(1, Ordering::SeqCst) + 1;

        if current == language {
            debug!(language = %language, "language already active");
            return Ok(LanguageChange::Unchanged);
        }

        let file = self.language_file(&language).await?;

        let mut outcome = Err(GvlError::NotReady);
        self.state.send_if_modified(|state| {
            let RegistryState::Ready(snapshot) = state else {
                return false;
            };

            if self.language_requests.load(Ordering::SeqCst) != token {
                debug!(language = %language, token, "discarding superseded language change");
                outcome = Ok(LanguageChange::Superseded);
                return false;
            }

            match file.apply_to(&snapshot.document, &language) {
                Ok(document) => {
                    snapshot.document = Arc::new(document);
                    snapshot.language = language.clone();
                    outcome = Ok(LanguageChange::Applied);
                    true
                }
                Err(e) => {
                    outcome = Err(e.into());
                    false
                }
            }
        });

        if outcome.is_ok() {
            self.cache_language(language.clone(), file);
        }
        if matches!(outcome, Ok(LanguageChange::Applied)) {
            info!(language = %language, "changed vendor list language");
        }

        outcome
    }

    /// Drop cached language files other than the active one.
    pub fn clear_language_cache(&self) {
        let active = self.snapshot().ok().map(|snapshot| snapshot.language);
        let mut cache = self
            .language_cache
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        cache.retain(|language, _| Some(language) == active.as_ref());
    }

    fn install(&self, document: VendorListDocument) -> Result<()> {
        let language = LanguageCode::default_language();
        let seed = Arc::new(LanguageFile::from_document(&document, &language));
        let vendor_list_version = document.vendor_list_version();
        let working = document.vendors().len();
        let snapshot = Snapshot::new(document, language.clone());

        let mut outcome = Ok(());
        self.state.send_if_modified(|state| {
            if let RegistryState::Ready(current) = state {
                outcome = Err(GvlError::AlreadyLoaded {
                    vendor_list_version: current.document.vendor_list_version(),
                });
                return false;
            }
            *state = RegistryState::Ready(snapshot);
            true
        });
        outcome?;

        self.cache_language(language, seed);
        info!(vendor_list_version, working, "vendor list registry ready");
        Ok(())
    }

    fn snapshot(&self) -> Result<Snapshot> {
        match &*self.state.borrow() {
            RegistryState::Ready(snapshot) => Ok(snapshot.clone()),
            RegistryState::Constructing => Err(GvlError::NotReady),
        }
    }

    fn loader(&self) -> Result<&Arc<dyn GvlLoader>> {
        self.loader.as_ref().ok_or_else(|| {
            GvlError::VendorListFetch(FetchError::NotConfigured(
                "registry has no loader".to_string(),
            ))
        })
    }

    async fn language_file(&self, language: &LanguageCode) -> Result<Arc<LanguageFile>> {
        let cached = self
            .language_cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(language)
            .cloned();
        if let Some(file) = cached {
            debug!(language = %language, "using cached language file");
            return Ok(file);
        }

        let loader = self.loader.as_ref().ok_or_else(|| LanguageLoadError::Fetch {
            language: language.clone(),
            source: FetchError::NotConfigured("registry has no loader".to_string()),
        })?;

        let json = loader
            .fetch_language(language)
            .await
            .map_err(|source| LanguageLoadError::Fetch {
                language: language.clone(),
                source,
            })?;

        Ok(Arc::new(LanguageFile::from_json(language, &json)?))
    }

    fn cache_language(&self, language: LanguageCode, file: Arc<LanguageFile>) {
        self.language_cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(language, file);
    }
}

impl Default for GvlRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GvlRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GvlRegistry")
            .field("state", &*self.state.borrow())
            .field("has_loader", &self.loader.is_some())
            .finish_non_exhaustive()
    }
}
