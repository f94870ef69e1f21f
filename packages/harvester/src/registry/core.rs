//! Source registry mapping jurisdiction ids to configurations and adapters.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, OnceLock, PoisonError, RwLock};

use super::builtin::builtin_configs;
use super::overlay::load_overlays;
use crate::config::{DEFAULT_SOURCES_DIR, SOURCES_DIR_ENV};
use crate::error::{HarvesterError, Result};
use crate::sources::{ApiSource, HtmlSource, NyLegislationSource, StatuteSource, UslmSource};
use crate::types::{JurisdictionSummary, SourceConfig, SourceType};

type ConfigTable = BTreeMap<String, Arc<SourceConfig>>;

/// Registry of jurisdiction configurations.
///
/// The table is built lazily, exactly once, from the built-in definitions
/// followed by overlay files from `sources_dir`. Overlay entries replace
/// built-in entries with the same jurisdiction id. [`register`](Self::register)
/// mutates the built table and never triggers a reload.
pub struct SourceRegistry {
    sources_dir: Option<PathBuf>,
    configs: OnceLock<RwLock<ConfigTable>>,
}

impl SourceRegistry {
    /// Create a registry that overlays files from `sources_dir`.
    #[must_use]
    pub fn new(sources_dir: impl Into<PathBuf>) -> Self {
        Self {
            sources_dir: Some(sources_dir.into()),
            configs: OnceLock::new(),
        }
    }

    /// Create a registry holding only the built-in definitions.
    #[must_use]
    pub fn builtin_only() -> Self {
        Self {
            sources_dir: None,
            configs: OnceLock::new(),
        }
    }

    /// Create a registry whose overlay directory comes from `STATUTE_SOURCES_DIR`,
    /// falling back to `./sources`.
    #[must_use]
    pub fn from_env() -> Self {
        let dir = std::env::var_os(SOURCES_DIR_ENV)
            .map_or_else(|| PathBuf::from(DEFAULT_SOURCES_DIR), PathBuf::from);
        Self::new(dir)
    }

    /// Overlay directory, if any.
    #[must_use]
    pub fn sources_dir(&self) -> Option<&Path> {
        self.sources_dir.as_deref()
    }

    fn table(&self) -> &RwLock<ConfigTable> {
        self.configs.get_or_init(|| RwLock::new(self.load()))
    }

    fn load(&self) -> ConfigTable {
        let mut table = ConfigTable::new();
        for config in builtin_configs() {
            table.insert(config.jurisdiction.clone(), Arc::new(config));
        }

        let Some(dir) = &self.sources_dir else {
            return table;
        };
        for config in load_overlays(dir) {
            if table.contains_key(&config.jurisdiction) {
                tracing::debug!(
                    jurisdiction = %config.jurisdiction,
                    "Overlay replaces built-in configuration"
                );
            }
            table.insert(config.jurisdiction.clone(), Arc::new(config));
        }

        tracing::debug!(jurisdictions = table.len(), "Source registry loaded");
        table
    }

    /// Look up a configuration; the id is matched case-insensitively.
    #[must_use]
    pub fn get_config(&self, jurisdiction: &str) -> Option<Arc<SourceConfig>> {
        let table = self.table().read().unwrap_or_else(PoisonError::into_inner);
        table.get(&jurisdiction.trim().to_lowercase()).cloned()
    }

    /// Snapshot of every configuration, keyed by jurisdiction id.
    #[must_use]
    pub fn get_all_configs(&self) -> BTreeMap<String, Arc<SourceConfig>> {
        self.table()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Discovery records for every jurisdiction, sorted by id.
    #[must_use]
    pub fn list_jurisdictions(&self) -> Vec<JurisdictionSummary> {
        let table = self.table().read().unwrap_or_else(PoisonError::into_inner);
        table
            .values()
            .map(|config| JurisdictionSummary::from(config.as_ref()))
            .collect()
    }

    /// Insert or replace a configuration.
    ///
    /// The id is lowercased and written into `config.jurisdiction`. The
    /// configuration is validated first.
    pub fn register(&self, jurisdiction: &str, mut config: SourceConfig) -> Result<()> {
        let key = jurisdiction.trim().to_lowercase();
        config.jurisdiction.clone_from(&key);
        config.validate()?;

        let mut table = self.table().write().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(jurisdiction = %key, "Registering source configuration");
        table.insert(key, Arc::new(config));
        Ok(())
    }

    /// Build the adapter for a jurisdiction.
    ///
    /// Dispatch by jurisdiction id comes before dispatch by source type:
    /// New York's API is served by its dedicated client.
    pub fn get_source(&self, jurisdiction: &str) -> Result<Box<dyn StatuteSource>> {
        let config = self
            .get_config(jurisdiction)
            .ok_or_else(|| HarvesterError::ConfigNotFound {
                jurisdiction: jurisdiction.to_string(),
            })?;
        create_source(config)
    }
}

/// Construct the adapter for a configuration.
pub fn create_source(config: Arc<SourceConfig>) -> Result<Box<dyn StatuteSource>> {
    let source: Box<dyn StatuteSource> = match (config.jurisdiction.as_str(), config.source_type) {
        ("us-ny", SourceType::Api) => Box::new(NyLegislationSource::new(config)?),
        (_, SourceType::Uslm) => Box::new(UslmSource::new(config)?),
        (_, SourceType::Html) => Box::new(HtmlSource::new(config)?),
        (_, SourceType::Api) => Box::new(ApiSource::new(config)?),
    };
    Ok(source)
}

static GLOBAL_REGISTRY: LazyLock<SourceRegistry> = LazyLock::new(SourceRegistry::from_env);

/// The process-wide registry.
#[must_use]
pub fn global() -> &'static SourceRegistry {
    &GLOBAL_REGISTRY
}

/// Look up a configuration in the process-wide registry.
#[must_use]
pub fn get_config(jurisdiction: &str) -> Option<Arc<SourceConfig>> {
    global().get_config(jurisdiction)
}

/// Every configuration in the process-wide registry.
#[must_use]
pub fn get_all_configs() -> BTreeMap<String, Arc<SourceConfig>> {
    global().get_all_configs()
}

/// Build an adapter from the process-wide registry.
pub fn get_source(jurisdiction: &str) -> Result<Box<dyn StatuteSource>> {
    global().get_source(jurisdiction)
}

/// Discovery records from the process-wide registry.
#[must_use]
pub fn list_jurisdictions() -> Vec<JurisdictionSummary> {
    global().list_jurisdictions()
}

/// Insert or replace a configuration in the process-wide registry.
pub fn register_source(jurisdiction: &str, config: SourceConfig) -> Result<()> {
    global().register(jurisdiction, config)
}
