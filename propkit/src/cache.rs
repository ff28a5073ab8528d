//! Compute-once cache of coerced property tables, one per resource type.
//!
//! A table is loaded on first access and served from memory afterwards.
//! Tables for `i18n` resource types are dropped when the language changes so
//! the next read reloads them from the new language's file.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc, Weak,
        atomic::{AtomicUsize, Ordering},
    },
};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::{
    coerce::coerce_entry,
    error::Error,
    language::{LanguageRegistry, SubscriptionId},
    locator::ResourceLocator,
    properties::PropertiesFile,
    traits::{Parser, TemplateSource},
    types::{Color, ConfigEntry, Language, ResourceType, TypeTag, TypedValue},
};

/// All coerced entries of one loaded resource file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTable {
    pub resource_type: ResourceType,
    pub path: PathBuf,
    /// Language the file was resolved for; `None` for `classpath` resources.
    pub language: Option<Language>,
    entries: Vec<ConfigEntry>,
    index: HashMap<String, usize>,
}

impl ConfigTable {
    fn new(resource_type: ResourceType, path: PathBuf, language: Option<Language>) -> Self {
        Self {
            resource_type,
            path,
            language,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Adds an entry; a later entry with the same stripped key replaces the earlier one.
    fn insert(&mut self, entry: ConfigEntry) {
        match self.index.get(&entry.key) {
            Some(&position) => self.entries[position] = entry,
            None => {
                self.index.insert(entry.key.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&TypedValue> {
        self.index
            .get(key)
            .and_then(|&position| self.entries[position].value.as_ref())
    }

    pub fn entry(&self, key: &str) -> Option<&ConfigEntry> {
        self.index.get(key).map(|&position| &self.entries[position])
    }

    /// Entries in file order.
    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lazily loads and serves typed configuration per [`ResourceType`].
pub struct ConfigCache {
    locator: ResourceLocator,
    languages: Arc<LanguageRegistry>,
    tables: RwLock<HashMap<ResourceType, Arc<ConfigTable>>>,
    loads: AtomicUsize,
}

impl ConfigCache {
    pub fn new(locator: ResourceLocator, languages: Arc<LanguageRegistry>) -> Self {
        Self {
            locator,
            languages,
            tables: RwLock::new(HashMap::new()),
            loads: AtomicUsize::new(0),
        }
    }

    /// Registers the invalidation hook with the language registry.
    ///
    /// Must run before any subscriber that reads localized values, otherwise
    /// those subscribers see the previous language for one switch.
    pub fn subscribe_invalidation(cache: &Arc<ConfigCache>) -> SubscriptionId {
        let weak: Weak<ConfigCache> = Arc::downgrade(cache);
        cache.languages.subscribe_fn(move |_| {
            if let Some(cache) = weak.upgrade() {
                cache.invalidate_localized();
            }
        })
    }

    pub fn locator(&self) -> &ResourceLocator {
        &self.locator
    }

    pub fn languages(&self) -> &Arc<LanguageRegistry> {
        &self.languages
    }

    /// Looks up a stripped key.
    ///
    /// A blank key or a missing resource type yields `Ok(None)` without any
    /// I/O. An unknown key in a loaded table is also `Ok(None)`.
    pub fn get(
        &self,
        key: &str,
        resource_type: Option<ResourceType>,
    ) -> Result<Option<TypedValue>, Error> {
        let Some(resource_type) = resource_type else {
            return Ok(None);
        };
        if key.trim().is_empty() {
            return Ok(None);
        }
        let table = self.table(resource_type)?;
        Ok(table.get(key).cloned())
    }

    /// Returns the loaded table for a resource type, loading it if needed.
    pub fn table(&self, resource_type: ResourceType) -> Result<Arc<ConfigTable>, Error> {
        if let Some(table) = self.tables.read().get(&resource_type) {
            return Ok(Arc::clone(table));
        }

        // The lock is released while loading: i18n resolution reads the UI table.
        let loaded = Arc::new(self.load(resource_type)?);
        Ok(self.store(loaded))
    }

    /// Caches a freshly loaded table unless the language moved on while it
    /// was loading; a stale table is still handed to the caller once.
    fn store(&self, loaded: Arc<ConfigTable>) -> Arc<ConfigTable> {
        if let Some(language) = loaded.language {
            let current = self.languages.current();
            if language != current {
                debug!(
                    resource = %loaded.resource_type,
                    %language,
                    %current,
                    "language changed during load, not caching"
                );
                return loaded;
            }
        }
        let mut tables = self.tables.write();
        Arc::clone(tables.entry(loaded.resource_type).or_insert(loaded))
    }

    fn load(&self, resource_type: ResourceType) -> Result<ConfigTable, Error> {
        let language = self.languages.current();
        let path = self
            .locator
            .resolve(&resource_type.descriptor(), self, language)?;
        let file = PropertiesFile::read_from(&path)?;

        let mut table = ConfigTable::new(
            resource_type,
            path,
            resource_type.is_localized().then_some(language),
        );
        for property in file.iter() {
            table.insert(coerce_entry(
                &property.key,
                Some(&property.value),
                &self.locator,
            )?);
        }

        self.loads.fetch_add(1, Ordering::Relaxed);
        info!(
            resource = %resource_type,
            path = %table.path.display(),
            entries = table.len(),
            "loaded configuration"
        );
        Ok(table)
    }

    /// Drops every table whose descriptor uses the `i18n` scheme and returns
    /// how many were dropped. `classpath` tables stay cached.
    pub fn invalidate_localized(&self) -> usize {
        let mut tables = self.tables.write();
        let before = tables.len();
        tables.retain(|resource_type, _| !resource_type.is_localized());
        let dropped = before - tables.len();
        debug!(dropped, "invalidated localized configuration");
        dropped
    }

    pub fn is_loaded(&self, resource_type: ResourceType) -> bool {
        self.tables.read().contains_key(&resource_type)
    }

    /// Number of file loads performed since construction.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn get_str(&self, key: &str, resource_type: ResourceType) -> Result<Option<String>, Error> {
        self.typed(key, resource_type, TypeTag::Str, |value| match value {
            TypedValue::Str(value) => Some(value),
            _ => None,
        })
    }

    pub fn get_int(&self, key: &str, resource_type: ResourceType) -> Result<Option<i64>, Error> {
        self.typed(key, resource_type, TypeTag::Int, |value| value.as_int())
    }

    pub fn get_float(&self, key: &str, resource_type: ResourceType) -> Result<Option<f64>, Error> {
        self.typed(key, resource_type, TypeTag::Float, |value| value.as_float())
    }

    pub fn get_bool(&self, key: &str, resource_type: ResourceType) -> Result<Option<bool>, Error> {
        self.typed(key, resource_type, TypeTag::Bool, |value| value.as_bool())
    }

    pub fn get_color(
        &self,
        key: &str,
        resource_type: ResourceType,
    ) -> Result<Option<Color>, Error> {
        self.typed(key, resource_type, TypeTag::Color, |value| value.as_color())
    }

    pub fn get_path(
        &self,
        key: &str,
        resource_type: ResourceType,
    ) -> Result<Option<PathBuf>, Error> {
        self.typed(key, resource_type, TypeTag::File, |value| {
            value.as_path().map(Path::to_path_buf)
        })
    }

    fn typed<T>(
        &self,
        key: &str,
        resource_type: ResourceType,
        expected: TypeTag,
        extract: impl FnOnce(TypedValue) -> Option<T>,
    ) -> Result<Option<T>, Error> {
        let Some(value) = self.get(key, Some(resource_type))? else {
            return Ok(None);
        };
        let found = value.tag();
        extract(value)
            .map(Some)
            .ok_or_else(|| Error::TypeMismatch {
                key: key.to_string(),
                expected,
                found,
            })
    }
}

impl TemplateSource for ConfigCache {
    fn template_value(&self, key: &str) -> Result<Option<TypedValue>, Error> {
        self.get(key, Some(ResourceType::UiConfig))
    }
}

impl std::fmt::Debug for ConfigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut loaded: Vec<String> = self.tables.read().keys().map(ToString::to_string).collect();
        loaded.sort();
        f.debug_struct("ConfigCache")
            .field("root", &self.locator.root())
            .field("loaded", &loaded)
            .field("loads", &self.load_count())
            .finish()
    }
}
