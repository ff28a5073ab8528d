//! The process-scoped entry point that wires the registries together.
//!
//! Build one [`Context`] at startup and pass it by reference to whatever
//! needs configuration. The builder fixes the notification order: the cache
//! invalidation hook is always the first language subscriber, so every hook
//! added afterwards observes the new language's values.

use std::{
    env,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    cache::ConfigCache,
    error::Error,
    language::{LanguageRegistry, SubscriptionId},
    locator::{DeploymentMode, RESOURCE_ROOT_ENV, ResourceLocator},
    types::{Language, ResourceDescriptor, ResourceType, TypedValue},
};

/// Initial language override, e.g. `en_US`.
pub const LANGUAGE_ENV: &str = "PROPKIT_LANGUAGE";

/// Configures and builds a [`Context`].
///
/// # Example
///
/// ```rust,no_run
/// use propkit::{Context, Language};
///
/// let context = Context::builder()
///     .resource_root("resources")
///     .language(Language::EnUs)
///     .build();
/// let width = context.config("window.width")?;
/// # Ok::<(), propkit::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    resource_root: Option<PathBuf>,
    deployment: Option<DeploymentMode>,
    default_language: Language,
    language: Option<Language>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `PROPKIT_RESOURCE_ROOT` and `PROPKIT_LANGUAGE`. The deployment
    /// probe (`PROPKIT_BUNDLE_DIR`) runs at build time if no root is set.
    pub fn from_env() -> Result<Self, Error> {
        let mut builder = Self::new();
        if let Some(root) = env::var_os(RESOURCE_ROOT_ENV).filter(|root| !root.is_empty()) {
            builder.resource_root = Some(PathBuf::from(root));
        }
        if let Ok(language) = env::var(LANGUAGE_ENV) {
            if !language.trim().is_empty() {
                builder.language = Some(language.parse()?);
            }
        }
        Ok(builder)
    }

    /// Explicit resource root; takes precedence over the deployment mode.
    pub fn resource_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.resource_root = Some(root.into());
        self
    }

    pub fn deployment(mut self, mode: DeploymentMode) -> Self {
        self.deployment = Some(mode);
        self
    }

    /// Language used at startup and by `switch_language(None)`.
    pub fn default_language(mut self, language: Language) -> Self {
        self.default_language = language;
        self
    }

    /// Language switched to once the context is wired up.
    pub fn language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn build(self) -> Context {
        let locator = match (self.resource_root, self.deployment) {
            (Some(root), _) => ResourceLocator::new(root),
            (None, Some(mode)) => ResourceLocator::from_mode(&mode),
            (None, None) => ResourceLocator::from_mode(&DeploymentMode::detect()),
        };
        let languages = Arc::new(LanguageRegistry::new(self.default_language));
        let cache = Arc::new(ConfigCache::new(locator, Arc::clone(&languages)));

        // First subscriber, ahead of any UI refresh hook.
        let invalidation = ConfigCache::subscribe_invalidation(&cache);

        if let Some(language) = self.language {
            languages.switch(Some(language));
        }

        Context {
            languages,
            cache,
            invalidation,
        }
    }
}

/// Shared handle to the language registry and configuration cache.
#[derive(Debug, Clone)]
pub struct Context {
    languages: Arc<LanguageRegistry>,
    cache: Arc<ConfigCache>,
    invalidation: SubscriptionId,
}

impl Context {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    pub fn languages(&self) -> &Arc<LanguageRegistry> {
        &self.languages
    }

    pub fn cache(&self) -> &Arc<ConfigCache> {
        &self.cache
    }

    pub fn resource_root(&self) -> &Path {
        self.cache.locator().root()
    }

    /// Subscription id of the cache invalidation hook.
    pub fn invalidation_subscription(&self) -> SubscriptionId {
        self.invalidation
    }

    /// Reads a key from the UI config.
    pub fn config(&self, key: &str) -> Result<Option<TypedValue>, Error> {
        self.cache.get(key, Some(ResourceType::UiConfig))
    }

    pub fn config_in(
        &self,
        key: &str,
        resource_type: ResourceType,
    ) -> Result<Option<TypedValue>, Error> {
        self.cache.get(key, Some(resource_type))
    }

    /// Localized text from the main-UI bundle.
    pub fn i18n_main(&self, key: &str) -> Result<Option<String>, Error> {
        self.cache.get_str(key, ResourceType::I18nMain)
    }

    /// Localized text from the in-game bundle.
    pub fn i18n_game(&self, key: &str) -> Result<Option<String>, Error> {
        self.cache.get_str(key, ResourceType::I18nGame)
    }

    pub fn current_language(&self) -> Language {
        self.languages.current()
    }

    /// Switches language and runs every hook; returns the previous language.
    pub fn switch_language(&self, language: Option<Language>) -> Language {
        self.languages.switch(language)
    }

    /// Adds a language hook. It runs after the cache invalidation hook.
    pub fn on_language_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Language) + Send + Sync + 'static,
    {
        self.languages.subscribe_fn(callback)
    }

    /// Resolves a descriptor against the current language.
    pub fn resolve(&self, descriptor: &ResourceDescriptor) -> Result<PathBuf, Error> {
        self.cache
            .locator()
            .resolve(descriptor, self.cache.as_ref(), self.current_language())
    }
}
