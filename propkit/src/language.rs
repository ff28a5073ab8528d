//! The active language and its ordered change subscribers.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use parking_lot::{Mutex, RwLock};
use tracing::info;

use crate::types::Language;

/// Callback invoked with the new language after every switch.
pub type LanguageCallback = Arc<dyn Fn(Language) + Send + Sync>;

/// Handle returned by [`LanguageRegistry::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    callback: LanguageCallback,
}

/// Holds the current language and notifies subscribers, in first
/// registration order, whenever [`switch`](Self::switch) is called.
pub struct LanguageRegistry {
    default_language: Language,
    current: RwLock<Language>,
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl LanguageRegistry {
    pub fn new(default_language: Language) -> Self {
        Self {
            default_language,
            current: RwLock::new(default_language),
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn current(&self) -> Language {
        *self.current.read()
    }

    pub fn default_language(&self) -> Language {
        self.default_language
    }

    /// Adds a subscriber. Subscribing the same `Arc` twice returns the
    /// original id and leaves the order untouched.
    pub fn subscribe(&self, callback: LanguageCallback) -> SubscriptionId {
        let mut subscribers = self.subscribers.lock();
        if let Some(existing) = subscribers
            .iter()
            .find(|s| Arc::ptr_eq(&s.callback, &callback))
        {
            return existing.id;
        }
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        subscribers.push(Subscriber { id, callback });
        id
    }

    /// Convenience wrapper around [`subscribe`](Self::subscribe) for closures.
    pub fn subscribe_fn<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Language) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(callback))
    }

    /// Removes a subscriber. Returns `false` if the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Sets the language (`None` means the default) and runs every
    /// subscriber before returning the previous language.
    ///
    /// Subscribers run even when the language is unchanged. No lock is held
    /// while they run, so they may call back into the registry.
    pub fn switch(&self, language: Option<Language>) -> Language {
        let next = language.unwrap_or(self.default_language);
        let previous = std::mem::replace(&mut *self.current.write(), next);
        info!(from = %previous, to = %next, "switching language");

        let callbacks: Vec<LanguageCallback> = self
            .subscribers
            .lock()
            .iter()
            .map(|s| Arc::clone(&s.callback))
            .collect();
        for callback in callbacks {
            callback(next);
        }
        previous
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

impl std::fmt::Debug for LanguageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageRegistry")
            .field("default_language", &self.default_language)
            .field("current", &self.current())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_default_language() {
        let registry = LanguageRegistry::default();
        assert_eq!(registry.current(), Language::ZhCn);
        assert_eq!(registry.default_language(), Language::ZhCn);
    }

    #[test]
    fn test_switch_returns_previous_and_none_means_default() {
        let registry = LanguageRegistry::new(Language::ZhCn);
        assert_eq!(registry.switch(Some(Language::EnUs)), Language::ZhCn);
        assert_eq!(registry.current(), Language::EnUs);
        assert_eq!(registry.switch(None), Language::EnUs);
        assert_eq!(registry.current(), Language::ZhCn);
    }

    #[test]
    fn test_subscribers_run_in_registration_order() {
        let registry = LanguageRegistry::default();
        let calls = Arc::new(Mutex::new(Vec::new()));
        for name in ["cache", "caption", "view"] {
            let calls = Arc::clone(&calls);
            registry.subscribe_fn(move |lang| calls.lock().push(format!("{name}:{lang}")));
        }

        registry.switch(Some(Language::EnUs));
        assert_eq!(
            *calls.lock(),
            vec!["cache:en_US", "caption:en_US", "view:en_US"]
        );
    }

    #[test]
    fn test_same_language_still_notifies() {
        let registry = LanguageRegistry::default();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        registry.subscribe_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.switch(Some(Language::ZhCn));
        registry.switch(Some(Language::ZhCn));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_duplicate_subscription_is_a_no_op() {
        let registry = LanguageRegistry::default();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let callback: LanguageCallback = Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let first = registry.subscribe(Arc::clone(&callback));
        let second = registry.subscribe(Arc::clone(&callback));
        assert_eq!(first, second);
        assert_eq!(registry.subscriber_count(), 1);

        registry.switch(Some(Language::EnUs));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let registry = LanguageRegistry::default();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let id = registry.subscribe_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        registry.switch(Some(Language::EnUs));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_subscriber_can_read_registry() {
        let registry = Arc::new(LanguageRegistry::default());
        let seen = Arc::new(Mutex::new(None));
        let weak = Arc::downgrade(&registry);
        let seen_in_callback = Arc::clone(&seen);
        registry.subscribe_fn(move |_| {
            if let Some(registry) = weak.upgrade() {
                *seen_in_callback.lock() = Some(registry.current());
            }
        });

        registry.switch(Some(Language::EnUs));
        assert_eq!(*seen.lock(), Some(Language::EnUs));
    }
}
