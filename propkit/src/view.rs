//! Singleton-per-type view instances and the "view changed" notification.

use std::{cell::RefCell, collections::HashMap, fmt::Display, str::FromStr, sync::Arc};

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tracing::{info, warn};

use crate::error::Error;

/// The logical views of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewType {
    #[default]
    Splash,
    Main,
    Game,
}

impl ViewType {
    pub const ALL: [ViewType; 3] = [ViewType::Splash, ViewType::Main, ViewType::Game];
}

impl Display for ViewType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewType::Splash => write!(f, "splash"),
            ViewType::Main => write!(f, "main"),
            ViewType::Game => write!(f, "game"),
        }
    }
}

impl FromStr for ViewType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "splash" => Ok(ViewType::Splash),
            "main" => Ok(ViewType::Main),
            "game" => Ok(ViewType::Game),
            other => Err(Error::UnknownView(other.to_string())),
        }
    }
}

/// Anything the registry can hold. Implemented by the shell's views.
pub trait View: Send + Sync {
    fn name(&self) -> &str;
}

/// Builds the single instance of one view type.
pub type ViewFactory<V> = Arc<dyn Fn() -> Result<Arc<V>, Error> + Send + Sync>;
/// Named "view changed" callback.
pub type ViewCallback = Arc<dyn Fn() + Send + Sync>;

enum SlotState<V: ?Sized> {
    Empty,
    Building,
    Ready(Arc<V>),
}

// Re-entrant so a factory that asks for its own type reaches the `Building`
// check instead of deadlocking.
type Slot<V> = Arc<ReentrantMutex<RefCell<SlotState<V>>>>;

/// Tracks the active view and caches one instance per [`ViewType`].
///
/// Instances come from factories declared per type. Construction goes
/// through a per-type slot lock, so two threads racing on first access still
/// produce a single instance. A factory may query the registry; asking for
/// its own view type fails with [`Error::ViewReentered`].
pub struct ViewRegistry<V: ?Sized + View> {
    factories: RwLock<HashMap<ViewType, ViewFactory<V>>>,
    slots: Mutex<HashMap<ViewType, Slot<V>>>,
    views: RwLock<HashMap<ViewType, Arc<V>>>,
    current: RwLock<ViewType>,
    callbacks: Mutex<Vec<(String, ViewCallback)>>,
}

impl<V: ?Sized + View> ViewRegistry<V> {
    pub fn new(initial: ViewType) -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
            slots: Mutex::new(HashMap::new()),
            views: RwLock::new(HashMap::new()),
            current: RwLock::new(initial),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Declares the factory for a view type, replacing any previous one.
    pub fn declare<F>(&self, view_type: ViewType, factory: F)
    where
        F: Fn() -> Result<Arc<V>, Error> + Send + Sync + 'static,
    {
        self.factories.write().insert(view_type, Arc::new(factory));
    }

    pub fn current_type(&self) -> ViewType {
        *self.current.read()
    }

    pub fn is_registered(&self, view_type: ViewType) -> bool {
        self.views.read().contains_key(&view_type)
    }

    /// Stores an instance for a type. An existing instance is overwritten.
    pub fn register(&self, view_type: ViewType, view: Arc<V>) {
        let mut views = self.views.write();
        if views.contains_key(&view_type) {
            warn!(view = %view_type, "duplicate view type, old view will be overwritten");
        }
        views.insert(view_type, view);
    }

    /// Returns the active view, constructing and registering it on first use.
    pub fn get_current(&self) -> Result<Arc<V>, Error> {
        self.materialize(self.current_type())
    }

    /// Makes each type a valid [`change`](Self::change) target up front.
    pub fn prewarm(&self, view_types: &[ViewType]) -> Result<(), Error> {
        for &view_type in view_types {
            self.materialize(view_type)?;
        }
        Ok(())
    }

    fn materialize(&self, view_type: ViewType) -> Result<Arc<V>, Error> {
        if let Some(view) = self.views.read().get(&view_type) {
            return Ok(Arc::clone(view));
        }
        let view = self.construct_or_fetch(view_type)?;
        let mut views = self.views.write();
        Ok(Arc::clone(views.entry(view_type).or_insert(view)))
    }

    fn construct_or_fetch(&self, view_type: ViewType) -> Result<Arc<V>, Error> {
        let factory = self
            .factories
            .read()
            .get(&view_type)
            .cloned()
            .ok_or_else(|| Error::NoViewFactory(view_type.to_string()))?;
        let slot = Arc::clone(
            self.slots
                .lock()
                .entry(view_type)
                .or_insert_with(|| Arc::new(ReentrantMutex::new(RefCell::new(SlotState::Empty)))),
        );

        let guard = slot.lock();
        match &*guard.borrow() {
            SlotState::Ready(view) => return Ok(Arc::clone(view)),
            SlotState::Building => {
                warn!(view = %view_type, "view factory requested its own view");
                return Err(Error::ViewReentered(view_type.to_string()));
            }
            SlotState::Empty => {}
        }

        info!(view = %view_type, "creating view");
        guard.replace(SlotState::Building);
        match factory() {
            Ok(view) => {
                guard.replace(SlotState::Ready(Arc::clone(&view)));
                Ok(view)
            }
            Err(e) => {
                guard.replace(SlotState::Empty);
                Err(e)
            }
        }
    }

    /// Switches the active view and fires every named callback once, in
    /// registration order.
    ///
    /// Types that were never materialised or registered are rejected with
    /// `false` and nothing happens.
    pub fn change(&self, view_type: ViewType) -> bool {
        if !self.is_registered(view_type) {
            warn!(view = %view_type, "view is not registered, changing view failed");
            return false;
        }
        *self.current.write() = view_type;

        let callbacks: Vec<ViewCallback> = self
            .callbacks
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback();
        }
        true
    }

    /// Adds a named callback. Empty keys are ignored and the first
    /// registration for a key wins. Returns whether it was added.
    pub fn on_change<F>(&self, key: &str, callback: F) -> bool
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut callbacks = self.callbacks.lock();
        if key.is_empty() || callbacks.iter().any(|(existing, _)| existing == key) {
            return false;
        }
        callbacks.push((key.to_string(), Arc::new(callback)));
        true
    }

    /// Removes a named callback. Returns whether one was removed.
    pub fn off_change(&self, key: &str) -> bool {
        let mut callbacks = self.callbacks.lock();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| existing != key);
        callbacks.len() != before
    }
}

impl<V: ?Sized + View> Default for ViewRegistry<V> {
    fn default() -> Self {
        Self::new(ViewType::default())
    }
}
