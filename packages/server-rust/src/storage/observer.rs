//! Lifecycle observer trait and composite implementation.
//!
//! Defines [`LifecycleObserver`] for reacting to entity writes within an
//! [`EntityStore`](crate::EntityStore), [`CompositeLifecycleObserver`] which
//! fans out notifications to multiple observers, and [`LifecycleHooks`], the
//! registry a store embeds to fire them.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::warn;
use tutorhub_core::{Entity, LifecycleHook};

/// Observer for entity writes within an `EntityStore`.
///
/// Called synchronously after the write has been applied. Observers return
/// nothing: they can neither fail nor roll back the write that triggered them.
///
/// Used as `Arc<dyn LifecycleObserver>`.
pub trait LifecycleObserver: Send + Sync {
    /// Called after a new entity is inserted.
    fn after_create(&self, entity: &Entity);

    /// Called after an existing entity is saved with new contents.
    fn after_update(&self, entity: &Entity);

    /// Called after an entity is deleted.
    fn after_destroy(&self, entity: &Entity);
}

/// Composite observer that fans out to multiple observers.
///
/// A panicking observer is logged and skipped; the remaining observers still
/// receive the notification.
#[derive(Default, Clone)]
pub struct CompositeLifecycleObserver {
    observers: Vec<Arc<dyn LifecycleObserver>>,
}

impl CompositeLifecycleObserver {
    /// Creates a composite observer with the given list of observers.
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn LifecycleObserver>>) -> Self {
        Self { observers }
    }

    /// Adds an observer after construction.
    pub fn add(&mut self, observer: Arc<dyn LifecycleObserver>) {
        self.observers.push(observer);
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Dispatches `hook` for `entity` to every observer.
    pub fn notify(&self, hook: LifecycleHook, entity: &Entity) {
        for observer in &self.observers {
            let outcome = catch_unwind(AssertUnwindSafe(|| match hook {
                LifecycleHook::AfterCreate => observer.after_create(entity),
                LifecycleHook::AfterUpdate => observer.after_update(entity),
                LifecycleHook::AfterDestroy => observer.after_destroy(entity),
            }));
            if outcome.is_err() {
                warn!(
                    hook = hook.as_str(),
                    id = %entity.id(),
                    "lifecycle observer panicked; write is unaffected"
                );
            }
        }
    }
}

impl LifecycleObserver for CompositeLifecycleObserver {
    fn after_create(&self, entity: &Entity) {
        self.notify(LifecycleHook::AfterCreate, entity);
    }

    fn after_update(&self, entity: &Entity) {
        self.notify(LifecycleHook::AfterUpdate, entity);
    }

    fn after_destroy(&self, entity: &Entity) {
        self.notify(LifecycleHook::AfterDestroy, entity);
    }
}

/// Observer registry embedded in each store.
///
/// Registration swaps in a new observer list, so firing never contends with
/// concurrent registration.
#[derive(Default)]
pub struct LifecycleHooks {
    observers: ArcSwap<CompositeLifecycleObserver>,
}

impl LifecycleHooks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an observer to the registry.
    pub fn register(&self, observer: Arc<dyn LifecycleObserver>) {
        self.observers.rcu(|current| {
            let mut next = CompositeLifecycleObserver::clone(current);
            next.add(Arc::clone(&observer));
            next
        });
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.load().len()
    }

    /// Whether no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.load().is_empty()
    }

    /// Notifies every registered observer of `hook`.
    pub fn fire(&self, hook: LifecycleHook, entity: &Entity) {
        self.observers.load().notify(hook, entity);
    }
}
