//! Lifecycle hook points and the event names they are republished under.

use std::fmt;

use crate::types::EntityId;

/// Persistence-layer write transitions that observers can hook into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleHook {
    /// A new entity was inserted.
    AfterCreate,
    /// An existing entity was saved with new contents.
    AfterUpdate,
    /// An entity was deleted.
    AfterDestroy,
}

impl LifecycleHook {
    /// Every hook point, in registration order.
    pub const ALL: [Self; 3] = [Self::AfterCreate, Self::AfterUpdate, Self::AfterDestroy];

    /// Returns the hook name used in log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AfterCreate => "after_create",
            Self::AfterUpdate => "after_update",
            Self::AfterDestroy => "after_destroy",
        }
    }

    /// Event a transition is published under.
    ///
    /// Creates and updates both map to [`LifecycleEvent::Save`]; subscribers
    /// cannot tell them apart.
    #[must_use]
    pub fn event(self) -> LifecycleEvent {
        match self {
            Self::AfterCreate | Self::AfterUpdate => LifecycleEvent::Save,
            Self::AfterDestroy => LifecycleEvent::Remove,
        }
    }
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic event name seen by subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Save,
    Remove,
}

impl LifecycleEvent {
    /// General channel name (`save` / `remove`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Save => "save",
            Self::Remove => "remove",
        }
    }

    /// Channel name scoped to a single entity (`save:<id>`).
    #[must_use]
    pub fn scoped(self, id: &EntityId) -> String {
        format!("{}:{}", self.as_str(), id)
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
