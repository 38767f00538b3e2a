//! Application composition: stores plus the lifecycle wiring on top of them.

use std::sync::Arc;

use tracing::info;

use crate::events::{EventHub, LifecycleEventBroadcaster};
use crate::storage::Stores;

/// Everything request handlers and background consumers share.
#[derive(Clone)]
pub struct AppServices {
    pub stores: Stores,
    /// `save`/`remove` events for `TutorStudent` writes.
    pub tutor_student_events: Arc<EventHub>,
}

impl AppServices {
    /// Attaches a lifecycle broadcaster to the `TutorStudent` store.
    ///
    /// Call once per set of stores: each call hooks another broadcaster and
    /// every write would then be emitted once per call.
    #[must_use]
    pub fn wire(stores: Stores) -> Self {
        let tutor_student_events = LifecycleEventBroadcaster::attach(stores.tutor_students.as_ref());
        info!(
            kind = tutor_student_events.name(),
            "lifecycle events wired"
        );
        Self {
            stores,
            tutor_student_events,
        }
    }

    /// Fresh in-memory stores, already wired.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::wire(Stores::in_memory())
    }
}
