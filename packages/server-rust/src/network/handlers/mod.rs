//! Axum handlers and the state they share.

pub mod datasets;
pub mod health;

pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::Arc;
use std::time::Instant;

use crate::app::AppServices;
use crate::network::ShutdownController;

/// State extracted by every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
    pub shutdown: Arc<ShutdownController>,
    /// Used for the uptime in the health payload.
    pub start_time: Instant,
}

impl AppState {
    #[must_use]
    pub fn new(services: AppServices, shutdown: Arc<ShutdownController>) -> Self {
        Self {
            services,
            shutdown,
            start_time: Instant::now(),
        }
    }
}
