//! tutorhub server: a REST API over entity stores, with lifecycle events
//! published per entity kind.

pub mod api;
pub mod app;
pub mod config;
pub mod events;
pub mod network;
pub mod storage;
pub mod traits;

pub use app::AppServices;
pub use traits::EntityStore;
