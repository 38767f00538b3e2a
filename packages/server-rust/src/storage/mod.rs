//! Persistence layer for the `tutorhub` server.
//!
//! - [`EntityStore`](crate::EntityStore) implementations live in [`engines`]:
//!   an in-memory [`MemoryStore`] and, behind the `postgres` feature, a
//!   JSONB-backed `PostgresStore`
//! - [`LifecycleObserver`] is the typed hook surface stores fire after each
//!   write, with [`CompositeLifecycleObserver`] for fan-out
//! - [`open_stores`] builds one store per entity kind from [`StorageConfig`]

pub mod engines;
pub mod error;
pub mod factory;
pub mod observer;

pub use engines::*;
pub use error::StoreError;
pub use factory::{open_stores, StorageBackend, StorageConfig, Stores};
pub use observer::{CompositeLifecycleObserver, LifecycleHooks, LifecycleObserver};
