//! Factory for creating fully-wired [`EntityStore`] instances.
//!
//! [`open_stores`] is the dependency injection point: it picks the backend
//! named by [`StorageConfig::url`], creates one store per entity kind over a
//! shared connection, and runs each store's one-time initialization.

use std::sync::Arc;

use tracing::info;
use tutorhub_core::EntityKind;

use crate::storage::engines::MemoryStore;
use crate::traits::EntityStore;

/// Backend selection and connection settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// `memory://` or a `postgres://` connection URL.
    pub url: String,
    /// Upper bound on pooled database connections.
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: "memory://".to_string(),
            max_connections: 10,
        }
    }
}

/// Backend kind parsed from [`StorageConfig::url`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl StorageBackend {
    /// Classifies a storage URL by its scheme.
    ///
    /// # Errors
    ///
    /// Returns an error for unrecognised schemes.
    pub fn from_url(url: &str) -> anyhow::Result<Self> {
        let scheme = url.split_once("://").map_or(url, |(scheme, _)| scheme);
        match scheme {
            "memory" | "mem" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => anyhow::bail!("unsupported storage scheme: {other}"),
        }
    }
}

/// One store per entity kind, sharing a backend.
#[derive(Clone)]
pub struct Stores {
    pub datasets: Arc<dyn EntityStore>,
    pub tutor_students: Arc<dyn EntityStore>,
}

impl Stores {
    /// Fresh in-memory stores, used by tests and the `memory://` backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            datasets: Arc::new(MemoryStore::new(EntityKind::DATASET)),
            tutor_students: Arc::new(MemoryStore::new(EntityKind::TUTOR_STUDENT)),
        }
    }

    fn all(&self) -> [&Arc<dyn EntityStore>; 2] {
        [&self.datasets, &self.tutor_students]
    }
}

/// Opens and initializes the stores selected by `config`.
///
/// # Errors
///
/// Returns an error if the URL scheme is unsupported, the backend is not
/// compiled in, or initialization fails.
pub async fn open_stores(config: &StorageConfig) -> anyhow::Result<Stores> {
    let stores = match StorageBackend::from_url(&config.url)? {
        StorageBackend::Memory => Stores::in_memory(),
        StorageBackend::Postgres => open_postgres(config).await?,
    };

    for store in stores.all() {
        store.initialize().await?;
        info!(kind = %store.kind(), "store initialized");
    }
    Ok(stores)
}

#[cfg(feature = "postgres")]
async fn open_postgres(config: &StorageConfig) -> anyhow::Result<Stores> {
    use crate::storage::engines::PostgresStore;

    let pool = PostgresStore::connect_pool(&config.url, config.max_connections).await?;
    Ok(Stores {
        datasets: Arc::new(PostgresStore::new(EntityKind::DATASET, pool.clone())),
        tutor_students: Arc::new(PostgresStore::new(EntityKind::TUTOR_STUDENT, pool)),
    })
}

#[cfg(not(feature = "postgres"))]
#[allow(clippy::unused_async)]
async fn open_postgres(_config: &StorageConfig) -> anyhow::Result<Stores> {
    anyhow::bail!("PostgreSQL storage requires the `postgres` feature")
}
