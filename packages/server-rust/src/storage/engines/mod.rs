//! `EntityStore` implementations.

#[cfg(test)]
pub(crate) mod flaky;
mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
