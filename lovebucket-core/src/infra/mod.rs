//! Adapters for the ports in `crate::ports`.

pub mod memory;
#[cfg(feature = "database")]
pub mod postgres;

pub use memory::{
    InMemoryCollectionLocator, InMemoryCopyLinkRepository, InMemoryMediaCatalog,
};
#[cfg(feature = "database")]
pub use postgres::{PostgresCollectionLocator, PostgresCopyLinkRepository};
