//! # Lovebucket Core
//!
//! Per-user LIKE and LOVE collections built from deduplicated copies of
//! source media.
//!
//! ## Overview
//!
//! - **Copy Store**: one copy per `(source, destination)`, named
//!   deterministically so racing writers collide instead of duplicating
//! - **Collections**: membership is the set of copy links in a destination
//! - **Toggle Engine**: the like/love state machine, recomputed from
//!   membership on every call and keeping every loved item liked
//! - **Service**: toggles, button rendering, cascade hooks, provisioning
//!
//! ## Feature Flags
//!
//! - `database`: Postgres adapters for copy links and the collection locator
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use lovebucket_core::{
//!     LikeLoveService, LocalFileCopier, TogglePolicy,
//!     infra::{
//!         InMemoryCollectionLocator, InMemoryCopyLinkRepository,
//!         InMemoryMediaCatalog,
//!     },
//! };
//! use lovebucket_model::{MediaID, UserID};
//!
//! async fn like_once() -> lovebucket_core::Result<()> {
//!     let media = Arc::new(InMemoryMediaCatalog::new());
//!     let service = LikeLoveService::new(
//!         Arc::new(InMemoryCollectionLocator::new()),
//!         media.clone(),
//!         Arc::new(InMemoryCopyLinkRepository::new()),
//!         Arc::new(LocalFileCopier::new("./data/copies".into())),
//!         TogglePolicy::default(),
//!     );
//!
//!     let user = UserID::new();
//!     let item = MediaID::new();
//!     media.register(item, "image/png", "/srv/media/cat.png").await;
//!
//!     service.provision_user(user).await?;
//!     let outcome = service.toggle_like(user, item).await?;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Collection handles over the copy store
pub mod collection;

/// Deduplicated copies and their links
pub mod copy_store;

/// Error types
pub mod error;

/// In-memory and Postgres adapters
pub mod infra;

/// Keyed per-destination mutexes
pub mod locks;

/// Settings the core acts on
pub mod policy;

/// Interfaces to external collaborators
pub mod ports;

/// Service façade
pub mod service;

/// Like/love state machine
pub mod toggle;

#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use collection::Collection;
pub use copy_store::{CopyStore, Destination, LocalFileCopier};
pub use error::{CopyError, LikeError, Result};
pub use locks::DestinationLocks;
pub use policy::{MediaRules, TogglePolicy};
pub use service::{ButtonQuery, LikeLoveService, ProvisionReport};
pub use toggle::{ButtonState, ToggleEngine, ToggleOutcome};
