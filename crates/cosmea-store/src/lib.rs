//! # cosmea-store
//!
//! Document storage for the Cosmea client.
//!
//! The crate defines the [`DocumentStore`] contract the data-access layer is
//! written against (collection + key addressing, full writes, field merges,
//! equality queries and atomic list-field mutation) together with two
//! backends:
//!
//! - [`MemoryStore`], a process-local store used by tests and previews;
//! - [`Database`], an embedded SQLite store that keeps every document as a
//!   JSON body keyed by `(collection, id)`.
//!
//! The domain models persisted through the contract live in [`models`].

pub mod database;
pub mod document;
pub mod documents;
pub mod memory;
pub mod migrations;
pub mod models;

mod error;

pub use database::Database;
pub use document::{Document, DocumentRef, DocumentStore, Filter, Snapshot};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use models::*;
