//! Errors surfaced by the data-access layer.
//!
//! Every service returns [`Result`], so a missing document is always
//! distinguishable from a backend failure.  Presentation code that prefers
//! the old "nothing on failure" behaviour converts with [`OrAbsent`].

use cosmea_shared::CryptoError;
use cosmea_store::{DocumentRef, StoreError};
use thiserror::Error;

use crate::session::SessionError;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("No document at {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("{field} '{value}' is already taken")]
    Conflict { field: &'static str, value: String },

    #[error("Document key '{key}' does not match record id '{record}'")]
    IdMismatch { key: String, record: String },

    #[error("User '{0}' cannot befriend themselves")]
    SelfFriendship(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Credential error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl DataError {
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

/// Attach the document address to a store `NotFound`.
pub(crate) trait AtDocument<T> {
    fn at(self, doc: &DocumentRef) -> Result<T>;
}

impl<T> AtDocument<T> for std::result::Result<T, StoreError> {
    fn at(self, doc: &DocumentRef) -> Result<T> {
        self.map_err(|e| match e {
            StoreError::NotFound => DataError::not_found(&doc.collection, &doc.id),
            other => DataError::Store(other),
        })
    }
}

/// Degrade a data-access result to an optional value, logging the failure.
pub trait OrAbsent<T> {
    fn or_absent(self, operation: &'static str) -> Option<T>;
}

impl<T> OrAbsent<T> for Result<T> {
    fn or_absent(self, operation: &'static str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) if e.is_not_found() => {
                tracing::debug!(operation, error = %e, "nothing found");
                None
            }
            Err(e) => {
                tracing::warn!(operation, error = %e, "data access failed");
                None
            }
        }
    }
}
