//! Domain model structs persisted as documents.
//!
//! Field names on the wire are camelCase so the documents keep the layout
//! of the `users`, `profiles`, `servers` and `channels/{serverId}`
//! collections.

use cosmea_shared::crypto::hash_password;
use cosmea_shared::{ChannelId, CryptoError, ServerId, UserId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;
use crate::error::{Result, StoreError};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// An account.  The document key always equals `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: UserId,
    pub username: String,
    /// Argon2id PHC string; the plaintext password is never persisted.
    pub password_hash: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub joined_servers: Vec<ServerId>,
    #[serde(default)]
    pub friends: Vec<UserId>,
    /// Users who sent this user a request that is not yet accepted.
    #[serde(default)]
    pub pending_friends: Vec<UserId>,
    /// Push-notification token, written separately by a field update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_token: Option<String>,
}

impl UserData {
    /// Build a fresh account with a generated id and a hashed password.
    pub fn new(
        username: impl Into<String>,
        password: &str,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> std::result::Result<Self, CryptoError> {
        Ok(Self::with_id(UserId::generate(), username, hash_password(password)?, email, phone))
    }

    /// Build an account around an existing id and password hash.
    pub fn with_id(
        id: UserId,
        username: impl Into<String>,
        password_hash: String,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            password_hash,
            email: email.into(),
            phone: phone.into(),
            joined_servers: Vec::new(),
            friends: Vec::new(),
            pending_friends: Vec::new(),
            fcm_token: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Display-facing data, stored in `profiles` under the owning user's id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub id: UserId,
    pub display_name: String,
    #[serde(default)]
    pub dob: Option<String>,
    /// Avatar image URL.
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl ProfileData {
    /// The profile created alongside a new account.
    pub fn for_new_user(user: &UserData) -> Self {
        Self {
            id: user.id.clone(),
            display_name: user.username.clone(),
            dob: None,
            avatar: None,
            bio: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Server (guild)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServerData {
    pub id: ServerId,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub members: Vec<UserId>,
    /// Ids only; the channel documents live in `channels/{serverId}`.
    #[serde(default)]
    pub channels: Vec<ChannelId>,
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// A channel.  Its parent server is implied by the collection it is read
/// from, not stored in the document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelData {
    pub id: ChannelId,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Encode a model as a document body.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "model did not serialize to an object: {other}"
        ))),
    }
}

/// Decode a document body into a model.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}
