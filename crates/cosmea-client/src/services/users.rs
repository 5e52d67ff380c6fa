//! Account reads and writes over the `users` collection.
//!
//! Profile and friend operations are implemented on the same service in
//! [`super::profiles`] and [`super::friends`].

use std::sync::Arc;

use cosmea_shared::constants::{
    FIELD_EMAIL, FIELD_FCM_TOKEN, FIELD_USERNAME, PROFILES_COLLECTION, USERS_COLLECTION,
};
use cosmea_shared::crypto::verify_password;
use cosmea_shared::UserId;
use cosmea_store::models::{from_document, to_document};
use cosmea_store::{Document, DocumentRef, DocumentStore, Filter, ProfileData, UserData};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{AtDocument, DataError, Result};

/// Data access for accounts, profiles and the friend graph.
///
/// Every operation is a plain sequence of store calls.  Read-then-write
/// sequences (update, delete) are not atomic; list fields are mutated with
/// the store's array primitives instead.
#[derive(Clone)]
pub struct UserService {
    pub(crate) store: Arc<dyn DocumentStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub(crate) fn user_ref(id: &UserId) -> DocumentRef {
        DocumentRef::new(USERS_COLLECTION, id.as_str())
    }

    pub(crate) fn profile_ref(id: &UserId) -> DocumentRef {
        DocumentRef::new(PROFILES_COLLECTION, id.as_str())
    }

    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Write the account keyed by `user.id`, then seed its profile with
    /// `displayName = username`.  Returns the written record.
    ///
    /// The profile is only written once the account write has succeeded.
    pub async fn add_user(&self, user: &UserData) -> Result<UserData> {
        let doc = Self::user_ref(&user.id);
        self.store.set(&doc, to_document(user)?).await.at(&doc)?;
        info!(user_id = %user.id, username = %user.username, "Created user");

        self.set_profile(&user.id, &ProfileData::for_new_user(user))
            .await?;

        Ok(user.clone())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub async fn get_user_by_id(&self, id: &UserId) -> Result<UserData> {
        let doc = Self::user_ref(id);
        let data = self.store.get(&doc).await.at(&doc)?;
        debug!(user_id = %id, "Fetched user");
        Ok(from_document(data)?)
    }

    /// First account whose username matches.  Usernames are not unique at
    /// the store level, so later matches are ignored.
    pub async fn get_user_by_username(&self, username: &str) -> Result<UserData> {
        self.find_by_username(username)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DataError::not_found(USERS_COLLECTION, format!("username={username}")))
    }

    pub async fn get_user_id_by_username(&self, username: &str) -> Result<UserId> {
        Ok(self.get_user_by_username(username).await?.id)
    }

    pub async fn get_username_by_id(&self, id: &UserId) -> Result<String> {
        Ok(self.get_user_by_id(id).await?.username)
    }

    pub(crate) async fn find_by_username(&self, username: &str) -> Result<Vec<UserData>> {
        self.find_where(Filter::eq(FIELD_USERNAME, username)).await
    }

    async fn find_where(&self, filter: Filter) -> Result<Vec<UserData>> {
        let snapshots = self.store.query_eq(USERS_COLLECTION, &[filter]).await?;
        snapshots
            .into_iter()
            .map(|s| s.decode::<UserData>().map_err(DataError::from))
            .collect()
    }

    /// Whether any account document matches `filter`.  Matches are not
    /// decoded, so records in an older layout still count.
    async fn any_where(&self, filter: Filter) -> Result<bool> {
        let snapshots = self.store.query_eq(USERS_COLLECTION, &[filter]).await?;
        Ok(!snapshots.is_empty())
    }

    // ------------------------------------------------------------------
    // Update / delete
    // ------------------------------------------------------------------

    /// Overwrite the whole account document at `id` with `data`.
    ///
    /// Nothing is written when no account exists at `id`; the caller gets
    /// [`DataError::NotFound`].  `data.id` must equal `id`.
    pub async fn update_user(&self, id: &UserId, data: &UserData) -> Result<()> {
        if &data.id != id {
            return Err(DataError::IdMismatch {
                key: id.to_string(),
                record: data.id.to_string(),
            });
        }

        let doc = Self::user_ref(id);
        self.store.get(&doc).await.at(&doc)?;
        self.store.set(&doc, to_document(data)?).await.at(&doc)?;

        info!(user_id = %id, "Updated user");
        Ok(())
    }

    /// Delete the account at `id`.  The profile document is left in place;
    /// see [`UserService::delete_profile`].
    pub async fn delete_user(&self, id: &UserId) -> Result<()> {
        let doc = Self::user_ref(id);
        self.store.get(&doc).await.at(&doc)?;
        self.store.delete(&doc).await.at(&doc)?;

        info!(user_id = %id, "Deleted user");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Availability and credentials
    // ------------------------------------------------------------------

    /// `true` when some account already uses `username`.
    pub async fn is_username_taken(&self, username: &str) -> Result<bool> {
        let taken = self.any_where(Filter::eq(FIELD_USERNAME, username)).await?;
        if taken {
            debug!(username, "Username already exists");
        }
        Ok(taken)
    }

    /// `true` when some account already uses `email`.
    pub async fn is_email_taken(&self, email: &str) -> Result<bool> {
        let taken = self.any_where(Filter::eq(FIELD_EMAIL, email)).await?;
        if taken {
            debug!(email, "Email already exists");
        }
        Ok(taken)
    }

    /// Whether any account named `username` has a password hash matching
    /// `password`.
    pub async fn verify_login(&self, username: &str, password: &str) -> Result<bool> {
        Ok(self.find_login(username, password).await?.is_some())
    }

    /// The account `username` / `password` identify, if any.
    pub(crate) async fn find_login(&self, username: &str, password: &str) -> Result<Option<UserData>> {
        let snapshots = self
            .store
            .query_eq(USERS_COLLECTION, &[Filter::eq(FIELD_USERNAME, username)])
            .await?;
        for snapshot in snapshots {
            let id = snapshot.id.clone();
            let user = match snapshot.decode::<UserData>() {
                Ok(user) => user,
                Err(e) => {
                    warn!(user_id = %id, error = %e, "Skipping unreadable account");
                    continue;
                }
            };
            match verify_password(password, &user.password_hash) {
                Ok(true) => {
                    debug!(user_id = %user.id, "Login verified");
                    return Ok(Some(user));
                }
                Ok(false) => {}
                Err(e) => warn!(user_id = %user.id, error = %e, "Unreadable password hash"),
            }
        }
        debug!(username, "Login info incorrect");
        Ok(None)
    }

    // ------------------------------------------------------------------
    // Push token
    // ------------------------------------------------------------------

    /// Merge the push token into the account without touching other fields.
    pub async fn set_fcm_token(&self, id: &UserId, token: &str) -> Result<()> {
        let doc = Self::user_ref(id);
        let mut fields = Document::new();
        fields.insert(FIELD_FCM_TOKEN.into(), Value::from(token));
        self.store.update(&doc, fields).await.at(&doc)?;

        info!(user_id = %id, "Stored FCM token");
        Ok(())
    }

    pub async fn get_fcm_token(&self, id: &UserId) -> Result<Option<String>> {
        Ok(self.get_user_by_id(id).await?.fcm_token)
    }
}
