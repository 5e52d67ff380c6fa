//! Profile operations over the `profiles` collection.

use cosmea_shared::constants::FIELD_AVATAR;
use cosmea_shared::UserId;
use cosmea_store::models::{from_document, to_document};
use cosmea_store::{Document, ProfileData};
use serde_json::Value;
use tracing::{debug, info};

use super::users::UserService;
use crate::error::{AtDocument, DataError, Result};

impl UserService {
    /// Create or fully replace the profile of `id`.
    pub async fn set_profile(&self, id: &UserId, profile: &ProfileData) -> Result<()> {
        if &profile.id != id {
            return Err(DataError::IdMismatch {
                key: id.to_string(),
                record: profile.id.to_string(),
            });
        }

        let doc = Self::profile_ref(id);
        self.store.set(&doc, to_document(profile)?).await.at(&doc)?;

        info!(user_id = %id, display_name = %profile.display_name, "Updated profile");
        Ok(())
    }

    pub async fn get_profile(&self, id: &UserId) -> Result<ProfileData> {
        let doc = Self::profile_ref(id);
        let data = self.store.get(&doc).await.at(&doc)?;
        Ok(from_document(data)?)
    }

    /// Merge only the `avatar` field; the rest of the profile is untouched.
    pub async fn update_avatar_url(&self, id: &UserId, url: &str) -> Result<()> {
        let doc = Self::profile_ref(id);
        let mut fields = Document::new();
        fields.insert(FIELD_AVATAR.into(), Value::from(url));
        self.store.update(&doc, fields).await.at(&doc)?;

        info!(user_id = %id, url, "Updated profile avatar");
        Ok(())
    }

    /// `Ok(None)` when the profile exists but has no avatar.
    pub async fn get_avatar_by_user_id(&self, id: &UserId) -> Result<Option<String>> {
        let doc = Self::profile_ref(id);
        let data = self.store.get(&doc).await.at(&doc)?;

        let avatar = data
            .get(FIELD_AVATAR)
            .and_then(Value::as_str)
            .map(str::to_string);
        if avatar.is_none() {
            debug!(user_id = %id, "No avatar field");
        }
        Ok(avatar)
    }

    pub async fn get_avatar_by_username(&self, username: &str) -> Result<Option<String>> {
        let id = self.get_user_id_by_username(username).await?;
        self.get_avatar_by_user_id(&id).await
    }

    /// Profiles are not removed with their account; this is the explicit
    /// counterpart of [`UserService::delete_user`].
    pub async fn delete_profile(&self, id: &UserId) -> Result<()> {
        let doc = Self::profile_ref(id);
        if !self.store.delete(&doc).await.at(&doc)? {
            return Err(DataError::not_found(&doc.collection, &doc.id));
        }

        info!(user_id = %id, "Deleted profile");
        Ok(())
    }
}
