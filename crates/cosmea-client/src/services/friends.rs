//! Friend-request workflow.
//!
//! A request from A to B puts A in B's `pendingFriends`.  Accepting makes
//! the relation symmetric through both `friends` lists.  All list changes go
//! through the store's array union / remove so concurrent writers to the
//! same list do not drop each other's entries.

use cosmea_shared::constants::{FIELD_FRIENDS, FIELD_PENDING_FRIENDS};
use cosmea_shared::UserId;
use serde_json::Value;
use tracing::{debug, info};

use super::users::UserService;
use crate::error::{AtDocument, DataError, Result};

fn id_value(id: &UserId) -> Vec<Value> {
    vec![Value::from(id.as_str())]
}

fn distinct(a: &UserId, b: &UserId) -> Result<()> {
    if a == b {
        return Err(DataError::SelfFriendship(a.to_string()));
    }
    Ok(())
}

impl UserService {
    /// `requester` asks `recipient` to be friends.  Repeating the request
    /// leaves a single pending entry.  A user cannot send one to themselves.
    pub async fn add_friend_request(&self, requester: &UserId, recipient: &UserId) -> Result<()> {
        distinct(requester, recipient)?;
        let doc = Self::user_ref(recipient);
        self.store
            .array_union(&doc, FIELD_PENDING_FRIENDS, id_value(requester))
            .await
            .at(&doc)?;

        info!(from = %requester, to = %recipient, "Added friend request");
        Ok(())
    }

    /// Remove `friend_id` from `current_user`'s own pending list.
    ///
    /// Same mutation as [`UserService::decline_friend_request`]; to take
    /// back a request the current user sent, use
    /// [`UserService::withdraw_friend_request`].
    pub async fn remove_friend_request(&self, current_user: &UserId, friend_id: &UserId) -> Result<()> {
        let doc = Self::user_ref(current_user);
        self.store
            .array_remove(&doc, FIELD_PENDING_FRIENDS, id_value(friend_id))
            .await
            .at(&doc)?;

        info!(user = %current_user, removed = %friend_id, "Removed pending friend request");
        Ok(())
    }

    /// `recipient` dismisses the request `requester` sent.
    pub async fn decline_friend_request(&self, recipient: &UserId, requester: &UserId) -> Result<()> {
        self.remove_friend_request(recipient, requester).await
    }

    /// `requester` takes back the request it sent to `recipient`.
    pub async fn withdraw_friend_request(&self, requester: &UserId, recipient: &UserId) -> Result<()> {
        let doc = Self::user_ref(recipient);
        self.store
            .array_remove(&doc, FIELD_PENDING_FRIENDS, id_value(requester))
            .await
            .at(&doc)?;

        info!(from = %requester, to = %recipient, "Withdrew friend request");
        Ok(())
    }

    /// `current_user` accepts the pending request from `friend_id`.
    ///
    /// Both accounts must exist.  Each lands in the other's `friends`, and
    /// any pending request between the two is cleared from both sides.
    pub async fn accept_friend_request(&self, current_user: &UserId, friend_id: &UserId) -> Result<()> {
        distinct(current_user, friend_id)?;
        let current_doc = Self::user_ref(current_user);
        let friend_doc = Self::user_ref(friend_id);
        self.store.get(&current_doc).await.at(&current_doc)?;
        self.store.get(&friend_doc).await.at(&friend_doc)?;

        self.store
            .array_union(&current_doc, FIELD_FRIENDS, id_value(friend_id))
            .await
            .at(&current_doc)?;
        self.store
            .array_union(&friend_doc, FIELD_FRIENDS, id_value(current_user))
            .await
            .at(&friend_doc)?;
        self.store
            .array_remove(&current_doc, FIELD_PENDING_FRIENDS, id_value(friend_id))
            .await
            .at(&current_doc)?;
        self.store
            .array_remove(&friend_doc, FIELD_PENDING_FRIENDS, id_value(current_user))
            .await
            .at(&friend_doc)?;

        info!(user = %current_user, friend = %friend_id, "Accepted friend request");
        Ok(())
    }

    /// Ids of users with a pending request to `id`.
    pub async fn get_friend_requests(&self, id: &UserId) -> Result<Vec<UserId>> {
        let pending = self.get_user_by_id(id).await?.pending_friends;
        debug!(user = %id, count = pending.len(), "Fetched pending friends");
        Ok(pending)
    }

    pub async fn get_friends(&self, id: &UserId) -> Result<Vec<UserId>> {
        let friends = self.get_user_by_id(id).await?.friends;
        debug!(user = %id, count = friends.len(), "Fetched friends");
        Ok(friends)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cosmea_store::MemoryStore;

    use super::*;
    use crate::error::OrAbsent;
    use crate::services::users::tests::{service, user};

    async fn two_users() -> (UserService, Arc<MemoryStore>, UserId, UserId) {
        let (users, store) = service();
        users.add_user(&user("a", "alice")).await.unwrap();
        users.add_user(&user("b", "bob")).await.unwrap();
        (users, store, "a".into(), "b".into())
    }

    #[tokio::test]
    async fn test_request_is_idempotent() {
        let (users, _, a, b) = two_users().await;

        users.add_friend_request(&a, &b).await.unwrap();
        users.add_friend_request(&a, &b).await.unwrap();

        assert_eq!(users.get_friend_requests(&b).await.unwrap(), vec![a.clone()]);
        assert!(users.get_friend_requests(&a).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_request_to_missing_user_is_not_found() {
        let (users, _, a, _) = two_users().await;
        let err = users
            .add_friend_request(&a, &"ghost".into())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_accept_is_symmetric_and_idempotent() {
        let (users, _, a, b) = two_users().await;
        users.add_friend_request(&a, &b).await.unwrap();

        users.accept_friend_request(&b, &a).await.unwrap();
        users.accept_friend_request(&b, &a).await.unwrap();

        assert_eq!(users.get_friends(&a).await.unwrap(), vec![b.clone()]);
        assert_eq!(users.get_friends(&b).await.unwrap(), vec![a.clone()]);
        assert!(users.get_friend_requests(&b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_accept_clears_mutual_requests() {
        let (users, _, a, b) = two_users().await;
        users.add_friend_request(&a, &b).await.unwrap();
        users.add_friend_request(&b, &a).await.unwrap();

        users.accept_friend_request(&b, &a).await.unwrap();

        assert!(users.get_friend_requests(&a).await.unwrap().is_empty());
        assert!(users.get_friend_requests(&b).await.unwrap().is_empty());
        assert_eq!(users.get_friends(&a).await.unwrap(), vec![b.clone()]);
    }

    #[tokio::test]
    async fn test_self_friendship_is_rejected() {
        let (users, _, a, _) = two_users().await;

        let err = users.add_friend_request(&a, &a).await.unwrap_err();
        assert!(matches!(err, DataError::SelfFriendship(_)));
        let err = users.accept_friend_request(&a, &a).await.unwrap_err();
        assert!(matches!(err, DataError::SelfFriendship(_)));

        assert!(users.get_friend_requests(&a).await.unwrap().is_empty());
        assert!(users.get_friends(&a).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_all_land() {
        const SENDERS: usize = 40;
        let (users, _, _, b) = two_users().await;

        let tasks: Vec<_> = (0..SENDERS)
            .map(|i| {
                let users = users.clone();
                let recipient = b.clone();
                tokio::spawn(async move {
                    users
                        .add_friend_request(&UserId::from(format!("sender{i}")), &recipient)
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let pending = users.get_friend_requests(&b).await.unwrap();
        assert_eq!(pending.len(), SENDERS);
    }

    #[tokio::test]
    async fn test_accept_with_unknown_friend_changes_nothing() {
        let (users, _, a, _) = two_users().await;
        let err = users
            .accept_friend_request(&a, &"ghost".into())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(users.get_friends(&a).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_decline_and_withdraw_touch_the_recipient_list() {
        let (users, _, a, b) = two_users().await;
        let c = UserId::from("c");
        users.add_user(&user("c", "carol")).await.unwrap();

        users.add_friend_request(&a, &b).await.unwrap();
        users.add_friend_request(&c, &b).await.unwrap();

        users.decline_friend_request(&b, &a).await.unwrap();
        assert_eq!(users.get_friend_requests(&b).await.unwrap(), vec![c.clone()]);

        users.withdraw_friend_request(&c, &b).await.unwrap();
        assert!(users.get_friend_requests(&b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_operates_on_own_pending_list() {
        let (users, _, a, b) = two_users().await;
        users.add_friend_request(&a, &b).await.unwrap();

        // removing from the requester's own list is a no-op for the request
        users.remove_friend_request(&a, &b).await.unwrap();
        assert_eq!(users.get_friend_requests(&b).await.unwrap(), vec![a.clone()]);

        users.remove_friend_request(&b, &a).await.unwrap();
        assert!(users.get_friend_requests(&b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lists_degrade_to_empty_on_store_failure() {
        let (users, store, a, _) = two_users().await;
        store.set_offline(true);

        let friends = users.get_friends(&a).await.or_absent("get_friends").unwrap_or_default();
        assert!(friends.is_empty());
        let pending = users
            .get_friend_requests(&a)
            .await
            .or_absent("get_friend_requests")
            .unwrap_or_default();
        assert!(pending.is_empty());
    }
}
