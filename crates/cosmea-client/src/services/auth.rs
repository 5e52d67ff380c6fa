//! Registration and login on top of [`UserService`].

use cosmea_store::UserData;
use tracing::info;

use super::users::UserService;
use crate::error::{DataError, Result};
use crate::session::Session;

#[derive(Clone)]
pub struct AuthService {
    users: UserService,
}

impl AuthService {
    pub fn new(users: UserService) -> Self {
        Self { users }
    }

    /// Create an account after checking that neither the username nor the
    /// email is in use.
    ///
    /// The check and the write are separate store calls, so two clients
    /// registering the same name at once can both succeed.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        phone: &str,
        password: &str,
    ) -> Result<UserData> {
        if self.users.is_username_taken(username).await? {
            return Err(DataError::Conflict {
                field: "username",
                value: username.to_string(),
            });
        }
        if self.users.is_email_taken(email).await? {
            return Err(DataError::Conflict {
                field: "email",
                value: email.to_string(),
            });
        }

        let user = UserData::new(username, password, email, phone)?;
        self.users.add_user(&user).await
    }

    /// Verify the credentials and record the account in `session`.
    pub async fn login(&self, username: &str, password: &str, session: &mut Session) -> Result<UserData> {
        let user = self
            .users
            .find_login(username, password)
            .await?
            .ok_or(DataError::InvalidCredentials)?;
        session.sign_in(user.id.clone(), user.username.clone())?;

        info!(user_id = %user.id, "Logged in");
        Ok(user)
    }

    pub fn logout(&self, session: &mut Session) -> Result<()> {
        session.sign_out()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cosmea_store::{Document, DocumentRef, DocumentStore};

    use super::*;
    use crate::services::users::tests::service;

    fn auth() -> (AuthService, UserService) {
        let (users, _) = service();
        (AuthService::new(users.clone()), users)
    }

    #[tokio::test]
    async fn test_register_creates_user_and_profile() {
        let (auth, users) = auth();
        let user = auth.register("alice", "a@e.com", "555", "x").await.unwrap();

        assert_eq!(users.get_user_by_id(&user.id).await.unwrap(), user);
        assert_eq!(users.get_profile(&user.id).await.unwrap().display_name, "alice");
    }

    #[tokio::test]
    async fn test_register_rejects_taken_username_and_email() {
        let (auth, _) = auth();
        auth.register("alice", "a@e.com", "", "x").await.unwrap();

        let err = auth.register("alice", "other@e.com", "", "x").await.unwrap_err();
        assert!(matches!(err, DataError::Conflict { field: "username", .. }));

        let err = auth.register("bob", "a@e.com", "", "x").await.unwrap_err();
        assert!(matches!(err, DataError::Conflict { field: "email", .. }));
    }

    #[tokio::test]
    async fn test_register_conflicts_with_legacy_record() {
        let (users, store) = service();
        let auth = AuthService::new(users);
        let mut legacy = Document::new();
        legacy.insert("username".into(), "alice".into());
        legacy.insert("password".into(), "plaintext".into());
        store
            .set(&DocumentRef::new("users", "old"), legacy)
            .await
            .unwrap();

        let err = auth.register("alice", "a@e.com", "", "x").await.unwrap_err();
        assert!(matches!(err, DataError::Conflict { field: "username", .. }));
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let (auth, _) = auth();
        let user = auth.register("alice", "a@e.com", "", "x").await.unwrap();
        let mut session = Session::in_memory();

        let err = auth.login("alice", "wrong", &mut session).await.unwrap_err();
        assert!(matches!(err, DataError::InvalidCredentials));
        assert!(!session.is_signed_in());

        auth.login("alice", "x", &mut session).await.unwrap();
        assert_eq!(session.current_user_id(), Some(&user.id));
        assert_eq!(session.current_user_name(), Some("alice"));

        auth.logout(&mut session).unwrap();
        assert!(!session.is_signed_in());
    }
}
