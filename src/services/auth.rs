//! Authentication service
//!
//! Identities come from the user reference data. There is no credential
//! check: login resolves a username and issues a signed token for it.

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{user::UserClaims, User},
    store::SharedStore,
};

#[derive(Clone)]
pub struct AuthService {
    store: SharedStore,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(store: SharedStore, config: AuthConfig) -> Self {
        Self { store, config }
    }

    /// Resolve a username. Unknown users yield `None`.
    pub async fn login(&self, username: &str) -> AppResult<Option<User>> {
        let store = self.store.read().await;
        let user = store.user(username.trim()).cloned();
        match &user {
            Some(u) => tracing::info!(username = %u.username, role = %u.role, "User logged in"),
            None => tracing::warn!(username, "Login attempt for unknown user"),
        }
        Ok(user)
    }

    /// Login and sign a JWT in one step
    pub async fn authenticate(&self, username: &str) -> AppResult<(String, User)> {
        let user = self
            .login(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Unknown user".to_string()))?;
        let token = self.issue_token(&user)?;
        Ok((token, user))
    }

    pub fn issue_token(&self, user: &User) -> AppResult<String> {
        UserClaims::for_user(user, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Current user behind a token subject
    pub async fn me(&self, username: &str) -> AppResult<User> {
        self.store
            .read()
            .await
            .user(username)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::store::seed::demo_store;

    fn service() -> AuthService {
        AuthService::new(
            demo_store().into_shared(),
            AuthConfig {
                jwt_secret: "test-secret".to_string(),
                jwt_expiration_hours: 1,
            },
        )
    }

    #[tokio::test]
    async fn test_login_known_and_unknown() {
        let auth = service();
        let admin = auth.login("admin").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(auth.login("nobody").await.unwrap().is_none());
        assert!(matches!(
            auth.authenticate("nobody").await,
            Err(AppError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_token_carries_actor() {
        let auth = service();
        let (token, user) = auth.authenticate("cn_goden").await.unwrap();
        let claims = UserClaims::from_token(&token, "test-secret").unwrap();
        let actor = claims.actor();
        assert_eq!(actor.username, user.username);
        assert_eq!(actor.role, Role::Clinic);
        assert_eq!(actor.clinic_id.as_deref(), Some("CN_GODEN"));
    }
}
