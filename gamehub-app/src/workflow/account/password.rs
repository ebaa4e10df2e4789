use std::sync::Arc;

use crate::{
    domain::{
        RepoError, UserId,
        cache::{CacheStore, CacheStoreExt, PASSWORD_RESET_TTL, keys},
        mail,
        user::{UserRepository, UserUpdate},
    },
    ports::email::EmailPort,
    services::password::{hash_password, verify_password},
    workflow::account::AccountError,
};

#[async_trait::async_trait]
pub trait PasswordUseCase {
    /// Succeeds whether or not the address belongs to an account.
    async fn forgot_password(&self, email: &str) -> Result<(), AccountError>;
    async fn reset_password(&self, token: &str, password: &str) -> Result<(), AccountError>;
    async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AccountError>;
}

pub struct PasswordUseCaseImpl<U: UserRepository, C: CacheStore, E: EmailPort> {
    user_repository: Arc<U>,
    cache: Arc<C>,
    email_port: Arc<E>,
    frontend_url: String,
}

impl<U: UserRepository, C: CacheStore, E: EmailPort> PasswordUseCaseImpl<U, C, E> {
    pub fn new(
        user_repository: Arc<U>,
        cache: Arc<C>,
        email_port: Arc<E>,
        frontend_url: String,
    ) -> Self {
        Self {
            user_repository,
            cache,
            email_port,
            frontend_url,
        }
    }

    async fn store_password(&self, user_id: UserId, password: &str) -> Result<(), AccountError> {
        let password_hash = hash_password(password).map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            AccountError::Internal
        })?;
        match self
            .user_repository
            .update_user(
                user_id,
                UserUpdate {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(RepoError::NotFound) => Err(AccountError::UserNotFound),
            Err(e) => {
                log::error!("Failed to update password of user {}: {}", user_id, e);
                Err(AccountError::Internal)
            }
        }
    }
}

#[async_trait::async_trait]
impl<
    U: UserRepository + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
    E: EmailPort + Send + Sync + 'static,
> PasswordUseCase for PasswordUseCaseImpl<U, C, E>
{
    async fn forgot_password(&self, email: &str) -> Result<(), AccountError> {
        let user = match self.user_repository.find_by_email(email).await {
            Ok(Some(user)) => user,
            Ok(None) => return Ok(()),
            Err(e) => {
                log::error!("Failed to look up account {}: {}", email, e);
                return Err(AccountError::Internal);
            }
        };
        let token = uuid::Uuid::new_v4().to_string();
        self.cache.set(
            &keys::password_reset(&token),
            user.id.to_string(),
            PASSWORD_RESET_TTL,
        );
        let content = mail::password_reset(&user.username, &token, &self.frontend_url);
        if let Err(e) = self
            .email_port
            .send_email(&user.email, &content.subject, &content.body)
        {
            log::warn!("Failed to send reset email to {}: {}", user.email, e);
        }
        Ok(())
    }

    async fn reset_password(&self, token: &str, password: &str) -> Result<(), AccountError> {
        let key = keys::password_reset(token);
        let user_id: UserId = self
            .cache
            .get(&key)
            .and_then(|raw| raw.parse().ok())
            .ok_or(AccountError::InvalidResetToken)?;
        match self.store_password(user_id, password).await {
            Err(AccountError::UserNotFound) => return Err(AccountError::InvalidResetToken),
            other => other?,
        }
        self.cache.del(&key);
        self.cache.invalidate_user(user_id);
        self.cache.del(&keys::refresh_token(user_id));
        Ok(())
    }

    async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AccountError> {
        let user = match self.user_repository.get_user(user_id).await {
            Ok(user) => user,
            Err(RepoError::NotFound) => return Err(AccountError::UserNotFound),
            Err(e) => {
                log::error!("Failed to load user {}: {}", user_id, e);
                return Err(AccountError::Internal);
            }
        };
        if !verify_password(current_password, &user.password_hash) {
            return Err(AccountError::WrongPassword);
        }
        self.store_password(user_id, new_password).await?;
        self.cache.invalidate_user(user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::user::Role,
        testing::{InMemoryStore, RecordingEmail, TEST_PASSWORD, cache},
    };

    fn token_from(body: &str) -> String {
        let (_, rest) = body.split_once("token=").unwrap();
        rest.split_whitespace().next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_reset_flow() {
        let store = InMemoryStore::new();
        let user = store.seed_user("ada", Role::User, 0);
        let cache = cache();
        cache.set(&keys::refresh_token(user.id), "r".to_string(), PASSWORD_RESET_TTL);
        let email = RecordingEmail::new();
        let use_case =
            PasswordUseCaseImpl::new(store.clone(), cache.clone(), email.clone(), String::new());

        use_case.forgot_password("ghost@example.com").await.unwrap();
        assert!(email.sent().is_empty());
        use_case.forgot_password(&user.email).await.unwrap();
        let token = token_from(&email.sent()[0].2);

        use_case.reset_password(&token, "N3w$ecret").await.unwrap();
        assert!(verify_password(
            "N3w$ecret",
            &store.user(user.id).unwrap().password_hash
        ));
        assert!(!cache.exists(&keys::refresh_token(user.id)));
        let reused = use_case.reset_password(&token, "Other1$x").await;
        assert!(matches!(reused, Err(AccountError::InvalidResetToken)));
    }

    #[tokio::test]
    async fn test_change_password_requires_current() {
        let store = InMemoryStore::new();
        let user = store.seed_user("ada", Role::User, 0);
        let use_case =
            PasswordUseCaseImpl::new(store.clone(), cache(), RecordingEmail::new(), String::new());

        let result = use_case.change_password(user.id, "nope", "N3w$ecret").await;
        assert!(matches!(result, Err(AccountError::WrongPassword)));
        use_case
            .change_password(user.id, TEST_PASSWORD, "N3w$ecret")
            .await
            .unwrap();
        assert!(verify_password(
            "N3w$ecret",
            &store.user(user.id).unwrap().password_hash
        ));
    }
}
