use std::sync::Arc;

use chrono::Utc;

use crate::{
    domain::{
        RepoError, UserId,
        cache::{CacheStore, CacheStoreExt, keys},
        user::{UserRepository, UserUpdate},
    },
    ports::token::TokenPort,
    services::password::verify_password,
    workflow::account::{AccountError, AuthSession, open_session},
};

#[async_trait::async_trait]
pub trait SessionUseCase {
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AccountError>;
    /// Rotates both tokens. The refresh token must be the one last handed out.
    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AccountError>;
    fn logout(&self, user_id: UserId);
}

pub struct SessionUseCaseImpl<U: UserRepository, C: CacheStore, T: TokenPort> {
    user_repository: Arc<U>,
    cache: Arc<C>,
    token_port: Arc<T>,
}

impl<U: UserRepository, C: CacheStore, T: TokenPort> SessionUseCaseImpl<U, C, T> {
    pub fn new(user_repository: Arc<U>, cache: Arc<C>, token_port: Arc<T>) -> Self {
        Self {
            user_repository,
            cache,
            token_port,
        }
    }
}

#[async_trait::async_trait]
impl<
    U: UserRepository + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
    T: TokenPort + Send + Sync + 'static,
> SessionUseCase for SessionUseCaseImpl<U, C, T>
{
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AccountError> {
        let user = match self.user_repository.find_by_email(email).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(AccountError::InvalidCredentials),
            Err(e) => {
                log::error!("Failed to look up account {}: {}", email, e);
                return Err(AccountError::Internal);
            }
        };
        if !user.is_active {
            return Err(AccountError::AccountDeactivated);
        }
        if !verify_password(password, &user.password_hash) {
            return Err(AccountError::InvalidCredentials);
        }

        let user = self
            .user_repository
            .update_user(
                user.id,
                UserUpdate {
                    last_login: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| {
                log::error!("Failed to record login for user {}: {}", user.id, e);
                AccountError::Internal
            })?;
        open_session(self.cache.as_ref(), self.token_port.as_ref(), user)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AccountError> {
        let user_id = self
            .token_port
            .verify_refresh_token(refresh_token)
            .ok_or(AccountError::InvalidRefreshToken)?;
        if self.cache.get(&keys::refresh_token(user_id)).as_deref() != Some(refresh_token) {
            return Err(AccountError::InvalidRefreshToken);
        }
        let user = match self.user_repository.get_user(user_id).await {
            Ok(user) => user,
            Err(RepoError::NotFound) => return Err(AccountError::InvalidRefreshToken),
            Err(e) => {
                log::error!("Failed to load user {}: {}", user_id, e);
                return Err(AccountError::Internal);
            }
        };
        if !user.is_active {
            return Err(AccountError::AccountDeactivated);
        }
        open_session(self.cache.as_ref(), self.token_port.as_ref(), user)
    }

    fn logout(&self, user_id: UserId) {
        self.cache.invalidate_user(user_id);
        self.cache.del(&keys::refresh_token(user_id));
    }
}
