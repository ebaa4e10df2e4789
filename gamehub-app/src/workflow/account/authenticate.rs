use std::sync::Arc;

use crate::{
    domain::{
        RepoError,
        cache::{CacheStore, CacheStoreExt, USER_TTL, keys},
        user::{User, UserRepository},
    },
    ports::token::TokenPort,
    workflow::account::AccountError,
};

#[async_trait::async_trait]
pub trait AuthenticateUseCase {
    /// Resolves a bearer token to an active user, going through the user cache first.
    async fn authenticate(&self, access_token: &str) -> Result<User, AccountError>;
}

pub struct AuthenticateUseCaseImpl<U: UserRepository, C: CacheStore, T: TokenPort> {
    user_repository: Arc<U>,
    cache: Arc<C>,
    token_port: Arc<T>,
}

impl<U: UserRepository, C: CacheStore, T: TokenPort> AuthenticateUseCaseImpl<U, C, T> {
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
> AuthenticateUseCase for AuthenticateUseCaseImpl<U, C, T>
{
    async fn authenticate(&self, access_token: &str) -> Result<User, AccountError> {
        let user_id = self
            .token_port
            .verify_access_token(access_token)
            .ok_or(AccountError::InvalidToken)?;

        let key = keys::user(user_id);
        let user = match self.cache.get_json::<User>(&key) {
            Some(user) => user,
            None => {
                let user = match self.user_repository.get_user(user_id).await {
                    Ok(user) => user,
                    Err(RepoError::NotFound) => return Err(AccountError::InvalidToken),
                    Err(e) => {
                        log::error!("Failed to load user {}: {}", user_id, e);
                        return Err(AccountError::Internal);
                    }
                };
                self.cache.set_json(&key, &user, USER_TTL);
                user
            }
        };

        if !user.is_active {
            return Err(AccountError::AccountDeactivated);
        }
        Ok(user)
    }
}
