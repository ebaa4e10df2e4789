use std::sync::Arc;

use crate::{
    domain::{
        RepoError, UserId,
        cache::{CacheStore, CacheStoreExt, RESEND_VERIFICATION_TTL, keys},
        mail,
        user::{UserRepository, UserUpdate},
    },
    ports::email::EmailPort,
    workflow::account::{AccountError, verification_code},
};

#[async_trait::async_trait]
pub trait VerificationUseCase {
    async fn verify_email(&self, code: &str) -> Result<(), AccountError>;
    async fn resend_verification(&self, email: &str) -> Result<(), AccountError>;
}

pub struct VerificationUseCaseImpl<U: UserRepository, C: CacheStore, E: EmailPort> {
    user_repository: Arc<U>,
    cache: Arc<C>,
    email_port: Arc<E>,
    frontend_url: String,
}

impl<U: UserRepository, C: CacheStore, E: EmailPort> VerificationUseCaseImpl<U, C, E> {
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
}

#[async_trait::async_trait]
impl<
    U: UserRepository + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
    E: EmailPort + Send + Sync + 'static,
> VerificationUseCase for VerificationUseCaseImpl<U, C, E>
{
    async fn verify_email(&self, code: &str) -> Result<(), AccountError> {
        if code.trim().is_empty() {
            return Err(AccountError::MissingVerificationToken);
        }
        let key = keys::verification(code);
        let user_id: UserId = self
            .cache
            .get(&key)
            .and_then(|raw| raw.parse().ok())
            .ok_or(AccountError::InvalidVerificationToken)?;

        let user = match self.user_repository.get_user(user_id).await {
            Ok(user) => user,
            Err(RepoError::NotFound) => return Err(AccountError::UserNotFound),
            Err(e) => {
                log::error!("Failed to load user {}: {}", user_id, e);
                return Err(AccountError::Internal);
            }
        };
        if user.is_verified {
            return Err(AccountError::AlreadyVerified);
        }

        self.user_repository
            .update_user(
                user_id,
                UserUpdate {
                    is_verified: Some(true),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| {
                log::error!("Failed to verify user {}: {}", user_id, e);
                AccountError::Internal
            })?;
        self.cache.del(&key);
        self.cache.invalidate_user(user_id);

        let content = mail::welcome(&user.username, &self.frontend_url);
        if let Err(e) = self
            .email_port
            .send_email(&user.email, &content.subject, &content.body)
        {
            log::warn!("Failed to send welcome email to {}: {}", user.email, e);
        }
        Ok(())
    }

    async fn resend_verification(&self, email: &str) -> Result<(), AccountError> {
        let user = match self.user_repository.find_by_email(email).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(AccountError::UserNotFound),
            Err(e) => {
                log::error!("Failed to look up account {}: {}", email, e);
                return Err(AccountError::Internal);
            }
        };
        if user.is_verified {
            return Err(AccountError::AlreadyVerified);
        }

        let code = verification_code();
        self.cache.set(
            &keys::verification(&code),
            user.id.to_string(),
            RESEND_VERIFICATION_TTL,
        );
        let content = mail::verification(&user.username, &code, &self.frontend_url);
        self.email_port
            .send_email(&user.email, &content.subject, &content.body)
            .map_err(|e| {
                log::error!("Failed to send verification email to {}: {}", user.email, e);
                AccountError::EmailDelivery
            })
    }
}
