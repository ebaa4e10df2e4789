use std::sync::Arc;

use crate::{
    domain::{
        RepoError,
        cache::{CacheStore, VERIFICATION_TTL, keys},
        mail,
        user::{NewUser, Role, UserRepository},
    },
    ports::{email::EmailPort, token::TokenPort},
    services::password::hash_password,
    workflow::account::{AccountError, AuthSession, open_session, verification_code},
};

#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[async_trait::async_trait]
pub trait RegisterUseCase {
    async fn register(&self, registration: Registration) -> Result<AuthSession, AccountError>;
}

pub struct RegisterUseCaseImpl<U: UserRepository, C: CacheStore, T: TokenPort, E: EmailPort> {
    user_repository: Arc<U>,
    cache: Arc<C>,
    token_port: Arc<T>,
    email_port: Arc<E>,
    frontend_url: String,
}

impl<U: UserRepository, C: CacheStore, T: TokenPort, E: EmailPort> RegisterUseCaseImpl<U, C, T, E> {
    pub fn new(
        user_repository: Arc<U>,
        cache: Arc<C>,
        token_port: Arc<T>,
        email_port: Arc<E>,
        frontend_url: String,
    ) -> Self {
        Self {
            user_repository,
            cache,
            token_port,
            email_port,
            frontend_url,
        }
    }
}

#[async_trait::async_trait]
impl<
    U: UserRepository + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
    T: TokenPort + Send + Sync + 'static,
    E: EmailPort + Send + Sync + 'static,
> RegisterUseCase for RegisterUseCaseImpl<U, C, T, E>
{
    async fn register(&self, registration: Registration) -> Result<AuthSession, AccountError> {
        let internal = |e: RepoError| {
            log::error!("Failed to register user: {}", e);
            AccountError::Internal
        };
        if self
            .user_repository
            .find_by_email(&registration.email)
            .await
            .map_err(internal)?
            .is_some()
        {
            return Err(AccountError::EmailTaken);
        }
        if self
            .user_repository
            .find_by_username(&registration.username)
            .await
            .map_err(internal)?
            .is_some()
        {
            return Err(AccountError::UsernameTaken);
        }

        let password_hash = hash_password(&registration.password).map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            AccountError::Internal
        })?;
        let user = self
            .user_repository
            .create_user(NewUser {
                email: registration.email,
                username: registration.username,
                password_hash,
                first_name: registration.first_name,
                last_name: registration.last_name,
                role: Role::User,
                is_verified: false,
            })
            .await
            .map_err(|e| match e {
                RepoError::UniqueViolation => AccountError::EmailTaken,
                e => internal(e),
            })?;
        log::info!("Registered user {} ({})", user.username, user.id);

        let code = verification_code();
        self.cache.set(
            &keys::verification(&code),
            user.id.to_string(),
            VERIFICATION_TTL,
        );
        let content = mail::verification(&user.username, &code, &self.frontend_url);
        if let Err(e) = self
            .email_port
            .send_email(&user.email, &content.subject, &content.body)
        {
            log::warn!("Failed to send verification email to {}: {}", user.email, e);
        }

        open_session(self.cache.as_ref(), self.token_port.as_ref(), user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::cache::CacheStoreExt,
        testing::{FakeTokens, InMemoryStore, RecordingEmail, cache},
    };

    fn registration(email: &str, username: &str) -> Registration {
        Registration {
            email: email.to_string(),
            username: username.to_string(),
            password: "Sup3r$ecret".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: None,
        }
    }

    #[tokio::test]
    async fn test_register_mails_code_and_opens_session() {
        let store = InMemoryStore::new();
        let cache = cache();
        let email = RecordingEmail::new();
        let use_case = RegisterUseCaseImpl::new(
            store.clone(),
            cache.clone(),
            FakeTokens::new(),
            email.clone(),
            "https://play.test".to_string(),
        );

        let session = use_case
            .register(registration("ada@example.com", "ada"))
            .await
            .unwrap();

        assert!(!session.user.is_verified);
        assert!(session.user.profile.is_some());
        let sent = email.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "ada@example.com");
        let code = sent[0]
            .2
            .split_whitespace()
            .find(|w| w.len() == 6 && w.chars().all(|c| c.is_ascii_digit()))
            .unwrap()
            .to_string();
        assert_eq!(
            cache.get(&keys::verification(&code)),
            Some(session.user.id.to_string())
        );
        assert_eq!(
            cache.get(&keys::refresh_token(session.user.id)),
            Some(session.tokens.refresh_token.clone())
        );
        let cached: Option<crate::domain::user::User> =
            cache.get_json(&keys::user(session.user.id));
        assert_eq!(cached.map(|u| u.id), Some(session.user.id));
    }

    #[tokio::test]
    async fn test_register_rejects_taken_identity() {
        let store = InMemoryStore::new();
        store.seed_user("ada", Role::User, 0);
        let use_case = RegisterUseCaseImpl::new(
            store.clone(),
            cache(),
            FakeTokens::new(),
            RecordingEmail::new(),
            String::new(),
        );

        let result = use_case
            .register(registration("ada@example.com", "someone"))
            .await;
        assert!(matches!(result, Err(AccountError::EmailTaken)));
        let result = use_case
            .register(registration("other@example.com", "ada"))
            .await;
        assert!(matches!(result, Err(AccountError::UsernameTaken)));
    }

    #[tokio::test]
    async fn test_register_survives_mail_failure() {
        let use_case = RegisterUseCaseImpl::new(
            InMemoryStore::new(),
            cache(),
            FakeTokens::new(),
            RecordingEmail::failing(),
            String::new(),
        );
        assert!(use_case.register(registration("x@example.com", "xx_1")).await.is_ok());
    }
}
