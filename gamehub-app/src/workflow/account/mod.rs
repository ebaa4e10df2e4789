use serde::Serialize;

use crate::{
    domain::{
        cache::{CacheStore, CacheStoreExt, REFRESH_TOKEN_TTL, USER_TTL, keys},
        user::User,
    },
    ports::token::TokenPort,
};

pub mod authenticate;
pub mod password;
pub mod register;
pub mod session;
pub mod verification;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Email already registered")]
    EmailTaken,
    #[error("Username already taken")]
    UsernameTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account is deactivated")]
    AccountDeactivated,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    #[error("Verification token required")]
    MissingVerificationToken,
    #[error("Invalid or expired verification token")]
    InvalidVerificationToken,
    #[error("Email already verified")]
    AlreadyVerified,
    #[error("Invalid or expired reset token")]
    InvalidResetToken,
    #[error("Current password is incorrect")]
    WrongPassword,
    #[error("User not found")]
    UserNotFound,
    #[error("Failed to send verification email")]
    EmailDelivery,
    #[error("Internal server error")]
    Internal,
}

/// Issues a fresh token pair and primes the user and refresh-token cache entries.
pub(crate) fn open_session<C, T>(
    cache: &C,
    token_port: &T,
    user: User,
) -> Result<AuthSession, AccountError>
where
    C: CacheStore + ?Sized,
    T: TokenPort + ?Sized,
{
    let tokens = token_port
        .issue_access_token(user.id)
        .and_then(|access_token| {
            token_port
                .issue_refresh_token(user.id)
                .map(|refresh_token| TokenPair {
                    access_token,
                    refresh_token,
                })
        })
        .map_err(|e| {
            log::error!("Failed to issue tokens for user {}: {}", user.id, e);
            AccountError::Internal
        })?;
    cache.set_json(&keys::user(user.id), &user, USER_TTL);
    cache.set(
        &keys::refresh_token(user.id),
        tokens.refresh_token.clone(),
        REFRESH_TOKEN_TTL,
    );
    Ok(AuthSession { user, tokens })
}

pub(crate) fn verification_code() -> String {
    use rand::Rng;
    rand::rng().random_range(100_000..1_000_000).to_string()
}
