use crate::domain::UserId;

pub trait TokenPort {
    fn issue_access_token(&self, user_id: UserId) -> Result<String, TokenError>;
    fn issue_refresh_token(&self, user_id: UserId) -> Result<String, TokenError>;
    fn verify_access_token(&self, token: &str) -> Option<UserId>;
    fn verify_refresh_token(&self, token: &str) -> Option<UserId>;
}

#[derive(Debug, Clone)]
pub struct TokenError(pub String);

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token error: {}", self.0)
    }
}
