use gamehub_app::{
    domain::UserId,
    ports::token::{TokenError, TokenPort},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    user_id: UserId,
    #[serde(rename = "type")]
    kind: TokenKind,
    exp: i64,
    iat: i64,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Signs access and refresh tokens with separate secrets.
pub struct JwtTokenService {
    access: Keys,
    refresh: Keys,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl JwtTokenService {
    pub fn new() -> Self {
        let access_secret =
            std::env::var("GAMEHUB_JWT_SECRET").expect("GAMEHUB_JWT_SECRET must be set");
        let refresh_secret = std::env::var("GAMEHUB_JWT_REFRESH_SECRET")
            .expect("GAMEHUB_JWT_REFRESH_SECRET must be set");
        let access_hours = hours_from_env("GAMEHUB_JWT_EXPIRES_IN_HOURS", 168);
        let refresh_hours = hours_from_env("GAMEHUB_JWT_REFRESH_EXPIRES_IN_HOURS", 720);
        Self::with_secrets(
            access_secret.as_bytes(),
            refresh_secret.as_bytes(),
            chrono::Duration::hours(access_hours),
            chrono::Duration::hours(refresh_hours),
        )
    }

    pub fn with_secrets(
        access_secret: &[u8],
        refresh_secret: &[u8],
        access_ttl: chrono::Duration,
        refresh_ttl: chrono::Duration,
    ) -> Self {
        Self {
            access: Keys::new(access_secret),
            refresh: Keys::new(refresh_secret),
            access_ttl,
            refresh_ttl,
        }
    }

    fn issue(&self, user_id: UserId, kind: TokenKind) -> Result<String, TokenError> {
        let (keys, ttl) = match kind {
            TokenKind::Access => (&self.access, self.access_ttl),
            TokenKind::Refresh => (&self.refresh, self.refresh_ttl),
        };
        let now = chrono::Utc::now();
        let claims = Claims {
            user_id,
            kind,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &keys.encoding).map_err(|e| TokenError(e.to_string()))
    }

    fn verify(&self, token: &str, kind: TokenKind) -> Option<UserId> {
        let keys = match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        };
        match decode::<Claims>(token, &keys.decoding, &Validation::default()) {
            Ok(data) if data.claims.kind == kind => Some(data.claims.user_id),
            Ok(_) => None,
            Err(e) => {
                log::debug!("Rejected token: {}", e);
                None
            }
        }
    }
}

fn hours_from_env(name: &str, default: i64) -> i64 {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|_| panic!("{} must be a number of hours", name)),
        Err(_) => default,
    }
}

impl TokenPort for JwtTokenService {
    fn issue_access_token(&self, user_id: UserId) -> Result<String, TokenError> {
        self.issue(user_id, TokenKind::Access)
    }

    fn issue_refresh_token(&self, user_id: UserId) -> Result<String, TokenError> {
        self.issue(user_id, TokenKind::Refresh)
    }

    fn verify_access_token(&self, token: &str) -> Option<UserId> {
        self.verify(token, TokenKind::Access)
    }

    fn verify_refresh_token(&self, token: &str) -> Option<UserId> {
        self.verify(token, TokenKind::Refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtTokenService {
        JwtTokenService::with_secrets(
            b"access-secret",
            b"refresh-secret",
            chrono::Duration::hours(1),
            chrono::Duration::hours(2),
        )
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service();
        let user_id = UserId::new();
        let access = tokens.issue_access_token(user_id).unwrap();
        let refresh = tokens.issue_refresh_token(user_id).unwrap();
        assert_eq!(tokens.verify_access_token(&access), Some(user_id));
        assert_eq!(tokens.verify_refresh_token(&refresh), Some(user_id));
    }

    #[test]
    fn test_token_kinds_do_not_mix() {
        let tokens = service();
        let user_id = UserId::new();
        let refresh = tokens.issue_refresh_token(user_id).unwrap();
        assert_eq!(tokens.verify_access_token(&refresh), None);

        // same secret for both kinds still keeps them apart
        let shared = JwtTokenService::with_secrets(
            b"shared",
            b"shared",
            chrono::Duration::hours(1),
            chrono::Duration::hours(1),
        );
        let refresh = shared.issue_refresh_token(user_id).unwrap();
        assert_eq!(shared.verify_access_token(&refresh), None);
    }

    #[test]
    fn test_tampered_and_expired_tokens() {
        let tokens = service();
        let user_id = UserId::new();
        let mut access = tokens.issue_access_token(user_id).unwrap();
        access.push('x');
        assert_eq!(tokens.verify_access_token(&access), None);

        let expired = JwtTokenService::with_secrets(
            b"access-secret",
            b"refresh-secret",
            chrono::Duration::hours(-2),
            chrono::Duration::hours(-2),
        );
        let stale = expired.issue_access_token(user_id).unwrap();
        assert_eq!(tokens.verify_access_token(&stale), None);
    }
}
