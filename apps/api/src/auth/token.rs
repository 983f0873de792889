use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    /// Token id, the handle used to revoke a token on logout.
    pub jti: Uuid,
}

impl Claims {
    /// Time left until the token expires on its own; zero once expired.
    pub fn remaining(&self) -> std::time::Duration {
        let secs = (self.exp - Utc::now().timestamp()).max(0);
        std::time::Duration::from_secs(secs as u64)
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("Could not sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Cache key marking a token id as revoked.
pub fn revoked_key(jti: Uuid) -> String {
    format!("revoked:{jti}")
}

pub fn issue_token(
    user_id: Uuid,
    role: Role,
    secret: &str,
    ttl: Duration,
) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        role,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
        jti: Uuid::new_v4(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(TokenError::Signing)
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn issued_token_decodes_to_same_subject() {
        let user = Uuid::new_v4();
        let token = issue_token(user, Role::Recruiter, SECRET, Duration::days(30)).unwrap();

        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.role, Role::Recruiter);
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 60 * 60);
    }

    #[test]
    fn each_token_gets_its_own_id() {
        let user = Uuid::new_v4();
        let a = issue_token(user, Role::Applicant, SECRET, Duration::days(1)).unwrap();
        let b = issue_token(user, Role::Applicant, SECRET, Duration::days(1)).unwrap();
        assert_ne!(
            decode_token(&a, SECRET).unwrap().jti,
            decode_token(&b, SECRET).unwrap().jti
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let token =
            issue_token(Uuid::new_v4(), Role::Applicant, SECRET, Duration::seconds(-10)).unwrap();
        assert!(matches!(
            decode_token(&token, SECRET),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(Uuid::new_v4(), Role::Applicant, SECRET, Duration::days(1)).unwrap();
        assert!(matches!(
            decode_token(&token, "other-secret"),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(
            decode_token("not-a-jwt", SECRET),
            Err(TokenError::Invalid(_))
        ));
    }
}
