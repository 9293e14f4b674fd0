//! Signed session tokens.
//!
//! A session is an HS256 JWT whose claims carry the user identity and an
//! explicit validity window. Signature checks happen in [`SessionCodec`];
//! the time window is checked by [`validate_claims`] against a caller-given
//! clock so it stays deterministic under test.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockroom_core::UserId;

use crate::User;

/// Session claims model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the logged-in user.
    pub sub: UserId,

    pub username: String,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    pub fn for_user(user: &User, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: user.id,
            username: user.username.clone(),
            issued_at: now,
            expires_at: now + ttl,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate session claims.
///
/// Note: this validates the *claims* only. Signature verification happens
/// in [`SessionCodec::validate`].
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed or forged token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Issues and validates HS256 session tokens with one shared secret.
pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry lives in our own claims, checked by `validate_claims`.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token for `user` valid from `now` for the configured TTL.
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<String, SessionError> {
        let claims = SessionClaims::for_user(user, now, self.ttl);
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &self.validation)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

impl core::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionCodec").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn test_user() -> User {
        User {
            id: UserId::new(5),
            username: "ana".to_string(),
            password_hash: String::new(),
            date_joined: test_time(),
        }
    }

    #[test]
    fn issued_token_validates_within_window() {
        let codec = SessionCodec::new(b"secret", Duration::minutes(30));
        let token = codec.issue(&test_user(), test_time()).unwrap();
        let claims = codec
            .validate(&token, test_time() + Duration::minutes(29))
            .unwrap();
        assert_eq!(claims.sub, UserId::new(5));
        assert_eq!(claims.username, "ana");
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = SessionCodec::new(b"secret", Duration::minutes(30));
        let token = codec.issue(&test_user(), test_time()).unwrap();
        let err = codec
            .validate(&token, test_time() + Duration::minutes(30))
            .unwrap_err();
        assert!(matches!(err, SessionError::Claims(TokenValidationError::Expired)));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = SessionCodec::new(b"one", Duration::minutes(30));
        let verifier = SessionCodec::new(b"two", Duration::minutes(30));
        let token = issuer.issue(&test_user(), test_time()).unwrap();
        assert!(matches!(
            verifier.validate(&token, test_time()),
            Err(SessionError::Token(_))
        ));
    }

    #[test]
    fn claims_window_checks() {
        let now = test_time();
        let mut claims = SessionClaims::for_user(&test_user(), now, Duration::minutes(1));
        assert_eq!(validate_claims(&claims, now - Duration::seconds(1)), Err(TokenValidationError::NotYetValid));

        claims.expires_at = claims.issued_at;
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::InvalidTimeWindow));
    }
}
