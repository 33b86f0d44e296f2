//! JWT session tokens.
//!
//! Handles token issuance and validation, and the session cookie that
//! carries a token to browsers.
//!
//! Tokens are stateless HS256 JWTs: validity is decided by signature and
//! `exp` alone. There is no revocation list; a token stays valid until it
//! expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind as JwtErrorKind, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use stockroom_core::UserId;

/// Cookie that carries the session token.
pub const SESSION_COOKIE_NAME: &str = "Authorization";

/// Token failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Token signature does not verify")]
    BadSignature,

    #[error("Token is malformed")]
    Malformed,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// A freshly signed token and when it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT token issuer.
///
/// Built once at startup from the process-wide secret and shared read-only.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenIssuer {
    /// Create a new issuer.
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp < now` is expired, no grace period
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        TokenIssuer {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
        }
    }

    /// Token lifetime.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a token for `subject` valid from now.
    pub fn issue(&self, subject: UserId) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, subject: UserId, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_at = now
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| TokenError::Signing("expiry out of range".to_string()))?;

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validate a token and return its subject.
    pub fn validate(&self, token: &str) -> Result<UserId, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                JwtErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            }
        })?;

        data.claims.sub.parse().map_err(|_| TokenError::Malformed)
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Extract the session token from a `Cookie` request header.
pub fn extract_cookie_token(cookie_header: &str) -> Option<&str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.trim())
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Session Cookie
// =============================================================================

/// `Set-Cookie` value for a session token.
///
/// Host-only (no `Domain`), unreadable from JavaScript (`HttpOnly`), sent on
/// top-level navigations but not cross-site subrequests (`SameSite=Lax`), and
/// expiring together with the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub token: String,
    pub max_age_secs: i64,
    pub secure: bool,
}

impl SessionCookie {
    pub fn new(token: impl Into<String>, lifetime: Duration, secure: bool) -> Self {
        SessionCookie {
            token: token.into(),
            max_age_secs: lifetime.num_seconds(),
            secure,
        }
    }
}

impl fmt::Display for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE_NAME, self.token, self.max_age_secs
        )?;
        if self.secure {
            f.write_str("; Secure")?;
        }
        Ok(())
    }
}
