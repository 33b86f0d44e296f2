//! Registration, login and token authentication.
//!
//! ## Login Flow
//! ```text
//! Received ──► Validated ──► CredentialsChecked ──► TokenIssued
//!     │            │                 │
//!     └────────────┴─────────────────┴──────► Rejected(reason)
//! ```
//! The reason for a rejection is logged, but the caller always sees
//! [`ServiceError::InvalidCredentials`]. An unknown email still pays for one
//! password verification (against a throwaway hash) so response timing
//! does not reveal which accounts exist.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use stockroom_core::validation::{normalize_email, validate_email, validate_password};
use stockroom_core::{User, UserId};
use stockroom_db::{Database, DbError};

use crate::auth::{SessionCookie, TokenIssuer};
use crate::credentials::{CredentialStore, HashedPassword};
use crate::error::{ServiceError, ServiceResult};
use crate::services::with_deadline;

/// Stages of a login attempt, recorded in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginStage {
    Received,
    Validated,
    CredentialsChecked,
    TokenIssued,
}

/// Why a login was rejected. Never shown to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RejectReason {
    InvalidInput,
    UnknownEmail,
    WrongPassword,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RejectReason::InvalidInput => "invalid_input",
            RejectReason::UnknownEmail => "unknown_email",
            RejectReason::WrongPassword => "wrong_password",
        })
    }
}

/// Successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user_id: UserId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// `Set-Cookie` value carrying the same token.
    pub cookie: SessionCookie,
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    db: Database,
    credentials: CredentialStore,
    tokens: Arc<TokenIssuer>,
    cookie_secure: bool,
    operation_timeout: Duration,
    dummy_hash: Arc<OnceCell<HashedPassword>>,
}

impl AuthService {
    pub fn new(
        db: Database,
        credentials: CredentialStore,
        tokens: Arc<TokenIssuer>,
        cookie_secure: bool,
        operation_timeout: Duration,
    ) -> Self {
        AuthService {
            db,
            credentials,
            tokens,
            cookie_secure,
            operation_timeout,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Creates an account and returns its id.
    ///
    /// ## Errors
    /// * `Validation` - Bad email format or password shorter than 8 characters
    /// * `DuplicateEmail` - The email (case-insensitively) is taken
    pub async fn register(&self, email: &str, password: &str) -> ServiceResult<UserId> {
        with_deadline(self.operation_timeout, self.register_inner(email, password)).await
    }

    async fn register_inner(&self, email: &str, password: &str) -> ServiceResult<UserId> {
        validate_email(email)?;
        validate_password(password)?;
        let email = normalize_email(email);

        let hashed = self.credentials.hash_blocking(password.to_string()).await?;

        let user = self
            .db
            .users()
            .insert(&email, hashed.as_str())
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation { .. } => ServiceError::DuplicateEmail,
                other => other.into(),
            })?;

        info!(user_id = user.id, "User registered");
        Ok(user.id)
    }

    /// Checks credentials and issues a session token.
    ///
    /// Every rejection is [`ServiceError::InvalidCredentials`].
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<LoginOutcome> {
        with_deadline(self.operation_timeout, self.login_inner(email, password)).await
    }

    async fn login_inner(&self, email: &str, password: &str) -> ServiceResult<LoginOutcome> {
        let mut stage = LoginStage::Received;
        debug!(?stage, "Login attempt");

        if validate_email(email).is_err() || password.is_empty() {
            return Err(reject(stage, RejectReason::InvalidInput));
        }
        let email = normalize_email(email);
        stage = LoginStage::Validated;
        debug!(?stage, "Login input accepted");

        let user = self.db.users().find_by_email(&email).await?;

        let user = match user {
            Some(user) => user,
            None => {
                let dummy = self.dummy_hash().await?;
                self.credentials
                    .verify_blocking(password.to_string(), dummy)
                    .await?;
                return Err(reject(stage, RejectReason::UnknownEmail));
            }
        };

        let matches = self
            .credentials
            .verify_blocking(
                password.to_string(),
                HashedPassword::from_stored(user.password_hash),
            )
            .await?;
        if !matches {
            return Err(reject(stage, RejectReason::WrongPassword));
        }
        stage = LoginStage::CredentialsChecked;
        debug!(?stage, user_id = user.id, "Password verified");

        let issued = self.tokens.issue(user.id)?;
        stage = LoginStage::TokenIssued;
        info!(?stage, user_id = user.id, expires_at = %issued.expires_at, "Login succeeded");

        let cookie = SessionCookie::new(
            issued.token.clone(),
            self.tokens.lifetime(),
            self.cookie_secure,
        );

        Ok(LoginOutcome {
            user_id: user.id,
            token: issued.token,
            expires_at: issued.expires_at,
            cookie,
        })
    }

    /// Resolves a session token to its user id.
    pub fn authenticate(&self, token: &str) -> ServiceResult<UserId> {
        self.tokens.validate(token).map_err(|e| {
            debug!(error = %e, "Token rejected");
            e.into()
        })
    }

    /// Loads the account behind an authenticated session.
    ///
    /// A token for an account that no longer exists is `Unauthorized`.
    pub async fn current_user(&self, id: UserId) -> ServiceResult<User> {
        with_deadline(self.operation_timeout, async {
            self.db.users().get_by_id(id).await.map_err(|e| match e {
                DbError::NotFound { .. } => {
                    ServiceError::Unauthorized("Account no longer exists".to_string())
                }
                other => other.into(),
            })
        })
        .await
    }

    async fn dummy_hash(&self) -> ServiceResult<HashedPassword> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| {
                self.credentials
                    .hash_blocking("stockroom-timing-equaliser".to_string())
            })
            .await?;
        Ok(hash.clone())
    }
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService")
            .field("tokens", &self.tokens)
            .field("cookie_secure", &self.cookie_secure)
            .field("operation_timeout", &self.operation_timeout)
            .finish_non_exhaustive()
    }
}

fn reject(stage: LoginStage, reason: RejectReason) -> ServiceError {
    warn!(?stage, %reason, "Login rejected");
    ServiceError::InvalidCredentials
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::HashCost;
    use crate::error::ErrorKind;
    use stockroom_db::DbConfig;

    async fn service() -> AuthService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AuthService::new(
            db,
            CredentialStore::new(HashCost::minimal()).unwrap(),
            Arc::new(TokenIssuer::new("test-secret", chrono::Duration::days(30))),
            false,
            Duration::from_secs(10),
        )
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let auth = service().await;

        let id = auth.register("Owner@Acme.com", "hunter2hunter2").await.unwrap();
        let outcome = auth.login("owner@acme.com", "hunter2hunter2").await.unwrap();

        assert_eq!(outcome.user_id, id);
        assert_eq!(auth.authenticate(&outcome.token).unwrap(), id);
        assert!(outcome.cookie.to_string().contains("HttpOnly"));
        assert_eq!(outcome.cookie.max_age_secs, 30 * 24 * 60 * 60);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let auth = service().await;

        auth.register("a@acme.com", "password123").await.unwrap();
        let err = auth.register("A@ACME.com", "password456").await.unwrap_err();

        assert!(matches!(err, ServiceError::DuplicateEmail));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let auth = service().await;

        let err = auth.register("not-an-email", "password123").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = auth.register("a@acme.com", "1234567").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        // Exactly 8 is enough
        auth.register("a@acme.com", "12345678").await.unwrap();
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let auth = service().await;
        auth.register("a@acme.com", "password123").await.unwrap();

        let wrong_password = auth.login("a@acme.com", "password124").await.unwrap_err();
        let unknown_email = auth.login("b@acme.com", "password123").await.unwrap_err();
        let bad_input = auth.login("nonsense", "").await.unwrap_err();

        for err in [&wrong_password, &unknown_email, &bad_input] {
            assert!(matches!(err, ServiceError::InvalidCredentials));
        }
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_password_is_stored_hashed() {
        let auth = service().await;
        auth.register("a@acme.com", "password123").await.unwrap();

        let user = auth.db.users().find_by_email("a@acme.com").await.unwrap().unwrap();
        assert_ne!(user.password_hash, "password123");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_current_user() {
        let auth = service().await;
        let id = auth.register("Owner@Acme.com", "password123").await.unwrap();

        let user = auth.current_user(id).await.unwrap();
        assert_eq!(user.email, "owner@acme.com");

        let err = auth.current_user(id + 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_authenticate_rejects_garbage() {
        let auth = service().await;
        let err = auth.authenticate("garbage").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}
