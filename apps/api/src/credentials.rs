//! # Credential Store
//!
//! Salted, deliberately slow password hashing with Argon2id.
//!
//! ## Hash Format
//! ```text
//! $argon2id$v=19$m=19456,t=2,p=1$<salt, base64>$<hash, base64>
//!  └─ alg ─┘└ ver ┘└── cost ────┘ └─ 16 random bytes ─┘
//! ```
//! The PHC string carries its own algorithm, cost and salt, so hashes made
//! under an older [`HashCost`] keep verifying after the cost is raised.
//!
//! ## Blocking
//! Hashing burns ~20 MiB and tens of milliseconds of CPU on purpose. The
//! `*_blocking` helpers move that work onto tokio's blocking pool so it never
//! stalls the reactor.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Errors
// =============================================================================

/// Credential store failures. A wrong password is *not* an error.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The hashing primitive could not complete.
    #[error("Password hashing failed: {0}")]
    HashingFailure(String),

    /// A stored hash is not a valid PHC string.
    #[error("Stored password hash is corrupt: {0}")]
    CorruptHash(String),

    /// Cost parameters rejected by Argon2.
    #[error("Invalid hash cost: {0}")]
    InvalidCost(String),
}

// =============================================================================
// Types
// =============================================================================

/// Argon2 cost factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl HashCost {
    /// Cheapest parameters Argon2 accepts. For tests only.
    pub fn minimal() -> Self {
        HashCost {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

impl Default for HashCost {
    /// OWASP baseline for Argon2id: 19 MiB, 2 passes, 1 lane.
    fn default() -> Self {
        HashCost {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// A PHC-format password hash. Never holds plaintext.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Wraps a hash read back from storage.
    pub fn from_stored(hash: impl Into<String>) -> Self {
        HashedPassword(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword(..)")
    }
}

// =============================================================================
// Credential Store
// =============================================================================

/// Hashes and verifies passwords.
///
/// ## Example
/// ```rust
/// use stockroom_api::credentials::{CredentialStore, HashCost};
///
/// let store = CredentialStore::new(HashCost::minimal()).unwrap();
/// let hashed = store.hash("correct horse").unwrap();
///
/// assert!(store.verify("correct horse", &hashed).unwrap());
/// assert!(!store.verify("wrong horse", &hashed).unwrap());
/// ```
#[derive(Clone)]
pub struct CredentialStore {
    hasher: Argon2<'static>,
}

impl CredentialStore {
    /// Creates a store hashing with the given cost.
    pub fn new(cost: HashCost) -> Result<Self, CredentialError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| CredentialError::InvalidCost(e.to_string()))?;

        Ok(CredentialStore {
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hashes a password under a fresh random salt.
    ///
    /// Two calls with the same password never return the same string.
    pub fn hash(&self, password: &str) -> Result<HashedPassword, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .hasher
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CredentialError::HashingFailure(e.to_string()))?;

        Ok(HashedPassword(hash.to_string()))
    }

    /// Checks a password against a stored hash.
    ///
    /// ## Returns
    /// * `Ok(true)` / `Ok(false)` - Match / mismatch (constant-time compare)
    /// * `Err(CorruptHash)` - The stored string is not a usable hash
    pub fn verify(&self, password: &str, hashed: &HashedPassword) -> Result<bool, CredentialError> {
        let parsed = PasswordHash::new(hashed.as_str())
            .map_err(|e| CredentialError::CorruptHash(e.to_string()))?;

        match self.hasher.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CredentialError::CorruptHash(e.to_string())),
        }
    }

    /// [`Self::hash`] on the blocking thread pool.
    pub async fn hash_blocking(&self, password: String) -> Result<HashedPassword, CredentialError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.hash(&password))
            .await
            .map_err(|e| CredentialError::HashingFailure(e.to_string()))?
    }

    /// [`Self::verify`] on the blocking thread pool.
    pub async fn verify_blocking(
        &self,
        password: String,
        hashed: HashedPassword,
    ) -> Result<bool, CredentialError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.verify(&password, &hashed))
            .await
            .map_err(|e| CredentialError::HashingFailure(e.to_string()))?
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("params", self.hasher.params())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CredentialStore {
        CredentialStore::new(HashCost::minimal()).unwrap()
    }

    #[test]
    fn test_verify_own_hash() {
        let store = store();
        for password in ["12345678", "correct horse battery staple", "pässwörd-ünïcode"] {
            let hashed = store.hash(password).unwrap();
            assert!(store.verify(password, &hashed).unwrap());
        }
    }

    #[test]
    fn test_wrong_password_is_false_not_error() {
        let store = store();
        let hashed = store.hash("password-one").unwrap();
        assert!(!store.verify("password-two", &hashed).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let store = store();
        let a = store.hash("same password").unwrap();
        let b = store.hash("same password").unwrap();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("$argon2id$"));
    }

    #[test]
    fn test_corrupt_hash() {
        let store = store();
        let err = store
            .verify("whatever", &HashedPassword::from_stored("not-a-hash"))
            .unwrap_err();
        assert!(matches!(err, CredentialError::CorruptHash(_)));
    }

    #[test]
    fn test_hash_from_other_cost_still_verifies() {
        let old = CredentialStore::new(HashCost {
            memory_kib: 16,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        let hashed = old.hash("migrated").unwrap();

        assert!(store().verify("migrated", &hashed).unwrap());
    }

    #[test]
    fn test_invalid_cost() {
        let err = CredentialStore::new(HashCost {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        })
        .unwrap_err();
        assert!(matches!(err, CredentialError::InvalidCost(_)));
    }

    #[test]
    fn test_debug_hides_hash() {
        let hashed = store().hash("secret-password").unwrap();
        assert_eq!(format!("{:?}", hashed), "HashedPassword(..)");
    }

    #[tokio::test]
    async fn test_blocking_helpers() {
        let store = store();
        let hashed = store.hash_blocking("on the pool".to_string()).await.unwrap();
        assert!(store
            .verify_blocking("on the pool".to_string(), hashed.clone())
            .await
            .unwrap());
        assert!(!store
            .verify_blocking("off the pool".to_string(), hashed)
            .await
            .unwrap());
    }
}
