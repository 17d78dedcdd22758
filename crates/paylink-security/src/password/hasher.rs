//! Argon2id password hashing.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use paylink_core::{PaylinkError, PaylinkResult};
use std::sync::Arc;

/// Hashes and checks user passwords.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Arc<Argon2<'static>>,
}

impl PasswordHasher {
    /// Creates a hasher with the library's default cost.
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(Params::DEFAULT)
    }

    /// Creates a hasher with explicit Argon2 parameters.
    #[must_use]
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Arc::new(Argon2::new(Algorithm::Argon2id, Version::V0x13, params)),
        }
    }

    /// Creates a deliberately cheap hasher for tests.
    #[must_use]
    pub fn fast() -> Self {
        Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None)
            .map_or_else(|_| Self::new(), Self::with_params)
    }

    /// Hashes `password` with a fresh salt into a PHC string.
    pub fn hash(&self, password: &str) -> PaylinkResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PaylinkError::internal(format!("Failed to hash password: {}", e)))
    }

    /// Returns whether `password` matches the stored `hash`.
    pub fn verify(&self, password: &str, hash: &str) -> PaylinkResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| PaylinkError::internal(format!("Invalid password hash format: {}", e)))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PaylinkError::internal(format!("Password verification error: {}", e))),
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::fast();
        let hash = hasher.hash("correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse", &hash).unwrap());
        assert!(!hasher.verify("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let hasher = PasswordHasher::fast();
        assert_ne!(hasher.hash("secret123").unwrap(), hasher.hash("secret123").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let err = PasswordHasher::fast().verify("pw", "plaintext").unwrap_err();
        assert_eq!(err.status_code(), 500);
    }
}
