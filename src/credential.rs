/// Password hashing integration
///
/// The hashing primitive is Argon2id; this module only wraps it behind the
/// `CredentialStore` seam so services never touch the algorithm directly.
use crate::error::{HoaxError, HoaxResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// One-way secret hashing and verification
pub trait CredentialStore: Send + Sync {
    /// Hash a secret with a fresh random salt
    fn hash(&self, secret: &str) -> HoaxResult<String>;

    /// Check a secret against a stored hash. Never fails; malformed hashes do not match.
    fn verify(&self, secret: &str, hashed: &str) -> bool;
}

/// Argon2id credential store with default parameters
#[derive(Clone, Default)]
pub struct Argon2CredentialStore {
    argon2: Argon2<'static>,
}

impl Argon2CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for Argon2CredentialStore {
    fn hash(&self, secret: &str) -> HoaxResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HoaxError::Internal(format!("Password hashing failed: {}", e)))
    }

    fn verify(&self, secret: &str, hashed: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hashed) {
            Ok(p) => p,
            Err(_) => return false,
        };

        self.argon2
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let store = Argon2CredentialStore::new();
        let hash = store.hash("P4ssword").unwrap();

        assert!(store.verify("P4ssword", &hash));
        assert!(!store.verify("incorrectPwd", &hash));
    }

    #[test]
    fn test_salt_differs_per_call() {
        let store = Argon2CredentialStore::new();
        let first = store.hash("P4ssword").unwrap();
        let second = store.hash("P4ssword").unwrap();

        assert_ne!(first, second);
        assert!(store.verify("P4ssword", &second));
    }

    #[test]
    fn test_malformed_hash_does_not_match() {
        let store = Argon2CredentialStore::new();
        assert!(!store.verify("P4ssword", "not-a-phc-string"));
        assert!(!store.verify("P4ssword", ""));
    }
}
