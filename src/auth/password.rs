use crate::types::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordVerifier, SaltString},
    Argon2, PasswordHasher as _,
};

/// One-way adaptive password hashing using Argon2id.
///
/// Each `hash` call embeds a fresh random salt, so the same plaintext
/// produces a different PHC string every time while all of them remain
/// verifiable.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Stateless; default Argon2id parameters.
    pub fn new() -> Self {
        Self
    }

    /// Hashes a password into a PHC-formatted Argon2id string.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Verifies a password against a stored hash. Returns false for a
    /// mismatch and for a hash that cannot be parsed; never errors.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("Passw0rd!").unwrap();
        assert!(hasher.verify("Passw0rd!", &hash));
        assert!(!hasher.verify("wrong-password", &hash));
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let hasher = PasswordHasher::new();
        let first = hasher.hash("Passw0rd!").unwrap();
        let second = hasher.hash("Passw0rd!").unwrap();
        assert_ne!(first, second);
        assert!(hasher.verify("Passw0rd!", &first));
        assert!(hasher.verify("Passw0rd!", &second));
    }

    #[test]
    fn test_malformed_hash_verifies_false() {
        let hasher = PasswordHasher::new();
        assert!(!hasher.verify("anything", "not-a-phc-string"));
        assert!(!hasher.verify("anything", ""));
    }
}
