//! Argon2id password hashing.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    Error as HashError, PasswordHash as EncodedHash, PasswordHasher as _, PasswordVerifier as _,
    SaltString,
};

use crate::domain::ports::{PasswordHasher, PasswordHashingError};
use crate::domain::{Password, PasswordHash};

/// Hashes passwords with Argon2id and a fresh random salt per hash.
#[derive(Default, Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    /// Hasher with the library's default Argon2id parameters.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &Password) -> Result<PasswordHash, PasswordHashingError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.expose().as_bytes(), &salt)
            .map(|encoded| PasswordHash::new(encoded.to_string()))
            .map_err(|error| PasswordHashingError::hash(error.to_string()))
    }

    fn verify(
        &self,
        password: &Password,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHashingError> {
        let encoded = EncodedHash::new(hash.as_ref())
            .map_err(|error| PasswordHashingError::malformed(error.to_string()))?;
        match self
            .argon2
            .verify_password(password.expose().as_bytes(), &encoded)
        {
            Ok(()) => Ok(true),
            Err(HashError::Password) => Ok(false),
            Err(error) => Err(PasswordHashingError::hash(error.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn hasher() -> Argon2PasswordHasher {
        Argon2PasswordHasher::new()
    }

    fn password(raw: &str) -> Password {
        Password::new(raw).expect("valid password")
    }

    #[rstest]
    fn hashes_verify_only_the_original_password(hasher: Argon2PasswordHasher) {
        let hash = hasher.hash(&password("correct horse")).expect("hashed");

        assert!(hasher.verify(&password("correct horse"), &hash).expect("verify"));
        assert!(!hasher.verify(&password("battery staple"), &hash).expect("verify"));
    }

    #[rstest]
    fn salts_differ_between_hashes(hasher: Argon2PasswordHasher) {
        let first = hasher.hash(&password("admin123")).expect("hashed");
        let second = hasher.hash(&password("admin123")).expect("hashed");

        assert_ne!(first.as_ref(), second.as_ref());
        assert!(first.as_ref().starts_with("$argon2id$"));
    }

    #[rstest]
    fn malformed_hashes_are_rejected(hasher: Argon2PasswordHasher) {
        let err = hasher
            .verify(&password("admin123"), &PasswordHash::new("plaintext"))
            .expect_err("malformed");

        assert!(matches!(err, PasswordHashingError::Malformed { .. }));
    }
}
