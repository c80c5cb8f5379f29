use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use rand::{
    distributions::{Alphanumeric, Distribution},
    rngs::StdRng,
    SeedableRng,
};
use thiserror::Error;

const TOKEN_LENGTH: usize = 64;

/// Reset tokens are single-use and short-lived.
const RESET_TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to hash password: {0}")]
    Hash(String),
}

/// Hashes a plaintext password into an argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CredentialError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies a plaintext password against a stored PHC string. An
/// unparseable stored hash counts as a mismatch, not an error.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Generates an opaque bearer token. Tokens are random alphanumeric
/// strings; they carry no claims and are resolved against the token table.
pub fn generate_token() -> String {
    let mut rng = StdRng::from_entropy();
    String::from_iter((0..TOKEN_LENGTH).map(|_| Alphanumeric.sample(&mut rng) as char))
}

/// Expiry timestamp for a password-reset token issued now.
pub fn reset_token_expiry(issued_at: DateTime<Utc>) -> DateTime<Utc> {
    issued_at + Duration::minutes(RESET_TOKEN_TTL_MINUTES)
}

/// A reset token is usable until its expiry timestamp passes.
pub fn reset_token_expired(expires: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > expires
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("demo123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("demo123", &hash));
        assert!(!verify_password("demo124", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("demo123", "not-a-phc-string"));
    }

    #[test]
    fn token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));

        // two draws colliding would mean the generator is broken
        assert_ne!(token, generate_token());
    }

    #[test]
    fn reset_token_expiry_window() {
        let issued = Utc::now();
        let expires = reset_token_expiry(issued);
        assert!(!reset_token_expired(expires, issued));
        assert!(!reset_token_expired(expires, issued + Duration::minutes(59)));
        assert!(reset_token_expired(expires, issued + Duration::minutes(61)));
    }
}
