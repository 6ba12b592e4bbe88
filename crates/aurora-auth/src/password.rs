//! Password hashing and verification using Argon2id.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use aurora_core::error::AuroraError;

fn argon2() -> Result<Argon2<'static>, AuroraError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| AuroraError::Crypto(format!("argon2 params error: {e}")))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hash a password with Argon2id. The salt is randomly generated for
/// each call; the result is a PHC-format string.
pub fn hash_password(password: &str) -> Result<String, AuroraError> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuroraError::Crypto(format!("password hash error: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or
/// `Err(Crypto)` if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuroraError> {
    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuroraError::Crypto(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuroraError::Crypto(format!("verify error: {e}"))),
    }
}
