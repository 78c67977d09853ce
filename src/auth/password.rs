// src/auth/password.rs

//! PBKDF2-HMAC-SHA256 password hashes.
//!
//! Stored form: `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::errors::ServerError;

// Unoptimized test builds hash far slower.
pub const DEFAULT_ITERATIONS: u32 = if cfg!(test) { 1_000 } else { 600_000 };
const SALT_BYTES: usize = 16;
const SCHEME: &str = "pbkdf2-sha256";

pub fn hash_password(password: &str) -> String {
    hash_with(&mut OsRng, password, DEFAULT_ITERATIONS)
}

pub fn hash_with<R: RngCore>(rng: &mut R, password: &str, iterations: u32) -> String {
    let mut salt = [0u8; SALT_BYTES];
    rng.fill_bytes(&mut salt);
    let digest = stretch(&salt, password, iterations);
    format!(
        "{SCHEME}${iterations}${}${}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(digest)
    )
}

/// Checks `password` against a stored hash. Malformed hashes are an internal error.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, ServerError> {
    let malformed = || ServerError::InternalError("malformed password hash".into());

    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(iters), Some(salt), Some(hash), None) =
        (parts.next(), parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };

    let iterations: u32 = iters
        .parse()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(malformed)?;
    let salt = URL_SAFE_NO_PAD.decode(salt).map_err(|_| malformed())?;
    let expected = URL_SAFE_NO_PAD.decode(hash).map_err(|_| malformed())?;

    let actual = stretch(&salt, password, iterations);
    Ok(hashes_equal(&actual, &expected))
}

fn stretch(salt: &[u8], password: &str, iterations: u32) -> [u8; 32] {
    let mut digest = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut digest);
    digest
}

/// Constant-time-ish compare (length is not secret).
pub fn hashes_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
