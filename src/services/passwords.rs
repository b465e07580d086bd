// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PBKDF2-SHA256 password hashes.
//!
//! Stored as `pbkdf2_sha256$<iterations>$<hex salt>$<base64 hash>`.

use std::num::NonZeroU32;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};

const ALGORITHM_TAG: &str = "pbkdf2_sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Iteration count for new hashes.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> anyhow::Result<String> {
    let iterations = NonZeroU32::new(iterations)
        .ok_or_else(|| anyhow::anyhow!("iteration count must be positive"))?;

    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| anyhow::anyhow!("failed to generate salt"))?;
    let salt = hex::encode(salt);

    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt.as_bytes(),
        password.as_bytes(),
        &mut hash,
    );

    Ok(format!(
        "{ALGORITHM_TAG}${iterations}${salt}${}",
        STANDARD.encode(hash)
    ))
}

/// Check `password` against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(tag), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if tag != ALGORITHM_TAG {
        return false;
    }
    let Some(iterations) = iterations.parse().ok().and_then(NonZeroU32::new) else {
        return false;
    };
    let Ok(expected) = STANDARD.decode(hash) else {
        return false;
    };

    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt.as_bytes(),
        password.as_bytes(),
        &expected,
    )
    .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("s3cret!", 1_000).unwrap();
        assert!(stored.starts_with("pbkdf2_sha256$1000$"));
        assert!(verify_password("s3cret!", &stored));
        assert!(!verify_password("s3cret?", &stored));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same", 1_000).unwrap();
        let b = hash_password("same", 1_000).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hashes_do_not_match() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "md5$1$ab$cd"));
        assert!(!verify_password("x", "pbkdf2_sha256$0$ab$cd"));
        assert!(!verify_password("x", "pbkdf2_sha256$10$ab$***"));
        assert!(!verify_password("x", "pbkdf2_sha256$10$ab$cd$extra"));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert!(hash_password("x", 0).is_err());
    }
}
