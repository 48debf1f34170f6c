//! Argon2id password hashing
//!
//! The digest is a PHC string carrying algorithm, parameters, and a random
//! salt, so `verify` needs nothing beyond the digest itself. Verification is
//! constant-time inside the argon2 crate and never errors: a digest we cannot
//! parse is simply not a match.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Work-factor knobs, configurable per deployment
#[derive(Debug, Clone)]
pub struct HashParams {
    /// Memory cost in KiB (default: 19456 = 19 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 2)
    pub time_cost: u32,
    /// Parallelism (default: 1)
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 19456,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

/// Hash a password with a freshly generated salt.
pub fn hash(password: &str, params: &HashParams) -> anyhow::Result<String> {
    let argon2_params = Params::new(params.mem_cost_kib, params.time_cost, params.parallelism, None)
        .map_err(|e| anyhow::anyhow!("invalid Argon2id params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let salt = SaltString::generate(&mut OsRng);
    let digest = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;

    Ok(digest.to_string())
}

/// Check a password against a stored digest. Returns `false` (never an error)
/// for a mismatch or a malformed digest.
pub fn verify(password: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> HashParams {
        HashParams {
            mem_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let digest = hash("pw123456", &fast_params()).unwrap();

        assert!(verify("pw123456", &digest));
        assert!(!verify("pw1234567", &digest));
        assert!(!verify("", &digest));
    }

    #[test]
    fn test_salted_digests_differ() {
        let params = fast_params();
        let d1 = hash("same-password", &params).unwrap();
        let d2 = hash("same-password", &params).unwrap();

        assert_ne!(d1, d2, "fresh salt per hash");
        assert!(verify("same-password", &d1));
        assert!(verify("same-password", &d2));
    }

    #[test]
    fn test_digest_is_phc_string() {
        let digest = hash("pw", &fast_params()).unwrap();
        assert!(digest.starts_with("$argon2id$"));
    }

    #[test]
    fn test_verify_malformed_digest_is_false() {
        assert!(!verify("pw", ""));
        assert!(!verify("pw", "not-a-digest"));
        assert!(!verify("pw", "$argon2id$v=19$garbage"));
    }
}
