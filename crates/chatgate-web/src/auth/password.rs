use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Checks `password` against a stored PHC string.
///
/// A wrong password is `Ok(false)`; only an unparseable hash is an error.
pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Runs a full argon2 verification for an account that does not exist, so
/// unknown and known emails take the same time. Always `Ok(false)`.
pub fn verify_unknown_account(password: &str) -> anyhow::Result<bool> {
    let hash = match DUMMY_HASH.get() {
        Some(hash) => hash,
        None => {
            let hash = hash_password("chatgate-unknown-account")?;
            DUMMY_HASH.get_or_init(|| hash)
        }
    };
    verify_password(password, hash)?;
    Ok(false)
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn salts_differ() {
        assert_ne!(hash_password("pw").unwrap(), hash_password("pw").unwrap());
    }

    #[test]
    fn unknown_account_never_verifies() {
        assert!(!verify_unknown_account("anything").unwrap());
        assert!(!verify_unknown_account("chatgate-unknown-account").unwrap());
        assert!(DUMMY_HASH.get().is_some_and(|h| h.starts_with("$argon2")));
    }

    #[test]
    fn malformed_hash_is_error() {
        assert!(verify_password("pw", "not-a-phc-string").is_err());
    }
}
