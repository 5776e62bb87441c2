//! Bcrypt hashing of generated passwords.

/// Work factor used for `bcrypt_hash`.
pub const BCRYPT_COST: u32 = 10;

/// Hash a password with bcrypt.
pub fn bcrypt_hash(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, BCRYPT_COST)
}

/// Whether `hash` is a bcrypt hash of `password`.
///
/// A malformed hash counts as a mismatch.
pub fn hash_matches(hash: &str, password: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_round_trip() {
        let hash = bcrypt_hash("correct horse").unwrap();
        assert!(hash.starts_with("$2"));
        assert!(hash_matches(&hash, "correct horse"));
        assert!(!hash_matches(&hash, "battery staple"));
    }

    #[test]
    fn test_malformed_hash_is_mismatch() {
        assert!(!hash_matches("not-a-hash", "anything"));
        assert!(!hash_matches("", "anything"));
    }
}
