use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

const TOKEN_LEN: usize = 40;

/// Generate a new opaque bearer token. The plaintext is returned to the
/// client once; only its digest is ever stored.
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// SHA-256 hex digest of a plaintext token, as persisted in auth_tokens.
pub fn hash_token(plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plain.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_opaque_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn hash_is_deterministic_hex() {
        let token = generate_token();
        let first = hash_token(&token);
        assert_eq!(first, hash_token(&token));
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, token);
    }
}
