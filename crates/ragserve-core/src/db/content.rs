//! Content hashing

use sha2::{Digest, Sha256};

/// Hex SHA-256 of a passage body, stored alongside each passage
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_and_content_sensitive() {
        let hash = hash_content("hello");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_content("hello"));
        assert_ne!(hash, hash_content("hello!"));
    }
}
