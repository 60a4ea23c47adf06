//! Small URL, HTML and hashing helpers shared across the build

mod html;
mod url;

use anyhow::Result;
use std::path::Path;

pub use html::*;
pub use url::*;

/// Calculate a hash of some bytes; stable across builds and toolchains
pub fn hash_bytes(data: &[u8]) -> u64 {
    rapidhash::v3::rapidhash_v3(data)
}

/// Hash of a file's contents as a 16-digit hex string
pub fn hash_file(path: &Path) -> Result<String> {
    let data = std::fs::read(path)?;
    Ok(format!("{:016x}", hash_bytes(&data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_bytes_is_deterministic() {
        assert_eq!(hash_bytes(b"hello"), hash_bytes(b"hello"));
        assert_ne!(hash_bytes(b"hello"), hash_bytes(b"hello!"));
    }

    #[test]
    fn test_hash_file_is_hex() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "content").unwrap();

        let hash = hash_file(&path).unwrap();
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, format!("{:016x}", hash_bytes(b"content")));
    }
}
