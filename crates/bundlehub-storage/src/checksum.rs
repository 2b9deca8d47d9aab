//! Streaming SHA-1 content checksums.

use std::path::Path;

use sha1::{Digest, Sha1};
use tokio::fs;
use tokio::io::AsyncReadExt;

use bundlehub_core::error::{AppError, ErrorKind};
use bundlehub_core::result::AppResult;

/// Read granularity for checksumming; keeps memory flat for large files.
const BLOCK_SIZE: usize = 64 * 1024;

/// Compute the SHA-1 digest of a file's contents as a lowercase hex string.
pub async fn sha1_checksum(path: &Path) -> AppResult<String> {
    let mut file = fs::File::open(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::missing_file(path.display())
        } else {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to open file: {}", path.display()),
                e,
            )
        }
    })?;

    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; BLOCK_SIZE];
    loop {
        let n = file.read(&mut buf).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read file: {}", path.display()),
                e,
            )
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();

        let sum = sha1_checksum(&path).await.unwrap();
        assert_eq!(sum, "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[tokio::test]
    async fn test_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello");
        std::fs::write(&path, b"hello world").unwrap();

        let sum = sha1_checksum(&path).await.unwrap();
        assert_eq!(sum, "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
    }

    #[tokio::test]
    async fn test_multi_block_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big");
        // Spans three read blocks; the digest must not depend on chunking.
        let data = vec![0xabu8; BLOCK_SIZE * 2 + 17];
        std::fs::write(&path, &data).unwrap();

        let expected = hex::encode(Sha1::digest(&data));
        assert_eq!(sha1_checksum(&path).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = sha1_checksum(&dir.path().join("absent")).await.unwrap_err();
        assert_eq!(err.kind, bundlehub_core::error::ErrorKind::MissingFile);
    }
}
