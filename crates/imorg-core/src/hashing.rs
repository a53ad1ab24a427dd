use sha2::{Digest, Sha256, Sha512};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::config::HashAlgorithm;
use crate::error::Result;
use crate::types::FileDigest;

/// Read buffer size for incremental hashing
const CHUNK_SIZE: usize = 8192;

/// Compute the content digest of a file with the selected algorithm.
///
/// The file is read in fixed-size chunks and fed into an incremental digest,
/// so arbitrarily large images never load fully into memory. The digest
/// depends only on byte content, never on path or filesystem metadata.
pub fn compute_digest(path: impl AsRef<Path>, algorithm: HashAlgorithm) -> Result<FileDigest> {
    let bytes = match algorithm {
        HashAlgorithm::Sha256 => digest_file::<Sha256>(path.as_ref())?,
        HashAlgorithm::Sha512 => digest_file::<Sha512>(path.as_ref())?,
    };

    Ok(FileDigest { bytes, algorithm })
}

fn digest_file<D: Digest>(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut hasher = D::new();

    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_vec())
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_digest_is_deterministic() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.jpg");
        let second = dir.path().join("b.jpg");
        fs::write(&first, b"identical bytes").unwrap();
        fs::write(&second, b"identical bytes").unwrap();

        let digest_a = compute_digest(&first, HashAlgorithm::Sha256).unwrap();
        let digest_b = compute_digest(&second, HashAlgorithm::Sha256).unwrap();
        let digest_a_again = compute_digest(&first, HashAlgorithm::Sha256).unwrap();

        assert_eq!(digest_a, digest_a_again);
        assert_eq!(digest_a.bytes, digest_b.bytes);
    }

    #[test]
    fn test_known_sha256_vector() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc.jpg");
        fs::write(&path, b"abc").unwrap();

        let digest = compute_digest(&path, HashAlgorithm::Sha256).unwrap();
        assert_eq!(
            digest.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_algorithms_produce_distinct_digests() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        fs::write(&path, b"some image bytes").unwrap();

        let sha256 = compute_digest(&path, HashAlgorithm::Sha256).unwrap();
        let sha512 = compute_digest(&path, HashAlgorithm::Sha512).unwrap();

        assert_eq!(sha256.bytes.len(), 32);
        assert_eq!(sha512.bytes.len(), 64);
        assert_ne!(sha256.bytes, sha512.bytes);
    }

    #[test]
    fn test_content_larger_than_one_chunk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.jpg");
        fs::write(&path, vec![0x5au8; CHUNK_SIZE * 3 + 17]).unwrap();

        let digest = compute_digest(&path, HashAlgorithm::Sha256).unwrap();
        assert_eq!(digest.bytes.len(), 32);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = compute_digest(dir.path().join("missing.jpg"), HashAlgorithm::Sha256);
        assert!(result.is_err());
    }
}
