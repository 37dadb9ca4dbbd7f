//! Content hashes used as change detectors for cached files (not for security).

use crate::errors::Result;
use md5::{Digest, Md5};
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Lowercase hex MD5 of a file, streamed.
pub fn md5_file(path: &Path) -> Result<String> {
    let mut f = fs::File::open(path)?;
    let mut hasher = Md5::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = f.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// MD5 of a file, or `None` when it doesn't exist.
pub fn md5_file_if_exists(path: &Path) -> Result<Option<String>> {
    match md5_file(path) {
        Ok(h) => Ok(Some(h)),
        Err(crate::errors::StoreError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Read a hash record (hex text, surrounding whitespace ignored).
pub fn read_hash_record(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?.trim().to_lowercase())
}

/// Persist a hash record atomically (tmp + rename).
pub fn write_hash_record(path: &Path, digest: &str) -> Result<()> {
    let tmp = path.with_extension("md5.tmp");
    fs::write(&tmp, digest.as_bytes())?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn md5_matches_known_digest() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("f");
        fs::write(&p, b"hello world").unwrap();
        assert_eq!(md5_file(&p).unwrap(), "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(md5_file_if_exists(&dir.path().join("nope")).unwrap(), None);
    }

    #[test]
    fn record_is_trimmed_and_case_folded() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("x.md5");
        fs::write(&p, "  ABCDEF0123\n").unwrap();
        assert_eq!(read_hash_record(&p).unwrap(), "abcdef0123");

        write_hash_record(&p, "00ff").unwrap();
        assert_eq!(read_hash_record(&p).unwrap(), "00ff");
        assert!(!dir.path().join("x.md5.tmp").exists());
    }
}
