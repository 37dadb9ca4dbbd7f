use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::warn;

use crate::errors::Result;

/// Companion program: bus I/O glue around the vendor integration loop that
/// prints one JSON object per sample.
pub const COMPANION_SOURCE: &str = include_str!("../../assets/bsec-library.c");

/// Write the companion source unless a file is already there. Returns whether
/// it was written.
pub fn write_companion_source(path: &Path) -> Result<bool> {
    match fs::OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut f) => {
            warn!(
                "BSEC-Library source file not found, writing file: {}",
                path.display()
            );
            f.write_all(COMPANION_SOURCE.as_bytes())?;
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn existing_source_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("bsec-library.c");
        assert!(write_companion_source(&p).unwrap());
        assert_eq!(fs::read_to_string(&p).unwrap(), COMPANION_SOURCE);

        fs::write(&p, "/* patched locally */").unwrap();
        assert!(!write_companion_source(&p).unwrap());
        assert_eq!(fs::read_to_string(&p).unwrap(), "/* patched locally */");
    }
}
