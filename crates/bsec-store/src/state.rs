use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::errors::Result;
use crate::paths::state_path;

/// Algorithm state file. The companion owns its contents; the supervisor only
/// makes sure it exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateArtifact {
    pub path: PathBuf,
    /// Whether this call created the file.
    pub created: bool,
}

/// Create `<base>/bsec-library.state` if missing. An existing file is never
/// truncated.
pub fn ensure_state(base: &Path) -> Result<StateArtifact> {
    let path = state_path(base);
    match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(_) => {
            info!("Created blank BSEC-Library state file.");
            Ok(StateArtifact { path, created: true })
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            info!("Found existing BSEC-Library state file, skipping creation.");
            Ok(StateArtifact { path, created: false })
        }
        Err(e) => Err(e.into()),
    }
}
