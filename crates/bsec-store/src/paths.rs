use std::path::{Path, PathBuf};

/// <base>/bsec-library
pub fn executable_path(base: &Path) -> PathBuf {
    base.join("bsec-library")
}

/// <base>/bsec-library.md5
pub fn hash_record_path(base: &Path) -> PathBuf {
    base.join("bsec-library.md5")
}

/// <base>/bsec-library.config
pub fn config_path(base: &Path) -> PathBuf {
    base.join("bsec-library.config")
}

/// <base>/bsec-library.state
pub fn state_path(base: &Path) -> PathBuf {
    base.join("bsec-library.state")
}

/// Compiler output before it is moved into place.
pub(crate) fn executable_tmp_path(base: &Path) -> PathBuf {
    base.join("bsec-library.tmp")
}

/// Vendor source directories start with this prefix.
pub const VENDOR_DIR_PREFIX: &str = "BSEC_";
