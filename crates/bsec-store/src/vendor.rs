use std::fs;
use std::path::{Path, PathBuf};

use bsec_abi::{AlgorithmBackend, ConfigIdentity};
use tracing::{debug, error};

use crate::errors::{Result, StoreError, BSEC_DOWNLOAD_URL};
use crate::paths::VENDOR_DIR_PREFIX;

/// An unpacked Bosch BSEC distribution (`BSEC_1.4.7.2_GCC_CortexM4_20180907` etc).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorTree {
    root: PathBuf,
}

impl VendorTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Find the vendor tree under `base`. When several `BSEC_*` directories
    /// exist the lexically first one wins.
    pub fn locate(base: &Path) -> Result<Self> {
        let mut candidates: Vec<PathBuf> = fs::read_dir(base)?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(VENDOR_DIR_PREFIX))
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        candidates.sort();

        match candidates.into_iter().next() {
            Some(root) => {
                debug!("Using BSEC sources at {}", root.display());
                Ok(Self { root })
            }
            None => {
                error!("The BSEC source directory could not be located!");
                error!(
                    "Expected a directory name starting with '{VENDOR_DIR_PREFIX}' under '{}' containing the Bosch BSEC source files.",
                    base.display()
                );
                error!("Please download and unzip them from {BSEC_DOWNLOAD_URL}");
                Err(StoreError::MissingVendorSource {
                    base: base.to_path_buf(),
                })
            }
        }
    }
}

impl AlgorithmBackend for VendorTree {
    fn root(&self) -> &Path {
        &self.root
    }

    fn companion_source(&self) -> PathBuf {
        self.root.join("bsec-library.c")
    }

    fn sources(&self) -> Vec<PathBuf> {
        vec![
            self.root.join("API").join("bme680.c"),
            self.root.join("examples").join("bsec_integration.c"),
            self.companion_source(),
        ]
    }

    fn include_dirs(&self, lib_variant: &str) -> Vec<PathBuf> {
        vec![
            self.root.join("API"),
            self.root.join("algo").join(lib_variant),
            self.root.join("examples"),
        ]
    }

    fn library_dir(&self, lib_variant: &str) -> PathBuf {
        self.root.join("algo").join(lib_variant)
    }

    fn link_libs(&self) -> &'static [&'static str] {
        &["algobsec", "m", "rt"]
    }

    fn config_blob(&self, identity: &ConfigIdentity) -> PathBuf {
        self.root
            .join("config")
            .join(identity.as_str())
            .join("bsec_iaq.config")
    }
}
