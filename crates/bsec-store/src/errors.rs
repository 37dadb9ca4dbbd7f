use std::path::PathBuf;
use thiserror::Error;

use bsec_hwprof::HwprofError;

/// Where operators are sent when the vendor tree is missing.
pub const BSEC_DOWNLOAD_URL: &str = "https://www.bosch-sensortec.com/bst/products/all_products/bsec";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(
        "BSEC source directory not found: expected a directory starting with 'BSEC_' under {} \
         containing the Bosch BSEC sources (download and unzip them from {})",
        .base.display(),
        BSEC_DOWNLOAD_URL
    )]
    MissingVendorSource { base: PathBuf },

    #[error("companion build failed (exit code {code:?}):\n{output}")]
    BuildFailed { code: Option<i32>, output: String },

    #[error("config write failed: {0}")]
    ConfigWriteFailed(String),

    #[error(transparent)]
    Platform(#[from] HwprofError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
