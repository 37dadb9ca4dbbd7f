use std::io;
use std::path::PathBuf;
use std::time::Duration;

use bsec_hwprof::HwprofError;
use bsec_store::errors::BSEC_DOWNLOAD_URL;
use bsec_store::StoreError;
use thiserror::Error;

use crate::profile::ParamViolation;

#[derive(Debug, Error)]
pub enum BsecError {
    #[error("invalid parameter(s): {}", join(.0))]
    InvalidParameter(Vec<ParamViolation>),

    #[error(
        "BSEC source directory not found under {} (download and unzip it from {})",
        .base.display(),
        BSEC_DOWNLOAD_URL
    )]
    MissingVendorSource { base: PathBuf },

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("companion build failed (exit code {code:?}):\n{output}")]
    BuildFailed { code: Option<i32>, output: String },

    #[error("config write failed: {0}")]
    ConfigWriteFailed(String),

    #[error("companion exited during startup (exit code {code:?})")]
    ProcessStartupFailed { code: Option<i32> },

    #[error("sensor reported error status {status}")]
    DeviceReportedError { status: String },

    #[error("undecodable companion output {line:?}: {source}")]
    MalformedOutput {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no companion output within {0:?}")]
    ReadTimeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, BsecError>;

fn join(v: &[ParamViolation]) -> String {
    v.iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<HwprofError> for BsecError {
    fn from(e: HwprofError) -> Self {
        match e {
            HwprofError::UnsupportedPlatform(msg) => BsecError::UnsupportedPlatform(msg),
        }
    }
}

impl From<StoreError> for BsecError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::MissingVendorSource { base } => BsecError::MissingVendorSource { base },
            StoreError::BuildFailed { code, output } => BsecError::BuildFailed { code, output },
            StoreError::ConfigWriteFailed(msg) => BsecError::ConfigWriteFailed(msg),
            StoreError::Platform(e) => e.into(),
            StoreError::Io(e) => BsecError::Io(e),
        }
    }
}
