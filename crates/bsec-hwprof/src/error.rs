use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwprofError {
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
}

pub type Result<T> = std::result::Result<T, HwprofError>;
