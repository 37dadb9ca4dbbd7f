//! BSEC hardware profiling crate.
//! Detects the host OS, ARM ISA level and Raspberry Pi SoC, and maps them to
//! the vendor's prebuilt algorithm library variant.

pub mod detect;
pub mod error;
pub mod types;

pub use detect::{detect_now, HostProbe};
pub use error::HwprofError;
pub use types::{BuildTarget, Soc};
