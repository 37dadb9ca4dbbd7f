//! bsec-store
//!
//! Blocking I/O helpers for the files the BSEC companion needs under its base
//! directory.
//! - Locates the vendor `BSEC_*` source tree.
//! - Builds the companion executable, cached by content hash.
//! - Installs the configuration blob matching the device profile.
//! - Makes sure the algorithm state file exists.

pub mod build;
pub mod config;
pub mod errors;
pub mod hash;
pub mod paths;
pub mod state;
pub mod vendor;

pub use build::{ensure_executable, BuildArtifact, CompileOutput, SystemCompiler, Toolchain};
pub use config::{ensure_config, known_config, ConfigArtifact, KnownConfig};
pub use errors::StoreError;
pub use paths::*;
pub use state::{ensure_state, StateArtifact};
pub use vendor::VendorTree;
