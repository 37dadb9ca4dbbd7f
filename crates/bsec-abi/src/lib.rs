//! BSEC ABI crate: stable contracts shared by the supervisor, the build store
//! and host applications.

pub mod backend;
pub mod profile;
pub mod reading;

pub use backend::*;
pub use profile::*;
pub use reading::*;
