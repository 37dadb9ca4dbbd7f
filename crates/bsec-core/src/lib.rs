//! BSEC core: supervises the vendor companion process for one BME680 device
//! profile.
//!
//! `BsecLibrary::new` validates the profile, makes sure the companion
//! executable, configuration blob and state file are in place under the base
//! directory, and hands back a supervisor. `start()` launches the companion and
//! `readings()` decodes its stdout into `SensorReading`s.

pub mod decode;
pub mod error;
pub mod library;
pub mod profile;
pub mod supervisor;

pub use bsec_abi::{ConfigIdentity, ReadingStatus, SampleRate, SensorReading, StateRetention, SupplyVoltage};
pub use decode::{decode_line, Readings};
pub use error::{BsecError, Result};
pub use library::BsecLibrary;
pub use profile::{DeviceProfile, ParamViolation, ProfileField, ProfileParams};
pub use supervisor::{CompanionCommand, Supervisor};
