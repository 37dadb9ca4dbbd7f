//! Device profile: the validated settings one companion process runs with.

use std::fmt;
use std::path::{Path, PathBuf};

use bsec_abi::{ConfigIdentity, SampleRate, StateRetention, SupplyVoltage};
use serde::{Deserialize, Serialize};

use crate::error::{BsecError, Result};

/// I2C addresses the BME680 can be strapped to.
pub const BUS_ADDRESSES: [u16; 2] = [0x76, 0x77];

/// Allowed temperature offset, degrees Celsius, inclusive.
pub const TEMPERATURE_OFFSET_RANGE: (f64, f64) = (-10.0, 10.0);

/// Raw, unvalidated profile settings as read from a config file or flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileParams {
    pub bus_address: u16,
    #[serde(default)]
    pub temperature_offset: f64,
    /// Seconds per sample: 3 or 300.
    pub sample_rate: u32,
    pub voltage: f64,
    pub retention_days: u32,
    /// Defaults to the current working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    BusAddress,
    TemperatureOffset,
    SampleRate,
    Voltage,
    RetentionDays,
    BaseDir,
}

impl ProfileField {
    pub fn name(self) -> &'static str {
        match self {
            Self::BusAddress => "bus_address",
            Self::TemperatureOffset => "temperature_offset",
            Self::SampleRate => "sample_rate",
            Self::Voltage => "voltage",
            Self::RetentionDays => "retention_days",
            Self::BaseDir => "base_dir",
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One rejected field and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamViolation {
    pub field: ProfileField,
    pub message: String,
}

impl ParamViolation {
    pub fn new(field: ProfileField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParamViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validated, immutable device profile.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    bus_address: u8,
    temperature_offset: f64,
    sample_rate: SampleRate,
    voltage: SupplyVoltage,
    retention: StateRetention,
    base_dir: PathBuf,
}

impl DeviceProfile {
    /// Validate every field. All violations are reported at once.
    pub fn new(params: ProfileParams) -> Result<Self> {
        let mut bad = Vec::new();

        let bus_address = if BUS_ADDRESSES.contains(&params.bus_address) {
            Some(params.bus_address as u8)
        } else {
            bad.push(ParamViolation::new(
                ProfileField::BusAddress,
                format!("must be 0x76 or 0x77, got {:#x}", params.bus_address),
            ));
            None
        };

        let (lo, hi) = TEMPERATURE_OFFSET_RANGE;
        // NaN fails the range check too
        if !(lo..=hi).contains(&params.temperature_offset) {
            bad.push(ParamViolation::new(
                ProfileField::TemperatureOffset,
                format!("must be within [{lo}, {hi}], got {}", params.temperature_offset),
            ));
        }

        let sample_rate = SampleRate::from_seconds(params.sample_rate);
        if sample_rate.is_none() {
            bad.push(ParamViolation::new(
                ProfileField::SampleRate,
                format!("must be 3 or 300 seconds, got {}", params.sample_rate),
            ));
        }

        let voltage = SupplyVoltage::from_volts(params.voltage);
        if voltage.is_none() {
            bad.push(ParamViolation::new(
                ProfileField::Voltage,
                format!("must be 1.8 or 3.3, got {}", params.voltage),
            ));
        }

        let retention = StateRetention::from_days(params.retention_days);
        if retention.is_none() {
            bad.push(ParamViolation::new(
                ProfileField::RetentionDays,
                format!("must be 4 or 28, got {}", params.retention_days),
            ));
        }

        let base_dir = match resolve_base_dir(params.base_dir.as_deref()) {
            Ok(p) => Some(p),
            Err(v) => {
                bad.push(v);
                None
            }
        };

        match (bus_address, sample_rate, voltage, retention, base_dir) {
            (Some(bus_address), Some(sample_rate), Some(voltage), Some(retention), Some(base_dir))
                if bad.is_empty() =>
            {
                Ok(Self {
                    bus_address,
                    temperature_offset: params.temperature_offset,
                    sample_rate,
                    voltage,
                    retention,
                    base_dir,
                })
            }
            _ => Err(BsecError::InvalidParameter(bad)),
        }
    }

    #[inline]
    pub fn bus_address(&self) -> u8 {
        self.bus_address
    }

    #[inline]
    pub fn temperature_offset(&self) -> f64 {
        self.temperature_offset
    }

    #[inline]
    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    #[inline]
    pub fn voltage(&self) -> SupplyVoltage {
        self.voltage
    }

    #[inline]
    pub fn retention(&self) -> StateRetention {
        self.retention
    }

    /// Absolute, canonical base directory.
    #[inline]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn identity(&self) -> ConfigIdentity {
        ConfigIdentity::new(self.voltage, self.sample_rate, self.retention)
    }

    /// Positional arguments for the companion: address, offset, rate label.
    pub fn companion_args(&self) -> Vec<String> {
        vec![
            self.bus_address.to_string(),
            self.temperature_offset.to_string(),
            self.sample_rate.label().to_string(),
        ]
    }
}

fn resolve_base_dir(given: Option<&Path>) -> std::result::Result<PathBuf, ParamViolation> {
    let bad = |msg: String| ParamViolation::new(ProfileField::BaseDir, msg);
    let dir = match given {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir()
            .map_err(|e| bad(format!("current directory unavailable: {e}")))?,
    };
    if !dir.is_dir() {
        return Err(bad(format!("{} is not an existing directory", dir.display())));
    }
    dir.canonicalize()
        .map_err(|e| bad(format!("cannot resolve {}: {e}", dir.display())))
}
