use serde::{Deserialize, Serialize};
use std::fmt;

/// Prebuilt algorithm library variant shipped by the vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildTarget {
    /// ARMv8-A, 64-bit (Pi 3 and later).
    ArmV8a64,
    /// ARMv6, 32-bit (Pi Zero/1; also runs on ARMv7).
    ArmV6_32,
}

impl BuildTarget {
    /// Path of the library variant, relative to `<vendor>/algo/`.
    pub fn lib_dir(self) -> &'static str {
        match self {
            Self::ArmV8a64 => "normal_version/bin/RaspberryPI/PiThree_ArmV8-a-64bits",
            Self::ArmV6_32 => "normal_version/bin/RaspberryPI/PiZero_ArmV6-32bits",
        }
    }

    #[inline]
    pub fn bits(self) -> u8 {
        match self {
            Self::ArmV8a64 => 64,
            Self::ArmV6_32 => 32,
        }
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArmV8a64 => f.write_str("ARMv8 64-bit"),
            Self::ArmV6_32 => f.write_str("ARMv6 32-bit"),
        }
    }
}

/// Broadcom SoCs identifiable from a new-style Pi revision code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Soc {
    Bcm2835,
    Bcm2836,
    Bcm2837,
}

impl Soc {
    /// Processor field (bits 12..16) of a new-style revision code.
    pub fn from_processor_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Self::Bcm2835),
            1 => Some(Self::Bcm2836),
            2 => Some(Self::Bcm2837),
            _ => None,
        }
    }

    pub fn target(self) -> BuildTarget {
        match self {
            Self::Bcm2837 => BuildTarget::ArmV8a64,
            Self::Bcm2835 | Self::Bcm2836 => BuildTarget::ArmV6_32,
        }
    }
}
