use serde::{Deserialize, Serialize};
use std::fmt;

/// BSEC sample-rate mode. The companion takes the short label on its
/// command line; profiles express it in seconds per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleRate {
    /// One sample every 3 seconds (`LP`).
    LowPower,
    /// One sample every 300 seconds (`ULP`).
    UltraLowPower,
}

impl SampleRate {
    pub fn from_seconds(seconds: u32) -> Option<Self> {
        match seconds {
            3 => Some(Self::LowPower),
            300 => Some(Self::UltraLowPower),
            _ => None,
        }
    }

    #[inline]
    pub fn seconds(self) -> u32 {
        match self {
            Self::LowPower => 3,
            Self::UltraLowPower => 300,
        }
    }

    /// Label passed as the third positional argument to the companion.
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::LowPower => "LP",
            Self::UltraLowPower => "ULP",
        }
    }
}

/// Sensor supply rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupplyVoltage {
    V1_8,
    V3_3,
}

impl SupplyVoltage {
    /// Exact match only: the vendor ships blobs for these two rails.
    pub fn from_volts(volts: f64) -> Option<Self> {
        if volts == 1.8 {
            Some(Self::V1_8)
        } else if volts == 3.3 {
            Some(Self::V3_3)
        } else {
            None
        }
    }

    #[inline]
    pub fn volts(self) -> f64 {
        match self {
            Self::V1_8 => 1.8,
            Self::V3_3 => 3.3,
        }
    }

    /// Digits used in vendor config directory names ("18", "33").
    #[inline]
    pub fn tag(self) -> &'static str {
        match self {
            Self::V1_8 => "18",
            Self::V3_3 => "33",
        }
    }
}

/// How many days of history the algorithm state is tuned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateRetention {
    Days4,
    Days28,
}

impl StateRetention {
    pub fn from_days(days: u32) -> Option<Self> {
        match days {
            4 => Some(Self::Days4),
            28 => Some(Self::Days28),
            _ => None,
        }
    }

    #[inline]
    pub fn days(self) -> u32 {
        match self {
            Self::Days4 => 4,
            Self::Days28 => 28,
        }
    }
}

/// Key of the vendor configuration blob, e.g. `generic_33v_3s_4d`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigIdentity(String);

impl ConfigIdentity {
    pub fn new(voltage: SupplyVoltage, rate: SampleRate, retention: StateRetention) -> Self {
        ConfigIdentity(format!(
            "generic_{}v_{}s_{}d",
            voltage.tag(),
            rate.seconds(),
            retention.days()
        ))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_encodes_all_three_settings() {
        let id = ConfigIdentity::new(
            SupplyVoltage::V3_3,
            SampleRate::LowPower,
            StateRetention::Days4,
        );
        assert_eq!(id.as_str(), "generic_33v_3s_4d");

        let id = ConfigIdentity::new(
            SupplyVoltage::V1_8,
            SampleRate::UltraLowPower,
            StateRetention::Days28,
        );
        assert_eq!(id.to_string(), "generic_18v_300s_28d");
    }

    #[test]
    fn discrete_values_only() {
        assert_eq!(SampleRate::from_seconds(3), Some(SampleRate::LowPower));
        assert_eq!(SampleRate::from_seconds(30), None);
        assert_eq!(SupplyVoltage::from_volts(1.8), Some(SupplyVoltage::V1_8));
        assert_eq!(SupplyVoltage::from_volts(5.0), None);
        assert_eq!(SupplyVoltage::from_volts(1.8000005), None);
        assert_eq!(SupplyVoltage::from_volts(3.2999999), None);
        assert_eq!(StateRetention::from_days(28), Some(StateRetention::Days28));
        assert_eq!(StateRetention::from_days(7), None);
        assert_eq!(SampleRate::UltraLowPower.label(), "ULP");
    }
}
