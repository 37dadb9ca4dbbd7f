//! One decoded line of companion output.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Status code reported by the companion. `"0"` is success; anything else is
/// a BME680 driver or BSEC library error code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReadingStatus(pub String);

impl ReadingStatus {
    pub const SUCCESS: &'static str = "0";

    #[inline]
    pub fn is_success(&self) -> bool {
        self.0 == Self::SUCCESS
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ReadingStatus {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        // Older companion builds printed the status as a bare integer.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
        }
        Ok(match Raw::deserialize(de)? {
            Raw::Text(s) => ReadingStatus(s.trim().to_string()),
            Raw::Int(i) => ReadingStatus(i.to_string()),
        })
    }
}

/// Typed view of a companion output record.
///
/// Measurement fields are optional: the companion omits or zeroes some of them
/// while the algorithm is still calibrating. Unknown fields are kept in
/// `extra` so newer companion builds don't lose data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(rename = "Status")]
    pub status: ReadingStatus,

    /// Wall-clock time of the sample (unix seconds).
    #[serde(rename = "Time", default, deserialize_with = "lenient::int")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,

    #[serde(rename = "IAQ", default, deserialize_with = "lenient::float")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iaq: Option<f64>,

    /// 0 = stabilising .. 3 = calibrated.
    #[serde(rename = "IAQ_Accuracy", default, deserialize_with = "lenient::int")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iaq_accuracy: Option<i64>,

    /// Degrees Celsius (offset-compensated).
    #[serde(rename = "Temperature", default, deserialize_with = "lenient::float")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Relative humidity, %.
    #[serde(rename = "Humidity", default, deserialize_with = "lenient::float")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,

    /// hPa.
    #[serde(rename = "Pressure", default, deserialize_with = "lenient::float")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,

    /// Gas resistance, Ohms.
    #[serde(rename = "Gas", default, deserialize_with = "lenient::float")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_resistance: Option<f64>,

    /// CO2 equivalent, ppm.
    #[serde(rename = "eCO2", default, deserialize_with = "lenient::float")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co2_equivalent: Option<f64>,

    /// Breath-VOC equivalent, ppm.
    #[serde(rename = "bVOCe", default, deserialize_with = "lenient::float")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breath_voc_equivalent: Option<f64>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SensorReading {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Numbers may arrive either as JSON numbers or as numeric strings.
mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrText {
        Int(i64),
        Float(f64),
        Text(String),
    }

    pub fn float<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
        match Option::<NumOrText>::deserialize(de)? {
            None => Ok(None),
            Some(NumOrText::Int(i)) => Ok(Some(i as f64)),
            Some(NumOrText::Float(f)) => Ok(Some(f)),
            Some(NumOrText::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected a number, got {s:?}"))),
        }
    }

    pub fn int<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i64>, D::Error> {
        match Option::<NumOrText>::deserialize(de)? {
            None => Ok(None),
            Some(NumOrText::Int(i)) => Ok(Some(i)),
            Some(NumOrText::Float(f)) => Ok(Some(f as i64)),
            Some(NumOrText::Text(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected an integer, got {s:?}"))),
        }
    }
}
