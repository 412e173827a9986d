use chrono::NaiveDateTime;
use serde::{Serialize, Deserialize};
use std::fmt;

/// Timestamp layout used in snapshot files and the location log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serde helpers for `TIMESTAMP_FORMAT` timestamps.
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// One row of a vitals snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalReading {
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
    pub heart_rate: f64,
    #[serde(rename = "blood_pressure_systolic")]
    pub systolic: f64,
    #[serde(rename = "blood_pressure_diastolic")]
    pub diastolic: f64,
    pub oxygen_saturation: f64,
    pub temperature: f64,
}

impl VitalReading {
    pub fn value(&self, parameter: VitalParameter) -> f64 {
        match parameter {
            VitalParameter::HeartRate => self.heart_rate,
            VitalParameter::Systolic => self.systolic,
            VitalParameter::Diastolic => self.diastolic,
            VitalParameter::OxygenSaturation => self.oxygen_saturation,
            VitalParameter::Temperature => self.temperature,
        }
    }
}

/// Which way a parameter moves when the patient is getting worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Worsening {
    Falling,
    Rising,
}

/// The monitored vital-sign parameters, in display and alert order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalParameter {
    HeartRate,
    Systolic,
    Diastolic,
    OxygenSaturation,
    Temperature,
}

impl VitalParameter {
    pub const ALL: [VitalParameter; 5] = [
        VitalParameter::HeartRate,
        VitalParameter::Systolic,
        VitalParameter::Diastolic,
        VitalParameter::OxygenSaturation,
        VitalParameter::Temperature,
    ];

    /// Column name in the vitals snapshot file.
    pub fn column(self) -> &'static str {
        match self {
            VitalParameter::HeartRate => "heart_rate",
            VitalParameter::Systolic => "blood_pressure_systolic",
            VitalParameter::Diastolic => "blood_pressure_diastolic",
            VitalParameter::OxygenSaturation => "oxygen_saturation",
            VitalParameter::Temperature => "temperature",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VitalParameter::HeartRate => "Heart Rate",
            VitalParameter::Systolic => "Systolic Pressure",
            VitalParameter::Diastolic => "Diastolic Pressure",
            VitalParameter::OxygenSaturation => "Oxygen Saturation",
            VitalParameter::Temperature => "Temperature",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            VitalParameter::HeartRate => "bpm",
            VitalParameter::Systolic | VitalParameter::Diastolic => "mmHg",
            VitalParameter::OxygenSaturation => "%",
            VitalParameter::Temperature => "°C",
        }
    }

    /// Critical boundary; the value is critical once it is strictly past this.
    pub fn critical_threshold(self) -> f64 {
        match self {
            VitalParameter::HeartRate => 60.0,
            VitalParameter::Systolic => 90.0,
            VitalParameter::Diastolic => 50.0,
            VitalParameter::OxygenSaturation => 95.0,
            VitalParameter::Temperature => 38.0,
        }
    }

    pub fn worsening(self) -> Worsening {
        match self {
            VitalParameter::Temperature => Worsening::Rising,
            _ => Worsening::Falling,
        }
    }

    /// Threshold test alone, without any trend requirement.
    pub fn is_critical(self, value: f64) -> bool {
        match self.worsening() {
            Worsening::Falling => value < self.critical_threshold(),
            Worsening::Rising => value > self.critical_threshold(),
        }
    }
}

impl fmt::Display for VitalParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
