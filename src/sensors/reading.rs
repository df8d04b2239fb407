//! Sensor kinds, their static command table, and the readings they produce

use serde::Serialize;
use std::fmt;

use super::parse;

/// One of the three CPU telemetry channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Temperature,
    Frequency,
    Voltage,
}

/// How a sensor kind is read: arguments passed to the diagnostic command
/// and the extraction applied to its first output line.
#[derive(Debug)]
pub struct SensorSpec {
    pub args: &'static [&'static str],
    pub parse: fn(&str) -> Option<f64>,
    pub label: &'static str,
    pub help: &'static str,
    pub unit: &'static str,
}

static TEMPERATURE: SensorSpec = SensorSpec {
    args: &["measure_temp"],
    parse: parse::temperature,
    label: "CPUTemp",
    help: "The temperature of the CPU",
    unit: "°C",
};

static FREQUENCY: SensorSpec = SensorSpec {
    args: &["measure_clock", "arm"],
    parse: parse::frequency,
    label: "CPUFreq",
    help: "The frequency of the CPU",
    unit: "MHz",
};

static VOLTAGE: SensorSpec = SensorSpec {
    args: &["measure_volts", "core"],
    parse: parse::voltage,
    label: "CPUVolt",
    help: "The voltage of the CPU",
    unit: "V",
};

impl SensorKind {
    pub const ALL: [SensorKind; 3] = [Self::Temperature, Self::Frequency, Self::Voltage];

    pub fn spec(self) -> &'static SensorSpec {
        match self {
            Self::Temperature => &TEMPERATURE,
            Self::Frequency => &FREQUENCY,
            Self::Voltage => &VOLTAGE,
        }
    }

    /// Value uuid under which this kind is registered with the host
    pub fn uuid(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Frequency => "frequency",
            Self::Voltage => "voltage",
        }
    }

    pub fn from_uuid(uuid: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.uuid() == uuid)
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uuid())
    }
}

/// Why a reading carries no value
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ReadError {
    /// Command could not be spawned, exited non-zero, was killed by a
    /// signal, or wrote to stderr
    #[error("process failure: {0}")]
    ProcessFailure(String),
    /// Output did not have the expected numeric shape
    #[error("parse failure: {0}")]
    ParseFailure(String),
}

/// Result of a single read. Exactly one of `value` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    kind: SensorKind,
    value: Option<f64>,
    error: Option<ReadError>,
}

impl SensorReading {
    pub fn ok(kind: SensorKind, value: f64) -> Self {
        Self {
            kind,
            value: Some(value),
            error: None,
        }
    }

    pub fn failed(kind: SensorKind, error: ReadError) -> Self {
        Self {
            kind,
            value: None,
            error: Some(error),
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn error(&self) -> Option<&ReadError> {
        self.error.as_ref()
    }
}
