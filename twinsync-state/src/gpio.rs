use std::fmt::Display;
use std::io;

use thiserror::Error;

/// Logical level of an output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioValue {
    Low,
    High,
}

impl From<bool> for GpioValue {
    fn from(value: bool) -> Self {
        if value {
            GpioValue::High
        } else {
            GpioValue::Low
        }
    }
}

impl Display for GpioValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpioValue::Low => f.write_str("low"),
            GpioValue::High => f.write_str("high"),
        }
    }
}

/// A digital output driven by a twin property.
///
/// Implemented by the platform GPIO driver. Writes are expected to complete
/// immediately.
pub trait OutputPin {
    fn set_value(&mut self, value: GpioValue) -> io::Result<()>;
}

#[derive(Debug, Error)]
#[error("could not set GPIO {line} output value {value}: {source}")]
pub struct GpioError {
    pub line: u32,
    pub value: GpioValue,
    #[source]
    pub source: io::Error,
}
