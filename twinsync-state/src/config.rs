use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::gpio::OutputPin;
use crate::models::{GpioBinding, TwinEntry, TwinValue, ValueType};
use crate::table::{TableError, TwinTable};
use crate::util::config::StoredConfig;

/// Definition of the twin table, as read from `table.json`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TableConfig {
    pub entries: Vec<EntryConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EntryConfig {
    pub name: String,

    #[serde(rename = "type")]
    pub value_type: ValueType,

    /// Initial value of the slot, defaults to the zero value of the type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpio: Option<GpioConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GpioConfig {
    pub line: u32,

    #[serde(default = "default_active_high")]
    pub active_high: bool,
}

fn default_active_high() -> bool {
    true
}

impl StoredConfig for TableConfig {
    fn kind() -> &'static str {
        "table"
    }
}

impl EntryConfig {
    fn new(name: &str, value_type: ValueType) -> Self {
        Self {
            name: name.to_owned(),
            value_type,
            value: None,
            gpio: None,
        }
    }
}

impl Default for TableConfig {
    /// The accelerometer settings exposed by the device
    fn default() -> Self {
        Self {
            entries: vec![
                EntryConfig::new("SleepTime", ValueType::Int),
                EntryConfig::new("DoubleTapDetection", ValueType::Bool),
                EntryConfig::new("DoubleTapThreshold", ValueType::Int),
                EntryConfig::new("TimeGapForDoubleTapRecognition", ValueType::Int),
                EntryConfig::new("QuietTimeAfterATapDetection", ValueType::Int),
                EntryConfig::new("MaximumDurationOfOverThresholdEvent", ValueType::Int),
            ],
        }
    }
}

impl TableConfig {
    /// Build the table, using `open_pin` to get a handle for every
    /// GPIO line referenced by the config.
    pub fn build<F>(self, mut open_pin: F) -> Result<TwinTable, TableError>
    where
        F: FnMut(u32) -> io::Result<Box<dyn OutputPin>>,
    {
        let mut table = TwinTable::new();
        for EntryConfig {
            name,
            value_type,
            value,
            gpio,
        } in self.entries
        {
            let value = match value {
                Some(json) => match TwinValue::from_json(value_type, &json) {
                    Ok(value) => value,
                    Err(source) => return Err(TableError::InvalidValue { name, source }),
                },
                None => TwinValue::zero(value_type),
            };

            let mut entry = TwinEntry::new(name, value);
            if let Some(GpioConfig { line, active_high }) = gpio {
                // check the type before acquiring the line
                if value_type != ValueType::Bool {
                    return Err(TableError::GpioOnNonBool {
                        name: entry.name().to_owned(),
                        value_type,
                    });
                }
                let pin = open_pin(line).map_err(|source| TableError::OpenGpio { line, source })?;
                entry = entry.with_gpio(GpioBinding::new(line, active_high, pin))?;
            }

            debug!(name = entry.name(), %value_type, "twin entry");
            table.insert(entry)?;
        }

        Ok(table)
    }
}
