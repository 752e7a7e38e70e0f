use std::fmt::Debug;

use crate::gpio::{GpioError, GpioValue, OutputPin};
use crate::table::TableError;

use super::value::{TwinValue, ValueType};

/// A hardware output bound to a boolean property
pub struct GpioBinding {
    /// The hardware line id, used for diagnostics
    pub line: u32,

    /// Whether the pin is driven high when the property is `true`
    pub active_high: bool,

    pin: Box<dyn OutputPin>,
}

impl GpioBinding {
    pub fn new(line: u32, active_high: bool, pin: Box<dyn OutputPin>) -> Self {
        Self {
            line,
            active_high,
            pin,
        }
    }

    /// The level the pin should have for the given property value
    pub fn level_for(&self, value: bool) -> GpioValue {
        if self.active_high {
            value.into()
        } else {
            (!value).into()
        }
    }

    /// Drive the pin to match the property value
    pub fn drive(&mut self, value: bool) -> Result<GpioValue, GpioError> {
        let level = self.level_for(value);
        self.pin.set_value(level).map_err(|source| GpioError {
            line: self.line,
            value: level,
            source,
        })?;
        Ok(level)
    }
}

impl Debug for GpioBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpioBinding")
            .field("line", &self.line)
            .field("active_high", &self.active_high)
            .finish_non_exhaustive()
    }
}

/// A named property of the device twin
#[derive(Debug)]
pub struct TwinEntry {
    name: String,
    value: TwinValue,
    gpio: Option<GpioBinding>,
}

impl TwinEntry {
    pub fn new(name: impl Into<String>, value: TwinValue) -> Self {
        Self {
            name: name.into(),
            value,
            gpio: None,
        }
    }

    /// Bind an output pin to this entry.
    ///
    /// Only boolean entries can drive a pin.
    pub fn with_gpio(mut self, binding: GpioBinding) -> Result<Self, TableError> {
        let value_type = self.value.value_type();
        if value_type != ValueType::Bool {
            return Err(TableError::GpioOnNonBool {
                name: self.name,
                value_type,
            });
        }
        self.gpio = Some(binding);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &TwinValue {
        &self.value
    }

    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    pub fn gpio(&self) -> Option<&GpioBinding> {
        self.gpio.as_ref()
    }

    /// Replace the stored value, the slot type cannot change.
    pub fn set(&mut self, value: TwinValue) -> Result<(), TableError> {
        let expected = self.value_type();
        let found = value.value_type();
        if expected != found {
            return Err(TableError::TypeMismatch {
                name: self.name.clone(),
                expected,
                found,
            });
        }
        self.value = value;
        Ok(())
    }

    /// Drive the bound pin, if any, from the stored value.
    ///
    /// Returns the level written to the pin.
    pub fn drive_gpio(&mut self) -> Result<Option<GpioValue>, GpioError> {
        match (&mut self.gpio, &self.value) {
            (Some(binding), TwinValue::Bool(value)) => binding.drive(*value).map(Some),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    use super::*;

    #[derive(Clone, Default)]
    struct RecordingPin(Rc<RefCell<Vec<GpioValue>>>);

    impl OutputPin for RecordingPin {
        fn set_value(&mut self, value: GpioValue) -> io::Result<()> {
            self.0.borrow_mut().push(value);
            Ok(())
        }
    }

    struct BrokenPin;

    impl OutputPin for BrokenPin {
        fn set_value(&mut self, _: GpioValue) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        }
    }

    #[test]
    fn test_drives_active_low_pins_inverted() {
        let pin = RecordingPin::default();
        let mut entry = TwinEntry::new("StatusLed", TwinValue::Bool(false))
            .with_gpio(GpioBinding::new(8, false, Box::new(pin.clone())))
            .unwrap();

        entry.set(TwinValue::Bool(true)).unwrap();
        assert_eq!(entry.drive_gpio().unwrap(), Some(GpioValue::Low));

        entry.set(TwinValue::Bool(false)).unwrap();
        assert_eq!(entry.drive_gpio().unwrap(), Some(GpioValue::High));

        assert_eq!(*pin.0.borrow(), vec![GpioValue::Low, GpioValue::High]);
    }

    #[test]
    fn test_drives_active_high_pins_directly() {
        let pin = RecordingPin::default();
        let mut entry = TwinEntry::new("Relay", TwinValue::Bool(false))
            .with_gpio(GpioBinding::new(3, true, Box::new(pin.clone())))
            .unwrap();

        entry.set(TwinValue::Bool(true)).unwrap();
        assert_eq!(entry.drive_gpio().unwrap(), Some(GpioValue::High));
    }

    #[test]
    fn test_does_nothing_without_a_pin() {
        let mut entry = TwinEntry::new("DoubleTapDetection", TwinValue::Bool(true));
        assert_eq!(entry.drive_gpio().unwrap(), None);
    }

    #[test]
    fn test_reports_the_line_on_pin_failure() {
        let mut entry = TwinEntry::new("StatusLed", TwinValue::Bool(true))
            .with_gpio(GpioBinding::new(9, true, Box::new(BrokenPin)))
            .unwrap();

        let err = entry.drive_gpio().unwrap_err();
        assert_eq!(err.line, 9);
        assert_eq!(err.value, GpioValue::High);
    }

    #[test]
    fn test_rejects_pins_on_non_bool_entries() {
        let res = TwinEntry::new("SleepTime", TwinValue::Int(0))
            .with_gpio(GpioBinding::new(1, true, Box::new(BrokenPin)));
        assert!(matches!(
            res,
            Err(TableError::GpioOnNonBool {
                value_type: ValueType::Int,
                ..
            })
        ));
    }

    #[test]
    fn test_keeps_the_slot_type() {
        let mut entry = TwinEntry::new("SleepTime", TwinValue::Int(0));
        assert!(matches!(
            entry.set(TwinValue::Bool(true)),
            Err(TableError::TypeMismatch {
                expected: ValueType::Int,
                found: ValueType::Bool,
                ..
            })
        ));
        assert_eq!(entry.value(), &TwinValue::Int(0));
    }
}
