//! Stand-ins for the device peripherals and the cloud transport.

use std::io::{self, Write};

use tracing::info;

use crate::remote::{TransportError, TwinReporter};
use crate::state::{GpioValue, OutputPin};

/// A GPIO output that only logs what it is asked to do
#[derive(Debug)]
pub struct TracePin {
    line: u32,
}

impl TracePin {
    pub fn open(line: u32) -> io::Result<Box<dyn OutputPin>> {
        info!("opened simulated GPIO {line}");
        Ok(Box::new(TracePin { line }))
    }
}

impl OutputPin for TracePin {
    fn set_value(&mut self, value: GpioValue) -> io::Result<()> {
        info!(line = self.line, %value, "GPIO write");
        Ok(())
    }
}

/// Writes every reported document as a line of `out`
pub struct LineReporter<W> {
    out: W,
}

impl<W: Write> LineReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> TwinReporter for LineReporter<W> {
    fn report_state(&mut self, json: &[u8]) -> Result<(), TransportError> {
        self.out.write_all(json)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_one_report_per_line() {
        let mut reporter = LineReporter::new(Vec::new());
        reporter.report_state(br#"{"SleepTime": 1}"#).unwrap();
        reporter.report_state(br#"{"Led": true}"#).unwrap();

        assert_eq!(
            String::from_utf8(reporter.out).unwrap(),
            "{\"SleepTime\": 1}\n{\"Led\": true}\n"
        );
    }

    #[test]
    fn test_maps_write_failures_to_transport_errors() {
        struct Closed;

        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut reporter = LineReporter::new(Closed);
        assert!(matches!(
            reporter.report_state(b"{}"),
            Err(TransportError::Io(_))
        ));
    }

    #[test]
    fn test_simulated_pins_accept_writes() {
        let mut pin = TracePin::open(4).unwrap();
        assert!(pin.set_value(GpioValue::High).is_ok());
        assert!(pin.set_value(GpioValue::Low).is_ok());
    }
}
