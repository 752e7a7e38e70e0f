use std::collections::TryReserveError;
use std::fmt::{self, Display, Write};
use std::io;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::state::models::TwinValue;
use crate::util::json;

/// Maximum size of a reported properties document
pub const REPORT_BUFFER_SIZE: usize = 512;

/// The envelope used for reported properties
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ReportFormat {
    /// `{"<name>": <value>}`
    Plain,

    /// `{"<name>": {"value": <value>, "status" : "completed" , "desiredVersion" : <version> }}`
    ///
    /// Acknowledges the desired version the value comes from.
    IotCentral,
}

impl Default for ReportFormat {
    fn default() -> Self {
        if cfg!(feature = "iot-central") {
            ReportFormat::IotCentral
        } else {
            ReportFormat::Plain
        }
    }
}

impl Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Plain => f.write_str("plain"),
            ReportFormat::IotCentral => f.write_str("iot-central"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown report format '{0}', expected 'plain' or 'iot-central'")]
pub struct ReportFormatParseError(String);

impl FromStr for ReportFormat {
    type Err = ReportFormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "plain" => Ok(ReportFormat::Plain),
            "iot-central" => Ok(ReportFormat::IotCentral),
            other => Err(ReportFormatParseError(other.to_owned())),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("report rejected: {0}")]
    Rejected(String),
}

/// The transport that publishes reported properties to the backend.
///
/// It receives one complete JSON document per call. Delivery, retries and
/// backoff are up to the implementation.
pub trait TwinReporter {
    fn report_state(&mut self, json: &[u8]) -> Result<(), TransportError>;
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("not enough memory to report device twin changes: {0}")]
    Alloc(#[from] TryReserveError),

    #[error("report is {size} bytes long, max is {max}")]
    TooLarge { size: usize, max: usize },

    #[error("failed to format report")]
    Format(#[from] fmt::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

fn write_value<W: Write>(out: &mut W, value: &TwinValue) -> fmt::Result {
    match value {
        TwinValue::Bool(b) => out.write_str(if *b { "true" } else { "false" }),
        TwinValue::Int(n) => write!(out, "{n}"),
        TwinValue::Float(n) => json::write_fixed(out, f64::from(*n), 2),
        TwinValue::String(s) => json::write_str(out, s),
    }
}

/// Render the reported properties document for a single property
pub fn render(
    name: &str,
    value: &TwinValue,
    format: ReportFormat,
    desired_version: i64,
) -> Result<String, ReportError> {
    let mut buf = String::new();
    buf.try_reserve_exact(REPORT_BUFFER_SIZE)?;

    buf.push('{');
    json::write_str(&mut buf, name)?;
    match format {
        ReportFormat::Plain => {
            buf.push_str(": ");
            write_value(&mut buf, value)?;
            buf.push('}');
        }
        ReportFormat::IotCentral => {
            buf.push_str(": {\"value\": ");
            write_value(&mut buf, value)?;
            write!(
                buf,
                ", \"status\" : \"completed\" , \"desiredVersion\" : {desired_version} }}}}"
            )?;
        }
    }

    if buf.len() > REPORT_BUFFER_SIZE {
        return Err(ReportError::TooLarge {
            size: buf.len(),
            max: REPORT_BUFFER_SIZE,
        });
    }

    Ok(buf)
}

/// Render a property and hand it to the transport
pub fn report_property<R: TwinReporter + ?Sized>(
    reporter: &mut R,
    name: &str,
    value: &TwinValue,
    format: ReportFormat,
    desired_version: i64,
) -> Result<(), ReportError> {
    let doc = render(name, value, format, desired_version)?;
    debug!("updating device twin: {doc}");
    reporter.report_state(doc.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::models::TwinString;

    #[test]
    #[allow(clippy::approx_constant)]
    fn test_renders_plain_reports() {
        assert_eq!(
            render("SleepTime", &TwinValue::Int(30), ReportFormat::Plain, 3).unwrap(),
            r#"{"SleepTime": 30}"#
        );
        assert_eq!(
            render("Enabled", &TwinValue::Bool(false), ReportFormat::Plain, 3).unwrap(),
            r#"{"Enabled": false}"#
        );
        assert_eq!(
            render("Gain", &TwinValue::Float(3.14159), ReportFormat::Plain, 3).unwrap(),
            r#"{"Gain": 3.14}"#
        );
        assert_eq!(
            render(
                "Label",
                &TwinValue::String(TwinString::new("lab").unwrap()),
                ReportFormat::Plain,
                3
            )
            .unwrap(),
            r#"{"Label": "lab"}"#
        );
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn test_renders_iot_central_reports() {
        assert_eq!(
            render("Foo", &TwinValue::Bool(true), ReportFormat::IotCentral, 5).unwrap(),
            r#"{"Foo": {"value": true, "status" : "completed" , "desiredVersion" : 5 }}"#
        );
        assert_eq!(
            render("Gain", &TwinValue::Float(3.14159), ReportFormat::IotCentral, 7).unwrap(),
            r#"{"Gain": {"value": 3.14, "status" : "completed" , "desiredVersion" : 7 }}"#
        );
        assert_eq!(
            render(
                "Label",
                &TwinValue::String(TwinString::new("lab").unwrap()),
                ReportFormat::IotCentral,
                0
            )
            .unwrap(),
            r#"{"Label": {"value": "lab", "status" : "completed" , "desiredVersion" : 0 }}"#
        );
    }

    #[test]
    fn test_renders_valid_json() {
        let doc = render(
            "Quote\"d",
            &TwinValue::String(TwinString::new("a \"b\"").unwrap()),
            ReportFormat::IotCentral,
            12,
        )
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&doc).unwrap();
        assert_eq!(
            value,
            json!({"Quote\"d": {"value": "a \"b\"", "status": "completed", "desiredVersion": 12}})
        );
    }

    #[test]
    fn test_renders_non_finite_floats_as_null() {
        assert_eq!(
            render("Gain", &TwinValue::Float(f32::NAN), ReportFormat::Plain, 0).unwrap(),
            r#"{"Gain": null}"#
        );
    }

    #[test]
    fn test_rejects_reports_over_the_buffer_size() {
        let name = "n".repeat(REPORT_BUFFER_SIZE);
        let res = render(&name, &TwinValue::Int(1), ReportFormat::Plain, 0);
        assert!(matches!(res, Err(ReportError::TooLarge { max: REPORT_BUFFER_SIZE, .. })));
    }

    #[test]
    fn test_parses_report_formats() {
        assert_eq!("plain".parse::<ReportFormat>().unwrap(), ReportFormat::Plain);
        assert_eq!(
            "iot-central".parse::<ReportFormat>().unwrap(),
            ReportFormat::IotCentral
        );
        assert!("xml".parse::<ReportFormat>().is_err());
        assert_eq!(ReportFormat::IotCentral.to_string(), "iot-central");
    }

    #[test]
    fn test_hands_the_document_to_the_transport() {
        #[derive(Default)]
        struct Recorder(Vec<Vec<u8>>);

        impl TwinReporter for Recorder {
            fn report_state(&mut self, json: &[u8]) -> Result<(), TransportError> {
                self.0.push(json.to_vec());
                Ok(())
            }
        }

        let mut recorder = Recorder::default();
        report_property(
            &mut recorder,
            "SleepTime",
            &TwinValue::Int(5),
            ReportFormat::Plain,
            0,
        )
        .unwrap();

        assert_eq!(recorder.0, vec![br#"{"SleepTime": 5}"#.to_vec()]);
    }
}
