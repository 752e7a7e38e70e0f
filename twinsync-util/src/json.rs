//! Helpers for writing JSON text by hand.
//!
//! Reported twin documents have a fixed textual layout, so they are written
//! with `write!` rather than through a serializer. These helpers keep the
//! scalar parts valid JSON.

use std::fmt::{self, Write};

use serde_json::Value;

/// Write `s` as a quoted and escaped JSON string
pub fn write_str<W: Write>(out: &mut W, s: &str) -> fmt::Result {
    // Display on a string value produces the escaped literal
    write!(out, "{}", Value::from(s))
}

/// Write a float with a fixed number of decimals.
///
/// JSON has no representation for NaN or infinities, those are written as
/// `null`.
pub fn write_fixed<W: Write>(out: &mut W, value: f64, decimals: usize) -> fmt::Result {
    if value.is_finite() {
        write!(out, "{value:.decimals$}")
    } else {
        out.write_str("null")
    }
}
