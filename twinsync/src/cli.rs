use clap::Parser;
use std::path::PathBuf;

use crate::remote::ReportFormat;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)] // read from Cargo.toml
pub struct Cli {
    /// Twin table definition. Defaults to table.json in the config directory
    #[arg(env = "TWINSYNC_TABLE", long = "table", value_name = "path")]
    pub table: Option<PathBuf>,

    /// Envelope for reported properties, "plain" or "iot-central"
    #[arg(
        env = "TWINSYNC_REPORT_FORMAT",
        long = "report-format",
        value_name = "format"
    )]
    pub report_format: Option<ReportFormat>,

    /// Read twin updates from a file instead of stdin
    #[arg(env = "TWINSYNC_INPUT", long = "input", value_name = "path")]
    pub input: Option<PathBuf>,

    /// Report every property before reading updates
    #[arg(env = "TWINSYNC_REPORT_ON_START", long = "report-on-start")]
    pub report_on_start: bool,
}

pub fn parse() -> Cli {
    Parser::parse()
}
