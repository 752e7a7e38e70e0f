use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};

use crate::state::models::{TwinEntry, TwinValue, ValueError};
use crate::state::{TableError, TwinTable};

use super::report::{ReportFormat, TwinReporter, report_property};
use super::update::TwinUpdate;

/// Reason for the application to terminate.
///
/// The numeric value is used as the process exit status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExitCode {
    #[default]
    Success = 0,
    TermHandlerSigTerm = 1,
    TwinGpioSetValue = 2,
}

impl ExitCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Values that outlive a single update
#[derive(Debug, Clone, Default)]
pub struct SyncContext {
    desired_version: i64,
    exit_code: ExitCode,
}

impl SyncContext {
    /// The last `$version` received from the backend
    pub fn desired_version(&self) -> i64 {
        self.desired_version
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    /// Ask the application to terminate with `code`.
    ///
    /// The first request wins, later ones are ignored.
    pub fn request_exit(&mut self, code: ExitCode) {
        if self.exit_code == ExitCode::Success {
            self.exit_code = code;
        }
    }

    pub fn should_exit(&self) -> bool {
        self.exit_code != ExitCode::Success
    }
}

/// Outcome of applying a set of desired properties
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Properties that were stored and reported
    pub applied: Vec<String>,

    /// Known properties whose value could not be used
    pub skipped: Vec<String>,
}

/// Applies desired properties to the twin table and reports them back
pub struct Dispatcher<R> {
    table: TwinTable,
    reporter: R,
    format: ReportFormat,
    context: SyncContext,
}

impl<R: TwinReporter> Dispatcher<R> {
    pub fn new(table: TwinTable, reporter: R) -> Self {
        Self {
            table,
            reporter,
            format: ReportFormat::default(),
            context: SyncContext::default(),
        }
    }

    pub fn with_format(self, format: ReportFormat) -> Self {
        Self { format, ..self }
    }

    pub fn table(&self) -> &TwinTable {
        &self.table
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    pub fn context(&self) -> &SyncContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SyncContext {
        &mut self.context
    }

    /// Apply a twin update received from the backend
    pub fn apply_update(&mut self, update: &TwinUpdate) -> ApplySummary {
        if let TwinUpdate::Complete(_) = update {
            debug!("received complete twin");
        }
        self.apply_desired(update.desired())
    }

    /// Apply a desired properties object.
    ///
    /// Every table entry present in `desired` is converted to the entry
    /// type, stored and reported. Keys that are not in the table are ignored.
    #[instrument(name = "apply_desired", skip_all)]
    pub fn apply_desired(&mut self, desired: &Map<String, Value>) -> ApplySummary {
        // the version is echoed back by every report until the next update
        if let Some(version) = desired.get("$version") {
            match version.as_f64() {
                Some(version) => self.context.desired_version = version as i64,
                None => debug!("ignoring non numeric $version: {version}"),
            }
        }

        let mut summary = ApplySummary::default();
        for entry in self.table.iter_mut() {
            let Some(json) = desired.get(entry.name()) else {
                continue;
            };

            let value = match TwinValue::from_json(entry.value_type(), json) {
                Ok(value) => value,
                Err(err @ ValueError::StringTooLong { .. }) => {
                    warn!("ignoring update for {}: {err}", entry.name());
                    summary.skipped.push(entry.name().to_owned());
                    continue;
                }
                Err(err) => {
                    debug!("ignoring update for {}: {err}", entry.name());
                    summary.skipped.push(entry.name().to_owned());
                    continue;
                }
            };

            if let Err(err) = entry.set(value) {
                // from_json returns the entry type, this is a bug
                error!("{err}");
                summary.skipped.push(entry.name().to_owned());
                continue;
            }

            info!("received device update, new {} is {}", entry.name(), entry.value());
            commit(entry, &mut self.reporter, &mut self.context, self.format);
            summary.applied.push(entry.name().to_owned());
        }

        summary
    }

    /// Change a property locally and report it.
    pub fn set(&mut self, name: &str, value: TwinValue) -> Result<(), TableError> {
        let entry = self
            .table
            .entry_mut(name)
            .ok_or_else(|| TableError::UnknownEntry(name.to_owned()))?;
        entry.set(value)?;

        debug!("local update, new {} is {}", entry.name(), entry.value());
        commit(entry, &mut self.reporter, &mut self.context, self.format);
        Ok(())
    }

    /// Report the current value of a property
    pub fn report(&mut self, name: &str) -> Result<(), TableError> {
        let entry = self
            .table
            .entry(name)
            .ok_or_else(|| TableError::UnknownEntry(name.to_owned()))?;
        send_report(
            &mut self.reporter,
            entry,
            self.format,
            self.context.desired_version,
        );
        Ok(())
    }

    /// Report every property in table order
    #[instrument(name = "report_all", skip_all)]
    pub fn report_all(&mut self) {
        for entry in self.table.iter() {
            send_report(
                &mut self.reporter,
                entry,
                self.format,
                self.context.desired_version,
            );
        }
    }
}

// Drive the entry pin and report the stored value
fn commit<R: TwinReporter>(
    entry: &mut TwinEntry,
    reporter: &mut R,
    context: &mut SyncContext,
    format: ReportFormat,
) {
    match entry.drive_gpio() {
        Ok(Some(level)) => debug!("set GPIO for {} to {level}", entry.name()),
        Ok(None) => {}
        Err(err) => {
            error!("{err}");
            context.request_exit(ExitCode::TwinGpioSetValue);
        }
    }

    send_report(reporter, entry, format, context.desired_version);
}

fn send_report<R: TwinReporter>(
    reporter: &mut R,
    entry: &TwinEntry,
    format: ReportFormat,
    desired_version: i64,
) {
    if let Err(err) = report_property(
        reporter,
        entry.name(),
        entry.value(),
        format,
        desired_version,
    ) {
        error!("failed to report {}: {err}", entry.name());
    }
}
