/*
This module is home to everything related to the cloud backend that holds
the device twin.

It parses desired property updates delivered by the backend, applies them
to the twin table and reports the resulting state back through the
transport, in the envelope the backend expects.
*/

mod report;
mod sync;
mod update;

pub use report::{
    REPORT_BUFFER_SIZE, ReportError, ReportFormat, ReportFormatParseError, TransportError,
    TwinReporter, render, report_property,
};
pub use sync::{ApplySummary, Dispatcher, ExitCode, SyncContext};
pub use update::{TwinUpdate, UpdateError};

use twinsync_state as state;
use twinsync_util as util;
