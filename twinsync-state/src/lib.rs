mod config;
mod gpio;
mod table;

pub mod models;
pub use config::{EntryConfig, GpioConfig, TableConfig};
pub use gpio::{GpioError, GpioValue, OutputPin};
pub use table::{TableError, TwinTable};

use twinsync_util as util;
