use std::error::Error;
use std::io;
use std::process::ExitCode as ProcessExitCode;

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod cli;
mod device;

use twinsync_remote as remote;
use twinsync_state as state;
use twinsync_util as util;

use crate::device::{LineReporter, TracePin};
use crate::remote::{Dispatcher, ExitCode, TwinReporter, TwinUpdate};
use crate::state::TableConfig;
use crate::util::config;

fn initialize_tracing() {
    // Initialize tracing subscriber for human-readable logs on stderr,
    // stdout only carries reports
    tracing_subscriber::registry()
        .with(
            // Use some log defaults. These can be overriden using
            // RUST_LOG
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .event_format(fmt::format().compact().with_target(false).without_time()),
        )
        .init();
}

// Resolves on Ctrl-C or SIGTERM
#[cfg(unix)]
async fn terminate() -> io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = sigterm.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn terminate() -> io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Apply newline separated twin updates read from `input`.
///
/// Returns when the input ends, when an update makes the dispatcher ask for
/// an exit, or when `term` resolves. Lines that are not a JSON object are
/// logged and skipped.
async fn run<R, W, T>(dispatcher: &mut Dispatcher<W>, mut input: R, term: T) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: TwinReporter,
    T: Future<Output = io::Result<()>>,
{
    tokio::pin!(term);

    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = tokio::select! {
            read = input.read_until(b'\n', &mut buf) => read?,
            res = &mut term => {
                res?;
                info!("termination requested");
                dispatcher
                    .context_mut()
                    .request_exit(ExitCode::TermHandlerSigTerm);
                return Ok(());
            }
        };

        if read == 0 {
            debug!("end of input");
            return Ok(());
        }

        // raw bytes, invalid UTF-8 is reported by the parser
        let line = buf.trim_ascii();
        if line.is_empty() {
            continue;
        }

        match TwinUpdate::parse(line) {
            Ok(update) => {
                let summary = dispatcher.apply_update(&update);
                debug!(
                    applied = summary.applied.len(),
                    skipped = summary.skipped.len(),
                    "update processed"
                );
            }
            Err(err) => {
                warn!("{err}");
                continue;
            }
        }

        if dispatcher.context().should_exit() {
            return Ok(());
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ProcessExitCode, Box<dyn Error>> {
    initialize_tracing();

    let cli = cli::parse();

    let table_config = match &cli.table {
        Some(path) => config::read_from_path::<TableConfig, _>(path).await?,
        None => config::get::<TableConfig>().await?.unwrap_or_else(|| {
            debug!("no table config found, using the default table");
            TableConfig::default()
        }),
    };
    let table = table_config.build(TracePin::open)?;
    info!("twin table ready with {} entries", table.len());

    let format = cli.report_format.unwrap_or_default();
    let reporter = LineReporter::new(io::stdout());
    let mut dispatcher = Dispatcher::new(table, reporter).with_format(format);
    debug!("reporting with the {format} format");

    if cli.report_on_start {
        dispatcher.report_all();
    }

    let input: Box<dyn AsyncRead + Unpin> = match &cli.input {
        Some(path) => Box::new(File::open(path).await?),
        None => Box::new(tokio::io::stdin()),
    };
    run(&mut dispatcher, BufReader::new(input), terminate()).await?;

    let exit_code = dispatcher.context().exit_code();
    if exit_code != ExitCode::Success {
        warn!("exiting with {exit_code:?}");
    }

    Ok(ProcessExitCode::from(exit_code.code()))
}
