// RDB - Remote Debugger
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Logging setup shared by RDB binaries and tests
//!
//! Events go to the terminal, to a daily-rotated file under
//! `$TMP/rdb-logs/<component>`, or both. `RUST_LOG` overrides the `info`
//! default.

use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Once,
};

use eyre::{eyre, Result, WrapErr};
use tracing::{Level, Subscriber};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, time::LocalTime, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Where log events are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogOutput {
    Terminal,
    File,
    TerminalAndFile,
}

impl LogOutput {
    fn to_terminal(self) -> bool {
        matches!(self, Self::Terminal | Self::TerminalAndFile)
    }

    fn to_file(self) -> bool {
        matches!(self, Self::File | Self::TerminalAndFile)
    }
}

/// Initialize logging for an RDB component
///
/// Logs go to stderr and, when `enable_file_logging` is set, also to
/// `$TMP/rdb-logs/<component>/<component>.log`.
///
/// # Examples
/// ```rust,no_run
/// use rdb_common::logging;
///
/// fn main() -> eyre::Result<()> {
///     logging::init_logging("rdb", true)?;
///     tracing::info!("Application started");
///     Ok(())
/// }
/// ```
pub fn init_logging(component_name: &str, enable_file_logging: bool) -> Result<()> {
    let output =
        if enable_file_logging { LogOutput::TerminalAndFile } else { LogOutput::Terminal };
    install(component_name, output).map(|_| ())
}

/// Initialize logging into files only and return the log directory.
///
/// Used by the console, whose terminal carries the debugging session.
pub fn init_file_only_logging(component_name: &str) -> Result<PathBuf> {
    install(component_name, LogOutput::File)?
        .ok_or_else(|| eyre!("No log directory for {component_name}"))
}

fn install(component_name: &str, output: LogOutput) -> Result<Option<PathBuf>> {
    let log_dir =
        output.to_file().then(|| create_log_directory(component_name)).transpose()?;

    let terminal = output
        .to_terminal()
        .then(|| detailed_layer(std::io::stderr, true).with_filter(terminal_filter()));
    let file = log_dir.as_deref().map(|dir| {
        detailed_layer(daily_writer(dir, component_name), false)
            .with_filter(EnvFilter::from_default_env())
    });

    tracing_subscriber::registry()
        .with(default_env_filter(Level::INFO)?)
        .with(terminal)
        .with(file)
        .try_init()
        .map_err(|e| eyre!("Failed to initialize tracing subscriber: {e}"))?;

    tracing::info!(
        component = component_name,
        ?output,
        log_dir = ?log_dir.as_deref().map(Path::display),
        "Logging initialized"
    );
    log_environment_info(component_name);

    Ok(log_dir)
}

fn detailed_layer<S, W>(writer: W, ansi: bool) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_timer(LocalTime::rfc_3339())
}

fn daily_writer(log_dir: &Path, component_name: &str) -> non_blocking::NonBlocking {
    let (writer, guard) = non_blocking(rolling::daily(log_dir, format!("{component_name}.log")));
    // Flushing stops when the guard drops; keep it for the whole process.
    std::mem::forget(guard);
    writer
}

fn default_env_filter(level: Level) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .wrap_err("Failed to create environment filter")
}

fn create_log_directory(component_name: &str) -> Result<PathBuf> {
    let log_dir = env::temp_dir().join("rdb-logs").join(component_name);
    fs::create_dir_all(&log_dir)
        .wrap_err_with(|| format!("Failed to create log directory {}", log_dir.display()))?;
    Ok(log_dir)
}

/// HTTP traffic of the JSON-RPC client stays out of the terminal.
fn terminal_filter() -> EnvFilter {
    ["hyper=warn", "jsonrpsee=warn"]
        .into_iter()
        .filter_map(|directive| directive.parse().ok())
        .fold(EnvFilter::from_default_env(), EnvFilter::add_directive)
}

fn log_environment_info(component_name: &str) {
    tracing::info!(
        component = component_name,
        rust_log = %env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        args = ?env::args().collect::<Vec<_>>(),
        "Environment information"
    );
    if let Ok(current_dir) = env::current_dir() {
        tracing::debug!(working_directory = %current_dir.display(), "Working directory");
    }
}

/// Compact terminal logging with `level` as the default.
pub fn init_simple_logging(level: Level) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(default_env_filter(level)?)
        .with_target(false)
        .with_test_writer()
        .compact()
        .try_init()
        .map_err(|e| eyre!("Failed to initialize simple logging: {e}"))
}

static TEST_LOGGING_INIT: Once = Once::new();

/// Install test logging once per process; later calls do nothing.
///
/// ```rust
/// rdb_common::logging::ensure_test_logging(None);
/// tracing::info!("logged from a test");
/// ```
pub fn ensure_test_logging(default_level: Option<Level>) {
    TEST_LOGGING_INIT.call_once(|| {
        // Another harness may own the global subscriber.
        let _ = init_simple_logging(default_level.unwrap_or(Level::INFO));
    });
}
