//! Logging infrastructure for blindctl.
//!
//! Structured logging via the `tracing` ecosystem. The panel's own
//! diagnostics go to a rolling JSON file so they never interleave with the
//! terminal UI; the device's log stream is a separate thing shown in the UI.
//!
//! ## Example
//!
//! ```no_run
//! use blindctl_core::logging;
//!
//! let _guard = logging::init_logging(None, false, false).expect("logging init");
//!
//! tracing::info!("panel started");
//! tracing::debug!(channel_id = 3, "dispatching up");
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{PanelError, Result};

/// Crate targets that follow the `--verbose` level.
const PANEL_TARGETS: [&str; 6] = [
    "blindctl",
    "blindctl_core",
    "blindctl_config",
    "blindctl_client",
    "blindctl_panel",
    "blindctl_tui",
];

/// Guard that must be held to ensure log flushing on shutdown.
///
/// Keep this guard alive for the lifetime of the application.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the blindctl logging system.
///
/// Sets up JSON lines logging to `blindctl.log` in `log_dir` (rotated
/// daily), plus a human-readable stderr layer when `console` is true. The
/// TUI passes `console = false` because it owns the terminal.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_logging(log_dir: Option<PathBuf>, verbose: bool, console: bool) -> Result<LogGuard> {
    let log_dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };

    std::fs::create_dir_all(&log_dir).map_err(|e| PanelError::DirectoryCreation {
        path: log_dir.clone(),
        source: e,
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "blindctl.log");
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_current_span(true)
        .with_span_list(true);

    let console_layer = console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .with_file(verbose)
            .with_line_number(verbose)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    tracing::debug!(log_dir = %log_dir.display(), verbose, console, "logging initialized");

    Ok(LogGuard {
        _file_guard: Some(file_guard),
    })
}

/// Filter directive used when `RUST_LOG` is not set.
///
/// Dependencies stay at `warn`; panel crates log at `info`, or `debug`
/// when verbose.
pub fn default_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    let mut directives = vec!["warn".to_string()];
    directives.extend(PANEL_TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.join(",")
}

/// Initialize minimal console-only logging for testing.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Returns `~/.blindctl`.
pub fn default_home_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| PanelError::internal("HOME environment variable not set"))?;

    Ok(PathBuf::from(home).join(".blindctl"))
}

/// Returns `~/.blindctl/logs/`.
pub fn default_log_dir() -> Result<PathBuf> {
    Ok(default_home_dir()?.join("logs"))
}

/// Convenience macro for logging channel command events.
///
/// ```ignore
/// log_channel_event!(channel_id, "up");
/// log_channel_event!(channel_id, "failed", error = %err);
/// ```
#[macro_export]
macro_rules! log_channel_event {
    ($channel_id:expr, $event:expr) => {
        tracing::info!(
            target: "blindctl::channel",
            channel_id = %$channel_id,
            event = $event,
            "channel event"
        )
    };
    ($channel_id:expr, $event:expr, $($field:tt)*) => {
        tracing::info!(
            target: "blindctl::channel",
            channel_id = %$channel_id,
            event = $event,
            $($field)*,
            "channel event"
        )
    };
}
