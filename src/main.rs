//! blindctl - terminal control panel for RTS blind remotes
//!
//! Talks to the remote controller's REST API for channel commands and
//! follows its WebSocket log.
//!
//! ## Usage
//!
//! ```bash
//! # Use ~/.blindctl/config.yaml, or the controller's access point address
//! blindctl
//!
//! # Point at a controller on the LAN
//! blindctl --url http://192.168.1.40/api/v1
//!
//! # Explicit config file and verbose logging
//! blindctl --config ./panel.yaml -v
//! ```

use std::io::Write;
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use blindctl_config::PanelConfig;
use blindctl_core::{LogGuard, PanelError, init_logging};
use blindctl_tui::App;
use clap::Parser;
use tracing::{error, info};

/// Terminal control panel for RTS blind remotes
#[derive(Parser, Debug)]
#[command(name = "blindctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.blindctl/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Controller API root, e.g. http://192.168.4.1/api/v1
    #[arg(long)]
    url: Option<String>,

    /// Log socket URL (derived from --url when omitted)
    #[arg(long)]
    ws_url: Option<String>,

    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory for log files (defaults to ~/.blindctl/logs/)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::from(1);
        }
    };

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %format!("{e:#}"), "configuration rejected");
            eprintln!("Error: {e:#}");
            let panel_error = e.downcast_ref::<PanelError>();
            if let Some(hint) = panel_error.and_then(PanelError::guidance) {
                eprintln!("Hint: {hint}");
            }
            let code = if panel_error.is_some_and(PanelError::is_config_error) { 2 } else { 1 };
            return ExitCode::from(code);
        }
    };

    install_panic_hook();

    info!(base_url = %config.base_url, "starting blindctl");

    match run_app(&config) {
        Ok(()) => {
            info!("blindctl exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let _ = restore_terminal();
            error!("blindctl error: {}", e);
            eprintln!("Error: {e}");
            if let Some(hint) = e.downcast_ref::<PanelError>().and_then(PanelError::guidance) {
                eprintln!("Hint: {hint}");
            }
            ExitCode::from(1)
        }
    }
}

/// Install a panic hook that restores the terminal before printing the panic message.
fn install_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Restore terminal to its normal state.
fn restore_terminal() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();

    let _ = crossterm::terminal::disable_raw_mode();
    crossterm::execute!(
        stdout,
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    stdout.flush()?;

    Ok(())
}

fn setup_logging(cli: &Cli) -> blindctl_core::Result<LogGuard> {
    // The TUI owns the terminal, so logs only go to the file
    init_logging(cli.log_dir.clone(), cli.verbose > 0, false)
}

/// Load the config file and apply command line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<PanelConfig> {
    let mut config = PanelConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.url {
        config = config.with_base_url(url.clone());
    }
    if let Some(ws_url) = &cli.ws_url {
        config = config.with_ws_url(ws_url.clone());
    }
    config
        .validate()
        .context("invalid command line override")?;
    Ok(config)
}

fn run_app(config: &PanelConfig) -> blindctl_tui::AppResult<()> {
    let mut app = App::new(config)?;
    app.run()
}
