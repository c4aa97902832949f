//! BhumiKamp - Global earthquake dashboard.
//!
//! Fetches the USGS summary feed and shows it as a filtered list, summary
//! counts, per-event details, or a web dashboard with a map.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

mod bands;
mod cli;
mod client;
mod errors;
mod filters;
mod map;
mod models;
mod output;
mod server;
mod state;
mod stats;
mod timefmt;

use cli::{Cli, Command};
use client::FeedClient;
use filters::FilterCriteria;
use state::AppState;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::List(args) => cmd_list(args),
        Command::Stats(args) => cmd_stats(args),
        Command::Show(args) => cmd_show(args),
        Command::Ui(args) => cmd_ui(args),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the `list` command - one-shot fetch, filter and print.
fn cmd_list(args: cli::ListArgs) -> Result<()> {
    let client = FeedClient::new().context("failed to create USGS client")?;

    let records = client
        .fetch(args.window)
        .context(output::FAILURE_MESSAGE)?;

    let criteria = FilterCriteria {
        min_magnitude: args.min_magnitude,
        window: args.window,
    };
    tracing::debug!(
        "filtering {} events from the past {} (min magnitude {:?})",
        records.len(),
        criteria.window,
        criteria.min_magnitude
    );
    let mut records = criteria.apply(&records);

    if let Some(limit) = args.limit {
        records.truncate(limit);
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_records(&mut handle, &records, args.format)?;

    Ok(())
}

/// Execute the `stats` command - summary counts for a window.
fn cmd_stats(args: cli::StatsArgs) -> Result<()> {
    let client = FeedClient::new().context("failed to create USGS client")?;

    let records = client
        .fetch(args.window)
        .context(output::FAILURE_MESSAGE)?;

    let summary = stats::summarize(&records);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_stats(&mut handle, &summary, args.format)?;

    Ok(())
}

/// Execute the `show` command - details for one event.
fn cmd_show(args: cli::ShowArgs) -> Result<()> {
    let client = FeedClient::new().context("failed to create USGS client")?;

    let records = client
        .fetch(args.window)
        .context(output::FAILURE_MESSAGE)?;

    let record = records
        .iter()
        .find(|r| r.id == args.id)
        .with_context(|| format!("no earthquake with ID {} in the past {}", args.id, args.window))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_detail(&mut handle, record)?;

    Ok(())
}

/// Execute the `ui` command - start web server.
fn cmd_ui(args: cli::UiArgs) -> Result<()> {
    let config = server::ServerConfig {
        port: args.port,
        host: args.host.clone(),
        window: args.window,
    };

    // The blocking HTTP client must be built outside the async runtime
    let client = FeedClient::new().context("failed to create USGS client")?;
    let state = Arc::new(AppState::new(client, args.window));

    // Print startup message
    let url = format!("http://{}:{}", args.host, args.port);
    println!("\x1b[1m🌍 BhumiKamp Dashboard\x1b[0m");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("  Local:   \x1b[96m{url}\x1b[0m");
    println!("  Window:  past {}", args.window);
    println!("  Times:   IST (UTC+05:30)");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("\x1b[2mPress Ctrl+C to stop\x1b[0m\n");

    // Open browser if requested (using xdg-open/open command)
    if args.open {
        #[cfg(target_os = "linux")]
        let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
        #[cfg(target_os = "macos")]
        let _ = std::process::Command::new("open").arg(&url).spawn();
        #[cfg(target_os = "windows")]
        let _ = std::process::Command::new("cmd").args(["/c", "start", &url]).spawn();
    }

    // Run the async server on tokio runtime
    tokio::runtime::Runtime::new()
        .context("failed to create tokio runtime")?
        .block_on(server::run_server(config, Arc::clone(&state)))
}
