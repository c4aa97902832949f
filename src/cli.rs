//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use clap::{Parser, Subcommand};

use crate::client::FeedWindow;
use crate::output::Format;

/// Global earthquakes from the USGS feed, in the terminal or the browser.
#[derive(Parser, Debug)]
#[command(name = "bhumikamp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List earthquakes in a feed window
    List(ListArgs),

    /// Show total, M4.0+ and M5.0+ counts
    Stats(StatsArgs),

    /// Show the full details of one earthquake
    Show(ShowArgs),

    /// Start the web dashboard
    Ui(UiArgs),
}

/// Arguments for the `list` command.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Feed window: hour, day, week or month
    #[arg(long, short = 'w', default_value = "day", value_parser = parse_window)]
    pub window: FeedWindow,

    /// Minimum magnitude to show
    #[arg(long, short = 'm')]
    pub min_magnitude: Option<f64>,

    /// Maximum number of earthquakes to show
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `stats` command.
#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// Feed window: hour, day, week or month
    #[arg(long, short = 'w', default_value = "day", value_parser = parse_window)]
    pub window: FeedWindow,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `show` command.
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Event ID as printed by `list`
    pub id: String,

    /// Feed window to look the event up in
    #[arg(long, short = 'w', default_value = "day", value_parser = parse_window)]
    pub window: FeedWindow,
}

/// Arguments for the `ui` command.
#[derive(Parser, Debug)]
pub struct UiArgs {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Feed window loaded at startup
    #[arg(long, short = 'w', default_value = "day", value_parser = parse_window)]
    pub window: FeedWindow,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

/// Parse a feed window from string.
fn parse_window(s: &str) -> Result<FeedWindow, String> {
    s.parse()
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}
