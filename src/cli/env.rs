use std::path::PathBuf;

use clap::Parser;

use super::commands::Commands;
use super::output::OutputFormat;

/// Voice-agent navigation bridge: locate elements, snapshot pages and replay
/// scripted voice sessions against page fixtures.
#[derive(Parser)]
#[command(name = "voicenav", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Bridge configuration (YAML); defaults to ./config/voicenav.yaml
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level, unless RUST_LOG is set
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Shorthand for --log-level debug
    #[arg(short, long)]
    pub debug: bool,

    /// How command results are printed
    #[arg(short, long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}
