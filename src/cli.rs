use crate::backend::Backend;
use clap::Parser;
use std::path::PathBuf;

/// A conversational agent that can read, list and edit files in the current directory.
///
/// Reads one line of input at a time from stdin until end-of-input (Ctrl+D).
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Backend to send requests to (overrides the config file)
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Model name (overrides the config file)
    #[arg(long)]
    pub model: Option<String>,

    /// Path to an alternative config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}
