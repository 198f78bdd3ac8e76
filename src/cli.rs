//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "clinscribe")]
#[command(about = "Clinical encounter audio to verified SOAP notes")]
#[command(version = Box::leak(crate::version_string().into_boxed_str()) as &'static str)]
pub struct Cli {
    /// Path to a custom configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Suppress the human-readable progress rendering on stderr
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process one audio recording into a verified SOAP note,
    /// streaming NDJSON progress events to stdout
    Process {
        /// Audio file to process (any container/codec)
        audio: PathBuf,
    },
    /// Warm-load the model engines in the background
    Preload,
}
