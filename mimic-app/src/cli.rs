//! Command-line interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Humanized browser interaction with rate governance.
#[derive(Parser, Debug)]
#[command(name = "mimic")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (defaults to ./mimic.yaml when present)
    #[arg(short, long, global = true, env = "MIMIC_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and validate the configuration, then print it as JSON
    Check,

    /// Print a generated pointer path as JSON
    Path {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,

        /// Seed for a reproducible path
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Open a page and read through it like a person would
    Browse {
        url: String,
    },
}
