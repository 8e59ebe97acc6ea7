use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use mimic_common::observability::{LogConfig, init_logging};
use mimic_config::{MimicConfig, MimicConfigLoader};
use std::path::Path;

mod cli;
mod commands;

const DEFAULT_CONFIG_FILE: &str = "mimic.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let cfg = load_config(cli.config.as_deref())?;

    // 2) Logging from the `logging` section
    let log_path = init_logging(LogConfig::from_settings("mimic", &cfg.logging))?;
    tracing::debug!(log_file = %log_path.display(), "logging initialised");

    match cli.command {
        Commands::Check => commands::check(&cfg),
        Commands::Path {
            x1,
            y1,
            x2,
            y2,
            seed,
        } => commands::path((x1, y1), (x2, y2), seed),
        Commands::Browse { url } => commands::browse(&cfg, &url).await,
    }
}

fn load_config(explicit: Option<&Path>) -> Result<MimicConfig> {
    let loader = match explicit {
        Some(path) => MimicConfigLoader::new().with_file(path),
        None => MimicConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    Ok(loader.load()?)
}
