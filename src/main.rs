//! Dissect CLI
//!
//! Command-line driver for dissect sessions over WAV files.

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;

use dissect::cli::{commands, Cli, Commands};
use dissect::config::DissectConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Dissect v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => DissectConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DissectConfig::default(),
    };

    match cli.command {
        Some(cmd) => handle_command(cmd, config),
        None => {
            println!("Dissect v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands, config: DissectConfig) -> Result<()> {
    match cmd {
        Commands::Bands => commands::list_bands()?,
        Commands::Solo {
            input,
            band,
            output,
        } => commands::solo(config, &input, &band, &output)?,
        Commands::Spectrum {
            input,
            at,
            width,
            height,
            output,
        } => commands::spectrum(config, &input, at, width, height, output.as_deref())?,
        Commands::Loop {
            input,
            start,
            end,
            run,
            output,
        } => commands::run_loop(config, &input, start, end, run, output.as_deref())?,
        Commands::Session { input, script } => commands::run_script(config, &input, &script)?,
    }
    Ok(())
}
