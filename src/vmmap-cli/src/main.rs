mod cli;
mod commands;
mod config;
mod render;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use simplelog::{ColorChoice, Config as LogConfig, TermLogger, TerminalMode};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    TermLogger::init(
        level,
        LogConfig::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    match cli.command {
        Commands::Map {
            snapshot,
            pid,
            coalesce,
            dump,
            output_dir,
        } => {
            commands::map::handle(&snapshot, pid, coalesce, dump, output_dir.as_deref())?;
        }

        Commands::Ps { snapshot } => {
            commands::ps::handle(&snapshot)?;
        }

        Commands::Configure { output_dir, show } => {
            commands::configure::handle(output_dir, show)?;
        }
    }

    Ok(())
}
