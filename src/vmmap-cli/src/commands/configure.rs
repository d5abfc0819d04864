//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up vmmap CLI defaults.

use crate::config::Config;
use anyhow::Result;
use std::path::PathBuf;

/// Handle the configure command
pub fn handle(output_dir: Option<PathBuf>, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if let Some(dir) = output_dir {
        config.output_dir = Some(dir.clone());
        config.save()?;

        println!("Default output directory: {}", dir.display());
        if let Ok(path) = Config::config_path() {
            println!("Config saved to: {}", path.display());
        }
    } else {
        show_usage();
    }

    Ok(())
}

/// Display current configuration
fn show_config(config: &Config) {
    match &config.output_dir {
        Some(dir) => println!("Output directory: {}", dir.display()),
        None => println!("No output directory configured (dumps go to the current directory)"),
    }

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: vmmap configure --output-dir DIR");
    println!("   or: vmmap configure --show");
    println!();
    println!("Note: `vmmap map --dump` writes one pid.<pid>.dmp file per process");
    println!("      into the configured directory unless --output-dir overrides it.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_usage_does_not_panic() {
        show_usage();
    }

    #[test]
    fn test_config_path_exists() {
        assert!(Config::config_path().is_ok());
    }
}
