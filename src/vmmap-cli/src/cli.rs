//! CLI argument definitions for vmmap

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vmmap")]
#[command(about = "Process memory snapshot examiner", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the memory map of captured processes
    #[command(visible_alias = "m")]
    Map {
        /// Snapshot directory (or path to snapshot.json)
        snapshot: PathBuf,

        /// Process ID to include (all other processes are excluded)
        #[arg(short, long)]
        pid: Option<u32>,

        /// Merge contiguous runs before emission
        #[arg(short, long)]
        coalesce: bool,

        /// Extract listed memory segments to per-process dump files
        #[arg(short, long)]
        dump: bool,

        /// Directory dump files are written to (defaults to the configured
        /// value, then the current directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// List the processes captured in a snapshot
    #[command(visible_alias = "p")]
    Ps {
        /// Snapshot directory (or path to snapshot.json)
        snapshot: PathBuf,
    },

    /// Configure default settings
    Configure {
        /// Set the default dump output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_map_flags_parse() {
        let cli = Cli::parse_from(["vmmap", "map", "capture/", "--coalesce", "--dump", "-p", "42"]);
        match cli.command {
            Commands::Map {
                pid,
                coalesce,
                dump,
                ..
            } => {
                assert_eq!(pid, Some(42));
                assert!(coalesce);
                assert!(dump);
            }
            _ => panic!("expected map command"),
        }
    }
}
