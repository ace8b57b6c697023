//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::config::OutputFormat;

/// Hierarchical budget allocation: distribute, roll up and compare against baseline
#[derive(Parser, Debug)]
#[command(name = "rebudget")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Output format (default from config)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Use this config file instead of the global/local/env layers
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show allocation rows and grand total
    Show {
        /// Snapshot file (.json or .toml)
        #[arg(value_hint = ValueHint::FilePath)]
        snapshot: PathBuf,
    },

    /// Show allocation hierarchy as tree
    Tree {
        /// Snapshot file (.json or .toml)
        #[arg(value_hint = ValueHint::FilePath)]
        snapshot: PathBuf,
    },

    /// Apply edits in order and show the result
    Apply {
        /// Snapshot file (.json or .toml)
        #[arg(value_hint = ValueHint::FilePath)]
        snapshot: PathBuf,

        /// Edits: `id=1600` (absolute), `id=+10%` or `id=-5%` (percentage delta)
        #[arg(required = true, allow_hyphen_values = true)]
        edits: Vec<String>,
    },

    /// Print the variance of one node
    Variance {
        /// Snapshot file (.json or .toml)
        #[arg(value_hint = ValueHint::FilePath)]
        snapshot: PathBuf,

        /// Node id
        id: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show {
        /// Snapshot directory for local config
        dir: Option<PathBuf>,
    },

    /// Print config template
    Template,

    /// Show config paths
    Path,
}
