//! CLI layer: argument parsing, edit parsing, rendering and command dispatch

pub mod args;
pub mod commands;
pub mod error;
pub mod output;
pub mod parse;
pub mod render;

pub use args::{Cli, Commands};
pub use error::{CliError, CliResult};
