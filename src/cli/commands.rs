//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::AllocationReport;
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::CliResult;
use crate::cli::output;
use crate::cli::parse::parse_edits;
use crate::cli::render::table_lines;
use crate::config::{global_config_path, local_config_path, OutputFormat, Settings};
use crate::domain::AllocationEngine;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Show { snapshot }) => _show(cli, snapshot),
        Some(Commands::Tree { snapshot }) => _tree(cli, snapshot),
        Some(Commands::Apply { snapshot, edits }) => _apply(cli, snapshot, edits),
        Some(Commands::Variance { snapshot, id }) => _variance(cli, snapshot, id),
        Some(Commands::Config { command }) => _config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Ok(()),
    }
}

/// Settings for a snapshot: explicit `--config` file, or the layered lookup.
fn load_settings(cli: &Cli, snapshot: Option<&Path>) -> CliResult<Settings> {
    let settings = match &cli.config {
        Some(path) => Settings::load_file(path)?,
        None => Settings::load(snapshot.and_then(Path::parent))?,
    };
    debug!(?settings, "settings loaded");
    Ok(settings)
}

fn container_for(cli: &Cli, snapshot: &Path) -> CliResult<ServiceContainer> {
    Ok(ServiceContainer::new(load_settings(cli, Some(snapshot))?))
}

fn report_of(engine: &AllocationEngine) -> CliResult<AllocationReport> {
    Ok(AllocationReport::try_from(engine).map_err(ApplicationError::from)?)
}

fn render(engine: &AllocationEngine, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            let report = report_of(engine)?;
            let lines = table_lines(&report, output::variance_cell);
            if let Some((head, rest)) = lines.split_first() {
                output::header(head);
                if let Some((last, body)) = rest.split_last() {
                    for line in body {
                        output::info(line);
                    }
                    output::total(last);
                }
            }
        }
        OutputFormat::Tree => {
            let grand_total = engine.grand_total().map_err(ApplicationError::from)?;
            output::info(&engine.to_tree_string("allocation"));
            output::total(&format!("Grand Total: {:.2}", grand_total));
        }
        OutputFormat::Json => {
            let report = report_of(engine)?;
            let json = serde_json::to_string_pretty(&report).map_err(InfraError::from)?;
            output::info(&json);
        }
    }
    Ok(())
}

#[instrument(skip(cli))]
fn _show(cli: &Cli, snapshot: &Path) -> CliResult<()> {
    let container = container_for(cli, snapshot)?;
    let engine = container.allocation.open(snapshot)?;
    render(&engine, cli.format.unwrap_or(container.settings.output))
}

#[instrument(skip(cli))]
fn _tree(cli: &Cli, snapshot: &Path) -> CliResult<()> {
    let container = container_for(cli, snapshot)?;
    let engine = container.allocation.open(snapshot)?;
    render(&engine, OutputFormat::Tree)
}

#[instrument(skip(cli))]
fn _apply(cli: &Cli, snapshot: &Path, edits: &[String]) -> CliResult<()> {
    // Reject malformed input before the engine sees any of it
    let edits = parse_edits(edits)?;
    let container = container_for(cli, snapshot)?;
    let mut engine = container.allocation.open(snapshot)?;
    container.allocation.apply_all(&mut engine, &edits)?;
    render(&engine, cli.format.unwrap_or(container.settings.output))
}

#[instrument(skip(cli))]
fn _variance(cli: &Cli, snapshot: &Path, id: &str) -> CliResult<()> {
    let container = container_for(cli, snapshot)?;
    let engine = container.allocation.open(snapshot)?;
    let variance = engine
        .variance(id)
        .map_err(ApplicationError::from)?;
    output::info(&format!("{:.2}%", variance));
    Ok(())
}

fn _config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show { dir } => {
            let settings = match &cli.config {
                Some(path) => Settings::load_file(path)?,
                None => Settings::load(dir.as_deref())?,
            };
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::info(&format!("global: {}", path.display())),
                None => output::info("global: (no config directory)"),
            }
            output::info(&format!("local:  {}", local_config_path(Path::new("<snapshot_dir>")).display()));
        }
    }
    Ok(())
}
