//! Geolayers CLI
//!
//! Command-line interface for inspecting and editing project layers.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;
use tracing_subscriber::EnvFilter;

use geolayers::cli::{commands, Cli, Commands};
use geolayers::config::Settings;
use geolayers::LayerError;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env();

    // RUST_LOG wins over --verbose, which wins over GEOLAYERS_LOG
    let default_filter = if cli.verbose {
        "debug"
    } else {
        settings.log_filter.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Geolayers v{}", env!("CARGO_PKG_VERSION"));

    let Some(cmd) = cli.command else {
        println!("Geolayers v{}", env!("CARGO_PKG_VERSION"));
        println!("Use --help for available commands");
        return Ok(());
    };

    if let Commands::Drivers = cmd {
        return Ok(commands::list_drivers()?);
    }

    let project = cli
        .project
        .or(settings.project_path.clone())
        .ok_or(LayerError::NoProjectPath)
        .map_err(with_suggestion)?;

    handle_command(cmd, project, &settings).map_err(with_suggestion)
}

fn handle_command(cmd: Commands, project: PathBuf, settings: &Settings) -> geolayers::Result<()> {
    let path = project.as_path();
    match cmd {
        Commands::New { title } => commands::new_project(path, title.as_deref()),
        Commands::List => commands::list_layers(path),
        Commands::AddVector { path: source, name } => {
            commands::add_vector(path, &source, name.as_deref())
        }
        Commands::AddRaster { path: source, name } => {
            commands::add_raster(path, &source, name.as_deref())
        }
        Commands::Remove { name } => commands::remove_layer(path, &name),
        Commands::Features { name, limit } => commands::show_features(path, &name, limit),
        Commands::Attributes { name } => commands::show_attributes(path, &name),
        Commands::Filter {
            name,
            attribute,
            value,
        } => commands::filter_features(path, &name, &attribute, &value),
        Commands::Select { name, ids } => commands::select_features(path, &name, &ids),
        Commands::Crs { name } => commands::show_crs(path, &name),
        Commands::Extent { name } => commands::show_extent(path, &name),
        Commands::Visibility { name, state } => {
            commands::set_visibility(path, &name, state.is_on())
        }
        Commands::Export {
            name,
            output,
            format,
        } => {
            let format = format.unwrap_or_else(|| settings.export_format.clone());
            commands::export_layer(path, &name, &output, &format)
        }
        Commands::Drivers => commands::list_drivers(),
    }
}

fn with_suggestion(err: LayerError) -> anyhow::Error {
    let code = err.error_code();
    match err.recovery_suggestion() {
        Some(hint) => anyhow::Error::new(err).context(format!("[{}] {}", code, hint)),
        None => anyhow::Error::new(err).context(format!("[{}]", code)),
    }
}
