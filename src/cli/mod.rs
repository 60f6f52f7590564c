//! CLI Module
//!
//! Command-line interface over a project file.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Geolayers - inspect and edit the layers of a GIS project
#[derive(Parser, Debug)]
#[command(name = "geolayers")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project file (defaults to $GEOLAYERS_PROJECT)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    On,
    Off,
}

impl Visibility {
    pub fn is_on(self) -> bool {
        self == Visibility::On
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty project file
    #[command(name = "new")]
    New {
        /// Project title
        #[arg(short, long)]
        title: Option<String>,
    },

    /// List all layers
    #[command(name = "list")]
    List,

    /// Add a vector layer (GeoJSON, GeoJSONSeq)
    #[command(name = "add-vector")]
    AddVector {
        /// Path to the vector file
        path: PathBuf,

        /// Layer name (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Add a raster layer (ESRI ASCII grid)
    #[command(name = "add-raster")]
    AddRaster {
        /// Path to the raster file
        path: PathBuf,

        /// Layer name (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Remove a layer
    #[command(name = "remove")]
    Remove {
        /// Layer name
        name: String,
    },

    /// Print features of a vector layer
    #[command(name = "features")]
    Features {
        /// Layer name
        name: String,

        /// Maximum number of features
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print attribute field names of a vector layer
    #[command(name = "attributes")]
    Attributes {
        /// Layer name
        name: String,
    },

    /// Print features whose attribute equals a value
    #[command(name = "filter")]
    Filter {
        /// Layer name
        name: String,

        /// Attribute field name
        attribute: String,

        /// Value to match (numbers, true/false and null are typed)
        value: String,
    },

    /// Select features by id
    #[command(name = "select")]
    Select {
        /// Layer name
        name: String,

        /// Feature ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Print the CRS of a layer
    #[command(name = "crs")]
    Crs {
        /// Layer name
        name: String,
    },

    /// Print the extent of a layer
    #[command(name = "extent")]
    Extent {
        /// Layer name
        name: String,
    },

    /// Show or hide a layer
    #[command(name = "visibility")]
    Visibility {
        /// Layer name
        name: String,

        #[arg(value_enum)]
        state: Visibility,
    },

    /// Export a vector layer
    #[command(name = "export")]
    Export {
        /// Layer name
        name: String,

        /// Output file
        output: PathBuf,

        /// Driver name (defaults to $GEOLAYERS_EXPORT_FORMAT or GeoJSON)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// List export drivers
    #[command(name = "drivers")]
    Drivers,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_select() {
        let cli = Cli::parse_from(["geolayers", "-p", "city.json", "select", "roads", "1", "3"]);
        assert_eq!(cli.project, Some(PathBuf::from("city.json")));
        match cli.command {
            Some(Commands::Select { name, ids }) => {
                assert_eq!(name, "roads");
                assert_eq!(ids, vec![1, 3]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_visibility() {
        let cli = Cli::parse_from(["geolayers", "visibility", "dem", "off"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Visibility { state: Visibility::Off, .. })
        ));
    }
}
