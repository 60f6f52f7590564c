//! Geolayers - Layer Registry for GIS Projects
//!
//! Geolayers wraps a GIS project (an ordered map of layers plus a display
//! tree) in a name-keyed facade:
//! 1. Lookup and listing - find layers by name, summarize them
//! 2. Feature queries - features, attribute schema, equality filters
//! 3. Layer state - selection sets, visibility, CRS, extent
//! 4. Export - write vector layers through a format driver
//!
//! # Architecture
//!
//! - `project`: the project store contract and an in-memory implementation
//! - `provider`: turns file paths into (possibly invalid) layers
//! - `drivers`: vector format codecs, looked up by name or extension
//! - `manager`: the `ProjectManager` facade over all of the above

pub mod cli;
pub mod config;
pub mod drivers;
pub mod error;
pub mod layers;
pub mod manager;
pub mod project;
pub mod provider;

pub use error::{LayerError, Result};
pub use manager::ProjectManager;
