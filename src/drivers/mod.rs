//! Vector drivers
//!
//! A driver reads and writes one vector file format. Drivers are looked up by
//! format name (for export) or by file extension (for loading).

mod ascii_grid;
mod geojson;

pub use self::ascii_grid::{read_ascii_grid, read_prj_crs};
pub use self::geojson::{GeoJsonDriver, GeoJsonSeqDriver};

use std::path::Path;
use std::sync::Arc;

use crate::error::{LayerError, Result};
use crate::layers::{Crs, Feature, Field, VectorLayer};

/// Content read from a vector source
#[derive(Debug, Clone, Default)]
pub struct VectorSource {
    pub fields: Vec<Field>,
    pub features: Vec<Feature>,
    /// CRS declared by the source, if any
    pub crs: Option<Crs>,
}

/// Reader/writer for one vector format
pub trait VectorDriver: Send + Sync {
    /// Format name used to pick the driver, e.g. `GeoJSON`
    fn name(&self) -> &'static str;

    /// Lowercase file extensions this driver opens
    fn extensions(&self) -> &'static [&'static str];

    /// Read every feature and the schema from `path`
    fn read(&self, path: &Path) -> Result<VectorSource>;

    /// Write a layer's features to `path`, replacing any existing file
    fn write(&self, layer: &VectorLayer, crs: &Crs, path: &Path) -> Result<()>;
}

/// Registry of available vector drivers
pub struct DriverRegistry {
    drivers: Vec<Arc<dyn VectorDriver>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: Vec::new(),
        }
    }

    /// Create registry with the built-in drivers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GeoJsonDriver));
        registry.register(Arc::new(GeoJsonSeqDriver));
        registry
    }

    /// Register a driver, replacing one with the same name
    pub fn register(&mut self, driver: Arc<dyn VectorDriver>) {
        self.drivers
            .retain(|d| !d.name().eq_ignore_ascii_case(driver.name()));
        self.drivers.push(driver);
    }

    /// Get a driver by format name (case-insensitive)
    pub fn get(&self, format: &str) -> Result<Arc<dyn VectorDriver>> {
        self.drivers
            .iter()
            .find(|d| d.name().eq_ignore_ascii_case(format))
            .cloned()
            .ok_or_else(|| LayerError::UnknownDriver {
                format: format.to_string(),
            })
    }

    /// Find the driver that opens files with this path's extension
    pub fn for_path(&self, path: &Path) -> Option<Arc<dyn VectorDriver>> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.drivers
            .iter()
            .find(|d| d.extensions().contains(&ext.as_str()))
            .cloned()
    }

    /// Registered format names, in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.drivers.iter().map(|d| d.name()).collect()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
