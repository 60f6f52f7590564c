//! Layer providers
//!
//! A provider turns a file path into a `Layer`. Load failures never surface
//! as errors here: the returned layer is marked invalid and carries the
//! reason, the same way a GIS application keeps a broken layer around.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::drivers::{read_ascii_grid, read_prj_crs, DriverRegistry};
use crate::error::LayerError;
use crate::layers::{Crs, Layer, LayerKind, RasterLayer, VectorLayer};

/// Constructs layers from file paths
pub trait LayerProvider {
    /// Open a vector source; the result may be invalid
    fn open_vector(&self, path: &Path, name: &str) -> Layer;

    /// Open a raster source; the result may be invalid
    fn open_raster(&self, path: &Path, name: &str) -> Layer;

    /// Open a source of the given kind
    fn open(&self, kind: LayerKind, path: &Path, name: &str) -> Layer {
        match kind {
            LayerKind::Vector => self.open_vector(path, name),
            LayerKind::Raster => self.open_raster(path, name),
        }
    }
}

/// Provider backed by the local file system and a driver registry
pub struct FileProvider {
    drivers: Arc<DriverRegistry>,
}

impl FileProvider {
    pub fn new(drivers: Arc<DriverRegistry>) -> Self {
        Self { drivers }
    }

    pub fn drivers(&self) -> &DriverRegistry {
        &self.drivers
    }

    fn invalid(kind: LayerKind, path: &Path, name: &str, err: LayerError) -> Layer {
        warn!(path = %path.display(), %kind, "layer source is invalid: {}", err);
        Layer::invalid(kind, name, path, err.to_string())
    }
}

impl Default for FileProvider {
    fn default() -> Self {
        Self::new(Arc::new(DriverRegistry::with_defaults()))
    }
}

impl LayerProvider for FileProvider {
    fn open_vector(&self, path: &Path, name: &str) -> Layer {
        let Some(driver) = self.drivers.for_path(path) else {
            let err = LayerError::InvalidSource {
                path: path.to_path_buf(),
                reason: "no vector driver for this file type".to_string(),
            };
            return Self::invalid(LayerKind::Vector, path, name, err);
        };

        match driver.read(path) {
            Ok(source) => {
                debug!(path = %path.display(), driver = driver.name(), "opened vector source");
                let crs = source.crs.unwrap_or_else(Crs::wgs84);
                let data = VectorLayer::new(path, source.fields, source.features);
                Layer::vector(name, crs, data)
            }
            Err(err) => Self::invalid(LayerKind::Vector, path, name, err),
        }
    }

    fn open_raster(&self, path: &Path, name: &str) -> Layer {
        match read_ascii_grid(path) {
            Ok(grid) => {
                debug!(path = %path.display(), "opened raster source");
                let crs = read_prj_crs(path).unwrap_or_else(Crs::unknown);
                Layer::raster(name, crs, RasterLayer::new(path, grid))
            }
            Err(err) => Self::invalid(LayerKind::Raster, path, name, err),
        }
    }
}
