//! Raster layers
//!
//! Only the grid header is kept in memory: dimensions, cell size and the
//! georeferenced extent. Cell values stay in the source file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::extent::Extent;

/// Grid geometry of a raster source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterGrid {
    pub columns: usize,
    pub rows: usize,
    pub cell_size: f64,
    /// Lower-left corner of the lower-left cell
    pub x_origin: f64,
    pub y_origin: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodata: Option<f64>,
}

impl RasterGrid {
    pub fn extent(&self) -> Extent {
        Extent::new(
            self.x_origin,
            self.y_origin,
            self.x_origin + self.columns as f64 * self.cell_size,
            self.y_origin + self.rows as f64 * self.cell_size,
        )
    }
}

/// A raster layer
#[derive(Debug, Clone)]
pub struct RasterLayer {
    source: PathBuf,
    grid: Option<RasterGrid>,
}

impl RasterLayer {
    pub fn new(source: impl Into<PathBuf>, grid: RasterGrid) -> Self {
        Self {
            source: source.into(),
            grid: Some(grid),
        }
    }

    /// Placeholder for a raster whose source could not be read
    pub fn unreadable(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            grid: None,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn grid(&self) -> Option<&RasterGrid> {
        self.grid.as_ref()
    }

    pub fn width(&self) -> usize {
        self.grid.map(|g| g.columns).unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.grid.map(|g| g.rows).unwrap_or(0)
    }

    pub fn extent(&self) -> Extent {
        self.grid.map(|g| g.extent()).unwrap_or_else(Extent::null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_grid_extent() {
        let grid = RasterGrid {
            columns: 4,
            rows: 3,
            cell_size: 0.5,
            x_origin: 10.0,
            y_origin: 20.0,
            nodata: Some(-9999.0),
        };
        let layer = RasterLayer::new("dem.asc", grid);
        let e = layer.extent();
        assert_relative_eq!(e.xmin, 10.0);
        assert_relative_eq!(e.xmax, 12.0);
        assert_relative_eq!(e.ymin, 20.0);
        assert_relative_eq!(e.ymax, 21.5);
        assert_eq!((layer.width(), layer.height()), (4, 3));
    }

    #[test]
    fn test_unreadable_has_null_extent() {
        let layer = RasterLayer::unreadable("missing.asc");
        assert!(layer.extent().is_null());
        assert_eq!(layer.width(), 0);
    }
}
