//! ESRI ASCII grid headers
//!
//! Raster layers only need the georeferencing, so just the header is parsed.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{LayerError, Result};
use crate::layers::{Crs, RasterGrid};

const HEADER_KEYS: usize = 6;

/// Read the header of an `.asc` grid
pub fn read_ascii_grid(path: &Path) -> Result<RasterGrid> {
    let reader = BufReader::new(File::open(path)?);

    let mut columns = None;
    let mut rows = None;
    let mut cell_size = None;
    let mut x = None;
    let mut y = None;
    let mut centered = false;
    let mut nodata = None;

    for line in reader.lines().take(HEADER_KEYS) {
        let line = line?;
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };

        match key.to_lowercase().as_str() {
            "ncols" => columns = Some(parse_value::<usize>(path, key, value)?),
            "nrows" => rows = Some(parse_value::<usize>(path, key, value)?),
            "cellsize" => cell_size = Some(parse_value::<f64>(path, key, value)?),
            "xllcorner" => x = Some(parse_value::<f64>(path, key, value)?),
            "yllcorner" => y = Some(parse_value::<f64>(path, key, value)?),
            "xllcenter" => {
                x = Some(parse_value::<f64>(path, key, value)?);
                centered = true;
            }
            "yllcenter" => {
                y = Some(parse_value::<f64>(path, key, value)?);
                centered = true;
            }
            "nodata_value" => nodata = Some(parse_value::<f64>(path, key, value)?),
            // First data row: the optional nodata line was absent
            _ => break,
        }
    }

    let missing = |key: &str| LayerError::InvalidSource {
        path: path.to_path_buf(),
        reason: format!("missing '{}' in grid header", key),
    };

    let columns = columns.ok_or_else(|| missing("ncols"))?;
    let rows = rows.ok_or_else(|| missing("nrows"))?;
    let cell_size = cell_size.ok_or_else(|| missing("cellsize"))?;
    let mut x_origin = x.ok_or_else(|| missing("xllcorner"))?;
    let mut y_origin = y.ok_or_else(|| missing("yllcorner"))?;

    if cell_size <= 0.0 || columns == 0 || rows == 0 {
        return Err(LayerError::InvalidSource {
            path: path.to_path_buf(),
            reason: "grid has no cells".to_string(),
        });
    }

    if centered {
        x_origin -= cell_size / 2.0;
        y_origin -= cell_size / 2.0;
    }

    Ok(RasterGrid {
        columns,
        rows,
        cell_size,
        x_origin,
        y_origin,
        nodata,
    })
}

/// CRS from the sibling `.prj` file, if it names an authority
pub fn read_prj_crs(path: &Path) -> Option<Crs> {
    let prj = path.with_extension("prj");
    let wkt = std::fs::read_to_string(prj).ok()?;
    Crs::from_wkt_authority(&wkt).or_else(|| Crs::parse(wkt.trim()))
}

fn parse_value<T: std::str::FromStr>(path: &Path, key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| LayerError::InvalidSource {
        path: path.to_path_buf(),
        reason: format!("bad value '{}' for '{}'", value, key),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_corner_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dem.asc");
        fs::write(
            &path,
            "ncols 4\nnrows 2\nxllcorner 100.0\nyllcorner 50.0\ncellsize 10\nNODATA_value -9999\n1 2 3 4\n5 6 7 8\n",
        )
        .unwrap();

        let grid = read_ascii_grid(&path).unwrap();
        assert_eq!((grid.columns, grid.rows), (4, 2));
        assert_eq!(grid.nodata, Some(-9999.0));
        let e = grid.extent();
        assert_relative_eq!(e.xmax, 140.0);
        assert_relative_eq!(e.ymax, 70.0);
    }

    #[test]
    fn test_center_header_without_nodata() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dem.asc");
        fs::write(
            &path,
            "ncols 2\nnrows 2\nxllcenter 0.5\nyllcenter 0.5\ncellsize 1\n1 2\n3 4\n",
        )
        .unwrap();

        let grid = read_ascii_grid(&path).unwrap();
        assert_relative_eq!(grid.x_origin, 0.0);
        assert_relative_eq!(grid.y_origin, 0.0);
        assert!(grid.nodata.is_none());
    }

    #[test]
    fn test_missing_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dem.asc");
        fs::write(&path, "ncols 2\nnrows 2\ncellsize 1\n").unwrap();
        let err = read_ascii_grid(&path).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SOURCE");
    }

    #[test]
    fn test_prj_sidecar() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dem.asc");
        assert!(read_prj_crs(&path).is_none());

        fs::write(
            dir.path().join("dem.prj"),
            r#"PROJCS["ETRS89 / UTM zone 32N",AUTHORITY["EPSG","25832"]]"#,
        )
        .unwrap();
        assert_eq!(read_prj_crs(&path), Some(Crs::new("EPSG:25832")));
    }
}
