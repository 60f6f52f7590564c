//! CLI Command Implementations
//!
//! Each command opens the project file, runs one facade operation and saves
//! the project again if the operation changed it.

use std::path::Path;
use std::sync::Arc;

use log::{info, warn};

use crate::drivers::DriverRegistry;
use crate::error::Result;
use crate::layers::{Feature, FieldValue};
use crate::manager::ProjectManager;
use crate::project::{Project, ProjectStore};
use crate::provider::FileProvider;

/// Open the project at `path`, run `op`, and save afterwards when `save` is set
///
/// A missing project file starts an empty project.
fn with_manager<T, F>(path: &Path, save: bool, op: F) -> Result<T>
where
    F: FnOnce(&mut ProjectManager<'_>) -> Result<T>,
{
    let drivers = Arc::new(DriverRegistry::with_defaults());
    let provider = FileProvider::new(Arc::clone(&drivers));
    let mut project = Project::new();
    let mut manager = ProjectManager::new(&mut project, &provider, &drivers);

    if path.exists() {
        manager.load_project(path)?;
    } else {
        info!("Project {} does not exist yet, starting empty", path.display());
    }

    let out = op(&mut manager)?;
    if save {
        manager.save_project(Some(path))?;
    }
    Ok(out)
}

/// Create an empty project file.
pub fn new_project(path: &Path, title: Option<&str>) -> Result<()> {
    info!("Creating new project at: {}", path.display());

    let project = Project::with_title(title.unwrap_or_default());
    project.write(path)?;

    println!("Project created: {}", path.display());
    Ok(())
}

/// List all layers.
pub fn list_layers(path: &Path) -> Result<()> {
    with_manager(path, false, |manager| {
        let layers = manager.list();
        if layers.is_empty() {
            println!("No layers in project.");
            return Ok(());
        }

        println!("{:<40} {:<20} {:<7} {:<6} CRS", "ID", "NAME", "KIND", "VALID");
        println!("{:-<90}", "");
        for layer in layers {
            println!(
                "{:<40} {:<20} {:<7} {:<6} {}",
                layer.id, layer.name, layer.kind, layer.valid, layer.crs
            );
        }
        Ok(())
    })
}

/// Add a vector layer.
pub fn add_vector(path: &Path, source: &Path, name: Option<&str>) -> Result<()> {
    with_manager(path, true, |manager| {
        let layer = manager.add_vector(source, name)?;
        println!("Vector layer added: {} ({})", layer.name(), layer.id());
        Ok(())
    })
}

/// Add a raster layer.
pub fn add_raster(path: &Path, source: &Path, name: Option<&str>) -> Result<()> {
    with_manager(path, true, |manager| {
        let layer = manager.add_raster(source, name)?;
        println!("Raster layer added: {} ({})", layer.name(), layer.id());
        Ok(())
    })
}

/// Remove a layer.
pub fn remove_layer(path: &Path, name: &str) -> Result<()> {
    with_manager(path, true, |manager| {
        if manager.remove(name) {
            println!("Layer removed: {}", name);
        } else {
            println!("Layer not found: {}", name);
        }
        Ok(())
    })
}

/// Print features of a vector layer.
pub fn show_features(path: &Path, name: &str, limit: Option<usize>) -> Result<()> {
    with_manager(path, false, |manager| {
        let features = manager.features(name, limit);
        for feature in &features {
            println!("{}", format_feature(feature));
        }
        println!("Retrieved {} features from {}", features.len(), name);
        Ok(())
    })
}

/// Print attribute names of a vector layer.
pub fn show_attributes(path: &Path, name: &str) -> Result<()> {
    with_manager(path, false, |manager| {
        let fields = manager.attributes(name);
        println!("Layer attributes: {:?}", fields);
        Ok(())
    })
}

/// Print features matching `attribute = value`.
pub fn filter_features(path: &Path, name: &str, attribute: &str, value: &str) -> Result<()> {
    let value = FieldValue::parse_literal(value);
    with_manager(path, false, |manager| {
        let matching = manager.filter(name, attribute, &value);
        for feature in &matching {
            println!("{}", format_feature(feature));
        }
        println!(
            "Found {} features matching {}={}",
            matching.len(),
            attribute,
            value
        );
        Ok(())
    })
}

/// Select features by id and report the selection.
///
/// Selections are runtime state and are not written to the project file.
pub fn select_features(path: &Path, name: &str, ids: &[i64]) -> Result<()> {
    with_manager(path, false, |manager| {
        if manager.select(name, ids) {
            let selected = manager.selected_ids(name);
            println!("Selected {} features in {}: {:?}", selected.len(), name, selected);
        } else {
            println!("Invalid layer or not a vector layer: {}", name);
        }
        Ok(())
    })
}

/// Print a layer's CRS.
pub fn show_crs(path: &Path, name: &str) -> Result<()> {
    with_manager(path, false, |manager| {
        match manager.crs(name) {
            Some(crs) => println!("{}", crs),
            None => println!("No CRS for layer: {}", name),
        }
        Ok(())
    })
}

/// Print a layer's extent.
pub fn show_extent(path: &Path, name: &str) -> Result<()> {
    with_manager(path, false, |manager| {
        match manager.extent(name) {
            Some(extent) => println!("{}", serde_json::to_string_pretty(&extent)?),
            None => println!("No extent for layer: {}", name),
        }
        Ok(())
    })
}

/// Show or hide a layer.
pub fn set_visibility(path: &Path, name: &str, visible: bool) -> Result<()> {
    with_manager(path, true, |manager| {
        if manager.set_visible(name, visible) {
            println!("Layer visibility set: {} = {}", name, visible);
        } else {
            warn!("Could not change visibility of {}", name);
            println!("Layer not found: {}", name);
        }
        Ok(())
    })
}

/// Export a vector layer.
pub fn export_layer(path: &Path, name: &str, output: &Path, format: &str) -> Result<()> {
    with_manager(path, false, |manager| {
        if manager.export(name, output, format) {
            println!("Layer exported to: {}", output.display());
        } else {
            println!("Export of {} as {} failed", name, format);
        }
        Ok(())
    })
}

/// List export drivers.
pub fn list_drivers() -> Result<()> {
    let registry = DriverRegistry::with_defaults();
    for name in registry.names() {
        let driver = registry.get(name)?;
        println!("{:<12} .{}", name, driver.extensions().join(", ."));
    }
    Ok(())
}

fn format_feature(feature: &Feature) -> String {
    let attributes: Vec<String> = feature
        .attributes
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    let geometry = feature
        .geometry
        .as_ref()
        .map(geometry_type)
        .unwrap_or("None");
    format!("#{} [{}] {}", feature.id, geometry, attributes.join(", "))
}

fn geometry_type(geometry: &geo_types::Geometry<f64>) -> &'static str {
    use geo_types::Geometry;

    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
