//! Project Manager
//!
//! Name-keyed facade over a project's layers. Every operation resolves the
//! layer by name, checks its kind where needed, and passes straight through
//! to the project store, provider or driver. Failures come back as `None`,
//! `false` or an empty `Vec`, and the reason is logged; only the explicit
//! load/add/save operations hand back a `Result`.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::drivers::DriverRegistry;
use crate::error::{LayerError, Result};
use crate::layers::{
    Extent, Feature, FeatureId, FieldValue, Layer, LayerKind, LayerSummary, VectorLayer,
};
use crate::project::ProjectStore;
use crate::provider::LayerProvider;

/// Layer registry facade over an externally owned project
pub struct ProjectManager<'a> {
    project: &'a mut dyn ProjectStore,
    provider: &'a dyn LayerProvider,
    drivers: &'a DriverRegistry,
    project_path: Option<PathBuf>,
}

impl<'a> ProjectManager<'a> {
    /// Wrap a project without touching the file system
    pub fn new(
        project: &'a mut dyn ProjectStore,
        provider: &'a dyn LayerProvider,
        drivers: &'a DriverRegistry,
    ) -> Self {
        Self {
            project,
            provider,
            drivers,
            project_path: None,
        }
    }

    /// Wrap a project and remember `path`, loading it if the file exists
    pub fn open(
        project: &'a mut dyn ProjectStore,
        provider: &'a dyn LayerProvider,
        drivers: &'a DriverRegistry,
        path: &Path,
    ) -> Self {
        let mut manager = Self::new(project, provider, drivers);
        manager.project_path = Some(path.to_path_buf());
        if path.exists() {
            if let Err(err) = manager.load_project(path) {
                warn!(path = %path.display(), "failed to load project: {}", err);
            }
        }
        manager
    }

    /// Path the project was last loaded from or saved to
    pub fn project_path(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }

    pub fn project(&self) -> &dyn ProjectStore {
        &*self.project
    }

    // ------------------------------------------------------------------
    // Project persistence
    // ------------------------------------------------------------------

    /// Load a project file, replacing the current layers
    pub fn load_project(&mut self, path: &Path) -> Result<()> {
        self.project_path = Some(path.to_path_buf());
        match self.project.read(path, self.provider) {
            Ok(()) => {
                info!(
                    path = %path.display(),
                    layers = self.project.count(),
                    "project loaded"
                );
                Ok(())
            }
            Err(err) => {
                warn!(path = %path.display(), "failed to load project: {}", err);
                Err(err)
            }
        }
    }

    /// Save to `path`, or to the remembered project path
    pub fn save_project(&mut self, path: Option<&Path>) -> Result<()> {
        let path = match path.map(Path::to_path_buf).or_else(|| self.project_path.clone()) {
            Some(path) => path,
            None => {
                warn!("no project path specified");
                return Err(LayerError::NoProjectPath);
            }
        };

        match self.project.write(&path) {
            Ok(()) => {
                info!(path = %path.display(), "project saved");
                self.project_path = Some(path);
                Ok(())
            }
            Err(err) => {
                warn!(path = %path.display(), "failed to save project: {}", err);
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// First layer named `name`, in map iteration order
    ///
    /// Names are not unique; later layers with the same name are shadowed.
    pub fn find_by_name(&self, name: &str) -> Option<&Layer> {
        let found = self.project.map_layers().iter().find(|l| l.name() == name);
        if found.is_none() {
            debug!(name, "layer not found");
        }
        found
    }

    /// Summaries of every layer, in map iteration order
    pub fn list(&self) -> Vec<LayerSummary> {
        self.project
            .map_layers()
            .iter()
            .map(|layer| {
                let summary = layer.summary();
                info!(
                    "Layer: {} ({}) - CRS: {}",
                    summary.name, summary.kind, summary.crs
                );
                summary
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Layer registration
    // ------------------------------------------------------------------

    /// Open a vector source and register it; `name` defaults to the file stem
    pub fn add_vector(&mut self, path: &Path, name: Option<&str>) -> Result<&Layer> {
        self.add_layer(LayerKind::Vector, path, name)
    }

    /// Open a raster source and register it; `name` defaults to the file stem
    pub fn add_raster(&mut self, path: &Path, name: Option<&str>) -> Result<&Layer> {
        self.add_layer(LayerKind::Raster, path, name)
    }

    fn add_layer(&mut self, kind: LayerKind, path: &Path, name: Option<&str>) -> Result<&Layer> {
        let name = name.map(str::to_string).unwrap_or_else(|| default_layer_name(path));
        let layer = self.provider.open(kind, path, &name);

        if !layer.is_valid() {
            let err = LayerError::InvalidSource {
                path: path.to_path_buf(),
                reason: layer.load_error().unwrap_or("layer is not valid").to_string(),
            };
            warn!("Failed to load {} layer: {}", kind, err);
            return Err(err);
        }

        let layer = self.project.add_map_layer(layer).map_err(|err| {
            warn!("Failed to register {} layer {}: {}", kind, name, err);
            err
        })?;
        info!(id = layer.id(), "{} layer added: {}", kind, layer.name());
        Ok(layer)
    }

    /// Remove the first layer named `name`; false if there is none
    pub fn remove(&mut self, name: &str) -> bool {
        let id = match self.resolve(name) {
            Ok(layer) => layer.id().to_string(),
            Err(err) => return report("remove", err, false),
        };

        match self.project.remove_map_layer(&id) {
            Some(_) => {
                info!(id = %id, "Layer removed: {}", name);
                true
            }
            None => report("remove", LayerError::NotFound { name: id }, false),
        }
    }

    // ------------------------------------------------------------------
    // Feature queries
    // ------------------------------------------------------------------

    /// Up to `limit` features in native order, all when `limit` is `None`
    pub fn features(&self, name: &str, limit: Option<usize>) -> Vec<&Feature> {
        match self.resolve_vector(name) {
            Ok(vector) => {
                let take = limit.unwrap_or(usize::MAX);
                let features: Vec<&Feature> = vector.features().iter().take(take).collect();
                debug!("Retrieved {} features from {}", features.len(), name);
                features
            }
            Err(err) => report("features", err, Vec::new()),
        }
    }

    /// Attribute field names in schema order
    pub fn attributes(&self, name: &str) -> Vec<String> {
        match self.resolve_vector(name) {
            Ok(vector) => vector.field_names(),
            Err(err) => report("attributes", err, Vec::new()),
        }
    }

    /// Features whose `attribute` equals `value`, scanning every feature
    pub fn filter(&self, name: &str, attribute: &str, value: &FieldValue) -> Vec<&Feature> {
        match self.resolve_vector(name) {
            Ok(vector) => {
                let matching: Vec<&Feature> = vector
                    .features()
                    .iter()
                    .filter(|f| f.attribute(attribute).is_some_and(|v| v.matches(value)))
                    .collect();
                debug!(
                    "Found {} features matching {}={}",
                    matching.len(),
                    attribute,
                    value
                );
                matching
            }
            Err(err) => report("filter", err, Vec::new()),
        }
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Replace the selection of a vector layer with exactly `ids`
    pub fn select(&mut self, name: &str, ids: &[FeatureId]) -> bool {
        match self.resolve_vector_mut(name) {
            Ok(vector) => {
                vector.select_by_ids(ids);
                info!("Selected {} features in {}", vector.selected_count(), name);
                true
            }
            Err(err) => report("select", err, false),
        }
    }

    /// Empty the selection of a vector layer
    pub fn clear_selection(&mut self, name: &str) -> bool {
        match self.resolve_vector_mut(name) {
            Ok(vector) => {
                vector.remove_selection();
                info!("Selection cleared in {}", name);
                true
            }
            Err(err) => report("clear_selection", err, false),
        }
    }

    /// Currently selected feature ids, ascending
    pub fn selected_ids(&self, name: &str) -> Vec<FeatureId> {
        match self.resolve_vector(name) {
            Ok(vector) => vector.selected_ids(),
            Err(err) => report("selected_ids", err, Vec::new()),
        }
    }

    // ------------------------------------------------------------------
    // Layer properties
    // ------------------------------------------------------------------

    /// Authority id of the layer CRS; `None` if unresolved or unknown
    pub fn crs(&self, name: &str) -> Option<String> {
        match self.resolve(name) {
            Ok(layer) if layer.crs().is_known() => Some(layer.crs().authid().to_string()),
            Ok(_) => {
                debug!(name, "layer CRS is unknown");
                None
            }
            Err(err) => report("crs", err, None),
        }
    }

    /// Bounding box of the layer content; `None` if unresolved or invalid
    pub fn extent(&self, name: &str) -> Option<Extent> {
        match self.resolve(name) {
            Ok(layer) => {
                let extent = layer.extent();
                if extent.is_none() {
                    warn!(name, "layer is invalid, no extent");
                }
                extent
            }
            Err(err) => report("extent", err, None),
        }
    }

    /// Check or uncheck the layer's node in the layer tree
    pub fn set_visible(&mut self, name: &str, visible: bool) -> bool {
        let id = match self.resolve(name) {
            Ok(layer) => layer.id().to_string(),
            Err(err) => return report("set_visible", err, false),
        };

        match self.project.layer_tree_root_mut().find_layer_mut(&id) {
            Some(node) => {
                node.set_item_visibility_checked(visible);
                info!("Layer visibility set: {} = {}", name, visible);
                true
            }
            None => {
                warn!(id = %id, "layer {} has no layer tree node", name);
                false
            }
        }
    }

    /// Tree visibility of the layer; `None` if the layer or node is missing
    pub fn is_visible(&self, name: &str) -> Option<bool> {
        let layer = self.resolve(name).ok()?;
        self.project
            .layer_tree_root()
            .find_layer(layer.id())
            .map(|node| node.is_visible())
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Write a vector layer to `output_path` with the driver named `format`
    pub fn export(&self, name: &str, output_path: &Path, format: &str) -> bool {
        match self.export_layer(name, output_path, format) {
            Ok(()) => {
                info!("Layer exported to: {}", output_path.display());
                true
            }
            Err(err) => report("export", err, false),
        }
    }

    fn export_layer(&self, name: &str, output_path: &Path, format: &str) -> Result<()> {
        let layer = self.resolve(name)?;
        let vector = as_vector(name, layer)?;
        if !layer.is_valid() {
            return Err(LayerError::InvalidSource {
                path: layer.source().to_path_buf(),
                reason: "cannot export an invalid layer".to_string(),
            });
        }

        let driver = self.drivers.get(format)?;
        driver
            .write(vector, layer.crs(), output_path)
            .map_err(|err| match err {
                LayerError::CodecError { .. } => err,
                other => LayerError::CodecError {
                    reason: other.to_string(),
                },
            })
    }

    /// Export formats the driver registry knows
    pub fn drivers(&self) -> Vec<&'static str> {
        self.drivers.names()
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    fn resolve(&self, name: &str) -> Result<&Layer> {
        self.project
            .map_layers()
            .iter()
            .find(|l| l.name() == name)
            .ok_or_else(|| LayerError::NotFound {
                name: name.to_string(),
            })
    }

    fn resolve_vector(&self, name: &str) -> Result<&VectorLayer> {
        as_vector(name, self.resolve(name)?)
    }

    fn resolve_vector_mut(&mut self, name: &str) -> Result<&mut VectorLayer> {
        let id = self.resolve(name)?.id().to_string();
        let layer = self
            .project
            .map_layer_mut(&id)
            .ok_or_else(|| LayerError::NotFound {
                name: name.to_string(),
            })?;
        let kind = layer.kind();
        layer.as_vector_mut().ok_or_else(|| LayerError::TypeMismatch {
            name: name.to_string(),
            expected: LayerKind::Vector,
            found: kind,
        })
    }
}

fn as_vector<'l>(name: &str, layer: &'l Layer) -> Result<&'l VectorLayer> {
    layer.as_vector().ok_or_else(|| LayerError::TypeMismatch {
        name: name.to_string(),
        expected: LayerKind::Vector,
        found: layer.kind(),
    })
}

/// Log a failed operation and hand back its fallback value
fn report<T>(operation: &str, err: LayerError, fallback: T) -> T {
    warn!(operation, code = err.error_code(), "{}", err);
    fallback
}

fn default_layer_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("layer")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{Crs, LayerData, RasterGrid, RasterLayer};
    use crate::project::Project;
    use crate::provider::FileProvider;
    use geo_types::point;
    use pretty_assertions::assert_eq;

    fn roads() -> Layer {
        let data = VectorLayer::from_features(
            "roads.geojson",
            vec![
                Feature::new(1)
                    .with_geometry(point!(x: 0.0, y: 0.0))
                    .with_attribute("type", "highway")
                    .with_attribute("lanes", 4i64),
                Feature::new(2)
                    .with_geometry(point!(x: 10.0, y: 5.0))
                    .with_attribute("type", "street")
                    .with_attribute("lanes", 2i64),
                Feature::new(3)
                    .with_geometry(point!(x: -2.0, y: 1.0))
                    .with_attribute("type", "highway")
                    .with_attribute("lanes", 2i64),
            ],
        );
        Layer::with_id("L1", "roads", Crs::wgs84(), LayerData::Vector(data))
    }

    fn dem() -> Layer {
        let grid = RasterGrid {
            columns: 10,
            rows: 10,
            cell_size: 1.0,
            x_origin: 0.0,
            y_origin: 0.0,
            nodata: None,
        };
        Layer::with_id(
            "R1",
            "dem",
            Crs::unknown(),
            LayerData::Raster(RasterLayer::new("dem.asc", grid)),
        )
    }

    fn project() -> Project {
        let mut project = Project::new();
        project.add_map_layer(roads()).unwrap();
        project.add_map_layer(dem()).unwrap();
        project
    }

    #[test]
    fn test_find_by_name() {
        let mut project = project();
        let provider = FileProvider::default();
        let drivers = DriverRegistry::with_defaults();
        let manager = ProjectManager::new(&mut project, &provider, &drivers);

        assert_eq!(manager.find_by_name("roads").unwrap().id(), "L1");
        assert!(manager.find_by_name("rivers").is_none());
    }

    #[test]
    fn test_raster_rejected_by_vector_operations() {
        let mut project = project();
        let provider = FileProvider::default();
        let drivers = DriverRegistry::with_defaults();
        let mut manager = ProjectManager::new(&mut project, &provider, &drivers);

        assert!(manager.features("dem", None).is_empty());
        assert!(manager.attributes("dem").is_empty());
        assert!(manager
            .filter("dem", "type", &FieldValue::from("highway"))
            .is_empty());
        assert!(!manager.select("dem", &[1]));
        assert!(!manager.clear_selection("dem"));
        assert!(!manager.export("dem", Path::new("/tmp/never.geojson"), "GeoJSON"));
        assert!(manager.extent("dem").is_some());
    }

    #[test]
    fn test_features_limit() {
        let mut project = project();
        let provider = FileProvider::default();
        let drivers = DriverRegistry::with_defaults();
        let manager = ProjectManager::new(&mut project, &provider, &drivers);

        let ids = |fs: Vec<&Feature>| fs.iter().map(|f| f.id).collect::<Vec<_>>();
        assert_eq!(ids(manager.features("roads", None)), vec![1, 2, 3]);
        assert_eq!(ids(manager.features("roads", Some(2))), vec![1, 2]);
        assert!(manager.features("roads", Some(0)).is_empty());
        assert_eq!(ids(manager.features("roads", Some(10))), vec![1, 2, 3]);
    }

    #[test]
    fn test_filter_and_attributes() {
        let mut project = project();
        let provider = FileProvider::default();
        let drivers = DriverRegistry::with_defaults();
        let manager = ProjectManager::new(&mut project, &provider, &drivers);

        assert_eq!(manager.attributes("roads"), vec!["type", "lanes"]);

        let highways = manager.filter("roads", "type", &FieldValue::from("highway"));
        let ids: Vec<FeatureId> = highways.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let two_lanes = manager.filter("roads", "lanes", &FieldValue::Real(2.0));
        assert_eq!(two_lanes.len(), 2);

        assert!(manager
            .filter("roads", "missing", &FieldValue::Null)
            .is_empty());
    }

    #[test]
    fn test_selection_and_visibility() {
        let mut project = project();
        let provider = FileProvider::default();
        let drivers = DriverRegistry::with_defaults();
        let mut manager = ProjectManager::new(&mut project, &provider, &drivers);

        assert!(manager.select("roads", &[3, 1]));
        assert_eq!(manager.selected_ids("roads"), vec![1, 3]);
        assert!(manager.clear_selection("roads"));
        assert!(manager.selected_ids("roads").is_empty());

        assert_eq!(manager.is_visible("dem"), Some(true));
        assert!(manager.set_visible("dem", false));
        assert_eq!(manager.is_visible("dem"), Some(false));
        assert!(!manager.set_visible("missing", false));
    }

    #[test]
    fn test_visibility_without_tree_node() {
        let mut project = project();
        project.layer_tree_root_mut().remove_layer("L1");
        let provider = FileProvider::default();
        let drivers = DriverRegistry::with_defaults();
        let mut manager = ProjectManager::new(&mut project, &provider, &drivers);

        assert!(!manager.set_visible("roads", true));
        assert_eq!(manager.is_visible("roads"), None);
    }

    #[test]
    fn test_crs_and_extent() {
        let mut project = project();
        let provider = FileProvider::default();
        let drivers = DriverRegistry::with_defaults();
        let manager = ProjectManager::new(&mut project, &provider, &drivers);

        assert_eq!(manager.crs("roads").as_deref(), Some("EPSG:4326"));
        assert_eq!(manager.crs("dem"), None);
        assert_eq!(manager.crs("missing"), None);

        assert_eq!(
            manager.extent("roads"),
            Some(Extent::new(-2.0, 0.0, 10.0, 5.0))
        );
        assert_eq!(
            manager.extent("dem"),
            Some(Extent::new(0.0, 0.0, 10.0, 10.0))
        );
        assert_eq!(manager.extent("missing"), None);
    }

    #[test]
    fn test_export_unknown_format() {
        let mut project = project();
        let provider = FileProvider::default();
        let drivers = DriverRegistry::with_defaults();
        let manager = ProjectManager::new(&mut project, &provider, &drivers);

        let dir = tempfile::tempdir().unwrap();
        assert!(!manager.export("roads", &dir.path().join("roads.shp"), "ESRI Shapefile"));
        assert!(manager.export("roads", &dir.path().join("roads.geojson"), "GeoJSON"));
    }

    #[test]
    fn test_save_without_path() {
        let mut project = Project::new();
        let provider = FileProvider::default();
        let drivers = DriverRegistry::with_defaults();
        let mut manager = ProjectManager::new(&mut project, &provider, &drivers);

        let err = manager.save_project(None).unwrap_err();
        assert_eq!(err.error_code(), "NO_PROJECT_PATH");
        assert!(manager.project_path().is_none());
    }

    #[test]
    fn test_default_layer_name() {
        assert_eq!(default_layer_name(Path::new("/data/roads.geojson")), "roads");
        assert_eq!(default_layer_name(Path::new("/")), "layer");
    }
}
