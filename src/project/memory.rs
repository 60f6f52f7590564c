//! In-memory project
//!
//! Holds the ordered layer map and the layer tree, and persists both as a
//! JSON project file. Layer content is not stored in the project file, only
//! where to load it from.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{self, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::store::ProjectStore;
use super::tree::LayerTreeGroup;
use crate::error::{LayerError, Result};
use crate::layers::{Crs, Layer, LayerKind};
use crate::provider::LayerProvider;

/// Version written into project files
pub const PROJECT_FORMAT_VERSION: &str = "1.0";

/// Project file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProjectManifest {
    version: String,
    #[serde(default)]
    title: String,
    saved_at: DateTime<Utc>,
    layers: Vec<LayerManifest>,
    #[serde(default)]
    tree: LayerTreeGroup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LayerManifest {
    id: String,
    name: String,
    kind: LayerKind,
    /// Relative to the project file when the source lives beside it
    source: PathBuf,
    #[serde(default)]
    crs: Crs,
}

/// A GIS project: ordered layers plus their display tree
#[derive(Debug, Default)]
pub struct Project {
    title: String,
    layers: Vec<Layer>,
    tree: LayerTreeGroup,
    saved_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Create an empty project
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// When the project was last read from or written to disk
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.saved_at
    }
}

impl ProjectStore for Project {
    fn read(&mut self, path: &Path, provider: &dyn LayerProvider) -> Result<()> {
        let file = File::open(path)?;
        let manifest: ProjectManifest = serde_json::from_reader(BufReader::new(file))?;

        if manifest.version.split('.').next() != PROJECT_FORMAT_VERSION.split('.').next() {
            return Err(LayerError::ProjectFormat {
                reason: format!("unsupported project version {}", manifest.version),
            });
        }

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let mut layers: Vec<Layer> = Vec::with_capacity(manifest.layers.len());

        for entry in manifest.layers {
            if layers.iter().any(|l| l.id() == entry.id) {
                return Err(LayerError::ProjectFormat {
                    reason: format!("layer id '{}' appears twice", entry.id),
                });
            }
            let source = resolve_source(base, &entry.source);
            let layer = provider
                .open(entry.kind, &source, &entry.name)
                .into_id(entry.id)
                .or_crs(entry.crs);
            debug!(id = layer.id(), valid = layer.is_valid(), "restored layer");
            layers.push(layer);
        }

        let mut tree = manifest.tree;
        tree.retain_layers(&|id| layers.iter().any(|l| l.id() == id));
        for layer in &layers {
            if tree.find_layer(layer.id()).is_none() {
                tree.add_layer(layer.id());
            }
        }

        self.title = manifest.title;
        self.layers = layers;
        self.tree = tree;
        self.saved_at = Some(manifest.saved_at);

        info!(path = %path.display(), layers = self.layers.len(), "project read");
        Ok(())
    }

    fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let manifest = ProjectManifest {
            version: PROJECT_FORMAT_VERSION.to_string(),
            title: self.title.clone(),
            saved_at: Utc::now(),
            layers: self
                .layers
                .iter()
                .map(|layer| LayerManifest {
                    id: layer.id().to_string(),
                    name: layer.name().to_string(),
                    kind: layer.kind(),
                    source: relative_source(base, layer.source()),
                    crs: layer.crs().clone(),
                })
                .collect(),
            tree: self.tree.clone(),
        };

        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &manifest)?;

        info!(path = %path.display(), layers = self.layers.len(), "project written");
        Ok(())
    }

    fn map_layers(&self) -> &[Layer] {
        &self.layers
    }

    fn map_layer_mut(&mut self, id: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id() == id)
    }

    fn add_map_layer(&mut self, layer: Layer) -> Result<&Layer> {
        if self.map_layer(layer.id()).is_some() {
            return Err(LayerError::DuplicateLayerId {
                id: layer.id().to_string(),
            });
        }
        self.tree.add_layer(layer.id());
        self.layers.push(layer);
        Ok(&self.layers[self.layers.len() - 1])
    }

    fn remove_map_layer(&mut self, id: &str) -> Option<Layer> {
        let index = self.layers.iter().position(|l| l.id() == id)?;
        self.tree.remove_layer(id);
        Some(self.layers.remove(index))
    }

    fn layer_tree_root(&self) -> &LayerTreeGroup {
        &self.tree
    }

    fn layer_tree_root_mut(&mut self) -> &mut LayerTreeGroup {
        &mut self.tree
    }
}

fn resolve_source(base: &Path, source: &Path) -> PathBuf {
    if source.is_absolute() {
        source.to_path_buf()
    } else {
        base.join(source)
    }
}

/// Source as saved: relative under the project directory, absolute elsewhere
///
/// Relative sources are taken against the working directory, so a layer
/// added as `data/roads.geojson` still resolves once the project file is
/// read back from another directory.
fn relative_source(base: &Path, source: &Path) -> PathBuf {
    let base = if base.as_os_str().is_empty() {
        Path::new(".")
    } else {
        base
    };
    let (Ok(base), Ok(source)) = (path::absolute(base), path::absolute(source)) else {
        return source.to_path_buf();
    };
    match source.strip_prefix(&base) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{LayerData, VectorLayer};
    use crate::provider::FileProvider;
    use tempfile::tempdir;

    fn vector(id: &str, name: &str, source: &Path) -> Layer {
        Layer::with_id(
            id,
            name,
            Crs::wgs84(),
            LayerData::Vector(VectorLayer::empty(source)),
        )
    }

    #[test]
    fn test_add_and_remove_keep_tree_in_sync() {
        let mut project = Project::new();
        project
            .add_map_layer(vector("L1", "roads", Path::new("roads.geojson")))
            .unwrap();
        project
            .add_map_layer(vector("L2", "rivers", Path::new("rivers.geojson")))
            .unwrap();

        assert_eq!(project.count(), 2);
        assert_eq!(project.layer_tree_root().layer_ids(), vec!["L1", "L2"]);

        let removed = project.remove_map_layer("L1").unwrap();
        assert_eq!(removed.name(), "roads");
        assert_eq!(project.layer_tree_root().layer_ids(), vec!["L2"]);
        assert!(project.remove_map_layer("L1").is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut project = Project::new();
        project
            .add_map_layer(vector("L1", "roads", Path::new("a.geojson")))
            .unwrap();
        let err = project
            .add_map_layer(vector("L1", "other", Path::new("b.geojson")))
            .unwrap_err();
        assert_eq!(err.error_code(), "DUPLICATE_LAYER_ID");
        assert_eq!(project.count(), 1);
    }

    #[test]
    fn test_write_read_keeps_ids_order_and_visibility() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("roads.geojson");
        fs::write(&data, r#"{"type": "FeatureCollection", "features": []}"#).unwrap();

        let mut project = Project::with_title("City");
        project.add_map_layer(vector("L1", "roads", &data)).unwrap();
        project
            .add_map_layer(vector("L2", "gone", &dir.path().join("gone.geojson")))
            .unwrap();
        project
            .layer_tree_root_mut()
            .find_layer_mut("L1")
            .unwrap()
            .set_item_visibility_checked(false);

        let path = dir.path().join("city.json");
        project.write(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"source\": \"roads.geojson\""));

        let mut restored = Project::new();
        restored.read(&path, &FileProvider::default()).unwrap();

        assert_eq!(restored.title(), "City");
        let ids: Vec<&str> = restored.map_layers().iter().map(|l| l.id()).collect();
        assert_eq!(ids, vec!["L1", "L2"]);
        assert!(restored.map_layer("L1").unwrap().is_valid());
        assert!(!restored.map_layer("L2").unwrap().is_valid());
        assert_eq!(restored.map_layer("L2").unwrap().crs().authid(), "EPSG:4326");
        assert!(!restored.layer_tree_root().find_layer("L1").unwrap().is_visible());
        assert!(restored.saved_at().is_some());
    }

    #[test]
    fn test_read_rejects_future_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("p.json");
        fs::write(
            &path,
            r#"{"version": "2.0", "saved_at": "2024-01-01T00:00:00Z", "layers": []}"#,
        )
        .unwrap();

        let mut project = Project::new();
        let err = project.read(&path, &FileProvider::default()).unwrap_err();
        assert_eq!(err.error_code(), "PROJECT_FORMAT");
    }

    #[cfg(unix)]
    #[test]
    fn test_cwd_relative_source_outside_project_dir_survives_reload() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("data");
        fs::create_dir(&data).unwrap();
        let roads = data.join("roads.geojson");
        fs::write(&roads, r#"{"type": "FeatureCollection", "features": []}"#).unwrap();

        // Same file, spelled relative to the working directory
        let cwd = std::env::current_dir().unwrap();
        let mut relative = PathBuf::new();
        for _ in cwd.components().skip(1) {
            relative.push("..");
        }
        let relative = relative.join(roads.strip_prefix("/").unwrap());
        assert!(relative.is_relative());
        assert!(relative.exists());

        let mut project = Project::new();
        project.add_map_layer(vector("L1", "roads", &relative)).unwrap();
        let path = dir.path().join("proj").join("city.json");
        project.write(&path).unwrap();

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let saved = manifest["layers"][0]["source"].as_str().unwrap();
        assert!(Path::new(saved).is_absolute(), "saved source: {}", saved);

        let mut restored = Project::new();
        restored.read(&path, &FileProvider::default()).unwrap();
        assert!(restored.map_layer("L1").unwrap().is_valid());
    }
}
