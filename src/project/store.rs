//! Project store contract
//!
//! What the facade needs from a project: persistence, the ordered layer map,
//! and the display tree.

use std::path::Path;

use crate::error::Result;
use crate::layers::Layer;
use crate::provider::LayerProvider;

use super::tree::LayerTreeGroup;

/// Owner of a project's layers and layer tree
pub trait ProjectStore {
    /// Replace the current contents with the project stored at `path`
    ///
    /// Layers are re-opened through `provider`.
    fn read(&mut self, path: &Path, provider: &dyn LayerProvider) -> Result<()>;

    /// Persist the project to `path`
    fn write(&self, path: &Path) -> Result<()>;

    /// All layers, in map iteration order
    fn map_layers(&self) -> &[Layer];

    fn map_layer(&self, id: &str) -> Option<&Layer> {
        self.map_layers().iter().find(|l| l.id() == id)
    }

    fn map_layer_mut(&mut self, id: &str) -> Option<&mut Layer>;

    /// Register a layer and give it a node in the layer tree
    fn add_map_layer(&mut self, layer: Layer) -> Result<&Layer>;

    /// Unregister a layer and drop its tree node
    fn remove_map_layer(&mut self, id: &str) -> Option<Layer>;

    fn layer_tree_root(&self) -> &LayerTreeGroup;

    fn layer_tree_root_mut(&mut self) -> &mut LayerTreeGroup;

    fn count(&self) -> usize {
        self.map_layers().len()
    }
}
