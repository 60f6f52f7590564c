//! Project Module
//!
//! The project store contract, the in-memory `Project` and its layer tree.

mod memory;
mod store;
mod tree;

pub use memory::{Project, PROJECT_FORMAT_VERSION};
pub use store::ProjectStore;
pub use tree::{LayerTreeGroup, LayerTreeLayer, LayerTreeNode};
