//! Layer tree
//!
//! The display tree that decides which layers are drawn. Each layer in a
//! project has one node; groups nest nodes and carry their own check state.

use serde::{Deserialize, Serialize};

/// Tree node pointing at a map layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerTreeLayer {
    pub layer_id: String,
    pub visible: bool,
}

impl LayerTreeLayer {
    pub fn new(layer_id: impl Into<String>) -> Self {
        Self {
            layer_id: layer_id.into(),
            visible: true,
        }
    }

    pub fn set_item_visibility_checked(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Child of a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum LayerTreeNode {
    Layer(LayerTreeLayer),
    Group(LayerTreeGroup),
}

/// Named group of tree nodes; the project root is an unnamed group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerTreeGroup {
    pub name: String,
    pub visible: bool,
    #[serde(default)]
    pub children: Vec<LayerTreeNode>,
}

impl Default for LayerTreeGroup {
    fn default() -> Self {
        Self::new("")
    }
}

impl LayerTreeGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            children: Vec::new(),
        }
    }

    /// Append a node for `layer_id`
    pub fn add_layer(&mut self, layer_id: &str) -> &mut LayerTreeLayer {
        self.children
            .push(LayerTreeNode::Layer(LayerTreeLayer::new(layer_id)));
        match self.children.last_mut() {
            Some(LayerTreeNode::Layer(node)) => node,
            _ => unreachable!("just pushed a layer node"),
        }
    }

    /// Append a subgroup
    pub fn add_group(&mut self, name: &str) -> &mut LayerTreeGroup {
        self.children
            .push(LayerTreeNode::Group(LayerTreeGroup::new(name)));
        match self.children.last_mut() {
            Some(LayerTreeNode::Group(group)) => group,
            _ => unreachable!("just pushed a group node"),
        }
    }

    /// Depth-first search for the node of `layer_id`
    pub fn find_layer(&self, layer_id: &str) -> Option<&LayerTreeLayer> {
        self.children.iter().find_map(|child| match child {
            LayerTreeNode::Layer(node) if node.layer_id == layer_id => Some(node),
            LayerTreeNode::Layer(_) => None,
            LayerTreeNode::Group(group) => group.find_layer(layer_id),
        })
    }

    pub fn find_layer_mut(&mut self, layer_id: &str) -> Option<&mut LayerTreeLayer> {
        self.children.iter_mut().find_map(|child| match child {
            LayerTreeNode::Layer(node) if node.layer_id == layer_id => Some(node),
            LayerTreeNode::Layer(_) => None,
            LayerTreeNode::Group(group) => group.find_layer_mut(layer_id),
        })
    }

    /// Remove the node of `layer_id` wherever it sits; true if one was removed
    pub fn remove_layer(&mut self, layer_id: &str) -> bool {
        let before = self.children.len();
        self.children.retain(
            |child| !matches!(child, LayerTreeNode::Layer(node) if node.layer_id == layer_id),
        );
        if self.children.len() != before {
            return true;
        }
        self.children.iter_mut().any(|child| match child {
            LayerTreeNode::Group(group) => group.remove_layer(layer_id),
            LayerTreeNode::Layer(_) => false,
        })
    }

    /// Ids of every layer node, depth first
    pub fn layer_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        for child in &self.children {
            match child {
                LayerTreeNode::Layer(node) => ids.push(node.layer_id.as_str()),
                LayerTreeNode::Group(group) => ids.extend(group.layer_ids()),
            }
        }
        ids
    }

    /// Drop nodes whose layer is not in `known`
    pub fn retain_layers(&mut self, known: &dyn Fn(&str) -> bool) {
        self.children.retain(|child| match child {
            LayerTreeNode::Layer(node) => known(&node.layer_id),
            LayerTreeNode::Group(_) => true,
        });
        for child in &mut self.children {
            if let LayerTreeNode::Group(group) = child {
                group.retain_layers(known);
            }
        }
    }
}
