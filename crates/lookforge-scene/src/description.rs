//! Scene descriptions
//!
//! A serde-friendly description of a scene graph, so tools and tests
//! can load a scene from a JSON file instead of a live host session.
//! Node names must be unique within one description; connections
//! reference plugs as `node.attr`.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use lookforge_core::{Error, Result};

use crate::graph::SceneGraph;
use crate::node::{AttrValue, NodeId, NodeKind};

/// One node in a scene description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDesc {
    /// Unique node name
    pub name: String,
    /// Node type
    pub kind: NodeKind,
    /// Parent node name, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Initial attribute values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, AttrValue>,
}

/// One connection in a scene description, plugs as `node.attr`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDesc {
    /// Source plug
    pub from: String,
    /// Destination plug
    pub to: String,
}

/// A complete scene description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Nodes, created in order
    #[serde(default)]
    pub nodes: Vec<NodeDesc>,
    /// Connections, applied after all nodes exist
    #[serde(default)]
    pub connections: Vec<ConnectionDesc>,
}

impl SceneDescription {
    /// Parse a description from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::scene_description(e.to_string()))
    }

    /// Load a description from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Build a scene graph from this description
    pub fn build(&self) -> Result<SceneGraph> {
        let mut graph = SceneGraph::new();
        let mut by_name: HashMap<&str, NodeId> = HashMap::new();

        for desc in &self.nodes {
            if by_name.contains_key(desc.name.as_str()) {
                return Err(Error::scene_description(format!(
                    "duplicate node name: {}",
                    desc.name
                )));
            }
            let id = graph.create_node(desc.kind, &desc.name);
            for (attr, value) in &desc.attrs {
                graph.set_attr(id, attr, value.clone());
            }
            by_name.insert(&desc.name, id);
        }

        for desc in &self.nodes {
            if let Some(parent) = &desc.parent {
                let child = by_name[desc.name.as_str()];
                let parent = *by_name
                    .get(parent.as_str())
                    .ok_or_else(|| Error::unknown_node(parent))?;
                graph.set_parent(child, parent);
            }
        }

        for conn in &self.connections {
            let (src_name, src_attr) = split_plug(&conn.from)?;
            let (dst_name, dst_attr) = split_plug(&conn.to)?;
            let src = *by_name
                .get(src_name)
                .ok_or_else(|| Error::unknown_node(src_name))?;
            let dst = *by_name
                .get(dst_name)
                .ok_or_else(|| Error::unknown_node(dst_name))?;
            graph.connect(src, src_attr, dst, dst_attr);
        }

        Ok(graph)
    }
}

/// Split a `node.attr` plug reference at the first dot
fn split_plug(plug: &str) -> Result<(&str, &str)> {
    plug.split_once('.')
        .filter(|(node, attr)| !node.is_empty() && !attr.is_empty())
        .ok_or_else(|| Error::scene_description(format!("invalid plug reference: {plug}")))
}
