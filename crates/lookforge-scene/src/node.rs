//! Scene node structures

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Opaque handle to a node in a [`crate::SceneGraph`]
///
/// Handles have identity only; all attribute access goes through the
/// owning graph. Handles are never invalidated (nodes are not deleted
/// during a publish session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Scene node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Hierarchy grouping node
    Transform,
    /// Polygon mesh shape
    Mesh,
    /// Binds shader slots to a set of meshes
    ShadingGroup,
    /// Surface shader
    SurfaceShader,
    /// Displacement shader
    DisplacementShader,
    /// File-based texture node
    FileTexture,
    /// Render-engine image texture node
    ImageTexture,
    /// Lightweight reference to an externally cached geometry file
    GeometryProxy,
    /// Operator merging several per-face override operators
    MergeOperator,
    /// Per-face override operator assigning parameters by selector
    SetParamOperator,
}

impl NodeKind {
    /// Check if this node type carries a texture file path
    pub fn is_texture(self) -> bool {
        matches!(self, NodeKind::FileTexture | NodeKind::ImageTexture)
    }

    /// Check if this node type is a shading-graph operator
    pub fn is_operator(self) -> bool {
        matches!(self, NodeKind::MergeOperator | NodeKind::SetParamOperator)
    }

    /// Check if this node type is a shader (including texture nodes)
    pub fn is_shader(self) -> bool {
        matches!(
            self,
            NodeKind::SurfaceShader | NodeKind::DisplacementShader
        ) || self.is_texture()
    }

    /// Check if this node type sits in the transform hierarchy
    pub fn is_dag(self) -> bool {
        matches!(
            self,
            NodeKind::Transform | NodeKind::Mesh | NodeKind::GeometryProxy
        )
    }
}

/// Typed attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// List of strings (color set names and the like)
    StringList(Vec<String>),
}

impl AttrValue {
    /// Read as boolean, if the value is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Read as integer, if the value is one
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Read as float; integers coerce
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttrValue::Float(f) => Some(*f),
            AttrValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Read as string slice, if the value is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read as string list, if the value is one
    pub fn as_string_list(&self) -> Option<&[String]> {
        match self {
            AttrValue::StringList(l) => Some(l),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        AttrValue::StringList(value)
    }
}

/// A node in the scene graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Node name, possibly namespace-qualified (`ns:body`)
    pub name: String,
    /// Node type
    pub kind: NodeKind,
    /// Parent in the transform hierarchy
    pub(crate) parent: Option<NodeId>,
    /// Children in the transform hierarchy
    pub(crate) children: Vec<NodeId>,
    /// Attribute store
    pub(crate) attrs: BTreeMap<String, AttrValue>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
            children: Vec::new(),
            attrs: BTreeMap::new(),
        }
    }

    /// Get an attribute value by name
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Iterate over all attributes in name order
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }
}
