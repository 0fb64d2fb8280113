//! Lookforge Scene Graph
//!
//! An in-memory scene-graph abstraction standing in for a live host
//! (DCC) session: nodes with typed attributes, attribute-level
//! connections, a transform hierarchy, and the graph queries the
//! publish pipeline needs (shading-group lookups, history walks,
//! long names). Scenes can be built programmatically or loaded from
//! a JSON [`SceneDescription`].

pub mod description;
pub mod graph;
pub mod node;
pub mod path;

pub use description::{ConnectionDesc, NodeDesc, SceneDescription};
pub use graph::{Connection, SceneGraph};
pub use node::{AttrValue, Node, NodeId, NodeKind};
