//! The scene graph container
//!
//! Owns all nodes and the attribute-level connections between them.
//! Node handles ([`NodeId`]) stay valid for the lifetime of the graph;
//! the publish pipeline mutates the graph in place, single-writer.

use std::collections::HashSet;

use crate::node::{AttrValue, Node, NodeId, NodeKind};

/// A directed attribute-level connection (`src.src_attr -> dst.dst_attr`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Source node
    pub src: NodeId,
    /// Source attribute name
    pub src_attr: String,
    /// Destination node
    pub dst: NodeId,
    /// Destination attribute name (may be indexed, e.g. `inputs[2]`)
    pub dst_attr: String,
}

/// In-memory scene graph
#[derive(Debug, Default, Clone)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
}

impl SceneGraph {
    /// Create an empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ==================== Node lifecycle ====================

    /// Create an unparented node
    pub fn create_node(&mut self, kind: NodeKind, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind, name));
        id
    }

    /// Create a node parented under `parent`
    pub fn create_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        name: impl Into<String>,
    ) -> NodeId {
        let id = self.create_node(kind, name);
        self.set_parent(id, parent);
        id
    }

    /// Move a node under a new parent
    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        if let Some(old) = self.nodes[child.index()].parent {
            self.nodes[old.index()].children.retain(|c| *c != child);
        }
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Rename a node
    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) {
        self.nodes[id.index()].name = name.into();
    }

    // ==================== Node access ====================

    /// Borrow a node by handle
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Node name
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.index()].name
    }

    /// Node kind
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.index()].kind
    }

    /// Find the first node with the given exact name
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .map(|i| NodeId(i as u32))
    }

    /// Iterate over all node handles in creation order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    // ==================== Hierarchy ====================

    /// Parent of a node, if any
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Direct children of a node
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// All descendants of a node, depth-first, excluding the node itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        while let Some(next) = stack.pop() {
            out.push(next);
            for child in self.children(next).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Descendants of the given roots filtered by kind
    ///
    /// Discovery order, each node reported once even when roots overlap.
    pub fn descendants_of_kind(&self, roots: &[NodeId], kind: NodeKind) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for root in roots {
            for id in self.descendants(*root) {
                if self.kind(id) == kind && seen.insert(id) {
                    out.push(id);
                }
            }
        }
        out
    }

    /// Full `|`-separated path of a node from its hierarchy root
    pub fn long_name(&self, id: NodeId) -> String {
        let mut components = vec![self.name(id).to_string()];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            components.push(self.name(parent).to_string());
            current = parent;
        }
        components.reverse();
        format!("|{}", components.join("|"))
    }

    // ==================== Attributes ====================

    /// Set an attribute value
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<AttrValue>) {
        self.nodes[id.index()]
            .attrs
            .insert(name.to_string(), value.into());
    }

    /// Get an attribute value
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&AttrValue> {
        self.nodes[id.index()].attrs.get(name)
    }

    /// Boolean attribute with a default for absent values
    pub fn bool_attr(&self, id: NodeId, name: &str, default: bool) -> bool {
        self.attr(id, name).and_then(AttrValue::as_bool).unwrap_or(default)
    }

    /// Integer attribute with a default for absent values
    pub fn int_attr(&self, id: NodeId, name: &str, default: i64) -> i64 {
        self.attr(id, name).and_then(AttrValue::as_int).unwrap_or(default)
    }

    /// Float attribute with a default for absent values
    pub fn float_attr(&self, id: NodeId, name: &str, default: f64) -> f64 {
        self.attr(id, name).and_then(AttrValue::as_float).unwrap_or(default)
    }

    /// String attribute; absent values read as empty
    pub fn string_attr(&self, id: NodeId, name: &str) -> String {
        self.attr(id, name)
            .and_then(AttrValue::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// String list attribute; absent values read as empty
    pub fn string_list_attr(&self, id: NodeId, name: &str) -> Vec<String> {
        self.attr(id, name)
            .and_then(AttrValue::as_string_list)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    // ==================== Connections ====================

    /// Connect `src.src_attr` into `dst.dst_attr`
    ///
    /// An existing connection into the same destination plug is
    /// replaced (force semantics).
    pub fn connect(&mut self, src: NodeId, src_attr: &str, dst: NodeId, dst_attr: &str) {
        self.connections
            .retain(|c| !(c.dst == dst && c.dst_attr == dst_attr));
        self.connections.push(Connection {
            src,
            src_attr: src_attr.to_string(),
            dst,
            dst_attr: dst_attr.to_string(),
        });
    }

    /// All connections in insertion order
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Source node connected into `dst.dst_attr`, if any
    pub fn input(&self, dst: NodeId, dst_attr: &str) -> Option<NodeId> {
        self.connections
            .iter()
            .find(|c| c.dst == dst && c.dst_attr == dst_attr)
            .map(|c| c.src)
    }

    /// Check if a destination plug has an incoming connection
    pub fn has_input(&self, dst: NodeId, dst_attr: &str) -> bool {
        self.input(dst, dst_attr).is_some()
    }

    /// Sources connected into the indexed plugs `base[0]`, `base[1]`, ...
    ///
    /// Ordered by plug index, not insertion order.
    pub fn indexed_inputs(&self, dst: NodeId, base: &str) -> Vec<NodeId> {
        let prefix = format!("{base}[");
        let mut plugs: Vec<(usize, NodeId)> = self
            .connections
            .iter()
            .filter(|c| c.dst == dst && c.dst_attr.starts_with(&prefix))
            .filter_map(|c| {
                let idx: usize = c
                    .dst_attr
                    .strip_prefix(&prefix)?
                    .strip_suffix(']')?
                    .parse()
                    .ok()?;
                Some((idx, c.src))
            })
            .collect();
        plugs.sort_by_key(|(idx, _)| *idx);
        plugs.into_iter().map(|(_, src)| src).collect()
    }

    /// Destination nodes of a given kind connected from `src`
    ///
    /// Order-preserving unique: the first connection to each
    /// destination decides its position.
    pub fn outputs_of_kind(&self, src: NodeId, kind: NodeKind) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        self.connections
            .iter()
            .filter(|c| c.src == src && self.kind(c.dst) == kind)
            .filter(|c| seen.insert(c.dst))
            .map(|c| c.dst)
            .collect()
    }

    /// Transitive upstream closure of the given seed nodes
    ///
    /// Breadth-first over incoming connections, seeds included,
    /// discovery order, each node once.
    pub fn upstream_closure(&self, seeds: &[NodeId]) -> Vec<NodeId> {
        let mut seen: HashSet<NodeId> = seeds.iter().copied().collect();
        let mut out: Vec<NodeId> = seeds.to_vec();
        let mut cursor = 0;
        while cursor < out.len() {
            let current = out[cursor];
            cursor += 1;
            for conn in &self.connections {
                if conn.dst == current && seen.insert(conn.src) {
                    out.push(conn.src);
                }
            }
        }
        out
    }

    /// Upstream closure filtered by kind
    pub fn upstream_of_kind(&self, seeds: &[NodeId], kind: NodeKind) -> Vec<NodeId> {
        self.upstream_closure(seeds)
            .into_iter()
            .filter(|id| self.kind(*id) == kind)
            .collect()
    }
}
