//! Look graph serialization
//!
//! Writes a set of scene-graph nodes to the text-based look format:
//! one block per node, attribute lines, and input references by node
//! name. A node-class mask decides which nodes of the export set make
//! it into the file; light and shadow linking metadata is suppressed
//! by default since a look publish does not own lighting state.

use std::collections::HashSet;
use std::io::{BufWriter, Write};
use std::path::Path;

use lookforge_scene::{AttrValue, NodeId, NodeKind, SceneGraph};

/// Node-class mask bits
pub mod node_class {
    /// Shaders and texture nodes
    pub const SHADER: u32 = 1 << 4;
    /// Color manager nodes
    pub const COLOR_MANAGER: u32 = 1 << 11;
    /// Graph operators
    pub const OPERATOR: u32 = 1 << 12;
    /// Everything a look export carries
    pub const SHADING_MASK: u32 = SHADER | COLOR_MANAGER | OPERATOR;
}

/// Serialization errors
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Nothing to serialize: the masked export set is empty")]
    EmptyExportSet,
}

pub type SerializeResult<T> = Result<T, SerializeError>;

/// Options for graph serialization
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Write the text form of the format
    pub ascii: bool,
    /// Node-class mask; nodes outside it are dropped from the file
    pub mask: u32,
    /// Keep light linking metadata
    pub light_links: bool,
    /// Keep shadow linking metadata
    pub shadow_links: bool,
    /// Reference nodes by full hierarchy path instead of short name
    pub full_paths: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            ascii: true,
            mask: node_class::SHADING_MASK,
            light_links: false,
            shadow_links: false,
            full_paths: false,
        }
    }
}

/// Graph serializer collaborator
pub trait GraphSerializer {
    /// Write `nodes` of `graph` to `dest`
    fn serialize(
        &self,
        graph: &SceneGraph,
        nodes: &[NodeId],
        dest: &Path,
        options: &SerializeOptions,
    ) -> SerializeResult<()>;
}

/// Node class of a kind, `None` when never serialized (shapes, groups)
fn node_class_of(kind: NodeKind) -> Option<u32> {
    if kind.is_shader() {
        Some(node_class::SHADER)
    } else if kind.is_operator() {
        Some(node_class::OPERATOR)
    } else {
        None
    }
}

/// Block keyword for a node kind
fn kind_token(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Transform => "transform",
        NodeKind::Mesh => "polymesh",
        NodeKind::ShadingGroup => "shading_group",
        NodeKind::SurfaceShader => "surface_shader",
        NodeKind::DisplacementShader => "displacement_shader",
        NodeKind::FileTexture => "file_texture",
        NodeKind::ImageTexture => "image_texture",
        NodeKind::GeometryProxy => "procedural",
        NodeKind::MergeOperator => "merge",
        NodeKind::SetParamOperator => "set_parameter",
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn render_value(value: &AttrValue) -> String {
    match value {
        AttrValue::Bool(b) => b.to_string(),
        AttrValue::Int(i) => i.to_string(),
        AttrValue::Float(f) => f.to_string(),
        AttrValue::String(s) => quote(s),
        AttrValue::StringList(l) => l.iter().map(|s| quote(s)).collect::<Vec<_>>().join(" "),
    }
}

/// Text writer for the look graph format
#[derive(Debug, Default)]
pub struct LookGraphWriter;

impl LookGraphWriter {
    /// Create a writer
    pub fn new() -> Self {
        Self
    }

    fn node_reference(graph: &SceneGraph, id: NodeId, options: &SerializeOptions) -> String {
        if options.full_paths && graph.kind(id).is_dag() {
            graph.long_name(id)
        } else {
            graph.name(id).to_string()
        }
    }
}

impl GraphSerializer for LookGraphWriter {
    fn serialize(
        &self,
        graph: &SceneGraph,
        nodes: &[NodeId],
        dest: &Path,
        options: &SerializeOptions,
    ) -> SerializeResult<()> {
        // Mask filter, each node once, export-set order preserved
        let mut seen = HashSet::new();
        let export: Vec<NodeId> = nodes
            .iter()
            .copied()
            .filter(|id| {
                node_class_of(graph.kind(*id)).is_some_and(|class| class & options.mask != 0)
            })
            .filter(|id| seen.insert(*id))
            .collect();

        if export.is_empty() {
            return Err(SerializeError::EmptyExportSet);
        }

        let exported: HashSet<NodeId> = export.iter().copied().collect();
        let file = std::fs::File::create(dest)?;
        let mut out = BufWriter::new(file);

        for id in export {
            let node = graph.node(id);
            writeln!(out, "{}", kind_token(node.kind))?;
            writeln!(out, "{{")?;
            writeln!(out, " name {}", Self::node_reference(graph, id, options))?;

            for (attr, value) in node.attrs() {
                if !options.light_links && attr.starts_with("light_link") {
                    continue;
                }
                if !options.shadow_links && attr.starts_with("shadow_link") {
                    continue;
                }
                writeln!(out, " {} {}", attr, render_value(value))?;
            }

            // Incoming connections from other exported nodes become
            // name references on the destination plug
            for conn in graph.connections() {
                if conn.dst == id && exported.contains(&conn.src) {
                    writeln!(
                        out,
                        " {} {}",
                        conn.dst_attr,
                        Self::node_reference(graph, conn.src, options)
                    )?;
                }
            }

            writeln!(out, "}}")?;
            writeln!(out)?;
        }

        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_graph() -> (SceneGraph, Vec<NodeId>) {
        let mut graph = SceneGraph::new();
        let shader = graph.create_node(NodeKind::SurfaceShader, "shaderA");
        let merge = graph.create_node(NodeKind::MergeOperator, "merge_charA");
        let op = graph.create_node(NodeKind::SetParamOperator, "set_shader_bodyShape");
        graph.set_attr(op, "selection", "/geo/bodyShape");
        graph.set_attr(op, "assignment[0]", "shader='shaderA'");
        graph.connect(op, "out", merge, "inputs[0]");
        (graph, vec![merge, op, shader])
    }

    #[test]
    fn test_writes_masked_nodes_with_connections() {
        let (graph, nodes) = make_graph();
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("charA_operator.v001.ass");

        LookGraphWriter::new()
            .serialize(&graph, &nodes, &dest, &SerializeOptions::default())
            .unwrap();

        let text = std::fs::read_to_string(&dest).unwrap();
        assert!(text.contains("merge\n{\n name merge_charA"));
        assert!(text.contains("set_parameter"));
        assert!(text.contains(" selection \"/geo/bodyShape\""));
        assert!(text.contains(" assignment[0] \"shader='shaderA'\""));
        // The merge block references its input operator by name
        assert!(text.contains(" inputs[0] set_shader_bodyShape"));
        assert!(text.contains("surface_shader\n{\n name shaderA"));
    }

    #[test]
    fn test_mask_drops_out_of_class_nodes() {
        let (mut graph, mut nodes) = make_graph();
        let mesh = graph.create_node(NodeKind::Mesh, "bodyShape");
        nodes.push(mesh);
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("out.ass");

        let options = SerializeOptions {
            mask: node_class::OPERATOR,
            ..Default::default()
        };
        LookGraphWriter::new()
            .serialize(&graph, &nodes, &dest, &options)
            .unwrap();

        let text = std::fs::read_to_string(&dest).unwrap();
        assert!(!text.contains("polymesh"));
        assert!(!text.contains("surface_shader"));
        assert!(text.contains("merge"));
    }

    #[test]
    fn test_link_metadata_suppressed_by_default() {
        let (mut graph, nodes) = make_graph();
        let merge = nodes[0];
        graph.set_attr(merge, "light_linking", "on");
        graph.set_attr(merge, "shadow_linking", "on");
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("out.ass");

        LookGraphWriter::new()
            .serialize(&graph, &nodes, &dest, &SerializeOptions::default())
            .unwrap();
        let text = std::fs::read_to_string(&dest).unwrap();
        assert!(!text.contains("light_linking"));
        assert!(!text.contains("shadow_linking"));
    }

    #[test]
    fn test_empty_export_set_is_an_error() {
        let mut graph = SceneGraph::new();
        let mesh = graph.create_node(NodeKind::Mesh, "bodyShape");
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("out.ass");

        let result = LookGraphWriter::new().serialize(
            &graph,
            &[mesh],
            &dest,
            &SerializeOptions::default(),
        );
        assert!(matches!(result, Err(SerializeError::EmptyExportSet)));
    }
}
