//! Per-mesh override graph construction
//!
//! Builds the operator graph that reproduces the scene's shader,
//! displacement, subdivision and visibility assignment on top of an
//! exported geometry proxy: one set-parameter operator per mesh, all
//! merged into a single root attached to the proxy.

use std::collections::HashSet;

use lookforge_scene::{path, NodeId, NodeKind, SceneGraph};

use crate::topology::{self, PublishContext};

/// Fixed assignment slot indices
///
/// Downstream consumers key off position; new assignment kinds must
/// take a free index, never reorder existing ones.
pub mod slots {
    /// Surface shader assignment
    pub const SHADER: usize = 0;
    /// Displacement shader assignment
    pub const DISP_MAP: usize = 1;
    /// Displacement autobump toggle
    pub const DISP_AUTOBUMP: usize = 2;
    /// Subdivision type
    pub const SUBDIV_TYPE: usize = 3;
    /// Subdivision iteration count
    pub const SUBDIV_ITERATIONS: usize = 4;
    /// Sub-surface scattering set name
    pub const SSS_SETNAME: usize = 5;
    /// Visibility mask
    pub const VISIBILITY: usize = 6;
    /// Displacement height
    pub const DISP_HEIGHT: usize = 7;
}

/// Visibility mask with the shadow-casting bit cleared
pub const VISIBILITY_NO_SHADOW: u32 = 253;

/// Displacement height that needs no override
const DEFAULT_DISP_HEIGHT: f64 = 1.0;

const SSS_SETNAME_ATTR: &str = "ai_sss_setname";
const DISP_HEIGHT_ATTR: &str = "ai_disp_height";
const CASTS_SHADOWS_ATTR: &str = "casts_shadows";
const SUBDIV_TYPE_ATTR: &str = "ai_subdiv_type";
const SUBDIV_ITERATIONS_ATTR: &str = "ai_subdiv_iterations";

/// Result of building the override graph
#[derive(Debug, Clone)]
pub struct BuiltOverrides {
    /// Merge root, connected to the proxy's first operator slot
    pub merge: NodeId,
    /// Every shader the override graph references, in first-use order
    pub shaders: Vec<NodeId>,
}

/// Attribute key of an assignment slot
fn assignment_attr(slot: usize) -> String {
    format!("assignment[{slot}]")
}

/// Integral values keep one decimal (`2.0`, not `2`) so override
/// lines match previously published looks
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Space-joined single-quoted node names
fn quoted_refs(graph: &SceneGraph, refs: &[NodeId]) -> String {
    refs.iter()
        .map(|id| format!("'{}'", graph.name(*id)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_unique(list: &mut Vec<NodeId>, seen: &mut HashSet<NodeId>, id: NodeId) {
    if seen.insert(id) {
        list.push(id);
    }
}

/// Build the per-face override graph onto `proxy`
///
/// Walks every mesh under the selection roots (history duplicates
/// excluded up front), resolves its shading assignment, and wires one
/// override operator per mesh into a fresh merge root at sequential
/// input indices. Returns the merge root and the de-duplicated set of
/// shaders the graph references, synthetic fills included.
pub fn build_override_graph(
    graph: &mut SceneGraph,
    proxy: NodeId,
    selection: &[NodeId],
    ctx: &mut PublishContext,
) -> BuiltOverrides {
    let owner = graph.parent(proxy).unwrap_or(proxy);
    let merge = graph.create_node(NodeKind::MergeOperator, format!("merge_{}", graph.name(owner)));
    graph.set_attr(merge, "is_target", true);
    graph.connect(merge, "out", proxy, "operators[0]");

    // Filter before iterating; the walk order decides input indices
    let meshes: Vec<NodeId> = graph
        .descendants_of_kind(selection, NodeKind::Mesh)
        .into_iter()
        .filter(|m| !path::is_orig_shape(graph.name(*m)))
        .collect();

    let mut shaders = Vec::new();
    let mut seen = HashSet::new();

    for (counter, mesh) in meshes.into_iter().enumerate() {
        let selector = path::selector_from_long_name(&graph.long_name(mesh));
        let op = graph.create_node(
            NodeKind::SetParamOperator,
            format!("set_shader_{}", graph.name(mesh)),
        );
        graph.set_attr(op, "selection", selector);
        graph.connect(op, "out", merge, &format!("inputs[{counter}]"));

        let assignment = topology::resolve(graph, mesh, ctx);

        if assignment.has_surface() {
            let refs = quoted_refs(graph, &assignment.surface);
            graph.set_attr(op, &assignment_attr(slots::SHADER), format!("shader={refs}"));
            for shader in &assignment.surface {
                push_unique(&mut shaders, &mut seen, *shader);
            }
        }

        if assignment.has_displacement() {
            let refs = quoted_refs(graph, &assignment.displacement);
            graph.set_attr(op, &assignment_attr(slots::DISP_MAP), format!("disp_map={refs}"));
            for shader in &assignment.displacement {
                push_unique(&mut shaders, &mut seen, *shader);
            }
            if assignment.autobump {
                graph.set_attr(
                    op,
                    &assignment_attr(slots::DISP_AUTOBUMP),
                    "bool disp_autobump=True",
                );
            }
        }

        let subdiv_type = graph.int_attr(mesh, SUBDIV_TYPE_ATTR, 0);
        let iterations = graph.int_attr(mesh, SUBDIV_ITERATIONS_ATTR, 0);
        if subdiv_type > 0 && iterations > 0 {
            graph.set_attr(op, &assignment_attr(slots::SUBDIV_TYPE), "subdiv_type='catclark'");
            graph.set_attr(
                op,
                &assignment_attr(slots::SUBDIV_ITERATIONS),
                format!("subdiv_iterations={iterations}"),
            );
        }

        let sss_set = graph.string_attr(mesh, SSS_SETNAME_ATTR);
        if !sss_set.is_empty() {
            graph.set_attr(
                op,
                &assignment_attr(slots::SSS_SETNAME),
                format!("string ai_sss_setname=\"{sss_set}\""),
            );
        }

        if !graph.bool_attr(mesh, CASTS_SHADOWS_ATTR, true) {
            graph.set_attr(
                op,
                &assignment_attr(slots::VISIBILITY),
                format!("visibility={VISIBILITY_NO_SHADOW}"),
            );
        }

        let height = graph.float_attr(mesh, DISP_HEIGHT_ATTR, DEFAULT_DISP_HEIGHT);
        if (height - DEFAULT_DISP_HEIGHT).abs() > f64::EPSILON {
            graph.set_attr(
                op,
                &assignment_attr(slots::DISP_HEIGHT),
                format!("disp_height={}", format_float(height)),
            );
        }
    }

    BuiltOverrides { merge, shaders }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{AUTOBUMP_ATTR, DISPLACEMENT_PLUG, SURFACE_PLUG};

    struct Fixture {
        graph: SceneGraph,
        root: NodeId,
        proxy: NodeId,
    }

    fn make_scene() -> Fixture {
        let mut graph = SceneGraph::new();
        let root = graph.create_node(NodeKind::Transform, "geo");
        let standin = graph.create_node(NodeKind::Transform, "charA_mod");
        let proxy = graph.create_child(standin, NodeKind::GeometryProxy, "charA_modShape");
        Fixture { graph, root, proxy }
    }

    fn add_shaded_mesh(fx: &mut Fixture, mesh_name: &str, shader_name: &str) -> NodeId {
        let mesh = fx.graph.create_child(fx.root, NodeKind::Mesh, mesh_name);
        let group = fx
            .graph
            .create_node(NodeKind::ShadingGroup, format!("SG_{mesh_name}"));
        let shader = fx.graph.create_node(NodeKind::SurfaceShader, shader_name);
        fx.graph.connect(mesh, "out_mesh", group, "members[0]");
        fx.graph.connect(shader, "out", group, SURFACE_PLUG);
        mesh
    }

    fn op_attr(fx: &Fixture, op: NodeId, slot: usize) -> Option<String> {
        fx.graph
            .attr(op, &assignment_attr(slot))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    fn override_ops(fx: &Fixture, merge: NodeId) -> Vec<NodeId> {
        fx.graph.indexed_inputs(merge, "inputs")
    }

    #[test]
    fn test_merge_attached_to_proxy() {
        let mut fx = make_scene();
        add_shaded_mesh(&mut fx, "bodyShape", "shaderA");

        let mut ctx = PublishContext::new();
        let built = build_override_graph(&mut fx.graph, fx.proxy, &[fx.root], &mut ctx);

        assert_eq!(fx.graph.input(fx.proxy, "operators[0]"), Some(built.merge));
        assert_eq!(fx.graph.name(built.merge), "merge_charA_mod");
        assert!(fx.graph.bool_attr(built.merge, "is_target", false));
    }

    #[test]
    fn test_sequential_inputs_without_gaps() {
        let mut fx = make_scene();
        add_shaded_mesh(&mut fx, "bodyShape", "shaderA");
        add_shaded_mesh(&mut fx, "headShape", "shaderB");
        add_shaded_mesh(&mut fx, "handShape", "shaderC");

        let mut ctx = PublishContext::new();
        let built = build_override_graph(&mut fx.graph, fx.proxy, &[fx.root], &mut ctx);

        let ops = override_ops(&fx, built.merge);
        assert_eq!(ops.len(), 3);
        for (i, op) in ops.iter().enumerate() {
            assert_eq!(fx.graph.input(built.merge, &format!("inputs[{i}]")), Some(*op));
        }
    }

    #[test]
    fn test_orig_shapes_filtered_out() {
        let mut fx = make_scene();
        add_shaded_mesh(&mut fx, "bodyShape", "shaderA");
        fx.graph.create_child(fx.root, NodeKind::Mesh, "bodyShapeOrig");

        let mut ctx = PublishContext::new();
        let built = build_override_graph(&mut fx.graph, fx.proxy, &[fx.root], &mut ctx);
        assert_eq!(override_ops(&fx, built.merge).len(), 1);
    }

    #[test]
    fn test_selector_is_namespace_stripped() {
        let mut fx = make_scene();
        let grp = fx.graph.create_child(fx.root, NodeKind::Transform, "charA:arms");
        let mesh = fx.graph.create_child(grp, NodeKind::Mesh, "charA:armShape");
        let group = fx.graph.create_node(NodeKind::ShadingGroup, "SG_arm");
        let shader = fx.graph.create_node(NodeKind::SurfaceShader, "shaderArm");
        fx.graph.connect(mesh, "out_mesh", group, "members[0]");
        fx.graph.connect(shader, "out", group, SURFACE_PLUG);

        let mut ctx = PublishContext::new();
        let built = build_override_graph(&mut fx.graph, fx.proxy, &[fx.root], &mut ctx);
        let op = override_ops(&fx, built.merge)[0];
        assert_eq!(
            fx.graph.attr(op, "selection").and_then(|v| v.as_str()),
            Some("/geo/arms/armShape")
        );
    }

    #[test]
    fn test_assignment_lines_and_slot_stability() {
        let mut fx = make_scene();
        let mesh = add_shaded_mesh(&mut fx, "bodyShape", "shaderA");
        // Only visibility and height deviate; their lines must still
        // land on their fixed slots
        fx.graph.set_attr(mesh, CASTS_SHADOWS_ATTR, false);
        fx.graph.set_attr(mesh, DISP_HEIGHT_ATTR, 0.5);

        let mut ctx = PublishContext::new();
        let built = build_override_graph(&mut fx.graph, fx.proxy, &[fx.root], &mut ctx);
        let op = override_ops(&fx, built.merge)[0];

        assert_eq!(op_attr(&fx, op, slots::SHADER).as_deref(), Some("shader='shaderA'"));
        assert_eq!(op_attr(&fx, op, slots::DISP_MAP), None);
        assert_eq!(op_attr(&fx, op, slots::SUBDIV_TYPE), None);
        assert_eq!(op_attr(&fx, op, slots::VISIBILITY).as_deref(), Some("visibility=253"));
        assert_eq!(op_attr(&fx, op, slots::DISP_HEIGHT).as_deref(), Some("disp_height=0.5"));
    }

    #[test]
    fn test_subdiv_requires_type_and_iterations() {
        let mut fx = make_scene();
        let mesh = add_shaded_mesh(&mut fx, "bodyShape", "shaderA");
        fx.graph.set_attr(mesh, SUBDIV_TYPE_ATTR, 1i64);
        // iterations left at 0: no subdivision lines at all

        let mut ctx = PublishContext::new();
        let built = build_override_graph(&mut fx.graph, fx.proxy, &[fx.root], &mut ctx);
        let op = override_ops(&fx, built.merge)[0];
        assert_eq!(op_attr(&fx, op, slots::SUBDIV_TYPE), None);
        assert_eq!(op_attr(&fx, op, slots::SUBDIV_ITERATIONS), None);

        fx.graph.set_attr(mesh, SUBDIV_ITERATIONS_ATTR, 2i64);
        let mut ctx = PublishContext::new();
        let built = build_override_graph(&mut fx.graph, fx.proxy, &[fx.root], &mut ctx);
        let op = override_ops(&fx, built.merge)[0];
        assert_eq!(
            op_attr(&fx, op, slots::SUBDIV_TYPE).as_deref(),
            Some("subdiv_type='catclark'")
        );
        assert_eq!(
            op_attr(&fx, op, slots::SUBDIV_ITERATIONS).as_deref(),
            Some("subdiv_iterations=2")
        );
    }

    #[test]
    fn test_multi_group_concatenation_and_synthetic() {
        let mut fx = make_scene();
        let mesh = fx.graph.create_child(fx.root, NodeKind::Mesh, "bodyShape");
        let sg_a = fx.graph.create_node(NodeKind::ShadingGroup, "SG_A");
        let sg_b = fx.graph.create_node(NodeKind::ShadingGroup, "SG_B");
        fx.graph.connect(mesh, "out_mesh", sg_a, "members[0]");
        fx.graph.connect(mesh, "out_mesh", sg_b, "members[0]");
        let shader_a = fx.graph.create_node(NodeKind::SurfaceShader, "shaderA");
        let shader_b = fx.graph.create_node(NodeKind::SurfaceShader, "shaderB");
        fx.graph.connect(shader_a, "out", sg_a, SURFACE_PLUG);
        fx.graph.connect(shader_b, "out", sg_b, SURFACE_PLUG);
        let disp_b = fx.graph.create_node(NodeKind::DisplacementShader, "dispB");
        fx.graph.set_attr(disp_b, AUTOBUMP_ATTR, true);
        fx.graph.connect(disp_b, "displacement", sg_b, DISPLACEMENT_PLUG);

        let mut ctx = PublishContext::new();
        let built = build_override_graph(&mut fx.graph, fx.proxy, &[fx.root], &mut ctx);
        let op = override_ops(&fx, built.merge)[0];

        assert_eq!(
            op_attr(&fx, op, slots::SHADER).as_deref(),
            Some("shader='shaderA' 'shaderB'")
        );
        assert_eq!(
            op_attr(&fx, op, slots::DISP_MAP).as_deref(),
            Some("disp_map='neutral_displacement' 'dispB'")
        );
        assert_eq!(
            op_attr(&fx, op, slots::DISP_AUTOBUMP).as_deref(),
            Some("bool disp_autobump=True")
        );

        // Referenced shaders include the synthetic fill, each once
        let neutral = ctx.neutral_displacement_node().unwrap();
        assert_eq!(built.shaders, vec![shader_a, shader_b, neutral, disp_b]);
    }

    #[test]
    fn test_unshaded_mesh_gets_no_shader_line() {
        let mut fx = make_scene();
        fx.graph.create_child(fx.root, NodeKind::Mesh, "bareShape");

        let mut ctx = PublishContext::new();
        let built = build_override_graph(&mut fx.graph, fx.proxy, &[fx.root], &mut ctx);
        let op = override_ops(&fx, built.merge)[0];
        assert_eq!(op_attr(&fx, op, slots::SHADER), None);
        assert!(built.shaders.is_empty());
    }
}
