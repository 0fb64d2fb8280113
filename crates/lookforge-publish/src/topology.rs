//! Shading topology resolution
//!
//! A mesh may be bound to any number of shading groups, and a shading
//! group binds several shader slots at once. The resolver flattens
//! that many-to-many topology into the per-mesh shader lists a
//! per-face override operator needs, filling displacement gaps with a
//! shared synthetic neutral shader so the override stays well-defined.

use smallvec::SmallVec;

use lookforge_scene::{NodeId, NodeKind, SceneGraph};

/// Render-engine-specific surface slot, preferred when connected
pub(crate) const AI_SURFACE_PLUG: &str = "ai_surface_shader";

/// Generic surface slot
pub(crate) const SURFACE_PLUG: &str = "surface_shader";

/// Displacement slot
pub(crate) const DISPLACEMENT_PLUG: &str = "displacement_shader";

/// Autobump attribute on displacement shaders
pub(crate) const AUTOBUMP_ATTR: &str = "ai_displacement_autobump";

/// Shader references per slot; one or two is the common case
pub type ShaderRefs = SmallVec<[NodeId; 2]>;

/// Effective shading assignment of one mesh
///
/// List order follows shading-group iteration order and is part of
/// the output: multiple surface shaders are concatenated, not merged.
/// Empty lists mean "no assignment for this slot".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShadingAssignment {
    /// Surface shaders, one per shading group that has one connected
    pub surface: ShaderRefs,
    /// Displacement shaders; synthetic entries fill the gaps when any
    /// group in the set has displacement
    pub displacement: ShaderRefs,
    /// Whether displacement autobump applies to this mesh
    pub autobump: bool,
}

impl ShadingAssignment {
    /// At least one surface shader resolved
    pub fn has_surface(&self) -> bool {
        !self.surface.is_empty()
    }

    /// At least one displacement shader resolved
    pub fn has_displacement(&self) -> bool {
        !self.displacement.is_empty()
    }
}

/// Shared state of one publish invocation
///
/// Carries the synthetic neutral displacement shader so every gap in
/// one run reuses a single instance. One context per publish; never
/// a process-wide singleton.
#[derive(Debug, Default)]
pub struct PublishContext {
    neutral_displacement: Option<NodeId>,
}

impl PublishContext {
    /// Create a fresh context for one publish run
    pub fn new() -> Self {
        Self::default()
    }

    /// The run's neutral displacement shader, created on first use
    ///
    /// Autobump is explicitly disabled on it; a neutral shader must
    /// not introduce bump detail.
    fn neutral_displacement(&mut self, graph: &mut SceneGraph) -> NodeId {
        if let Some(id) = self.neutral_displacement {
            return id;
        }
        let id = graph.create_node(NodeKind::DisplacementShader, "neutral_displacement");
        graph.set_attr(id, AUTOBUMP_ATTR, false);
        self.neutral_displacement = Some(id);
        id
    }

    /// The neutral shader, if this run needed one
    pub fn neutral_displacement_node(&self) -> Option<NodeId> {
        self.neutral_displacement
    }
}

/// Surface shader of a shading group, engine slot preferred
fn surface_input(graph: &SceneGraph, group: NodeId) -> Option<NodeId> {
    graph
        .input(group, AI_SURFACE_PLUG)
        .or_else(|| graph.input(group, SURFACE_PLUG))
}

/// Resolve the effective shading assignment of a mesh
///
/// Never fails: a mesh without shading groups, or groups without
/// connected slots, resolves to empty lists. Mutates the graph only
/// when a displacement gap forces the synthetic neutral shader into
/// a group's displacement slot.
pub fn resolve(graph: &mut SceneGraph, mesh: NodeId, ctx: &mut PublishContext) -> ShadingAssignment {
    let groups = graph.outputs_of_kind(mesh, NodeKind::ShadingGroup);
    let mut assignment = ShadingAssignment::default();

    if groups.is_empty() {
        return assignment;
    }

    if let [group] = groups[..] {
        if let Some(surface) = surface_input(graph, group) {
            assignment.surface.push(surface);
        }
        if let Some(displacement) = graph.input(group, DISPLACEMENT_PLUG) {
            assignment.autobump = graph.bool_attr(displacement, AUTOBUMP_ATTR, false);
            assignment.displacement.push(displacement);
        }
        return assignment;
    }

    // With several groups, one displacement connection anywhere in the
    // set forces a displacement entry for every group: a per-face
    // operator cannot selectively omit a slot.
    let contributors: Vec<NodeId> = groups
        .iter()
        .copied()
        .filter(|g| graph.has_input(*g, DISPLACEMENT_PLUG))
        .collect();
    let any_displacement = !contributors.is_empty();

    for group in &groups {
        if let Some(surface) = surface_input(graph, *group) {
            assignment.surface.push(surface);
        }
        if any_displacement {
            if let Some(displacement) = graph.input(*group, DISPLACEMENT_PLUG) {
                assignment.displacement.push(displacement);
            } else {
                let neutral = ctx.neutral_displacement(graph);
                graph.connect(neutral, "displacement", *group, DISPLACEMENT_PLUG);
                assignment.displacement.push(neutral);
            }
        }
    }

    // Autobump follows the first contributing group's shader only,
    // not a reconciliation across all of them. Kept for compatibility
    // with existing published looks; see DESIGN.md.
    if let Some(first) = contributors.first().and_then(|g| graph.input(*g, DISPLACEMENT_PLUG)) {
        assignment.autobump = graph.bool_attr(first, AUTOBUMP_ATTR, false);
    }

    assignment
}
