//! Publish orchestration
//!
//! Runs one publish request end to end: color-set check, texture swap
//! pass, geometry cache export, override graph build, look export.
//! Synchronous and single-writer; a failure partway leaves the nodes
//! created so far in the scene (no rollback), so a retry can pick up
//! without rebuilding.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, warn};

use lookforge_core::{AssetContext, Error, Result};
use lookforge_scene::{NodeId, NodeKind, SceneGraph};

use crate::geometry::{self, CacheExporter};
use crate::look;
use crate::overrides;
use crate::serializer::GraphSerializer;
use crate::texture::{self, SwapRecord, DEFAULT_RENDER_COLOR_SPACE};
use crate::topology::PublishContext;

/// Color set attribute on meshes
const COLOR_SETS_ATTR: &str = "color_sets";

/// Expected color set name on publishable geometry
pub const DEFAULT_COLOR_SET: &str = "Pref";

/// Options for one publish invocation
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Export the geometry cache (UVs)
    pub publish_uv: bool,
    /// Build and export the look graph
    pub publish_look: bool,
    /// Look name; empty selects the default look
    pub look_name: String,
    /// Render color space for optimized texture names
    pub render_color_space: String,
    /// Color set name the check accepts without asking
    pub color_set_name: String,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            publish_uv: true,
            publish_look: true,
            look_name: String::new(),
            render_color_space: DEFAULT_RENDER_COLOR_SPACE.to_string(),
            color_set_name: DEFAULT_COLOR_SET.to_string(),
        }
    }
}

/// Collaborator answering interactive confirmations
pub trait ConfirmPrompt {
    /// Show `message` and return whether to continue
    fn confirm(&self, message: &str) -> bool;
}

/// Prompt that accepts everything (headless runs)
#[derive(Debug, Default)]
pub struct AcceptAll;

impl ConfirmPrompt for AcceptAll {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

/// What one publish run produced
#[derive(Debug, Default, Serialize)]
pub struct PublishReport {
    /// Texture nodes rewritten to optimized files
    pub swapped_textures: Vec<SwapRecord>,
    /// Written geometry cache, when UV publish ran
    pub cache_path: Option<PathBuf>,
    /// Written look graph, when look publish ran
    pub look_path: Option<PathBuf>,
}

/// Texture nodes reachable from the selection's shading history
///
/// Descendant meshes, their shading groups, then the upstream file and
/// image texture nodes, order-preserving de-dup. Empty at any level
/// means an empty result (the swap step is skipped), never an error.
pub fn texture_nodes(graph: &SceneGraph, selection: &[NodeId]) -> Vec<NodeId> {
    let meshes = graph.descendants_of_kind(selection, NodeKind::Mesh);
    if meshes.is_empty() {
        return Vec::new();
    }

    let mut groups: Vec<NodeId> = Vec::new();
    for mesh in &meshes {
        for group in graph.outputs_of_kind(*mesh, NodeKind::ShadingGroup) {
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
    }
    if groups.is_empty() {
        return Vec::new();
    }

    let mut textures = graph.upstream_of_kind(&groups, NodeKind::FileTexture);
    for node in graph.upstream_of_kind(&groups, NodeKind::ImageTexture) {
        if !textures.contains(&node) {
            textures.push(node);
        }
    }
    textures
}

/// Check color sets on the selection, asking about unexpected names
///
/// A declined confirmation aborts the publish before anything is
/// written or created. Objects without color set data simply pass;
/// per-object introspection problems must not block the rest of the
/// selection.
fn check_color_sets(
    graph: &SceneGraph,
    selection: &[NodeId],
    expected: &str,
    prompt: &dyn ConfirmPrompt,
) -> Result<()> {
    for mesh in graph.descendants_of_kind(selection, NodeKind::Mesh) {
        for set_name in graph.string_list_attr(mesh, COLOR_SETS_ATTR) {
            if set_name == expected {
                continue;
            }
            let message = format!(
                "Shape '{}' has a color set named '{}' which is different from '{}'. Continue?",
                graph.name(mesh),
                set_name,
                expected
            );
            if !prompt.confirm(&message) {
                warn!(mesh = graph.name(mesh), set = %set_name, "publish aborted by user");
                return Err(Error::Cancelled);
            }
            debug!(mesh = graph.name(mesh), set = %set_name, "color set accepted");
        }
    }
    Ok(())
}

/// The publish pipeline
///
/// Owns the two external collaborators and the options of the run.
pub struct Publisher<E, S> {
    exporter: E,
    serializer: S,
    options: PublishOptions,
}

impl<E: CacheExporter, S: GraphSerializer> Publisher<E, S> {
    /// Create a publisher with the given collaborators and options
    pub fn new(exporter: E, serializer: S, options: PublishOptions) -> Self {
        Self {
            exporter,
            serializer,
            options,
        }
    }

    /// The options of this publisher
    pub fn options(&self) -> &PublishOptions {
        &self.options
    }

    /// Run one publish over `selection`
    ///
    /// An empty selection blocks the publish. The color-set check runs
    /// first so a user abort happens before any mutation; the texture
    /// swap pass then rewrites matching texture nodes in place, and
    /// the gated geometry/look steps follow.
    pub fn publish(
        &self,
        graph: &mut SceneGraph,
        asset: &AssetContext,
        selection: &[NodeId],
        prompt: &dyn ConfirmPrompt,
    ) -> Result<PublishReport> {
        if selection.is_empty() {
            return Err(Error::NothingSelected);
        }

        check_color_sets(graph, selection, &self.options.color_set_name, prompt)?;

        let textures = texture_nodes(graph, selection);
        let swapped = texture::swap_textures(graph, &textures, &self.options.render_color_space);

        let mut report = PublishReport {
            swapped_textures: swapped,
            ..Default::default()
        };

        if !self.options.publish_uv && !self.options.publish_look {
            return Ok(report);
        }

        let proxy = if self.options.publish_uv {
            let (proxy, path) =
                geometry::export_geometry_cache(graph, &self.exporter, selection, asset)?;
            report.cache_path = Some(path);
            proxy
        } else {
            geometry::create_temp_proxy(graph)
        };

        if self.options.publish_look {
            let mut ctx = PublishContext::new();
            let built = overrides::build_override_graph(graph, proxy, selection, &mut ctx);
            let path = look::export_look(
                graph,
                &self.serializer,
                proxy,
                &built.shaders,
                asset,
                &self.options.look_name,
            )?;
            report.look_path = Some(path);
        }

        Ok(report)
    }
}
