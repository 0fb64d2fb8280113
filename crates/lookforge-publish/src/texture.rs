//! Texture path resolution and swapping
//!
//! Shading networks reference source textures; render-ready scenes
//! want the pre-baked optimized `.tx` siblings instead. The swap pass
//! rewrites texture node paths in place when an optimized file exists
//! on disk and leaves them untouched otherwise.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use lookforge_scene::{NodeId, NodeKind, SceneGraph};

/// Extension of pre-baked optimized textures
pub const OPTIMIZED_EXT: &str = "tx";

/// Render color space baked into current-scheme optimized filenames
pub const DEFAULT_RENDER_COLOR_SPACE: &str = "ACEScg";

/// Path attribute of a file texture node
const FILE_PATH_ATTR: &str = "file_texture_name";

/// Path attribute of a render-engine image node
const IMAGE_PATH_ATTR: &str = "filename";

/// Source color space attribute of a texture node
const COLOR_SPACE_ATTR: &str = "color_space";

/// Flag telling the renderer to trust the file's embedded color space
const IGNORE_RULES_ATTR: &str = "ignore_color_space_rules";

/// Read the file path off a texture node
///
/// Returns `None` for non-texture nodes or when the path attribute is
/// unset; both are skip conditions, not errors.
pub fn texture_path(graph: &SceneGraph, node: NodeId) -> Option<String> {
    let attr = match graph.kind(node) {
        NodeKind::FileTexture => FILE_PATH_ATTR,
        NodeKind::ImageTexture => IMAGE_PATH_ATTR,
        _ => return None,
    };
    graph.attr(node, attr).and_then(|v| v.as_str()).map(str::to_string)
}

/// Write the file path onto a texture node
pub fn set_texture_path(graph: &mut SceneGraph, node: NodeId, path: &str) {
    let attr = match graph.kind(node) {
        NodeKind::FileTexture => FILE_PATH_ATTR,
        NodeKind::ImageTexture => IMAGE_PATH_ATTR,
        _ => return,
    };
    graph.set_attr(node, attr, path);
}

/// Compute both optimized-path candidates for a source texture
///
/// Current scheme keeps the source extension and appends the color
/// space pair: `body_sRGB_ACEScg.png.tx`. The legacy scheme replaces
/// the extension outright: `body.tx`.
pub fn optimized_candidates(
    texture_path: &Path,
    color_space: &str,
    render_color_space: &str,
) -> (PathBuf, PathBuf) {
    let dir = texture_path.parent().unwrap_or_else(|| Path::new(""));
    let stem = texture_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let current_name = match texture_path.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{stem}_{color_space}_{render_color_space}.{ext}.{OPTIMIZED_EXT}"),
        None => format!("{stem}_{color_space}_{render_color_space}.{OPTIMIZED_EXT}"),
    };
    let legacy_name = format!("{stem}.{OPTIMIZED_EXT}");

    (dir.join(current_name), dir.join(legacy_name))
}

/// Outcome of a swap attempt on one texture node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Path rewritten to an optimized file
    Swapped {
        /// Path before the swap
        from: PathBuf,
        /// Path after the swap
        to: PathBuf,
    },
    /// Path already points at an optimized file
    AlreadyOptimized,
    /// No optimized sibling exists on disk; node left untouched
    NoOptimizedFile,
    /// Node is not a texture or carries no path
    NoPath,
}

/// A performed swap, for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapRecord {
    /// The rewritten texture node
    pub node: NodeId,
    /// Path before the swap
    pub from: PathBuf,
    /// Path after the swap
    pub to: PathBuf,
}

/// Swap one texture node to its optimized file, if one exists
///
/// Checks the current naming scheme first, then the legacy one; the
/// first existing file wins. On a hit the node's path is rewritten and
/// the color-space-rules bypass flag is set, since the optimized
/// file's embedded color space is authoritative. Idempotent: already
/// optimized paths are never re-swapped.
pub fn apply_swap(graph: &mut SceneGraph, node: NodeId, render_color_space: &str) -> SwapOutcome {
    let Some(path) = texture_path(graph, node) else {
        return SwapOutcome::NoPath;
    };
    if path.ends_with(&format!(".{OPTIMIZED_EXT}")) {
        return SwapOutcome::AlreadyOptimized;
    }

    let color_space = graph.string_attr(node, COLOR_SPACE_ATTR);
    let (current, legacy) = optimized_candidates(Path::new(&path), &color_space, render_color_space);

    let updated = if current.is_file() {
        current
    } else if legacy.is_file() {
        legacy
    } else {
        return SwapOutcome::NoOptimizedFile;
    };

    graph.set_attr(node, IGNORE_RULES_ATTR, true);
    let updated_str = updated.to_string_lossy().replace('\\', "/");
    set_texture_path(graph, node, &updated_str);

    SwapOutcome::Swapped {
        from: PathBuf::from(path),
        to: updated,
    }
}

/// Run the swap pass over a set of texture nodes
///
/// Returns a record per node that was actually rewritten.
pub fn swap_textures(
    graph: &mut SceneGraph,
    nodes: &[NodeId],
    render_color_space: &str,
) -> Vec<SwapRecord> {
    let mut swapped = Vec::new();
    for node in nodes {
        match apply_swap(graph, *node, render_color_space) {
            SwapOutcome::Swapped { from, to } => {
                info!(
                    node = graph.name(*node),
                    from = %from.display(),
                    to = %to.display(),
                    "replaced texture path"
                );
                swapped.push(SwapRecord {
                    node: *node,
                    from,
                    to,
                });
            }
            outcome => {
                debug!(node = graph.name(*node), ?outcome, "texture left untouched");
            }
        }
    }
    swapped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_texture(graph: &mut SceneGraph, kind: NodeKind, path: &str, cs: &str) -> NodeId {
        let node = graph.create_node(kind, "tex1");
        set_texture_path(graph, node, path);
        graph.set_attr(node, COLOR_SPACE_ATTR, cs);
        node
    }

    #[test]
    fn test_optimized_candidates() {
        let (current, legacy) =
            optimized_candidates(Path::new("/tex/body.png"), "sRGB", "ACEScg");
        assert_eq!(current, PathBuf::from("/tex/body_sRGB_ACEScg.png.tx"));
        assert_eq!(legacy, PathBuf::from("/tex/body.tx"));
    }

    #[test]
    fn test_swap_prefers_current_scheme() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("body.png");
        std::fs::write(tmp.path().join("body_sRGB_ACEScg.png.tx"), b"").unwrap();
        std::fs::write(tmp.path().join("body.tx"), b"").unwrap();

        let mut graph = SceneGraph::new();
        let node = make_texture(
            &mut graph,
            NodeKind::FileTexture,
            &src.to_string_lossy(),
            "sRGB",
        );

        let outcome = apply_swap(&mut graph, node, "ACEScg");
        assert!(matches!(outcome, SwapOutcome::Swapped { .. }));
        let path = texture_path(&graph, node).unwrap();
        assert!(path.ends_with("body_sRGB_ACEScg.png.tx"));
        assert!(graph.bool_attr(node, IGNORE_RULES_ATTR, false));
    }

    #[test]
    fn test_swap_falls_back_to_legacy() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("head.exr");
        std::fs::write(tmp.path().join("head.tx"), b"").unwrap();

        let mut graph = SceneGraph::new();
        let node = make_texture(
            &mut graph,
            NodeKind::ImageTexture,
            &src.to_string_lossy(),
            "Raw",
        );

        let outcome = apply_swap(&mut graph, node, "ACEScg");
        assert!(matches!(outcome, SwapOutcome::Swapped { .. }));
        assert!(texture_path(&graph, node).unwrap().ends_with("head.tx"));
    }

    #[test]
    fn test_swap_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("body.png");
        std::fs::write(tmp.path().join("body.tx"), b"").unwrap();

        let mut graph = SceneGraph::new();
        let node = make_texture(
            &mut graph,
            NodeKind::FileTexture,
            &src.to_string_lossy(),
            "sRGB",
        );

        apply_swap(&mut graph, node, "ACEScg");
        let after_first = texture_path(&graph, node);
        assert_eq!(apply_swap(&mut graph, node, "ACEScg"), SwapOutcome::AlreadyOptimized);
        assert_eq!(texture_path(&graph, node), after_first);
    }

    #[test]
    fn test_no_optimized_file_leaves_node_untouched() {
        let mut graph = SceneGraph::new();
        let node = make_texture(&mut graph, NodeKind::FileTexture, "/nowhere/body.png", "sRGB");

        assert_eq!(apply_swap(&mut graph, node, "ACEScg"), SwapOutcome::NoOptimizedFile);
        assert_eq!(texture_path(&graph, node).unwrap(), "/nowhere/body.png");
        assert!(!graph.bool_attr(node, IGNORE_RULES_ATTR, false));
    }

    #[test]
    fn test_non_texture_node_is_skipped() {
        let mut graph = SceneGraph::new();
        let mesh = graph.create_node(NodeKind::Mesh, "bodyShape");
        assert_eq!(apply_swap(&mut graph, mesh, "ACEScg"), SwapOutcome::NoPath);
    }
}
