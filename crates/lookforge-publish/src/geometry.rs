//! Geometry cache export
//!
//! The cache write itself belongs to the host application; this module
//! owns the fixed job specification handed to it, the versioned
//! destination bookkeeping, and the proxy node that references the
//! written cache afterwards.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use lookforge_core::{AssetContext, Error, Result};
use lookforge_scene::{path, NodeId, NodeKind, SceneGraph};

use crate::version;

/// On-disk extension of geometry caches
pub const CACHE_EXT: &str = "abc";

/// Container format tag of written caches
pub const CACHE_DATA_FORMAT: &str = "ogawa";

/// Cache export errors
#[derive(Debug, thiserror::Error)]
pub enum CacheExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type CacheResult<T> = std::result::Result<T, CacheExportError>;

/// The fixed export job handed to the cache collaborator
///
/// A publish always exports a single frame in world space with UVs,
/// color sets and face sets, namespaces stripped.
#[derive(Debug, Clone, Serialize)]
pub struct CacheJobSpec {
    /// First frame
    pub frame_start: i32,
    /// Last frame
    pub frame_end: i32,
    /// Strip namespaces from exported hierarchy names
    pub strip_namespaces: bool,
    /// Write UV sets
    pub write_uvs: bool,
    /// Write color sets
    pub write_color_sets: bool,
    /// Write face sets
    pub write_face_sets: bool,
    /// Bake world-space transforms
    pub world_space: bool,
    /// Container format tag
    pub data_format: String,
    /// Ordered hierarchy root selectors (long names)
    pub roots: Vec<String>,
    /// Destination file
    pub destination: PathBuf,
}

impl CacheJobSpec {
    /// The publish job for the given roots and destination
    pub fn publish(roots: Vec<String>, destination: PathBuf) -> Self {
        Self {
            frame_start: 1,
            frame_end: 1,
            strip_namespaces: true,
            write_uvs: true,
            write_color_sets: true,
            write_face_sets: true,
            world_space: true,
            data_format: CACHE_DATA_FORMAT.to_string(),
            roots,
            destination,
        }
    }
}

/// Geometry cache export collaborator
pub trait CacheExporter {
    /// Write the cache described by `job`
    fn export(&self, graph: &SceneGraph, job: &CacheJobSpec) -> CacheResult<()>;
}

/// Cache body written by [`SceneCacheWriter`]
#[derive(Debug, Serialize)]
struct CacheBody<'a> {
    data_format: &'a str,
    frame_start: i32,
    frame_end: i32,
    roots: &'a [String],
    meshes: Vec<String>,
}

/// Writes the selected hierarchy as a JSON cache body
///
/// Stand-in for the host's native cache exporter: records the mesh
/// hierarchy under the job's roots so downstream selector resolution
/// can be exercised without a host session.
#[derive(Debug, Default)]
pub struct SceneCacheWriter;

impl SceneCacheWriter {
    /// Create a writer
    pub fn new() -> Self {
        Self
    }
}

impl CacheExporter for SceneCacheWriter {
    fn export(&self, graph: &SceneGraph, job: &CacheJobSpec) -> CacheResult<()> {
        let mut meshes = Vec::new();
        for root in &job.roots {
            let trimmed = root.rsplit('|').next().unwrap_or(root);
            let Some(id) = graph.find(trimmed) else { continue };
            for mesh in graph.descendants_of_kind(&[id], NodeKind::Mesh) {
                let long_name = graph.long_name(mesh);
                if job.strip_namespaces {
                    meshes.push(path::selector_from_long_name(&long_name));
                } else {
                    meshes.push(long_name);
                }
            }
        }

        let body = CacheBody {
            data_format: &job.data_format,
            frame_start: job.frame_start,
            frame_end: job.frame_end,
            roots: &job.roots,
            meshes,
        };
        let file = std::fs::File::create(&job.destination)?;
        serde_json::to_writer_pretty(file, &body)?;
        Ok(())
    }
}

/// Create the proxy node referencing a written cache
///
/// `charA_mod.v001.abc` becomes a `charA_mod` transform holding a
/// `charA_modShape` proxy whose `dso` attribute points at the file.
pub fn create_cache_proxy(graph: &mut SceneGraph, file_name: &str, cache_path: &Path) -> NodeId {
    let base = file_name.split('.').next().unwrap_or(file_name);
    let parent = graph.create_node(NodeKind::Transform, base);
    let proxy = graph.create_child(parent, NodeKind::GeometryProxy, format!("{base}Shape"));
    let dso = cache_path.to_string_lossy().replace('\\', "/");
    graph.set_attr(proxy, "dso", dso);
    proxy
}

/// Throwaway proxy for look-only publishes
pub fn create_temp_proxy(graph: &mut SceneGraph) -> NodeId {
    let parent = graph.create_node(NodeKind::Transform, "tmp_standin");
    graph.create_child(parent, NodeKind::GeometryProxy, "tmp_standinShape")
}

/// Export the geometry cache and create its proxy
///
/// Allocates the next cache version under the asset's cache directory,
/// runs the collaborator, and returns the proxy plus the written path.
/// Collaborator failure aborts the publish; nodes created so far stay
/// in the scene.
pub fn export_geometry_cache<E: CacheExporter>(
    graph: &mut SceneGraph,
    exporter: &E,
    selection: &[NodeId],
    asset: &AssetContext,
) -> Result<(NodeId, PathBuf)> {
    let dir = asset.cache_dir();
    std::fs::create_dir_all(&dir)?;
    let versioned = version::next_version_path(&dir, &asset.cache_stem(), CACHE_EXT)?;

    let roots: Vec<String> = selection.iter().map(|s| graph.long_name(*s)).collect();
    let job = CacheJobSpec::publish(roots, versioned.path.clone());
    exporter
        .export(graph, &job)
        .map_err(|e| Error::cache_export(e.to_string()))?;

    info!(path = %versioned.path.display(), version = versioned.version, "geometry cache written");
    let proxy = create_cache_proxy(graph, &versioned.file_name, &versioned.path);
    Ok((proxy, versioned.path))
}
