//! Look export
//!
//! Serializes the override graph built on a geometry proxy, plus every
//! shader it references, to a versioned look file under the asset's
//! publish directory.

use std::path::PathBuf;

use tracing::info;

use lookforge_core::{AssetContext, Error, Result};
use lookforge_scene::{NodeId, SceneGraph};

use crate::serializer::{GraphSerializer, SerializeOptions};
use crate::version;

/// On-disk extension of look graph files
pub const LOOK_EXT: &str = "ass";

/// Export the proxy's look graph to a versioned file
///
/// The export set is the transitive upstream closure of everything
/// feeding the proxy's operator slots, unioned with the referenced
/// shaders. Serializer failure is fatal for the publish; the override
/// graph stays in the scene so a retry does not rebuild it.
pub fn export_look<S: GraphSerializer>(
    graph: &SceneGraph,
    serializer: &S,
    proxy: NodeId,
    shaders: &[NodeId],
    asset: &AssetContext,
    look_name: &str,
) -> Result<PathBuf> {
    let dir = asset.look_dir(look_name);
    std::fs::create_dir_all(&dir)?;
    let versioned = version::next_version_path(&dir, &asset.look_stem(look_name), LOOK_EXT)?;

    let operators = graph.indexed_inputs(proxy, "operators");
    let mut export_set = graph.upstream_closure(&operators);
    for shader in shaders {
        if !export_set.contains(shader) {
            export_set.push(*shader);
        }
    }

    serializer
        .serialize(graph, &export_set, &versioned.path, &SerializeOptions::default())
        .map_err(|e| Error::serialize(e.to_string()))?;

    info!(path = %versioned.path.display(), version = versioned.version, "look graph written");
    Ok(versioned.path)
}
