//! Common types used across Lookforge
//!
//! This module provides shared type definitions used by multiple crates.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Directory name that anchors asset resolution inside a project tree
pub const ASSETS_DIR: &str = "assets";

/// Subdirectory of an asset that holds geometry caches
pub const CACHE_DIR: &str = "abc";

/// Subdirectory of an asset that holds published looks
pub const PUBLISH_DIR: &str = "publish";

/// Subdirectory of `publish` that holds named (non-default) looks
pub const LOOK_DIR: &str = "look";

/// The asset a publish session operates on
///
/// Resolved once from the scene location and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetContext {
    /// Asset name, e.g. `charA`
    pub name: String,
    /// Asset root directory, e.g. `.../assets/charA`
    pub dir: PathBuf,
}

impl AssetContext {
    /// Create an asset context directly from a name and directory
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
        }
    }

    /// Guess the asset directory and name from a scene file path
    ///
    /// Walks the path for an `assets` component; the component that
    /// follows it names the asset, and the asset directory is the path
    /// up to and including that component. Returns `None` when the
    /// scene does not live under an `assets` tree.
    pub fn from_scene_path(scene: impl AsRef<Path>) -> Option<Self> {
        let scene = scene.as_ref();
        let components: Vec<&str> = scene
            .iter()
            .filter_map(|c| c.to_str())
            .collect();

        for (i, component) in components.iter().enumerate() {
            if *component == ASSETS_DIR {
                if let Some(name) = components.get(i + 1) {
                    let dir: PathBuf = components[..=i + 1].iter().collect();
                    return Some(Self::new(*name, dir));
                }
            }
        }

        None
    }

    /// Directory holding versioned geometry caches for this asset
    pub fn cache_dir(&self) -> PathBuf {
        self.dir.join(CACHE_DIR)
    }

    /// Directory holding published looks
    ///
    /// The default look publishes directly into `publish/`; a named
    /// look gets its own `publish/look/{name}/` subfolder.
    pub fn look_dir(&self, look_name: &str) -> PathBuf {
        let publish = self.dir.join(PUBLISH_DIR);
        if look_name.is_empty() {
            publish
        } else {
            publish.join(LOOK_DIR).join(look_name)
        }
    }

    /// Filename stem for the look graph, without version or extension
    ///
    /// `{asset}_operator.` for the default look,
    /// `{asset}_{look}_operator.` for a named one.
    pub fn look_stem(&self, look_name: &str) -> String {
        if look_name.is_empty() {
            format!("{}_operator.", self.name)
        } else {
            format!("{}_{}_operator.", self.name, look_name)
        }
    }

    /// Filename stem for the geometry cache, without version or extension
    pub fn cache_stem(&self) -> String {
        format!("{}_mod.", self.name)
    }
}
