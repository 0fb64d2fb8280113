//! Lookforge Publish Pipeline
//!
//! Publishes a character asset from a scene:
//! - swaps shading-network texture references to pre-baked optimized files
//! - exports the selected hierarchy to a versioned geometry cache
//! - rebuilds the per-face shading assignment as an override graph
//! - serializes the look graph to a versioned file

pub mod geometry;
pub mod look;
pub mod overrides;
pub mod publisher;
pub mod serializer;
pub mod texture;
pub mod topology;
pub mod version;

pub use geometry::{CacheExporter, CacheJobSpec, SceneCacheWriter};
pub use look::export_look;
pub use overrides::{build_override_graph, BuiltOverrides};
pub use publisher::{AcceptAll, ConfirmPrompt, Publisher, PublishOptions, PublishReport};
pub use serializer::{GraphSerializer, LookGraphWriter, SerializeOptions};
pub use texture::{SwapOutcome, SwapRecord};
pub use topology::{PublishContext, ShadingAssignment};
pub use version::{next_version_path, VersionedPath};
