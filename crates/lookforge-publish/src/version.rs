//! Versioned output paths
//!
//! Published files carry a zero-padded version number in their name
//! (`charA_mod.v001.abc`, `charA_operator.v004.ass`). The allocator
//! scans the output directory for the highest existing version and
//! hands out the next free one.

use std::path::{Path, PathBuf};

use regex::Regex;

use lookforge_core::{Error, Result};

/// A version-stamped output path, not yet written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedPath {
    /// Full output path
    pub path: PathBuf,
    /// Allocated version number
    pub version: u32,
    /// File name component of `path`
    pub file_name: String,
}

/// Highest version number among files in `dir` matching `pattern`
///
/// The pattern's first capture group must be the version digits.
/// A missing directory reads as empty (version 0). Subdirectories
/// are ignored.
pub fn highest_version(dir: &Path, pattern: &Regex) -> Result<u32> {
    let mut highest = 0;
    if !dir.is_dir() {
        return Ok(highest);
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(caps) = pattern.captures(name) {
            if let Ok(version) = caps[1].parse::<u32>() {
                highest = highest.max(version);
            }
        }
    }
    Ok(highest)
}

/// Allocate the next free versioned path in `dir`
///
/// Scans for any `v{digits}.{ext}` file — the stem is not part of the
/// scan, so versions of sibling stems in the same directory count
/// toward the maximum. The candidate is `max + 1`; if that exact path
/// is already taken (stale scan, out-of-band writes) the version keeps
/// incrementing until a free path is found. Padding is three digits
/// minimum and widens as needed.
///
/// No side effects beyond the directory listing; the caller creates
/// the directory and performs the eventual write.
pub fn next_version_path(dir: &Path, stem: &str, ext: &str) -> Result<VersionedPath> {
    let pattern = Regex::new(&format!(r"v([0-9]+)\.{}$", regex::escape(ext)))
        .map_err(|e| Error::internal(format!("bad version pattern: {e}")))?;

    let mut version = highest_version(dir, &pattern)? + 1;
    loop {
        // Three digits minimum; wider version numbers keep their width
        let file_name = format!("{stem}v{version:03}.{ext}");
        let path = dir.join(&file_name);
        if !path.exists() {
            return Ok(VersionedPath {
                path,
                version,
                file_name,
            });
        }
        version += 1;
    }
}
