//! Persisted tool preferences
//!
//! Read at startup, written at shutdown. Every key is optional; an
//! absent key falls back to its built-in default, and an unreadable
//! file reads as empty rather than blocking the tool.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Preference file name
const PREFS_FILE: &str = "character_publisher.json";

/// Saved window geometry of the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Persisted preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefs {
    /// Last window geometry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowGeometry>,
    /// Whether the geometry (UV) publish step is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_uv: Option<bool>,
    /// Whether the look publish step is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_look: Option<bool>,
}

impl Prefs {
    /// Location of the preference file, when a config dir exists
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lookforge").join(PREFS_FILE))
    }

    /// Load preferences from the default location
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load preferences from an explicit path
    pub fn load_from(path: &Path) -> Self {
        let Ok(text) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&text) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable preferences");
                Self::default()
            }
        }
    }

    /// Write preferences to the default location
    pub fn save(&self) -> std::io::Result<()> {
        match Self::default_path() {
            Some(path) => self.save_to(&path),
            None => Ok(()),
        }
    }

    /// Write preferences to an explicit path
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)
    }

    /// UV publish default, true unless saved otherwise
    pub fn publish_uv(&self) -> bool {
        self.publish_uv.unwrap_or(true)
    }

    /// Look publish default, true unless saved otherwise
    pub fn publish_look(&self) -> bool {
        self.publish_look.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_as_defaults() {
        let prefs = Prefs::load_from(Path::new("/nowhere/prefs.json"));
        assert_eq!(prefs, Prefs::default());
        assert!(prefs.publish_uv());
        assert!(prefs.publish_look());
    }

    #[test]
    fn test_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join(PREFS_FILE);

        let prefs = Prefs {
            window: Some(WindowGeometry {
                x: 10,
                y: 20,
                width: 350,
                height: 150,
            }),
            publish_uv: Some(false),
            publish_look: None,
        };
        prefs.save_to(&path).unwrap();

        let loaded = Prefs::load_from(&path);
        assert_eq!(loaded, prefs);
        assert!(!loaded.publish_uv());
        // Absent key falls back to the built-in default
        assert!(loaded.publish_look());
    }

    #[test]
    fn test_corrupt_file_reads_as_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(PREFS_FILE);
        std::fs::write(&path, b"{not json").unwrap();
        assert_eq!(Prefs::load_from(&path), Prefs::default());
    }
}
