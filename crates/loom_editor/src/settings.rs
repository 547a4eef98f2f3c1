// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor settings, stored as RON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings errors
#[derive(Debug, Error)]
pub enum SettingsError {
    /// File could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File contents are not valid settings
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// File was written by a newer editor
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },
}

/// Node drawing metrics, in graph units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeStyle {
    /// Node body width
    pub node_width: f32,
    /// Header height
    pub header_height: f32,
    /// Height of one port row
    pub port_height: f32,
    /// Port circle radius
    pub port_radius: f32,
    /// Gap between a port circle and its label
    pub port_padding: f32,
    /// Corner rounding
    pub rounding: f32,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            node_width: 180.0,
            header_height: 24.0,
            port_height: 22.0,
            port_radius: 6.0,
            port_padding: 12.0,
            rounding: 6.0,
        }
    }
}

/// Editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Settings format version
    pub version: u32,
    /// Default `tracing` filter directive
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Show the debug panel on newly added nodes
    #[serde(default)]
    pub debug_nodes_by_default: bool,
    /// Node drawing metrics
    #[serde(default)]
    pub style: NodeStyle,
}

fn default_log_filter() -> String {
    "loom_editor=info,loom_graph=info".to_string()
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            log_filter: default_log_filter(),
            debug_nodes_by_default: false,
            style: NodeStyle::default(),
        }
    }
}

impl EditorSettings {
    /// Parse settings from RON text
    pub fn from_ron(text: &str) -> Result<Self, SettingsError> {
        let settings: EditorSettings = ron::from_str(text)?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        Ok(settings)
    }

    /// Serialize settings to pretty RON
    pub fn to_ron(&self) -> Result<String, SettingsError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_ron_round_trip() {
        let mut settings = EditorSettings::default();
        settings.debug_nodes_by_default = true;
        settings.style.node_width = 220.0;

        let text = settings.to_ron().unwrap();
        let loaded = EditorSettings::from_ron(&text).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let loaded = EditorSettings::from_ron("(version: 1)").unwrap();
        assert_eq!(loaded.style, NodeStyle::default());
        assert!(!loaded.debug_nodes_by_default);
        assert_eq!(loaded.log_filter, default_log_filter());
    }

    #[test]
    fn test_newer_version_rejected() {
        let result = EditorSettings::from_ron("(version: 99)");
        assert!(matches!(
            result,
            Err(SettingsError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("loom_settings_{}.ron", uuid::Uuid::new_v4()));
        let settings = EditorSettings::default();
        settings.save(&path).unwrap();
        let loaded = EditorSettings::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, settings);
    }
}
