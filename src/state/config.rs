//! Layout configuration
//!
//! These values control pagination, the folder icon cache and folder policy.
//! They are serialized to JSON (config.json in the data directory); every
//! field has a default so partial or missing files load cleanly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{LayoutError, Result};
use crate::icon::folder::DEFAULT_CACHE_CAPACITY;
use crate::icon::DEFAULT_FOLDER_ICON_SIDE;

/// File name of the configuration inside the data directory
pub const CONFIG_FILE: &str = "config.json";

/// All tunables for the launcher layout
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    // ========== Grid ==========

    /// Slots per page (5 rows x 7 columns)
    pub page_capacity: usize,

    // ========== Folder icons ==========

    /// Maximum number of rendered folder icons kept in memory
    pub icon_cache_capacity: usize,

    /// Side in pixels of folder icons drawn in the grid
    pub folder_icon_side: u32,

    // ========== Folders ==========

    /// Turn a folder left with one member back into a bare application
    pub dissolve_single_member_folders: bool,

    /// Name given to folders created by a merge
    pub default_folder_name: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_capacity: 35,
            icon_cache_capacity: DEFAULT_CACHE_CAPACITY,
            folder_icon_side: DEFAULT_FOLDER_ICON_SIDE,
            dissolve_single_member_folders: false,
            default_folder_name: "Untitled".to_string(),
        }
    }
}

impl LayoutConfig {
    /// Convert to JSON string for storage
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reject values the layout cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.page_capacity == 0 {
            return Err(LayoutError::InvalidCapacity(
                "page capacity must be positive".to_string(),
            ));
        }
        if self.icon_cache_capacity == 0 {
            return Err(LayoutError::InvalidCapacity(
                "icon cache capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Load `config.json` from a data directory, falling back to defaults
    /// when the file does not exist
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = Self::path_in(data_dir);
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(&path)?;
        let config = Self::from_json(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Write `config.json` into a data directory
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir)?;
        std::fs::write(Self::path_in(data_dir), self.to_json()?)?;
        Ok(())
    }

    fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LayoutConfig::default();
        assert_eq!(config.page_capacity, 35);
        assert_eq!(config.icon_cache_capacity, 256);
        assert!(!config.dissolve_single_member_folders);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = LayoutConfig::from_json(r#"{ "page_capacity": 20 }"#).unwrap();
        assert_eq!(config.page_capacity, 20);
        assert_eq!(config.folder_icon_side, 72);
        assert_eq!(config.default_folder_name, "Untitled");
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = LayoutConfig {
            page_capacity: 0,
            ..LayoutConfig::default()
        };
        assert!(matches!(config.validate(), Err(LayoutError::InvalidCapacity(_))));
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = LayoutConfig::load(dir.path()).unwrap();
        assert_eq!(config, LayoutConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = LayoutConfig {
            page_capacity: 24,
            dissolve_single_member_folders: true,
            ..LayoutConfig::default()
        };
        config.save(dir.path()).unwrap();

        assert_eq!(LayoutConfig::load(dir.path()).unwrap(), config);
    }
}
