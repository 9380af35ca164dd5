//! Tool configuration.
//!
//! One [`Config`] is built by the host (the CLI) and passed by reference to
//! whatever needs it; nothing in the library caches configuration globally.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::record::format::{PACK_EXT, RECORD_EXT};
use crate::scene::ResolveStrategy;
use crate::util::{Error, Result};

/// What restore does when a record references influences the scene lacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingInfluencePolicy {
    /// Create placeholder influences and continue.
    #[default]
    Create,
    /// Fail with [`Error::MissingInfluence`].
    Abort,
}

/// Persistent settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Locations
    pub skin_dir: Option<PathBuf>,
    pub file_ext: String,
    pub pack_ext: String,

    // Versioning
    pub versioning: bool,
    /// Folder versions kept per artifact after a snapshot (0 keeps all).
    pub keep_versions: usize,

    // Import
    pub skip_already_skinned: bool,
    pub missing_influence: MissingInfluencePolicy,
    pub resolve_strategies: Vec<ResolveStrategy>,

    // Record files
    pub compression_level: u32,
    pub use_mmap: bool,

    // Objects tracked for export
    pub tracked_objects: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            skin_dir: None,
            file_ext: RECORD_EXT.to_string(),
            pack_ext: PACK_EXT.to_string(),
            versioning: false,
            keep_versions: 0,
            skip_already_skinned: true,
            missing_influence: MissingInfluencePolicy::default(),
            resolve_strategies: ResolveStrategy::DEFAULT_ORDER.to_vec(),
            compression_level: 6,
            use_mmap: true,
            tracked_objects: Vec::new(),
        }
    }
}

impl Config {
    /// Default config location: `<config dir>/skinio/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("skinio");
            p.push("config.json");
            p
        })
    }

    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::from_io(e, path))?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Write the config as pretty JSON, creating the parent directory.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)? + "\n")?;
        tracing::debug!(path = %path.display(), "config stored");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (key, ext) in [("file_ext", &self.file_ext), ("pack_ext", &self.pack_ext)] {
            if !ext.starts_with('.') || ext.len() < 2 {
                return Err(Error::InvalidConfig(format!("{key} must look like '.ext', got '{ext}'")));
            }
        }
        if self.compression_level > 9 {
            return Err(Error::InvalidConfig(format!(
                "compression_level must be 0-9, got {}",
                self.compression_level
            )));
        }
        if self.resolve_strategies.is_empty() {
            return Err(Error::InvalidConfig("resolve_strategies is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.file_ext, ".skinrecord");
        assert_eq!(config.missing_influence, MissingInfluencePolicy::Create);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"keep_versions": 3, "missing_influence": "abort"}"#).unwrap();
        assert_eq!(config.keep_versions, 3);
        assert_eq!(config.missing_influence, MissingInfluencePolicy::Abort);
        assert!(config.skip_already_skinned);
    }

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            skin_dir: Some(dir.path().to_path_buf()),
            tracked_objects: vec!["body".into(), "head".into()],
            ..Config::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
        assert_eq!(Config::load_or_default(dir.path().join("none.json")).unwrap(), Config::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_ext = Config { file_ext: "skin".into(), ..Config::default() };
        assert!(matches!(bad_ext.validate(), Err(Error::InvalidConfig(_))));

        let bad_level = Config { compression_level: 12, ..Config::default() };
        assert!(bad_level.validate().is_err());
    }
}
