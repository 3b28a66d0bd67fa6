//! JSON manifest tracking what provisioning has already installed.
//!
//! Persists to `~/.warden/manifest.json`. The manifest is what makes
//! provisioning idempotent across runs: a recorded package is verified, not
//! reinstalled.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Result, WardenError};

/// An entry in the install manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Package manager level ("os" or "pip").
    pub kind: String,
    /// Installed version.
    pub version: String,
    /// When it was installed (ISO 8601).
    pub installed_at: String,
}

/// In-memory manifest backed by a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Manifest {
    #[serde(flatten)]
    entries: HashMap<String, ManifestEntry>,
}

impl Manifest {
    /// Load from a JSON file. Returns empty manifest if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let manifest: Self =
            serde_json::from_str(&content).map_err(|e| WardenError::Config(e.to_string()))?;
        Ok(manifest)
    }

    /// Save to a JSON file. Creates parent directories if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries.get(name)
    }

    pub fn set(&mut self, name: String, entry: ManifestEntry) {
        self.entries.insert(name, entry);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Default manifest file path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".warden/manifest.json")
    }
}
