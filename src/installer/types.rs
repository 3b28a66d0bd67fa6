//! Declared dependency set — core types.

use serde::{Deserialize, Serialize};

/// The level a package is installed at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PackageKind {
    /// OS-level package installed via the distro package manager (apt-get).
    Os,
    /// Python library installed via pip.
    #[default]
    Pip,
}

impl PackageKind {
    pub fn label(&self) -> &'static str {
        match self {
            PackageKind::Os => "os",
            PackageKind::Pip => "pip",
        }
    }
}

/// A declared runtime dependency with an optional version constraint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageSpec {
    /// Package name (e.g. "python3-pip", "streamlit").
    pub name: String,
    /// Exact version to pin (e.g. "1.37.0"). None = whatever the repository resolves.
    #[serde(default)]
    pub version: Option<String>,
    /// Which package manager owns this package.
    #[serde(default)]
    pub kind: PackageKind,
}

impl PackageSpec {
    pub fn os(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: None,
            kind: PackageKind::Os,
        }
    }

    pub fn pip(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: None,
            kind: PackageKind::Pip,
        }
    }

    pub fn pinned(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    /// The requirement string handed to the package manager.
    ///
    /// apt pins with `name=version`, pip with `name==version`.
    pub fn requirement(&self) -> String {
        match (&self.version, self.kind) {
            (Some(v), PackageKind::Os) => format!("{}={}", self.name, v),
            (Some(v), PackageKind::Pip) => format!("{}=={}", self.name, v),
            (None, _) => self.name.clone(),
        }
    }
}
