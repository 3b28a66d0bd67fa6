//! Package fetcher trait and implementations.
//!
//! `PackageFetcher` abstracts the package-manager system calls for testability.
//! `SystemFetcher` shells out to apt-get and pip.
//! `MockFetcher` is used in tests.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, WardenError};

use super::types::{PackageKind, PackageSpec};

/// Result of an install operation.
#[derive(Debug, Clone)]
pub struct InstalledPackage {
    /// Version that ended up installed ("latest" when unpinned and unknown).
    pub version: String,
}

/// Abstracts the actual package-manager operations.
#[async_trait]
pub trait PackageFetcher: Send + Sync {
    /// Check whether the package is already present on the host.
    async fn is_present(&self, pkg: &PackageSpec) -> bool;

    /// Install a package. Returns the installed version.
    async fn install(&self, pkg: &PackageSpec) -> Result<InstalledPackage>;
}

/// Real fetcher that shells out to the host package managers.
pub struct SystemFetcher;

#[async_trait]
impl PackageFetcher for SystemFetcher {
    async fn is_present(&self, pkg: &PackageSpec) -> bool {
        let output = match pkg.kind {
            PackageKind::Os => {
                tokio::process::Command::new("dpkg")
                    .args(["-s", &pkg.name])
                    .output()
                    .await
            }
            PackageKind::Pip => {
                tokio::process::Command::new("python3")
                    .args(["-m", "pip", "show", &pkg.name])
                    .output()
                    .await
            }
        };
        matches!(output, Ok(out) if out.status.success())
    }

    async fn install(&self, pkg: &PackageSpec) -> Result<InstalledPackage> {
        match pkg.kind {
            PackageKind::Os => {
                let output = tokio::process::Command::new("apt-get")
                    .args(["install", "-y", &pkg.requirement()])
                    .env("DEBIAN_FRONTEND", "noninteractive")
                    .output()
                    .await
                    .map_err(|e| {
                        WardenError::Install(format!("failed to run apt-get: {}", e))
                    })?;
                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(WardenError::Install(format!(
                        "apt-get install {} failed: {}",
                        pkg.requirement(),
                        stderr.trim()
                    )));
                }
                Ok(InstalledPackage {
                    version: pkg.version.clone().unwrap_or_else(|| "latest".to_string()),
                })
            }
            PackageKind::Pip => {
                let output = tokio::process::Command::new("python3")
                    .args(["-m", "pip", "install", &pkg.requirement()])
                    .output()
                    .await
                    .map_err(|e| WardenError::Install(format!("failed to run pip: {}", e)))?;
                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(WardenError::Install(format!(
                        "pip install {} failed: {}",
                        pkg.requirement(),
                        stderr.trim()
                    )));
                }
                // Unpinned installs resolve a concrete version; ask pip what it picked.
                let version = match pkg.version.clone() {
                    Some(v) => v,
                    None => self.pip_installed_version(&pkg.name).await,
                };
                Ok(InstalledPackage { version })
            }
        }
    }
}

impl SystemFetcher {
    async fn pip_installed_version(&self, name: &str) -> String {
        let output = tokio::process::Command::new("python3")
            .args(["-m", "pip", "show", name])
            .output()
            .await;
        match output {
            Ok(out) if out.status.success() => {
                let stdout = String::from_utf8_lossy(&out.stdout);
                parse_pip_version(&stdout).unwrap_or_else(|| "latest".to_string())
            }
            _ => {
                debug!(package = name, "pip show failed after install, recording 'latest'");
                "latest".to_string()
            }
        }
    }
}

/// Extract the `Version:` line from `pip show` output.
pub(crate) fn parse_pip_version(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("Version:"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Scripted fetcher for tests.
pub struct MockFetcher {
    present: std::sync::Mutex<std::collections::HashSet<String>>,
    fail_with: Option<String>,
    pub installed: std::sync::Mutex<Vec<String>>,
}

impl MockFetcher {
    /// Fetcher where nothing is pre-installed and every install succeeds.
    pub fn empty() -> Self {
        Self {
            present: std::sync::Mutex::new(std::collections::HashSet::new()),
            fail_with: None,
            installed: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Fetcher that reports the given packages as already present.
    pub fn with_present(names: &[&str]) -> Self {
        Self {
            present: std::sync::Mutex::new(names.iter().map(|n| n.to_string()).collect()),
            fail_with: None,
            installed: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Fetcher whose installs always fail with the given message.
    pub fn failure(msg: &str) -> Self {
        Self {
            present: std::sync::Mutex::new(std::collections::HashSet::new()),
            fail_with: Some(msg.to_string()),
            installed: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn install_count(&self) -> usize {
        self.installed.lock().unwrap().len()
    }
}

#[async_trait]
impl PackageFetcher for MockFetcher {
    async fn is_present(&self, pkg: &PackageSpec) -> bool {
        self.present.lock().unwrap().contains(&pkg.name)
    }

    async fn install(&self, pkg: &PackageSpec) -> Result<InstalledPackage> {
        if let Some(msg) = &self.fail_with {
            return Err(WardenError::Install(msg.clone()));
        }
        self.installed.lock().unwrap().push(pkg.name.clone());
        self.present.lock().unwrap().insert(pkg.name.clone());
        Ok(InstalledPackage {
            version: pkg.version.clone().unwrap_or_else(|| "latest".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pip_version() {
        let output = "Name: streamlit\nVersion: 1.37.0\nSummary: A faster way to build apps\n";
        assert_eq!(parse_pip_version(output), Some("1.37.0".to_string()));
    }

    #[test]
    fn test_parse_pip_version_missing() {
        assert_eq!(parse_pip_version("Name: streamlit\n"), None);
        assert_eq!(parse_pip_version(""), None);
    }

    #[test]
    fn test_parse_pip_version_empty_value() {
        assert_eq!(parse_pip_version("Version:   \n"), None);
    }

    #[tokio::test]
    async fn test_mock_fetcher_tracks_installs() {
        let fetcher = MockFetcher::empty();
        let pkg = PackageSpec::pip("streamlit");
        assert!(!fetcher.is_present(&pkg).await);
        fetcher.install(&pkg).await.unwrap();
        assert!(fetcher.is_present(&pkg).await);
        assert_eq!(fetcher.install_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_fetcher_failure() {
        let fetcher = MockFetcher::failure("network unreachable");
        let err = fetcher.install(&PackageSpec::pip("pillow")).await.unwrap_err();
        assert!(err.to_string().contains("network unreachable"));
    }

    #[tokio::test]
    async fn test_mock_fetcher_with_present() {
        let fetcher = MockFetcher::with_present(&["python3"]);
        assert!(fetcher.is_present(&PackageSpec::os("python3")).await);
        assert!(!fetcher.is_present(&PackageSpec::pip("requests")).await);
    }
}
