//! Dependency installer — idempotently provision the declared package set.
//!
//! Runs once at bootstrap, before the supervisor starts. A package counts as
//! satisfied when the manifest records it or the package manager reports it
//! present; only the remainder is installed. Running provisioning twice
//! therefore produces the same installed state as running it once.
//!
//! The first failure aborts the whole sequence with an install error — a
//! half-provisioned host must not launch the service. Already-installed
//! packages are NOT rolled back on such a failure; the manifest records the
//! partial progress and the next provisioning run resumes from there.

pub mod fetcher;
pub mod manifest;
pub mod types;

pub use fetcher::{MockFetcher, PackageFetcher, SystemFetcher};
pub use manifest::{Manifest, ManifestEntry};
pub use types::{PackageKind, PackageSpec};

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Result, WardenError};

/// Provisions the declared dependency set onto the host.
pub struct Installer {
    manifest_path: PathBuf,
    manifest: Manifest,
    fetcher: Arc<dyn PackageFetcher>,
}

impl Installer {
    /// Create an installer backed by the manifest at `manifest_path`.
    pub fn new(manifest_path: PathBuf, fetcher: Arc<dyn PackageFetcher>) -> Self {
        let manifest = Manifest::load(&manifest_path).unwrap_or_default();
        Self {
            manifest_path,
            manifest,
            fetcher,
        }
    }

    /// Ensure every declared package is present, in declaration order.
    ///
    /// Fails with [`WardenError::Install`] on the first package that cannot be
    /// resolved or fetched. This is fatal to bootstrap.
    pub async fn provision(&mut self, packages: &[PackageSpec]) -> Result<()> {
        info!(declared = packages.len(), "provisioning dependency set");

        for pkg in packages {
            self.ensure_installed(pkg).await.map_err(|e| match e {
                WardenError::Install(msg) => {
                    WardenError::Install(format!("package '{}': {}", pkg.name, msg))
                }
                other => other,
            })?;
        }

        info!("dependency set provisioned");
        Ok(())
    }

    /// Ensure a single package is installed. No-op if already satisfied.
    async fn ensure_installed(&mut self, pkg: &PackageSpec) -> Result<()> {
        if self.manifest.contains(&pkg.name) {
            debug!(package = %pkg.name, "already in manifest, skipping");
            return Ok(());
        }

        if self.fetcher.is_present(pkg).await {
            debug!(package = %pkg.name, "present on host, recording");
            self.record(pkg, pkg.version.clone().unwrap_or_else(|| "latest".to_string()))?;
            return Ok(());
        }

        info!(package = %pkg.name, kind = pkg.kind.label(), "installing");
        let installed = self.fetcher.install(pkg).await?;
        self.record(pkg, installed.version)?;
        info!(package = %pkg.name, "installed");
        Ok(())
    }

    fn record(&mut self, pkg: &PackageSpec, version: String) -> Result<()> {
        self.manifest.set(
            pkg.name.clone(),
            ManifestEntry {
                kind: pkg.kind.label().to_string(),
                version,
                installed_at: chrono::Utc::now().to_rfc3339(),
            },
        );
        self.manifest.save(&self.manifest_path)
    }

    /// Whether a package is recorded as installed.
    pub fn is_installed(&self, name: &str) -> bool {
        self.manifest.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declared_set() -> Vec<PackageSpec> {
        vec![
            PackageSpec::os("python3"),
            PackageSpec::pip("streamlit").pinned("1.37.0"),
            PackageSpec::pip("pillow"),
        ]
    }

    fn test_manifest_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("manifest.json")
    }

    #[tokio::test]
    async fn test_provision_installs_missing() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::empty());
        let mut installer = Installer::new(test_manifest_path(&dir), fetcher.clone());

        installer.provision(&declared_set()).await.unwrap();

        assert_eq!(fetcher.install_count(), 3);
        assert!(installer.is_installed("streamlit"));
        assert!(installer.is_installed("python3"));
    }

    #[tokio::test]
    async fn test_provision_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::empty());
        let path = test_manifest_path(&dir);

        let mut installer = Installer::new(path.clone(), fetcher.clone());
        installer.provision(&declared_set()).await.unwrap();
        assert_eq!(fetcher.install_count(), 3);

        // Second run, fresh installer over the same manifest: no further installs.
        let mut installer = Installer::new(path, fetcher.clone());
        installer.provision(&declared_set()).await.unwrap();
        assert_eq!(fetcher.install_count(), 3);
    }

    #[tokio::test]
    async fn test_provision_adopts_already_present_packages() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::with_present(&["python3"]));
        let mut installer = Installer::new(test_manifest_path(&dir), fetcher.clone());

        installer.provision(&declared_set()).await.unwrap();

        // python3 was present, so only the two pip packages got installed.
        assert_eq!(fetcher.install_count(), 2);
        assert!(installer.is_installed("python3"));
    }

    #[tokio::test]
    async fn test_provision_failure_is_fatal_and_names_package() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::failure("repository unreachable"));
        let mut installer = Installer::new(test_manifest_path(&dir), fetcher);

        let err = installer.provision(&declared_set()).await.unwrap_err();
        assert!(matches!(err, WardenError::Install(_)));
        assert!(err.to_string().contains("python3"));
        assert!(err.to_string().contains("repository unreachable"));
    }

    #[tokio::test]
    async fn test_provision_no_rollback_on_partial_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_manifest_path(&dir);

        // First run installs everything.
        let fetcher = Arc::new(MockFetcher::empty());
        let mut installer = Installer::new(path.clone(), fetcher);
        installer
            .provision(&[PackageSpec::os("python3")])
            .await
            .unwrap();

        // Second run fails on a new package; python3 stays recorded.
        let failing = Arc::new(MockFetcher::failure("version conflict"));
        let mut installer = Installer::new(path.clone(), failing);
        assert!(installer
            .provision(&[PackageSpec::os("python3"), PackageSpec::pip("streamlit")])
            .await
            .is_err());

        let manifest = Manifest::load(&path).unwrap();
        assert!(manifest.contains("python3"));
        assert!(!manifest.contains("streamlit"));
    }

    #[tokio::test]
    async fn test_provision_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::empty());
        let mut installer = Installer::new(test_manifest_path(&dir), fetcher);
        installer.provision(&[]).await.unwrap();
    }
}
