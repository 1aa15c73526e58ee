use crate::catalog::{Build, Catalog, CatalogCache};
use crate::config::SvmConfig;
use crate::platform::Platform;
use crate::source::{HttpReleaseSource, ReleaseSource};
use crate::version::{SolcVersion, ToSolcVersion};
use crate::{Result, SvmError};
use futures_util::future::{BoxFuture, FutureExt, Shared, WeakShared};
use std::collections::{BTreeSet, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

const STAGING_PREFIX: &str = ".solc-staging-";

type Transfer = BoxFuture<'static, Result<()>>;
type InFlightMap = Arc<Mutex<HashMap<SolcVersion, InFlight>>>;

/// An install other callers can join. Weak, so dropping every caller drops the
/// transfer itself.
struct InFlight {
    ticket: u64,
    transfer: WeakShared<Transfer>,
}

/// Installs, removes and resolves solc binaries under one root directory.
pub struct SolcVersionManager {
    config: SvmConfig,
    source: Arc<dyn ReleaseSource>,
    catalog: tokio::sync::Mutex<Option<Arc<Catalog>>>,
    in_flight: InFlightMap,
    tickets: AtomicU64,
}

impl SolcVersionManager {
    pub fn new(config: SvmConfig) -> Self {
        let source = Arc::new(HttpReleaseSource::new(config.catalog_url.clone()));
        Self::with_source(config, source)
    }

    pub fn with_source(config: SvmConfig, source: Arc<dyn ReleaseSource>) -> Self {
        Self {
            config,
            source,
            catalog: tokio::sync::Mutex::new(None),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            tickets: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SvmConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Where `version` lives once installed.
    pub fn binary_path(&self, version: &SolcVersion) -> PathBuf {
        let suffix = self.config.platform.map_or("", |p| p.executable_suffix());
        self.config.root.join(format!("solc-{}{}", version, suffix))
    }

    pub fn installs_in_flight(&self) -> usize {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn supported<V: ToSolcVersion + ?Sized>(&self, version: &V) -> Result<SolcVersion> {
        let version = version.to_solc_version()?;
        if self.config.is_supported(&version) {
            Ok(version)
        } else {
            Err(SvmError::UnsupportedVersion {
                version,
                min: self.config.min_version.clone(),
                max: self.config.max_version.clone(),
            })
        }
    }

    fn platform(&self) -> Result<Platform> {
        self.config
            .platform
            .ok_or_else(|| SvmError::Catalog("solc publishes no builds for this platform".into()))
    }

    /// Installable versions, ascending.
    pub async fn list_available(&self, force_refresh: bool) -> Result<Vec<SolcVersion>> {
        let catalog = self.catalog(force_refresh).await?;
        Ok(catalog
            .versions()
            .into_iter()
            .filter(|v| self.config.is_supported(v))
            .collect())
    }

    async fn catalog(&self, force_refresh: bool) -> Result<Arc<Catalog>> {
        let platform = self.platform()?;
        let cache_path = self.config.catalog_cache();
        let mut cached = self.catalog.lock().await;

        if !force_refresh {
            if let Some(catalog) = cached.as_ref() {
                return Ok(Arc::clone(catalog));
            }
            if let Some(disk) = CatalogCache::load(&cache_path).filter(|c| c.platform == platform) {
                debug!(
                    path = %cache_path.display(),
                    fetched_at = %disk.fetched_at,
                    "Using cached release catalog"
                );
                let catalog = Arc::new(disk.catalog);
                *cached = Some(Arc::clone(&catalog));
                return Ok(catalog);
            }
        }

        info!(%platform, "Fetching release catalog");
        let catalog = self.source.fetch_catalog(platform).await?;
        if let Err(e) = CatalogCache::new(platform, catalog.clone()).store(&cache_path) {
            warn!("Could not cache release catalog: {}", e);
        }
        let catalog = Arc::new(catalog);
        *cached = Some(Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Versions present under the root. Staging files and the catalog cache
    /// are not versions.
    pub fn list_installed(&self) -> Result<BTreeSet<SolcVersion>> {
        let root = &self.config.root;
        let entries = match std::fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(io_error(root, e)),
        };
        let suffix = self.config.platform.map_or("", |p| p.executable_suffix());

        let mut installed = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_error(root, e))?;
            let name = entry.file_name();
            let version = name
                .to_str()
                .and_then(|n| n.strip_prefix("solc-"))
                .and_then(|n| n.strip_suffix(suffix))
                .and_then(|n| SolcVersion::parse(n).ok());
            if let Some(version) = version {
                if entry.path().is_file() {
                    installed.insert(version);
                }
            }
        }
        Ok(installed)
    }

    /// Installs `version` unless it is already present. Concurrent calls for
    /// one version share a single transfer and all see its outcome.
    pub async fn install<V: ToSolcVersion + ?Sized>(
        &self,
        version: &V,
        session: Option<&reqwest::Client>,
    ) -> Result<SolcVersion> {
        let version = self.supported(version)?;
        if self.binary_path(&version).is_file() {
            debug!(%version, "Already installed");
            return Ok(version);
        }

        let platform = self.platform()?;
        let build = self
            .catalog(false)
            .await?
            .find(&version)
            .cloned()
            .ok_or_else(|| SvmError::UnknownVersion(version.clone()))?;

        self.transfer(platform, &version, build, session.cloned()).await?;
        Ok(version)
    }

    fn transfer(
        &self,
        platform: Platform,
        version: &SolcVersion,
        build: Build,
        session: Option<reqwest::Client>,
    ) -> Shared<Transfer> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = in_flight.get(version).and_then(|e| e.transfer.upgrade()) {
            debug!(%version, "Joining in-flight install");
            return existing;
        }

        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed);
        let job = InstallJob {
            root: self.config.root.clone(),
            target: self.binary_path(version),
            platform,
            version: version.clone(),
            build,
            session,
            source: Arc::clone(&self.source),
            allow_unverified: self.config.allow_unverified,
            _registration: Registration {
                map: Arc::clone(&self.in_flight),
                version: version.clone(),
                ticket,
            },
        };
        let transfer = job.run().boxed().shared();
        if let Some(weak) = transfer.downgrade() {
            in_flight.insert(version.clone(), InFlight { ticket, transfer: weak });
        }
        transfer
    }

    pub fn remove<V: ToSolcVersion + ?Sized>(&self, version: &V) -> Result<()> {
        let version = version.to_solc_version()?;
        let path = self.binary_path(&version);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(%version, "Removed solc");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SvmError::NotInstalled(version)),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    /// Path of an installed binary. Never downloads.
    pub fn get_path<V: ToSolcVersion + ?Sized>(&self, version: &V) -> Result<PathBuf> {
        let version = self.supported(version)?;
        let path = self.binary_path(&version);
        if path.is_file() {
            Ok(path)
        } else {
            Err(SvmError::NotInstalled(version))
        }
    }
}

/// Removes an in-flight entry when its transfer finishes or is dropped,
/// unless a newer transfer has taken the slot.
struct Registration {
    map: InFlightMap,
    version: SolcVersion,
    ticket: u64,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        if map.get(&self.version).is_some_and(|e| e.ticket == self.ticket) {
            map.remove(&self.version);
        }
    }
}

struct InstallJob {
    root: PathBuf,
    target: PathBuf,
    platform: Platform,
    version: SolcVersion,
    build: Build,
    session: Option<reqwest::Client>,
    source: Arc<dyn ReleaseSource>,
    allow_unverified: bool,
    _registration: Registration,
}

impl InstallJob {
    async fn run(self) -> Result<()> {
        if self.target.is_file() {
            return Ok(());
        }
        if self.build.path.ends_with(".zip") {
            return Err(self.failure("archived builds are not supported"));
        }

        std::fs::create_dir_all(&self.root).map_err(|e| io_error(&self.root, e))?;
        // Deleted on drop, including when the transfer is cancelled.
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&self.root)
            .map_err(|e| io_error(&self.root, e))?
            .into_temp_path();

        info!(version = %self.version, build = %self.build.path, "Downloading solc");
        let bytes = self
            .source
            .fetch_binary(self.platform, &self.version, &self.build, self.session.clone())
            .await?;

        if self.build.verify(&self.version, &bytes)? {
            debug!(version = %self.version, "Checksum verified");
        } else if self.allow_unverified {
            warn!(version = %self.version, "Installing build without a published checksum");
        } else {
            return Err(self.failure("the catalog publishes no checksum for this build"));
        }

        tokio::fs::write(&staging, &bytes)
            .await
            .map_err(|e| io_error(&staging, e))?;
        set_executable(&staging)
            .await
            .map_err(|e| io_error(&staging, e))?;
        staging
            .persist(&self.target)
            .map_err(|e| io_error(&self.target, e.error))?;

        info!(version = %self.version, path = %self.target.display(), "Installed solc");
        Ok(())
    }

    fn failure(&self, reason: &str) -> SvmError {
        SvmError::TransferFailure {
            version: self.version.clone(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(unix)]
async fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await
}

#[cfg(not(unix))]
async fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

fn io_error(path: &Path, e: std::io::Error) -> SvmError {
    SvmError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_installed_ignores_other_files() {
        let dir = TempDir::new().unwrap();
        let svm = SolcVersionManager::new(SvmConfig {
            platform: Some(Platform::LinuxAmd64),
            ..SvmConfig::with_root(dir.path())
        });

        for name in ["solc-0.8.10", "solc-0.8.a", "list.json", ".solc-staging-abc", "notes"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("solc-0.7.6")).unwrap();

        let installed: Vec<_> = svm.list_installed().unwrap().into_iter().collect();
        assert_eq!(installed, vec![SolcVersion::new(0, 8, 10)]);
    }

    #[test]
    fn test_missing_root_has_nothing_installed() {
        let dir = TempDir::new().unwrap();
        let svm = SolcVersionManager::new(SvmConfig::with_root(dir.path().join("absent")));
        assert!(svm.list_installed().unwrap().is_empty());
    }
}
