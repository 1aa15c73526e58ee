/*! The per-platform `list.json` release catalog and its on-disk cache.
 */

use crate::platform::Platform;
use crate::version::SolcVersion;
use crate::{Result, SvmError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tiny_keccak::{Hasher, Keccak};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub builds: Vec<Build>,
    #[serde(default)]
    pub releases: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_release: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    /// File name relative to the platform directory.
    pub path: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerelease: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keccak256: Option<String>,
}

impl Build {
    /// Released builds only; nightlies carry a `prerelease` tag.
    pub fn release_version(&self) -> Option<SolcVersion> {
        if self.prerelease.is_some() {
            return None;
        }
        SolcVersion::parse(&self.version).ok()
    }

    /// Checks `bytes` against the published SHA-256, or keccak-256 when that is
    /// all the catalog has. Returns false when neither is published.
    pub fn verify(&self, version: &SolcVersion, bytes: &[u8]) -> Result<bool> {
        let (algorithm, expected, actual) = if let Some(expected) = &self.sha256 {
            ("sha256", expected, hex::encode(Sha256::digest(bytes)))
        } else if let Some(expected) = &self.keccak256 {
            let mut hasher = Keccak::v256();
            hasher.update(bytes);
            let mut digest = [0u8; 32];
            hasher.finalize(&mut digest);
            ("keccak256", expected, hex::encode(digest))
        } else {
            return Ok(false);
        };

        let expected = expected.trim_start_matches("0x");
        if expected.eq_ignore_ascii_case(&actual) {
            Ok(true)
        } else {
            Err(SvmError::TransferFailure {
                version: version.clone(),
                reason: format!("{} mismatch: expected {}, got {}", algorithm, expected, actual),
            })
        }
    }
}

impl Catalog {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| SvmError::Catalog(format!("malformed list.json: {}", e)))
    }

    pub fn find(&self, version: &SolcVersion) -> Option<&Build> {
        self.builds
            .iter()
            .find(|b| b.release_version().as_ref() == Some(version))
    }

    /// Released versions, ascending and without duplicates.
    pub fn versions(&self) -> Vec<SolcVersion> {
        let mut versions: Vec<_> = self.builds.iter().filter_map(Build::release_version).collect();
        versions.sort();
        versions.dedup();
        versions
    }
}

/// `<root>/list.json`: a catalog plus when and for which platform it was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCache {
    pub fetched_at: DateTime<Utc>,
    pub platform: Platform,
    pub catalog: Catalog,
}

impl CatalogCache {
    pub fn new(platform: Platform, catalog: Catalog) -> Self {
        Self {
            fetched_at: Utc::now(),
            platform,
            catalog,
        }
    }

    /// Reads the cache, treating a missing or unreadable file as absent.
    pub fn load(path: &Path) -> Option<Self> {
        let bytes = std::fs::read(path).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn store(&self, path: &Path) -> Result<()> {
        let io = |e: std::io::Error| SvmError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(io)?;

        let bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| SvmError::Catalog(format!("cannot encode list.json: {}", e)))?;
        let mut staging = tempfile::Builder::new()
            .prefix(".solc-staging-")
            .tempfile_in(dir)
            .map_err(io)?;
        staging.write_all(&bytes).map_err(io)?;
        staging.persist(path).map_err(|e| io(e.error))?;
        Ok(())
    }
}
