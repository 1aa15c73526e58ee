use crate::platform::Platform;
use crate::version::SolcVersion;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_CATALOG_URL: &str = "https://binaries.soliditylang.org";
pub const MIN_SUPPORTED: SolcVersion = SolcVersion::new(0, 6, 2);
pub const MAX_SUPPORTED: SolcVersion = SolcVersion::new(0, 8, 30);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmConfig {
    /// Directory holding `solc-<version>` binaries and the catalog cache.
    pub root: PathBuf,
    pub catalog_url: String,
    /// `None` on hosts solc has no builds for.
    pub platform: Option<Platform>,
    pub min_version: SolcVersion,
    pub max_version: SolcVersion,
    /// Install builds for which the catalog publishes no checksum.
    pub allow_unverified: bool,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            platform: Platform::current(),
            min_version: MIN_SUPPORTED,
            max_version: MAX_SUPPORTED,
            allow_unverified: false,
        }
    }
}

impl SvmConfig {
    /// Defaults, with `SOLIR_CATALOG_URL` overriding the mirror.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(url) = env::var("SOLIR_CATALOG_URL").ok().filter(|u| !u.is_empty()) {
            config.catalog_url = url;
        }
        config
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn is_supported(&self, version: &SolcVersion) -> bool {
        (&self.min_version..=&self.max_version).contains(&version)
    }

    pub fn catalog_cache(&self) -> PathBuf {
        self.root.join("list.json")
    }
}

/// `$SOLIR_HOME`, else `$XDG_DATA_HOME/solir/compilers`, else
/// `$HOME/.solir/compilers`.
fn default_root() -> PathBuf {
    let var = |name: &str| env::var_os(name).filter(|v| !v.is_empty()).map(PathBuf::from);

    if let Some(home) = var("SOLIR_HOME") {
        return home;
    }
    if let Some(data) = var("XDG_DATA_HOME") {
        return data.join("solir").join("compilers");
    }
    var("HOME")
        .or_else(|| var("USERPROFILE"))
        .unwrap_or_else(|| Path::new(".").to_path_buf())
        .join(".solir")
        .join("compilers")
}
