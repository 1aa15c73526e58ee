/*! solc version management.
 *
 * Keeps a per-user directory of compiler binaries in step with the official release catalog.
 * Versions are checked against a supported range before anything touches the network, installs
 * are verified against published checksums and published by atomic rename, and concurrent
 * installs of one version share a single download.
 */

pub mod catalog;
pub mod config;
pub mod manager;
pub mod platform;
pub mod source;
pub mod version;

pub use catalog::{Build, Catalog, CatalogCache};
pub use config::SvmConfig;
pub use manager::SolcVersionManager;
pub use platform::Platform;
pub use source::{HttpReleaseSource, ReleaseSource};
pub use version::{SolcVersion, ToSolcVersion};

use thiserror::Error;

/// Cloneable so every caller waiting on a shared install sees the same failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SvmError {
    #[error("Invalid version: {0}")]
    InvalidVersion(String),
    #[error("Unsupported version {version}: supported range is {min} to {max}")]
    UnsupportedVersion {
        version: SolcVersion,
        min: SolcVersion,
        max: SolcVersion,
    },
    #[error("solc {0} is not published for this platform")]
    UnknownVersion(SolcVersion),
    #[error("solc {0} is not installed")]
    NotInstalled(SolcVersion),
    #[error("Failed to install solc {version}: {reason}")]
    TransferFailure {
        version: SolcVersion,
        reason: String,
    },
    #[error("Release catalog error: {0}")]
    Catalog(String),
    #[error("I/O error on {}: {reason}", path.display())]
    Io {
        path: std::path::PathBuf,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, SvmError>;
