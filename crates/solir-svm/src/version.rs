use crate::{Result, SvmError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A released compiler version, `MAJOR.MINOR.PATCH` only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SolcVersion(semver::Version);

impl SolcVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let version = semver::Version::parse(text.trim())
            .map_err(|e| SvmError::InvalidVersion(format!("{}: {}", text, e)))?;
        if !version.pre.is_empty() || !version.build.is_empty() {
            return Err(SvmError::InvalidVersion(format!(
                "{}: pre-release and build suffixes are not accepted",
                text
            )));
        }
        Ok(Self(version))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }
}

impl fmt::Display for SolcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SolcVersion {
    type Err = SvmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SolcVersion {
    type Error = SvmError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<SolcVersion> for String {
    fn from(version: SolcVersion) -> Self {
        version.to_string()
    }
}

/// Anything a caller may name a version with.
pub trait ToSolcVersion {
    fn to_solc_version(&self) -> Result<SolcVersion>;
}

impl ToSolcVersion for SolcVersion {
    fn to_solc_version(&self) -> Result<SolcVersion> {
        Ok(self.clone())
    }
}

impl ToSolcVersion for str {
    fn to_solc_version(&self) -> Result<SolcVersion> {
        SolcVersion::parse(self)
    }
}

impl ToSolcVersion for String {
    fn to_solc_version(&self) -> Result<SolcVersion> {
        SolcVersion::parse(self)
    }
}

impl<T: ToSolcVersion + ?Sized> ToSolcVersion for &T {
    fn to_solc_version(&self) -> Result<SolcVersion> {
        (**self).to_solc_version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_order() {
        let older = SolcVersion::parse("0.8.9").unwrap();
        let newer: SolcVersion = "0.8.10".parse().unwrap();
        assert!(older < newer);
        assert_eq!(newer.to_string(), "0.8.10");
        assert_eq!(newer, SolcVersion::new(0, 8, 10));
    }

    #[test]
    fn test_rejects_non_release_versions() {
        for text in ["0.8.a", "0.8", "", "0.8.10-nightly.2021.9.1", "0.8.10+commit.fc410830"] {
            assert!(
                matches!(SolcVersion::parse(text), Err(SvmError::InvalidVersion(_))),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_serde_as_string() {
        let v: SolcVersion = serde_json::from_str("\"0.6.2\"").unwrap();
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"0.6.2\"");
        assert!(serde_json::from_str::<SolcVersion>("\"latest\"").is_err());
    }
}
