use serde::{Deserialize, Serialize};
use std::fmt;

/// Directory names used by the binaries.soliditylang.org mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "linux-amd64")]
    LinuxAmd64,
    #[serde(rename = "macosx-amd64")]
    MacosxAmd64,
    #[serde(rename = "windows-amd64")]
    WindowsAmd64,
}

impl Platform {
    /// The platform this process runs on, if solc publishes builds for it.
    pub fn current() -> Option<Self> {
        if cfg!(all(target_os = "linux", target_arch = "x86_64")) {
            Some(Platform::LinuxAmd64)
        } else if cfg!(target_os = "macos") {
            // arm64 hosts run the universal amd64 builds
            Some(Platform::MacosxAmd64)
        } else if cfg!(all(target_os = "windows", target_arch = "x86_64")) {
            Some(Platform::WindowsAmd64)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LinuxAmd64 => "linux-amd64",
            Platform::MacosxAmd64 => "macosx-amd64",
            Platform::WindowsAmd64 => "windows-amd64",
        }
    }

    pub fn executable_suffix(&self) -> &'static str {
        match self {
            Platform::WindowsAmd64 => ".exe",
            _ => "",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
