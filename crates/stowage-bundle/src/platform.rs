//! Platform folder names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Platforms bundles are built for. Each has its own folder under the bundle
/// directory and on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Windows,
    #[serde(rename = "OSX")]
    Osx,
    Linux,
    Android,
    #[serde(rename = "iOS")]
    Ios,
    #[serde(rename = "WebGL")]
    WebGl,
}

impl Platform {
    /// Detect the host platform at runtime.
    #[must_use]
    pub fn current() -> Option<Self> {
        match std::env::consts::OS {
            "windows" => Some(Self::Windows),
            "macos" => Some(Self::Osx),
            "linux" => Some(Self::Linux),
            "android" => Some(Self::Android),
            "ios" => Some(Self::Ios),
            _ => None,
        }
    }

    /// Folder name used on disk and on the server (e.g., "Linux").
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::Osx => "OSX",
            Self::Linux => "Linux",
            Self::Android => "Android",
            Self::Ios => "iOS",
            Self::WebGl => "WebGL",
        }
    }

    /// Parse a platform folder name, ignoring case.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
    }

    /// Get all supported platforms.
    #[must_use]
    pub fn all() -> &'static [Platform] {
        &[
            Self::Windows,
            Self::Osx,
            Self::Linux,
            Self::Android,
            Self::Ios,
            Self::WebGl,
        ]
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn Platform___current___round_trips_when_known() {
        if let Some(p) = Platform::current() {
            assert_eq!(Platform::parse(p.as_str()), Some(p));
        }
    }

    #[test]
    fn Platform___parse___ignores_case() {
        assert_eq!(Platform::parse("linux"), Some(Platform::Linux));
        assert_eq!(Platform::parse("IOS"), Some(Platform::Ios));
        assert_eq!(Platform::parse("webgl"), Some(Platform::WebGl));
    }

    #[test]
    fn Platform___parse___returns_none_for_invalid() {
        assert_eq!(Platform::parse("amiga"), None);
        assert_eq!(Platform::parse(""), None);
    }

    #[test]
    fn Platform___serde___uses_folder_names() {
        let json = serde_json::to_string(&Platform::Osx).unwrap();

        assert_eq!(json, "\"OSX\"");
    }

    #[test]
    fn Platform___all___returns_six_platforms() {
        assert_eq!(Platform::all().len(), 6);
    }
}
