//! Core types for Nix store paths and profiles.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

/// `<32 char nix-base32 hash>-<name>`; nix-base32 omits e, o, u and t.
static BASENAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9a-df-np-sv-z]{32})-([A-Za-z0-9+\-._?=]+)$")
        .expect("store path regex is valid")
});

/// A content-addressed path in the Nix store.
///
/// Equality and hashing are by exact string, so two paths that differ only
/// in hash are distinct artifacts even when they decompose to the same
/// `name@version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorePath {
    path: String,
    /// Byte offset of the basename within `path`.
    base: usize,
}

impl StorePath {
    /// Parse and validate a store path such as
    /// `/nix/store/0c0ahfnlrxkwfsqzvdkdrfxwqz4rvf61-hello-2.12.1`.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidStorePath {
            path: s.to_string(),
            reason,
        };

        if !s.starts_with('/') {
            return Err(invalid("not an absolute path"));
        }
        let base = s.rfind('/').map_or(0, |i| i + 1);
        if base <= 1 {
            return Err(invalid("missing store directory"));
        }
        if !BASENAME_RE.is_match(&s[base..]) {
            return Err(invalid("expected <hash>-<name> after the store directory"));
        }

        Ok(Self {
            path: s.to_string(),
            base,
        })
    }

    /// The full path as a string.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// The store directory this path lives in, e.g. `/nix/store`.
    pub fn store_dir(&self) -> &Path {
        Path::new(&self.path[..self.base - 1])
    }

    /// The 32-character hash part.
    pub fn hash_part(&self) -> &str {
        &self.path[self.base..self.base + 32]
    }

    /// Everything after `<hash>-`, e.g. `hello-2.12.1`.
    pub fn name_part(&self) -> &str {
        &self.path[self.base + 33..]
    }

    /// Decompose into hash, name and version.
    pub fn parts(&self) -> StorePathParts {
        let (name, version) = split_name_version(self.name_part());
        StorePathParts {
            hash: self.hash_part().to_string(),
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    /// Human-readable `name@version` label.
    pub fn label(&self) -> String {
        self.parts().label()
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl AsRef<str> for StorePath {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

impl AsRef<std::ffi::OsStr> for StorePath {
    fn as_ref(&self) -> &std::ffi::OsStr {
        self.path.as_ref()
    }
}

impl Serialize for StorePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path)
    }
}

impl FromStr for StorePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StorePath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

/// The display decomposition of a [`StorePath`].
///
/// Lossy: only for progress labels, never for equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePathParts {
    /// Hash part of the basename
    pub hash: String,
    /// Package name, e.g. `hello`
    pub name: String,
    /// Version, empty when the name carries none
    pub version: String,
}

impl StorePathParts {
    /// `name@version`.
    pub fn label(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// Split `<name>-<version>` at the first dash followed by a digit.
fn split_name_version(s: &str) -> (&str, &str) {
    s.as_bytes()
        .windows(2)
        .position(|w| w[0] == b'-' && w[1].is_ascii_digit())
        .map_or((s, ""), |i| (&s[..i], &s[i + 1..]))
}

/// One element of a Nix profile.
///
/// A single element can resolve to several store paths (one per output).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileItem {
    /// Position in the listing
    pub index: usize,
    /// Element name (profile manifest v3 and later)
    pub name: Option<String>,
    /// Whether the element is active
    pub active: bool,
    /// Flake attribute path, for elements installed from a flake
    pub attr_path: Option<String>,
    /// Flake reference as given at install time
    pub original_url: Option<String>,
    /// Locked flake reference
    pub url: Option<String>,
    /// Store paths provided by this element
    pub store_paths: Vec<StorePath>,
}

impl ProfileItem {
    /// Store paths provided by this element.
    pub fn store_paths(&self) -> &[StorePath] {
        &self.store_paths
    }

    /// A short name for display: the element name, else the attribute path,
    /// else the label of the first store path.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.attr_path.clone())
            .or_else(|| self.store_paths.first().map(StorePath::label))
            .unwrap_or_else(|| format!("#{}", self.index))
    }
}

/// Arguments for a single `nix profile install`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallArgs {
    /// Store path to install
    pub installable: StorePath,
    /// Package name, for logging
    pub package_name: String,
    /// Progress line, e.g. `[1/3] hello@2.12.1`
    pub step_message: String,
    /// Forbid any substituter or remote fetch
    pub offline: bool,
}

impl InstallArgs {
    /// Offline install of a store path with the given progress line.
    pub fn offline(installable: StorePath, step_message: impl Into<String>) -> Self {
        let package_name = installable.parts().name;
        Self {
            installable,
            package_name,
            step_message: step_message.into(),
            offline: true,
        }
    }
}

/// Options that change how nix is invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NixOptions {
    /// Export `NIXPKGS_ALLOW_UNFREE=1` (implies `--impure`)
    pub allow_unfree: bool,
    /// Export `NIXPKGS_ALLOW_INSECURE=1` (implies `--impure`)
    pub allow_insecure: bool,
}

impl NixOptions {
    /// Whether evaluation must read the environment.
    pub fn impure(&self) -> bool {
        self.allow_unfree || self.allow_insecure
    }
}
