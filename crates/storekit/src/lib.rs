//! # storekit
//!
//! Nix store paths and profile operations, driven through the `nix` CLI.
//!
//! This crate provides functionality for:
//! - Validating store paths and splitting them into name and version
//! - Evaluating a flake attribute to a list of store paths
//! - Listing, removing from and installing into a Nix profile
//!
//! ## Example
//!
//! ```no_run
//! use storekit::Client;
//! use std::path::Path;
//!
//! let client = Client::new().expect("nix not available");
//! let profile = Path::new("/home/me/.local/state/flakesync/profile");
//!
//! for path in client.profile_store_paths(profile).expect("list failed") {
//!     println!("{}  {}", path.label(), path);
//! }
//! ```
//!
//! Every call blocks until nix exits. Nothing is retried: nix failures are
//! classified ([`ErrorCategory`]) and returned to the caller as-is.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod platform;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use types::{InstallArgs, NixOptions, ProfileItem, StorePath, StorePathParts};

use backend::{Backend, nix::NixBackend};
use std::io::Write;
use std::path::{Path, PathBuf};

/// High-level client for nix operations.
///
/// The client wraps a backend and adds the decoding that sits on top of the
/// raw commands: JSON store path lists, system detection fallback and
/// flattening of profile elements.
pub struct Client {
    backend: Box<dyn Backend>,
}

impl Client {
    /// Create a new Client with the default backend.
    ///
    /// Returns an error if nix is not installed.
    pub fn new() -> Result<Self> {
        Ok(Self::with_backend(Box::new(backend::default_backend()?)))
    }

    /// Create a client for an explicit nix executable, or the one on PATH.
    pub fn with_program(nix: Option<PathBuf>, options: NixOptions) -> Result<Self> {
        let backend = match nix {
            Some(path) => NixBackend::with_program(path),
            None => NixBackend::new()?,
        };
        Ok(Self::with_backend(Box::new(backend.with_options(options))))
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Check if nix is available.
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// The Nix system of this machine.
    ///
    /// Asks nix first and falls back to the compile-time target.
    pub fn current_system(&self) -> Result<String> {
        match self.backend.current_system() {
            Ok(system) => Ok(system),
            Err(e) => {
                log::warn!("could not query nix for the current system ({e}), guessing");
                platform::nix_system()
            }
        }
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Evaluate an installable that renders as a JSON list of store paths.
    pub fn eval_store_paths(&self, installable: &str) -> Result<Vec<StorePath>> {
        let stdout = self.backend.eval_json(installable)?;

        let raw: Vec<String> =
            serde_json::from_slice(&stdout).map_err(|e| Error::UnexpectedOutput {
                command: "nix eval".to_string(),
                output: String::from_utf8_lossy(&stdout).trim().to_string(),
                message: e.to_string(),
            })?;

        raw.iter().map(|p| StorePath::parse(p)).collect()
    }

    /// Build inputs of a flake's default devShell for `system`.
    pub fn dev_shell_inputs(&self, flake: &str, system: &str) -> Result<Vec<StorePath>> {
        self.eval_store_paths(&dev_shell_inputs_attr(flake, system))
    }

    // =========================================================================
    // Profile Operations
    // =========================================================================

    /// List the elements of a profile.
    pub fn profile_items(&self, profile: &Path) -> Result<Vec<ProfileItem>> {
        self.backend.profile_list(profile)
    }

    /// All store paths in a profile, in listing order.
    ///
    /// Elements with several outputs contribute several paths.
    pub fn profile_store_paths(&self, profile: &Path) -> Result<Vec<StorePath>> {
        Ok(self
            .profile_items(profile)?
            .into_iter()
            .flat_map(|item| item.store_paths)
            .collect())
    }

    /// Remove store paths from a profile in a single nix call.
    pub fn remove(&self, profile: &Path, paths: &[StorePath]) -> Result<()> {
        self.backend.profile_remove(profile, paths)
    }

    /// Install one store path into a profile.
    pub fn install(&self, profile: &Path, args: &InstallArgs, out: &mut dyn Write) -> Result<()> {
        self.backend.profile_install(profile, args, out)
    }
}

/// `<flake>#devShells.<system>.default.buildInputs`
pub fn dev_shell_inputs_attr(flake: &str, system: &str) -> String {
    format!("{flake}#devShells.{system}.default.buildInputs")
}
