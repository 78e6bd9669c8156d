//! Backend abstraction for nix operations.
//!
//! The [`Backend`] trait defines the interface for interacting with nix,
//! allowing for different implementations (real CLI, fakes for testing).

pub mod nix;

use crate::error::Result;
use crate::types::{InstallArgs, ProfileItem, StorePath};
use std::io::Write;
use std::path::Path;

/// Backend trait for nix operations.
///
/// Every method is a blocking call into the external tool. Implementations
/// do not retry and do not lock the profile.
pub trait Backend: Send + Sync {
    /// Check if nix is available.
    fn is_available(&self) -> bool;

    /// The Nix system double of this machine, e.g. `x86_64-linux`.
    fn current_system(&self) -> Result<String>;

    /// Evaluate an installable and return its JSON rendering.
    fn eval_json(&self, installable: &str) -> Result<Vec<u8>>;

    /// List the elements of a profile.
    fn profile_list(&self, profile: &Path) -> Result<Vec<ProfileItem>>;

    /// Remove all given store paths from a profile in one operation.
    fn profile_remove(&self, profile: &Path, paths: &[StorePath]) -> Result<()>;

    /// Install a single store path into a profile.
    ///
    /// Progress text for the step is written to `out`.
    fn profile_install(&self, profile: &Path, args: &InstallArgs, out: &mut dyn Write)
    -> Result<()>;
}

/// Get the default backend (real nix CLI).
pub fn default_backend() -> Result<nix::NixBackend> {
    nix::NixBackend::new()
}
