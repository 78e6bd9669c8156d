//! Reconciliation planner - queries desired and installed state

use crate::diff::diff;
use crate::error::{ReconcileError, Result};
use crate::types::Delta;
use serde::Serialize;
use std::path::{Path, PathBuf};
use storekit::{Client, StorePath};

/// What to reconcile: a flake's default devShell against a profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    /// Flake reference, e.g. a directory path or `github:owner/repo`
    pub flake: String,
    /// Profile to converge
    pub profile: PathBuf,
    /// Nix system override; detected when `None`
    pub system: Option<String>,
}

impl SyncTarget {
    /// Create a target for the current system
    pub fn new(flake: impl Into<String>, profile: impl Into<PathBuf>) -> Self {
        Self {
            flake: flake.into(),
            profile: profile.into(),
            system: None,
        }
    }

    /// Evaluate for an explicit system instead of the detected one
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Desired and installed state plus the delta between them
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    /// System the flake was evaluated for
    pub system: String,
    /// Installed store paths, possibly with duplicates
    pub got: Vec<StorePath>,
    /// Desired store paths in evaluation order
    pub want: Vec<StorePath>,
    /// Changes needed
    pub delta: Delta<StorePath>,
}

/// Evaluate the flake's devShell build inputs for `system`
pub fn desired_store_paths(client: &Client, flake: &str, system: &str) -> Result<Vec<StorePath>> {
    client
        .dev_shell_inputs(flake, system)
        .map_err(ReconcileError::Evaluation)
}

/// All store paths currently in the profile, across every element
pub fn installed_store_paths(client: &Client, profile: &Path) -> Result<Vec<StorePath>> {
    client
        .profile_store_paths(profile)
        .map_err(ReconcileError::Inspection)
}

/// Query both sides and compute the delta
///
/// Nothing is mutated. Evaluation happens first so a broken flake is
/// reported before the profile is touched in any way.
pub fn plan(client: &Client, target: &SyncTarget) -> Result<Plan> {
    let system = match &target.system {
        Some(system) => system.clone(),
        None => client
            .current_system()
            .map_err(ReconcileError::Evaluation)?,
    };

    log::info!("evaluating {} for {}", target.flake, system);
    let want = desired_store_paths(client, &target.flake, &system)?;

    log::info!("listing profile {}", target.profile.display());
    let got = installed_store_paths(client, &target.profile)?;

    let delta = diff(&got, &want);
    log::debug!(
        "{} installed, {} desired, {} to add, {} to remove",
        got.len(),
        want.len(),
        delta.add.len(),
        delta.remove.len()
    );

    Ok(Plan {
        system,
        got,
        want,
        delta,
    })
}
