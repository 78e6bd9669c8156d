//! Apply stage - removes, then installs one store path at a time

use crate::error::{ReconcileError, Result};
use crate::planner::{Plan, SyncTarget, plan};
use crate::types::{ApplySummary, Delta};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use storekit::{Client, InstallArgs, StorePath};

/// Outcome of a full sync
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub plan: Plan,
    pub summary: ApplySummary,
}

/// Apply a delta to a profile
///
/// Removals go first, in a single nix call. Installs follow one by one in
/// `delta.add` order, each offline since evaluation has already realised
/// every desired path locally.
///
/// The first nix failure aborts the run. Installs that already succeeded stay
/// in the profile.
///
/// # Arguments
/// * `client` - nix client acting on the profile
/// * `profile` - profile to mutate
/// * `delta` - changes from [`crate::diff::diff`]
/// * `out` - human-readable progress lines
pub fn apply(
    client: &Client,
    profile: &Path,
    delta: &Delta<StorePath>,
    out: &mut dyn Write,
) -> Result<ApplySummary> {
    let mut summary = ApplySummary::default();

    if !delta.remove.is_empty() {
        progress(out, &removal_message(&delta.remove));
        log::info!(
            "removing {} store paths from {}",
            delta.remove.len(),
            profile.display()
        );
        client
            .remove(profile, &delta.remove)
            .map_err(ReconcileError::Removal)?;
        summary.removed = delta.remove.len();
    }

    let total = delta.add.len();
    for (idx, path) in delta.add.iter().enumerate() {
        let args = InstallArgs::offline(path.clone(), step_message(idx + 1, total, path));
        client
            .install(profile, &args, out)
            .map_err(|source| ReconcileError::Install {
                path: path.clone(),
                source,
            })?;
        summary.installed += 1;
    }

    Ok(summary)
}

/// Plan and apply in one go
pub fn sync(client: &Client, target: &SyncTarget, out: &mut dyn Write) -> Result<SyncReport> {
    let plan = plan(client, target)?;
    let summary = apply(client, &target.profile, &plan.delta, out)?;
    Ok(SyncReport { plan, summary })
}

/// Progress is a side channel: a failed write is logged and otherwise ignored
fn progress(out: &mut dyn Write, line: &str) {
    if let Err(e) = writeln!(out, "{line}") {
        log::warn!("could not write progress output: {e}");
    }
}

/// `Removing a@1` for one path, `Removing packages: a@1, b@2` otherwise
pub fn removal_message(paths: &[StorePath]) -> String {
    let labels = paths
        .iter()
        .map(StorePath::label)
        .collect::<Vec<_>>()
        .join(", ");

    if paths.len() == 1 {
        format!("Removing {labels}")
    } else {
        format!("Removing packages: {labels}")
    }
}

/// `[step/total] name@version`
pub fn step_message(step: usize, total: usize, path: &StorePath) -> String {
    format!("[{step}/{total}] {}", path.label())
}
