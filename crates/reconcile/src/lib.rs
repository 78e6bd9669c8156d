//! # Reconcile
//!
//! Converge a Nix profile onto the build inputs of a flake's default devShell.
//!
//! A run has two stages:
//!
//! - **Plan**: evaluate the desired store paths, list the installed ones and
//!   compute a [`Delta`]. Nothing is mutated.
//! - **Apply**: remove unwanted paths in one call, then install wanted paths
//!   one at a time, offline, stopping at the first failure.
//!
//! There is no rollback. A failed install leaves earlier installs in place
//! and the next run picks up from there, since the diff only ever asks for
//! what is still missing.
//!
//! ## Example
//!
//! ```ignore
//! use reconcile::{SyncTarget, sync};
//! use storekit::Client;
//!
//! let client = Client::new()?;
//! let target = SyncTarget::new("./dev", "/home/me/.local/state/dev-profile");
//! let report = sync(&client, &target, &mut std::io::stdout())?;
//! println!("{} changes", report.summary.total_changes());
//! ```

pub mod diff;
pub mod error;
pub mod executor;
pub mod planner;
pub mod types;

#[cfg(test)]
mod testutil;

pub use diff::diff;
pub use error::{ReconcileError, Result};
pub use executor::{SyncReport, apply, removal_message, step_message, sync};
pub use planner::{Plan, SyncTarget, desired_store_paths, installed_store_paths, plan};
pub use types::{ApplySummary, Delta};
