//! Errors raised while reconciling a profile

use storekit::{ErrorCategory, StorePath};
use thiserror::Error;

/// A failed reconciliation step
///
/// Every variant is fatal for the run. The underlying nix error is kept as
/// the source so the whole chain can be shown to the operator.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Desired set could not be computed; nothing was changed
    #[error("nix eval devShells")]
    Evaluation(#[source] storekit::Error),

    /// Profile contents could not be listed; nothing was changed
    #[error("nix profile list")]
    Inspection(#[source] storekit::Error),

    /// Bulk removal failed; no install was attempted
    #[error("nix profile remove")]
    Removal(#[source] storekit::Error),

    /// One install failed; later installs were skipped, earlier ones kept
    #[error("error installing package {path}")]
    Install {
        path: StorePath,
        #[source]
        source: storekit::Error,
    },
}

impl ReconcileError {
    /// Category of the underlying nix error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Evaluation(e) | Self::Inspection(e) | Self::Removal(e) => e.category(),
            Self::Install { source, .. } => source.category(),
        }
    }

    /// Whether the profile may have been changed before the failure
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Install { .. })
    }
}

/// Result type for reconciliation
pub type Result<T> = std::result::Result<T, ReconcileError>;
