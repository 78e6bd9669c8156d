//! Core types for profile reconciliation

use serde::Serialize;

/// Changes needed to bring a profile to the desired set
///
/// Derived on every run and never persisted. `add` and `remove` are disjoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delta<T> {
    /// Wanted but not installed, in desired order
    pub add: Vec<T>,
    /// Installed but not wanted, in listing order
    pub remove: Vec<T>,
}

impl<T> Delta<T> {
    /// Check if there is nothing to do
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.add.len() + self.remove.len()
    }
}

impl<T> Default for Delta<T> {
    fn default() -> Self {
        Self {
            add: Vec::new(),
            remove: Vec::new(),
        }
    }
}

/// What an apply run actually did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub removed: usize,
    pub installed: usize,
}

impl ApplySummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.removed + self.installed
    }
}
