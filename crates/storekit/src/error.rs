//! Error types for Nix store and profile operations.
//!
//! Failures coming out of the `nix` CLI are classified from their stderr so
//! callers can show the operator a short description and a hint. Nothing in
//! this crate retries on any category.

use thiserror::Error;

/// Categories of nix errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Remote store or substituter could not be reached
    Network,
    /// Attribute, flake or store path does not exist
    NotFound,
    /// Two profile elements provide the same file
    Conflict,
    /// Permission denied on the store or profile
    Permission,
    /// The `nix` executable could not be located
    NixNotFound,
    /// Malformed data from nix or from the caller
    InvalidData,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network or substituter issue",
            Self::NotFound => "Not found",
            Self::Conflict => "Profile conflict",
            Self::Permission => "Permission denied",
            Self::NixNotFound => "Nix not installed",
            Self::InvalidData => "Invalid data",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => {
                "Installs run offline; make sure the flake was built locally before syncing"
            }
            Self::NotFound => "Check that the flake exposes devShells.<system>.default",
            Self::Conflict => "Remove the conflicting package from the profile and sync again",
            Self::Permission => "Check ownership of the profile and the Nix store",
            Self::NixNotFound => "Install Nix from https://nixos.org/download",
            Self::InvalidData => "Run with -vv to see the raw nix output",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur while talking to nix.
#[derive(Debug, Error)]
pub enum Error {
    /// The `nix` executable is not installed or not on PATH
    #[error("nix not found. Install it from https://nixos.org/download")]
    NixNotFound,

    /// A string that should be a store path is not one
    #[error("invalid store path '{path}': {reason}")]
    InvalidStorePath {
        /// The offending string
        path: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Network or substituter failure
    #[error("network error: {message}")]
    Network {
        /// stderr of the failed command
        message: String,
    },

    /// Something referenced by the command does not exist
    #[error("not found: {message}")]
    NotFound {
        /// stderr of the failed command
        message: String,
    },

    /// Two profile elements collide
    #[error("conflict: {message}")]
    Conflict {
        /// stderr of the failed command
        message: String,
    },

    /// Permission denied
    #[error("permission denied: {message}")]
    Permission {
        /// stderr of the failed command
        message: String,
    },

    /// Command execution failed
    #[error("{command} failed: {stderr}")]
    CommandFailed {
        /// The nix subcommand, e.g. `nix profile install`
        command: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// Command succeeded but printed something we cannot use
    #[error("unexpected output from {command}: {output}: {message}")]
    UnexpectedOutput {
        /// The nix subcommand
        command: String,
        /// The raw output, lossily decoded
        output: String,
        /// Decoder message
        message: String,
    },

    /// The current OS/arch pair has no Nix system name
    #[error("unsupported system: {os}/{arch}")]
    UnsupportedSystem {
        /// `std::env::consts::OS`
        os: String,
        /// `std::env::consts::ARCH`
        arch: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Network { .. } => ErrorCategory::Network,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Conflict { .. } => ErrorCategory::Conflict,
            Error::Permission { .. } => ErrorCategory::Permission,
            Error::NixNotFound => ErrorCategory::NixNotFound,
            Error::InvalidStorePath { .. } | Error::UnexpectedOutput { .. } => {
                ErrorCategory::InvalidData
            }
            _ => ErrorCategory::Other,
        }
    }

    /// Create an error from nix command output.
    ///
    /// Analyzes stderr to categorize the error appropriately.
    pub fn from_nix_output(stderr: &str, command: &str) -> Self {
        let stderr_lower = stderr.to_lowercase();
        let message = stderr.trim().to_string();

        // Conflicts first: their text also mentions store paths that "exist"
        if stderr_lower.contains("conflicting packages")
            || stderr_lower.contains("already provides the following file")
            || stderr_lower.contains("collision between")
        {
            return Error::Conflict { message };
        }

        if stderr_lower.contains("unable to download")
            || stderr_lower.contains("could not resolve host")
            || stderr_lower.contains("connection refused")
            || stderr_lower.contains("timed out")
            || stderr_lower.contains("cannot connect")
            || stderr_lower.contains("substituter")
            || stderr_lower.contains("ssl")
        {
            return Error::Network { message };
        }

        if stderr_lower.contains("does not provide attribute")
            || stderr_lower.contains("is not valid")
            || stderr_lower.contains("don't know how to build")
            || stderr_lower.contains("cannot find flake")
            || stderr_lower.contains("does not exist")
            || stderr_lower.contains("no such file or directory")
        {
            return Error::NotFound { message };
        }

        if stderr_lower.contains("permission denied")
            || stderr_lower.contains("operation not permitted")
            || stderr_lower.contains("read-only file system")
        {
            return Error::Permission { message };
        }

        Error::CommandFailed {
            command: command.to_string(),
            stderr: message,
        }
    }
}

/// Result type for nix operations.
pub type Result<T> = std::result::Result<T, Error>;
