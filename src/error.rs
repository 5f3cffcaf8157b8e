//! # Error Handling
//!
//! This module defines the centralized error type for the `monorepo` library.
//! It uses the `thiserror` library to create an `Error` enum that covers every
//! anticipated failure mode, with messages that carry enough context (document
//! path, subrepo path, failing step) to act on.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Configuration problems, git command failures,
//!   per-subrepo synchronization failures and lookup misses each get their own
//!   variant.
//!
//! - **`SyncStep`**: The pipeline step a synchronization failure belongs to.
//!   Each step has a stable tag (`cache-fetch`, `cache-clone`, `resolve`,
//!   `checkout`, `lock-persist`) used in messages and reports.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Failures of the `checkout` and `lock-persist` steps are special: by the time
//! they happen the working tree has already been touched, so
//! [`SyncStep::requires_manual_recovery`] singles them out and callers report
//! them distinctly instead of retrying.

use std::fmt;

use thiserror::Error;

/// The step of the per-subrepo synchronization pipeline that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncStep {
    /// Fetching into an existing mirror.
    CacheFetch,
    /// Cloning a fresh bare mirror.
    CacheClone,
    /// Resolving the tracked branch to a revision.
    Resolve,
    /// Hard-resetting the working tree to the resolved revision.
    Checkout,
    /// Writing the new entry to the lock document.
    LockPersist,
}

impl SyncStep {
    /// Stable tag for this step, used in error messages and reports.
    pub fn tag(self) -> &'static str {
        match self {
            SyncStep::CacheFetch => "cache-fetch",
            SyncStep::CacheClone => "cache-clone",
            SyncStep::Resolve => "resolve",
            SyncStep::Checkout => "checkout",
            SyncStep::LockPersist => "lock-persist",
        }
    }

    /// Whether a failure at this step leaves the working tree and the lock
    /// document out of step with each other.
    ///
    /// Cache and resolve failures happen before the working tree is touched,
    /// so the previous lock entry still describes what is on disk. A failed
    /// checkout leaves the tree in an undefined state, and a failed lock write
    /// leaves a tree that is newer than its lock entry.
    pub fn requires_manual_recovery(self) -> bool {
        matches!(self, SyncStep::Checkout | SyncStep::LockPersist)
    }
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Main error type for monorepo operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required configuration document does not exist.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// A configuration document exists but could not be parsed.
    #[error("Configuration parsing error in {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// A configuration document could not be written back to disk.
    #[error("Configuration write error for {path}: {message}")]
    ConfigWrite { path: String, message: String },

    /// Two desired-state entries share the same path.
    #[error("Duplicate subrepo path '{path}' in the desired-state document")]
    DuplicatePath { path: String },

    /// A subrepo path that cannot be placed under the monorepo root.
    #[error("Invalid subrepo path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// An invocation of the `git` executable failed.
    #[error("Git command failed for {target}: {command} - {stderr}")]
    GitCommand {
        command: String,
        target: String,
        stderr: String,
    },

    /// One step of the synchronization pipeline failed for a subrepo.
    #[error("Sync error for '{subrepo}' at {step}: {message}")]
    Sync {
        subrepo: String,
        step: SyncStep,
        message: String,
    },

    /// No subrepo matches the given path or URL.
    #[error("No such subrepo: '{identifier}'")]
    SubrepoNotFound { identifier: String },

    /// The working tree has uncommitted changes and the operation was not
    /// forced.
    #[error("Subrepo '{subrepo}' has uncommitted changes in its working tree (use --force to discard them)")]
    DirtyWorkingTree { subrepo: String },

    /// A synchronization worker panicked before reporting back.
    #[error("Sync worker panicked: {context}")]
    WorkerPanicked { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Wrap `source` as a failure of `step` for the subrepo at `subrepo`.
    pub fn sync(subrepo: &str, step: SyncStep, source: impl fmt::Display) -> Self {
        Error::Sync {
            subrepo: subrepo.to_string(),
            step,
            message: source.to_string(),
        }
    }

    /// The pipeline step this error belongs to, if it is a sync error.
    pub fn sync_step(&self) -> Option<SyncStep> {
        match self {
            Error::Sync { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
