//! # Monorepo Library
//!
//! This library keeps a directory of independent git sub-repositories
//! ("subrepos") pinned to exact revisions. It is designed to be used by the
//! `monorepo` command-line tool but the engine can be driven directly.
//!
//! ## Quick Example
//!
//! ```
//! use monorepo::config;
//!
//! let manifest = config::parse_manifest(r#"
//! repos:
//!   - path: libs/a
//!     url: https://example.com/a.git
//!     ref: master
//! "#).unwrap();
//!
//! let spec = manifest.find("https://example.com/a.git").unwrap();
//! assert_eq!(spec.path, "libs/a");
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: The desired-state document (`monorepo.yml`,
//!   path, url and branch per subrepo) and the lock document (`monorepo.lock`,
//!   the same plus the pinned revision).
//! - **Store (`store`)**: The on-disk layout of a monorepo root, loading and
//!   atomically saving both documents, and the single lock writer used while
//!   subrepos sync concurrently.
//! - **Git backend (`git`)**: The handful of git operations the engine needs,
//!   behind a trait so tests can substitute a mock.
//! - **Sync engine (`sync`)**: The per-subrepo pipeline (update mirror, resolve
//!   branch, reset working tree, persist lock entry) and the concurrent
//!   whole-repo pull.
//! - **Monorepo (`repository`)**: The facade used by the commands: list, pull,
//!   add and remove subrepos.
//!
//! ## Layout
//!
//! ```text
//! <root>/monorepo.yml
//! <root>/monorepo.lock
//! <root>/.cache/<path>/   bare mirror
//! <root>/<path>/          working tree
//! ```

pub mod config;
pub mod defaults;
pub mod error;
pub mod git;
pub mod output;
pub mod repository;
pub mod store;
pub mod suggestions;
pub mod sync;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use repository::Monorepo;
