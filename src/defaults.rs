//! Default values for monorepo configuration.
//!
//! This module provides centralized default values used across the library
//! and the commands, ensuring consistency and avoiding duplication.

/// File name of the desired-state document at the monorepo root.
pub const MANIFEST_FILENAME: &str = "monorepo.yml";

/// File name of the lock document at the monorepo root.
pub const LOCKFILE_FILENAME: &str = "monorepo.lock";

/// Directory under the monorepo root holding one bare mirror per subrepo.
pub const CACHE_DIRNAME: &str = ".cache";

/// Branch tracked when `add` is not given one.
pub const DEFAULT_REF: &str = "master";
