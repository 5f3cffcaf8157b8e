//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `monorepo`
//! command-line tool. Each subcommand is defined in its own file to keep the
//! logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the global
//!   [`Context`](crate::cli::Context) and performs the command's logic.
//!
//! The `execute` function is responsible for orchestrating the necessary
//! operations, calling into the `monorepo` library to perform the core logic.

pub mod add;
pub mod list;
pub mod pull;
pub mod rm;

use anyhow::Result;

use monorepo::{suggestions, Error, Monorepo};

use crate::cli::Context;

/// Open the monorepo at the context's root, with hints on failure.
pub(crate) fn open(ctx: &Context) -> Result<Monorepo> {
    Monorepo::open(&ctx.root).map_err(|e| suggestions::explain(e, &[]))
}

/// Add hints to a library error, suggesting subrepo paths from `repo`.
pub(crate) fn explain(repo: &Monorepo, error: Error) -> anyhow::Error {
    let known: Vec<&str> = repo.manifest().repos.iter().map(|s| s.path.as_str()).collect();
    suggestions::explain(error, &known)
}
