//! # Pull Command Implementation
//!
//! This module implements the `pull` subcommand. What it does depends on the
//! number of arguments:
//!
//! - **none**: sync every subrepo concurrently. Failures of individual
//!   subrepos are listed at the end and make the command exit non-zero, but
//!   never stop the other subrepos.
//! - **one** (path or url): sync just that subrepo.
//! - **two or three** (url, path, optional ref): add a subrepo, like `add`.
//!
//! Pinned working trees with uncommitted changes are left alone unless
//! `--force` is given.

use anyhow::Result;
use clap::Args;

use monorepo::defaults::DEFAULT_REF;
use monorepo::output::{detail, emoji, subrepo};
use monorepo::{suggestions, Monorepo};

use crate::cli::Context;

/// Sync every subrepo, one subrepo, or add a new one
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Nothing, a subrepo path or url, or `<url> <path> [ref]`.
    #[arg(value_name = "ARGS", num_args = 0..)]
    pub args: Vec<String>,
}

/// Execute the `pull` command.
pub fn execute(args: PullArgs, ctx: &Context) -> Result<()> {
    if args.args.len() > 3 {
        return Err(suggestions::pull_too_many_args(args.args.len()));
    }

    let mut repo = super::open(ctx)?;
    match args.args.as_slice() {
        [] => pull_all(&mut repo, ctx),
        [identifier] => pull_one(&mut repo, identifier, ctx),
        [url, path] => super::add::run(&mut repo, url, path, DEFAULT_REF, ctx),
        [url, path, r#ref] => super::add::run(&mut repo, url, path, r#ref, ctx),
        _ => Err(suggestions::pull_too_many_args(args.args.len())),
    }
}

fn pull_all(repo: &mut Monorepo, ctx: &Context) -> Result<()> {
    println!(
        "{} Pulling {} subrepo(s)...",
        emoji(&ctx.out, "🔄", "[PULL]"),
        repo.manifest().len()
    );

    let report = repo.pull(ctx.force).map_err(|e| super::explain(repo, e))?;

    for entry in &report.synced {
        println!(
            "{} {} {}",
            emoji(&ctx.out, "✅", "[OK]"),
            subrepo(&ctx.out, &entry.path),
            detail(&ctx.out, entry.revision.as_str())
        );
    }
    for failure in &report.failures {
        eprintln!(
            "{} {}: {}",
            emoji(&ctx.out, "❌", "[ERR]"),
            subrepo(&ctx.out, &failure.path),
            failure.error
        );
    }

    if report.is_success() {
        return Ok(());
    }

    let failed = report.failed_paths();
    let needs_recovery: Vec<&str> = report
        .failures
        .iter()
        .filter(|f| f.requires_manual_recovery())
        .map(|f| f.path.as_str())
        .collect();
    Err(suggestions::pull_incomplete(&failed, &needs_recovery))
}

fn pull_one(repo: &mut Monorepo, identifier: &str, ctx: &Context) -> Result<()> {
    let entry = repo
        .pull_sub(identifier, ctx.force)
        .map_err(|e| super::explain(repo, e))?;

    println!(
        "{} {} {}",
        emoji(&ctx.out, "✅", "[OK]"),
        subrepo(&ctx.out, &entry.path),
        detail(&ctx.out, entry.revision.as_str())
    );
    Ok(())
}
