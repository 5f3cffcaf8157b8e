//! # Rm Command Implementation
//!
//! Removes a subrepo, named by path or url, from `monorepo.yml` and
//! `monorepo.lock`. Its working tree and mirror are left on disk; delete them
//! by hand if they are no longer wanted.

use anyhow::Result;
use clap::Args;

use monorepo::output::{emoji, subrepo};

use crate::cli::Context;

/// Forget a subrepo (its files stay on disk)
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Path or url of the subrepo to remove.
    #[arg(value_name = "PATH_OR_URL")]
    pub identifier: String,
}

/// Execute the `rm` command.
pub fn execute(args: RmArgs, ctx: &Context) -> Result<()> {
    let mut repo = super::open(ctx)?;
    let removed = repo
        .remove(&args.identifier)
        .map_err(|e| super::explain(&repo, e))?;

    println!(
        "{} Removed {} ({})",
        emoji(&ctx.out, "🗑️", "[RM]"),
        subrepo(&ctx.out, &removed.path),
        removed.url
    );
    println!(
        "   Files in {} and {} were kept",
        repo.layout().worktree_path(&removed.path).display(),
        repo.layout().mirror_path(&removed.path).display()
    );
    Ok(())
}
