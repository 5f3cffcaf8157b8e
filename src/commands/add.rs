//! # Add Command Implementation
//!
//! This module implements the `add` subcommand. It syncs a subrepo from `url`
//! into `path` and, once the sync succeeded, records it in `monorepo.yml` and
//! `monorepo.lock`. An existing entry with the same path is replaced.
//!
//! `monorepo pull <url> <path> [ref]` is the same operation.

use anyhow::Result;
use clap::Args;

use monorepo::defaults::DEFAULT_REF;
use monorepo::output::{detail, emoji, subrepo};
use monorepo::Monorepo;

use crate::cli::Context;

/// Add a subrepo and sync it
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Remote to clone the subrepo from.
    #[arg(value_name = "URL")]
    pub url: String,

    /// Where the subrepo lives, relative to the monorepo root.
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Branch to track.
    #[arg(value_name = "REF", default_value = DEFAULT_REF)]
    pub r#ref: String,
}

/// Execute the `add` command.
pub fn execute(args: AddArgs, ctx: &Context) -> Result<()> {
    let mut repo = super::open(ctx)?;
    run(&mut repo, &args.url, &args.path, &args.r#ref, ctx)
}

/// Add `{url, path, ref}` to an open monorepo and report the result.
pub(crate) fn run(
    repo: &mut Monorepo,
    url: &str,
    path: &str,
    r#ref: &str,
    ctx: &Context,
) -> Result<()> {
    println!(
        "{} Adding {} ({}) tracking {}",
        emoji(&ctx.out, "➕", "[ADD]"),
        subrepo(&ctx.out, path),
        url,
        r#ref
    );

    let entry = repo
        .add(url, path, r#ref)
        .map_err(|e| super::explain(repo, e))?;

    println!(
        "{} {} pinned to {}",
        emoji(&ctx.out, "✅", "[OK]"),
        subrepo(&ctx.out, &entry.path),
        detail(&ctx.out, entry.revision.as_str())
    );
    Ok(())
}
