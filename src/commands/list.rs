//! # List Command Implementation
//!
//! This module implements the `list` subcommand (alias `ls`), which prints the
//! desired state one subrepo per line, in document order:
//!
//! ```text
//! <path> (<url>) - (<ref>)[<revision>]
//! ```
//!
//! The bracketed revision is present only when the lock document pins that
//! path. This command is read-only and never touches git.

use anyhow::Result;
use clap::Args;

use monorepo::output::{detail, emoji, subrepo};
use monorepo::repository::SubrepoStatus;

use crate::cli::Context;

/// List the subrepos and the revisions they are pinned to
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list subrepos that have no lock entry yet.
    #[arg(long)]
    pub unpinned: bool,
}

/// Execute the `list` command.
pub fn execute(args: ListArgs, ctx: &Context) -> Result<()> {
    let repo = super::open(ctx)?;

    for status in repo.status() {
        if args.unpinned && status.locked.is_some() {
            continue;
        }
        println!("{}", render(&status, ctx));
    }
    Ok(())
}

fn render(status: &SubrepoStatus<'_>, ctx: &Context) -> String {
    let spec = status.spec;
    let mut line = format!(
        "{} ({}) - ({})",
        subrepo(&ctx.out, &spec.path),
        spec.url,
        spec.r#ref
    );
    if let Some(revision) = status.revision() {
        line.push_str(&format!("[{}]", detail(&ctx.out, revision.as_str())));
    }
    if status.is_stale() {
        line.push_str(&format!(
            " {} pinned from a different url or ref",
            emoji(&ctx.out, "⚠️", "[STALE]")
        ));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use monorepo::config::{LockedSubrepoSpec, Revision, SubrepoSpec};
    use monorepo::output::OutputConfig;
    use std::path::PathBuf;

    fn ctx() -> Context {
        Context {
            root: PathBuf::from("."),
            force: false,
            out: OutputConfig::from_env_and_flag("never"),
        }
    }

    #[test]
    fn test_render_pinned_and_unpinned() {
        let spec = SubrepoSpec::new("https://example.com/a.git", "a", "master");
        let locked = LockedSubrepoSpec::new(&spec, Revision::new("abc123"));

        let unpinned = SubrepoStatus {
            spec: &spec,
            locked: None,
        };
        assert_eq!(
            render(&unpinned, &ctx()),
            "a (https://example.com/a.git) - (master)"
        );

        let pinned = SubrepoStatus {
            spec: &spec,
            locked: Some(&locked),
        };
        assert_eq!(
            render(&pinned, &ctx()),
            "a (https://example.com/a.git) - (master)[abc123]"
        );
    }

    #[test]
    fn test_render_stale() {
        let spec = SubrepoSpec::new("https://example.com/a.git", "a", "develop");
        let old = SubrepoSpec::new("https://example.com/a.git", "a", "master");
        let locked = LockedSubrepoSpec::new(&old, Revision::new("abc123"));
        let status = SubrepoStatus {
            spec: &spec,
            locked: Some(&locked),
        };
        assert!(render(&status, &ctx()).ends_with("[STALE] pinned from a different url or ref"));
    }
}
