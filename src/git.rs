//! # Git Backend
//!
//! The narrow set of version-control operations the sync engine needs,
//! expressed as the [`GitBackend`] trait so the engine can be exercised with a
//! mock in tests.
//!
//! [`SystemGit`] is the real implementation. It uses the system `git`
//! command, which automatically handles:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers
//! - Personal access tokens
//! - Any authentication configured in ~/.gitconfig
//!
//! Mirrors are bare repositories. A subrepo's working tree has no `.git` of
//! its own; git commands that touch it run with `--git-dir` pointing at the
//! mirror and `--work-tree` pointing at the tree.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use log::debug;

use crate::config::Revision;
use crate::error::{Error, Result};

/// Refspec fetched into a mirror: every branch, force-updated in place so
/// `refs/heads/<branch>` always reflects the remote after a fetch.
pub const MIRROR_REFSPEC: &str = "+refs/heads/*:refs/heads/*";

/// What happened when fetching into a mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The mirror already had everything the remote has.
    AlreadyUpToDate,
    /// New objects or ref updates were fetched.
    Updated,
    /// There is no usable repository at the mirror location.
    MirrorNotFound,
}

/// Trait for git operations - allows mocking in tests
pub trait GitBackend: Send + Sync {
    /// Fetch all branches of `url` into the bare mirror at `mirror`.
    ///
    /// A missing or unreadable mirror is reported as
    /// [`FetchOutcome::MirrorNotFound`], not as an error.
    fn fetch(&self, mirror: &Path, url: &str) -> Result<FetchOutcome>;

    /// Clone `url` as a bare repository at `dest`.
    fn clone_bare(&self, url: &str, dest: &Path) -> Result<()>;

    /// Resolve the branch `branch` in the mirror to a commit.
    fn resolve_branch(&self, mirror: &Path, branch: &str) -> Result<Revision>;

    /// Move the index and working tree at `worktree` to `revision`,
    /// discarding local changes to tracked files.
    fn reset_hard(&self, worktree: &Path, mirror: &Path, revision: &Revision) -> Result<()>;

    /// Whether tracked files in `worktree` differ from the mirror's index.
    ///
    /// A mirror that is not a usable repository reports a clean tree.
    fn is_dirty(&self, worktree: &Path, mirror: &Path) -> Result<bool>;
}

/// The default implementation of `GitBackend`, which uses the system's
/// `git` command to perform real Git operations.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGit;

impl SystemGit {
    pub fn new() -> Self {
        Self
    }
}

/// Run `git` with `args`, mapping a spawn failure to `Error::GitCommand`.
fn run_git<I, S>(args: I, command: &str, target: &str) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Command::new("git")
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .map_err(|e| Error::GitCommand {
            command: command.to_string(),
            target: target.to_string(),
            stderr: e.to_string(),
        })
}

fn command_failed(command: &str, target: &str, output: &Output) -> Error {
    let stderr = String::from_utf8_lossy(&output.stderr);

    // Provide helpful error message for common auth failures
    let stderr = if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
    {
        format!(
            "Authentication failed. Make sure you have access to the repository.\n\
            For private repos, ensure you have:\n\
            - SSH key added to ssh-agent\n\
            - Git credentials configured\n\
            - Personal access token set up\n\
            Error: {}",
            stderr.trim()
        )
    } else {
        stderr.trim().to_string()
    };

    Error::GitCommand {
        command: command.to_string(),
        target: target.to_string(),
        stderr,
    }
}

/// Arguments for a git command run against `worktree` with `mirror` as its
/// git directory.
fn tree_args<'a>(mirror: &'a Path, worktree: &'a Path, args: &[&'a str]) -> Vec<&'a OsStr> {
    let mut full = vec![
        OsStr::new("--git-dir"),
        mirror.as_os_str(),
        OsStr::new("--work-tree"),
        worktree.as_os_str(),
    ];
    full.extend(args.iter().map(|arg| OsStr::new(*arg)));
    full
}

/// Whether `mirror` holds a repository git can open.
fn is_repository(mirror: &Path) -> bool {
    if !mirror.is_dir() {
        return false;
    }
    let git_dir = mirror.as_os_str();
    Command::new("git")
        .arg("--git-dir")
        .arg(git_dir)
        .args(["rev-parse", "--git-dir"])
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

impl GitBackend for SystemGit {
    fn fetch(&self, mirror: &Path, url: &str) -> Result<FetchOutcome> {
        if !is_repository(mirror) {
            debug!("No repository at {}", mirror.display());
            return Ok(FetchOutcome::MirrorNotFound);
        }

        let output = run_git(
            [
                OsStr::new("--git-dir"),
                mirror.as_os_str(),
                OsStr::new("fetch"),
                OsStr::new("--prune"),
                OsStr::new(url),
                OsStr::new(MIRROR_REFSPEC),
            ],
            "fetch",
            url,
        )?;

        if !output.status.success() {
            return Err(command_failed("fetch", url, &output));
        }

        // git reports ref updates on stderr and stays silent when there are none.
        if output.stderr.iter().all(u8::is_ascii_whitespace) {
            Ok(FetchOutcome::AlreadyUpToDate)
        } else {
            Ok(FetchOutcome::Updated)
        }
    }

    fn clone_bare(&self, url: &str, dest: &Path) -> Result<()> {
        // Remove leftovers of a corrupted mirror (git won't clone into a
        // non-empty dir)
        if dest.exists() {
            fs::remove_dir_all(dest)?;
        }

        // Create parent directory if it doesn't exist
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let output = run_git(
            [
                OsStr::new("clone"),
                OsStr::new("--bare"),
                OsStr::new("--quiet"),
                OsStr::new(url),
                dest.as_os_str(),
            ],
            "clone --bare",
            url,
        )?;

        if !output.status.success() {
            return Err(command_failed("clone --bare", url, &output));
        }
        Ok(())
    }

    fn resolve_branch(&self, mirror: &Path, branch: &str) -> Result<Revision> {
        let target = mirror.display().to_string();
        let spec = format!("refs/heads/{}^{{commit}}", branch);
        let output = run_git(
            [
                OsStr::new("--git-dir"),
                mirror.as_os_str(),
                OsStr::new("rev-parse"),
                OsStr::new("--verify"),
                OsStr::new("--quiet"),
                OsStr::new(&spec),
            ],
            "rev-parse",
            &target,
        )?;

        if !output.status.success() {
            let mut err = command_failed("rev-parse", &target, &output);
            if let Error::GitCommand { stderr, .. } = &mut err {
                if stderr.is_empty() {
                    *stderr = format!("branch '{}' not found", branch);
                }
            }
            return Err(err);
        }

        let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Revision::new(sha))
    }

    fn reset_hard(&self, worktree: &Path, mirror: &Path, revision: &Revision) -> Result<()> {
        let target = worktree.display().to_string();
        fs::create_dir_all(worktree)?;

        // Detach HEAD first so the reset moves no branch in the mirror.
        let output = run_git(
            tree_args(mirror, worktree, &["update-ref", "--no-deref", "HEAD", revision.as_str()]),
            "update-ref HEAD",
            &target,
        )?;
        if !output.status.success() {
            return Err(command_failed("update-ref HEAD", &target, &output));
        }

        let output = run_git(
            tree_args(mirror, worktree, &["reset", "--hard", "--quiet", revision.as_str()]),
            "reset --hard",
            &target,
        )?;
        if !output.status.success() {
            return Err(command_failed("reset --hard", &target, &output));
        }
        Ok(())
    }

    fn is_dirty(&self, worktree: &Path, mirror: &Path) -> Result<bool> {
        // Without a readable mirror there is no index to compare against; the
        // pipeline will re-clone before touching the tree.
        if !is_repository(mirror) {
            return Ok(false);
        }

        let target = worktree.display().to_string();
        let output = run_git(
            tree_args(
                mirror,
                worktree,
                &["status", "--porcelain", "--untracked-files=no"],
            ),
            "status",
            &target,
        )?;

        if !output.status.success() {
            return Err(command_failed("status", &target, &output));
        }
        Ok(!output.stdout.iter().all(u8::is_ascii_whitespace))
    }
}
