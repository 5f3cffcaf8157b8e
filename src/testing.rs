//! In-memory git backend shared by the unit tests.
//!
//! Remotes are maps from branch name to revision. Mirrors are real directories
//! (so existence checks behave as on disk) whose branch maps live in memory.
//! Every call is recorded so tests can assert on fetch/clone behavior.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::Revision;
use crate::error::{Error, Result};
use crate::git::{FetchOutcome, GitBackend};

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch(PathBuf, String),
    Clone(String, PathBuf),
    Resolve(PathBuf, String),
    Reset(PathBuf, Revision),
    IsDirty(PathBuf),
}

type Branches = HashMap<String, Revision>;

#[derive(Default)]
pub struct MockGit {
    remotes: Mutex<HashMap<String, Branches>>,
    unreachable: Mutex<HashSet<String>>,
    mirrors: Mutex<HashMap<PathBuf, Branches>>,
    worktrees: Mutex<HashMap<PathBuf, Revision>>,
    dirty: Mutex<HashSet<PathBuf>>,
    failing_resets: Mutex<HashSet<PathBuf>>,
    calls: Mutex<Vec<Call>>,
}

impl MockGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `branch` of the remote at `url` to `revision`.
    pub fn set_branch(&self, url: &str, branch: &str, revision: &str) {
        self.remotes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .insert(branch.to_string(), Revision::new(revision));
    }

    pub fn set_unreachable(&self, url: &str) {
        self.unreachable.lock().unwrap().insert(url.to_string());
    }

    pub fn set_dirty(&self, worktree: &Path) {
        self.dirty.lock().unwrap().insert(worktree.to_path_buf());
    }

    pub fn fail_reset(&self, worktree: &Path) {
        self.failing_resets
            .lock()
            .unwrap()
            .insert(worktree.to_path_buf());
    }

    /// The revision the working tree at `worktree` was last reset to.
    pub fn worktree_revision(&self, worktree: &Path) -> Option<Revision> {
        self.worktrees.lock().unwrap().get(worktree).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn clone_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Clone(..)))
            .count()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Fetch(..)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn remote(&self, command: &str, url: &str) -> Result<Branches> {
        if self.unreachable.lock().unwrap().contains(url) {
            return Err(Error::GitCommand {
                command: command.to_string(),
                target: url.to_string(),
                stderr: "Could not resolve host".to_string(),
            });
        }
        self.remotes
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::GitCommand {
                command: command.to_string(),
                target: url.to_string(),
                stderr: "repository not found".to_string(),
            })
    }
}

impl GitBackend for MockGit {
    fn fetch(&self, mirror: &Path, url: &str) -> Result<FetchOutcome> {
        self.record(Call::Fetch(mirror.to_path_buf(), url.to_string()));
        let mut mirrors = self.mirrors.lock().unwrap();
        let Some(current) = mirrors.get_mut(mirror).filter(|_| mirror.is_dir()) else {
            return Ok(FetchOutcome::MirrorNotFound);
        };
        let branches = self.remote("fetch", url)?;
        if *current == branches {
            Ok(FetchOutcome::AlreadyUpToDate)
        } else {
            *current = branches;
            Ok(FetchOutcome::Updated)
        }
    }

    fn clone_bare(&self, url: &str, dest: &Path) -> Result<()> {
        self.record(Call::Clone(url.to_string(), dest.to_path_buf()));
        let branches = self.remote("clone --bare", url)?;
        fs::create_dir_all(dest)?;
        self.mirrors
            .lock()
            .unwrap()
            .insert(dest.to_path_buf(), branches);
        Ok(())
    }

    fn resolve_branch(&self, mirror: &Path, branch: &str) -> Result<Revision> {
        self.record(Call::Resolve(mirror.to_path_buf(), branch.to_string()));
        self.mirrors
            .lock()
            .unwrap()
            .get(mirror)
            .and_then(|branches| branches.get(branch))
            .cloned()
            .ok_or_else(|| Error::GitCommand {
                command: "rev-parse".to_string(),
                target: mirror.display().to_string(),
                stderr: format!("branch '{}' not found", branch),
            })
    }

    fn reset_hard(&self, worktree: &Path, _mirror: &Path, revision: &Revision) -> Result<()> {
        self.record(Call::Reset(worktree.to_path_buf(), revision.clone()));
        if self.failing_resets.lock().unwrap().contains(worktree) {
            return Err(Error::GitCommand {
                command: "reset --hard".to_string(),
                target: worktree.display().to_string(),
                stderr: "unable to write new index file".to_string(),
            });
        }
        fs::create_dir_all(worktree)?;
        self.worktrees
            .lock()
            .unwrap()
            .insert(worktree.to_path_buf(), revision.clone());
        self.dirty.lock().unwrap().remove(worktree);
        Ok(())
    }

    fn is_dirty(&self, worktree: &Path, _mirror: &Path) -> Result<bool> {
        self.record(Call::IsDirty(worktree.to_path_buf()));
        Ok(self.dirty.lock().unwrap().contains(worktree))
    }
}
