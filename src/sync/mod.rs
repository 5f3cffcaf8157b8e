//! # Sync Engine
//!
//! Synchronizes subrepos with their remotes. Each subrepo goes through the
//! same strictly sequential pipeline, with no retries:
//!
//! 1.  **Cache update** (`mirror`): fetch into the subrepo's bare mirror, or
//!     clone it if there is none.
//! 2.  **Revision resolution** (`resolve`): turn the tracked branch into a
//!     commit hash using the mirror that was just updated.
//! 3.  **Checkout**: hard-reset the subrepo's working tree to that commit.
//! 4.  **Lock update**: persist `{path, url, ref, revision}` in the lock
//!     document.
//!
//! A failure stops the pipeline for that subrepo and is reported with the
//! subrepo path and the step tag. Only after step 4 does the lock document
//! describe the working tree again.
//!
//! ## Whole-repo pull
//!
//! [`SyncEngine::pull`] runs the pipeline for every manifest entry on the
//! rayon thread pool. Tasks never wait on each other: mirrors, working trees
//! and lock slots are disjoint because paths are unique. Lock entries go to a
//! single [`LockWriter`] thread as soon as each subrepo finishes, and task
//! outcomes come back over a channel. Every task runs to completion whatever
//! its siblings do; the engine returns once all of them and the writer have
//! finished.

pub mod mirror;
pub mod resolve;

use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;

use log::{debug, info};
use rayon::prelude::*;

use crate::config::{LockedSubrepoSpec, Lockfile, Manifest, Revision, SubrepoSpec};
use crate::error::{Error, Result, SyncStep};
use crate::git::GitBackend;
use crate::store::{self, Layout, LockWriter};

pub use mirror::CacheUpdate;

/// A subrepo that failed to synchronize.
#[derive(Debug)]
pub struct SyncFailure {
    pub path: String,
    pub error: Error,
}

impl SyncFailure {
    /// The pipeline step that failed, if the failure came from the pipeline.
    pub fn step(&self) -> Option<SyncStep> {
        self.error.sync_step()
    }

    /// Whether the working tree may no longer match the lock document.
    pub fn requires_manual_recovery(&self) -> bool {
        self.step().is_some_and(SyncStep::requires_manual_recovery)
    }
}

/// Outcome of a whole-repo pull, in manifest order.
#[derive(Debug, Default)]
pub struct PullReport {
    /// Subrepos that reached the lock update.
    pub synced: Vec<LockedSubrepoSpec>,
    /// Subrepos that stopped at some step.
    pub failures: Vec<SyncFailure>,
}

impl PullReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_paths(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.path.as_str()).collect()
    }
}

/// Runs the per-subrepo pipeline against a monorepo layout.
#[derive(Clone)]
pub struct SyncEngine {
    layout: Layout,
    backend: Arc<dyn GitBackend>,
}

impl SyncEngine {
    pub fn new(layout: Layout, backend: Arc<dyn GitBackend>) -> Self {
        Self { layout, backend }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Step 1: bring the subrepo's mirror up to date.
    pub fn ensure_fresh(&self, spec: &SubrepoSpec) -> Result<CacheUpdate> {
        let mirror = self.layout.mirror_path(&spec.path);
        mirror::ensure_fresh(self.backend.as_ref(), &mirror, spec)
    }

    /// Step 2: resolve the tracked branch in the mirror.
    pub fn resolve(&self, spec: &SubrepoSpec) -> Result<Revision> {
        let mirror = self.layout.mirror_path(&spec.path);
        resolve::resolve(self.backend.as_ref(), &mirror, spec)
    }

    /// Step 3: hard-reset the working tree to `revision`.
    ///
    /// Errors are tagged `checkout`. A failure here can leave the tree half
    /// reset.
    pub fn checkout(&self, spec: &SubrepoSpec, revision: &Revision) -> Result<()> {
        let mirror = self.layout.mirror_path(&spec.path);
        let worktree = self.layout.worktree_path(&spec.path);
        self.backend
            .reset_hard(&worktree, &mirror, revision)
            .map_err(|e| Error::sync(&spec.path, SyncStep::Checkout, e))
    }

    /// Steps 1 to 3. The returned entry still has to be persisted.
    pub fn run(&self, spec: &SubrepoSpec) -> Result<LockedSubrepoSpec> {
        let update = self.ensure_fresh(spec)?;
        debug!("{}: cache updated ({:?})", spec.path, update);

        let revision = self.resolve(spec)?;
        debug!("{}: {} resolved to {}", spec.path, spec.r#ref, revision);

        self.checkout(spec, &revision)?;
        debug!("{}: checked out {}", spec.path, revision);

        Ok(LockedSubrepoSpec::new(spec, revision))
    }

    /// Refuse to touch a pinned working tree that has uncommitted changes,
    /// unless `force` is set.
    ///
    /// Subrepos without a lock entry, mirror or working tree have nothing a
    /// reset could discard.
    pub fn check_clean(
        &self,
        spec: &SubrepoSpec,
        locked: Option<&LockedSubrepoSpec>,
        force: bool,
    ) -> Result<()> {
        if force || locked.is_none() {
            return Ok(());
        }
        let mirror = self.layout.mirror_path(&spec.path);
        let worktree = self.layout.worktree_path(&spec.path);
        if !mirror.is_dir() || !worktree.is_dir() {
            return Ok(());
        }
        if self.backend.is_dirty(&worktree, &mirror)? {
            return Err(Error::DirtyWorkingTree {
                subrepo: spec.path.clone(),
            });
        }
        Ok(())
    }

    /// The whole pipeline for one subrepo, with `persist` as step 4.
    pub fn sync_subrepo<F>(
        &self,
        spec: &SubrepoSpec,
        locked: Option<&LockedSubrepoSpec>,
        force: bool,
        persist: F,
    ) -> Result<LockedSubrepoSpec>
    where
        F: FnOnce(LockedSubrepoSpec) -> Result<()>,
    {
        self.check_clean(spec, locked, force)?;
        let entry = self.run(spec)?;
        persist(entry.clone()).map_err(|e| Error::sync(&spec.path, SyncStep::LockPersist, e))?;
        info!("{}: synced to {}", spec.path, entry.revision);
        Ok(entry)
    }

    /// Synchronize every subrepo in `manifest` concurrently.
    ///
    /// `lockfile` is the current lock state; the lock state after the pull is
    /// returned alongside the report.
    pub fn pull(
        &self,
        manifest: &Manifest,
        lockfile: Lockfile,
        force: bool,
    ) -> Result<(PullReport, Lockfile)> {
        let snapshot = lockfile.clone();
        let writer = LockWriter::new(self.layout.lockfile_path(), lockfile, manifest);
        let (handle, updates) = store::lock_channel();
        let (results_tx, results_rx) = mpsc::channel();

        let mut writer = thread::scope(|scope| {
            let writer = scope.spawn(move || writer.run(updates));

            manifest.repos.par_iter().for_each_with(
                (handle, results_tx),
                |(handle, results), spec| {
                    let outcome =
                        self.sync_subrepo(spec, snapshot.get(&spec.path), force, |entry| {
                            handle.record(entry)
                        });
                    // The receiver outlives every task.
                    let _ = results.send((spec.path.clone(), outcome));
                },
            );

            writer.join()
        })
        .map_err(|_| Error::WorkerPanicked {
            context: "lock writer".to_string(),
        })?;

        let mut outcomes: HashMap<String, Result<LockedSubrepoSpec>> =
            results_rx.into_iter().collect();

        let mut report = PullReport::default();
        for spec in &manifest.repos {
            match outcomes.remove(&spec.path) {
                Some(Ok(entry)) => report.synced.push(entry),
                Some(Err(error)) => report.failures.push(SyncFailure {
                    path: spec.path.clone(),
                    error,
                }),
                None => report.failures.push(SyncFailure {
                    path: spec.path.clone(),
                    error: Error::WorkerPanicked {
                        context: format!("no result for '{}'", spec.path),
                    },
                }),
            }
        }

        // A fully successful pull leaves exactly the desired paths pinned.
        if report.is_success() {
            writer.prune()?;
        }

        Ok((report, writer.into_lockfile()))
    }
}
