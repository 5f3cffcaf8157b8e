//! # Monorepo
//!
//! [`Monorepo`] is the facade the command layer works with. It owns the two
//! documents of a monorepo root and a [`SyncEngine`], and exposes the
//! user-facing operations:
//!
//! - **`status`**: the desired state annotated with pinned revisions.
//! - **`pull`**: synchronize every subrepo concurrently; per-subrepo failures
//!   are collected in a [`PullReport`].
//! - **`pull_sub`**: synchronize one subrepo, found by path or URL.
//! - **`add`**: synchronize a new (or changed) subrepo and, once that worked,
//!   record it in the desired-state document.
//! - **`remove`**: forget a subrepo in both documents.
//! - **`push`** / **`push_sub`**: reserved; they currently do nothing.
//!
//! Single-subrepo operations run on the caller's thread and return the first
//! error they hit.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::{self, LockedSubrepoSpec, Lockfile, Manifest, Revision, SubrepoSpec};
use crate::error::{Error, Result};
use crate::git::{GitBackend, SystemGit};
use crate::store::{self, Layout, LockWriter};
use crate::sync::{PullReport, SyncEngine};

/// One desired-state entry together with its lock entry, if it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubrepoStatus<'a> {
    pub spec: &'a SubrepoSpec,
    pub locked: Option<&'a LockedSubrepoSpec>,
}

impl SubrepoStatus<'_> {
    /// The revision this subrepo is pinned to.
    pub fn revision(&self) -> Option<&Revision> {
        self.locked.map(|l| &l.revision)
    }

    /// Pinned, but from a different url or ref than the one now desired.
    pub fn is_stale(&self) -> bool {
        self.locked.is_some_and(|l| !l.is_locked_from(self.spec))
    }
}

impl fmt::Display for SubrepoStatus<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) - ({})", self.spec.path, self.spec.url, self.spec.r#ref)?;
        if let Some(revision) = self.revision() {
            write!(f, "[{}]", revision)?;
        }
        Ok(())
    }
}

/// A monorepo root: its documents and the engine that keeps them true.
pub struct Monorepo {
    layout: Layout,
    manifest: Manifest,
    lockfile: Option<Lockfile>,
    engine: SyncEngine,
}

impl Monorepo {
    /// Open the monorepo rooted at `root` using the system `git`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_backend(root, Arc::new(SystemGit::new()))
    }

    /// Open the monorepo rooted at `root` with a custom git backend.
    ///
    /// The desired-state document must exist. The lock document is optional.
    pub fn open_with_backend(
        root: impl Into<PathBuf>,
        backend: Arc<dyn GitBackend>,
    ) -> Result<Self> {
        let layout = Layout::new(root);
        let manifest = store::load_manifest(&layout.manifest_path())?;
        let lockfile = store::load_lockfile(&layout.lockfile_path())?;
        debug!(
            "Opened {} with {} subrepo(s), {} pinned",
            layout.root().display(),
            manifest.len(),
            lockfile.as_ref().map_or(0, Lockfile::len)
        );
        Ok(Self::from_parts(layout, manifest, lockfile, backend))
    }

    fn from_parts(
        layout: Layout,
        manifest: Manifest,
        lockfile: Option<Lockfile>,
        backend: Arc<dyn GitBackend>,
    ) -> Self {
        let engine = SyncEngine::new(layout.clone(), backend);
        Self {
            layout,
            manifest,
            lockfile,
            engine,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// The lock document, or `None` if nothing has been pinned yet.
    pub fn lockfile(&self) -> Option<&Lockfile> {
        self.lockfile.as_ref()
    }

    /// Find a subrepo by path or URL. The first match in document order wins.
    pub fn find(&self, identifier: &str) -> Result<&SubrepoSpec> {
        self.manifest
            .find(identifier)
            .ok_or_else(|| Error::SubrepoNotFound {
                identifier: identifier.to_string(),
            })
    }

    /// Every desired-state entry in document order, with its lock entry
    /// matched by path.
    pub fn status(&self) -> Vec<SubrepoStatus<'_>> {
        self.manifest
            .repos
            .iter()
            .map(|spec| SubrepoStatus {
                spec,
                locked: self.lockfile.as_ref().and_then(|l| l.get(&spec.path)),
            })
            .collect()
    }

    /// Synchronize every subrepo.
    ///
    /// Per-subrepo failures do not make this return `Err`; they are listed in
    /// the report. `Err` means the run itself could not complete.
    pub fn pull(&mut self, force: bool) -> Result<PullReport> {
        let current = self.lockfile.clone().unwrap_or_default();
        let (report, lockfile) = self.engine.pull(&self.manifest, current, force)?;

        if self.lockfile.is_some() || !lockfile.is_empty() {
            self.lockfile = Some(lockfile);
        }

        for failure in &report.failures {
            warn!("{}: {}", failure.path, failure.error);
        }
        info!(
            "Pulled {} of {} subrepo(s)",
            report.synced.len(),
            self.manifest.len()
        );
        Ok(report)
    }

    /// Synchronize the subrepo named by `identifier` (path or URL).
    pub fn pull_sub(&mut self, identifier: &str, force: bool) -> Result<LockedSubrepoSpec> {
        let spec = self.find(identifier)?.clone();
        let current = self.lockfile.clone().unwrap_or_default();
        let locked = current.get(&spec.path).cloned();

        let mut writer = LockWriter::new(self.layout.lockfile_path(), current, &self.manifest);
        let entry = self
            .engine
            .sync_subrepo(&spec, locked.as_ref(), force, |entry| writer.apply(entry))?;

        self.lockfile = Some(writer.into_lockfile());
        Ok(entry)
    }

    /// Synchronize `{url, path, ref}` and record it in the desired-state
    /// document, replacing any entry with the same path.
    ///
    /// Nothing is recorded unless the whole pipeline succeeds. A working tree
    /// that already exists at `path` is reset without a dirty check.
    pub fn add(&mut self, url: &str, path: &str, r#ref: &str) -> Result<LockedSubrepoSpec> {
        let path = config::normalize_path(path)?;
        let spec = SubrepoSpec::new(url, &path, r#ref);

        let mut next = self.manifest.clone();
        next.upsert(spec.clone());

        let current = self.lockfile.clone().unwrap_or_default();
        let mut writer = LockWriter::new(self.layout.lockfile_path(), current, &next);
        let entry = self
            .engine
            .sync_subrepo(&spec, None, true, |entry| writer.apply(entry))?;
        let lockfile = writer.into_lockfile();
        self.lockfile = Some(lockfile);

        store::save_manifest(&self.layout.manifest_path(), &next)?;
        self.manifest = next;
        info!("Added {} ({}) tracking {}", spec.path, spec.url, spec.r#ref);
        Ok(entry)
    }

    /// Remove the subrepo named by `identifier` from both documents.
    ///
    /// Its mirror and working tree stay on disk.
    pub fn remove(&mut self, identifier: &str) -> Result<SubrepoSpec> {
        let path = self.find(identifier)?.path.clone();

        let mut next = self.manifest.clone();
        let removed = next.remove(&path).ok_or_else(|| Error::SubrepoNotFound {
            identifier: identifier.to_string(),
        })?;
        store::save_manifest(&self.layout.manifest_path(), &next)?;
        self.manifest = next;

        if let Some(lockfile) = self.lockfile.as_mut() {
            if lockfile.remove(&path).is_some() {
                store::save_lockfile(&self.layout.lockfile_path(), lockfile)?;
            }
        }

        info!("Removed {} ({})", removed.path, removed.url);
        Ok(removed)
    }

    /// Reserved for publishing local subrepo commits. Does nothing yet.
    pub fn push(&self, force: bool) -> Result<()> {
        debug!("push (force: {}) is not implemented; nothing to do", force);
        Ok(())
    }

    /// Reserved for publishing one subrepo's commits. Only the lookup runs.
    pub fn push_sub(&self, identifier: &str, force: bool) -> Result<()> {
        let spec = self.find(identifier)?;
        debug!(
            "push {} (force: {}) is not implemented; nothing to do",
            spec.path, force
        );
        Ok(())
    }
}
