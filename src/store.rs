//! # Configuration Store
//!
//! Loading and saving the desired-state and lock documents, and the on-disk
//! layout of a monorepo root.
//!
//! ## Layout
//!
//! ```text
//! <root>/
//!   monorepo.yml        desired state
//!   monorepo.lock       locked state (optional)
//!   .cache/<path>/      one bare mirror per subrepo
//!   <path>/             one working tree per subrepo
//! ```
//!
//! ## Consistency
//!
//! A missing desired-state document is fatal; a missing lock document just
//! means nothing has been pinned yet. Documents are written to a sibling
//! temporary file and renamed into place.
//!
//! During a whole-repo pull many subrepos finish at nearly the same time and
//! each one has to persist its own lock entry. Rewriting the lock document from
//! several threads would lose updates, so all writes go through a single
//! [`LockWriter`] that owns the in-memory lockfile. Workers talk to it through
//! a cloneable [`LockHandle`] and block until their entry is on disk.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use log::debug;
use serde::Serialize;

use crate::config::{self, LockedSubrepoSpec, Lockfile, Manifest};
use crate::defaults::{CACHE_DIRNAME, LOCKFILE_FILENAME, MANIFEST_FILENAME};
use crate::error::{Error, Result};

/// Paths of everything a monorepo keeps under its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILENAME)
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.root.join(LOCKFILE_FILENAME)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(CACHE_DIRNAME)
    }

    /// Location of the bare mirror for the subrepo at `subrepo`.
    pub fn mirror_path(&self, subrepo: &str) -> PathBuf {
        self.cache_dir().join(subrepo)
    }

    /// Location of the working tree for the subrepo at `subrepo`.
    pub fn worktree_path(&self, subrepo: &str) -> PathBuf {
        self.root.join(subrepo)
    }
}

/// Load and validate the desired-state document.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::ConfigNotFound {
                path: path.display().to_string(),
            })
        }
        Err(e) => return Err(Error::Io(e)),
    };

    let manifest = config::parse_manifest(&content).map_err(|e| Error::ConfigParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    manifest.validate()?;
    Ok(manifest)
}

/// Load the lock document, or `None` if there is none yet.
pub fn load_lockfile(path: &Path) -> Result<Option<Lockfile>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No lock document at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(Error::Io(e)),
    };

    config::parse_lockfile(&content)
        .map(Some)
        .map_err(|e| Error::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

pub fn save_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    write_document(path, manifest)
}

pub fn save_lockfile(path: &Path, lockfile: &Lockfile) -> Result<()> {
    write_document(path, lockfile)
}

fn write_document<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    let write_error = |message: String| Error::ConfigWrite {
        path: path.display().to_string(),
        message,
    };

    let yaml = serde_yaml::to_string(document).map_err(|e| write_error(e.to_string()))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, yaml).map_err(|e| write_error(e.to_string()))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(write_error(e.to_string()));
    }

    debug!("Wrote {}", path.display());
    Ok(())
}

/// The only writer of the lock document while it is alive.
///
/// Entries are kept in manifest order so that the document's bytes depend only
/// on its content, never on which subrepo finished first.
pub struct LockWriter<'a> {
    path: PathBuf,
    lockfile: Lockfile,
    manifest: &'a Manifest,
}

impl<'a> LockWriter<'a> {
    pub fn new(path: PathBuf, lockfile: Lockfile, manifest: &'a Manifest) -> Self {
        Self {
            path,
            lockfile,
            manifest,
        }
    }

    /// Record `entry` and persist the whole document.
    ///
    /// If the write fails the in-memory lockfile is rolled back, so it keeps
    /// describing what is on disk.
    pub fn apply(&mut self, entry: LockedSubrepoSpec) -> Result<()> {
        let previous = self.lockfile.clone();
        self.lockfile.upsert(entry);
        self.lockfile.sort_like(self.manifest);

        if self.lockfile == previous && self.path.exists() {
            return Ok(());
        }

        if let Err(e) = save_lockfile(&self.path, &self.lockfile) {
            self.lockfile = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Drop entries whose path is no longer in the manifest and persist the
    /// result. Returns the number of entries dropped.
    pub fn prune(&mut self) -> Result<usize> {
        let previous = self.lockfile.clone();
        self.lockfile.retain_manifest(self.manifest);
        let dropped = previous.len() - self.lockfile.len();
        if dropped == 0 {
            return Ok(0);
        }

        if let Err(e) = save_lockfile(&self.path, &self.lockfile) {
            self.lockfile = previous;
            return Err(e);
        }
        debug!("Dropped {} lock entr(ies) no longer in the manifest", dropped);
        Ok(dropped)
    }

    /// Serve updates until every [`LockHandle`] is dropped, then hand the
    /// writer back.
    pub fn run(mut self, updates: mpsc::Receiver<LockUpdate>) -> Self {
        for update in updates {
            let result = self.apply(update.entry);
            // The worker may have gone away; nothing to report to then.
            let _ = update.ack.send(result);
        }
        self
    }

    pub fn into_lockfile(self) -> Lockfile {
        self.lockfile
    }
}

/// One lock entry on its way to the [`LockWriter`].
pub struct LockUpdate {
    entry: LockedSubrepoSpec,
    ack: mpsc::Sender<Result<()>>,
}

/// Cloneable sending side of the lock writer's queue.
#[derive(Clone)]
pub struct LockHandle {
    tx: mpsc::Sender<LockUpdate>,
}

impl LockHandle {
    /// Queue `entry` and wait until the writer has persisted it.
    pub fn record(&self, entry: LockedSubrepoSpec) -> Result<()> {
        let (ack, done) = mpsc::channel();
        self.tx
            .send(LockUpdate { entry, ack })
            .map_err(|_| Error::WorkerPanicked {
                context: "lock writer stopped before accepting an entry".to_string(),
            })?;
        done.recv().map_err(|_| Error::WorkerPanicked {
            context: "lock writer stopped before acknowledging an entry".to_string(),
        })?
    }
}

/// Create the queue feeding a [`LockWriter::run`] loop.
pub fn lock_channel() -> (LockHandle, mpsc::Receiver<LockUpdate>) {
    let (tx, rx) = mpsc::channel();
    (LockHandle { tx }, rx)
}
