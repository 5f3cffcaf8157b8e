//! Mirror cache: one bare mirror per subrepo under `<root>/.cache/<path>`.
//!
//! Fetching is much cheaper than cloning, so an existing mirror is only ever
//! fetched into. A clone happens when there is no mirror yet (first sync of a
//! subrepo) or when the backend reports that what sits at the mirror location
//! is not a usable repository (deleted or corrupted out of band).

use std::path::Path;

use log::debug;

use crate::config::SubrepoSpec;
use crate::error::{Error, Result, SyncStep};
use crate::git::{FetchOutcome, GitBackend};

/// How a mirror was brought up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheUpdate {
    /// Fetched; nothing changed upstream.
    UpToDate,
    /// Fetched new objects or ref updates.
    Fetched,
    /// Cloned from scratch.
    Cloned,
}

/// Make sure the mirror at `mirror` holds the current history of `spec.url`.
///
/// Errors are tagged `cache-fetch` or `cache-clone`.
pub fn ensure_fresh(
    backend: &dyn GitBackend,
    mirror: &Path,
    spec: &SubrepoSpec,
) -> Result<CacheUpdate> {
    if !mirror.exists() {
        debug!("{}: no mirror at {}, cloning", spec.path, mirror.display());
        return clone(backend, mirror, spec);
    }

    let outcome = backend
        .fetch(mirror, &spec.url)
        .map_err(|e| Error::sync(&spec.path, SyncStep::CacheFetch, e))?;

    match outcome {
        FetchOutcome::AlreadyUpToDate => Ok(CacheUpdate::UpToDate),
        FetchOutcome::Updated => Ok(CacheUpdate::Fetched),
        FetchOutcome::MirrorNotFound => {
            debug!(
                "{}: {} is not a usable mirror, cloning",
                spec.path,
                mirror.display()
            );
            clone(backend, mirror, spec)
        }
    }
}

fn clone(backend: &dyn GitBackend, mirror: &Path, spec: &SubrepoSpec) -> Result<CacheUpdate> {
    backend
        .clone_bare(&spec.url, mirror)
        .map_err(|e| Error::sync(&spec.path, SyncStep::CacheClone, e))?;
    Ok(CacheUpdate::Cloned)
}
