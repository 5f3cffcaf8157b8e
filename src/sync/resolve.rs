//! Revision resolution against a freshly updated mirror.
//!
//! Only branch names are resolved (`refs/heads/<ref>`). The mirror must have
//! been brought up to date in the same pipeline run; resolving against a stale
//! mirror would pin an old revision.

use std::path::Path;

use crate::config::{Revision, SubrepoSpec};
use crate::error::{Error, Result, SyncStep};
use crate::git::GitBackend;

/// Resolve `spec.ref` to the revision it names in the mirror at `mirror`.
///
/// Errors are tagged `resolve`.
pub fn resolve(backend: &dyn GitBackend, mirror: &Path, spec: &SubrepoSpec) -> Result<Revision> {
    if spec.r#ref.trim().is_empty() {
        return Err(Error::sync(
            &spec.path,
            SyncStep::Resolve,
            "no branch to track",
        ));
    }

    backend
        .resolve_branch(mirror, &spec.r#ref)
        .map_err(|e| Error::sync(&spec.path, SyncStep::Resolve, e))
}
