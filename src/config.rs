//! # Configuration Model
//!
//! This module defines the two documents that describe a monorepo:
//!
//! - **`Manifest`** (`monorepo.yml`): the desired state, a list of
//!   [`SubrepoSpec`] entries saying which remote and branch each sub-repository
//!   path should track.
//!
//! - **`Lockfile`** (`monorepo.lock`): the actual state, a list of
//!   [`LockedSubrepoSpec`] entries recording the exact revision each path was
//!   last synchronized to.
//!
//! The types are plain data. Lookup follows the documented ambiguity policy:
//! a subrepo matches an identifier when either its path or its URL equals it,
//! and the first match in document order wins.
//!
//! ## Document Format
//!
//! ```yaml
//! repos:
//!   - path: libs/a
//!     url: https://example.com/a.git
//!     ref: master
//! ```
//!
//! The lock document has the same shape with an extra `sha` key per entry.
//! Field order is fixed by the struct definitions, so serializing the same
//! value twice always produces the same bytes.

use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::defaults::{CACHE_DIRNAME, LOCKFILE_FILENAME, MANIFEST_FILENAME};
use crate::error::{Error, Result};

/// An immutable revision identifier (a full commit hash).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A sub-repository the monorepo should contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubrepoSpec {
    /// Location of the working tree, relative to the monorepo root. Unique
    /// within a manifest.
    pub path: String,
    /// The remote to mirror. Several subrepos may share a URL.
    pub url: String,
    /// The branch to track.
    pub r#ref: String,
}

impl SubrepoSpec {
    pub fn new(url: &str, path: &str, r#ref: &str) -> Self {
        Self {
            path: path.to_string(),
            url: url.to_string(),
            r#ref: r#ref.to_string(),
        }
    }

    /// Whether this subrepo is named by `identifier`, either by path or URL.
    pub fn matches(&self, identifier: &str) -> bool {
        self.path == identifier || self.url == identifier
    }
}

/// A sub-repository pinned to the revision it was last synchronized to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedSubrepoSpec {
    pub path: String,
    pub url: String,
    pub r#ref: String,
    /// The revision `ref` resolved to at the last successful sync.
    #[serde(rename = "sha", alias = "revision")]
    pub revision: Revision,
}

impl LockedSubrepoSpec {
    pub fn new(spec: &SubrepoSpec, revision: Revision) -> Self {
        Self {
            path: spec.path.clone(),
            url: spec.url.clone(),
            r#ref: spec.r#ref.clone(),
            revision,
        }
    }

    /// The desired-state part of this entry.
    pub fn spec(&self) -> SubrepoSpec {
        SubrepoSpec {
            path: self.path.clone(),
            url: self.url.clone(),
            r#ref: self.r#ref.clone(),
        }
    }

    /// Whether this entry was locked from exactly `spec` (same path, url and
    /// ref).
    pub fn is_locked_from(&self, spec: &SubrepoSpec) -> bool {
        self.path == spec.path && self.url == spec.url && self.r#ref == spec.r#ref
    }
}

/// The desired-state document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub repos: Vec<SubrepoSpec>,
}

impl Manifest {
    /// Find a subrepo by path or URL. The first match in document order wins.
    pub fn find(&self, identifier: &str) -> Option<&SubrepoSpec> {
        self.repos.iter().find(|spec| spec.matches(identifier))
    }

    /// Find a subrepo by its path only.
    pub fn get(&self, path: &str) -> Option<&SubrepoSpec> {
        self.repos.iter().find(|spec| spec.path == path)
    }

    /// Position of the entry with `path` in document order.
    pub fn position(&self, path: &str) -> Option<usize> {
        self.repos.iter().position(|spec| spec.path == path)
    }

    /// Check that every path can be placed under the monorepo root and that
    /// no two paths name the same directory.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for spec in &self.repos {
            if !seen.insert(normalize_path(&spec.path)?) {
                return Err(Error::DuplicatePath {
                    path: spec.path.clone(),
                });
            }
        }
        Ok(())
    }

    /// Replace the entry with the same path, or append a new one.
    pub fn upsert(&mut self, spec: SubrepoSpec) {
        match self.position(&spec.path) {
            Some(idx) => self.repos[idx] = spec,
            None => self.repos.push(spec),
        }
    }

    /// Remove the entry with `path`, returning it.
    pub fn remove(&mut self, path: &str) -> Option<SubrepoSpec> {
        let idx = self.position(path)?;
        Some(self.repos.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }
}

/// The lock document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(default)]
    pub repos: Vec<LockedSubrepoSpec>,
}

impl Lockfile {
    /// The lock entry for `path`, if any.
    pub fn get(&self, path: &str) -> Option<&LockedSubrepoSpec> {
        self.repos.iter().find(|locked| locked.path == path)
    }

    /// Replace the entry with the same path, or append a new one.
    pub fn upsert(&mut self, locked: LockedSubrepoSpec) {
        match self.repos.iter().position(|l| l.path == locked.path) {
            Some(idx) => self.repos[idx] = locked,
            None => self.repos.push(locked),
        }
    }

    /// Remove the entry with `path`, returning it.
    pub fn remove(&mut self, path: &str) -> Option<LockedSubrepoSpec> {
        let idx = self.repos.iter().position(|l| l.path == path)?;
        Some(self.repos.remove(idx))
    }

    /// Reorder entries to follow the manifest. Entries whose path is not in
    /// the manifest keep their relative order after the others.
    pub fn sort_like(&mut self, manifest: &Manifest) {
        self.repos
            .sort_by_key(|locked| manifest.position(&locked.path).unwrap_or(usize::MAX));
    }

    /// Keep only the entries whose path is in the manifest.
    pub fn retain_manifest(&mut self, manifest: &Manifest) {
        self.repos.retain(|locked| manifest.get(&locked.path).is_some());
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }
}

/// Normalize a subrepo path to its `a/b` form.
///
/// The path must be relative, stay inside the root, stay out of the mirror
/// cache and not shadow one of the two documents.
pub fn normalize_path(path: &str) -> Result<String> {
    let invalid = |reason: &str| Error::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let mut parts = Vec::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                Some(part) => parts.push(part),
                None => return Err(invalid("not valid UTF-8")),
            },
            Component::CurDir => {}
            Component::ParentDir => return Err(invalid("must not contain '..'")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("must be relative to the monorepo root"))
            }
        }
    }

    match parts.first() {
        None => Err(invalid("must not be empty")),
        Some(&first) if first == CACHE_DIRNAME => {
            Err(invalid("must not be inside the mirror cache"))
        }
        Some(&first)
            if parts.len() == 1 && (first == MANIFEST_FILENAME || first == LOCKFILE_FILENAME) =>
        {
            Err(invalid("is reserved for a monorepo document"))
        }
        Some(_) => Ok(parts.join("/")),
    }
}

/// Parse a desired-state document. An empty document is an empty manifest.
pub fn parse_manifest(content: &str) -> Result<Manifest> {
    if content.trim().is_empty() {
        return Ok(Manifest::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

/// Parse a lock document. An empty document is an empty lockfile.
pub fn parse_lockfile(content: &str) -> Result<Lockfile> {
    if content.trim().is_empty() {
        return Ok(Lockfile::default());
    }
    Ok(serde_yaml::from_str(content)?)
}
