//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures and helper functions to reduce
//! duplication across test files.
//!
//! Subrepo remotes are real git repositories created in temporary
//! directories and referenced by their filesystem path, so no test needs the
//! network. Tests that need `git` return early when it is not installed.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     if should_skip_git_tests() {
//!         return;
//!     }
//!     let remote = RemoteRepo::new();
//!     let fixture = TestFixture::new().with_subrepos(&[("a", &remote, "master")]);
//!     // ... test code
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::should_skip_git_tests;
    #[allow(unused_imports)]
    pub use super::RemoteRepo;
    #[allow(unused_imports)]
    pub use super::TestFixture;
}

/// Check if tests that run `git` should be skipped.
///
/// Returns `true` if no `git` executable can be run.
#[allow(dead_code)]
pub fn should_skip_git_tests() -> bool {
    let available = Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false);
    if !available {
        println!("Skipping test: git is not available");
    }
    !available
}

/// Run `git` in `dir` with a fixed identity, panicking on failure.
fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args([
            "-c",
            "user.name=Monorepo Tests",
            "-c",
            "user.email=tests@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A git repository standing in for a subrepo's remote.
///
/// Created with one commit on `master` adding `README.md`.
#[allow(dead_code)]
pub struct RemoteRepo {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl RemoteRepo {
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        git(temp_dir.path(), &["init", "--quiet"]);
        git(temp_dir.path(), &["symbolic-ref", "HEAD", "refs/heads/master"]);
        let remote = Self { temp_dir };
        remote.commit("README.md", "initial\n");
        remote
    }

    /// The url subrepos use to reach this remote.
    pub fn url(&self) -> String {
        self.temp_dir.path().display().to_string()
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Commit `content` to `file` on the current branch and return the new
    /// commit hash.
    pub fn commit(&self, file: &str, content: &str) -> String {
        self.temp_dir
            .child(file)
            .write_str(content)
            .expect("Failed to write file");
        git(self.path(), &["add", "--all"]);
        git(self.path(), &["commit", "--quiet", "-m", &format!("update {}", file)]);
        self.head()
    }

    /// Create `branch` at the current commit and switch to it.
    pub fn checkout_new_branch(&self, branch: &str) {
        git(self.path(), &["checkout", "--quiet", "-b", branch]);
    }

    pub fn checkout(&self, branch: &str) {
        git(self.path(), &["checkout", "--quiet", branch]);
    }

    /// The commit hash of the current branch.
    pub fn head(&self) -> String {
        git(self.path(), &["rev-parse", "HEAD"])
    }

    /// The commit hash of `branch`.
    pub fn branch_head(&self, branch: &str) -> String {
        git(self.path(), &["rev-parse", &format!("refs/heads/{}", branch)])
    }
}

impl Default for RemoteRepo {
    fn default() -> Self {
        Self::new()
    }
}

/// A test fixture that provides a temporary monorepo root.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new().with_manifest("repos: []\n");
///
/// fixture.command().arg("list").assert().success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `monorepo.yml` with the given content.
    pub fn with_manifest(self, content: &str) -> Self {
        self.temp_dir
            .child("monorepo.yml")
            .write_str(content)
            .expect("Failed to write manifest");
        self
    }

    /// Write `monorepo.yml` listing `(path, remote, ref)` entries in order.
    pub fn with_subrepos(self, subrepos: &[(&str, &RemoteRepo, &str)]) -> Self {
        let content = manifest_yaml(
            &subrepos
                .iter()
                .map(|(path, remote, r#ref)| (path.to_string(), remote.url(), r#ref.to_string()))
                .collect::<Vec<_>>(),
        );
        self.with_manifest(&content)
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path().join("monorepo.yml")
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.path().join("monorepo.lock")
    }

    /// Raw bytes of `monorepo.lock`.
    pub fn lock_bytes(&self) -> Vec<u8> {
        std::fs::read(self.lockfile_path()).expect("Failed to read lock document")
    }

    /// The revision `monorepo.lock` pins `path` to, if any.
    pub fn locked_revision(&self, path: &str) -> Option<String> {
        let content = std::fs::read_to_string(self.lockfile_path()).ok()?;
        let doc: serde_yaml::Value = serde_yaml::from_str(&content).ok()?;
        doc.get("repos")?
            .as_sequence()?
            .iter()
            .find(|entry| entry.get("path").and_then(|p| p.as_str()) == Some(path))?
            .get("sha")?
            .as_str()
            .map(str::to_string)
    }

    /// Content of `file` inside the working tree of subrepo `path`.
    pub fn worktree_file(&self, path: &str, file: &str) -> String {
        std::fs::read_to_string(self.path().join(path).join(file))
            .expect("Failed to read working tree file")
    }

    /// Create a command configured to run in this fixture's directory.
    ///
    /// Environment overrides from the calling shell are cleared.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("monorepo");
        cmd.current_dir(self.path())
            .env_remove("MONOREPO_ROOT")
            .env_remove("MONOREPO_FORCE")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a desired-state document for `(path, url, ref)` entries.
#[allow(dead_code)]
pub fn manifest_yaml(entries: &[(String, String, String)]) -> String {
    let mut yaml = String::from("repos:\n");
    for (path, url, r#ref) in entries {
        yaml.push_str(&format!(
            "- path: {}\n  url: '{}'\n  ref: {}\n",
            path, url, r#ref
        ));
    }
    yaml
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_manifest() {
        let fixture = TestFixture::new().with_manifest("repos: []\n");
        assert!(fixture.manifest_path().exists());
        assert!(fixture.locked_revision("a").is_none());
    }

    #[test]
    fn test_manifest_yaml_is_valid_yaml() {
        let yaml = manifest_yaml(&[(
            "libs/a".to_string(),
            "/tmp/remote a".to_string(),
            "master".to_string(),
        )]);
        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(doc["repos"][0]["url"].as_str(), Some("/tmp/remote a"));
    }
}
