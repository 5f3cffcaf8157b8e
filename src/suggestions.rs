//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Following CLI recommendations,
//! errors should tell users what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use monorepo::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Configuration file not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::manifest_not_found(path));
//! ```

use std::path::Path;

use crate::error::Error;

/// Generate an error for when the desired-state document is not found.
///
/// Includes hints about:
/// - Creating the document
/// - Using the --root flag
/// - Using the MONOREPO_ROOT environment variable
pub fn manifest_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Create a monorepo.yml file in your monorepo root (an empty file is enough)\n\
         hint: Use --root to point at a different monorepo root\n\
         hint: Set MONOREPO_ROOT environment variable",
        path = path.display()
    )
}

/// Generate an error for an identifier that names no subrepo.
///
/// Suggests a close match among `known` paths when there is one.
pub fn subrepo_not_found(identifier: &str, known: &[&str]) -> anyhow::Error {
    let did_you_mean = find_similar(identifier, known)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "No such subrepo: '{identifier}'{did_you_mean}\n\n\
         hint: Subrepos are named by their path or their url\n\
         hint: Run 'monorepo list' to see the configured subrepos"
    )
}

/// Generate an error for a pinned working tree with local changes.
pub fn dirty_working_tree(subrepo: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Subrepo '{subrepo}' has uncommitted changes in its working tree\n\n\
         hint: Commit or stash the changes inside '{subrepo}' first\n\
         hint: Use --force (or MONOREPO_FORCE=1) to discard them"
    )
}

/// Generate an error for `pull` given more arguments than it understands.
pub fn pull_too_many_args(count: usize) -> anyhow::Error {
    anyhow::anyhow!(
        "pull takes at most 3 arguments, got {count}\n\n\
         hint: 'monorepo pull' syncs every subrepo\n\
         hint: 'monorepo pull <path-or-url>' syncs one subrepo\n\
         hint: 'monorepo pull <url> <path> [ref]' adds a subrepo"
    )
}

/// Generate the error for a whole-repo pull in which some subrepos failed.
pub fn pull_incomplete(failed: &[&str], needs_recovery: &[&str]) -> anyhow::Error {
    let recovery = if needs_recovery.is_empty() {
        String::new()
    } else {
        format!(
            "\nhint: These working trees may not match monorepo.lock and need a look: {}",
            needs_recovery.join(", ")
        )
    };

    anyhow::anyhow!(
        "{count} subrepo(s) failed to sync: {list}\n\n\
         hint: Re-run 'monorepo pull <path>' for a single subrepo once the cause is fixed\
         {recovery}",
        count = failed.len(),
        list = failed.join(", ")
    )
}

/// Turn a library error into a user-facing error, adding hints where the
/// failure has a known fix.
pub fn explain(error: Error, known: &[&str]) -> anyhow::Error {
    match error {
        Error::ConfigNotFound { path } => manifest_not_found(Path::new(&path)),
        Error::SubrepoNotFound { identifier } => subrepo_not_found(&identifier, known),
        Error::DirtyWorkingTree { subrepo } => dirty_working_tree(&subrepo),
        other => anyhow::Error::new(other),
    }
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0usize; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=a_len {
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] {
                0
            } else {
                1
            };
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[a_len][b_len]
}
