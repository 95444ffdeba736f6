//! Path confinement — every tool path must stay inside the working directory.
//!
//! Resolution is lexical first (`.` and `..` are folded without touching the
//! filesystem), then the deepest existing ancestor is canonicalized so a
//! symlink inside the workspace cannot point a write somewhere else. A
//! dangling symlink counts as existing; its target is checked instead.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

/// Error returned when path resolution fails.
#[derive(Debug, thiserror::Error)]
pub enum PathValidationError {
    #[error("Path '{path}' resolves outside the working directory '{root}'")]
    OutsideRoot { path: String, root: String },

    #[error("Path '{path}' escapes the working directory through a symlink")]
    SymlinkEscape { path: String },

    #[error("Failed to canonicalize path '{path}': {reason}")]
    CanonicalizeFailed { path: String, reason: String },
}

/// Resolve `input` against `root` and reject anything outside it.
///
/// Checks:
/// 1. Relative inputs are joined onto `root`; absolute inputs are taken as-is
/// 2. `..` components are folded lexically and may not climb above `root`
/// 3. The nearest existing ancestor (a dangling symlink included), once
///    symlinks are resolved, is still inside the canonical `root`
///
/// Returns the normalized absolute path on success. Nothing is created.
pub fn resolve_within(root: &Path, input: &str) -> Result<PathBuf, PathValidationError> {
    let root_normalized = normalize(root);
    let candidate = if input.trim().is_empty() {
        root_normalized.clone()
    } else {
        normalize(&root_normalized.join(input))
    };

    if !candidate.starts_with(&root_normalized) {
        debug!(path = input, root = %root.display(), "Rejected path outside root");
        return Err(PathValidationError::OutsideRoot {
            path: input.into(),
            root: root.display().to_string(),
        });
    }

    // A root that does not exist has nothing to resolve symlinks against.
    let Ok(root_canonical) = root_normalized.canonicalize() else {
        return Ok(candidate);
    };

    let ancestor_canonical = canonical_ancestor(&candidate, MAX_SYMLINK_HOPS).map_err(|e| {
        PathValidationError::CanonicalizeFailed {
            path: input.into(),
            reason: e.to_string(),
        }
    })?;

    if !ancestor_canonical.starts_with(&root_canonical) {
        debug!(path = input, "Rejected symlink escape");
        return Err(PathValidationError::SymlinkEscape { path: input.into() });
    }

    Ok(candidate)
}

/// Dangling links followed before giving up, as with `ELOOP`.
const MAX_SYMLINK_HOPS: u32 = 40;

/// Canonical form of the deepest ancestor of `path` that is present on disk.
///
/// Presence uses `symlink_metadata`, so a symlink whose target is missing is
/// still found. Such a link is replaced by its target and the walk repeats.
fn canonical_ancestor(path: &Path, hops: u32) -> std::io::Result<PathBuf> {
    let Some(ancestor) = path
        .ancestors()
        .find(|p| std::fs::symlink_metadata(p).is_ok())
    else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no existing ancestor",
        ));
    };

    match ancestor.canonicalize() {
        Ok(canonical) => Ok(canonical),
        Err(e) if std::fs::symlink_metadata(ancestor)?.file_type().is_symlink() => {
            if hops == 0 {
                return Err(std::io::Error::other(format!(
                    "too many levels of symbolic links: {e}"
                )));
            }
            let target = std::fs::read_link(ancestor)?;
            let target = match ancestor.parent() {
                Some(parent) if target.is_relative() => parent.join(target),
                _ => target,
            };
            debug!(link = %ancestor.display(), target = %target.display(), "Following dangling symlink");
            canonical_ancestor(&normalize(&target), hops - 1)
        }
        Err(e) => Err(e),
    }
}

/// Fold `.` and `..` without consulting the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
