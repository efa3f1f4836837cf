//! # Safe Path Resolver
//!
//! Every path the model hands to a tool goes through [`resolve`] before the
//! filesystem is touched. Normalization is purely lexical (`.` and `..` are
//! folded without consulting the disk), so a path to a file that does not
//! exist yet can still be validated.

use crate::error::ToolError;
use std::path::{Component, Path, PathBuf};

/// Normalizes `raw` and rejects it if the result is absolute or climbs above
/// the working directory.
///
/// An empty path (or one that folds away entirely, like `a/..`) normalizes to `.`.
pub fn resolve(raw: &str) -> Result<PathBuf, ToolError> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in Path::new(raw).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                return Err(ToolError::UnsafePath(raw.to_string()));
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(ToolError::UnsafePath(raw.to_string()));
                }
            }
            Component::Normal(part) => parts.push(part),
        }
    }

    if parts.is_empty() {
        return Ok(PathBuf::from("."));
    }
    Ok(parts.into_iter().collect())
}

/// Resolves `raw` and joins it onto `root`.
pub fn resolve_in(root: &Path, raw: &str) -> Result<PathBuf, ToolError> {
    let relative = resolve(raw)?;
    if relative == Path::new(".") {
        return Ok(root.to_path_buf());
    }
    Ok(root.join(relative))
}
