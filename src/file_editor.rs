//! # Deterministic File Editor
//!
//! Backs the `edit_file` tool. An edit is described by an [`EditRequest`] and
//! always produces an [`EditOutcome`] carrying the content hash before and after.
//!
//! The editor is built so that the model cannot talk itself into an edit loop:
//!
//! 1.  **No partial edits**: `replace_once` checks the exact match count before
//!     touching anything. A count mismatch is reported, never half-applied.
//! 2.  **Hash-gated writes**: the candidate content is hashed and only written
//!     when the hash differs from the current one. Re-sending an applied edit
//!     reports `changed=false` instead of writing again.
//! 3.  **Optimistic concurrency**: an optional `expect_hash` pins the edit to
//!     the file version the model last saw.
//!
//! Precondition failures that the model can act on (`expect_hash_mismatch`,
//! `match_count_mismatch`, `no_change`) are successful outcomes with a message
//! code. Only malformed requests, unsafe paths and I/O failures are errors.

use crate::error::ToolError;
use crate::hashing::content_hash;
use crate::safe_path;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    /// Replace `old_str` with `new_str` exactly `expect_count` times.
    ReplaceOnce,
    /// Replace the whole file with `new_str`.
    WriteFull,
    /// Append `new_str` to the end of the file.
    Append,
}

impl EditMode {
    fn as_str(self) -> &'static str {
        match self {
            EditMode::ReplaceOnce => "replace_once",
            EditMode::WriteFull => "write_full",
            EditMode::Append => "append",
        }
    }
}

/// Arguments of the `edit_file` tool. A field that is missing, `null` or an
/// empty string counts as "not provided".
#[derive(Deserialize, Debug, Default, Clone)]
pub struct EditRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(default)]
    pub mode: Option<EditMode>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub old_str: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub new_str: String,
    #[serde(default)]
    pub expect_count: Option<usize>,
    #[serde(default)]
    pub expect_hash: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ensure_trailing_newline: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub changed: bool,
    pub old_hash: String,
    pub new_hash: String,
    pub replacements: usize,
    pub message: String,
}

impl EditOutcome {
    fn unchanged(hash: String, message: impl Into<String>) -> Self {
        Self {
            changed: false,
            new_hash: hash.clone(),
            old_hash: hash,
            replacements: 0,
            message: message.into(),
        }
    }
}

/// The result of [`apply_edit`]: the outcome reported to the model plus the
/// before/after content so the caller can show the operator what changed.
#[derive(Debug)]
pub struct AppliedEdit {
    pub path: PathBuf,
    pub outcome: EditOutcome,
    pub previous: Vec<u8>,
    pub current: Vec<u8>,
}

/// Validates a request and returns its mode and effective match count.
fn validate(request: &EditRequest) -> Result<(EditMode, usize), ToolError> {
    let mode = match request.mode {
        Some(mode) if !request.path.is_empty() => mode,
        _ => return Err(ToolError::MissingField("path and mode are required".to_string())),
    };
    if mode == EditMode::ReplaceOnce && request.old_str.is_empty() {
        return Err(ToolError::MissingField(
            "old_str required for mode=replace_once".to_string(),
        ));
    }
    if mode != EditMode::Append && request.new_str.is_empty() {
        return Err(ToolError::MissingField(format!(
            "new_str required for mode={}",
            mode.as_str()
        )));
    }
    let expect_count = match request.expect_count {
        None | Some(0) => 1,
        Some(n) => n,
    };
    Ok((mode, expect_count))
}

/// Applies `request` to a file under `root`.
pub fn apply_edit(root: &Path, request: &EditRequest) -> Result<AppliedEdit> {
    let (mode, expect_count) = validate(request)?;
    let path = safe_path::resolve_in(root, &request.path)?;

    let current = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(anyhow!("Failed to read '{}': {e}", path.display())),
    };
    let old_hash = content_hash(&current);

    let unchanged = |outcome: EditOutcome, current: Vec<u8>| AppliedEdit {
        path: path.clone(),
        outcome,
        previous: current.clone(),
        current,
    };

    if let Some(expected) = request.expect_hash.as_deref().filter(|h| !h.is_empty()) {
        if expected != old_hash {
            debug!(path = %path.display(), "expect_hash does not match current content");
            return Ok(unchanged(
                EditOutcome::unchanged(old_hash, "expect_hash_mismatch"),
                current,
            ));
        }
    }

    let mut replacements = 0;
    let candidate = match mode {
        EditMode::WriteFull => request.new_str.as_bytes().to_vec(),
        EditMode::Append => {
            let mut candidate = current.clone();
            if request.ensure_trailing_newline
                && !candidate.is_empty()
                && !candidate.ends_with(b"\n")
            {
                candidate.push(b'\n');
            }
            candidate.extend_from_slice(request.new_str.as_bytes());
            candidate
        }
        EditMode::ReplaceOnce => {
            let needle = request.old_str.as_bytes();
            let have = count_occurrences(&current, needle);
            if have != expect_count {
                return Ok(unchanged(
                    EditOutcome::unchanged(
                        old_hash,
                        format!("match_count_mismatch: have={have} expect={expect_count}"),
                    ),
                    current,
                ));
            }
            let replaced =
                replace_first_n(&current, needle, request.new_str.as_bytes(), expect_count);
            if replaced == current {
                return Ok(unchanged(EditOutcome::unchanged(old_hash, "no_change"), current));
            }
            replacements = expect_count;
            replaced
        }
    };

    let new_hash = content_hash(&candidate);
    if new_hash == old_hash {
        return Ok(unchanged(EditOutcome::unchanged(old_hash, "no_change"), current));
    }

    write_whole_file(&path, &candidate)?;
    debug!(path = %path.display(), mode = mode.as_str(), "file written");

    let message = match mode {
        EditMode::WriteFull => "wrote_full",
        EditMode::Append => "appended",
        EditMode::ReplaceOnce => "replaced",
    };
    Ok(AppliedEdit {
        path,
        outcome: EditOutcome {
            changed: true,
            old_hash,
            new_hash,
            replacements,
            message: message.to_string(),
        },
        previous: current,
        current: candidate,
    })
}

/// Counts non-overlapping occurrences scanning left to right, so `aa` occurs
/// once in `aaa`.
fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    let mut count = 0;
    let mut start = 0;
    while let Some(pos) = find(&haystack[start..], needle) {
        count += 1;
        start += pos + needle.len();
    }
    count
}

fn replace_first_n(haystack: &[u8], needle: &[u8], replacement: &[u8], n: usize) -> Vec<u8> {
    let mut result = Vec::with_capacity(haystack.len());
    let mut start = 0;
    for _ in 0..n {
        match find(&haystack[start..], needle) {
            Some(pos) => {
                result.extend_from_slice(&haystack[start..start + pos]);
                result.extend_from_slice(replacement);
                start += pos + needle.len();
            }
            None => break,
        }
    }
    result.extend_from_slice(&haystack[start..]);
    result
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Writes `content` as the complete new file content.
///
/// The bytes go to a temporary file in the target directory which is then
/// renamed over the target, so readers see either the old or the new file.
fn write_whole_file(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .map_err(|e| anyhow!("Failed to create directory '{}': {e}", parent.display()))?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| anyhow!("Failed to create temp file in '{}': {e}", parent.display()))?;
    temp_file.write_all(content)?;
    temp_file.flush()?;

    match fs::metadata(path) {
        Ok(metadata) => temp_file
            .as_file()
            .set_permissions(metadata.permissions())?,
        Err(_) => set_new_file_permissions(temp_file.as_file())?,
    }

    temp_file
        .persist(path)
        .map_err(|e| anyhow!("Failed to write '{}': {}", path.display(), e.error))?;
    Ok(())
}

#[cfg(unix)]
fn set_new_file_permissions(file: &fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_new_file_permissions(_file: &fs::File) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "file_editor_tests.rs"]
mod tests;
