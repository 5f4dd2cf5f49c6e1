use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Errors raised when the target document cannot be patched.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("start marker {marker:?} not found in document")]
    MissingStart { marker: String },
    #[error("end marker {marker:?} not found after start marker")]
    MissingEnd { marker: String },
}

/// Outcome of committing a [`PendingPatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    Updated,
    Unchanged,
}

/// Replace the first `start … end` section of `text` with `start + body + end`.
///
/// Everything outside the markers is kept byte for byte, so applying the same
/// body twice gives the same document as applying it once.
pub fn patch_section(
    text: &str,
    start: &str,
    end: &str,
    body: &str,
) -> Result<String, PatchError> {
    let start_idx = text.find(start).ok_or_else(|| PatchError::MissingStart {
        marker: start.to_string(),
    })?;
    let after_start = start_idx + start.len();
    let end_idx = text[after_start..]
        .find(end)
        .map(|i| after_start + i + end.len())
        .ok_or_else(|| PatchError::MissingEnd {
            marker: end.to_string(),
        })?;

    let mut out = String::with_capacity(text.len() + body.len());
    out.push_str(&text[..start_idx]);
    out.push_str(start);
    out.push_str(body);
    out.push_str(end);
    out.push_str(&text[end_idx..]);
    Ok(out)
}

/// A document patch computed in memory but not yet written.
#[derive(Debug)]
pub struct PendingPatch {
    path: PathBuf,
    updated: String,
    changed: bool,
}

impl PendingPatch {
    /// Write the patched document (atomically) if its content changed.
    pub fn commit(self) -> anyhow::Result<Injection> {
        if !self.changed {
            tracing::debug!(path = %self.path.display(), "document already up to date");
            return Ok(Injection::Unchanged);
        }
        write_atomic(&self.path, self.updated.as_bytes())?;
        Ok(Injection::Updated)
    }
}

/// Read the document at `path` and patch its section in memory.
///
/// Fails before anything is written if either marker is missing, so callers
/// can validate the document ahead of producing other artifacts.
pub fn prepare_patch(
    path: &Path,
    start: &str,
    end: &str,
    body: &str,
) -> anyhow::Result<PendingPatch> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let updated = patch_section(&text, start, end, body)
        .with_context(|| format!("patch {}", path.display()))?;
    let changed = updated != text;
    Ok(PendingPatch {
        path: path.to_path_buf(),
        updated,
        changed,
    })
}

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => anyhow::bail!("no parent dir for {}", path.display()),
    };
    fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)
        .with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
