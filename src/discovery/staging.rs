//! Per-strategy staging directories.
//!
//! Every finder invocation stages its matches into a fresh temporary
//! directory. The directory is kept on disk after the scan because the
//! packaging stage consumes it; removing it is the caller's job.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace, warn};

use crate::error::{IoOperation, PostureError, Result};

const MAX_SYMLINK_HOPS: usize = 16;

const PARENT: &str = "..";

/// Path components as owned names; `..` is kept, root and `.` are dropped.
fn names(path: &Path) -> impl Iterator<Item = OsString> + '_ {
    path.components().filter_map(|c| match c {
        Component::Normal(name) => Some(name.to_os_string()),
        Component::ParentDir => Some(OsString::from(PARENT)),
        _ => None,
    })
}

/// Resolve `path` inside the scanned `root`, following symlinks the way the
/// image would see them: every component is checked, and absolute link
/// targets are re-rooted onto `root`.
///
/// The result lies under `root` and contains no symlink below it. Returns
/// `None` when `path` is outside the root, or the chain escapes the root,
/// loops, or dangles.
pub fn resolve_in_root(root: &Path, path: &Path) -> Option<PathBuf> {
    let mut pending: VecDeque<OsString> = names(path.strip_prefix(root).ok()?).collect();
    let mut resolved = PathBuf::new();
    let mut hops = 0;

    while let Some(name) = pending.pop_front() {
        if name == PARENT {
            if !resolved.pop() {
                return None;
            }
            continue;
        }

        let candidate = resolved.join(&name);
        let on_disk = root.join(&candidate);
        if !fs::symlink_metadata(&on_disk).ok()?.file_type().is_symlink() {
            resolved = candidate;
            continue;
        }

        hops += 1;
        if hops > MAX_SYMLINK_HOPS {
            return None;
        }
        let target = fs::read_link(&on_disk).ok()?;
        trace!(link = %candidate.display(), target = %target.display(), "Following symlink");
        if target.is_absolute() {
            resolved.clear();
        }
        let rest = std::mem::take(&mut pending);
        pending = names(&target).chain(rest).collect();
    }

    Some(root.join(resolved))
}

/// A temporary directory collecting copies of one strategy's matches.
#[derive(Debug)]
pub struct StagingArea {
    root: PathBuf,
    dir: PathBuf,
    staged: Vec<PathBuf>,
}

impl StagingArea {
    /// Create a uniquely named staging directory for `label`.
    pub fn create(root: &Path, label: &str) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("posture-audit-{label}-"))
            .tempdir()
            .map_err(|e| PostureError::io(std::env::temp_dir(), IoOperation::Create, e))?
            .keep();
        debug!(label, dir = %dir.display(), "Created staging directory");

        Ok(Self {
            root: root.to_path_buf(),
            dir,
            staged: Vec::new(),
        })
    }

    /// The staging directory.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Files staged so far, relative to the staging directory.
    pub fn staged(&self) -> &[PathBuf] {
        &self.staged
    }

    /// Copy one file into the staging area, keeping its path relative to the
    /// scanned root.
    pub fn stage(&mut self, file: &Path) -> Result<PathBuf> {
        let relative = file
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(file.file_name().unwrap_or(file.as_os_str())));

        let source = resolve_in_root(&self.root, file).ok_or_else(|| {
            PostureError::io(
                file,
                IoOperation::Read,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "unresolvable or escaping symlink",
                ),
            )
        })?;
        if !source.is_file() {
            return Err(PostureError::io(
                file,
                IoOperation::Read,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        let destination = self.dir.join(&relative);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PostureError::io(parent, IoOperation::Create, e))?;
        }
        fs::copy(&source, &destination)
            .map_err(|e| PostureError::io(&source, IoOperation::Copy, e))?;

        trace!(file = %relative.display(), "Staged file");
        self.staged.push(relative.clone());
        Ok(relative)
    }

    /// Stage every file, logging and skipping the ones that fail.
    pub fn stage_all<'a>(&mut self, files: impl IntoIterator<Item = &'a PathBuf>) -> usize {
        let mut count = 0;
        for file in files {
            match self.stage(file) {
                Ok(_) => count += 1,
                Err(e) => warn!(file = %file.display(), error = %e, "Skipping file"),
            }
        }
        count
    }

    /// Hand the staging directory over, or remove it when nothing was staged.
    pub fn finish(self) -> Option<PathBuf> {
        if !self.staged.is_empty() {
            return Some(self.dir);
        }
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            debug!(dir = %self.dir.display(), error = %e, "Failed to remove empty staging directory");
        }
        None
    }
}
