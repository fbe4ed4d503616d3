//! Directory walking abstraction for consistent file discovery.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::trace;
use walkdir::WalkDir;

use super::patterns::relative_to_root;
use super::staging::resolve_in_root;

/// Pseudo filesystems of an extracted image. Only pruned directly below the
/// scanned root; `etc/nginx/conf.d/dev` is ordinary configuration.
pub const PSEUDO_FS_DIRS: &[&str] = &["proc", "sys", "dev"];

/// VCS and dependency trees, pruned at any depth.
pub const VENDORED_DIRS: &[&str] = &[".git", "node_modules"];

/// Whether the directory `dir` of the filesystem scanned at `root` is skipped.
pub fn is_pruned_dir(root: &Path, dir: &Path) -> bool {
    let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if VENDORED_DIRS.contains(&name) {
        return true;
    }
    PSEUDO_FS_DIRS.contains(&name)
        && dir
            .strip_prefix(root)
            .is_ok_and(|relative| relative.components().count() == 1)
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkConfig {
    /// Root patterns to search, relative to the scanned root (e.g., ["etc/nginx"]).
    pub root_patterns: Vec<PathBuf>,
    /// Maximum depth to traverse. None means unlimited.
    pub max_depth: Option<usize>,
    /// Whether to descend into symlinked directories (resolved inside the root).
    pub follow_symlinks: bool,
}

impl WalkConfig {
    /// Create a new WalkConfig with specified patterns.
    pub fn new(patterns: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            root_patterns: patterns.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Set maximum depth.
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set whether to follow symlinks.
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

/// Walks a scanned filesystem and yields candidate files.
///
/// Paths are yielded as the image names them (through any symlinked
/// directories), but every directory read is first resolved inside the
/// scanned root, so nothing outside it is ever listed. Symlinked files are
/// yielded only when they resolve to a regular file inside the root.
pub struct DirectoryWalker {
    config: WalkConfig,
}

impl DirectoryWalker {
    /// Create a new DirectoryWalker with the given configuration.
    pub fn new(config: WalkConfig) -> Self {
        Self { config }
    }

    /// Walk `logical` (a path below `base`) starting at depth `offset`.
    fn walk_dir(
        &self,
        base: &Path,
        logical: &Path,
        offset: usize,
        visited: &mut BTreeSet<PathBuf>,
        found: &mut BTreeSet<PathBuf>,
    ) {
        let Some(dir) = resolve_in_root(base, logical).filter(|d| d.is_dir()) else {
            return;
        };
        if !visited.insert(dir.clone()) {
            trace!(dir = %logical.display(), "Directory already walked");
            return;
        }

        let mut walker = WalkDir::new(&dir).follow_links(false);
        if let Some(depth) = self.config.max_depth {
            if offset >= depth {
                return;
            }
            walker = walker.max_depth(depth - offset);
        }

        let named = |path: &Path| logical.join(path.strip_prefix(&dir).unwrap_or(path));
        let mut linked_dirs = Vec::new();

        for entry in walker
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !e.file_type().is_dir() || !is_pruned_dir(base, &named(e.path()))
            })
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() {
                found.insert(named(entry.path()));
            } else if entry.path_is_symlink() {
                let path = named(entry.path());
                match resolve_in_root(base, &path) {
                    Some(target) if target.is_file() => {
                        found.insert(path);
                    }
                    Some(target) if target.is_dir() && self.config.follow_symlinks => {
                        if !is_pruned_dir(base, &path) {
                            linked_dirs.push((path, offset + entry.depth()));
                        }
                    }
                    _ => trace!(path = %path.display(), "Skipping unresolvable symlink"),
                }
            }
        }

        for (path, depth) in linked_dirs {
            self.walk_dir(base, &path, depth, visited, found);
        }
    }

    /// Walk every configured root pattern below `base_dir`.
    ///
    /// Results are sorted and deduplicated, so overlapping patterns such as
    /// `etc/mysql` and `etc/mysql/conf.d` yield each file once.
    pub fn walk(&self, base_dir: &Path) -> Vec<PathBuf> {
        let mut found = BTreeSet::new();
        for pattern in &self.config.root_patterns {
            let target = base_dir.join(relative_to_root(pattern));
            trace!(dir = %target.display(), "Walking config root");
            // Each pattern is a fresh walk; overlaps are deduplicated by `found`
            let mut visited = BTreeSet::new();
            self.walk_dir(base_dir, &target, 0, &mut visited, &mut found);
        }
        found.into_iter().collect()
    }

    /// Walk a whole scanned root (not using patterns).
    pub fn walk_single(&self, dir: &Path) -> Vec<PathBuf> {
        let mut found = BTreeSet::new();
        self.walk_dir(dir, dir, 0, &mut BTreeSet::new(), &mut found);
        found.into_iter().collect()
    }
}
