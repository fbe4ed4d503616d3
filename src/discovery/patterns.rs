//! File patterns describing where each service keeps its configuration.

use regex::Regex;
use std::path::{Component, Path, PathBuf};

/// Syntax of a service's include directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeSyntax {
    /// `include path/*.conf;`
    Nginx,
    /// `Include conf.d/*.conf` and `IncludeOptional ...`
    Apache,
}

/// A declarative description of one service's configuration layout.
#[derive(Debug, Clone)]
pub struct ServicePattern {
    /// Service identifier.
    pub service: &'static str,
    /// Paths whose presence means the service is installed (binaries, state dirs).
    pub markers: &'static [&'static str],
    /// Well-known configuration directories, relative to the scanned root.
    pub config_roots: &'static [&'static str],
    /// File names matched inside config roots.
    pub file_names: &'static [&'static str],
    /// File extensions matched inside config roots.
    pub extensions: &'static [&'static str],
    /// Distinctive file names matched anywhere in the tree.
    pub anywhere_names: &'static [&'static str],
    /// Substrings, one of which must appear near the top of a file matched
    /// by `anywhere_names`. Empty means the name alone is enough.
    pub content_signatures: &'static [&'static str],
    /// Include directive followed from matched files.
    pub include: Option<IncludeSyntax>,
}

impl ServicePattern {
    /// Check if a file inside one of the config roots belongs to the service.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        if self.file_names.contains(&file_name) || self.anywhere_names.contains(&file_name) {
            return true;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext))
    }

    /// Check if a file found outside the config roots carries a distinctive name.
    pub fn matches_anywhere(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.anywhere_names.contains(&name))
    }

    /// Check if a path is within one of the config roots.
    pub fn is_in_config_root(&self, path: &Path, base: &Path) -> bool {
        self.config_roots
            .iter()
            .any(|root| path.starts_with(base.join(relative_to_root(Path::new(root)))))
    }
}

/// Strip root and `.` components so an absolute in-image path can be joined
/// onto the scanned root. `..` is kept; see [`is_contained`].
pub fn relative_to_root(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_) | Component::ParentDir))
        .collect()
}

/// Lexically collapse `.` and `..`; `None` if `..` climbs above the start.
pub fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    Some(out)
}

/// Whether a relative path stays inside whatever directory it is joined onto.
pub fn is_contained(path: &Path) -> bool {
    normalize(path).is_some()
}

/// Whether a path component contains shell-style wildcards.
pub fn has_wildcard(component: &str) -> bool {
    component.contains(['*', '?'])
}

/// Compile a shell-style wildcard (`*`, `?`) into an anchored regex.
pub fn wildcard_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re)
}
