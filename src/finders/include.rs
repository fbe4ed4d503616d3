//! Following include directives from matched configuration files.

use regex::Regex;
use std::collections::{BTreeSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, trace};

use crate::discovery::patterns::{has_wildcard, normalize, relative_to_root, wildcard_regex};
use crate::discovery::{DirectoryWalker, IncludeSyntax, WalkConfig, resolve_in_root};

static NGINX_INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*include\s+([^;#]+?)\s*;").unwrap());

static APACHE_INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?mi)^\s*Include(?:Optional)?\s+("[^"]+"|'[^']+'|\S+)"#).unwrap());

/// Upper bound on files pulled in through includes for one finder.
const MAX_INCLUDED_FILES: usize = 512;

/// Resolves include directives transitively inside a scanned root.
pub struct IncludeResolver<'a> {
    syntax: IncludeSyntax,
    root: &'a Path,
    bases: Vec<PathBuf>,
}

impl<'a> IncludeResolver<'a> {
    /// `bases` are directories relative includes are tried against, in
    /// addition to the directory of the including file.
    pub fn new(syntax: IncludeSyntax, root: &'a Path, bases: Vec<PathBuf>) -> Self {
        Self {
            syntax,
            root,
            bases,
        }
    }

    /// Extract the raw targets of every include directive in `content`.
    pub fn directives(&self, content: &str) -> Vec<String> {
        let regex = match self.syntax {
            IncludeSyntax::Nginx => &*NGINX_INCLUDE,
            IncludeSyntax::Apache => &*APACHE_INCLUDE,
        };
        regex
            .captures_iter(content)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim_matches(['"', '\'']).to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Follow includes starting from `seeds`; returns files not among the seeds.
    pub fn resolve(&self, seeds: &[PathBuf]) -> Vec<PathBuf> {
        let mut visited: BTreeSet<PathBuf> = seeds.iter().cloned().collect();
        let mut queue: VecDeque<PathBuf> = seeds.iter().cloned().collect();
        let mut discovered = Vec::new();

        while let Some(file) = queue.pop_front() {
            let Some(content) = self.read(&file) else {
                continue;
            };
            for target in self.directives(&content) {
                for included in self.expand(&file, &target) {
                    if discovered.len() >= MAX_INCLUDED_FILES {
                        debug!(limit = MAX_INCLUDED_FILES, "Include limit reached");
                        return discovered;
                    }
                    if visited.insert(included.clone()) {
                        trace!(from = %file.display(), file = %included.display(), "Included file");
                        discovered.push(included.clone());
                        queue.push_back(included);
                    }
                }
            }
        }

        discovered
    }

    fn read(&self, file: &Path) -> Option<String> {
        let source = resolve_in_root(self.root, file)?;
        match fs::read_to_string(&source) {
            Ok(content) => Some(content),
            Err(e) => {
                debug!(file = %file.display(), error = %e, "Cannot read file for includes");
                None
            }
        }
    }

    /// Turn one directive target into existing files inside the root.
    fn expand(&self, including: &Path, target: &str) -> Vec<PathBuf> {
        let target_path = Path::new(target);
        let candidates: Vec<PathBuf> = if target_path.is_absolute() {
            vec![self.root.join(relative_to_root(target_path))]
        } else {
            including
                .parent()
                .into_iter()
                .map(Path::to_path_buf)
                .chain(self.bases.iter().cloned())
                .map(|base| base.join(target_path))
                .collect()
        };

        let mut files = BTreeSet::new();
        for candidate in candidates {
            let Some(relative) = candidate
                .strip_prefix(self.root)
                .ok()
                .and_then(normalize)
            else {
                debug!(target, "Include escapes the scanned root");
                continue;
            };
            files.extend(self.glob(&self.root.join(relative)));
        }
        files.into_iter().collect()
    }

    /// Expand a wildcard in the last component, or a directory include.
    fn glob(&self, candidate: &Path) -> Vec<PathBuf> {
        let Some(name) = candidate.file_name().and_then(|n| n.to_str()) else {
            return Vec::new();
        };
        let parent = candidate.parent().unwrap_or(self.root);

        if parent
            .strip_prefix(self.root)
            .ok()
            .and_then(Path::to_str)
            .is_some_and(has_wildcard)
        {
            debug!(path = %candidate.display(), "Wildcards are only expanded in the file name");
            return Vec::new();
        }

        if has_wildcard(name) {
            let pattern = match wildcard_regex(name) {
                Ok(pattern) => pattern,
                Err(e) => {
                    debug!(path = %candidate.display(), error = %e, "Invalid include wildcard");
                    return Vec::new();
                }
            };
            let Some(dir) = resolve_in_root(self.root, parent) else {
                debug!(dir = %parent.display(), "Include directory does not resolve inside the root");
                return Vec::new();
            };
            let Ok(entries) = fs::read_dir(&dir) else {
                return Vec::new();
            };
            let mut matched: Vec<PathBuf> = entries
                .flatten()
                .filter(|e| e.file_name().to_str().is_some_and(|n| pattern.is_match(n)))
                .map(|e| parent.join(e.file_name()))
                .filter(|p| self.is_file_in_root(p))
                .collect();
            matched.sort();
            return matched;
        }

        if resolve_in_root(self.root, candidate).is_some_and(|p| p.is_dir()) {
            // Apache includes every file below a directory
            let Ok(relative) = candidate.strip_prefix(self.root) else {
                return Vec::new();
            };
            return DirectoryWalker::new(WalkConfig::new([relative])).walk(self.root);
        }

        if self.is_file_in_root(candidate) {
            vec![candidate.to_path_buf()]
        } else {
            Vec::new()
        }
    }

    fn is_file_in_root(&self, path: &Path) -> bool {
        resolve_in_root(self.root, path).is_some_and(|p| p.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn nginx_root() -> TempDir {
        let dir = TempDir::new().unwrap();
        let nginx = dir.path().join("etc/nginx");
        fs::create_dir_all(nginx.join("conf.d")).unwrap();
        fs::create_dir_all(dir.path().join("opt/app")).unwrap();
        fs::write(
            nginx.join("nginx.conf"),
            "http {\n    include /etc/nginx/conf.d/*.conf;\n    include /opt/app/app.nginx;\n}\n",
        )
        .unwrap();
        fs::write(nginx.join("conf.d/a.conf"), "include snippets.inc;\n").unwrap();
        fs::write(nginx.join("conf.d/b.conf"), "server {}\n").unwrap();
        fs::write(nginx.join("conf.d/snippets.inc"), "# loop back\ninclude a.conf;\n").unwrap();
        fs::write(dir.path().join("opt/app/app.nginx"), "server {}\n").unwrap();
        dir
    }

    #[test]
    fn test_nginx_directives() {
        let root = TempDir::new().unwrap();
        let resolver = IncludeResolver::new(IncludeSyntax::Nginx, root.path(), Vec::new());
        let targets = resolver.directives(
            "include mime.types;\n  include \"/etc/nginx/sites-enabled/*\";\n# include ignored;\n",
        );
        assert_eq!(targets, vec!["mime.types", "/etc/nginx/sites-enabled/*"]);
    }

    #[test]
    fn test_apache_directives() {
        let root = TempDir::new().unwrap();
        let resolver = IncludeResolver::new(IncludeSyntax::Apache, root.path(), Vec::new());
        let targets = resolver.directives(
            "ServerRoot \"/etc/httpd\"\nInclude conf.modules.d/*.conf\nIncludeOptional \"conf.d/*.conf\"\ninclude extra.conf\n",
        );
        assert_eq!(
            targets,
            vec!["conf.modules.d/*.conf", "conf.d/*.conf", "extra.conf"]
        );
    }

    #[test]
    fn test_resolve_follows_transitively_and_stops_on_cycles() {
        let root = nginx_root();
        let seed = root.path().join("etc/nginx/nginx.conf");
        let resolver = IncludeResolver::new(IncludeSyntax::Nginx, root.path(), Vec::new());

        let found = resolver.resolve(std::slice::from_ref(&seed));
        let names: BTreeSet<_> = found
            .iter()
            .map(|p| p.strip_prefix(root.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(found.len(), 4);
        assert!(names.contains(Path::new("etc/nginx/conf.d/a.conf")));
        assert!(names.contains(Path::new("etc/nginx/conf.d/b.conf")));
        assert!(names.contains(Path::new("etc/nginx/conf.d/snippets.inc")));
        assert!(names.contains(Path::new("opt/app/app.nginx")));
    }

    #[test]
    fn test_relative_include_uses_bases() {
        let dir = TempDir::new().unwrap();
        let httpd = dir.path().join("etc/httpd");
        fs::create_dir_all(httpd.join("conf")).unwrap();
        fs::create_dir_all(httpd.join("conf.d")).unwrap();
        fs::write(httpd.join("conf/httpd.conf"), "IncludeOptional conf.d/*.conf\n").unwrap();
        fs::write(httpd.join("conf.d/ssl.conf"), "SSLEngine on\n").unwrap();

        let resolver = IncludeResolver::new(IncludeSyntax::Apache, dir.path(), vec![httpd.clone()]);
        let found = resolver.resolve(&[httpd.join("conf/httpd.conf")]);
        assert_eq!(found, vec![httpd.join("conf.d/ssl.conf")]);
    }

    #[test]
    fn test_directory_include() {
        let dir = TempDir::new().unwrap();
        let apache = dir.path().join("etc/apache2");
        fs::create_dir_all(apache.join("extra/nested")).unwrap();
        fs::write(apache.join("apache2.conf"), "Include extra/\n").unwrap();
        fs::write(apache.join("extra/one.conf"), "").unwrap();
        fs::write(apache.join("extra/nested/two.conf"), "").unwrap();

        let resolver = IncludeResolver::new(IncludeSyntax::Apache, dir.path(), Vec::new());
        let found = resolver.resolve(&[apache.join("apache2.conf")]);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_escaping_include_is_ignored() {
        let dir = TempDir::new().unwrap();
        let nginx = dir.path().join("etc/nginx");
        fs::create_dir_all(&nginx).unwrap();
        fs::write(nginx.join("nginx.conf"), "include ../../../../../../etc/passwd;\n").unwrap();

        let resolver = IncludeResolver::new(IncludeSyntax::Nginx, dir.path(), Vec::new());
        assert!(resolver.resolve(&[nginx.join("nginx.conf")]).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_include_directory_stays_inside_root() {
        let dir = TempDir::new().unwrap();
        let host = TempDir::new().unwrap();
        fs::write(host.path().join("secret.conf"), "HOST SECRET\n").unwrap();

        let nginx = dir.path().join("etc/nginx");
        fs::create_dir_all(&nginx).unwrap();
        fs::write(
            nginx.join("nginx.conf"),
            "include /etc/nginx/linked/*.conf;\ninclude /etc/nginx/linked;\n",
        )
        .unwrap();
        std::os::unix::fs::symlink(host.path(), nginx.join("linked")).unwrap();

        let resolver = IncludeResolver::new(IncludeSyntax::Nginx, dir.path(), Vec::new());
        assert!(resolver.resolve(&[nginx.join("nginx.conf")]).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_include_directory_is_rerooted() {
        let dir = TempDir::new().unwrap();
        let nginx = dir.path().join("etc/nginx");
        fs::create_dir_all(&nginx).unwrap();
        fs::create_dir_all(dir.path().join("srv/sites")).unwrap();
        fs::write(dir.path().join("srv/sites/app.conf"), "server {}\n").unwrap();
        fs::write(nginx.join("nginx.conf"), "include /etc/nginx/sites/*.conf;\n").unwrap();
        std::os::unix::fs::symlink("/srv/sites", nginx.join("sites")).unwrap();

        let resolver = IncludeResolver::new(IncludeSyntax::Nginx, dir.path(), Vec::new());
        let found = resolver.resolve(&[nginx.join("nginx.conf")]);
        assert_eq!(found, vec![nginx.join("sites/app.conf")]);
    }
}
