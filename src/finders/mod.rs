//! Config file finders.
//!
//! One finder per service type. A finder decides cheaply whether its
//! service is likely present, then locates the service's configuration
//! files (following include directives where the service has them) and
//! stages copies into a fresh directory.
//!
//! Finders only look at paths, names and file contents; nothing from the
//! scanned filesystem is ever executed. Two finders may claim the same file.

pub mod include;
pub mod services;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

use crate::config::DiscoveryConfig;
use crate::discovery::patterns::relative_to_root;
use crate::discovery::{DirectoryWalker, ServicePattern, StagingArea, WalkConfig, resolve_in_root};
use include::IncludeResolver;

/// How many leading bytes are inspected for a content signature.
const SIGNATURE_WINDOW: u64 = 8 * 1024;

/// Depth of the anywhere-name probe used by `check_applicability`.
const PROBE_DEPTH: usize = 4;

/// Confidence that a service is present in a filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Applicability {
    NotApplicable,
    /// Configuration is lying around but nothing says the service is installed.
    Tentative,
    /// A binary, package or state directory of the service exists.
    Firm,
}

impl Applicability {
    pub fn is_applicable(self) -> bool {
        self != Self::NotApplicable
    }
}

/// Locates the configuration files of one service.
pub trait ConfigFileFinder: Send + Sync {
    /// Identifier used as the manifest key.
    fn service_name(&self) -> &str;

    /// Cheap probe deciding whether a full search is worthwhile.
    /// Missing paths yield `NotApplicable`, never an error.
    fn check_applicability(&self, root: &Path) -> Applicability;

    /// Stage the service's configuration files and return the staging
    /// directory, or `None` when nothing was found.
    fn find_configuration_files(&self, root: &Path) -> Option<PathBuf>;

    /// Apply discovery settings before use.
    fn configure(&mut self, _config: &DiscoveryConfig) {}
}

/// A finder driven entirely by a [`ServicePattern`].
pub struct PatternFinder {
    pattern: &'static ServicePattern,
    max_depth: Option<usize>,
    follow_symlinks: bool,
}

impl PatternFinder {
    pub fn new(pattern: &'static ServicePattern) -> Self {
        let defaults = DiscoveryConfig::default();
        Self {
            pattern,
            max_depth: defaults.max_depth,
            follow_symlinks: defaults.follow_symlinks,
        }
    }

    fn walk_config(&self) -> WalkConfig {
        WalkConfig::default()
            .with_max_depth(self.max_depth)
            .with_follow_symlinks(self.follow_symlinks)
    }

    fn in_root(root: &Path, relative: &str) -> PathBuf {
        root.join(relative_to_root(Path::new(relative)))
    }

    fn exists(root: &Path, relative: &str) -> bool {
        resolve_in_root(root, &Self::in_root(root, relative)).is_some()
    }

    fn is_dir(root: &Path, relative: &str) -> bool {
        resolve_in_root(root, &Self::in_root(root, relative)).is_some_and(|p| p.is_dir())
    }

    fn has_signature(&self, root: &Path, path: &Path) -> bool {
        if self.pattern.content_signatures.is_empty() {
            return true;
        }
        let Some(source) = resolve_in_root(root, path) else {
            return false;
        };
        let mut head = Vec::new();
        if let Err(e) = File::open(&source).and_then(|f| f.take(SIGNATURE_WINDOW).read_to_end(&mut head)) {
            debug!(path = %path.display(), error = %e, "Cannot read file for signature");
            return false;
        }
        let head = String::from_utf8_lossy(&head);
        self.pattern
            .content_signatures
            .iter()
            .any(|sig| head.contains(sig))
    }

    /// Files inside the service's well-known config directories.
    fn config_root_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut config = self.walk_config();
        config.root_patterns = self.pattern.config_roots.iter().map(PathBuf::from).collect();
        DirectoryWalker::new(config)
            .walk(root)
            .into_iter()
            .filter(|p| self.pattern.matches(p))
            .collect()
    }

    /// Files elsewhere in the tree carrying one of the service's distinctive names.
    fn anywhere_files(&self, root: &Path, max_depth: Option<usize>) -> Vec<PathBuf> {
        if self.pattern.anywhere_names.is_empty() {
            return Vec::new();
        }
        DirectoryWalker::new(self.walk_config().with_max_depth(max_depth))
            .walk_single(root)
            .into_iter()
            .filter(|p| self.pattern.matches_anywhere(p))
            .filter(|p| !self.pattern.is_in_config_root(p, root))
            .filter(|p| self.has_signature(root, p))
            .collect()
    }

    fn include_bases(&self, root: &Path) -> Vec<PathBuf> {
        self.pattern
            .config_roots
            .iter()
            .filter(|r| Self::is_dir(root, r))
            .map(|r| Self::in_root(root, r))
            .collect()
    }

    /// Every file belonging to the service, sorted.
    pub fn candidates(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: BTreeSet<PathBuf> = self.config_root_files(root).into_iter().collect();
        files.extend(self.anywhere_files(root, self.max_depth));

        if let Some(syntax) = self.pattern.include {
            let seeds: Vec<PathBuf> = files.iter().cloned().collect();
            let resolver = IncludeResolver::new(syntax, root, self.include_bases(root));
            files.extend(resolver.resolve(&seeds));
        }

        files.into_iter().collect()
    }
}

impl ConfigFileFinder for PatternFinder {
    fn service_name(&self) -> &str {
        self.pattern.service
    }

    fn check_applicability(&self, root: &Path) -> Applicability {
        if self.pattern.markers.iter().any(|m| Self::exists(root, m)) {
            return Applicability::Firm;
        }
        if self.pattern.config_roots.iter().any(|r| Self::is_dir(root, r)) {
            return Applicability::Tentative;
        }
        if !self.anywhere_files(root, Some(PROBE_DEPTH)).is_empty() {
            return Applicability::Tentative;
        }
        Applicability::NotApplicable
    }

    fn find_configuration_files(&self, root: &Path) -> Option<PathBuf> {
        let service = self.pattern.service;
        let candidates = self.candidates(root);
        if candidates.is_empty() {
            debug!(service, "No configuration files found");
            return None;
        }
        trace!(service, count = candidates.len(), "Configuration candidates");

        let mut staging = match StagingArea::create(root, service) {
            Ok(staging) => staging,
            Err(e) => {
                warn!(service, error = %e, "Cannot create staging directory");
                return None;
            }
        };
        let staged = staging.stage_all(&candidates);
        info!(service, staged, found = candidates.len(), "Staged configuration files");
        staging.finish()
    }

    fn configure(&mut self, config: &DiscoveryConfig) {
        self.max_depth = config.max_depth;
        self.follow_symlinks = config.follow_symlinks;
    }
}

macro_rules! pattern_finder {
    ($name:ident, $pattern:path) => {
        fn $name() -> Box<dyn ConfigFileFinder> {
            Box::new(PatternFinder::new(&$pattern))
        }
    };
}

pattern_finder!(nginx, services::NGINX);
pattern_finder!(apache, services::APACHE);
pattern_finder!(mysql, services::MYSQL);
pattern_finder!(postgresql, services::POSTGRESQL);
pattern_finder!(redis, services::REDIS);
pattern_finder!(mongodb, services::MONGODB);
pattern_finder!(rabbitmq, services::RABBITMQ);
pattern_finder!(kafka, services::KAFKA);
pattern_finder!(elasticsearch, services::ELASTICSEARCH);
pattern_finder!(haproxy, services::HAPROXY);
pattern_finder!(sshd, services::SSHD);
pattern_finder!(docker, services::DOCKER);

/// Constructors of every built-in finder.
pub static BUILTIN_FINDERS: &[fn() -> Box<dyn ConfigFileFinder>] = &[
    nginx,
    apache,
    mysql,
    postgresql,
    redis,
    mongodb,
    rabbitmq,
    kafka,
    elasticsearch,
    haproxy,
    sshd,
    docker,
];
