//! Built-in CI/CD providers.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use super::CiCdProvider;
use crate::discovery::{is_pruned_dir, resolve_in_root};

/// Bytes of a YAML file inspected for the Tekton API group.
const TEKTON_WINDOW: u64 = 4 * 1024;

/// Something in the tree proving a CI/CD system is configured.
#[derive(Debug, Clone, Copy)]
pub enum Marker {
    /// A directory whose path ends with these components.
    Dir(&'static str),
    /// A file whose path ends with these components.
    File(&'static str),
    /// A file whose name contains this lowercase text.
    NameContains(&'static str),
    /// A YAML file below a directory of this name mentioning `tekton.dev`.
    TektonResource(&'static str),
}

impl Marker {
    fn matches(&self, root: &Path, entry: &DirEntry) -> bool {
        let path = entry.path();
        let is_dir = entry.file_type().is_dir();
        match *self {
            Marker::Dir(suffix) => is_dir && path.ends_with(suffix),
            Marker::File(suffix) => !is_dir && path.ends_with(suffix),
            Marker::NameContains(needle) => {
                !is_dir
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|n| n.to_lowercase().contains(needle))
            }
            Marker::TektonResource(dir) => {
                !is_dir
                    && path
                        .extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e == "yaml" || e == "yml")
                    && path
                        .parent()
                        .is_some_and(|p| p.components().any(|c| c.as_os_str() == dir))
                    && mentions_tekton(root, path)
            }
        }
    }
}

fn mentions_tekton(root: &Path, path: &Path) -> bool {
    let Some(source) = resolve_in_root(root, path) else {
        return false;
    };
    let mut head = Vec::new();
    File::open(source)
        .and_then(|f| f.take(TEKTON_WINDOW).read_to_end(&mut head))
        .is_ok()
        && String::from_utf8_lossy(&head).contains("tekton.dev")
}

/// A provider recognised by the presence of marker paths.
#[derive(Debug, Clone)]
pub struct MarkerProvider {
    pub name: &'static str,
    pub markers: &'static [Marker],
}

impl CiCdProvider for MarkerProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn detect(&self, root: &Path, max_depth: usize) -> bool {
        WalkDir::new(root)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !e.file_type().is_dir() || !is_pruned_dir(root, e.path())
            })
            .filter_map(|e| e.ok())
            .any(|entry| self.markers.iter().any(|m| m.matches(root, &entry)))
    }
}

pub static GITHUB_ACTIONS: MarkerProvider = MarkerProvider {
    name: "github_actions",
    markers: &[Marker::Dir(".github/workflows")],
};

pub static GITLAB_CI: MarkerProvider = MarkerProvider {
    name: "gitlab_ci",
    markers: &[Marker::File(".gitlab-ci.yml")],
};

pub static JENKINS: MarkerProvider = MarkerProvider {
    name: "jenkins",
    markers: &[Marker::NameContains("jenkinsfile")],
};

pub static CIRCLECI: MarkerProvider = MarkerProvider {
    name: "circleci",
    markers: &[Marker::File(".circleci/config.yml")],
};

pub static AZURE_PIPELINES: MarkerProvider = MarkerProvider {
    name: "azure_pipelines",
    markers: &[
        Marker::File("azure-pipelines.yml"),
        Marker::File("azure-pipelines.yaml"),
    ],
};

pub static BITBUCKET_PIPELINES: MarkerProvider = MarkerProvider {
    name: "bitbucket_pipelines",
    markers: &[Marker::File("bitbucket-pipelines.yml")],
};

pub static TRAVIS_CI: MarkerProvider = MarkerProvider {
    name: "travis_ci",
    markers: &[Marker::File(".travis.yml")],
};

pub static DRONE: MarkerProvider = MarkerProvider {
    name: "drone",
    markers: &[Marker::File(".drone.yml")],
};

pub static BUILDKITE: MarkerProvider = MarkerProvider {
    name: "buildkite",
    markers: &[Marker::Dir(".buildkite")],
};

pub static TEKTON: MarkerProvider = MarkerProvider {
    name: "tekton",
    markers: &[Marker::TektonResource(".tekton")],
};
