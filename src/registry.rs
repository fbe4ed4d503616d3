//! Strategy registry.
//!
//! Each capability kind has a static table of constructors. Asking a
//! [`Registry`] for its strategies builds fresh instances lazily, one per
//! registered constructor, and every call to [`Registry::iter`] starts over.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::cicd::{self, CiCdProvider};
use crate::cloud::{self, CloudProvider};
use crate::external::{self, AdditionalScanProducer};
use crate::finders::{self, ConfigFileFinder};

/// The strategy interfaces the engine dispatches over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    ConfigFileFinder,
    CloudProvider,
    CiCdProvider,
    AdditionalScanProducer,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigFileFinder => write!(f, "config_file_finder"),
            Self::CloudProvider => write!(f, "cloud_provider"),
            Self::CiCdProvider => write!(f, "ci_cd_provider"),
            Self::AdditionalScanProducer => write!(f, "additional_scan_producer"),
        }
    }
}

/// Ordered set of strategy constructors for one capability kind.
pub struct Registry<T: ?Sized> {
    kind: CapabilityKind,
    constructors: Vec<Arc<dyn Fn() -> Box<T> + Send + Sync>>,
}

impl<T: ?Sized> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            constructors: self.constructors.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("len", &self.constructors.len())
            .finish()
    }
}

impl<T: ?Sized> Registry<T> {
    /// Create an empty registry.
    pub fn new(kind: CapabilityKind) -> Self {
        Self {
            kind,
            constructors: Vec::new(),
        }
    }

    /// Create a registry from a static table of plain constructors.
    pub fn from_table(kind: CapabilityKind, table: &[fn() -> Box<T>]) -> Self
    where
        T: 'static,
    {
        let mut registry = Self::new(kind);
        for ctor in table {
            let ctor = *ctor;
            registry = registry.register(move || ctor());
        }
        registry
    }

    /// Add a constructor.
    pub fn register<F>(mut self, ctor: F) -> Self
    where
        F: Fn() -> Box<T> + Send + Sync + 'static,
    {
        self.constructors.push(Arc::new(ctor));
        self
    }

    /// The capability kind this registry serves.
    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    /// Number of registered implementations.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Whether no implementation is registered.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Lazily build one fresh instance per registered implementation.
    pub fn iter(&self) -> impl Iterator<Item = Box<T>> + '_ {
        self.constructors.iter().map(|ctor| ctor())
    }
}

/// Registry of every built-in config file finder.
pub fn default_config_file_finders() -> Registry<dyn ConfigFileFinder> {
    Registry::from_table(CapabilityKind::ConfigFileFinder, finders::BUILTIN_FINDERS)
}

/// Registry of every built-in cloud provider.
pub fn default_cloud_providers() -> Registry<dyn CloudProvider> {
    Registry::from_table(CapabilityKind::CloudProvider, cloud::BUILTIN_PROVIDERS)
}

/// Registry of every built-in CI/CD provider, in check order.
pub fn default_ci_cd_providers() -> Registry<dyn CiCdProvider> {
    Registry::from_table(CapabilityKind::CiCdProvider, cicd::BUILTIN_PROVIDERS)
}

/// Registry of every built-in external scan producer.
pub fn default_additional_scan_producers() -> Registry<dyn AdditionalScanProducer> {
    Registry::from_table(
        CapabilityKind::AdditionalScanProducer,
        external::BUILTIN_PRODUCERS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Named {
        fn name(&self) -> &'static str;
    }

    struct Alpha;
    struct Beta;

    impl Named for Alpha {
        fn name(&self) -> &'static str {
            "alpha"
        }
    }

    impl Named for Beta {
        fn name(&self) -> &'static str {
            "beta"
        }
    }

    fn alpha() -> Box<dyn Named> {
        Box::new(Alpha)
    }

    fn beta() -> Box<dyn Named> {
        Box::new(Beta)
    }

    #[test]
    fn test_one_instance_per_implementation() {
        let registry =
            Registry::<dyn Named>::from_table(CapabilityKind::CiCdProvider, &[alpha, beta]);

        let names: Vec<_> = registry.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), 2);
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn test_iteration_is_restartable() {
        let registry =
            Registry::<dyn Named>::from_table(CapabilityKind::CiCdProvider, &[alpha, beta]);

        let mut first = registry.iter();
        assert_eq!(first.next().map(|s| s.name()), Some("alpha"));

        // A second sequence is independent of the partially consumed first one
        let second: Vec<_> = registry.iter().map(|s| s.name()).collect();
        assert_eq!(second, vec!["alpha", "beta"]);
        assert_eq!(first.next().map(|s| s.name()), Some("beta"));
    }

    #[test]
    fn test_iteration_is_lazy() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let registry = Registry::<dyn Named>::new(CapabilityKind::CloudProvider).register(
            move || -> Box<dyn Named> {
                counter.fetch_add(1, Ordering::SeqCst);
                Box::new(Alpha)
            },
        );

        let iter = registry.iter();
        assert_eq!(built.load(Ordering::SeqCst), 0);
        assert_eq!(iter.count(), 1);
        assert_eq!(built.load(Ordering::SeqCst), 1);

        registry.iter().for_each(drop);
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_registry_yields_nothing() {
        let registry: Registry<dyn Named> = Registry::new(CapabilityKind::AdditionalScanProducer);
        assert!(registry.is_empty());
        assert_eq!(registry.iter().count(), 0);
    }

    #[test]
    fn test_capability_kind_display() {
        assert_eq!(
            CapabilityKind::ConfigFileFinder.to_string(),
            "config_file_finder"
        );
        assert_eq!(
            CapabilityKind::AdditionalScanProducer.to_string(),
            "additional_scan_producer"
        );
    }

    #[test]
    fn test_default_registries_have_unique_identifiers() {
        let finders: Vec<String> = default_config_file_finders()
            .iter()
            .map(|f| f.service_name().to_string())
            .collect();
        let unique: HashSet<_> = finders.iter().collect();
        assert_eq!(unique.len(), finders.len());
        assert!(finders.iter().any(|f| f == "nginx"));

        let clouds: Vec<String> = default_cloud_providers()
            .iter()
            .map(|p| p.get_cloud_provider_name().to_string())
            .collect();
        assert_eq!(clouds, vec!["aws", "gcp", "azure"]);

        let producers: HashSet<String> = default_additional_scan_producers()
            .iter()
            .map(|p| p.identifier().to_string())
            .collect();
        assert_eq!(producers.len(), 3);
        assert!(producers.contains("trivy"));

        assert!(!default_ci_cd_providers().is_empty());
    }
}
