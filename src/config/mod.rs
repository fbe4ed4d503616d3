//! Configuration layer for posture-audit.
//!
//! ## Layers
//! - `types`: Configuration type definitions
//! - `loading`: File loading logic
//! - `overrides`: CLI flags applied on top of a loaded config

mod error;
mod loading;
mod overrides;
mod types;

pub use error::ConfigError;
pub use loading::PROJECT_CONFIG_FILES;
pub use overrides::parse_parameter;
pub use types::{CiCdConfig, CloudConfig, Config, DiscoveryConfig, ExternalConfig, IacToolConfig};
