//! Public surface for oss-lib.
//!
//! Re-exports the configuration bootstrap and the route-map helpers so
//! services depend on a single crate.

/// Re-export for convenience.
pub use oss_lib_config as config;
/// Re-export for convenience.
pub use oss_lib_routing as routing;

pub use oss_lib_config::{Config, ConfigError, ConfigLoader, ResolvedSources};
