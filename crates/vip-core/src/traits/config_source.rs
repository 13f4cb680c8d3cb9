// # Config Source Trait
//
// Resolves a host identifier into the validated settings the helper needs.
//
// ## Implementations
//
// - `FileConfigSource`: JSON file with a default section and per-host sections
// - `EnvConfigSource`: `VIP_*` environment variables

use crate::config::FloatingIpConfig;

/// Trait for configuration sources
///
/// A source is consulted once, when a helper is constructed. Whatever it
/// returns is immutable for the lifetime of that helper.
pub trait ConfigSource: Send + Sync {
    /// Resolve the configuration for `host`
    ///
    /// # Returns
    ///
    /// - `Ok(FloatingIpConfig)`: All required fields present and well formed
    /// - `Err(Error::Config)`: A required field is missing or malformed
    fn resolve(&self, host: &str) -> Result<FloatingIpConfig, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
