//! Configuration source implementations
//!
//! - [`FileConfigSource`]: JSON file, default section plus per-host sections
//! - [`EnvConfigSource`]: `VIP_*` environment variables

pub mod env;
pub mod file;

pub use env::EnvConfigSource;
pub use file::FileConfigSource;
