// # vip-core
//
// Core library for moving a database writer VIP (a cloud floating IP) onto
// a newly promoted primary during failover.
//
// ## Architecture Overview
//
// - **CloudNetworkClient**: Trait for the three provider calls the helper needs
// - **ConfigSource**: Trait resolving a host identifier into validated settings
// - **FloatingIpHelper**: Checks and, when needed, moves the VIP to its host
// - **ClientRegistry**: Plugin-based registry for cloud networking clients
// - **RemoteTarget**: Connection parameters for companion remote commands
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Decision logic is separate from provider SDKs
// 2. **Plugin-Based**: Clients are registered by name, no hard-coded if-else
// 3. **Library-First**: Everything the CLI does is available as a library
// 4. **Explicit Outcomes**: Every call ends in a typed outcome or an error
// 5. **Stateless**: Provider state is re-read on every call, never cached

pub mod config;
pub mod error;
pub mod helper;
pub mod registry;
pub mod remote;
pub mod source;
pub mod traits;

// Re-export core types for convenience
pub use config::{AwsCredentials, FloatingIpConfig, Ipv4Cidr, RawHostConfig};
pub use error::{Error, Result};
pub use helper::{AddressStatus, AssignOutcome, FloatingIpHelper};
pub use registry::ClientRegistry;
pub use remote::RemoteTarget;
pub use source::{EnvConfigSource, FileConfigSource};
pub use traits::{CloudNetworkClient, CloudNetworkClientFactory, ConfigSource};
