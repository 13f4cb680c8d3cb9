//! Plugin-based client registry
//!
//! The registry lets cloud networking clients be registered by name at
//! runtime, so the helper picks one from configuration instead of through a
//! hardcoded if-else chain.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vip_core::registry::ClientRegistry;
//!
//! let registry = ClientRegistry::new();
//! vip_provider_ec2::register(&registry);
//!
//! // `config.provider` selects the factory ("ec2" by default)
//! let client = registry.create_client(&config).await?;
//! ```

use crate::config::FloatingIpConfig;
use crate::error::{Error, Result};
use crate::traits::{CloudNetworkClient, CloudNetworkClientFactory};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Registry of cloud networking client factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ClientRegistry {
    /// Registered client factories
    clients: RwLock<HashMap<String, Arc<dyn CloudNetworkClientFactory>>>,
}

impl ClientRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client factory
    ///
    /// # Parameters
    ///
    /// - `name`: Client type name (e.g., "ec2")
    /// - `factory`: Factory object for creating client instances
    ///
    /// Registering the same name twice replaces the earlier factory.
    pub fn register_client(
        &self,
        name: impl Into<String>,
        factory: Box<dyn CloudNetworkClientFactory>,
    ) {
        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        clients.insert(name.into(), Arc::from(factory));
    }

    /// Create a client for `config.provider`
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn CloudNetworkClient>)`: Created client
    /// - `Err(Error)`: If the client type is not registered or creation fails
    pub async fn create_client(
        &self,
        config: &FloatingIpConfig,
    ) -> Result<Box<dyn CloudNetworkClient>> {
        let factory = {
            let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
            clients
                .get(&config.provider)
                .cloned()
                .ok_or_else(|| {
                    Error::config(format!("Unknown provider type: {}", config.provider))
                })?
        };

        factory.create(config).await
    }

    /// List all registered client types
    pub fn list_clients(&self) -> Vec<String> {
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = clients.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a client type is registered
    pub fn has_client(&self, name: &str) -> bool {
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        clients.contains_key(name)
    }
}
