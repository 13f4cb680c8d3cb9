// # Cloud Network Client Trait
//
// Defines the slice of a cloud networking API the helper relies on:
// describe network interfaces, describe addresses, associate address.
//
// ## Implementations
//
// - AWS EC2: `vip-provider-ec2` crate
// - Tests: an in-memory double in `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use vip_core::traits::{AssociateRequest, CloudNetworkClient};
//
// async fn move_vip(client: &dyn CloudNetworkClient) -> vip_core::Result<()> {
//     let response = client
//         .associate_address(&AssociateRequest::forced("eipalloc-1", "eni-abc"))
//         .await?;
//     println!("association: {:?}", response.association_id);
//     Ok(())
// }
// ```

use crate::config::FloatingIpConfig;
use async_trait::async_trait;
use std::net::Ipv4Addr;

/// A network interface as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    /// Interface id (e.g. `eni-0abc...`)
    pub network_interface_id: String,
    /// Instance the interface is attached to, if any
    pub attached_instance_id: Option<String>,
}

/// A floating (Elastic) IP as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElasticAddress {
    /// Public address
    pub public_ip: String,
    /// Allocation id, required to associate the address
    pub allocation_id: Option<String>,
    /// Instance currently holding the address
    pub instance_id: Option<String>,
    /// Id of the current association
    pub association_id: Option<String>,
    /// Interface currently holding the address
    pub network_interface_id: Option<String>,
}

impl ElasticAddress {
    /// Whether this record describes `ip`
    pub fn has_public_ip(&self, ip: Ipv4Addr) -> bool {
        self.public_ip.trim().parse::<Ipv4Addr>().ok() == Some(ip)
    }
}

/// Parameters of an associate-address call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociateRequest {
    /// Allocation of the floating IP
    pub allocation_id: String,
    /// Interface the address gets bound to
    pub network_interface_id: String,
    /// Replace any existing association
    pub allow_reassociation: bool,
}

impl AssociateRequest {
    /// Request that takes the address away from whoever holds it
    pub fn forced(
        allocation_id: impl Into<String>,
        network_interface_id: impl Into<String>,
    ) -> Self {
        Self {
            allocation_id: allocation_id.into(),
            network_interface_id: network_interface_id.into(),
            allow_reassociation: true,
        }
    }
}

/// Result of an associate-address call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssociateResponse {
    /// New association id; absent means the provider did not confirm the binding
    pub association_id: Option<String>,
}

/// Trait for cloud networking clients
///
/// # Trust Level: Untrusted
///
/// Clients are thin adapters over a provider API:
///
/// ## Allowed Capabilities
/// - ✅ Perform API calls to their provider only
/// - ✅ Translate provider responses into the types above
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (a failover hook must report quickly)
/// - ❌ Decide whether an association is needed (owned by `FloatingIpHelper`)
/// - ❌ Cache provider state between calls (every check re-queries)
/// - ❌ Spawn tasks or threads
///
/// All calls for one client are scoped to the region it was built for.
#[async_trait]
pub trait CloudNetworkClient: Send + Sync {
    /// List network interfaces matching both the attached instance and the interface id
    ///
    /// An empty list means the instance does not currently own the interface.
    async fn describe_network_interfaces(
        &self,
        instance_id: &str,
        network_interface_id: &str,
    ) -> Result<Vec<NetworkInterface>, crate::Error>;

    /// List every floating IP in the client's region
    async fn describe_addresses(&self) -> Result<Vec<ElasticAddress>, crate::Error>;

    /// Bind an allocation to a network interface
    ///
    /// Provider atomicity is the only guard against concurrent callers; the
    /// last successful association wins.
    async fn associate_address(
        &self,
        request: &AssociateRequest,
    ) -> Result<AssociateResponse, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing clients from configuration
#[async_trait]
pub trait CloudNetworkClientFactory: Send + Sync {
    /// Create a client for the region and credentials in `config`
    async fn create(
        &self,
        config: &FloatingIpConfig,
    ) -> Result<Box<dyn CloudNetworkClient>, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_public_ip() {
        let addr = ElasticAddress {
            public_ip: "10.0.0.5".to_string(),
            ..ElasticAddress::default()
        };

        assert!(addr.has_public_ip(Ipv4Addr::new(10, 0, 0, 5)));
        assert!(!addr.has_public_ip(Ipv4Addr::new(10, 0, 0, 50)));
    }

    #[test]
    fn test_forced_request_allows_reassociation() {
        let request = AssociateRequest::forced("eipalloc-1", "eni-abc");
        assert!(request.allow_reassociation);
        assert_eq!(request.network_interface_id, "eni-abc");
    }
}
