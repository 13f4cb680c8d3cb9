//! Floating IP reassignment helper
//!
//! The FloatingIpHelper is responsible for:
//! - Checking that the target instance owns the configured network interface
//! - Locating the writer VIP among the region's floating IPs
//! - Moving the VIP onto the target interface when someone else holds it
//! - Reporting whether the target instance currently holds the VIP
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   resolve(host)   ┌──────────────────┐
//! │ ConfigSource │ ────────────────▶ │ FloatingIpHelper │
//! └──────────────┘                   └──────────────────┘
//!                                             │
//!                 ┌───────────────────────────┼──────────────────────────┐
//!                 │                           │                          │
//!                 ▼                           ▼                          ▼
//!      ┌────────────────────┐      ┌────────────────────┐     ┌────────────────────┐
//!      │ describe interfaces│      │ describe addresses │     │ associate address  │
//!      │ (owns interface?)  │      │ (who holds VIP?)   │     │ (force, on mismatch│
//!      └────────────────────┘      └────────────────────┘     └────────────────────┘
//! ```
//!
//! ## Decision Flow (`ensure_assigned`)
//!
//! 1. Interface not attached to the instance → `InterfaceNotFound`
//! 2. VIP not in the region's address list → `AddressNotFound`
//! 3. VIP held by the instance → `AlreadyAssigned` (no mutation)
//! 4. VIP unused or held elsewhere → associate with reassociation allowed
//! 5. Association id returned → `Associated`, otherwise `MissingAssociationId`
//!
//! Nothing is cached: every call re-reads provider state. There is no
//! client-side locking, so two hosts racing for the VIP resolve as last
//! writer wins at the provider.

use crate::config::FloatingIpConfig;
use crate::error::{Error, Result};
use crate::registry::ClientRegistry;
use crate::remote::RemoteTarget;
use crate::traits::{AssociateRequest, CloudNetworkClient, ConfigSource, ElasticAddress};
use tracing::{debug, error, info, warn};

/// Result of [`FloatingIpHelper::ensure_assigned`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    /// The VIP was already held by the target instance (no call made)
    AlreadyAssigned,

    /// The VIP was bound to the target interface
    Associated {
        /// Association id returned by the provider
        association_id: String,
        /// Instance that held the VIP before, if any
        previous_instance: Option<String>,
    },

    /// The target instance does not own the configured interface
    InterfaceNotFound,

    /// The VIP does not exist in the configured region
    AddressNotFound,

    /// The associate call succeeded but returned no association id
    MissingAssociationId,
}

impl AssignOutcome {
    /// Whether the target instance holds the VIP after the call
    pub fn is_success(&self) -> bool {
        matches!(self, Self::AlreadyAssigned | Self::Associated { .. })
    }

    /// Whether an associate call was issued and confirmed
    pub fn changed(&self) -> bool {
        matches!(self, Self::Associated { .. })
    }
}

/// Current holder of the writer VIP, as seen by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressStatus {
    /// Held by the target instance
    AssignedToTarget,
    /// Held by some other instance
    AssignedElsewhere {
        /// Current holder
        instance_id: String,
    },
    /// Allocated but not associated with any instance
    Unassigned,
    /// Not present in the region's address list
    Missing,
}

impl AddressStatus {
    /// Whether the target instance holds the VIP
    pub fn is_assigned_to_target(&self) -> bool {
        matches!(self, Self::AssignedToTarget)
    }
}

/// Moves the writer VIP onto one database host
///
/// ## Lifecycle
///
/// 1. Create with [`FloatingIpHelper::connect()`] (or [`FloatingIpHelper::new()`]
///    when the client is built elsewhere)
/// 2. Call [`FloatingIpHelper::ensure_assigned()`] on the promoted primary, or
///    [`FloatingIpHelper::is_assigned()`] to inspect
///
/// Configuration is resolved once and never changes afterwards.
pub struct FloatingIpHelper {
    /// Validated host configuration
    config: FloatingIpConfig,

    /// Connection parameters for companion remote commands
    remote: RemoteTarget,

    /// Provider API client, scoped to `config.region`
    client: Box<dyn CloudNetworkClient>,
}

impl std::fmt::Debug for FloatingIpHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloatingIpHelper")
            .field("config", &self.config)
            .field("remote", &self.remote)
            .field("client", &self.client.provider_name())
            .finish()
    }
}

impl FloatingIpHelper {
    /// Assemble a helper from already-built parts
    pub fn new(
        config: FloatingIpConfig,
        remote: RemoteTarget,
        client: Box<dyn CloudNetworkClient>,
    ) -> Self {
        Self {
            config,
            remote,
            client,
        }
    }

    /// Resolve configuration for `remote.host` and build its client
    ///
    /// # Parameters
    ///
    /// - `remote`: Host identifier plus connection overrides
    /// - `source`: Where host configuration comes from
    /// - `registry`: Client factories, selected by `config.provider`
    ///
    /// # Returns
    ///
    /// - `Ok(FloatingIpHelper)`: Ready to use
    /// - `Err(Error::Config)`: Host configuration is missing or invalid
    pub async fn connect(
        remote: RemoteTarget,
        source: &dyn ConfigSource,
        registry: &ClientRegistry,
    ) -> Result<Self> {
        let config = source.resolve(&remote.host)?;
        debug!(
            "Resolved configuration for host {} from {} source (instance {}, region {})",
            remote.host,
            source.source_name(),
            config.instance_id,
            config.region
        );

        let client = registry.create_client(&config).await?;
        Ok(Self::new(config, remote, client))
    }

    /// Validated configuration
    pub fn config(&self) -> &FloatingIpConfig {
        &self.config
    }

    /// Connection parameters of the host
    pub fn remote(&self) -> &RemoteTarget {
        &self.remote
    }

    /// Make sure the target instance holds the writer VIP
    ///
    /// Associates the VIP with the configured interface when it is unused or
    /// held by another instance, overriding any existing association.
    ///
    /// # Returns
    ///
    /// - `Ok(AssignOutcome)`: What was found and done; see
    ///   [`AssignOutcome::is_success`]
    /// - `Err(Error)`: The provider call failed (auth, throttling, transport)
    pub async fn ensure_assigned(&self) -> Result<AssignOutcome> {
        let instance_id = &self.config.instance_id;
        let interface_id = &self.config.network_interface_id;
        let vip = self.config.writer_vip;

        let interfaces = self
            .client
            .describe_network_interfaces(instance_id, interface_id)
            .await
            .inspect_err(|e| error!("Failed to describe network interfaces: {}", e))?;

        if interfaces.is_empty() {
            warn!(
                "Network interface {} not found on instance {}, aborting",
                interface_id, instance_id
            );
            return Ok(AssignOutcome::InterfaceNotFound);
        }
        info!("Interface {} found on instance {}", interface_id, instance_id);

        let Some(address) = self.find_address().await? else {
            warn!(
                "Elastic IP {} not found in region {}, aborting",
                vip, self.config.region
            );
            return Ok(AssignOutcome::AddressNotFound);
        };

        let previous_instance = match address.instance_id.as_deref() {
            Some(holder) if holder == instance_id => {
                info!(
                    "Instance {} already holds Elastic IP {}, nothing to do",
                    instance_id, vip
                );
                return Ok(AssignOutcome::AlreadyAssigned);
            }
            Some(holder) => {
                info!(
                    "Elastic IP {} is held by instance {}, moving it to instance {}",
                    vip, holder, instance_id
                );
                Some(holder.to_string())
            }
            None => {
                info!(
                    "Elastic IP {} is not in use, attaching it to instance {}",
                    vip, instance_id
                );
                None
            }
        };

        let allocation_id = address.allocation_id.ok_or_else(|| {
            Error::unexpected_response(format!("Elastic IP {} has no allocation id", vip))
        })?;

        let request = AssociateRequest::forced(allocation_id, interface_id.clone());
        let response = self
            .client
            .associate_address(&request)
            .await
            .inspect_err(|e| error!("Failed to associate Elastic IP {}: {}", vip, e))?;

        match response.association_id {
            Some(association_id) => {
                info!(
                    "Elastic IP {} associated with instance {} ({})",
                    vip, instance_id, association_id
                );
                Ok(AssignOutcome::Associated {
                    association_id,
                    previous_instance,
                })
            }
            None => {
                error!(
                    "Provider {} returned no association id for Elastic IP {}",
                    self.client.provider_name(),
                    vip
                );
                Ok(AssignOutcome::MissingAssociationId)
            }
        }
    }

    /// Report who currently holds the writer VIP
    ///
    /// Read-only. Provider failures are returned as errors.
    pub async fn address_status(&self) -> Result<AddressStatus> {
        let vip = self.config.writer_vip;

        let status = match self.find_address().await? {
            None => AddressStatus::Missing,
            Some(address) => match address.instance_id {
                Some(holder) if holder == self.config.instance_id => {
                    AddressStatus::AssignedToTarget
                }
                Some(holder) => AddressStatus::AssignedElsewhere {
                    instance_id: holder,
                },
                None => AddressStatus::Unassigned,
            },
        };

        match &status {
            AddressStatus::AssignedToTarget => info!(
                "Instance {} holds Elastic IP {}",
                self.config.instance_id, vip
            ),
            AddressStatus::AssignedElsewhere { instance_id } => info!(
                "Elastic IP {} is held by instance {}, not {}",
                vip, instance_id, self.config.instance_id
            ),
            AddressStatus::Unassigned => info!(
                "Elastic IP {} is not attached to instance {}",
                vip, self.config.instance_id
            ),
            AddressStatus::Missing => warn!(
                "Elastic IP {} not found in region {}",
                vip, self.config.region
            ),
        }

        Ok(status)
    }

    /// Whether the target instance currently holds the writer VIP
    pub async fn is_assigned(&self) -> Result<bool> {
        Ok(self.address_status().await?.is_assigned_to_target())
    }

    /// Find the writer VIP in the region's address list
    async fn find_address(&self) -> Result<Option<ElasticAddress>> {
        let addresses = self
            .client
            .describe_addresses()
            .await
            .inspect_err(|e| error!("Failed to describe addresses: {}", e))?;

        debug!(
            "Provider {} listed {} address(es) in region {}",
            self.client.provider_name(),
            addresses.len(),
            self.config.region
        );

        Ok(addresses
            .into_iter()
            .find(|address| address.has_public_ip(self.config.writer_vip)))
    }
}
