//! Test doubles and common utilities for helper contract tests
//!
//! `MockCloudNetworkClient` keeps an in-memory view of interfaces and
//! addresses, counts every call, and applies successful associations to its
//! own address table so repeated calls observe the new state.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use vip_core::config::{FloatingIpConfig, RawHostConfig};
use vip_core::error::{Error, Result};
use vip_core::traits::{
    AssociateRequest, AssociateResponse, CloudNetworkClient, CloudNetworkClientFactory,
    ElasticAddress, NetworkInterface,
};
use vip_core::{FloatingIpHelper, RemoteTarget};

pub const TARGET_INSTANCE: &str = "i-123";
pub const TARGET_INTERFACE: &str = "eni-abc";
pub const WRITER_VIP: &str = "10.0.0.5";
pub const WRITER_ALLOCATION: &str = "eipalloc-0005";

/// Which call the mock should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    DescribeInterfaces,
    DescribeAddresses,
    Associate,
}

#[derive(Debug, Default)]
struct MockState {
    interfaces: Vec<NetworkInterface>,
    addresses: Vec<ElasticAddress>,
    associate_requests: Vec<AssociateRequest>,
    describe_interfaces_calls: usize,
    describe_addresses_calls: usize,
    omit_association_id: bool,
    fail_on: Option<FailOn>,
    next_association: usize,
}

/// In-memory cloud networking client that tracks calls
#[derive(Default)]
pub struct MockCloudNetworkClient {
    state: Arc<Mutex<MockState>>,
}

impl MockCloudNetworkClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client that shares state and counters with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            state: Arc::clone(&other.state),
        }
    }

    /// Attach `interface` to `instance`
    pub fn with_interface(self, instance: &str, interface: &str) -> Self {
        self.state.lock().unwrap().interfaces.push(NetworkInterface {
            network_interface_id: interface.to_string(),
            attached_instance_id: Some(instance.to_string()),
        });
        self
    }

    /// Add a floating IP, optionally held by `holder`
    pub fn with_address(self, public_ip: &str, allocation_id: &str, holder: Option<&str>) -> Self {
        self.state.lock().unwrap().addresses.push(ElasticAddress {
            public_ip: public_ip.to_string(),
            allocation_id: Some(allocation_id.to_string()),
            instance_id: holder.map(str::to_string),
            association_id: holder.map(|h| format!("eipassoc-{}", h)),
            network_interface_id: None,
        });
        self
    }

    /// Add a raw address record
    pub fn with_address_record(self, address: ElasticAddress) -> Self {
        self.state.lock().unwrap().addresses.push(address);
        self
    }

    /// Make associate calls succeed without returning an association id
    pub fn without_association_ids(self) -> Self {
        self.state.lock().unwrap().omit_association_id = true;
        self
    }

    /// Make one call fail with a provider error
    pub fn failing_on(self, call: FailOn) -> Self {
        self.state.lock().unwrap().fail_on = Some(call);
        self
    }

    pub fn associate_call_count(&self) -> usize {
        self.state.lock().unwrap().associate_requests.len()
    }

    pub fn associate_requests(&self) -> Vec<AssociateRequest> {
        self.state.lock().unwrap().associate_requests.clone()
    }

    pub fn describe_interfaces_call_count(&self) -> usize {
        self.state.lock().unwrap().describe_interfaces_calls
    }

    pub fn describe_addresses_call_count(&self) -> usize {
        self.state.lock().unwrap().describe_addresses_calls
    }

    /// Instance currently holding `public_ip`
    pub fn holder_of(&self, public_ip: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .addresses
            .iter()
            .find(|a| a.public_ip == public_ip)
            .and_then(|a| a.instance_id.clone())
    }

    fn check_failure(state: &MockState, call: FailOn) -> Result<()> {
        if state.fail_on == Some(call) {
            return Err(Error::provider("mock", format!("injected failure on {:?}", call)));
        }
        Ok(())
    }
}

#[async_trait]
impl CloudNetworkClient for MockCloudNetworkClient {
    async fn describe_network_interfaces(
        &self,
        instance_id: &str,
        network_interface_id: &str,
    ) -> Result<Vec<NetworkInterface>> {
        let mut state = self.state.lock().unwrap();
        state.describe_interfaces_calls += 1;
        Self::check_failure(&state, FailOn::DescribeInterfaces)?;

        Ok(state
            .interfaces
            .iter()
            .filter(|ni| {
                ni.network_interface_id == network_interface_id
                    && ni.attached_instance_id.as_deref() == Some(instance_id)
            })
            .cloned()
            .collect())
    }

    async fn describe_addresses(&self) -> Result<Vec<ElasticAddress>> {
        let mut state = self.state.lock().unwrap();
        state.describe_addresses_calls += 1;
        Self::check_failure(&state, FailOn::DescribeAddresses)?;

        Ok(state.addresses.clone())
    }

    async fn associate_address(&self, request: &AssociateRequest) -> Result<AssociateResponse> {
        let mut state = self.state.lock().unwrap();
        state.associate_requests.push(request.clone());
        Self::check_failure(&state, FailOn::Associate)?;

        if state.omit_association_id {
            return Ok(AssociateResponse::default());
        }

        state.next_association += 1;
        let association_id = format!("eipassoc-new-{}", state.next_association);

        let owner = state
            .interfaces
            .iter()
            .find(|ni| ni.network_interface_id == request.network_interface_id)
            .and_then(|ni| ni.attached_instance_id.clone());

        if let Some(address) = state
            .addresses
            .iter_mut()
            .find(|a| a.allocation_id.as_deref() == Some(request.allocation_id.as_str()))
        {
            address.instance_id = owner;
            address.network_interface_id = Some(request.network_interface_id.clone());
            address.association_id = Some(association_id.clone());
        }

        Ok(AssociateResponse {
            association_id: Some(association_id),
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Factory handing out clients that share state with a template
pub struct MockClientFactory {
    template: MockCloudNetworkClient,
}

impl MockClientFactory {
    pub fn sharing_state_with(client: &MockCloudNetworkClient) -> Self {
        Self {
            template: MockCloudNetworkClient::sharing_state_with(client),
        }
    }
}

#[async_trait]
impl CloudNetworkClientFactory for MockClientFactory {
    async fn create(&self, _config: &FloatingIpConfig) -> Result<Box<dyn CloudNetworkClient>> {
        Ok(Box::new(MockCloudNetworkClient::sharing_state_with(
            &self.template,
        )))
    }
}

/// Raw configuration for the target host
pub fn target_raw_config() -> RawHostConfig {
    RawHostConfig {
        instance_id: Some(TARGET_INSTANCE.to_string()),
        network_interface_id: Some(TARGET_INTERFACE.to_string()),
        access_key_id: Some("AKIAEXAMPLE".to_string()),
        secret_access_key: Some("secret".to_string()),
        region: Some("us-east-1".to_string()),
        writer_vip: Some(WRITER_VIP.to_string()),
        writer_vip_cidr: Some(format!("{}/32", WRITER_VIP)),
        provider: Some("mock".to_string()),
        ..RawHostConfig::default()
    }
}

/// Validated configuration for the target host
pub fn target_config() -> FloatingIpConfig {
    target_raw_config()
        .validate()
        .expect("target configuration is valid")
}

/// Helper for the target host talking to a client sharing `client`'s state
pub fn helper_for(client: &MockCloudNetworkClient) -> FloatingIpHelper {
    FloatingIpHelper::new(
        target_config(),
        RemoteTarget::new("db1"),
        Box::new(MockCloudNetworkClient::sharing_state_with(client)),
    )
}
