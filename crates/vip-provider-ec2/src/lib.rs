// # AWS EC2 Elastic IP Client
//
// This crate provides the AWS EC2 implementation of `CloudNetworkClient`.
//
// ## Behaviour
//
// - ✅ One EC2 API request per trait call
// - ✅ Full error propagation to the helper
// - ✅ Operation timeout configured (30 seconds)
// - ✅ EC2 error codes mapped to specific errors (auth, throttling)
// - ✅ Dry-run mode using EC2's native `DryRun` flag
// - ❌ NO retries (SDK retry policy disabled; a failover hook reports fast)
// - ❌ NO caching (every call re-reads provider state)
//
// ## Security Requirements
//
// - Access keys NEVER appear in logs or Debug output
// - Credentials come from the resolved host configuration only
//
// ## API Reference
//
// - DescribeNetworkInterfaces (filters `attachment.instance-id`, `network-interface-id`)
// - DescribeAddresses
// - AssociateAddress (`AllocationId`, `NetworkInterfaceId`, `AllowReassociation`)

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ec2::config::Credentials;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::types::{Address, Filter};
use std::time::Duration;
use vip_core::config::FloatingIpConfig;
use vip_core::traits::{
    AssociateRequest, AssociateResponse, CloudNetworkClient, CloudNetworkClientFactory,
    ElasticAddress, NetworkInterface,
};
use vip_core::{ClientRegistry, Error, Result};

/// Registered client type name
pub const PROVIDER_NAME: &str = "ec2";

/// Association id reported for a permitted dry-run association
pub const DRY_RUN_ASSOCIATION_ID: &str = "dry-run";

/// Default timeout for a whole API operation (30 seconds)
const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Name attached to the static credentials we hand to the SDK
const CREDENTIALS_PROVIDER_NAME: &str = "vip-helper";

/// EC2 networking client
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the client will:
/// - Perform all describe calls normally
/// - Send AssociateAddress with `DryRun=true`, so EC2 checks permissions
///   without moving the address
/// - Report a permitted dry run with association id [`DRY_RUN_ASSOCIATION_ID`]
pub struct Ec2NetworkClient {
    /// SDK client, bound to one region and one credentials pair
    client: aws_sdk_ec2::Client,

    /// Region the client talks to
    region: String,

    /// Dry-run mode: validate associations without performing them
    dry_run: bool,
}

// Custom Debug implementation; the SDK client carries the credentials
impl std::fmt::Debug for Ec2NetworkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ec2NetworkClient")
            .field("region", &self.region)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Ec2NetworkClient {
    /// Wrap an existing SDK client
    pub fn new(client: aws_sdk_ec2::Client, region: impl Into<String>, dry_run: bool) -> Self {
        Self {
            client,
            region: region.into(),
            dry_run,
        }
    }

    /// Build a client for the region and static credentials in `config`
    ///
    /// SDK retries are disabled and every operation is bounded by a 30 second
    /// timeout.
    pub async fn from_config(config: &FloatingIpConfig) -> Self {
        let credentials = Credentials::new(
            config.credentials.access_key_id.clone(),
            config.credentials.secret_access_key.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(DEFAULT_OPERATION_TIMEOUT)
                    .build(),
            )
            .load()
            .await;

        Self::new(
            aws_sdk_ec2::Client::new(&sdk_config),
            config.region.clone(),
            config.dry_run,
        )
    }

    /// Region this client is bound to
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Whether associations are only validated
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

#[async_trait]
impl CloudNetworkClient for Ec2NetworkClient {
    async fn describe_network_interfaces(
        &self,
        instance_id: &str,
        network_interface_id: &str,
    ) -> Result<Vec<NetworkInterface>> {
        tracing::debug!(
            "DescribeNetworkInterfaces instance={} interface={} region={}",
            instance_id,
            network_interface_id,
            self.region
        );

        let output = self
            .client
            .describe_network_interfaces()
            .filters(
                Filter::builder()
                    .name("attachment.instance-id")
                    .values(instance_id)
                    .build(),
            )
            .filters(
                Filter::builder()
                    .name("network-interface-id")
                    .values(network_interface_id)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| map_sdk_error("DescribeNetworkInterfaces", e))?;

        Ok(output
            .network_interfaces()
            .iter()
            .filter_map(to_network_interface)
            .collect())
    }

    async fn describe_addresses(&self) -> Result<Vec<ElasticAddress>> {
        tracing::debug!("DescribeAddresses region={}", self.region);

        let output = self
            .client
            .describe_addresses()
            .send()
            .await
            .map_err(|e| map_sdk_error("DescribeAddresses", e))?;

        Ok(output
            .addresses()
            .iter()
            .filter_map(to_elastic_address)
            .collect())
    }

    async fn associate_address(&self, request: &AssociateRequest) -> Result<AssociateResponse> {
        tracing::info!(
            "{} allocation {} with interface {} (reassociation allowed: {})",
            if self.dry_run { "Would associate" } else { "Associating" },
            request.allocation_id,
            request.network_interface_id,
            request.allow_reassociation
        );

        let result = self
            .client
            .associate_address()
            .allocation_id(&request.allocation_id)
            .network_interface_id(&request.network_interface_id)
            .allow_reassociation(request.allow_reassociation)
            .dry_run(self.dry_run)
            .send()
            .await;

        match result {
            Ok(output) => Ok(AssociateResponse {
                association_id: output.association_id().map(str::to_string),
            }),
            Err(e) => match dry_run_response(self.dry_run, e.code()) {
                Some(response) => {
                    tracing::info!(
                        "[DRY-RUN] EC2 accepted association of {} with {}",
                        request.allocation_id,
                        request.network_interface_id
                    );
                    Ok(response)
                }
                None => Err(map_sdk_error("AssociateAddress", e)),
            },
        }
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

fn to_network_interface(ni: &aws_sdk_ec2::types::NetworkInterface) -> Option<NetworkInterface> {
    Some(NetworkInterface {
        network_interface_id: ni.network_interface_id()?.to_string(),
        attached_instance_id: ni
            .attachment()
            .and_then(|a| a.instance_id())
            .map(str::to_string),
    })
}

fn to_elastic_address(address: &Address) -> Option<ElasticAddress> {
    let Some(public_ip) = address.public_ip() else {
        tracing::debug!(
            "Skipping address without public IP (allocation {:?})",
            address.allocation_id()
        );
        return None;
    };

    Some(ElasticAddress {
        public_ip: public_ip.to_string(),
        allocation_id: address.allocation_id().map(str::to_string),
        instance_id: address.instance_id().map(str::to_string),
        association_id: address.association_id().map(str::to_string),
        network_interface_id: address.network_interface_id().map(str::to_string),
    })
}

/// Response reported for a failed associate call in dry-run mode
///
/// EC2 answers a permitted dry-run request with a `DryRunOperation` error.
/// That reply is only a success when the client asked for a dry run.
fn dry_run_response(dry_run: bool, error_code: Option<&str>) -> Option<AssociateResponse> {
    match error_code {
        Some("DryRunOperation") if dry_run => Some(AssociateResponse {
            association_id: Some(DRY_RUN_ASSOCIATION_ID.to_string()),
        }),
        _ => None,
    }
}

fn map_sdk_error<E, R>(operation: &str, err: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(str::to_string);
    let message = DisplayErrorContext(&err).to_string();
    classify_error(operation, code.as_deref(), &message)
}

/// Map an EC2 error code to the helper's error kinds
fn classify_error(operation: &str, code: Option<&str>, message: &str) -> Error {
    match code {
        Some(
            "AuthFailure"
            | "UnauthorizedOperation"
            | "InvalidClientTokenId"
            | "SignatureDoesNotMatch",
        ) => Error::auth(format!("{} rejected: {}", operation, message)),
        Some("RequestLimitExceeded" | "Throttling" | "ThrottlingException") => {
            Error::rate_limited(format!("{} throttled: {}", operation, message))
        }
        _ => Error::provider(PROVIDER_NAME, format!("{} failed: {}", operation, message)),
    }
}

/// Factory for creating EC2 clients
pub struct Ec2ClientFactory;

#[async_trait]
impl CloudNetworkClientFactory for Ec2ClientFactory {
    async fn create(&self, config: &FloatingIpConfig) -> Result<Box<dyn CloudNetworkClient>> {
        if config.dry_run {
            tracing::warn!("EC2 client running in DRY-RUN mode - the Elastic IP will not move");
        }

        Ok(Box::new(Ec2NetworkClient::from_config(config).await))
    }
}

/// Register the EC2 client with a registry
///
/// # Example
///
/// ```rust
/// use vip_core::ClientRegistry;
///
/// let registry = ClientRegistry::new();
/// vip_provider_ec2::register(&registry);
/// assert!(registry.has_client("ec2"));
/// ```
pub fn register(registry: &ClientRegistry) {
    registry.register_client(PROVIDER_NAME, Box::new(Ec2ClientFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::NetworkInterfaceAttachment;
    use vip_core::RawHostConfig;

    fn config(dry_run: bool) -> FloatingIpConfig {
        RawHostConfig {
            instance_id: Some("i-123".to_string()),
            network_interface_id: Some("eni-abc".to_string()),
            access_key_id: Some("AKIASECRET12345".to_string()),
            secret_access_key: Some("secret_key_12345".to_string()),
            region: Some("eu-west-1".to_string()),
            writer_vip: Some("10.0.0.5".to_string()),
            writer_vip_cidr: Some("10.0.0.5/32".to_string()),
            dry_run: Some(dry_run),
            ..RawHostConfig::default()
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_address_conversion() {
        let address = Address::builder()
            .public_ip("10.0.0.5")
            .allocation_id("eipalloc-0005")
            .instance_id("i-999")
            .association_id("eipassoc-1")
            .network_interface_id("eni-999")
            .build();

        let converted = to_elastic_address(&address).unwrap();
        assert_eq!(converted.public_ip, "10.0.0.5");
        assert_eq!(converted.allocation_id.as_deref(), Some("eipalloc-0005"));
        assert_eq!(converted.instance_id.as_deref(), Some("i-999"));
        assert_eq!(converted.network_interface_id.as_deref(), Some("eni-999"));
    }

    #[test]
    fn test_unassociated_address_conversion() {
        let address = Address::builder()
            .public_ip("10.0.0.5")
            .allocation_id("eipalloc-0005")
            .build();

        let converted = to_elastic_address(&address).unwrap();
        assert_eq!(converted.instance_id, None);
        assert_eq!(converted.association_id, None);
    }

    #[test]
    fn test_address_without_public_ip_is_skipped() {
        let address = Address::builder().allocation_id("eipalloc-0005").build();
        assert!(to_elastic_address(&address).is_none());
    }

    #[test]
    fn test_interface_conversion() {
        let ni = aws_sdk_ec2::types::NetworkInterface::builder()
            .network_interface_id("eni-abc")
            .attachment(NetworkInterfaceAttachment::builder().instance_id("i-123").build())
            .build();

        let converted = to_network_interface(&ni).unwrap();
        assert_eq!(converted.network_interface_id, "eni-abc");
        assert_eq!(converted.attached_instance_id.as_deref(), Some("i-123"));

        let detached = aws_sdk_ec2::types::NetworkInterface::builder()
            .network_interface_id("eni-def")
            .build();
        assert_eq!(to_network_interface(&detached).unwrap().attached_instance_id, None);
    }

    #[test]
    fn test_error_classification() {
        assert!(matches!(
            classify_error("DescribeAddresses", Some("AuthFailure"), "bad key"),
            Error::Authentication(_)
        ));
        assert!(matches!(
            classify_error("AssociateAddress", Some("UnauthorizedOperation"), "denied"),
            Error::Authentication(_)
        ));
        assert!(matches!(
            classify_error("DescribeAddresses", Some("RequestLimitExceeded"), "slow down"),
            Error::RateLimited(_)
        ));
        assert!(matches!(
            classify_error("AssociateAddress", Some("InvalidAllocationID.NotFound"), "gone"),
            Error::Provider { .. }
        ));
        assert!(matches!(
            classify_error("DescribeAddresses", None, "dispatch failure"),
            Error::Provider { .. }
        ));
    }

    #[test]
    fn test_classified_errors_are_provider_errors() {
        for code in [Some("AuthFailure"), Some("Throttling"), Some("Unknown"), None] {
            assert!(classify_error("DescribeAddresses", code, "x").is_provider_error());
        }
    }

    #[test]
    fn test_register() {
        let registry = ClientRegistry::new();
        register(&registry);

        assert!(registry.has_client(PROVIDER_NAME));
    }

    #[tokio::test]
    async fn test_factory_creation() {
        let client = Ec2ClientFactory.create(&config(false)).await.unwrap();
        assert_eq!(client.provider_name(), "ec2");
    }

    #[tokio::test]
    async fn test_dry_run_mode() {
        let dry = Ec2NetworkClient::from_config(&config(true)).await;
        let live = Ec2NetworkClient::from_config(&config(false)).await;

        assert!(dry.is_dry_run(), "Dry-run client should have dry_run=true");
        assert!(!live.is_dry_run(), "Live client should have dry_run=false");
        assert_eq!(live.region(), "eu-west-1");
    }

    #[test]
    fn test_dry_run_operation_reported_as_association() {
        let response = dry_run_response(true, Some("DryRunOperation")).unwrap();
        assert_eq!(response.association_id.as_deref(), Some("dry-run"));
    }

    #[test]
    fn test_dry_run_other_errors_stay_errors() {
        assert!(dry_run_response(true, Some("UnauthorizedOperation")).is_none());
        assert!(dry_run_response(true, Some("InvalidAllocationID.NotFound")).is_none());
        assert!(dry_run_response(true, None).is_none());
    }

    #[test]
    fn test_live_call_ignores_dry_run_operation() {
        assert!(dry_run_response(false, Some("DryRunOperation")).is_none());
    }

    #[tokio::test]
    async fn test_credentials_not_exposed_in_debug() {
        let client = Ec2NetworkClient::from_config(&config(false)).await;

        let debug_str = format!("{:?}", client);
        assert!(!debug_str.contains("AKIASECRET12345"));
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("Ec2NetworkClient"));
    }
}
