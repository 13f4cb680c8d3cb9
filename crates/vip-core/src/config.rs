//! Configuration types for the VIP helper
//!
//! Configuration arrives loosely typed ([`RawHostConfig`], every field
//! optional) from a [`crate::ConfigSource`] and is turned into a validated
//! [`FloatingIpConfig`] by [`RawHostConfig::validate`]. Once validated, the
//! configuration is immutable for the lifetime of a helper.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Client type used when a host does not name one
pub const DEFAULT_PROVIDER: &str = "ec2";

/// Static access key pair for the cloud API
///
/// The Debug implementation intentionally does NOT expose either key.
#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    /// Access key id
    /// ⚠️ NEVER log this value
    pub access_key_id: String,

    /// Secret access key
    /// ⚠️ NEVER log this value
    pub secret_access_key: String,
}

impl AwsCredentials {
    /// Create a credentials pair
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &"<REDACTED>")
            .field("secret_access_key", &"<REDACTED>")
            .finish()
    }
}

/// An IPv4 network in `a.b.c.d/n` notation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
    /// Address part as written
    pub address: Ipv4Addr,
    /// Prefix length (0..=32)
    pub prefix_len: u8,
}

impl Ipv4Cidr {
    /// Netmask for the prefix length
    pub fn netmask(&self) -> Ipv4Addr {
        let bits = if self.prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(self.prefix_len))
        };
        Ipv4Addr::from(bits)
    }

    /// Whether `ip` falls inside this network
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let mask = u32::from(self.netmask());
        u32::from(self.address) & mask == u32::from(ip) & mask
    }
}

impl FromStr for Ipv4Cidr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (address, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| Error::config(format!("CIDR '{}' is missing a '/<prefix>' suffix", s)))?;

        let address: Ipv4Addr = address
            .parse()
            .map_err(|e| Error::config(format!("CIDR '{}' has an invalid address: {}", s, e)))?;
        let prefix_len: u8 = prefix
            .parse()
            .map_err(|e| Error::config(format!("CIDR '{}' has an invalid prefix: {}", s, e)))?;

        if prefix_len > 32 {
            return Err(Error::config(format!(
                "CIDR '{}' prefix must be between 0 and 32",
                s
            )));
        }

        Ok(Self {
            address,
            prefix_len,
        })
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

/// Validated configuration for one database host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatingIpConfig {
    /// Instance that should hold the writer VIP
    pub instance_id: String,

    /// Network interface of that instance the VIP gets bound to
    pub network_interface_id: String,

    /// API credentials
    pub credentials: AwsCredentials,

    /// Provider region the VIP lives in
    pub region: String,

    /// Public address of the writer VIP
    pub writer_vip: Ipv4Addr,

    /// Writer VIP with its prefix length
    pub writer_vip_cidr: Ipv4Cidr,

    /// Whether companion remote commands on this host need sudo
    pub requires_sudo: bool,

    /// Registered client type used to talk to the provider
    pub provider: String,

    /// Ask the provider to validate the association without performing it
    pub dry_run: bool,
}

/// Loosely typed host configuration, as read from a config source
///
/// Every field is optional so that a host section can be layered over a
/// default section before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawHostConfig {
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub network_interface_id: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub writer_vip: Option<String>,
    #[serde(default)]
    pub writer_vip_cidr: Option<String>,
    #[serde(default)]
    pub requires_sudo: Option<bool>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub dry_run: Option<bool>,
}

impl RawHostConfig {
    /// Layer `overrides` on top of `self`; set fields in `overrides` win
    pub fn merge(self, overrides: RawHostConfig) -> RawHostConfig {
        RawHostConfig {
            instance_id: overrides.instance_id.or(self.instance_id),
            network_interface_id: overrides.network_interface_id.or(self.network_interface_id),
            access_key_id: overrides.access_key_id.or(self.access_key_id),
            secret_access_key: overrides.secret_access_key.or(self.secret_access_key),
            region: overrides.region.or(self.region),
            writer_vip: overrides.writer_vip.or(self.writer_vip),
            writer_vip_cidr: overrides.writer_vip_cidr.or(self.writer_vip_cidr),
            requires_sudo: overrides.requires_sudo.or(self.requires_sudo),
            provider: overrides.provider.or(self.provider),
            dry_run: overrides.dry_run.or(self.dry_run),
        }
    }

    /// Check required fields and formats, producing a [`FloatingIpConfig`]
    pub fn validate(self) -> Result<FloatingIpConfig> {
        let instance_id = required(self.instance_id, "instance_id")?;
        let network_interface_id = required(self.network_interface_id, "network_interface_id")?;
        let access_key_id = required(self.access_key_id, "access_key_id")?;
        let secret_access_key = required(self.secret_access_key, "secret_access_key")?;
        let region = required(self.region, "region")?;

        let writer_vip = required(self.writer_vip, "writer_vip")?;
        let writer_vip: Ipv4Addr = writer_vip.parse().map_err(|e| {
            Error::config(format!("writer_vip '{}' is not an IPv4 address: {}", writer_vip, e))
        })?;

        let writer_vip_cidr: Ipv4Cidr = required(self.writer_vip_cidr, "writer_vip_cidr")?.parse()?;
        if !writer_vip_cidr.contains(writer_vip) {
            return Err(Error::config(format!(
                "writer_vip {} is outside writer_vip_cidr {}",
                writer_vip, writer_vip_cidr
            )));
        }

        let provider = self
            .provider
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());

        Ok(FloatingIpConfig {
            instance_id,
            network_interface_id,
            credentials: AwsCredentials::new(access_key_id, secret_access_key),
            region,
            writer_vip,
            writer_vip_cidr,
            requires_sudo: self.requires_sudo.unwrap_or(false),
            provider,
            dry_run: self.dry_run.unwrap_or(false),
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::config(format!("missing required field '{}'", field))),
    }
}
