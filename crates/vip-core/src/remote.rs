//! Remote host connection parameters
//!
//! A [`RemoteTarget`] describes how companion commands would reach a database
//! host over SSH. The floating IP operations never use it; it is carried so
//! that hooks running other steps against the same host share one description.

use std::net::IpAddr;

/// Default SSH port
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Connection parameters for a database host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// Host identifier, also the config lookup key
    pub host: String,
    /// Address to connect to instead of resolving `host`
    pub host_ip: Option<IpAddr>,
    /// SSH user
    pub ssh_user: Option<String>,
    /// SSH port
    pub ssh_port: Option<u16>,
    /// Extra options passed to ssh verbatim
    pub ssh_options: Option<String>,
}

impl RemoteTarget {
    /// Target `host` with no overrides
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            host_ip: None,
            ssh_user: None,
            ssh_port: None,
            ssh_options: None,
        }
    }

    /// Connect to `ip` instead of resolving the host name
    pub fn with_host_ip(mut self, ip: Option<IpAddr>) -> Self {
        self.host_ip = ip;
        self
    }

    /// Set the SSH user
    pub fn with_ssh_user(mut self, user: Option<String>) -> Self {
        self.ssh_user = user;
        self
    }

    /// Set the SSH port
    pub fn with_ssh_port(mut self, port: Option<u16>) -> Self {
        self.ssh_port = port;
        self
    }

    /// Set extra ssh options
    pub fn with_ssh_options(mut self, options: Option<String>) -> Self {
        self.ssh_options = options;
        self
    }

    /// Address to dial: the IP override, else the host name
    pub fn address(&self) -> String {
        self.host_ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| self.host.clone())
    }

    /// Port to dial
    pub fn port(&self) -> u16 {
        self.ssh_port.unwrap_or(DEFAULT_SSH_PORT)
    }
}
