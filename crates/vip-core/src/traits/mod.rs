//! Core traits for the VIP helper
//!
//! This module defines the abstract interfaces the helper is composed from.
//!
//! - [`CloudNetworkClient`]: The three provider calls the helper consumes
//! - [`ConfigSource`]: Resolve a host identifier into a validated configuration

pub mod cloud_network;
pub mod config_source;

pub use cloud_network::{
    AssociateRequest, AssociateResponse, CloudNetworkClient, CloudNetworkClientFactory,
    ElasticAddress, NetworkInterface,
};
pub use config_source::ConfigSource;
