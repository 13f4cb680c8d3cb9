// # Environment Config Source
//
// Environment-variable implementation of ConfigSource.
//
// ## Variables
//
// - `VIP_INSTANCE_ID`, `VIP_NETWORK_INTERFACE_ID`
// - `VIP_AWS_ACCESS_KEY_ID`, `VIP_AWS_SECRET_ACCESS_KEY`, `VIP_AWS_REGION`
// - `VIP_WRITER_VIP`, `VIP_WRITER_VIP_CIDR`
// - `VIP_REQUIRES_SUDO`, `VIP_PROVIDER`, `VIP_DRY_RUN`
//
// A host-scoped variable `VIP_<HOST>_<FIELD>` wins over `VIP_<FIELD>`. The
// host part is upper-cased with every non-alphanumeric character replaced by
// `_`, so host `db-2.internal` reads `VIP_DB_2_INTERNAL_INSTANCE_ID`.

use std::collections::HashMap;

use crate::config::{FloatingIpConfig, RawHostConfig};
use crate::traits::ConfigSource;
use crate::{Error, Result};

/// Prefix shared by every variable this source reads
pub const ENV_PREFIX: &str = "VIP_";

/// Environment-based configuration source
///
/// Variables are captured once, when the source is built.
#[derive(Clone, Default)]
pub struct EnvConfigSource {
    vars: HashMap<String, String>,
}

// Custom Debug implementation that hides secret values
impl std::fmt::Debug for EnvConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.vars.keys().collect();
        names.sort();
        f.debug_struct("EnvConfigSource")
            .field("vars", &names)
            .finish()
    }
}

impl EnvConfigSource {
    /// Capture the `VIP_*` variables of the current process
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build a source from an explicit set of variables
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k.starts_with(ENV_PREFIX))
            .collect();
        Self { vars }
    }

    fn lookup(&self, host_key: &str, field: &str) -> Option<String> {
        self.vars
            .get(&format!("{}{}_{}", ENV_PREFIX, host_key, field))
            .or_else(|| self.vars.get(&format!("{}{}", ENV_PREFIX, field)))
            .cloned()
    }

    fn lookup_bool(&self, host_key: &str, field: &str) -> Result<Option<bool>> {
        self.lookup(host_key, field)
            .map(|value| {
                parse_bool(&value).ok_or_else(|| {
                    Error::config(format!(
                        "{}{} must be a boolean (true/false, yes/no, 1/0). Got: {}",
                        ENV_PREFIX, field, value
                    ))
                })
            })
            .transpose()
    }

    fn raw_for(&self, host: &str) -> Result<RawHostConfig> {
        let key = host_key(host);
        Ok(RawHostConfig {
            instance_id: self.lookup(&key, "INSTANCE_ID"),
            network_interface_id: self.lookup(&key, "NETWORK_INTERFACE_ID"),
            access_key_id: self.lookup(&key, "AWS_ACCESS_KEY_ID"),
            secret_access_key: self.lookup(&key, "AWS_SECRET_ACCESS_KEY"),
            region: self.lookup(&key, "AWS_REGION"),
            writer_vip: self.lookup(&key, "WRITER_VIP"),
            writer_vip_cidr: self.lookup(&key, "WRITER_VIP_CIDR"),
            requires_sudo: self.lookup_bool(&key, "REQUIRES_SUDO")?,
            provider: self.lookup(&key, "PROVIDER"),
            dry_run: self.lookup_bool(&key, "DRY_RUN")?,
        })
    }
}

impl ConfigSource for EnvConfigSource {
    fn resolve(&self, host: &str) -> Result<FloatingIpConfig> {
        self.raw_for(host)?.validate()
    }

    fn source_name(&self) -> &'static str {
        "env"
    }
}

fn host_key(host: &str) -> String {
    host.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
