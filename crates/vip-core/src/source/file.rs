// # File Config Source
//
// JSON-file implementation of ConfigSource.
//
// ## Layout
//
// Settings shared by every database host live in `default`; each host gets
// its own section under `hosts`. Host values override defaults field by field.
//
// ```json
// {
//   "default": {
//     "access_key_id": "AKIA...",
//     "secret_access_key": "...",
//     "region": "eu-west-1",
//     "writer_vip": "203.0.113.10",
//     "writer_vip_cidr": "203.0.113.10/32"
//   },
//   "hosts": {
//     "db1": { "instance_id": "i-0aaa", "network_interface_id": "eni-0aaa" },
//     "db2": { "instance_id": "i-0bbb", "network_interface_id": "eni-0bbb", "requires_sudo": true }
//   }
// }
// ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::config::{FloatingIpConfig, RawHostConfig};
use crate::traits::ConfigSource;
use crate::{Error, Result};

/// On-disk layout of the configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Settings applied to every host
    #[serde(default)]
    pub default: RawHostConfig,

    /// Per-host settings, keyed by host identifier
    #[serde(default)]
    pub hosts: HashMap<String, RawHostConfig>,
}

/// File-based configuration source
///
/// The file is read and parsed once, by [`FileConfigSource::load`].
///
/// # Example
///
/// ```rust,no_run
/// use vip_core::source::FileConfigSource;
/// use vip_core::traits::ConfigSource;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let source = FileConfigSource::load("/etc/vip-helper/hosts.json").await?;
///     let config = source.resolve("db2")?;
///     println!("db2 runs as {}", config.instance_id);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileConfigSource {
    /// Where the configuration came from
    path: PathBuf,

    /// Parsed file contents
    file: ConfigFile,
}

impl FileConfigSource {
    /// Read and parse the configuration file at `path`
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::not_found(format!(
                    "configuration file {}",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let file: ConfigFile = serde_json::from_str(&contents).map_err(|e| {
            Error::config(format!("failed to parse {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            "Loaded configuration for {} host(s) from {}",
            file.hosts.len(),
            path.display()
        );

        Ok(Self { path, file })
    }

    /// Path the configuration was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Host identifiers with their own section
    pub fn hosts(&self) -> Vec<String> {
        let mut hosts: Vec<String> = self.file.hosts.keys().cloned().collect();
        hosts.sort();
        hosts
    }
}

impl ConfigSource for FileConfigSource {
    fn resolve(&self, host: &str) -> Result<FloatingIpConfig> {
        let host_section = self.file.hosts.get(host).ok_or_else(|| {
            Error::config(format!(
                "host '{}' has no section in {}",
                host,
                self.path.display()
            ))
        })?;

        self.file
            .default
            .clone()
            .merge(host_section.clone())
            .validate()
            .map_err(|e| match e {
                Error::Config(msg) => Error::config(format!("host '{}': {}", host, msg)),
                other => other,
            })
    }

    fn source_name(&self) -> &'static str {
        "file"
    }
}
