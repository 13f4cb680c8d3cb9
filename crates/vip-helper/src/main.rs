// # vip-helper - writer VIP failover hook
//
// CRITICAL RULES:
// - This is a THIN integration layer ONLY
// - DO NOT add Elastic IP decision logic here; it lives in vip-core
// - Provider SDK code lives in the provider crates
//
// The binary is responsible for:
// 1. Reading arguments and environment variables
// 2. Initializing logging and the runtime
// 3. Registering cloud networking clients
// 4. Running one helper operation and turning its outcome into an exit code
//
// ## Commands
//
// - `assign`: make sure the host holds the writer VIP, moving it if needed
// - `check`: report whether the host holds the writer VIP
//
// ## Configuration
//
// - `VIP_HOST` / `--host`: host identifier (config lookup key)
// - `VIP_CONFIG` / `--config`: JSON config file; without it, host settings
//   are read from `VIP_*` variables (see `vip_core::source::env`)
// - `VIP_HOST_IP`, `VIP_SSH_USER`, `VIP_SSH_PORT`, `VIP_SSH_OPTIONS`:
//   connection overrides for the host
// - `VIP_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
// - `VIP_DRY_RUN` / `--dry-run`: force dry-run mode on any config source
//
// ## Example
//
// ```bash
// export VIP_CONFIG=/etc/vip-helper/hosts.json
//
// vip-helper --host db2 assign
// ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use vip_core::{
    AddressStatus, AssignOutcome, ClientRegistry, ConfigSource, EnvConfigSource,
    FileConfigSource, FloatingIpConfig, FloatingIpHelper, RemoteTarget,
};

/// Exit codes for failover scripts
///
/// - 0: The host holds the writer VIP
/// - 1: Configuration or startup error
/// - 2: Cloud provider or runtime error
/// - 3: The call completed but the host does not hold the writer VIP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VipExitCode {
    /// The host holds the VIP
    Assigned = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Provider API failure or unexpected runtime error
    ProviderError = 2,
    /// The host does not hold the VIP
    NotAssigned = 3,
}

impl From<VipExitCode> for ExitCode {
    fn from(code: VipExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Move or check the writer Elastic IP for one database host
#[derive(Debug, Parser)]
#[command(name = "vip-helper", version)]
struct Cli {
    /// Host identifier, as named in the configuration
    #[arg(long, env = "VIP_HOST")]
    host: String,

    /// Address to reach the host at instead of its name
    #[arg(long, env = "VIP_HOST_IP")]
    host_ip: Option<IpAddr>,

    /// SSH user for companion remote commands
    #[arg(long, env = "VIP_SSH_USER")]
    ssh_user: Option<String>,

    /// SSH port for companion remote commands
    #[arg(long, env = "VIP_SSH_PORT")]
    ssh_port: Option<u16>,

    /// Extra ssh options for companion remote commands
    #[arg(long, env = "VIP_SSH_OPTIONS", allow_hyphen_values = true)]
    ssh_options: Option<String>,

    /// JSON configuration file; `VIP_*` variables are used when absent
    #[arg(long, env = "VIP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "VIP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Ask the provider to validate the association without performing it
    #[arg(long, env = "VIP_DRY_RUN")]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Make sure the host holds the writer VIP, moving it if needed
    Assign,
    /// Report whether the host holds the writer VIP
    Check,
}

/// Config source wrapper that forces dry-run mode on
struct ForceDryRun(Box<dyn ConfigSource>);

impl ConfigSource for ForceDryRun {
    fn resolve(&self, host: &str) -> vip_core::Result<FloatingIpConfig> {
        let mut config = self.0.resolve(host)?;
        config.dry_run = true;
        Ok(config)
    }

    fn source_name(&self) -> &'static str {
        self.0.source_name()
    }
}

/// Parse and validate the log level
fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "VIP_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Exit code for an error returned by the helper
fn exit_code_for(err: &vip_core::Error) -> VipExitCode {
    match err {
        e if e.is_provider_error() => VipExitCode::ProviderError,
        _ => VipExitCode::ConfigError,
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                VipExitCode::ConfigError.into()
            } else {
                VipExitCode::Assigned.into()
            };
        }
    };

    let log_level = match parse_log_level(&cli.log_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return VipExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return VipExitCode::ConfigError.into();
    }

    // One sequential operation; no worker threads needed
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return VipExitCode::ProviderError.into();
        }
    };

    let code = rt.block_on(async {
        match run(&cli).await {
            Ok(code) => code,
            Err(e) => {
                error!("vip-helper {:?} failed for host {}: {}", cli.command, cli.host, e);
                exit_code_for(&e)
            }
        }
    });

    code.into()
}

/// Run one command
async fn run(cli: &Cli) -> vip_core::Result<VipExitCode> {
    let registry = ClientRegistry::new();

    #[cfg(feature = "ec2")]
    {
        info!("Registering EC2 client");
        vip_provider_ec2::register(&registry);
    }

    let source: Box<dyn ConfigSource> = match &cli.config {
        Some(path) => Box::new(FileConfigSource::load(path).await?),
        None => Box::new(EnvConfigSource::from_env()),
    };
    let source: Box<dyn ConfigSource> = if cli.dry_run {
        warn!("Dry-run requested on the command line");
        Box::new(ForceDryRun(source))
    } else {
        source
    };

    let remote = RemoteTarget::new(cli.host.clone())
        .with_host_ip(cli.host_ip)
        .with_ssh_user(cli.ssh_user.clone())
        .with_ssh_port(cli.ssh_port)
        .with_ssh_options(cli.ssh_options.clone());

    let helper = FloatingIpHelper::connect(remote, source.as_ref(), &registry).await?;
    info!(
        "Host {} -> instance {} / interface {} (VIP {}, region {})",
        cli.host,
        helper.config().instance_id,
        helper.config().network_interface_id,
        helper.config().writer_vip_cidr,
        helper.config().region
    );

    match cli.command {
        Command::Assign => {
            let outcome = helper.ensure_assigned().await?;
            match &outcome {
                AssignOutcome::AlreadyAssigned => info!("Writer VIP already in place"),
                AssignOutcome::Associated {
                    association_id,
                    previous_instance,
                } => info!(
                    "Writer VIP moved (association {}, previous holder: {})",
                    association_id,
                    previous_instance.as_deref().unwrap_or("none")
                ),
                AssignOutcome::InterfaceNotFound => {
                    error!("Writer VIP not assigned: interface check failed")
                }
                AssignOutcome::AddressNotFound => {
                    error!("Writer VIP not assigned: address not found")
                }
                AssignOutcome::MissingAssociationId => {
                    error!("Writer VIP not assigned: provider returned no association id")
                }
            }

            Ok(if outcome.is_success() {
                VipExitCode::Assigned
            } else {
                VipExitCode::NotAssigned
            })
        }
        Command::Check => {
            let status = helper.address_status().await?;
            Ok(match status {
                AddressStatus::AssignedToTarget => VipExitCode::Assigned,
                _ => VipExitCode::NotAssigned,
            })
        }
    }
}
