//! netsync - replays reconciliation against a controller snapshot.
//!
//! The controller state is loaded from a JSON snapshot into the in-memory
//! controller, the requested operations run against it, and the resulting
//! snapshot is written back out.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use netsync_controller::{ControllerSnapshot, InMemoryController};
use netsync_engine::{
    CapabilityTable, EngineConfig, FirewallRule, Network, NetworkSyncEngine, PortForwardingRule,
    SourceNatRule, StaticNatRule,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Network policy synchronization against an SDN controller snapshot
#[derive(Parser, Debug)]
#[command(name = "netsync")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[arg(short = 'l', long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the service capability table as JSON
    Capabilities,

    /// Apply a rule request to a network
    Apply {
        /// Engine configuration (TOML)
        #[arg(short = 'c', long)]
        config: PathBuf,

        /// Controller snapshot to start from (JSON)
        #[arg(short = 's', long)]
        state: PathBuf,

        /// Network and rules to apply (JSON)
        #[arg(short = 'r', long)]
        request: PathBuf,

        /// Where to write the resulting snapshot; stdout if omitted
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Remove everything created for a network
    Destroy {
        /// Engine configuration (TOML)
        #[arg(short = 'c', long)]
        config: PathBuf,

        /// Controller snapshot to start from (JSON)
        #[arg(short = 's', long)]
        state: PathBuf,

        /// Network descriptor (JSON)
        #[arg(short = 'n', long)]
        network: PathBuf,

        /// Where to write the resulting snapshot; stdout if omitted
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

/// Rules to apply to one network, in the order they are applied.
#[derive(Debug, Deserialize)]
struct ApplyRequest {
    network: Network,
    #[serde(default)]
    source_nat: Option<SourceNatRule>,
    #[serde(default)]
    static_nats: Vec<StaticNatRule>,
    #[serde(default)]
    port_forwarding: Vec<PortForwardingRule>,
    #[serde(default)]
    firewall: Vec<FirewallRule>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Capabilities => {
            let json = serde_json::to_string_pretty(&CapabilityTable::standard())?;
            println!("{}", json);
            Ok(())
        }
        Command::Apply {
            config,
            state,
            request,
            output,
        } => {
            let request: ApplyRequest = read_json(&request)?;
            let mut engine = load_engine(&config, &state)?;
            apply(&mut engine, &request)?;
            info!("Apply finished: {:?}", engine.stats());
            write_snapshot(&engine.controller().snapshot(), output.as_deref())
        }
        Command::Destroy {
            config,
            state,
            network,
            output,
        } => {
            let network: Network = read_json(&network)?;
            let mut engine = load_engine(&config, &state)?;
            let changed = engine
                .destroy_network(&network)
                .with_context(|| format!("destroying network {}", network.id))?;
            info!("Destroy finished, changed: {}", changed);
            write_snapshot(&engine.controller().snapshot(), output.as_deref())
        }
    }
}

fn apply(engine: &mut NetworkSyncEngine<InMemoryController>, request: &ApplyRequest) -> Result<()> {
    let network = &request.network;
    if let Some(rule) = &request.source_nat {
        engine
            .apply_source_nat(network, rule)
            .context("applying source NAT")?;
    }
    if !request.static_nats.is_empty() {
        engine
            .apply_static_nats(network, &request.static_nats)
            .context("applying static NAT")?;
    }
    if !request.port_forwarding.is_empty() {
        engine
            .apply_port_forwarding_rules(network, &request.port_forwarding)
            .context("applying port forwarding")?;
    }
    if !request.firewall.is_empty() {
        engine
            .apply_firewall_rules(network, &request.firewall)
            .context("applying firewall rules")?;
    }
    Ok(())
}

fn load_engine(config: &Path, state: &Path) -> Result<NetworkSyncEngine<InMemoryController>> {
    let config = EngineConfig::from_file(config)
        .with_context(|| format!("loading config {}", config.display()))?;
    let snapshot: ControllerSnapshot = read_json(state)?;
    let controller = Arc::new(InMemoryController::from_snapshot(snapshot));
    Ok(NetworkSyncEngine::new(controller, config)?)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn write_snapshot(snapshot: &ControllerSnapshot, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote snapshot to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_apply() {
        let args = Args::try_parse_from([
            "netsync", "-l", "debug", "apply", "-c", "netsync.toml", "-s", "state.json", "-r",
            "request.json",
        ])
        .unwrap();
        assert_eq!(args.log_level, "debug");
        assert!(matches!(args.command, Command::Apply { output: None, .. }));
    }

    #[test]
    fn test_request_defaults() {
        let request: ApplyRequest = serde_json::from_str(
            r#"{
                "network": {
                    "id": 3,
                    "tenant_id": "tenant-a",
                    "cidr": "10.1.3.0/24",
                    "gateway": "10.1.3.1"
                },
                "firewall": [{
                    "destination_address": "203.0.113.7",
                    "protocol": "tcp",
                    "source_cidrs": ["192.0.2.0/24"],
                    "ports": "22"
                }]
            }"#,
        )
        .unwrap();
        assert!(request.source_nat.is_none());
        assert!(request.static_nats.is_empty());
        assert_eq!(request.firewall.len(), 1);
    }

    #[test]
    fn test_apply_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let provider = netsync_controller::RouterId::new();
        let snapshot = ControllerSnapshot {
            routers: vec![netsync_controller::Router {
                id: provider,
                name: "provider".to_string(),
                tenant_id: "admin".to_string(),
                inbound_filter_id: None,
                outbound_filter_id: None,
            }],
            ..Default::default()
        };
        let config = dir.path().join("netsync.toml");
        fs::write(&config, format!("provider_router_id = \"{}\"\n", provider.as_uuid())).unwrap();
        let state = dir.path().join("state.json");
        fs::write(&state, serde_json::to_string(&snapshot).unwrap()).unwrap();
        let request = dir.path().join("request.json");
        fs::write(
            &request,
            r#"{
                "network": {"id": 3, "tenant_id": "tenant-a", "cidr": "10.1.3.0/24", "gateway": "10.1.3.1"},
                "source_nat": {"public_address": "203.0.113.3"}
            }"#,
        )
        .unwrap();
        let output = dir.path().join("out.json");

        run(Command::Apply {
            config,
            state,
            request,
            output: Some(output.clone()),
        })
        .unwrap();

        let result: ControllerSnapshot = read_json(&output).unwrap();
        assert!(result.router_named("Network3").is_some());
        assert!(result.chain_named("Network3-tenantrouter-post-routing").is_some());
    }
}
