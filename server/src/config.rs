//! Command line and runtime configuration for the server.

use clap::Parser;
use shared::{HostConfig, DEFAULT_PORT, MAX_PLAYERS};
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Authoritative puck arena server")]
pub struct Args {
    /// IP address to bind to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    pub host: String,
    /// UDP port to listen on
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Maximum number of simultaneously connected players
    #[clap(short, long, default_value_t = MAX_PLAYERS)]
    pub max_players: usize,
    /// Simulation tick length in milliseconds
    #[clap(short, long, default_value = "10")]
    pub tick_ms: u64,
    /// Seed for spawn placement; random when omitted
    #[clap(short, long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_players: usize,
    pub tick_duration: Duration,
    pub seed: Option<u64>,
    pub host: HostConfig,
}

impl ServerConfig {
    /// Loopback config on an ephemeral port.
    pub fn local() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            ..Self::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            max_players: MAX_PLAYERS,
            tick_duration: Duration::from_millis(10),
            seed: None,
            host: HostConfig::default(),
        }
    }
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            bind_addr: format!("{}:{}", args.host, args.port),
            max_players: args.max_players,
            tick_duration: Duration::from_millis(args.tick_ms.max(1)),
            seed: args.seed,
            host: HostConfig::default(),
        }
    }
}
