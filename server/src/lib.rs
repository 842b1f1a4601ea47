//! # Puck Arena Server Library
//!
//! The authoritative half of the arena. The server owns the only writable
//! copy of the world, advances it on a fixed tick and replicates it to
//! every connected client.
//!
//! ## Architecture
//!
//! ### Single-Threaded Loop
//! One loop interleaves a non-blocking transport poll, the simulation tick
//! and the world broadcast. Packet handlers run to completion before the
//! next packet is looked at, so the world is never touched concurrently.
//!
//! ### Tick-Based Simulation
//! Each tick moves bodies by a fixed step regardless of how long the tick
//! really took. A loaded host therefore runs the match slower instead of
//! making bodies jump.
//!
//! ## Module Organization
//!
//! - `client_manager`: peer to player mapping and id allocation
//! - `config`: command line arguments and [`config::ServerConfig`]
//! - `game`: admission, input application and goal handling
//! - `network`: the [`network::Server`] session and main loop
//! - `physics`: collisions, containment, integration and goal detection
//! - `spawn`: collision-free spawn placement
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(ServerConfig::default())?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod game;
pub mod network;
pub mod physics;
pub mod spawn;
