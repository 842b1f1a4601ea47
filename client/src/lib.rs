//! # Puck Arena Client Library
//!
//! The client half of the arena. It never simulates anything itself: it
//! sends the local player's intended velocity and shows whatever the
//! server last replicated.
//!
//! ## Session Lifecycle
//!
//! [`session::ClientSession`] walks through
//! `Disconnected -> Connecting -> AwaitingWelcome -> Running -> Disconnecting`.
//! The only blocking waits are the two handshake steps and the final
//! disconnect acknowledgement, each bounded by [`session::ClientConfig`].
//! The first packet from the server must be its `Connect` welcome; any
//! other packet ends the attempt and the user may retry.
//!
//! ## Module Organization
//!
//! ### Session Module (`session`)
//! Handshake, input submission, snapshot application and disconnect.
//!
//! ### Input Module (`input`)
//! Key sampling and the release-to-velocity translation.
//!
//! ### Scene Module (`scene`)
//! Window-independent drawing data built from a world snapshot.
//!
//! ### Rendering Module (`rendering`)
//! Draws a scene with macroquad.
//!
//! ### Connection Module (`connection`)
//! Server address from the command line or the terminal.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::session::{ClientConfig, ClientSession};
//!
//! let mut session = ClientSession::new(ClientConfig::default())?;
//! let addr = "127.0.0.1:5000".parse()?;
//! let player_id = session.handshake(addr)?;
//! println!("playing as {}", player_id);
//!
//! loop {
//!     session.frame(&[])?;
//!     let scene = session.scene();
//!     if scene.score.text != "0:0" {
//!         break;
//!     }
//! }
//! session.disconnect()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod connection;
pub mod error;
pub mod input;
pub mod rendering;
pub mod scene;
pub mod session;

pub use error::ClientError;
