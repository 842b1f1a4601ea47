//! Where the client gets its server address from.
//!
//! The command line supplies the first attempt; every retry (and the first
//! attempt when no server was given) asks on the terminal. An empty answer
//! or end of input cancels.

use crate::error::ClientError;
use log::debug;
use shared::{TransportError, DEFAULT_PORT};
use std::io::{BufRead, Write};
use std::net::{SocketAddr, ToSocketAddrs};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub host: String,
    pub port: u16,
    /// Display name. Not sent to the server.
    pub name: String,
}

impl ConnectionInfo {
    pub fn new(host: impl Into<String>, port: u16, name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            name: name.into(),
        }
    }

    /// Resolves to a socket address, preferring IPv4 since the client
    /// host is bound to an IPv4 wildcard.
    pub fn resolve(&self) -> Result<SocketAddr, TransportError> {
        let invalid = || TransportError::InvalidAddress(format!("{}:{}", self.host, self.port));
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|_| invalid())?
            .collect();

        addrs
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(invalid)
    }
}

/// Source of connection parameters. `None` means the user cancelled.
pub trait ConnectionPrompt {
    fn request(&mut self) -> Option<ConnectionInfo>;

    /// Shows why the last attempt failed before the next `request`.
    fn report_failure(&mut self, error: &ClientError);
}

/// Command line first, then line-based prompts on a reader/writer pair.
pub struct TerminalPrompt<R, W> {
    initial: Option<ConnectionInfo>,
    name: String,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(initial: Option<ConnectionInfo>, name: String, input: R, output: W) -> Self {
        Self {
            initial,
            name,
            input,
            output,
        }
    }

    fn ask(&mut self) -> Option<ConnectionInfo> {
        write!(self.output, "Server address (host[:port], empty to quit): ").ok()?;
        self.output.flush().ok()?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).ok()?;
        let line = line.trim();
        if read == 0 || line.is_empty() {
            debug!("Connection prompt cancelled");
            return None;
        }
        Some(parse_target(line, &self.name))
    }
}

impl<R: BufRead, W: Write> ConnectionPrompt for TerminalPrompt<R, W> {
    fn request(&mut self) -> Option<ConnectionInfo> {
        match self.initial.take() {
            Some(info) => Some(info),
            None => self.ask(),
        }
    }

    fn report_failure(&mut self, error: &ClientError) {
        // Nothing useful to do if the terminal itself is gone.
        let _ = writeln!(self.output, "Connection failed: {}", error);
    }
}

/// Splits `host[:port]`, falling back to the default port. A trailing
/// part that is not a port is kept as part of the host.
pub fn parse_target(target: &str, name: &str) -> ConnectionInfo {
    if let Some((host, port)) = target.rsplit_once(':') {
        if let Ok(port) = port.parse::<u16>() {
            return ConnectionInfo::new(host, port, name);
        }
    }
    ConnectionInfo::new(target, DEFAULT_PORT, name)
}
