//! Client for the journey-planning server's line protocol.
//!
//! A call opens one TCP connection, sends a command (optionally followed by
//! a bus-stop list), reads the answer up to the `END` sentinel and closes
//! the connection again. Failures are kept as [`ClientError`] internally and
//! flattened into a marker-prefixed string only at the collaborator
//! boundary (see [`error::into_output`] and [`Reply`]).

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod resource;

pub use client::ProtocolClient;
pub use config::{ConfigError, Endpoint, Settings};
pub use error::{ClientError, ErrorKind, Reply, MARK};
pub use protocol::{Request, RequestMode};
pub use resource::{ResourceStore, StopList};
