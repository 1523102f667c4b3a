//! Error taxonomy of the protocol client and the marker convention used to
//! hand results to a text-only collaborator.

use thiserror::Error;

use crate::protocol::RequestMode;

/// Every client-originated diagnostic starts with this marker, so callers
/// can tell client notices apart from server answers.
pub const MARK: &str = "clientMark";

/// Returned unmarked by the resource entry point when asked for a best path.
pub const MODE_NOT_ALLOWED: &str = "Output type not allowed!";

/// Classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ResourceUnavailable,
    HostUnresolved,
    ConnectionIo,
    GenericConnection,
    ServerUnresponsive,
    ModeNotAllowed,
}

/// Errors produced by a single client call.
///
/// The `Display` text is the natural-language notice shown to users; the
/// underlying cause stays reachable through `source()`.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Stop-list resource missing or not decodable as UTF-8 text.
    #[error("No compatible file found!")]
    ResourceUnavailable {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The server host name could not be resolved.
    #[error("Server not found: {host}!")]
    HostUnresolved {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// Resolution worked but the TCP connect did not.
    #[error("Cannot receive a response from the server!")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Socket failure while sending the request or reading the answer.
    #[error("Cannot receive a response from the server!")]
    Io(#[source] std::io::Error),

    /// Any other fault during the call.
    #[error("Cannot establish a connection!")]
    Generic(String),

    /// The server closed or answered with nothing.
    #[error("Unreliable server: it did not answer!")]
    ServerUnresponsive,

    /// Mode cannot be combined with a stop-list resource.
    #[error("Output type not allowed!")]
    ModeNotAllowed(RequestMode),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::ResourceUnavailable { .. } => ErrorKind::ResourceUnavailable,
            ClientError::HostUnresolved { .. } => ErrorKind::HostUnresolved,
            ClientError::Connect { .. } | ClientError::Io(_) => ErrorKind::ConnectionIo,
            ClientError::Generic(_) => ErrorKind::GenericConnection,
            ClientError::ServerUnresponsive => ErrorKind::ServerUnresponsive,
            ClientError::ModeNotAllowed(_) => ErrorKind::ModeNotAllowed,
        }
    }

    /// Flatten into the string handed to the collaborator.
    ///
    /// Mode rejection is a usage answer rather than a client diagnostic and
    /// travels without the marker.
    pub fn to_output(&self) -> String {
        match self {
            ClientError::ModeNotAllowed(_) => MODE_NOT_ALLOWED.to_string(),
            other => format!("{}{}", MARK, other),
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Io(err)
    }
}

/// Collapse a call result into the single string a text-only collaborator
/// displays.
pub fn into_output(result: Result<String, ClientError>) -> String {
    match result {
        Ok(payload) => payload,
        Err(err) => err.to_output(),
    }
}

/// Collaborator-side view of a flattened result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Diagnostic produced by the client, marker removed
    ClientNotice(String),
    /// Answer produced by the server
    Server(String),
}

impl Reply {
    pub fn parse(output: &str) -> Self {
        match output.strip_prefix(MARK) {
            Some(notice) => Reply::ClientNotice(notice.trim().to_string()),
            None => Reply::Server(output.to_string()),
        }
    }

    pub fn is_client_notice(&self) -> bool {
        matches!(self, Reply::ClientNotice(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Reply::ClientNotice(text) | Reply::Server(text) => text,
        }
    }
}
