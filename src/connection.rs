use tokio::io::{AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::config::Endpoint;
use crate::error::ClientError;
use crate::protocol::{self, write_line, LineReader};

/// One TCP connection to the planning server, used for exactly one call.
///
/// Both halves are owned here, so the socket is released whenever the
/// connection is dropped, whichever step failed.
pub struct Connection {
    reader: LineReader<BufReader<OwnedReadHalf>>,
    writer: BufWriter<OwnedWriteHalf>,
}

impl Connection {
    /// Resolve the endpoint's host and connect to it.
    pub async fn open(endpoint: &Endpoint) -> Result<Self, ClientError> {
        let addrs: Vec<_> = tokio::net::lookup_host((endpoint.host(), endpoint.port()))
            .await
            .map_err(|source| ClientError::HostUnresolved {
                host: endpoint.host().to_string(),
                source,
            })?
            .collect();

        if addrs.is_empty() {
            return Err(ClientError::HostUnresolved {
                host: endpoint.host().to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "host name resolved to no addresses",
                ),
            });
        }

        let stream = TcpStream::connect(&addrs[..])
            .await
            .map_err(|source| ClientError::Connect {
                address: endpoint.to_string(),
                source,
            })?;
        tracing::debug!(endpoint = %endpoint, "connected");

        Ok(Self::from_stream(stream))
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: LineReader::new(BufReader::new(read_half)),
            writer: BufWriter::new(write_half),
        }
    }

    /// Write one line and flush it.
    pub async fn send_line(&mut self, line: &str) -> std::io::Result<()> {
        write_line(&mut self.writer, line).await?;
        self.writer.flush().await
    }

    /// Next line without its terminator, or `None` at end of stream.
    pub async fn receive_line(&mut self) -> std::io::Result<Option<String>> {
        self.reader.next_line().await
    }

    /// Send a line the peer may no longer be listening for.
    pub async fn send_best_effort(&mut self, line: &str) {
        if let Err(e) = self.send_line(line).await {
            tracing::debug!(error = %e, "peer did not take the closing line");
        }
    }

    /// Flush and shut down the write side, then drop both halves.
    pub async fn close(mut self) {
        if let Err(e) = self.writer.shutdown().await {
            tracing::debug!(error = %e, "ignoring failure while closing connection");
        }
    }

    pub async fn send_request(
        &mut self,
        request: &protocol::Request,
        stops: &[String],
    ) -> std::io::Result<()> {
        protocol::send_request(&mut self.writer, request, stops).await
    }

    pub async fn collect_response(&mut self) -> std::io::Result<String> {
        protocol::collect_response(&mut self.reader).await
    }
}
