use crate::config::Endpoint;
use crate::connection::Connection;
use crate::error::{into_output, ClientError};
use crate::protocol::{Request, RequestMode, ACKNOWLEDGMENT, COMPLAINT};
use crate::resource::{ResourceStore, StopList};

/// Asks the planning server for solutions, one connection per call.
///
/// The client holds no connection state between calls, so a shared
/// reference can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct ProtocolClient {
    endpoint: Endpoint,
    resources: ResourceStore,
}

impl ProtocolClient {
    pub fn new(endpoint: Endpoint, resources: ResourceStore) -> Self {
        Self {
            endpoint,
            resources,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Run one request against the server.
    ///
    /// Connects, uploads the stop list when the mode needs one, collects the
    /// answer and closes. An empty answer is reported as
    /// [`ClientError::ServerUnresponsive`].
    pub async fn request(&self, request: &Request) -> Result<String, ClientError> {
        let mut conn = Connection::open(&self.endpoint).await?;

        // The stop list is loaded before any byte is written, so a bad
        // resource leaves the server untouched.
        let stops = match self.load_stops(request).await {
            Ok(stops) => stops,
            Err(e) => {
                conn.close().await;
                return Err(e);
            }
        };

        let response = match exchange(&mut conn, request, &stops).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(endpoint = %self.endpoint, error = %e, "connection failed mid-call");
                conn.close().await;
                return Err(ClientError::Io(e));
            }
        };

        if response.is_empty() {
            tracing::warn!(endpoint = %self.endpoint, "server closed without answering");
            conn.send_best_effort(COMPLAINT).await;
            conn.close().await;
            return Err(ClientError::ServerUnresponsive);
        }

        conn.send_best_effort(ACKNOWLEDGMENT).await;
        conn.close().await;
        tracing::info!(
            mode = ?request.mode(),
            bytes = response.len(),
            "server answered"
        );
        Ok(response)
    }

    /// Same as [`request`](Self::request) for callers without a runtime.
    ///
    /// Drives the call on a private current-thread runtime. Called from
    /// inside a runtime it fails with [`ClientError::Generic`] instead of
    /// blocking that runtime's thread.
    pub fn request_blocking(&self, request: &Request) -> Result<String, ClientError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ClientError::Generic(
                "Blocking request issued from inside an async runtime".to_string(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ClientError::Generic(format!("Failed to start runtime: {}", e)))?;
        runtime.block_on(self.request(request))
    }

    /// Run a request and flatten the outcome for a text-only collaborator.
    pub async fn server_output(&self, request: &Request) -> String {
        into_output(self.request(request).await)
    }

    /// Resource-oriented entry point: a stop-list mode plus a resource name.
    ///
    /// A best-path mode is turned down here, before any network activity.
    pub async fn server_output_for(&self, mode: RequestMode, resource: &str) -> String {
        match Request::for_resource(mode, resource) {
            Ok(request) => self.server_output(&request).await,
            Err(e) => e.to_output(),
        }
    }

    /// Best path between two waypoints, flattened.
    pub async fn best_path_output(&self, start: &str, end: &str) -> String {
        self.server_output(&Request::best_path(start, end)).await
    }

    async fn load_stops(&self, request: &Request) -> Result<StopList, ClientError> {
        match request.resource() {
            Some(name) => self.resources.read_lines(name).await,
            None => Ok(StopList::new()),
        }
    }
}

async fn exchange(conn: &mut Connection, request: &Request, stops: &[String]) -> std::io::Result<String> {
    conn.send_request(request, stops).await?;
    conn.collect_response().await
}
