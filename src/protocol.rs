use std::collections::VecDeque;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ClientError;

/// Line that terminates both a request and a response.
pub const SENTINEL: &str = "END";

/// Sent after a non-empty response has been received.
pub const ACKNOWLEDGMENT: &str = "Thanks, I received your answer!";

/// Sent when the server closed or answered with nothing.
pub const COMPLAINT: &str = "Sorry, I did not receive your answer!";

const SHOW_SOLUTION: &str = "ShowSolution";
const SHOW_TEST_SOLUTION: &str = "ShowTestSolution";
const SHOW_SINGLE_SOURCE_BEST_PATH: &str = "ShowSingleSourceBestPath";

/// Kind of output the server has to return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestMode {
    /// Route solution for a stop list
    #[default]
    Solution,
    /// Solution plus the server's testing operations
    Test,
    /// Best path between two waypoints
    SingleSourceBestPath,
}

/// Request from client to server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Ask for a solution over the stops in a resource
    Solution {
        /// Logical resource name
        resource: String,
    },
    /// Ask for a solution plus testing output
    Test {
        /// Logical resource name
        resource: String,
    },
    /// Ask for the best path between two named points
    SingleSourceBestPath { start: String, end: String },
}

impl Request {
    /// Solution request, the default mode.
    pub fn default_solution(resource: impl Into<String>) -> Self {
        Request::Solution {
            resource: resource.into(),
        }
    }

    /// Resource-oriented entry point.
    ///
    /// Only the modes that upload a stop list are allowed here; asking for a
    /// best path is rejected before anything touches the network.
    pub fn for_resource(mode: RequestMode, resource: impl Into<String>) -> Result<Self, ClientError> {
        match mode {
            RequestMode::Solution => Ok(Request::Solution {
                resource: resource.into(),
            }),
            RequestMode::Test => Ok(Request::Test {
                resource: resource.into(),
            }),
            RequestMode::SingleSourceBestPath => Err(ClientError::ModeNotAllowed(mode)),
        }
    }

    pub fn best_path(start: impl Into<String>, end: impl Into<String>) -> Self {
        Request::SingleSourceBestPath {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn mode(&self) -> RequestMode {
        match self {
            Request::Solution { .. } => RequestMode::Solution,
            Request::Test { .. } => RequestMode::Test,
            Request::SingleSourceBestPath { .. } => RequestMode::SingleSourceBestPath,
        }
    }

    /// Name of the stop-list resource this request uploads, if any.
    pub fn resource(&self) -> Option<&str> {
        match self {
            Request::Solution { resource } | Request::Test { resource } => Some(resource),
            Request::SingleSourceBestPath { .. } => None,
        }
    }

    /// First line of the request on the wire.
    pub fn command_line(&self) -> String {
        match self {
            Request::Solution { .. } => SHOW_SOLUTION.to_string(),
            Request::Test { .. } => SHOW_TEST_SOLUTION.to_string(),
            Request::SingleSourceBestPath { start, end } => format!(
                "{} {} {}",
                SHOW_SINGLE_SOURCE_BEST_PATH,
                hyphenate(start),
                hyphenate(end)
            ),
        }
    }
}

/// The server splits the best-path command on whitespace, so waypoint names
/// travel with their spaces turned into hyphens.
pub fn hyphenate(waypoint: &str) -> String {
    waypoint.replace(' ', "-")
}

/// Write a full request: command line, stop lines, sentinel.
///
/// `stops` is ignored by modes that do not upload a stop list.
pub async fn send_request<W>(writer: &mut W, request: &Request, stops: &[String]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let uploaded: &[String] = if request.resource().is_some() { stops } else { &[] };

    write_line(writer, &request.command_line()).await?;
    for stop in uploaded {
        write_line(writer, stop).await?;
    }
    write_line(writer, SENTINEL).await?;
    writer.flush().await?;
    tracing::debug!(
        mode = ?request.mode(),
        stops = uploaded.len(),
        "request sent"
    );
    Ok(())
}

/// Reads text lines off a byte stream the way the server writes them.
///
/// `\n`, `\r\n` and a lone `\r` all end a line. Bytes that are not valid
/// UTF-8 are replaced rather than failing the read, so a server writing in
/// another single-byte encoding still gets its answer through.
pub struct LineReader<R> {
    inner: R,
    pending: VecDeque<String>,
    buf: Vec<u8>,
}

impl<R> LineReader<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: VecDeque::new(),
            buf: Vec::new(),
        }
    }

    /// Next line without its terminator, or `None` at end of stream.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Ok(Some(line));
            }

            self.buf.clear();
            let n = self.inner.read_until(b'\n', &mut self.buf).await?;
            if n == 0 {
                return Ok(None);
            }

            let chunk = String::from_utf8_lossy(&self.buf);
            self.pending
                .extend(split_lines(&chunk).into_iter().map(str::to_string));
        }
    }
}

/// Read response lines until the sentinel or end of stream.
///
/// Every line is trimmed and re-terminated with `\n`. The two ways of
/// stopping are not told apart; an empty result means the server said
/// nothing.
pub async fn collect_response<R>(lines: &mut LineReader<R>) -> std::io::Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut response = String::new();
    let mut count = 0usize;

    while let Some(line) = lines.next_line().await? {
        if line == SENTINEL {
            break;
        }

        response.push_str(line.trim());
        response.push('\n');
        count += 1;
    }

    tracing::debug!(lines = count, "response received");
    Ok(response)
}

/// Split text into lines ending in `\n`, `\r\n` or a lone `\r`.
///
/// A terminator at the very end does not open an extra empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        match rest.find(|c: char| c == '\r' || c == '\n') {
            Some(i) => {
                lines.push(&rest[..i]);
                let terminator = if rest[i..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[i + terminator..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }

    lines
}

pub(crate) async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stops(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    async fn encode(request: &Request, stop_list: &[String]) -> String {
        let mut out = Vec::new();
        send_request(&mut out, request, stop_list).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_command_lines() {
        assert_eq!(Request::default_solution("x").command_line(), "ShowSolution");
        assert_eq!(
            Request::Test { resource: "x".into() }.command_line(),
            "ShowTestSolution"
        );
        assert_eq!(
            Request::best_path("Via Roma", "Piazza Duomo").command_line(),
            "ShowSingleSourceBestPath Via-Roma Piazza-Duomo"
        );
    }

    #[test]
    fn test_hyphenate_replaces_every_space() {
        assert_eq!(hyphenate("Corso  Vittorio Emanuele"), "Corso--Vittorio-Emanuele");
        assert_eq!(hyphenate("Duomo"), "Duomo");
    }

    #[test]
    fn test_for_resource_rejects_best_path() {
        let err = Request::for_resource(RequestMode::SingleSourceBestPath, "line1").unwrap_err();
        assert!(matches!(err, ClientError::ModeNotAllowed(RequestMode::SingleSourceBestPath)));

        let ok = Request::for_resource(RequestMode::Test, "line1").unwrap();
        assert_eq!(ok.mode(), RequestMode::Test);
        assert_eq!(ok.resource(), Some("line1"));
    }

    #[test]
    fn test_default_mode_is_solution() {
        assert_eq!(RequestMode::default(), RequestMode::Solution);
    }

    #[tokio::test]
    async fn test_solution_streams_stops_then_sentinel() {
        let wire = encode(
            &Request::default_solution("line1"),
            &stops(&["Stazione Centrale", "", "Duomo"]),
        )
        .await;
        assert_eq!(wire, "ShowSolution\nStazione Centrale\n\nDuomo\nEND\n");
    }

    #[tokio::test]
    async fn test_best_path_ends_with_single_sentinel() {
        let wire = encode(&Request::best_path("Via Roma", "Piazza Duomo"), &stops(&["ignored"])).await;
        assert_eq!(wire, "ShowSingleSourceBestPath Via-Roma Piazza-Duomo\nEND\n");
        assert_eq!(wire.lines().filter(|l| *l == SENTINEL).count(), 1);
    }

    async fn collect(input: &[u8]) -> String {
        collect_response(&mut LineReader::new(input)).await.unwrap()
    }

    #[tokio::test]
    async fn test_collect_stops_at_sentinel() {
        assert_eq!(collect(b"foo\n  bar \r\nEND\nafter\n").await, "foo\nbar\n");
    }

    #[tokio::test]
    async fn test_collect_until_end_of_stream() {
        assert_eq!(collect(b"only line").await, "only line\n");
        assert_eq!(collect(b"").await, "");
    }

    #[tokio::test]
    async fn test_collect_sentinel_must_match_exactly() {
        assert_eq!(collect(b" END\nEND \nEND\n").await, "END\nEND\n");
    }

    #[tokio::test]
    async fn test_collect_keeps_lines_that_are_not_utf8() {
        // Latin-1 "Università" from a server that does not speak UTF-8.
        assert_eq!(collect(b"Universit\xe0\nEND\n").await, "Universit\u{fffd}\n");
    }

    #[tokio::test]
    async fn test_collect_accepts_carriage_return_endings() {
        assert_eq!(collect(b"Lotto\rFiera\rEND\rlater\r").await, "Lotto\nFiera\n");
        assert_eq!(collect(b"a\r\n\r\nb\n").await, "a\n\nb\n");
    }

    #[tokio::test]
    async fn test_next_line_splits_mixed_endings() {
        let mut lines = LineReader::new(&b"one\rtwo\r\nthree\n\rfour"[..]);
        let mut seen = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            seen.push(line);
        }
        assert_eq!(seen, vec!["one", "two", "three", "", "four"]);
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_collect_logs_line_count() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        assert_eq!(collect(b"a\nb\nEND\n").await, "a\nb\n");

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("response received"), "logs: {}", logs);
        assert!(logs.contains("lines=2"), "logs: {}", logs);
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("Lotto\rFiera\r"), vec!["Lotto", "Fiera"]);
        assert_eq!(split_lines("a\r\nb\nc"), vec!["a", "b", "c"]);
        assert_eq!(split_lines("a\n\nb\n"), vec!["a", "", "b"]);
        assert_eq!(split_lines("\r\r"), vec!["", ""]);
        assert!(split_lines("").is_empty());
    }
}
