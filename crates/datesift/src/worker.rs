//! Worker loop - the child side of the host-worker protocol.
//!
//! Architecture:
//! - Requests arrive as frames on the input channel, one at a time
//! - Each request is answered with exactly one frame on the output channel
//! - The next request is not read until the previous response is flushed
//!
//! The loop has no per-request recovery boundary. Any transport, decode or
//! search failure ends it, and the process is expected to exit so the host can
//! restart it. A bad request therefore kills the worker instead of leaving the
//! framing state in doubt.

use std::convert::Infallible;
use std::error::Error as StdError;
use std::io;
use std::time::Instant;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::bridge::codec::CodecError;
use crate::bridge::protocol::{DateMatch, SearchRequest, SearchResponse};
use crate::bridge::transport::{request_reader, response_writer};

/// The date search collaborator invoked once per request.
///
/// Implementations own whatever state they keep between calls (compiled
/// patterns, caches). Calls are strictly sequential.
pub trait DateSearch {
    type Error: StdError + Send + Sync + 'static;

    /// Find date expressions in `content`, in order of appearance.
    ///
    /// `tz` localizes matches that carry no zone of their own; `None` leaves
    /// them naive.
    fn search(&mut self, content: &str, tz: Option<&str>) -> Result<Vec<DateMatch>, Self::Error>;
}

/// Reasons the worker loop stops. There is no successful exit.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The host closed the input channel between frames.
    #[error("input channel closed by host")]
    InputClosed,

    /// Reading a frame failed (hang-up mid-frame, oversized frame, I/O error).
    #[error("failed to read request frame: {0}")]
    Receive(#[source] io::Error),

    /// A complete frame arrived but is not a valid request.
    #[error("malformed request payload: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("date search failed: {0}")]
    Search(#[source] Box<dyn StdError + Send + Sync>),

    /// Writing the response frame failed (broken pipe, oversized frame).
    #[error("failed to write response frame: {0}")]
    Send(#[source] CodecError),
}

impl WorkerError {
    fn from_receive(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => Self::Receive(e),
            CodecError::Json(e) => Self::Decode(e),
        }
    }
}

/// Frame limits for a worker loop.
#[derive(Debug, Clone, Copy)]
pub struct LoopOptions {
    pub max_frame_length: usize,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            max_frame_length: crate::bridge::codec::MAX_WIRE_FRAME_BYTES,
        }
    }
}

/// Answer one request. Absent or empty content never reaches the collaborator.
pub fn handle_request<S: DateSearch>(
    search: &mut S,
    request: &SearchRequest,
) -> Result<SearchResponse, WorkerError> {
    let Some(content) = request.searchable_content() else {
        return Ok(SearchResponse::empty());
    };

    search
        .search(content, request.timezone())
        .map(SearchResponse::from)
        .map_err(|e| WorkerError::Search(Box::new(e)))
}

/// Run the worker loop until a fatal error.
///
/// Reads request frames from `input`, answers each through `search`, and
/// writes response frames to `output` in request order. Only returns when the
/// loop cannot continue; the `Infallible` success type makes that part of the
/// signature.
pub async fn run_worker<R, W, S>(
    input: R,
    output: W,
    search: &mut S,
    options: LoopOptions,
) -> Result<Infallible, WorkerError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    S: DateSearch,
{
    let mut requests = request_reader(input, options.max_frame_length);
    let mut responses = response_writer(output, options.max_frame_length);
    let mut handled: u64 = 0;

    tracing::info!("Worker awaiting requests");

    loop {
        let request = match requests.next().await {
            Some(Ok(request)) => request,
            Some(Err(e)) => {
                let err = WorkerError::from_receive(e);
                tracing::error!(error = %err, handled, "Request read failed");
                return Err(err);
            }
            None => {
                tracing::error!(handled, "Input channel closed (host died?), exiting");
                return Err(WorkerError::InputClosed);
            }
        };

        let started = Instant::now();
        let response = match handle_request(search, &request) {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(error = %err, handled, "Search failed");
                return Err(err);
            }
        };

        let matches = response.len();
        if let Err(e) = responses.send(response).await {
            tracing::error!(error = %e, handled, "Failed to send response");
            return Err(WorkerError::Send(e));
        }

        handled += 1;
        tracing::debug!(
            request = handled,
            content_len = request.content.as_deref().map_or(0, str::len),
            tz = request.timezone().unwrap_or("-"),
            matches,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Request handled"
        );
    }
}
