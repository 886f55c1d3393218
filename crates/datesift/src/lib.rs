//! datesift: framed request/response worker for out-of-process date search.
//!
//! A host spawns one or more worker processes, hands each a pair of
//! descriptors, and sends length-prefixed JSON requests. The worker answers
//! them one at a time, in order, until it hits a fatal error.

pub mod bridge;
pub mod config;
pub mod logging;
pub mod stderr_filter;
pub mod worker;

pub use bridge::protocol::{DateMatch, MatchDate, SearchRequest, SearchResponse};
pub use config::{ConfigError, WorkerConfig};
pub use worker::{DateSearch, LoopOptions, WorkerError, handle_request, run_worker};
