//! IPC bridge between the host process and a datesift worker.
//!
//! # Architecture
//!
//! - **protocol**: Payload types (SearchRequest in, SearchResponse out)
//! - **codec**: Length-prefixed JSON framing codec for AsyncRead/AsyncWrite
//! - **transport**: Adoption of the launcher's inherited descriptors

pub mod codec;
pub mod protocol;
pub mod transport;
