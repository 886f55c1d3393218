//! Framed codec for worker communication.
//!
//! Uses LengthDelimitedCodec for framing (4-byte big-endian length prefix) +
//! serde_json for payloads. Works over any AsyncRead/AsyncWrite (pipes, files,
//! in-memory duplex streams).

use std::io;
use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};
use tokio_util::bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

/// Size of the length prefix on every frame.
pub const LENGTH_PREFIX_BYTES: usize = 4;

/// Largest payload the 4-byte prefix can describe.
pub const MAX_WIRE_FRAME_BYTES: usize = u32::MAX as usize;

/// Codec failures, split so callers can tell a broken stream from a bad payload.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Framing or I/O failure: the stream can no longer be trusted.
    #[error("frame I/O error: {0}")]
    Io(#[from] io::Error),

    /// A complete frame arrived but its payload is not the expected JSON.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Codec that frames messages with a length prefix and serializes with JSON.
///
/// Wraps LengthDelimitedCodec and adds serde_json serialization.
pub struct JsonCodec<T> {
    inner: LengthDelimitedCodec,
    _phantom: PhantomData<T>,
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self::with_max_frame_length(MAX_WIRE_FRAME_BYTES)
    }

    /// Frames longer than `max` fail with [`CodecError::Io`] in both directions.
    pub fn with_max_frame_length(max: usize) -> Self {
        Self {
            inner: LengthDelimitedCodec::builder()
                .length_field_length(LENGTH_PREFIX_BYTES)
                .big_endian()
                .max_frame_length(max.min(MAX_WIRE_FRAME_BYTES))
                .new_codec(),
            _phantom: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> Decoder for JsonCodec<T> {
    type Item = T;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.inner.decode(src)? {
            Some(bytes) => {
                tracing::trace!(frame_size_bytes = bytes.len(), "Decoding frame");
                Ok(Some(serde_json::from_slice(&bytes)?))
            }
            None => Ok(None),
        }
    }
}

impl<T: Serialize> Encoder<T> for JsonCodec<T> {
    type Error = CodecError;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_vec(&item)?;
        let json_len = json.len();
        tracing::trace!(json_size_bytes = json_len, "Encoding frame");
        if json_len > 1_000_000 {
            tracing::info!(
                json_size_bytes = json_len,
                json_size_kb = json_len / 1024,
                "Large frame being encoded"
            );
        }
        self.inner.encode(Bytes::from(json), dst)?;
        Ok(())
    }
}
