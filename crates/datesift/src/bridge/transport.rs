//! Inherited descriptor transport for host-worker IPC.
//!
//! The launcher opens both descriptors before exec'ing the worker; the worker
//! only adopts them. Requests arrive on the input slot, responses leave on the
//! output slot. Slot numbers are a private contract with the launcher (default
//! 3 and 4, see [`crate::config`]).
//!
//! Framing over the adopted descriptors is done by [`FramedRead`]/[`FramedWrite`]
//! with [`JsonCodec`], which keeps reading until a whole frame is buffered, so a
//! short `read(2)` on a pipe never splits a request.

use std::io;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};

use super::codec::JsonCodec;
use super::protocol::{SearchRequest, SearchResponse};

pub type RequestReader<R> = FramedRead<R, JsonCodec<SearchRequest>>;
pub type ResponseWriter<W> = FramedWrite<W, JsonCodec<SearchResponse>>;

/// Wrap a byte stream as a source of request frames.
pub fn request_reader<R: AsyncRead>(reader: R, max_frame_length: usize) -> RequestReader<R> {
    FramedRead::new(reader, JsonCodec::with_max_frame_length(max_frame_length))
}

/// Wrap a byte stream as a sink for response frames.
pub fn response_writer<W: AsyncWrite>(writer: W, max_frame_length: usize) -> ResponseWriter<W> {
    FramedWrite::new(writer, JsonCodec::with_max_frame_length(max_frame_length))
}

/// The two descriptors handed to the worker by its launcher.
#[derive(Debug)]
pub struct InheritedChannels {
    pub input: tokio::fs::File,
    pub output: tokio::fs::File,
}

/// Adopt the launcher-provided descriptors.
///
/// Fails if either slot is not open in this process. Must be called at most
/// once per slot: the returned handles own the descriptors and close them on
/// drop.
#[cfg(unix)]
pub fn adopt_inherited_fds(input_fd: i32, output_fd: i32) -> io::Result<InheritedChannels> {
    if input_fd == output_fd {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("input and output descriptors must differ (both are {input_fd})"),
        ));
    }

    let input = unix::adopt_fd(input_fd)?;
    let output = unix::adopt_fd(output_fd)?;

    tracing::debug!(input_fd, output_fd, "Adopted inherited descriptors");

    Ok(InheritedChannels {
        input: tokio::fs::File::from_std(input),
        output: tokio::fs::File::from_std(output),
    })
}

#[cfg(not(unix))]
pub fn adopt_inherited_fds(_input_fd: i32, _output_fd: i32) -> io::Result<InheritedChannels> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "inherited descriptor transport requires a unix platform",
    ))
}

#[cfg(unix)]
mod unix {
    use std::fs::File;
    use std::io;
    use std::os::fd::{BorrowedFd, FromRawFd, OwnedFd};

    use nix::fcntl::{FcntlArg, fcntl};

    /// Take ownership of `fd` after checking it is open.
    pub(super) fn adopt_fd(fd: i32) -> io::Result<File> {
        if fd < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid descriptor {fd}"),
            ));
        }

        // Safety: borrow only lives for the fcntl call; F_GETFD on a closed slot
        // returns EBADF rather than touching anything.
        let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
        fcntl(borrowed, FcntlArg::F_GETFD)
            .map_err(|e| io::Error::other(format!("descriptor {fd} is not open: {e}")))?;

        // Safety: fd is open and, per the launcher contract, reserved for us.
        let owned = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(File::from(owned))
    }
}
