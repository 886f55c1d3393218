//! Filtering of the process diagnostic stream.
//!
//! Some dependencies print a known, harmless warning at startup that hosts
//! treat as noise. Rather than patching whoever writes it, fd 2 is swapped for
//! a pipe and everything written to it is copied back to the real stderr
//! through [`FilteringWriter`], which drops lines equal to a suppressed string.
//! This covers output from any source: tracing, panics, third-party code.
//!
//! ## Safety contracts
//!
//! The `unsafe` blocks here rely on:
//! 1. [`StderrFilter::install`] running early in `main`, before other threads
//!    write to fd 2
//! 2. fd 2 being open at process startup
//! 3. The copy thread owning the pipe read end exclusively

use std::io::{self, Write};

/// Write decorator that drops complete lines matching a suppressed string.
///
/// Input is buffered until a `\n` arrives; each complete line is compared
/// without its terminator (`\n` or `\r\n`) and either dropped or forwarded
/// unchanged. `flush` is passed through. A trailing partial line is only
/// written by [`FilteringWriter::finish`].
pub struct FilteringWriter<W: Write> {
    inner: W,
    suppressed: Vec<Vec<u8>>,
    pending: Vec<u8>,
    dropped: usize,
}

impl<W: Write> FilteringWriter<W> {
    pub fn new<I, S>(inner: W, suppressed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner,
            suppressed: suppressed
                .into_iter()
                .map(|s| s.into().into_bytes())
                .collect(),
            pending: Vec::new(),
            dropped: 0,
        }
    }

    /// Number of lines dropped so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Emit any buffered partial line and hand back the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            if !self.is_suppressed(&rest) {
                self.inner.write_all(&rest)?;
            } else {
                self.dropped += 1;
            }
        }
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn is_suppressed(&self, line: &[u8]) -> bool {
        let line = line.strip_suffix(b"\n").unwrap_or(line);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        self.suppressed.iter().any(|s| s.as_slice() == line)
    }

    fn drain_complete_lines(&mut self) -> io::Result<()> {
        let mut start = 0;
        while let Some(pos) = self.pending[start..].iter().position(|&b| b == b'\n') {
            let end = start + pos + 1;
            if self.is_suppressed(&self.pending[start..end]) {
                self.dropped += 1;
            } else {
                self.inner.write_all(&self.pending[start..end])?;
            }
            start = end;
        }
        self.pending.drain(..start);
        Ok(())
    }
}

impl<W: Write> Write for FilteringWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.suppressed.is_empty() {
            return self.inner.write(buf);
        }
        self.pending.extend_from_slice(buf);
        self.drain_complete_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(unix)]
pub use unix::StderrFilter;

/// Stand-in where descriptors cannot be swapped; diagnostics pass unfiltered.
#[cfg(not(unix))]
pub struct StderrFilter;

#[cfg(not(unix))]
impl StderrFilter {
    pub fn install(_suppressed: &[String]) -> io::Result<Option<Self>> {
        Ok(None)
    }

    pub fn restore(self) -> io::Result<usize> {
        Ok(0)
    }
}

#[cfg(unix)]
mod unix {
    use std::fs::File;
    use std::io;
    use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
    use std::thread::JoinHandle;

    use nix::unistd::{dup, dup2, pipe};

    use super::FilteringWriter;

    const STDERR_FD: i32 = 2;

    /// Installed stderr filter. Restores the real stderr when dropped.
    pub struct StderrFilter {
        original: Option<OwnedFd>,
        copier: Option<JoinHandle<usize>>,
    }

    impl StderrFilter {
        /// Route fd 2 through a [`FilteringWriter`] dropping `suppressed` lines.
        ///
        /// Returns `Ok(None)` when there is nothing to suppress; the stream is
        /// left untouched in that case.
        pub fn install(suppressed: &[String]) -> io::Result<Option<Self>> {
            if suppressed.is_empty() {
                return Ok(None);
            }

            // Safety: fd 2 is open at startup (contract 2).
            let original = unsafe { dup(BorrowedFd::borrow_raw(STDERR_FD)) }
                .map_err(|e| io::Error::other(format!("dup(2) failed: {e}")))?;
            let sink = File::from(
                original
                    .try_clone()
                    .map_err(|e| io::Error::other(format!("dup(stderr copy) failed: {e}")))?,
            );

            let (pipe_read, pipe_write) =
                pipe().map_err(|e| io::Error::other(format!("pipe failed: {e}")))?;

            let mut target = unsafe { OwnedFd::from_raw_fd(STDERR_FD) };
            let swapped = dup2(&pipe_write, &mut target);
            std::mem::forget(target); // fd 2 must stay open
            swapped.map_err(|e| io::Error::other(format!("dup2(stderr) failed: {e}")))?;
            // fd 2 is now the only write end
            drop(pipe_write);

            let original_fd = original.as_raw_fd();
            // dropping this on a failed spawn puts the real stderr back
            let mut installed = Self {
                original: Some(original),
                copier: None,
            };

            let suppressed = suppressed.to_vec();
            let copier = std::thread::Builder::new()
                .name("stderr-filter".into())
                .spawn(move || {
                    // NOTE: no tracing in here - it writes to fd 2, i.e. back into this pipe
                    let mut source = File::from(pipe_read);
                    let mut filter = FilteringWriter::new(sink, suppressed);
                    let _ = io::copy(&mut source, &mut filter);
                    let dropped = filter.dropped();
                    let _ = filter.finish();
                    dropped
                })?;
            installed.copier = Some(copier);

            tracing::debug!(original_fd, "Diagnostic stream routed through filter");

            Ok(Some(installed))
        }

        /// Put the real stderr back on fd 2 and wait for the copy thread to
        /// drain. Returns the number of lines dropped.
        pub fn restore(mut self) -> io::Result<usize> {
            self.restore_inner()
        }

        fn restore_inner(&mut self) -> io::Result<usize> {
            let Some(original) = self.original.take() else {
                return Ok(0);
            };

            // Replacing fd 2 closes the last pipe write end; the copier sees EOF.
            let mut target = unsafe { OwnedFd::from_raw_fd(STDERR_FD) };
            let swapped = dup2(&original, &mut target);
            std::mem::forget(target);
            swapped.map_err(|e| io::Error::other(format!("dup2(restore) failed: {e}")))?;
            drop(original);

            match self.copier.take() {
                Some(handle) => handle
                    .join()
                    .map_err(|_| io::Error::other("stderr filter thread panicked")),
                None => Ok(0),
            }
        }
    }

    impl Drop for StderrFilter {
        fn drop(&mut self) {
            let _ = self.restore_inner();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BENIGN: &str = "Warning : `load_model` does not return WordVectorModel";

    fn filtered(chunks: &[&[u8]]) -> (String, usize) {
        let mut w = FilteringWriter::new(Vec::new(), [BENIGN]);
        for chunk in chunks {
            w.write_all(chunk).unwrap();
        }
        let dropped = w.dropped();
        let out = w.finish().unwrap();
        (String::from_utf8(out).unwrap(), dropped)
    }

    #[test]
    fn drops_exact_line() {
        let input = format!("before\n{BENIGN}\nafter\n");
        let (out, dropped) = filtered(&[input.as_bytes()]);
        assert_eq!(out, "before\nafter\n");
        assert_eq!(dropped, 1);
    }

    #[test]
    fn keeps_lines_that_only_contain_the_warning() {
        let input = format!("prefix {BENIGN}\n{BENIGN} suffix\n");
        let (out, dropped) = filtered(&[input.as_bytes()]);
        assert_eq!(out, input);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn matches_across_split_writes() {
        let (head, tail) = BENIGN.split_at(10);
        let (out, dropped) = filtered(&[b"a\n", head.as_bytes(), tail.as_bytes(), b"\nb\n"]);
        assert_eq!(out, "a\nb\n");
        assert_eq!(dropped, 1);
    }

    #[test]
    fn crlf_terminated_line_is_dropped() {
        let input = format!("{BENIGN}\r\nkeep\r\n");
        let (out, _) = filtered(&[input.as_bytes()]);
        assert_eq!(out, "keep\r\n");
    }

    #[test]
    fn trailing_partial_line_emitted_on_finish() {
        let (out, _) = filtered(&[b"one\ntwo"]);
        assert_eq!(out, "one\ntwo");

        let (out, dropped) = filtered(&[b"one\n", BENIGN.as_bytes()]);
        assert_eq!(out, "one\n");
        assert_eq!(dropped, 1);
    }

    #[test]
    fn partial_line_is_held_until_complete() {
        let mut w = FilteringWriter::new(Vec::new(), [BENIGN]);
        w.write_all(b"par").unwrap();
        w.flush().unwrap();
        assert!(w.get_ref().is_empty());

        w.write_all(b"tial\n").unwrap();
        assert_eq!(w.get_ref().as_slice(), b"partial\n");
    }

    #[test]
    fn nothing_suppressed_passes_through() {
        let mut w = FilteringWriter::new(Vec::new(), Vec::<String>::new());
        w.write_all(b"no newline yet").unwrap();
        assert_eq!(w.get_ref().as_slice(), b"no newline yet");
    }

    #[cfg(unix)]
    #[test]
    fn install_without_lines_is_a_no_op() {
        assert!(StderrFilter::install(&[]).unwrap().is_none());
    }
}
