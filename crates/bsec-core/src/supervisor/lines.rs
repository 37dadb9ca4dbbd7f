//! Line framing over the companion's stdout with an optional per-line
//! deadline.

use std::io::{self, BufRead, BufReader, Read};
use std::os::fd::AsFd;
use std::process::ChildStdout;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

/// A byte source that can wait for input without consuming it.
pub trait WaitReadable {
    /// `Ok(true)` once a read would not block, `Ok(false)` if `timeout`
    /// passes first.
    fn wait_readable(&self, timeout: Duration) -> io::Result<bool>;
}

impl WaitReadable for ChildStdout {
    fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            let ms = left.as_millis().min(u16::MAX as u128) as u16;
            let mut fds = [PollFd::new(self.as_fd(), PollFlags::POLLIN)];
            match poll(&mut fds, PollTimeout::from(ms)) {
                // POLLHUP counts too: the read will return EOF immediately
                Ok(n) if n > 0 => return Ok(true),
                Ok(_) if Instant::now() >= deadline => return Ok(false),
                Ok(_) | Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl WaitReadable for &[u8] {
    fn wait_readable(&self, _timeout: Duration) -> io::Result<bool> {
        Ok(true)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum NextLine {
    /// One line without its terminator (`\n` or `\r\n`).
    Line(Vec<u8>),
    Eof,
    TimedOut,
}

pub struct LineReader<R> {
    inner: BufReader<R>,
    /// Bytes of a line whose terminator hasn't arrived yet.
    partial: Vec<u8>,
    eof: bool,
}

impl<R: Read + WaitReadable> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            partial: Vec::new(),
            eof: false,
        }
    }

    /// Whether the writer has closed its end and everything was consumed.
    #[inline]
    pub fn at_eof(&self) -> bool {
        self.eof
    }

    /// Next line, blocking without limit when `timeout` is `None`. A partial
    /// line survives a timeout and is completed by the next call.
    pub fn next_line(&mut self, timeout: Option<Duration>) -> io::Result<NextLine> {
        let deadline = timeout.map(|d| Instant::now() + d);
        loop {
            if let Some(deadline) = deadline {
                if self.inner.buffer().is_empty() {
                    let left = deadline.saturating_duration_since(Instant::now());
                    if !self.inner.get_ref().wait_readable(left)? {
                        return Ok(NextLine::TimedOut);
                    }
                }
            }

            let chunk = match self.inner.fill_buf() {
                Ok(c) => c,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if chunk.is_empty() {
                self.eof = self.partial.is_empty();
                return Ok(if self.eof {
                    NextLine::Eof
                } else {
                    NextLine::Line(self.take_line())
                });
            }

            match chunk.iter().position(|&b| b == b'\n') {
                Some(i) => {
                    self.partial.extend_from_slice(&chunk[..i]);
                    self.inner.consume(i + 1);
                    return Ok(NextLine::Line(self.take_line()));
                }
                None => {
                    let n = chunk.len();
                    self.partial.extend_from_slice(chunk);
                    self.inner.consume(n);
                }
            }
        }
    }

    fn take_line(&mut self) -> Vec<u8> {
        let mut line = std::mem::take(&mut self.partial);
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        line
    }
}
