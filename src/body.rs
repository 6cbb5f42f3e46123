//! Response body streams.
//!
//! The emitter never sees a body as one contiguous buffer. It reads bounded
//! slices through [`Body`], so a handler can hand over an in-memory payload
//! or any [`std::io::Read`] source and the same emission path serves both.

use std::io::{self, Read};

use bytes::Bytes;

/// A readable response body.
pub trait Body: Send {
    /// Reads at most `n` bytes. An empty result means no more data.
    fn read(&mut self, n: usize) -> io::Result<Bytes>;

    /// `true` once the read cursor sits at the end of the data.
    fn eof(&self) -> bool;

    fn is_seekable(&self) -> bool;

    /// Moves the read cursor back to the start. Only valid when seekable.
    fn rewind(&mut self) -> io::Result<()>;

    /// Total size in bytes, if known.
    fn size(&self) -> Option<u64>;
}

// ── BytesBody ─────────────────────────────────────────────────────────────────

/// An in-memory body. Seekable, with a known size.
#[derive(Clone, Debug, Default)]
pub struct BytesBody {
    data: Bytes,
    pos: usize,
}

impl BytesBody {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into(), pos: 0 }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl Body for BytesBody {
    fn read(&mut self, n: usize) -> io::Result<Bytes> {
        let end = self.data.len().min(self.pos.saturating_add(n));
        let chunk = self.data.slice(self.pos..end);
        self.pos = end;
        Ok(chunk)
    }

    fn eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn is_seekable(&self) -> bool {
        true
    }

    fn rewind(&mut self) -> io::Result<()> {
        self.pos = 0;
        Ok(())
    }

    fn size(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}

// ── ReaderBody ────────────────────────────────────────────────────────────────

/// A forward-only body over any reader: a file, a pipe, a child process.
///
/// End of data is only known after a read returns zero bytes.
#[derive(Debug)]
pub struct ReaderBody<R> {
    reader: R,
    size: Option<u64>,
    done: bool,
}

impl<R: Read + Send> ReaderBody<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, size: None, done: false }
    }

    /// Declares the total size up front, e.g. from file metadata.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

impl<R: Read + Send> Body for ReaderBody<R> {
    fn read(&mut self, n: usize) -> io::Result<Bytes> {
        if self.done || n == 0 {
            return Ok(Bytes::new());
        }
        let mut buf = vec![0; n];
        let mut filled = 0;
        while filled < n {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.done = true;
                    break;
                }
                Ok(read) => filled += read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        buf.truncate(filled);
        Ok(Bytes::from(buf))
    }

    fn eof(&self) -> bool {
        self.done
    }

    fn is_seekable(&self) -> bool {
        false
    }

    fn rewind(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "reader body is not seekable"))
    }

    fn size(&self) -> Option<u64> {
        self.size
    }
}
