//! Bounded chunk reader over a response body.

use std::io;
use std::iter::FusedIterator;
use std::num::NonZeroUsize;

use bytes::Bytes;

use crate::body::Body;

/// Reads a body in slices of at most `chunk_size` bytes.
///
/// Stops at the first of: the declared length is used up, the body reports
/// end of data, a read comes back empty, or a read fails. Once stopped it
/// stays stopped; the body's cursor has moved and is not rewound.
pub struct BodyChunks<'a> {
    body: &'a mut dyn Body,
    remaining: Option<u64>,
    chunk_size: NonZeroUsize,
    exhausted: bool,
}

impl<'a> BodyChunks<'a> {
    /// `length` caps the total bytes produced; `None` reads to end of data.
    pub fn new(body: &'a mut dyn Body, length: Option<u64>, chunk_size: NonZeroUsize) -> Self {
        Self { body, remaining: length, chunk_size, exhausted: false }
    }

    /// Bytes still allowed out, if the length was declared.
    pub fn remaining(&self) -> Option<u64> {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn next_len(&self) -> usize {
        let chunk = self.chunk_size.get();
        match self.remaining {
            Some(left) => usize::try_from(left).map_or(chunk, |left| left.min(chunk)),
            None => chunk,
        }
    }
}

impl Iterator for BodyChunks<'_> {
    type Item = io::Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted || self.remaining == Some(0) || self.body.eof() {
            self.exhausted = true;
            return None;
        }

        let want = self.next_len();
        match self.body.read(want) {
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
            Ok(chunk) if chunk.is_empty() => {
                self.exhausted = true;
                None
            }
            Ok(mut chunk) => {
                chunk.truncate(want);
                if let Some(left) = self.remaining.as_mut() {
                    *left -= chunk.len() as u64;
                }
                Some(Ok(chunk))
            }
        }
    }
}

impl FusedIterator for BodyChunks<'_> {}
