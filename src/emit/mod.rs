//! Response emission.
//!
//! [`ResponseEmitter::process`] is the last step of a request. It walks one
//! response through a fixed sequence of phases, each entered at most once:
//!
//! ```text
//! Init ──► HeaderSent ──► Streaming ──► BuffersFinalized ──► Done
//!                  └── (HEAD) ──────────┘
//! ```
//!
//! 1. **HeaderSent**: unless the environment already committed its header
//!    block, emit the status line and every header field. `Content-Type`
//!    replaces earlier values; every other field appends, so repeated fields
//!    such as `Set-Cookie` all go out.
//! 2. **Streaming** (skipped for `HEAD`): read the body in chunks of at most
//!    `chunk_size` bytes, up to the `Content-Length` header if there is one or
//!    the body's own size otherwise. While any buffering layer is open, each
//!    chunk is flushed right after it is written so the client receives it
//!    without waiting for the rest.
//! 3. **BuffersFinalized**: close buffering layers. A `HEAD` response discards
//!    their contents, anything else flushes them. With flush intent and a
//!    fast-completion hook available, the hook does all of it instead.
//!
//! Any I/O error ends the response where it happened; bytes already written
//! stay written.

mod chunks;
mod env;
mod stack;

use std::num::NonZeroUsize;

use tracing::{debug, warn};

pub use chunks::BodyChunks;
pub use env::{BufferLayer, Finalize, LayerFlags, OutputEnvironment};
pub use stack::OutputStack;

use crate::config::EmitterConfig;
use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::Response;

/// Chunk size used when none is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Init,
    HeaderSent,
    Streaming,
    BuffersFinalized,
    Done,
}

/// Tracks the phase of one emission. Phases only move forward.
struct Emission {
    phase: Phase,
}

impl Emission {
    fn start() -> Self {
        Self { phase: Phase::Init }
    }

    fn enter(&mut self, next: Phase) {
        debug_assert!(next > self.phase, "emission moved from {:?} to {next:?}", self.phase);
        debug!(from = ?self.phase, to = ?next, "emission phase");
        self.phase = next;
    }
}

/// How buffering layers were closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Finalized {
    /// The environment's fast-completion hook handled everything.
    FastCompleted,
    /// Layers were walked innermost first; `removed` of them were closed.
    Walked { removed: usize },
}

/// Sends a [`Response`] to an [`OutputEnvironment`].
#[derive(Clone, Copy, Debug)]
pub struct ResponseEmitter {
    chunk_size: NonZeroUsize,
}

impl ResponseEmitter {
    /// Fails with [`Error::Config`] when `chunk_size` is zero.
    pub fn new(chunk_size: usize) -> Result<Self> {
        NonZeroUsize::new(chunk_size)
            .map(|chunk_size| Self { chunk_size })
            .ok_or_else(|| Error::Config("chunk size must be greater than zero".to_owned()))
    }

    pub fn from_config(config: &EmitterConfig) -> Result<Self> {
        Self::new(config.chunk_size)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size.get()
    }

    /// Emits `res` as the answer to `req`: headers, then the body unless the
    /// request is `HEAD`, then buffer finalization.
    pub fn process<E>(&self, env: &mut E, req: &Request, res: &mut Response) -> Result<()>
    where
        E: OutputEnvironment + ?Sized,
    {
        let mut emission = Emission::start();

        self.send_headers(env, res)?;
        emission.enter(Phase::HeaderSent);

        let intent = if req.is_head() { Finalize::Clean } else { Finalize::Flush };
        if intent == Finalize::Flush {
            emission.enter(Phase::Streaming);
            let sent = self.stream_body(env, res)?;
            debug!(bytes = sent, "body streamed");
        }

        let finalized = end_output_buffers(env, intent)?;
        emission.enter(Phase::BuffersFinalized);
        debug!(?intent, ?finalized, "buffers finalized");

        emission.enter(Phase::Done);
        Ok(())
    }

    /// Emits the status line and header fields. Returns `false` without
    /// touching anything when the environment already sent its headers.
    pub fn send_headers<E>(&self, env: &mut E, res: &Response) -> Result<bool>
    where
        E: OutputEnvironment + ?Sized,
    {
        if env.headers_sent() {
            debug!("headers already sent by the environment");
            return Ok(false);
        }

        let status = format!(
            "HTTP/{} {} {}",
            res.protocol_version(),
            res.status_code().as_u16(),
            res.reason_phrase(),
        );
        env.send_header(status.trim_end(), true)?;

        for (name, values) in res.headers().iter() {
            let replace = name.eq_ignore_ascii_case("content-type");
            for value in values {
                env.send_header(&format!("{name}: {value}"), replace)?;
            }
        }
        Ok(true)
    }

    /// Writes the body chunk by chunk and returns the number of bytes sent.
    pub fn stream_body<E>(&self, env: &mut E, res: &mut Response) -> Result<u64>
    where
        E: OutputEnvironment + ?Sized,
    {
        let mut sent = 0;
        for chunk in self.chunks(res)? {
            let chunk = chunk?;
            env.write(&chunk)?;
            if env.buffer_level() > 0 {
                env.flush()?;
            }
            sent += chunk.len() as u64;
        }
        Ok(sent)
    }

    /// Rewinds the body when possible and returns its chunk sequence, capped
    /// at the declared content length.
    pub fn chunks<'a>(&self, res: &'a mut Response) -> Result<BodyChunks<'a>> {
        let declared = declared_length(res);
        let body = res.body_mut();
        if body.is_seekable() {
            body.rewind()?;
        }
        let length = declared.or_else(|| body.size());
        Ok(BodyChunks::new(body, length, self.chunk_size))
    }
}

impl Default for ResponseEmitter {
    fn default() -> Self {
        Self { chunk_size: NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroUsize::MIN) }
    }
}

/// The `Content-Length` header as a number, if present and well-formed.
fn declared_length(res: &Response) -> Option<u64> {
    let raw = res.headers().get("content-length")?.trim();
    match raw.parse() {
        Ok(len) => Some(len),
        Err(_) => {
            warn!(value = raw, "ignoring malformed content-length");
            None
        }
    }
}

/// Closes the environment's buffering layers with the given intent.
///
/// Layers are inspected innermost first, each exactly once. A layer that may
/// not be closed is left open and the walk moves on to the next outer one.
pub fn end_output_buffers<E>(env: &mut E, intent: Finalize) -> Result<Finalized>
where
    E: OutputEnvironment + ?Sized,
{
    if intent == Finalize::Flush && env.has_fast_completion() {
        env.fast_complete()?;
        return Ok(Finalized::FastCompleted);
    }

    let mut removed = 0;
    for layer in env.buffer_layers().into_iter().rev() {
        if !layer.is_removable(intent) {
            debug!(index = layer.index, flags = ?layer.flags, "buffering layer kept");
            continue;
        }
        match intent {
            Finalize::Flush => env.end_flush(layer.index)?,
            Finalize::Clean => env.end_clean(layer.index)?,
        }
        removed += 1;
    }
    Ok(Finalized::Walked { removed })
}
