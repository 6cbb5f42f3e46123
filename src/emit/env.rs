//! The emitter's view of the hosting environment.
//!
//! Everything the emitter touches outside the response itself goes through
//! [`OutputEnvironment`]: the headers-sent flag, raw header lines, the output
//! transport, and the stack of buffering layers sitting in front of it.

use std::io;

use bitflags::bitflags;

bitflags! {
    /// Capabilities a buffering layer was created with.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct LayerFlags: u8 {
        const REMOVABLE = 1 << 0;
        const FLUSHABLE = 1 << 1;
        const CLEANABLE = 1 << 2;
    }
}

/// How buffering layers are closed at the end of a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Finalize {
    /// Send held content downstream, then close the layer.
    Flush,
    /// Discard held content, then close the layer.
    Clean,
}

impl Finalize {
    /// Flags a layer must carry to be closed with this intent.
    pub fn required_flags(self) -> LayerFlags {
        match self {
            Self::Flush => LayerFlags::REMOVABLE | LayerFlags::FLUSHABLE,
            Self::Clean => LayerFlags::REMOVABLE | LayerFlags::CLEANABLE,
        }
    }
}

/// A snapshot of one buffering layer. `index` 0 is the outermost layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferLayer {
    pub index: usize,
    pub deletable: bool,
    pub flags: Option<LayerFlags>,
}

impl BufferLayer {
    /// A layer is closed if it is marked deletable, carries no flags at all,
    /// or carries every flag `intent` requires.
    pub fn is_removable(&self, intent: Finalize) -> bool {
        self.deletable
            || self.flags.is_none_or(|flags| flags.contains(intent.required_flags()))
    }
}

/// Output primitives of the environment a response is emitted into.
///
/// Implementations are scoped to one request: nothing here may leak into
/// the next response.
pub trait OutputEnvironment {
    /// `true` once the transport has committed the header block.
    fn headers_sent(&self) -> bool;

    /// Emits one raw header line (`"Name: value"` or a status line).
    /// With `replace`, earlier values of the same field are dropped.
    fn send_header(&mut self, line: &str, replace: bool) -> io::Result<()>;

    /// Writes body bytes into the innermost active layer, or the transport.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Pushes the innermost layer's pending bytes downstream and flushes the
    /// transport. Layers stay open.
    fn flush(&mut self) -> io::Result<()>;

    /// Number of open buffering layers.
    fn buffer_level(&self) -> usize;

    /// Every open layer, outermost first.
    fn buffer_layers(&self) -> Vec<BufferLayer>;

    /// Closes layer `index`, sending its contents to the next outer layer.
    fn end_flush(&mut self, index: usize) -> io::Result<()>;

    /// Closes layer `index`, discarding its contents.
    fn end_clean(&mut self, index: usize) -> io::Result<()>;

    /// Whether the environment can end the client-visible response early.
    fn has_fast_completion(&self) -> bool {
        false
    }

    /// Sends everything pending and releases the client. Only called when
    /// [`has_fast_completion`](OutputEnvironment::has_fast_completion) is `true`.
    fn fast_complete(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<E: OutputEnvironment + ?Sized> OutputEnvironment for &mut E {
    fn headers_sent(&self) -> bool { (**self).headers_sent() }
    fn send_header(&mut self, line: &str, replace: bool) -> io::Result<()> { (**self).send_header(line, replace) }
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> { (**self).write(bytes) }
    fn flush(&mut self) -> io::Result<()> { (**self).flush() }
    fn buffer_level(&self) -> usize { (**self).buffer_level() }
    fn buffer_layers(&self) -> Vec<BufferLayer> { (**self).buffer_layers() }
    fn end_flush(&mut self, index: usize) -> io::Result<()> { (**self).end_flush(index) }
    fn end_clean(&mut self, index: usize) -> io::Result<()> { (**self).end_clean(index) }
    fn has_fast_completion(&self) -> bool { (**self).has_fast_completion() }
    fn fast_complete(&mut self) -> io::Result<()> { (**self).fast_complete() }
}
