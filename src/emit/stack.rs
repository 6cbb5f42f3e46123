//! In-memory output environment.

use std::io::{self, Write};

use super::env::{BufferLayer, LayerFlags, OutputEnvironment};

struct Layer {
    deletable: bool,
    flags: Option<LayerFlags>,
    buf: Vec<u8>,
}

/// An [`OutputEnvironment`] over any byte sink, with its own layer stack and
/// header list. One `OutputStack` serves one response.
///
/// Header lines are recorded rather than written to the sink; the sink only
/// ever receives body bytes. The header block counts as sent as soon as the
/// first body byte reaches the sink.
pub struct OutputStack<W> {
    sink: W,
    layers: Vec<Layer>,
    status_line: Option<String>,
    headers: Vec<(String, String)>,
    headers_sent: bool,
    fast_completion: bool,
    completed: bool,
}

impl<W: Write> OutputStack<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            layers: Vec::new(),
            status_line: None,
            headers: Vec::new(),
            headers_sent: false,
            fast_completion: false,
            completed: false,
        }
    }

    /// Enables the fast-completion hook: every layer is flushed to the sink
    /// in one go and the response is marked complete.
    pub fn with_fast_completion(mut self) -> Self {
        self.fast_completion = true;
        self
    }

    /// Opens a layer with the given capabilities. Returns its index.
    pub fn push_layer(&mut self, flags: LayerFlags) -> usize {
        self.open(false, Some(flags))
    }

    /// Opens a layer without flag metadata.
    pub fn push_unflagged_layer(&mut self) -> usize {
        self.open(false, None)
    }

    /// Opens a layer explicitly marked deletable, whatever its flags.
    pub fn push_deletable_layer(&mut self, flags: LayerFlags) -> usize {
        self.open(true, Some(flags))
    }

    fn open(&mut self, deletable: bool, flags: Option<LayerFlags>) -> usize {
        self.layers.push(Layer { deletable, flags, buf: Vec::new() });
        self.layers.len() - 1
    }

    /// Bytes held by layer `index`.
    pub fn layer_contents(&self, index: usize) -> Option<&[u8]> {
        self.layers.get(index).map(|l| l.buf.as_slice())
    }

    pub fn status_line(&self) -> Option<&str> {
        self.status_line.as_deref()
    }

    /// Recorded header fields, in emission order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers.iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// `true` after the fast-completion hook ran.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn into_sink(self) -> W {
        self.sink
    }

    /// Writes into layer `index - 1`, or the sink when `index` is 0.
    fn write_below(&mut self, index: usize, bytes: &[u8]) -> io::Result<()> {
        match index.checked_sub(1) {
            Some(outer) => {
                self.layers[outer].buf.extend_from_slice(bytes);
                Ok(())
            }
            None => self.write_sink(bytes),
        }
    }

    fn write_sink(&mut self, bytes: &[u8]) -> io::Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        if self.completed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "response already completed"));
        }
        self.headers_sent = true;
        self.sink.write_all(bytes)
    }

    fn take_layer(&mut self, index: usize) -> io::Result<Layer> {
        if index >= self.layers.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("no buffering layer at index {index}"),
            ));
        }
        Ok(self.layers.remove(index))
    }
}

impl<W: Write> OutputEnvironment for OutputStack<W> {
    fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    fn send_header(&mut self, line: &str, replace: bool) -> io::Result<()> {
        if self.headers_sent {
            return Err(io::Error::other("headers already sent"));
        }
        if line.starts_with("HTTP/") {
            self.status_line = Some(line.to_owned());
            return Ok(());
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("malformed header line `{line}`"),
            ));
        };
        let name = name.trim();
        if replace {
            self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        }
        self.headers.push((name.to_owned(), value.trim().to_owned()));
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self.layers.last_mut() {
            Some(top) => {
                top.buf.extend_from_slice(bytes);
                Ok(())
            }
            None => self.write_sink(bytes),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(top) = self.layers.len().checked_sub(1) {
            let pending = std::mem::take(&mut self.layers[top].buf);
            self.write_below(top, &pending)?;
        }
        self.sink.flush()
    }

    fn buffer_level(&self) -> usize {
        self.layers.len()
    }

    fn buffer_layers(&self) -> Vec<BufferLayer> {
        self.layers.iter()
            .enumerate()
            .map(|(index, l)| BufferLayer { index, deletable: l.deletable, flags: l.flags })
            .collect()
    }

    fn end_flush(&mut self, index: usize) -> io::Result<()> {
        let layer = self.take_layer(index)?;
        self.write_below(index, &layer.buf)
    }

    fn end_clean(&mut self, index: usize) -> io::Result<()> {
        self.take_layer(index).map(drop)
    }

    fn has_fast_completion(&self) -> bool {
        self.fast_completion
    }

    fn fast_complete(&mut self) -> io::Result<()> {
        while let Some(top) = self.layers.len().checked_sub(1) {
            self.end_flush(top)?;
        }
        self.sink.flush()?;
        self.headers_sent = true;
        self.completed = true;
        Ok(())
    }
}
