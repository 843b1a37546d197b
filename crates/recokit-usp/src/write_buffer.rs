//! Outbound audio write coalescing
//!
//! The service prefers audio in fixed-size chunks, but the host hands the
//! adapter arbitrarily sized buffers. `WriteBuffer` accumulates writes into
//! service-preferred chunks and forwards them through a caller-supplied sink,
//! preserving byte order exactly. An empty write is a flush request: the
//! partial residue is forwarded once and the chunk buffer is released.

use crate::transport::UspError;

/// Write strategy, selected when a format is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Every write is forwarded 1:1, including empty flush carriers.
    Passthrough,
    /// Writes accumulate into fixed-size chunks.
    Buffered,
}

#[derive(Debug)]
pub struct WriteBuffer {
    mode: WriteMode,
    chunk_size: usize,
    buffer: Option<Vec<u8>>,
    filled: usize,
}

impl Default for WriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteBuffer {
    /// A new buffer starts in passthrough; no format is known yet.
    pub fn new() -> Self {
        Self {
            mode: WriteMode::Passthrough,
            chunk_size: 0,
            buffer: None,
            filled: 0,
        }
    }

    /// Install the chunk size computed from the current audio format.
    ///
    /// Buffering engages only when it is both enabled and the chunk size is
    /// non-zero; otherwise writes stay on the passthrough path.
    pub fn configure(&mut self, chunk_size: usize, buffered: bool) {
        self.chunk_size = chunk_size;
        self.mode = if buffered && chunk_size > 0 {
            WriteMode::Buffered
        } else {
            WriteMode::Passthrough
        };
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Enqueue `data` toward the sink. An empty slice means flush.
    pub fn write<F>(&mut self, data: &[u8], forward: &mut F) -> Result<(), UspError>
    where
        F: FnMut(&[u8]) -> Result<(), UspError>,
    {
        match self.mode {
            WriteMode::Passthrough => forward(data),
            WriteMode::Buffered => self.write_buffered(data, forward),
        }
    }

    /// Forward any partial residue and release the chunk buffer.
    pub fn flush<F>(&mut self, forward: &mut F) -> Result<(), UspError>
    where
        F: FnMut(&[u8]) -> Result<(), UspError>,
    {
        self.write(&[], forward)
    }

    fn write_buffered<F>(&mut self, mut data: &[u8], forward: &mut F) -> Result<(), UspError>
    where
        F: FnMut(&[u8]) -> Result<(), UspError>,
    {
        let flushing = data.is_empty();

        if self.buffer.is_none() {
            self.buffer = Some(vec![0u8; self.chunk_size]);
            self.filled = 0;
        }

        loop {
            let capacity = self.buffer.as_ref().map_or(0, Vec::len);

            if flushing || (capacity > 0 && self.filled == capacity) {
                // A flush with nothing pending still forwards a zero-byte
                // write; that is the flush signal the transport understands.
                let chunk = self.buffer.as_ref().map_or(&[][..], |b| &b[..self.filled]);
                forward(chunk)?;
                self.filled = 0;
            }

            if flushing {
                self.buffer = None;
                self.filled = 0;
            }

            if data.is_empty() {
                break;
            }

            let buffer = self
                .buffer
                .as_mut()
                .ok_or_else(|| UspError::WriteAudio("chunk buffer released".into()))?;
            let free = buffer.len() - self.filled;
            let take = data.len().min(free);
            buffer[self.filled..self.filled + take].copy_from_slice(&data[..take]);
            self.filled += take;
            data = &data[take..];
        }

        Ok(())
    }
}
