// Streaming delta decoder.
//
// DeltaDecoder wraps StreamDecoder with output to any `Write`, one window
// in memory at a time, and progress counters.

use std::io::{Read, Write};

use crate::vcdiff::decoder::{DecodeError, DecodeOptions, SourceProvider, StreamDecoder};
use crate::vcdiff::header::FileHeader;

/// Window-at-a-time decoder writing reconstructed bytes to a sink.
///
/// Only the window being decoded is buffered, so VCD_TARGET windows that
/// reach back into earlier windows fail with `DecodeError::Unsupported`;
/// use `vcdiff::decode_memory` for those streams.
pub struct DeltaDecoder<R: Read> {
    inner: StreamDecoder<R>,
    windows_decoded: u64,
    window_buf: Vec<u8>,
}

impl<R: Read> DeltaDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, DecodeOptions::default())
    }

    pub fn with_options(reader: R, options: DecodeOptions) -> Self {
        Self {
            inner: StreamDecoder::with_options(reader, options),
            windows_decoded: 0,
            window_buf: Vec::new(),
        }
    }

    /// Parse the file header without decoding any window.
    pub fn file_header(&mut self) -> Result<&FileHeader, DecodeError> {
        self.inner.read_header()
    }

    /// Decode all remaining windows into `writer`.
    ///
    /// Returns the total number of bytes decoded.
    pub fn decode_to<S: SourceProvider, W: Write>(
        &mut self,
        source: &mut S,
        writer: &mut W,
    ) -> Result<u64, DecodeError> {
        while self.decode_window_to(source, writer)?.is_some() {}
        Ok(self.bytes_decoded())
    }

    /// Decode the next window into `writer`.
    ///
    /// Returns the window's size, or `None` once the stream is exhausted.
    pub fn decode_window_to<S: SourceProvider, W: Write>(
        &mut self,
        source: &mut S,
        writer: &mut W,
    ) -> Result<Option<u64>, DecodeError> {
        self.window_buf.clear();
        if !self.inner.decode_window(source, &mut self.window_buf)? {
            return Ok(None);
        }

        writer.write_all(&self.window_buf)?;

        let window_size = self.window_buf.len() as u64;
        self.windows_decoded += 1;
        Ok(Some(window_size))
    }

    /// Target bytes reconstructed so far, across all windows.
    pub fn bytes_decoded(&self) -> u64 {
        self.inner.bytes_emitted()
    }

    pub fn windows_decoded(&self) -> u64 {
        self.windows_decoded
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


