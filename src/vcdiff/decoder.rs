// VCDIFF decoder: instruction decoding and window reconstruction.
//
// Follows xdelta3's state progression: parse the file header, then for each
// window parse the window header, read the three sections, undo secondary
// compression and execute the instructions.
//
// Section buffers and the address cache are reused across windows. Source
// COPYs go through `SourceProvider::source_slice` when the source is in
// memory, and through a reusable copy buffer otherwise.

use std::io::{self, Read};

use thiserror::Error;

use super::address_cache::AddressCache;
use super::code_table::{self, CodeTable, Instruction, XD3_ADD, XD3_CPY, XD3_NOOP, XD3_RUN};
use super::header::{FileHeader, WindowHeader};
use super::{secondary, varint};

/// Default cap on the total reconstructed size.
pub const DEFAULT_MAX_OUTPUT_LEN: usize = 64 << 20;

// ---------------------------------------------------------------------------
// Errors and options
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("checksum mismatch: expected {expected:#010X}, got {actual:#010X}")]
    ChecksumMismatch { expected: u32, actual: u32 },
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// A window's source segment lies outside the source.
    #[error("source window {offset}+{len} is outside the {available}-byte source")]
    SourceOutOfRange { offset: u64, len: u64, available: u64 },
    #[error("decoded output would exceed the {limit}-byte limit")]
    OutputLimitExceeded { limit: usize },
}

/// Map header parse failures onto decoder errors.
fn header_error(e: io::Error) -> DecodeError {
    match e.kind() {
        io::ErrorKind::InvalidData => DecodeError::InvalidInput(e.to_string()),
        io::ErrorKind::Unsupported => DecodeError::Unsupported(e.to_string()),
        io::ErrorKind::UnexpectedEof => DecodeError::InvalidInput("truncated header".into()),
        _ => DecodeError::Io(e),
    }
}

/// Runtime decoding options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Verify the Adler-32 of windows that carry one.
    pub verify_checksum: bool,
    /// Upper bound on the total reconstructed size.
    pub max_output_len: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            verify_checksum: true,
            max_output_len: DEFAULT_MAX_OUTPUT_LEN,
        }
    }
}

impl DecodeOptions {
    pub fn with_checksum(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }

    pub fn with_max_output_len(mut self, limit: usize) -> Self {
        self.max_output_len = limit;
        self
    }
}

// ---------------------------------------------------------------------------
// Source provider trait
// ---------------------------------------------------------------------------

/// Provides source data for COPY instructions that reference source bytes.
pub trait SourceProvider {
    /// Read bytes from the source at absolute offset `offset` into `buf`.
    /// Returns the number of bytes actually read.
    fn read_source(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, DecodeError>;

    /// Total source length (if known).
    fn source_len(&self) -> Option<u64>;

    /// Contiguous view of `[offset, offset + len)` when the source is in memory.
    fn source_slice(&self, _offset: u64, _len: usize) -> Option<&[u8]> {
        None
    }
}

impl SourceProvider for &[u8] {
    fn read_source(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, DecodeError> {
        let Some(available) = usize::try_from(offset).ok().and_then(|o| self.get(o..)) else {
            return Ok(0);
        };
        let n = buf.len().min(available.len());
        buf[..n].copy_from_slice(&available[..n]);
        Ok(n)
    }

    fn source_len(&self) -> Option<u64> {
        Some(self.len() as u64)
    }

    fn source_slice(&self, offset: u64, len: usize) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        self.get(start..start.checked_add(len)?)
    }
}

/// For delta streams that never reference a source.
pub struct NoSource;

impl SourceProvider for NoSource {
    fn read_source(&mut self, _offset: u64, _buf: &mut [u8]) -> Result<usize, DecodeError> {
        Err(DecodeError::InvalidInput(
            "COPY references source but no source provided".into(),
        ))
    }

    fn source_len(&self) -> Option<u64> {
        None
    }
}

// ---------------------------------------------------------------------------
// Window decoder
// ---------------------------------------------------------------------------

/// Borrowed DATA/INST/ADDR section triplet for one window.
#[derive(Clone, Copy)]
struct WindowSections<'a> {
    data: &'a [u8],
    inst: &'a [u8],
    addr: &'a [u8],
}

/// Where the copy window of the current window lives.
#[derive(Clone, Copy)]
enum CopyWindow {
    None,
    /// `copy_window_offset` into the source.
    Source,
    /// Index into the output buffer (VCD_TARGET).
    Target(usize),
}

/// Per-window cursor over the three sections.
struct WindowCursor<'a> {
    sections: WindowSections<'a>,
    data_pos: usize,
    inst_pos: usize,
    addr_pos: usize,
    /// Bytes produced so far in this window.
    target_pos: u64,
}

impl<'a> WindowCursor<'a> {
    fn new(sections: WindowSections<'a>) -> Self {
        Self {
            sections,
            data_pos: 0,
            inst_pos: 0,
            addr_pos: 0,
            target_pos: 0,
        }
    }

    fn size(&mut self, table_size: u8) -> Result<u32, DecodeError> {
        if table_size != 0 {
            return Ok(u32::from(table_size));
        }
        let (val, consumed) = varint::read_u32(&self.sections.inst[self.inst_pos..])
            .map_err(|e| DecodeError::InvalidInput(format!("bad instruction size: {e}")))?;
        self.inst_pos += consumed;
        Ok(val)
    }

    fn data(&mut self, len: usize, what: &str) -> Result<&'a [u8], DecodeError> {
        let data = self.sections.data;
        let end = self
            .data_pos
            .checked_add(len)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| DecodeError::InvalidInput(format!("data section underflow ({what})")))?;
        let bytes = &data[self.data_pos..end];
        self.data_pos = end;
        Ok(bytes)
    }
}

#[allow(clippy::too_many_arguments)]
fn reconstruct_window<S: SourceProvider>(
    header: &WindowHeader,
    sections: WindowSections<'_>,
    copy_window: CopyWindow,
    source: &mut S,
    verify_checksum: bool,
    copy_buf: &mut Vec<u8>,
    output: &mut Vec<u8>,
    acache: &mut AddressCache,
) -> Result<(), DecodeError> {
    let base_offset = output.len();
    output.reserve(header.target_window_len as usize);
    acache.init();

    let code_table = code_table::default_code_table();
    let mut cur = WindowCursor::new(sections);

    while cur.inst_pos < cur.sections.inst.len() {
        let entry = code_table[cur.sections.inst[cur.inst_pos] as usize];
        cur.inst_pos += 1;

        for (itype, table_size) in [(entry.type1, entry.size1), (entry.type2, entry.size2)] {
            if itype == XD3_NOOP {
                continue;
            }
            let size = cur.size(table_size)?;
            if cur.target_pos + u64::from(size) > header.target_window_len {
                return Err(DecodeError::InvalidInput(
                    "instruction overflows target window".into(),
                ));
            }
            let len = size as usize;

            match itype {
                XD3_RUN => {
                    let byte = cur.data(1, "RUN")?[0];
                    output.resize(output.len() + len, byte);
                }
                XD3_ADD => {
                    let bytes = cur.data(len, "ADD")?;
                    output.extend_from_slice(bytes);
                }
                _ => {
                    let here = header.copy_window_len + cur.target_pos;
                    let (addr, consumed) = acache
                        .decode(
                            itype - XD3_CPY,
                            &cur.sections.addr[cur.addr_pos..],
                            here,
                        )
                        .map_err(|e| DecodeError::InvalidInput(format!("address decode: {e}")))?;
                    cur.addr_pos += consumed;
                    copy(
                        header,
                        copy_window,
                        addr,
                        len,
                        base_offset,
                        source,
                        copy_buf,
                        output,
                    )?;
                }
            }
            cur.target_pos += u64::from(size);
        }
    }

    let unused_data = cur.sections.data.len() - cur.data_pos;
    let unused_addr = cur.sections.addr.len() - cur.addr_pos;
    if unused_data != 0 || unused_addr != 0 {
        return Err(DecodeError::InvalidInput(format!(
            "section size mismatch: {unused_data} data and {unused_addr} address bytes unused"
        )));
    }

    let written = output.len() - base_offset;
    if written as u64 != header.target_window_len {
        return Err(DecodeError::InvalidInput(format!(
            "target size mismatch: expected {}, got {written}",
            header.target_window_len
        )));
    }

    if verify_checksum && let Some(expected) = header.adler32 {
        let actual = adler32(&output[base_offset..]);
        if actual != expected {
            return Err(DecodeError::ChecksumMismatch { expected, actual });
        }
    }

    Ok(())
}

/// Execute one COPY of `len` bytes from `addr` in the window's address space.
#[allow(clippy::too_many_arguments)]
#[inline]
fn copy<S: SourceProvider>(
    header: &WindowHeader,
    copy_window: CopyWindow,
    addr: u64,
    len: usize,
    base_offset: usize,
    source: &mut S,
    copy_buf: &mut Vec<u8>,
    output: &mut Vec<u8>,
) -> Result<(), DecodeError> {
    let copy_window_len = header.copy_window_len;

    if addr < copy_window_len {
        if addr + len as u64 > copy_window_len {
            return Err(DecodeError::InvalidInput(
                "COPY spans copy window/target boundary".into(),
            ));
        }
        match copy_window {
            CopyWindow::Source => {
                let offset = header.copy_window_offset + addr;
                if let Some(slice) = source.source_slice(offset, len) {
                    output.extend_from_slice(slice);
                } else {
                    copy_buf.resize(len, 0);
                    let n = source.read_source(offset, copy_buf)?;
                    if n < len {
                        return Err(DecodeError::InvalidInput(format!(
                            "source underflow: requested {len} bytes at offset {offset}, got {n}"
                        )));
                    }
                    output.extend_from_slice(&copy_buf[..len]);
                }
            }
            CopyWindow::Target(start) => {
                let from = start + addr as usize;
                output.extend_from_within(from..from + len);
            }
            CopyWindow::None => {
                return Err(DecodeError::InvalidInput(
                    "COPY from a window without a copy window".into(),
                ));
            }
        }
        return Ok(());
    }

    let from = base_offset + (addr - copy_window_len) as usize;
    if from + len <= output.len() {
        output.extend_from_within(from..from + len);
    } else {
        // Overlapping self-copy: every byte may read one written by this COPY.
        for i in 0..len {
            let byte = output[from + i];
            output.push(byte);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Stream decoder
// ---------------------------------------------------------------------------

/// Decodes a complete VCDIFF stream (file header + all windows).
pub struct StreamDecoder<R: Read> {
    reader: R,
    file_header: Option<FileHeader>,
    options: DecodeOptions,
    /// Target bytes produced by earlier windows.
    emitted: u64,
    data_buf: Vec<u8>,
    inst_buf: Vec<u8>,
    addr_buf: Vec<u8>,
    copy_buf: Vec<u8>,
    acache: AddressCache,
}

impl<R: Read> StreamDecoder<R> {
    pub fn new(reader: R, verify_checksum: bool) -> Self {
        Self::with_options(reader, DecodeOptions::default().with_checksum(verify_checksum))
    }

    pub fn with_options(reader: R, options: DecodeOptions) -> Self {
        Self {
            reader,
            file_header: None,
            options,
            emitted: 0,
            data_buf: Vec::new(),
            inst_buf: Vec::new(),
            addr_buf: Vec::new(),
            copy_buf: Vec::new(),
            acache: AddressCache::new(),
        }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Read (once) and return the file header.
    pub fn read_header(&mut self) -> Result<&FileHeader, DecodeError> {
        let hdr = match self.file_header.take() {
            Some(hdr) => hdr,
            None => FileHeader::decode(&mut self.reader).map_err(header_error)?,
        };
        let hdr: &FileHeader = self.file_header.insert(hdr);
        Ok(hdr)
    }

    /// The secondary compressor id from the file header (if any).
    pub fn secondary_id(&self) -> Option<u8> {
        self.file_header.as_ref().and_then(|h| h.secondary_id)
    }

    /// Total target bytes produced so far.
    pub fn bytes_emitted(&self) -> u64 {
        self.emitted
    }

    /// Read the next window header and its raw (still compressed) sections.
    ///
    /// Returns `None` at the end of the stream.
    pub fn next_window(&mut self) -> Result<Option<WindowHeader>, DecodeError> {
        self.read_header()?;
        let Some(wh) = WindowHeader::decode(&mut self.reader).map_err(header_error)? else {
            return Ok(None);
        };

        read_section(&mut self.reader, &mut self.data_buf, wh.data_len, "data")?;
        read_section(&mut self.reader, &mut self.inst_buf, wh.inst_len, "instruction")?;
        read_section(&mut self.reader, &mut self.addr_buf, wh.addr_len, "address")?;
        Ok(Some(wh))
    }

    /// Sections of the window last returned by `next_window`, decompressed.
    pub fn sections(
        &self,
        wh: &WindowHeader,
    ) -> Result<secondary::DecompressedSections<'_>, DecodeError> {
        secondary::decompress_sections(
            &self.data_buf,
            &self.inst_buf,
            &self.addr_buf,
            wh.delta_indicator,
            self.secondary_id(),
            secondary::SectionLimits::for_target_window(wh.target_window_len),
        )
    }

    /// Decode the next window into `output`.
    ///
    /// `output` may hold earlier windows; VCD_TARGET windows can only copy
    /// from bytes still present in it. Returns `Ok(false)` when there are
    /// no more windows.
    pub fn decode_window<S: SourceProvider>(
        &mut self,
        source: &mut S,
        output: &mut Vec<u8>,
    ) -> Result<bool, DecodeError> {
        let Some(wh) = self.next_window()? else {
            return Ok(false);
        };

        let limit = self.options.max_output_len;
        if self.emitted.saturating_add(wh.target_window_len) > limit as u64 {
            return Err(DecodeError::OutputLimitExceeded { limit });
        }

        let copy_window = self.locate_copy_window(&wh, source, output.len())?;
        log::trace!(
            "window at target offset {}: {} bytes, copy window {}+{} ({:?}), sections {}/{}/{}",
            self.emitted,
            wh.target_window_len,
            wh.copy_window_offset,
            wh.copy_window_len,
            wh.indicator,
            wh.data_len,
            wh.inst_len,
            wh.addr_len,
        );

        let (data, inst, addr) = secondary::decompress_sections(
            &self.data_buf,
            &self.inst_buf,
            &self.addr_buf,
            wh.delta_indicator,
            self.secondary_id(),
            secondary::SectionLimits::for_target_window(wh.target_window_len),
        )?;
        reconstruct_window(
            &wh,
            WindowSections {
                data: &data,
                inst: &inst,
                addr: &addr,
            },
            copy_window,
            source,
            self.options.verify_checksum,
            &mut self.copy_buf,
            output,
            &mut self.acache,
        )?;

        self.emitted += wh.target_window_len;
        Ok(true)
    }

    /// Decode all remaining windows, appending to `output`.
    pub fn decode_all<S: SourceProvider>(
        &mut self,
        source: &mut S,
        output: &mut Vec<u8>,
    ) -> Result<(), DecodeError> {
        while self.decode_window(source, output)? {}
        Ok(())
    }

    /// Check the window's copy window against the source or retained target.
    fn locate_copy_window<S: SourceProvider>(
        &self,
        wh: &WindowHeader,
        source: &S,
        retained: usize,
    ) -> Result<CopyWindow, DecodeError> {
        let end = wh
            .copy_window_offset
            .checked_add(wh.copy_window_len)
            .ok_or_else(|| DecodeError::InvalidInput("copy window overflows".into()))?;

        if wh.has_source() {
            if let Some(available) = source.source_len()
                && end > available
            {
                return Err(DecodeError::SourceOutOfRange {
                    offset: wh.copy_window_offset,
                    len: wh.copy_window_len,
                    available,
                });
            }
            return Ok(CopyWindow::Source);
        }

        if wh.has_target() {
            if end > self.emitted {
                return Err(DecodeError::InvalidInput(format!(
                    "VCD_TARGET window {}+{} runs past the {} bytes decoded so far",
                    wh.copy_window_offset, wh.copy_window_len, self.emitted
                )));
            }
            // The last byte of `output` is target byte `emitted - 1`.
            let back = self.emitted - wh.copy_window_offset;
            if back > retained as u64 {
                return Err(DecodeError::Unsupported(
                    "VCD_TARGET window refers to target bytes that are no longer retained".into(),
                ));
            }
            return Ok(CopyWindow::Target(retained - back as usize));
        }

        Ok(CopyWindow::None)
    }
}

/// Read exactly `len` bytes into `buf` without trusting `len` for allocation.
fn read_section<R: Read>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    len: u64,
    what: &str,
) -> Result<(), DecodeError> {
    buf.clear();
    reader.by_ref().take(len).read_to_end(buf)?;
    if (buf.len() as u64) < len {
        return Err(DecodeError::InvalidInput(format!(
            "truncated {what} section: expected {len} bytes, got {}",
            buf.len()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory convenience
// ---------------------------------------------------------------------------

/// Decode a VCDIFF delta held in memory against `source`.
pub fn decode_memory(delta: &[u8], source: &[u8]) -> Result<Vec<u8>, DecodeError> {
    decode_memory_with(delta, source, &DecodeOptions::default())
}

/// `decode_memory` with explicit options.
pub fn decode_memory_with(
    delta: &[u8],
    source: &[u8],
    options: &DecodeOptions,
) -> Result<Vec<u8>, DecodeError> {
    let mut decoder = StreamDecoder::with_options(delta, *options);
    let mut output = Vec::new();
    let mut src: &[u8] = source;
    decoder.decode_all(&mut src, &mut output)?;
    Ok(output)
}

// ---------------------------------------------------------------------------
// Adler-32
// ---------------------------------------------------------------------------

/// Adler-32 as stored in xdelta3 window headers.
pub fn adler32(data: &[u8]) -> u32 {
    #[cfg(feature = "adler32")]
    {
        let mut hasher = simd_adler32::Adler32::new();
        hasher.write(data);
        hasher.finish()
    }
    #[cfg(not(feature = "adler32"))]
    {
        const MOD_ADLER: u32 = 65521;
        let (mut a, mut b) = (1u32, 0u32);
        for &byte in data {
            a = (a + u32::from(byte)) % MOD_ADLER;
            b = (b + a) % MOD_ADLER;
        }
        (b << 16) | a
    }
}

// ---------------------------------------------------------------------------
// Instruction iterator (for inspection/debugging)
// ---------------------------------------------------------------------------

/// Iterate over the decoded instructions of one window.
pub struct InstructionIterator<'a> {
    inst_data: &'a [u8],
    addr_data: &'a [u8],
    inst_pos: usize,
    addr_pos: usize,
    code_table: &'static CodeTable,
    acache: AddressCache,
    copy_window_len: u64,
    target_pos: u64,
    /// Second half of a double opcode, not yet yielded.
    pending_second: Option<(u8, u8)>,
    failed: bool,
}

impl<'a> InstructionIterator<'a> {
    pub fn new(inst_section: &'a [u8], addr_section: &'a [u8], copy_window_len: u64) -> Self {
        Self {
            inst_data: inst_section,
            addr_data: addr_section,
            inst_pos: 0,
            addr_pos: 0,
            code_table: code_table::default_code_table(),
            acache: AddressCache::new(),
            copy_window_len,
            target_pos: 0,
            pending_second: None,
            failed: false,
        }
    }

    fn resolve_half(&mut self, itype: u8, table_size: u8) -> Result<Instruction, DecodeError> {
        let size = if table_size == 0 {
            let (val, consumed) = varint::read_u32(&self.inst_data[self.inst_pos..])
                .map_err(|e| DecodeError::InvalidInput(format!("size varint: {e}")))?;
            self.inst_pos += consumed;
            val
        } else {
            u32::from(table_size)
        };

        let inst = match itype {
            XD3_RUN => Instruction::Run { len: size },
            XD3_ADD => Instruction::Add { len: size },
            _ => {
                let mode = itype - XD3_CPY;
                let here = self.copy_window_len + self.target_pos;
                let (addr, consumed) = self
                    .acache
                    .decode(mode, &self.addr_data[self.addr_pos..], here)
                    .map_err(|e| DecodeError::InvalidInput(format!("address: {e}")))?;
                self.addr_pos += consumed;
                Instruction::Copy {
                    len: size,
                    addr,
                    mode,
                }
            }
        };

        self.target_pos += u64::from(size);
        Ok(inst)
    }
}

impl Iterator for InstructionIterator<'_> {
    type Item = Result<Instruction, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let (itype, size) = match self.pending_second.take() {
            Some(half) => half,
            None => {
                let &opcode = self.inst_data.get(self.inst_pos)?;
                self.inst_pos += 1;
                let entry = self.code_table[opcode as usize];
                if entry.is_double() {
                    self.pending_second = Some((entry.type2, entry.size2));
                }
                (entry.type1, entry.size1)
            }
        };

        let result = self.resolve_half(itype, size);
        self.failed = result.is_err();
        Some(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcdiff::header::{DeltaIndicator, WindowIndicator};

    /// Hand-assembled window: raw sections plus a header describing them.
    struct Window {
        indicator: WindowIndicator,
        copy: (u64, u64),
        target: Vec<u8>,
        data: Vec<u8>,
        inst: Vec<u8>,
        addr: Vec<u8>,
    }

    impl Window {
        fn new(target: &[u8]) -> Self {
            Self {
                indicator: WindowIndicator::ADLER32,
                copy: (0, 0),
                target: target.to_vec(),
                data: Vec::new(),
                inst: Vec::new(),
                addr: Vec::new(),
            }
        }

        fn source(mut self, offset: u64, len: u64) -> Self {
            self.indicator |= WindowIndicator::SOURCE;
            self.copy = (offset, len);
            self
        }

        fn target_window(mut self, offset: u64, len: u64) -> Self {
            self.indicator |= WindowIndicator::TARGET;
            self.copy = (offset, len);
            self
        }

        fn add(mut self, bytes: &[u8]) -> Self {
            self.inst.push(1);
            varint::write_usize(&mut self.inst, bytes.len()).unwrap();
            self.data.extend_from_slice(bytes);
            self
        }

        fn run(mut self, byte: u8, len: usize) -> Self {
            self.inst.push(0);
            varint::write_usize(&mut self.inst, len).unwrap();
            self.data.push(byte);
            self
        }

        /// COPY in VCD_SELF mode (opcode 19, explicit size).
        fn copy(mut self, addr: u64, len: usize) -> Self {
            self.inst.push(19);
            varint::write_usize(&mut self.inst, len).unwrap();
            varint::write_u64(&mut self.addr, addr).unwrap();
            self
        }

        fn write(&self, out: &mut Vec<u8>) {
            let mut hdr = WindowHeader {
                indicator: self.indicator,
                copy_window_offset: self.copy.0,
                copy_window_len: self.copy.1,
                target_window_len: self.target.len() as u64,
                delta_indicator: DeltaIndicator::empty(),
                data_len: self.data.len() as u64,
                inst_len: self.inst.len() as u64,
                addr_len: self.addr.len() as u64,
                adler32: Some(adler32(&self.target)),
                ..Default::default()
            };
            hdr.enc_len = hdr.compute_enc_len();
            hdr.encode(out).unwrap();
            out.extend_from_slice(&self.data);
            out.extend_from_slice(&self.inst);
            out.extend_from_slice(&self.addr);
        }
    }

    fn delta(windows: &[Window]) -> Vec<u8> {
        let mut out = Vec::new();
        FileHeader::default().encode(&mut out).unwrap();
        for w in windows {
            w.write(&mut out);
        }
        out
    }

    #[test]
    fn decode_simple_add() {
        let d = delta(&[Window::new(b"Hello, world!").add(b"Hello, world!")]);
        assert_eq!(decode_memory(&d, &[]).unwrap(), b"Hello, world!");
    }

    #[test]
    fn decode_simple_run() {
        let d = delta(&[Window::new(&[0xAA; 50]).run(0xAA, 50)]);
        assert_eq!(decode_memory(&d, &[]).unwrap(), vec![0xAA; 50]);
    }

    #[test]
    fn decode_source_copy() {
        let source = b"ABCDEFGHIJKLMNOP";
        let d = delta(&[Window::new(b"EFGHIJKL").source(0, 16).copy(4, 8)]);
        assert_eq!(decode_memory(&d, source).unwrap(), b"EFGHIJKL");
    }

    #[test]
    fn decode_source_copy_at_window_offset() {
        let source = b"0123456789ABCDEF";
        // Copy window starts at source offset 10; addr 2 is source byte 12.
        let d = delta(&[Window::new(b"CDE").source(10, 6).copy(2, 3)]);
        assert_eq!(decode_memory(&d, source).unwrap(), b"CDE");
    }

    #[test]
    fn decode_mixed_instructions() {
        let source = b"The quick brown fox";
        let d = delta(&[Window::new(b"Helloquick world")
            .source(0, source.len() as u64)
            .add(b"Hello")
            .copy(4, 5)
            .add(b" world")]);
        assert_eq!(decode_memory(&d, source).unwrap(), b"Helloquick world");
    }

    #[test]
    fn decode_overlapping_self_copy() {
        let d = delta(&[Window::new(b"AAAAAA").add(b"A").copy(0, 5)]);
        assert_eq!(decode_memory(&d, &[]).unwrap(), b"AAAAAA");
    }

    #[test]
    fn self_copy_addresses_follow_copy_window() {
        let source = b"xyz";
        // Address 3 is the first target byte, right after the 3-byte source window.
        let d = delta(&[Window::new(b"abab").source(0, 3).add(b"ab").copy(3, 2)]);
        assert_eq!(decode_memory(&d, source).unwrap(), b"abab");
    }

    #[test]
    fn multi_window_output_concatenates() {
        let source = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
        let d = delta(&[
            Window::new(b"ABCDEFGH_changed").source(0, 8).copy(0, 8).add(b"_changed"),
            Window::new(b"MNOPQRST_different")
                .source(12, 8)
                .copy(0, 8)
                .add(b"_different"),
        ]);
        let out = decode_memory(&d, source).unwrap();
        assert_eq!(out, b"ABCDEFGH_changedMNOPQRST_different");
    }

    #[test]
    fn target_window_copies_earlier_output() {
        let d = delta(&[
            Window::new(b"hello world").add(b"hello world"),
            Window::new(b"world!").target_window(6, 5).copy(0, 5).add(b"!"),
        ]);
        assert_eq!(decode_memory(&d, &[]).unwrap(), b"hello worldworld!");
    }

    #[test]
    fn target_window_past_decoded_bytes_is_rejected() {
        let d = delta(&[
            Window::new(b"abc").add(b"abc"),
            Window::new(b"abcd").target_window(0, 4).copy(0, 4),
        ]);
        assert!(matches!(
            decode_memory(&d, &[]),
            Err(DecodeError::InvalidInput(_))
        ));
    }

    #[test]
    fn source_window_outside_source() {
        let d = delta(&[Window::new(b"abc").source(0, 10).copy(0, 3)]);
        assert!(matches!(
            decode_memory(&d, b"abcd"),
            Err(DecodeError::SourceOutOfRange {
                offset: 0,
                len: 10,
                available: 4
            })
        ));
    }

    #[test]
    fn checksum_mismatch_detected_and_skippable() {
        let mut w = Window::new(b"right").add(b"wrong");
        w.target = b"right".to_vec();
        let d = delta(&[w]);
        assert!(matches!(
            decode_memory(&d, &[]),
            Err(DecodeError::ChecksumMismatch { .. })
        ));

        let opts = DecodeOptions::default().with_checksum(false);
        assert_eq!(decode_memory_with(&d, &[], &opts).unwrap(), b"wrong");
    }

    #[test]
    fn output_limit_is_enforced() {
        let d = delta(&[Window::new(&[7; 100]).run(7, 100)]);
        let opts = DecodeOptions::default().with_max_output_len(99);
        assert!(matches!(
            decode_memory_with(&d, &[], &opts),
            Err(DecodeError::OutputLimitExceeded { limit: 99 })
        ));
        let opts = DecodeOptions::default().with_max_output_len(100);
        assert_eq!(decode_memory_with(&d, &[], &opts).unwrap().len(), 100);
    }

    #[test]
    fn instruction_overflowing_window_is_rejected() {
        let mut w = Window::new(b"ab").run(b'a', 1000);
        w.target = b"ab".to_vec();
        assert!(matches!(
            decode_memory(&delta(&[w]), &[]),
            Err(DecodeError::InvalidInput(msg)) if msg.contains("overflows")
        ));
    }

    #[test]
    fn short_output_is_size_mismatch() {
        let mut w = Window::new(b"abc").add(b"ab");
        w.target = b"abc".to_vec();
        assert!(matches!(
            decode_memory(&delta(&[w]), &[]),
            Err(DecodeError::InvalidInput(msg)) if msg.contains("mismatch")
        ));
    }

    #[test]
    fn unused_data_bytes_are_rejected() {
        let mut w = Window::new(b"abc").add(b"abc");
        w.data.push(b'd');
        assert!(matches!(
            decode_memory(&delta(&[w]), &[]),
            Err(DecodeError::InvalidInput(msg)) if msg.contains("1 data")
        ));
    }

    #[test]
    fn unused_addr_bytes_are_rejected() {
        let mut w = Window::new(b"abcabc").add(b"abc").copy(0, 3);
        w.addr.push(0);
        assert!(matches!(
            decode_memory(&delta(&[w]), &[]),
            Err(DecodeError::InvalidInput(msg)) if msg.contains("1 address")
        ));
    }

    #[test]
    fn truncated_sections_are_rejected() {
        let d = delta(&[Window::new(b"Hello").add(b"Hello")]);
        for cut in 1..d.len() - 5 {
            assert!(
                decode_memory(&d[..d.len() - cut], &[]).is_err(),
                "cut {cut} decoded"
            );
        }
    }

    #[test]
    fn header_only_stream_is_empty_output() {
        assert_eq!(decode_memory(&delta(&[]), &[]).unwrap(), b"");
    }

    #[test]
    fn zero_copy_source_slice() {
        let src: &[u8] = b"ABCDEFGHIJKLMNOP";
        assert_eq!(src.source_slice(4, 8), Some(&b"EFGHIJKL"[..]));
        assert_eq!(src.source_slice(15, 2), None);
        assert_eq!(src.source_slice(u64::MAX, 1), None);
        assert_eq!(src.source_slice(0, 0), Some(&b""[..]));
    }

    #[test]
    fn instruction_iterator_lists_window() {
        let w = Window::new(b"Helloquick").source(0, 19).add(b"Hello").copy(4, 5);
        let insts: Vec<_> = InstructionIterator::new(&w.inst, &w.addr, 19)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            insts,
            [
                Instruction::Add { len: 5 },
                Instruction::Copy {
                    len: 5,
                    addr: 4,
                    mode: 0
                }
            ]
        );
    }

    #[test]
    fn instruction_iterator_splits_double_opcodes() {
        // Opcode 163: ADD(1) + COPY(4, SELF).
        let insts: Vec<_> = InstructionIterator::new(&[163], &[0], 10)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            insts,
            [
                Instruction::Add { len: 1 },
                Instruction::Copy {
                    len: 4,
                    addr: 0,
                    mode: 0
                }
            ]
        );
    }

    #[test]
    fn instruction_iterator_stops_after_error() {
        let mut iter = InstructionIterator::new(&[19, 4], &[], 10);
        assert!(matches!(iter.next(), Some(Err(_))));
        assert!(iter.next().is_none());
    }

    #[test]
    fn known_adler32() {
        assert_eq!(adler32(b""), 1);
        assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
    }
}
