// VCDIFF file header and per-window header (RFC 3284, Sections 4.1-4.3).
//
// Parsing is streaming (`Read`) because the decoder pulls headers straight
// off the delta. Serialization is kept for tooling and test fixtures.

use std::io::{self, Read, Write};

use bitflags::bitflags;

use super::varint;

// ---------------------------------------------------------------------------
// Magic, ids and limits
// ---------------------------------------------------------------------------

/// `'V' | 0x80`, `'C' | 0x80`, `'D' | 0x80`, version 0.
pub const VCDIFF_MAGIC: [u8; 4] = [0xD6, 0xC3, 0xC4, 0x00];

/// Magic plus the header indicator byte.
pub const MIN_HEADER_LEN: usize = VCDIFF_MAGIC.len() + 1;

/// xdelta3 secondary compressor ids.
pub const VCD_DJW_ID: u8 = 1;
pub const VCD_LZMA_ID: u8 = 2;
pub const VCD_FGK_ID: u8 = 16;
/// Zlib/Deflate secondary compressor. Not understood by xdelta3 itself.
pub const VCD_ZLIB_ID: u8 = 3;

/// Maximum decoded window size (xdelta3 XD3_HARDMAXWINSIZE).
pub const HARD_MAX_WINSIZE: u64 = 1 << 24;

bitflags! {
    /// `Hdr_Indicator` byte of the file header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HeaderIndicator: u8 {
        const SECONDARY = 1 << 0;
        const CODETABLE = 1 << 1;
        const APPHEADER = 1 << 2;
    }

    /// `Win_Indicator` byte of a window header. `ADLER32` is an xdelta3 extension.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WindowIndicator: u8 {
        const SOURCE = 1 << 0;
        const TARGET = 1 << 1;
        const ADLER32 = 1 << 2;
    }

    /// `Delta_Indicator` byte: which sections carry secondary compression.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DeltaIndicator: u8 {
        const DATACOMP = 1 << 0;
        const INSTCOMP = 1 << 1;
        const ADDRCOMP = 1 << 2;
    }
}

/// Human-readable name of a secondary compressor id.
pub fn secondary_name(id: u8) -> Option<&'static str> {
    match id {
        VCD_DJW_ID => Some("djw"),
        VCD_LZMA_ID => Some("lzma"),
        VCD_ZLIB_ID => Some("zlib"),
        VCD_FGK_ID => Some("fgk"),
        _ => None,
    }
}

fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn read_byte<R: Read>(r: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

// ---------------------------------------------------------------------------
// File header
// ---------------------------------------------------------------------------

/// Parsed VCDIFF file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub indicator: HeaderIndicator,
    /// Secondary compressor id (present iff `SECONDARY`).
    pub secondary_id: Option<u8>,
    /// Application header bytes (present iff `APPHEADER`).
    pub app_header: Option<Vec<u8>>,
}

impl Default for FileHeader {
    fn default() -> Self {
        Self {
            indicator: HeaderIndicator::empty(),
            secondary_id: None,
            app_header: None,
        }
    }
}

impl FileHeader {
    /// Number of bytes this header occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        let mut len = MIN_HEADER_LEN;
        if self.indicator.contains(HeaderIndicator::SECONDARY) {
            len += 1;
        }
        if self.indicator.contains(HeaderIndicator::APPHEADER) {
            let data_len = self.app_header.as_ref().map_or(0, Vec::len);
            len += varint::sizeof_usize(data_len) + data_len;
        }
        len
    }

    /// Serialize: magic, indicator, [secondary id], [app header length + bytes].
    pub fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&VCDIFF_MAGIC)?;
        w.write_all(&[self.indicator.bits()])?;

        if self.indicator.contains(HeaderIndicator::SECONDARY) {
            w.write_all(&[self.secondary_id.unwrap_or(0)])?;
        }

        if self.indicator.contains(HeaderIndicator::APPHEADER) {
            let data = self.app_header.as_deref().unwrap_or_default();
            varint::write_usize(w, data.len())?;
            w.write_all(data)?;
        }

        Ok(())
    }

    /// Parse a file header from the front of a stream.
    ///
    /// Custom code tables are rejected with `ErrorKind::Unsupported`.
    pub fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if magic[..3] != VCDIFF_MAGIC[..3] {
            return Err(invalid_data(format!(
                "invalid VCDIFF magic: got {:02X} {:02X} {:02X}",
                magic[0], magic[1], magic[2]
            )));
        }
        if magic[3] != VCDIFF_MAGIC[3] {
            return Err(invalid_data(format!(
                "unsupported VCDIFF version: {:#04X}",
                magic[3]
            )));
        }

        let raw = read_byte(r)?;
        let indicator = HeaderIndicator::from_bits(raw)
            .ok_or_else(|| invalid_data(format!("invalid header indicator bits: {raw:#04X}")))?;

        let secondary_id = if indicator.contains(HeaderIndicator::SECONDARY) {
            Some(read_byte(r)?)
        } else {
            None
        };

        if indicator.contains(HeaderIndicator::CODETABLE) {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "VCD_CODETABLE is not supported",
            ));
        }

        let app_header = if indicator.contains(HeaderIndicator::APPHEADER) {
            let len = varint::stream_read_usize(r)?;
            let mut data = Vec::new();
            r.by_ref().take(len as u64).read_to_end(&mut data)?;
            if data.len() != len {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "truncated application header",
                ));
            }
            Some(data)
        } else {
            None
        };

        Ok(Self {
            indicator,
            secondary_id,
            app_header,
        })
    }
}

// ---------------------------------------------------------------------------
// Per-window header
// ---------------------------------------------------------------------------

/// Parsed VCDIFF per-window header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowHeader {
    pub indicator: WindowIndicator,

    /// Length of the source/target copy window (0 when neither flag is set).
    pub copy_window_len: u64,
    /// Offset of the copy window in the source (or in the target so far).
    pub copy_window_offset: u64,

    /// Length of the delta encoding that follows (redundancy check).
    pub enc_len: u64,
    /// Length of the target window to reconstruct.
    pub target_window_len: u64,
    pub delta_indicator: DeltaIndicator,

    pub data_len: u64,
    pub inst_len: u64,
    pub addr_len: u64,

    /// Adler-32 of the target window (present iff `ADLER32`).
    pub adler32: Option<u32>,
}

impl Default for WindowHeader {
    fn default() -> Self {
        Self {
            indicator: WindowIndicator::empty(),
            copy_window_len: 0,
            copy_window_offset: 0,
            enc_len: 0,
            target_window_len: 0,
            delta_indicator: DeltaIndicator::empty(),
            data_len: 0,
            inst_len: 0,
            addr_len: 0,
            adler32: None,
        }
    }
}

impl WindowHeader {
    #[inline]
    pub fn has_source(&self) -> bool {
        self.indicator.contains(WindowIndicator::SOURCE)
    }

    #[inline]
    pub fn has_target(&self) -> bool {
        self.indicator.contains(WindowIndicator::TARGET)
    }

    #[inline]
    pub fn has_copy_window(&self) -> bool {
        self.indicator
            .intersects(WindowIndicator::SOURCE | WindowIndicator::TARGET)
    }

    /// Total size of the DATA, INST and ADDR sections.
    pub fn sections_len(&self) -> u64 {
        self.data_len
            .saturating_add(self.inst_len)
            .saturating_add(self.addr_len)
    }

    /// Expected `enc_len` for the current field values.
    ///
    /// Covers everything after the `enc_len` varint itself: the target length,
    /// the delta indicator, the three section lengths, the optional checksum
    /// and the sections.
    pub fn compute_enc_len(&self) -> u64 {
        let varints = [
            self.target_window_len,
            self.data_len,
            self.inst_len,
            self.addr_len,
        ]
        .iter()
        .map(|&v| varint::sizeof_u64(v) as u64)
        .sum::<u64>();
        let checksum = if self.indicator.contains(WindowIndicator::ADLER32) {
            4
        } else {
            0
        };
        varints + 1 + checksum + self.sections_len()
    }

    /// Serialize the window header (sections are written separately).
    pub fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&[self.indicator.bits()])?;

        if self.has_copy_window() {
            varint::write_u64(w, self.copy_window_len)?;
            varint::write_u64(w, self.copy_window_offset)?;
        }

        varint::write_u64(w, self.enc_len)?;
        varint::write_u64(w, self.target_window_len)?;
        w.write_all(&[self.delta_indicator.bits()])?;
        varint::write_u64(w, self.data_len)?;
        varint::write_u64(w, self.inst_len)?;
        varint::write_u64(w, self.addr_len)?;

        if self.indicator.contains(WindowIndicator::ADLER32) {
            w.write_all(&self.adler32.unwrap_or(0).to_be_bytes())?;
        }

        Ok(())
    }

    /// Parse the next window header.
    ///
    /// Returns `None` on a clean end of stream (no byte where a window
    /// indicator would start).
    pub fn decode<R: Read>(r: &mut R) -> io::Result<Option<Self>> {
        let raw = match read_byte(r) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        };
        let indicator = WindowIndicator::from_bits(raw)
            .ok_or_else(|| invalid_data(format!("invalid window indicator bits: {raw:#04X}")))?;
        if indicator.contains(WindowIndicator::SOURCE | WindowIndicator::TARGET) {
            return Err(invalid_data(
                "VCD_SOURCE and VCD_TARGET are mutually exclusive",
            ));
        }

        let (copy_window_len, copy_window_offset) =
            if indicator.intersects(WindowIndicator::SOURCE | WindowIndicator::TARGET) {
                (varint::stream_read_u64(r)?, varint::stream_read_u64(r)?)
            } else {
                (0, 0)
            };

        let enc_len = varint::stream_read_u64(r)?;
        let target_window_len = varint::stream_read_u64(r)?;
        if target_window_len > HARD_MAX_WINSIZE {
            return Err(invalid_data(format!(
                "target window too large: {target_window_len} exceeds max {HARD_MAX_WINSIZE}"
            )));
        }

        let raw_del = read_byte(r)?;
        let delta_indicator = DeltaIndicator::from_bits(raw_del).ok_or_else(|| {
            invalid_data(format!("invalid delta indicator bits: {raw_del:#04X}"))
        })?;

        let data_len = varint::stream_read_u64(r)?;
        let inst_len = varint::stream_read_u64(r)?;
        let addr_len = varint::stream_read_u64(r)?;

        let adler32 = if indicator.contains(WindowIndicator::ADLER32) {
            let mut buf = [0u8; 4];
            r.read_exact(&mut buf)?;
            Some(u32::from_be_bytes(buf))
        } else {
            None
        };

        let hdr = Self {
            indicator,
            copy_window_len,
            copy_window_offset,
            enc_len,
            target_window_len,
            delta_indicator,
            data_len,
            inst_len,
            addr_len,
            adler32,
        };

        let expected = hdr.compute_enc_len();
        if enc_len != expected {
            return Err(invalid_data(format!(
                "enc_len mismatch: header says {enc_len}, computed {expected}"
            )));
        }

        Ok(Some(hdr))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


