// Secondary decompression of VCDIFF DATA/INST/ADDR sections.
//
// The file header names one secondary compressor; each window's delta
// indicator says which of its three sections went through it. Ids follow
// xdelta3:
//   1 = DJW, 16 = FGK (xdelta3 Huffman coders, not decodable here)
//   2 = LZMA (lzma-rs, feature `lzma-secondary`)
//   3 = Zlib (flate2, feature `zlib-secondary`)

use std::borrow::Cow;
use std::io;

use super::decoder::DecodeError;
use super::header::{self, DeltaIndicator};

/// Decoded DATA/INST/ADDR sections, borrowed when a section was stored raw.
pub type DecompressedSections<'a> = (Cow<'a, [u8]>, Cow<'a, [u8]>, Cow<'a, [u8]>);

/// A secondary decompressor for VCDIFF sections.
///
/// ```
/// use vcdelta::vcdiff::DecodeError;
/// use vcdelta::vcdiff::secondary::SecondaryBackend;
///
/// struct Reversed;
///
/// impl SecondaryBackend for Reversed {
///     fn id(&self) -> u8 { 200 }
///     fn name(&self) -> &'static str { "reversed" }
///     fn decompress(&self, data: &[u8], limit: usize) -> Result<Vec<u8>, DecodeError> {
///         if data.len() > limit {
///             return Err(DecodeError::InvalidInput("section too large".into()));
///         }
///         Ok(data.iter().rev().copied().collect())
///     }
/// }
///
/// assert_eq!(Reversed.decompress(b"cba", 16).unwrap(), b"abc");
/// assert!(Reversed.decompress(b"cba", 2).is_err());
/// ```
pub trait SecondaryBackend: Send + Sync {
    /// Compressor id as stored in the file header.
    fn id(&self) -> u8;

    fn name(&self) -> &'static str;

    /// Decompress one section. Output longer than `limit` bytes is an error.
    fn decompress(&self, data: &[u8], limit: usize) -> Result<Vec<u8>, DecodeError>;
}

/// Per-section output limits for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLimits {
    pub data: usize,
    pub inst: usize,
    pub addr: usize,
}

impl SectionLimits {
    /// Same limit for all three sections.
    pub const fn uniform(limit: usize) -> Self {
        Self {
            data: limit,
            inst: limit,
            addr: limit,
        }
    }

    /// Limits for a window producing `target_window_len` bytes.
    ///
    /// Every DATA byte is consumed by an ADD or RUN, so DATA never exceeds the
    /// target window. INST and ADDR are capped at the hard window size.
    pub fn for_target_window(target_window_len: u64) -> Self {
        let hard = header::HARD_MAX_WINSIZE as usize;
        Self {
            data: usize::try_from(target_window_len).unwrap_or(hard).min(hard),
            inst: hard,
            addr: hard,
        }
    }
}

#[cfg(any(feature = "lzma-secondary", feature = "zlib-secondary"))]
fn too_large(what: &str, limit: usize) -> DecodeError {
    DecodeError::InvalidInput(format!("{what} section inflates past {limit} bytes"))
}

/// `Write` sink that refuses to grow past `limit` bytes.
#[cfg(feature = "lzma-secondary")]
struct LimitedWriter {
    buf: Vec<u8>,
    limit: usize,
    overflowed: bool,
}

#[cfg(feature = "lzma-secondary")]
impl io::Write for LimitedWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        if self.buf.len().saturating_add(bytes.len()) > self.limit {
            self.overflowed = true;
            return Err(io::Error::other("output limit reached"));
        }
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LZMA
// ---------------------------------------------------------------------------

/// LZMA secondary decompressor (id 2).
#[cfg(feature = "lzma-secondary")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LzmaBackend;

#[cfg(feature = "lzma-secondary")]
impl SecondaryBackend for LzmaBackend {
    fn id(&self) -> u8 {
        header::VCD_LZMA_ID
    }

    fn name(&self) -> &'static str {
        "lzma"
    }

    fn decompress(&self, data: &[u8], limit: usize) -> Result<Vec<u8>, DecodeError> {
        let mut input = io::BufReader::new(io::Cursor::new(data));
        let mut output = LimitedWriter {
            buf: Vec::new(),
            limit,
            overflowed: false,
        };
        // The dictionary buffer fills before anything reaches the writer.
        let options = lzma_rs::decompress::Options {
            memlimit: Some(limit.max(1)),
            ..Default::default()
        };
        match lzma_rs::lzma_decompress_with_options(&mut input, &mut output, &options) {
            Ok(()) => Ok(output.buf),
            Err(_) if output.overflowed => Err(too_large("LZMA", limit)),
            Err(e) => Err(DecodeError::InvalidInput(format!("LZMA section: {e}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Zlib
// ---------------------------------------------------------------------------

/// Zlib secondary decompressor (id 3). Sections are zlib-framed deflate.
#[cfg(feature = "zlib-secondary")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ZlibBackend;

#[cfg(feature = "zlib-secondary")]
impl SecondaryBackend for ZlibBackend {
    fn id(&self) -> u8 {
        header::VCD_ZLIB_ID
    }

    fn name(&self) -> &'static str {
        "zlib"
    }

    fn decompress(&self, data: &[u8], limit: usize) -> Result<Vec<u8>, DecodeError> {
        use flate2::read::ZlibDecoder;
        use io::Read;

        let mut output = Vec::new();
        ZlibDecoder::new(data)
            .take(limit as u64 + 1)
            .read_to_end(&mut output)
            .map_err(|e| DecodeError::InvalidInput(format!("Zlib section: {e}")))?;
        if output.len() > limit {
            return Err(too_large("Zlib", limit));
        }
        Ok(output)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Look up the decompressor for the id declared in the file header.
pub fn backend_for_id(secondary_id: Option<u8>) -> Result<Box<dyn SecondaryBackend>, DecodeError> {
    match secondary_id {
        #[cfg(feature = "lzma-secondary")]
        Some(header::VCD_LZMA_ID) => Ok(Box::new(LzmaBackend)),

        #[cfg(feature = "zlib-secondary")]
        Some(header::VCD_ZLIB_ID) => Ok(Box::new(ZlibBackend)),

        Some(id) => Err(DecodeError::Unsupported(match header::secondary_name(id) {
            Some(name) => format!("secondary compressor {name} (id {id}) is not available"),
            None => format!("unknown secondary compressor id {id}"),
        })),
        None => Err(DecodeError::InvalidInput(
            "window declares compressed sections but the file header names no compressor".into(),
        )),
    }
}

/// Undo secondary compression on the sections flagged in `del_ind`.
pub fn decompress_sections<'a>(
    data: &'a [u8],
    inst: &'a [u8],
    addr: &'a [u8],
    del_ind: DeltaIndicator,
    secondary_id: Option<u8>,
    limits: SectionLimits,
) -> Result<DecompressedSections<'a>, DecodeError> {
    if del_ind.is_empty() {
        return Ok((data.into(), inst.into(), addr.into()));
    }

    let backend = backend_for_id(secondary_id)?;
    let section = |raw: &'a [u8],
                   flag: DeltaIndicator,
                   limit: usize|
     -> Result<Cow<'a, [u8]>, DecodeError> {
        if del_ind.contains(flag) {
            Ok(Cow::Owned(backend.decompress(raw, limit)?))
        } else {
            Ok(Cow::Borrowed(raw))
        }
    };

    Ok((
        section(data, DeltaIndicator::DATACOMP, limits.data)?,
        section(inst, DeltaIndicator::INSTCOMP, limits.inst)?,
        section(addr, DeltaIndicator::ADDRCOMP, limits.addr)?,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


