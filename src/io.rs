// File-level decode helper.
//
// `decode_file()` reads the base fully into memory, streams the delta
// through a `BufReader` and the output through a `BufWriter`. With the
// `file-io` feature the output's SHA-256 is computed as it is written.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use thiserror::Error;

#[cfg(feature = "file-io")]
use sha2::Digest;

use crate::stream::DeltaDecoder;
use crate::vcdiff::decoder::{DecodeError, DecodeOptions};

const BUF_SIZE: usize = 64 * 1024;

/// Statistics returned by `decode_file()`.
#[derive(Debug, Clone)]
pub struct DecodeStats {
    /// Base file size in bytes.
    pub base_size: u64,
    /// Delta file size in bytes.
    pub delta_size: u64,
    /// Reconstructed output size in bytes.
    pub output_size: u64,
    /// Number of VCDIFF windows decoded.
    pub windows: u64,
    /// SHA-256 of the reconstructed output (`file-io` feature only).
    pub output_sha256: Option<[u8; 32]>,
}

#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Decode `delta_path` against `base_path`, writing the result to `output_path`.
///
/// On failure the output file is removed.
pub fn decode_file(
    base_path: &Path,
    delta_path: &Path,
    output_path: &Path,
    options: DecodeOptions,
) -> Result<DecodeStats, IoError> {
    let base = std::fs::read(base_path)?;

    let delta_file = File::open(delta_path)?;
    let delta_size = delta_file.metadata()?.len();
    let delta_reader = BufReader::with_capacity(BUF_SIZE, delta_file);
    let output = File::create(output_path)?;

    let mut decoder = DeltaDecoder::with_options(delta_reader, options);
    match write_output(&mut decoder, &base, output) {
        Ok((output_size, output_sha256)) => Ok(DecodeStats {
            base_size: base.len() as u64,
            delta_size,
            output_size,
            windows: decoder.windows_decoded(),
            output_sha256,
        }),
        Err(e) => {
            if let Err(rm) = std::fs::remove_file(output_path) {
                log::warn!("could not remove {}: {rm}", output_path.display());
            }
            Err(e)
        }
    }
}

fn write_output<R: Read>(
    decoder: &mut DeltaDecoder<R>,
    base: &[u8],
    output: File,
) -> Result<(u64, Option<[u8; 32]>), IoError> {
    let mut output_writer = BufWriter::with_capacity(BUF_SIZE, output);
    let mut src = base;

    #[cfg(feature = "file-io")]
    let (output_size, output_sha256) = {
        let mut hashing = HashingWriter {
            inner: &mut output_writer,
            hasher: sha2::Sha256::new(),
        };
        let size = decoder.decode_to(&mut src, &mut hashing)?;
        (size, Some(hashing.hasher.finalize().into()))
    };
    #[cfg(not(feature = "file-io"))]
    let (output_size, output_sha256) = (decoder.decode_to(&mut src, &mut output_writer)?, None);

    output_writer.flush()?;
    Ok((output_size, output_sha256))
}

/// SHA-256 of an in-memory payload.
#[cfg(feature = "file-io")]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    sha2::Sha256::digest(data).into()
}

/// Lowercase hex rendering of a digest.
pub fn to_hex(digest: &[u8]) -> String {
    use std::fmt::Write as _;
    digest.iter().fold(String::with_capacity(digest.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

#[cfg(feature = "file-io")]
struct HashingWriter<'a, W: Write> {
    inner: &'a mut W,
    hasher: sha2::Sha256,
}

#[cfg(feature = "file-io")]
impl<W: Write> Write for HashingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


