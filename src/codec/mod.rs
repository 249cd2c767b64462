// Delta codec: stateless decode and the stateful base-tracking chain.
//
// - `error`      - CodecError / ErrorKind and engine error classification
// - `identifier` - identifier validity
// - `stateful`   - DeltaCodec, the (base, id) state machine

pub mod error;
pub mod identifier;
pub mod stateful;

pub use error::{CodecError, ErrorKind};
pub use identifier::is_valid_id;
pub use stateful::{DeltaCodec, TrackedBase};

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::io::{self, DecodeStats};
use crate::validator::{self, NotDelta};
use crate::vcdiff::{self, DecodeError, DecodeOptions};

/// Bytes of a delta file handed to the validator before streaming.
const HEADER_PEEK: u64 = 64 * 1024;

/// Decode `delta` against `base` with default options.
///
/// Touches no codec state.
pub fn decode(delta: &[u8], base: &[u8]) -> Result<Vec<u8>, CodecError> {
    decode_with_options(delta, base, &DecodeOptions::default())
}

/// Decode `delta` against `base`.
///
/// An empty base is `InvalidBaseData` and a delta that fails the validator is
/// `InvalidDeltaData`; both are reported before the engine runs.
pub fn decode_with_options(
    delta: &[u8],
    base: &[u8],
    options: &DecodeOptions,
) -> Result<Vec<u8>, CodecError> {
    if base.is_empty() {
        return Err(CodecError::InvalidBaseData("base payload is empty".into()));
    }
    validator::inspect(delta)?;
    Ok(vcdiff::decode_memory_with(delta, base, options)?)
}

/// File-to-file counterpart of `decode_with_options`.
///
/// The base is read into memory and the delta is streamed window by window.
/// Errors are classified as for the in-memory path, and a failed decode
/// leaves no output file behind.
pub fn decode_file(
    base_path: &Path,
    delta_path: &Path,
    output_path: &Path,
    options: &DecodeOptions,
) -> Result<DecodeStats, CodecError> {
    let base_len = std::fs::metadata(base_path).map_err(DecodeError::Io)?.len();
    if base_len == 0 {
        return Err(CodecError::InvalidBaseData("base file is empty".into()));
    }
    check_delta_header(delta_path)?;
    Ok(io::decode_file(base_path, delta_path, output_path, *options)?)
}

fn check_delta_header(path: &Path) -> Result<(), CodecError> {
    let mut head = Vec::new();
    File::open(path)
        .and_then(|f| f.take(HEADER_PEEK).read_to_end(&mut head))
        .map_err(DecodeError::Io)?;
    match validator::inspect(&head) {
        // Application header longer than the peek; the decoder reads it.
        Err(NotDelta::TruncatedAppHeader) if head.len() as u64 == HEADER_PEEK => Ok(()),
        other => other.map(drop).map_err(CodecError::from),
    }
}


