// Cheap structural check for VCDIFF deltas.
//
// Looks at the file header only: magic, version, indicator bits and the
// optional fields those bits declare. Window bodies are never read, so a
// buffer that passes here can still fail to decode.

use thiserror::Error;

use crate::vcdiff::header::{HeaderIndicator, MIN_HEADER_LEN, VCDIFF_MAGIC};
use crate::vcdiff::varint;

/// Why a buffer is not a VCDIFF delta.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NotDelta {
    #[error("too short for a VCDIFF header ({0} bytes)")]
    TooShort(usize),
    #[error("missing VCDIFF magic bytes")]
    BadMagic,
    #[error("unsupported VCDIFF version {0:#04X}")]
    BadVersion(u8),
    #[error("reserved header indicator bits set ({0:#04X})")]
    ReservedBits(u8),
    #[error("header declares a secondary compressor but the id byte is missing")]
    MissingSecondaryId,
    #[error("truncated code table length")]
    TruncatedCodeTable,
    #[error("truncated application header")]
    TruncatedAppHeader,
}

/// What the file header of a delta declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSummary {
    pub indicator: HeaderIndicator,
    pub secondary_id: Option<u8>,
    /// Declared length of the custom code table, if any.
    pub code_table_len: Option<u64>,
    /// Length of the application header, if any.
    pub app_header_len: Option<u64>,
    /// Bytes covered by the fields above (the whole header unless a code
    /// table is present, whose body is not walked).
    pub header_len: usize,
}

/// Whether `buf` starts with a well-formed VCDIFF file header.
///
/// ```
/// assert!(vcdelta::is_delta(&[0xD6, 0xC3, 0xC4, 0x00, 0x00]));
/// assert!(!vcdelta::is_delta(b"{\"json\":true}"));
/// assert!(!vcdelta::is_delta(&[]));
/// ```
pub fn is_delta(buf: &[u8]) -> bool {
    inspect(buf).is_ok()
}

/// Parse just enough of `buf` to describe its file header.
pub fn inspect(buf: &[u8]) -> Result<HeaderSummary, NotDelta> {
    if buf.len() < MIN_HEADER_LEN {
        return Err(NotDelta::TooShort(buf.len()));
    }
    if buf[..3] != VCDIFF_MAGIC[..3] {
        return Err(NotDelta::BadMagic);
    }
    if buf[3] != VCDIFF_MAGIC[3] {
        return Err(NotDelta::BadVersion(buf[3]));
    }
    let raw = buf[4];
    let indicator = HeaderIndicator::from_bits(raw).ok_or(NotDelta::ReservedBits(raw))?;

    let mut pos = MIN_HEADER_LEN;

    let secondary_id = if indicator.contains(HeaderIndicator::SECONDARY) {
        let &id = buf.get(pos).ok_or(NotDelta::MissingSecondaryId)?;
        pos += 1;
        Some(id)
    } else {
        None
    };

    let code_table_len = if indicator.contains(HeaderIndicator::CODETABLE) {
        let (len, n) = varint::read_u64(&buf[pos..]).map_err(|_| NotDelta::TruncatedCodeTable)?;
        pos += n;
        Some(len)
    } else {
        None
    };

    // The application header follows the code table, whose body is not
    // parsed here; only check it when there is no code table in the way.
    let app_header_len = if indicator.contains(HeaderIndicator::APPHEADER) && code_table_len.is_none()
    {
        let (len, n) = varint::read_u64(&buf[pos..]).map_err(|_| NotDelta::TruncatedAppHeader)?;
        pos += n;
        let available = (buf.len() - pos) as u64;
        if len > available {
            return Err(NotDelta::TruncatedAppHeader);
        }
        pos += len as usize;
        Some(len)
    } else {
        None
    };

    Ok(HeaderSummary {
        indicator,
        secondary_id,
        code_table_len,
        app_header_len,
        header_len: pos,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: [u8; 5] = [0xD6, 0xC3, 0xC4, 0x00, 0x00];

    #[test]
    fn minimal_header_is_delta() {
        assert!(is_delta(&PLAIN));
        let summary = inspect(&PLAIN).unwrap();
        assert_eq!(summary.indicator, HeaderIndicator::empty());
        assert_eq!(summary.header_len, 5);
    }

    #[test]
    fn body_is_not_inspected() {
        let mut buf = PLAIN.to_vec();
        buf.extend_from_slice(&[0xFF; 32]);
        assert!(is_delta(&buf));
    }

    #[test]
    fn short_and_empty_inputs() {
        assert_eq!(inspect(&[]), Err(NotDelta::TooShort(0)));
        assert_eq!(inspect(&PLAIN[..4]), Err(NotDelta::TooShort(4)));
    }

    #[test]
    fn magic_and_version_are_checked() {
        assert_eq!(inspect(b"{\"a\":1}"), Err(NotDelta::BadMagic));
        assert_eq!(
            inspect(&[0xD6, 0xC3, 0xC4, 0x01, 0x00]),
            Err(NotDelta::BadVersion(1))
        );
    }

    #[test]
    fn reserved_indicator_bits() {
        assert_eq!(
            inspect(&[0xD6, 0xC3, 0xC4, 0x00, 0xF8]),
            Err(NotDelta::ReservedBits(0xF8))
        );
    }

    #[test]
    fn secondary_id_must_be_present() {
        assert_eq!(
            inspect(&[0xD6, 0xC3, 0xC4, 0x00, 0x01]),
            Err(NotDelta::MissingSecondaryId)
        );
        let summary = inspect(&[0xD6, 0xC3, 0xC4, 0x00, 0x01, 0x02]).unwrap();
        assert_eq!(summary.secondary_id, Some(2));
        assert_eq!(summary.header_len, 6);
    }

    #[test]
    fn app_header_must_be_complete() {
        let ok = [0xD6, 0xC3, 0xC4, 0x00, 0x04, 0x02, b'i', b'd'];
        let summary = inspect(&ok).unwrap();
        assert_eq!(summary.app_header_len, Some(2));
        assert_eq!(summary.header_len, ok.len());

        assert_eq!(inspect(&ok[..7]), Err(NotDelta::TruncatedAppHeader));
        // Length varint with its continuation bit set and nothing after it.
        assert_eq!(
            inspect(&[0xD6, 0xC3, 0xC4, 0x00, 0x04, 0x81]),
            Err(NotDelta::TruncatedAppHeader)
        );
    }

    #[test]
    fn code_table_length_must_be_complete() {
        assert_eq!(
            inspect(&[0xD6, 0xC3, 0xC4, 0x00, 0x02]),
            Err(NotDelta::TruncatedCodeTable)
        );
        let summary = inspect(&[0xD6, 0xC3, 0xC4, 0x00, 0x02, 0x10]).unwrap();
        assert_eq!(summary.code_table_len, Some(16));
    }

    #[test]
    fn all_optional_fields_together() {
        let buf = [0xD6, 0xC3, 0xC4, 0x00, 0x07, 0x02, 0x05, 0xAA];
        let summary = inspect(&buf).unwrap();
        assert_eq!(summary.secondary_id, Some(2));
        assert_eq!(summary.code_table_len, Some(5));
        assert_eq!(summary.app_header_len, None);
    }
}
