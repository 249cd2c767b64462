// VCDIFF variable-length integers (RFC 3284, Section 2).
//
// Base-128, big-endian: the most significant 7-bit group comes first and
// every byte except the last has bit 7 set.

use std::io::{self, Read, Write};

use thiserror::Error;

/// Maximum encoded length for a 64-bit value (ceil(64/7) = 10).
pub const MAX_VARINT_LEN: usize = 10;

/// If any of these bits are set before a shift, the next `<< 7` overflows.
const U32_OVERFLOW_MASK: u32 = 0xFE00_0000;
const U64_OVERFLOW_MASK: u64 = 0xFE00_0000_0000_0000;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VarIntError {
    /// Not enough input bytes to complete the integer.
    #[error("varint underflow (truncated input)")]
    Underflow,
    /// Value would overflow the target integer type.
    #[error("varint overflow")]
    Overflow,
}

impl From<VarIntError> for io::Error {
    fn from(e: VarIntError) -> io::Error {
        match e {
            VarIntError::Underflow => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            VarIntError::Overflow => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Fold one more byte into a 64-bit accumulator.
///
/// Returns `Ok(true)` when `byte` terminated the integer.
#[inline]
fn push_u64(acc: &mut u64, byte: u8) -> Result<bool, VarIntError> {
    if *acc & U64_OVERFLOW_MASK != 0 {
        return Err(VarIntError::Overflow);
    }
    *acc = (*acc << 7) | u64::from(byte & 0x7F);
    Ok(byte & 0x80 == 0)
}

/// Decode a `u64` from the front of `data`.
/// Returns `(value, bytes_consumed)`.
pub fn read_u64(data: &[u8]) -> Result<(u64, usize), VarIntError> {
    let mut val = 0u64;
    for (i, &byte) in data.iter().enumerate() {
        if push_u64(&mut val, byte)? {
            return Ok((val, i + 1));
        }
    }
    Err(VarIntError::Underflow)
}

/// Decode a `u32` from the front of `data`.
/// Instruction sizes are bounded to 32 bits, as in xdelta3.
pub fn read_u32(data: &[u8]) -> Result<(u32, usize), VarIntError> {
    let mut val = 0u32;
    for (i, &byte) in data.iter().enumerate() {
        if val & U32_OVERFLOW_MASK != 0 {
            return Err(VarIntError::Overflow);
        }
        val = (val << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((val, i + 1));
        }
    }
    Err(VarIntError::Underflow)
}

/// Read a `u64` varint from a streaming source.
pub fn stream_read_u64<R: Read>(r: &mut R) -> io::Result<u64> {
    let mut val = 0u64;
    let mut buf = [0u8; 1];
    loop {
        r.read_exact(&mut buf)?;
        if push_u64(&mut val, buf[0])? {
            return Ok(val);
        }
    }
}

/// Read a `usize` varint from a streaming source.
pub fn stream_read_usize<R: Read>(r: &mut R) -> io::Result<usize> {
    let val = stream_read_u64(r)?;
    usize::try_from(val).map_err(|_| VarIntError::Overflow.into())
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode `num` into the tail of `buf`, returning the encoded slice.
#[inline]
pub fn encode_u64(mut num: u64, buf: &mut [u8; MAX_VARINT_LEN]) -> &[u8] {
    let mut i = MAX_VARINT_LEN;
    let mut continuation = 0u8;
    loop {
        i -= 1;
        buf[i] = (num as u8 & 0x7F) | continuation;
        continuation = 0x80;
        num >>= 7;
        if num == 0 {
            break;
        }
    }
    &buf[i..]
}

/// Encode a `u64` and write it to a sink.
pub fn write_u64<W: Write>(w: &mut W, num: u64) -> io::Result<()> {
    let mut buf = [0u8; MAX_VARINT_LEN];
    w.write_all(encode_u64(num, &mut buf))
}

/// Encode a `usize` and write it to a sink.
pub fn write_usize<W: Write>(w: &mut W, num: usize) -> io::Result<()> {
    write_u64(w, num as u64)
}

/// Encoded byte-length of a `u64` value.
#[inline]
pub fn sizeof_u64(num: u64) -> usize {
    let bits = 64 - num.leading_zeros();
    (bits.max(1).div_ceil(7) as usize).min(MAX_VARINT_LEN)
}

/// Encoded byte-length of a `usize` value.
#[inline]
pub fn sizeof_usize(num: usize) -> usize {
    sizeof_u64(num as u64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


