// VCDIFF address cache (RFC 3284, Section 5.3).
//
// COPY addresses are stored relative to one of nine modes. The cache is
// reset at the start of every window and updated after every decoded COPY.

use thiserror::Error;

use super::varint;

/// Absolute address.
pub const VCD_SELF: u8 = 0;
/// Address relative to "here" (current position in the address space).
pub const VCD_HERE: u8 = 1;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AddressCacheError {
    /// Not enough bytes in the address section.
    #[error("address section underflow")]
    AddrUnderflow,
    /// Decoded address is invalid (out of range or overflow).
    #[error("invalid COPY address")]
    InvalidAddr,
    /// The mode does not exist for this cache configuration.
    #[error("invalid address mode {0}")]
    InvalidMode(u8),
}

/// NEAR/SAME address cache.
///
/// With the default sizes (s_near=4, s_same=3):
///   0      VCD_SELF  absolute
///   1      VCD_HERE  here - value
///   2..=5  NEAR      near\[mode-2\] + value
///   6..=8  SAME      same\[(mode-6)*256 + byte\]
#[derive(Debug, Clone)]
pub struct AddressCache {
    near: Vec<u64>,
    same: Vec<u64>,
    next_slot: usize,
}

impl AddressCache {
    /// Default RFC 3284 cache: s_near=4, s_same=3.
    pub fn new() -> Self {
        Self::with_sizes(4, 3)
    }

    pub fn with_sizes(s_near: usize, s_same: usize) -> Self {
        Self {
            near: vec![0; s_near],
            same: vec![0; s_same * 256],
            next_slot: 0,
        }
    }

    /// Reset to the all-zero state at the start of each window.
    pub fn init(&mut self) {
        self.near.fill(0);
        self.same.fill(0);
        self.next_slot = 0;
    }

    /// Total number of address modes (2 + s_near + s_same).
    #[inline]
    pub fn mode_count(&self) -> usize {
        2 + self.near.len() + self.same.len() / 256
    }

    #[inline]
    fn same_start(&self) -> usize {
        2 + self.near.len()
    }

    #[inline]
    fn update(&mut self, addr: u64) {
        if !self.near.is_empty() {
            self.near[self.next_slot] = addr;
            self.next_slot = (self.next_slot + 1) % self.near.len();
        }
        if !self.same.is_empty() {
            let idx = (addr % self.same.len() as u64) as usize;
            self.same[idx] = addr;
        }
    }

    /// Decode an address for a COPY in `mode`.
    ///
    /// `addr_data` is the unread tail of the address section and `here` is
    /// the current position in the address space (copy window length plus
    /// target bytes produced so far). Returns `(address, bytes_consumed)`.
    pub fn decode(
        &mut self,
        mode: u8,
        addr_data: &[u8],
        here: u64,
    ) -> Result<(u64, usize), AddressCacheError> {
        let mode_idx = mode as usize;
        if mode_idx >= self.mode_count() {
            return Err(AddressCacheError::InvalidMode(mode));
        }
        let same_start = self.same_start();

        let (addr, consumed) = if mode_idx < same_start {
            let (raw, consumed) =
                varint::read_u64(addr_data).map_err(|_| AddressCacheError::AddrUnderflow)?;
            let addr = match mode {
                VCD_SELF => raw,
                VCD_HERE => here
                    .checked_sub(raw)
                    .ok_or(AddressCacheError::InvalidAddr)?,
                _ => self.near[mode_idx - 2]
                    .checked_add(raw)
                    .ok_or(AddressCacheError::InvalidAddr)?,
            };
            (addr, consumed)
        } else {
            let &byte = addr_data.first().ok_or(AddressCacheError::AddrUnderflow)?;
            let slot = mode_idx - same_start;
            (self.same[slot * 256 + byte as usize], 1)
        };

        if addr >= here {
            return Err(AddressCacheError::InvalidAddr);
        }

        self.update(addr);
        Ok((addr, consumed))
    }
}

impl Default for AddressCache {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


