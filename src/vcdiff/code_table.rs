// VCDIFF default code table (RFC 3284, Section 5.6).
//
// Every opcode byte in an instruction section indexes this table. An entry
// holds one or two half-instructions; a zero size means the real size
// follows as a varint in the instruction section.

use std::sync::LazyLock;

/// Instruction type codes. COPY is `XD3_CPY + mode`.
pub const XD3_NOOP: u8 = 0;
pub const XD3_ADD: u8 = 1;
pub const XD3_RUN: u8 = 2;
pub const XD3_CPY: u8 = 3;

/// Smallest COPY size with a dedicated opcode.
pub const MIN_MATCH: u8 = 4;

/// Number of COPY address modes in the default table (SELF, HERE, 4 NEAR, 3 SAME).
pub const COPY_MODES: u8 = 9;

/// A single entry in the 256-element code table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CodeTableEntry {
    pub type1: u8,
    pub size1: u8,
    pub type2: u8,
    pub size2: u8,
}

impl CodeTableEntry {
    const fn single(itype: u8, size: u8) -> Self {
        Self {
            type1: itype,
            size1: size,
            type2: XD3_NOOP,
            size2: 0,
        }
    }

    const fn double(type1: u8, size1: u8, type2: u8, size2: u8) -> Self {
        Self {
            type1,
            size1,
            type2,
            size2,
        }
    }

    /// Whether this opcode carries a second half-instruction.
    #[inline]
    pub fn is_double(&self) -> bool {
        self.type2 != XD3_NOOP
    }
}

/// The complete 256-entry VCDIFF code table.
pub type CodeTable = [CodeTableEntry; 256];

/// Build the default RFC 3284 code table.
///
/// Layout:
/// - `0`: RUN, explicit size
/// - `1..=18`: ADD, explicit size then sizes 1..=17
/// - `19..=162`: COPY per mode, explicit size then sizes 4..=18
/// - `163..=246`: ADD(1..=4) + COPY(4..=6 for SELF/HERE/NEAR, 4 for SAME)
/// - `247..=255`: COPY(4) + ADD(1)
pub fn build_default_code_table() -> CodeTable {
    const ADD_SIZES: u8 = 17;
    const COPY_SIZES: u8 = 15;
    const NEAR_LIMIT: u8 = 6;

    let mut entries = Vec::with_capacity(256);

    entries.push(CodeTableEntry::single(XD3_RUN, 0));
    entries.extend((0..=ADD_SIZES).map(|size| CodeTableEntry::single(XD3_ADD, size)));

    for mode in 0..COPY_MODES {
        entries.push(CodeTableEntry::single(XD3_CPY + mode, 0));
        entries.extend(
            (MIN_MATCH..MIN_MATCH + COPY_SIZES)
                .map(|size| CodeTableEntry::single(XD3_CPY + mode, size)),
        );
    }

    for mode in 0..COPY_MODES {
        let copy_max = if mode < NEAR_LIMIT { 6 } else { MIN_MATCH };
        for add_size in 1..=4 {
            for copy_size in MIN_MATCH..=copy_max {
                entries.push(CodeTableEntry::double(
                    XD3_ADD,
                    add_size,
                    XD3_CPY + mode,
                    copy_size,
                ));
            }
        }
    }

    for mode in 0..COPY_MODES {
        entries.push(CodeTableEntry::double(XD3_CPY + mode, MIN_MATCH, XD3_ADD, 1));
    }

    let mut table = [CodeTableEntry::default(); 256];
    debug_assert_eq!(entries.len(), table.len());
    for (slot, entry) in table.iter_mut().zip(entries) {
        *slot = entry;
    }
    table
}

/// The lazily built default code table.
pub fn default_code_table() -> &'static CodeTable {
    static TABLE: LazyLock<CodeTable> = LazyLock::new(build_default_code_table);
    &TABLE
}

// ---------------------------------------------------------------------------
// Decoded instruction
// ---------------------------------------------------------------------------

/// A single decoded instruction, as yielded by `InstructionIterator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Emit `len` literal bytes from the data section.
    Add { len: u32 },
    /// Copy `len` bytes from `addr` in the combined source+target address space.
    Copy { len: u32, addr: u64, mode: u8 },
    /// Repeat one data-section byte `len` times.
    Run { len: u32 },
}

impl Instruction {
    /// Number of target bytes this instruction produces.
    pub fn len(&self) -> u32 {
        match *self {
            Self::Add { len } | Self::Copy { len, .. } | Self::Run { len } => len,
        }
    }

    /// Whether the instruction produces no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


