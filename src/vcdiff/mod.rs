// VCDIFF format decoding (RFC 3284), compatible with xdelta3 output.
//
// - `varint`        - base-128 big-endian integers
// - `address_cache` - NEAR/SAME cache for COPY addresses
// - `code_table`    - default RFC 3284 code table (256 entries)
// - `header`        - file header and per-window header
// - `secondary`     - secondary decompression of window sections
// - `decoder`       - instruction decoding and window reconstruction

pub mod address_cache;
pub mod code_table;
pub mod decoder;
pub mod header;
pub mod secondary;
pub mod varint;

pub use address_cache::AddressCache;
pub use code_table::{CodeTable, CodeTableEntry, Instruction};
pub use decoder::{
    DecodeError, DecodeOptions, InstructionIterator, NoSource, SourceProvider, StreamDecoder,
    decode_memory, decode_memory_with,
};
pub use header::{
    DeltaIndicator, FileHeader, HeaderIndicator, VCDIFF_MAGIC, WindowHeader, WindowIndicator,
};
