//! vcdelta: stateful VCDIFF (RFC 3284) delta decoding.
//!
//! A delta reconstructs a payload from a previously known base. The crate
//! provides:
//! - A structural validator (`validator`, `is_delta`)
//! - The delta codec (`codec`): a stateless `decode` and a stateful
//!   `DeltaCodec` that tracks the current base and its identifier so that
//!   chains of deltas can be applied in order
//! - A pure-Rust VCDIFF decoder (`vcdiff`), compatible with xdelta3 output
//! - Streaming and file-oriented helpers (`stream`, `io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use vcdelta::{DeltaCodec, ErrorKind};
//!
//! # let (full_payload, delta_1, delta_2): (Vec<u8>, Vec<u8>, Vec<u8>) = Default::default();
//! let codec = DeltaCodec::new();
//! codec.set_base(full_payload, "msg:0");
//!
//! let v1 = codec.apply(&delta_1, "msg:1", "msg:0")?;
//! let v2 = codec.apply(&delta_2, "msg:2", "msg:1")?;
//! assert_eq!(codec.base(), Some(v2));
//! # let _ = v1;
//! # Ok::<(), vcdelta::CodecError>(())
//! ```
//!
//! Any error from `apply` leaves the tracked base untouched. Identifier
//! errors (`CodecError::is_identifier_error`) mean the caller's bookkeeping
//! is out of step; data errors mean a fresh full base is needed.

pub mod codec;
pub mod io;
pub mod stream;
pub mod validator;
pub mod vcdiff;

#[cfg(feature = "cli")]
pub mod cli;

pub use codec::{CodecError, DeltaCodec, ErrorKind, TrackedBase, decode, decode_with_options};
pub use validator::is_delta;
pub use vcdiff::DecodeOptions;
