// Codec error taxonomy.
//
// Identifier errors mean the caller's bookkeeping is off; data errors mean
// the bytes themselves are unusable. Both leave codec state untouched.

use std::fmt;

use thiserror::Error;

use crate::io::IoError;
use crate::validator::NotDelta;
use crate::vcdiff::DecodeError;

#[derive(Debug, Error)]
pub enum CodecError {
    /// The VCDIFF engine failed for a reason not attributable to the base.
    #[error("delta engine failure: {0}")]
    InternalFailure(#[source] DecodeError),
    #[error("no base has been set")]
    UninitializedState,
    #[error("invalid delta id {0:?}")]
    InvalidDeltaId(String),
    #[error("invalid base id {0:?}")]
    InvalidBaseId(String),
    #[error("delta was made against base {expected:?} but the tracked base is {actual:?}")]
    BaseIdMismatch { expected: String, actual: String },
    #[error("invalid base data: {0}")]
    InvalidBaseData(String),
    #[error("invalid delta data: {0}")]
    InvalidDeltaData(String),
}

/// Fieldless discriminant of `CodecError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InternalFailure,
    UninitializedState,
    InvalidDeltaId,
    InvalidBaseId,
    BaseIdMismatch,
    InvalidBaseData,
    InvalidDeltaData,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InternalFailure => "internal_failure",
            Self::UninitializedState => "uninitialized_state",
            Self::InvalidDeltaId => "invalid_delta_id",
            Self::InvalidBaseId => "invalid_base_id",
            Self::BaseIdMismatch => "base_id_mismatch",
            Self::InvalidBaseData => "invalid_base_data",
            Self::InvalidDeltaData => "invalid_delta_data",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InternalFailure(_) => ErrorKind::InternalFailure,
            Self::UninitializedState => ErrorKind::UninitializedState,
            Self::InvalidDeltaId(_) => ErrorKind::InvalidDeltaId,
            Self::InvalidBaseId(_) => ErrorKind::InvalidBaseId,
            Self::BaseIdMismatch { .. } => ErrorKind::BaseIdMismatch,
            Self::InvalidBaseData(_) => ErrorKind::InvalidBaseData,
            Self::InvalidDeltaData(_) => ErrorKind::InvalidDeltaData,
        }
    }

    /// Bookkeeping errors: the chain needs a resync with a fresh base.
    pub fn is_identifier_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UninitializedState
                | ErrorKind::InvalidDeltaId
                | ErrorKind::InvalidBaseId
                | ErrorKind::BaseIdMismatch
        )
    }

    /// Byte-level errors: the base or delta is corrupt or mismatched.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InternalFailure | ErrorKind::InvalidBaseData | ErrorKind::InvalidDeltaData
        )
    }
}

impl From<NotDelta> for CodecError {
    fn from(e: NotDelta) -> Self {
        Self::InvalidDeltaData(e.to_string())
    }
}

impl From<DecodeError> for CodecError {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::SourceOutOfRange { .. } | DecodeError::ChecksumMismatch { .. } => {
                Self::InvalidBaseData(e.to_string())
            }
            DecodeError::OutputLimitExceeded { .. } => Self::InvalidDeltaData(e.to_string()),
            other => Self::InternalFailure(other),
        }
    }
}

impl From<IoError> for CodecError {
    fn from(e: IoError) -> Self {
        match e {
            IoError::Io(e) => Self::InternalFailure(DecodeError::Io(e)),
            IoError::Decode(e) => e.into(),
        }
    }
}


