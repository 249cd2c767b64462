// Stateful delta application with base-identifier continuity.
//
// The tracked (base, id) pair lives behind one mutex and is replaced in a
// single assignment, so readers never see a base from one version paired
// with the id of another.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;

use super::error::CodecError;
use super::identifier::{check_base_id, check_delta_id};
use crate::vcdiff::DecodeOptions;

/// The base payload a codec will apply the next delta against.
#[derive(Clone, PartialEq, Eq)]
pub struct TrackedBase {
    pub payload: Vec<u8>,
    pub id: String,
}

impl fmt::Debug for TrackedBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedBase")
            .field("id", &self.id)
            .field("len", &self.payload.len())
            .finish()
    }
}

/// VCDIFF delta codec.
///
/// `decode` is a pure function of its arguments. `set_base` seeds a chain
/// and each successful `apply` rolls it forward to the decoded payload.
///
/// ```no_run
/// use vcdelta::{DeltaCodec, ErrorKind};
///
/// # fn deltas() -> (Vec<u8>, Vec<u8>) { unimplemented!() }
/// let (d1, d2) = deltas();
/// let codec = DeltaCodec::new();
/// codec.set_base(b"{\"n\":0}".to_vec(), "v0");
///
/// let v1 = codec.apply(&d1, "v1", "v0")?;
/// assert_eq!(codec.base_id().as_deref(), Some("v1"));
///
/// // A delta for some other base is refused and the chain stays at v1.
/// let err = codec.apply(&d2, "v2", "v0").unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::BaseIdMismatch);
/// assert_eq!(codec.base(), Some(v1));
/// # Ok::<(), vcdelta::CodecError>(())
/// ```
pub struct DeltaCodec {
    state: Mutex<Option<TrackedBase>>,
    options: DecodeOptions,
}

impl DeltaCodec {
    pub fn new() -> Self {
        Self::with_options(DecodeOptions::default())
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        Self {
            state: Mutex::new(None),
            options,
        }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Stateless decode of `delta` against `base` with default options.
    pub fn decode(delta: &[u8], base: &[u8]) -> Result<Vec<u8>, CodecError> {
        super::decode(delta, base)
    }

    /// Whether `buf` looks like a VCDIFF delta.
    pub fn is_delta(buf: &[u8]) -> bool {
        crate::validator::is_delta(buf)
    }

    /// Replace the tracked base and its id.
    pub fn set_base(&self, payload: impl Into<Vec<u8>>, id: impl Into<String>) {
        let base = TrackedBase {
            payload: payload.into(),
            id: id.into(),
        };
        debug!("base set to {:?} ({} bytes)", base.id, base.payload.len());
        *self.lock() = Some(base);
    }

    /// Apply `delta` to the tracked base.
    ///
    /// `delta_id` names the payload the delta produces and `expected_base_id`
    /// the base it was made against. On success the decoded payload becomes
    /// the tracked base under `delta_id`; on failure nothing changes.
    pub fn apply(
        &self,
        delta: &[u8],
        delta_id: &str,
        expected_base_id: &str,
    ) -> Result<Vec<u8>, CodecError> {
        let mut state = self.lock();
        let result = self.apply_locked(&mut state, delta, delta_id, expected_base_id);
        match &result {
            Ok(payload) => debug!(
                "applied delta {delta_id:?} on {expected_base_id:?}: {} -> {} bytes",
                delta.len(),
                payload.len()
            ),
            Err(e) => debug!(
                "rejected delta {delta_id:?} on {expected_base_id:?}: {}: {e}",
                e.kind()
            ),
        }
        result
    }

    fn apply_locked(
        &self,
        state: &mut Option<TrackedBase>,
        delta: &[u8],
        delta_id: &str,
        expected_base_id: &str,
    ) -> Result<Vec<u8>, CodecError> {
        let current = state.as_ref().ok_or(CodecError::UninitializedState)?;
        check_delta_id(delta_id)?;
        check_base_id(expected_base_id)?;
        if expected_base_id != current.id {
            return Err(CodecError::BaseIdMismatch {
                expected: expected_base_id.to_owned(),
                actual: current.id.clone(),
            });
        }

        let payload = super::decode_with_options(delta, &current.payload, &self.options)?;

        *state = Some(TrackedBase {
            payload: payload.clone(),
            id: delta_id.to_owned(),
        });
        Ok(payload)
    }

    /// Copy of the tracked base payload.
    pub fn base(&self) -> Option<Vec<u8>> {
        self.lock().as_ref().map(|b| b.payload.clone())
    }

    /// Id of the tracked base.
    pub fn base_id(&self) -> Option<String> {
        self.lock().as_ref().map(|b| b.id.clone())
    }

    /// Base and id read together.
    pub fn snapshot(&self) -> Option<TrackedBase> {
        self.lock().clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<TrackedBase>> {
        // The pair is only ever replaced whole, so a poisoned lock still
        // guards a consistent value.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DeltaCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DeltaCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeltaCodec")
            .field("base", &*self.lock())
            .field("options", &self.options)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


