//! Backend adapters.
//!
//! Every compared library implements [`Backend`]: a context prepared once per
//! size point, a `build` step that copies a [`RawSequence`] into the native
//! representation, and the two elementwise kernels under test. All one-time
//! cost lives in `prepare` and `build`; `ln` and `mul` do only the work being
//! measured.

pub mod algebra;
pub mod columnar;
pub mod scalar;
pub mod vectorized;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::RawSequence;
use crate::error::{BenchError, Result};
use crate::scenario::sink::SinkResult;

pub use algebra::AlgebraBackend;
pub use columnar::ColumnarBackend;
pub use scalar::ScalarBackend;
pub use vectorized::VectorizedBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BackendKind {
    /// `ndarray::Array1<f64>`
    #[serde(rename = "ndarray", alias = "vectorized")]
    Vectorized,
    /// Typed n-d field algebra over `num_traits::Float`
    #[serde(rename = "field", alias = "algebra")]
    Algebra,
    /// `arrow2` primitive arrays
    #[serde(rename = "arrow", alias = "columnar")]
    Columnar,
    /// Explicit element-by-element loops, the zero-overhead anchor
    #[serde(rename = "loop", alias = "scalar")]
    Scalar,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Vectorized,
        BackendKind::Algebra,
        BackendKind::Columnar,
        BackendKind::Scalar,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BackendKind::Vectorized => "ndarray",
            BackendKind::Algebra => "field",
            BackendKind::Columnar => "arrow",
            BackendKind::Scalar => "loop",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One array library (or strategy) under comparison.
pub trait Backend: Sized {
    const KIND: BackendKind;

    /// Native array handle
    type Array;

    /// Instantiate whatever context the backend needs for arrays of `len`
    /// elements (a field, a shape, nothing at all).
    fn prepare(len: usize) -> Self;

    /// Copy `raw` into the native representation without mutating it.
    fn build(&self, raw: &RawSequence, budget: &MemoryBudget) -> Result<Self::Array>;

    /// Elementwise natural logarithm into a fresh array
    fn ln(&self, array: &Self::Array) -> Self::Array;

    /// Elementwise product of two same-length arrays into a fresh array
    fn mul(&self, lhs: &Self::Array, rhs: &Self::Array) -> Self::Array;

    /// Copy the values back out, for comparisons outside timed code
    fn read_back(array: &Self::Array) -> Vec<f64>;

    fn into_sink(array: Self::Array) -> SinkResult;
}

/// Per-handle allocation cap applied while building handles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryBudget {
    limit_bytes: Option<u64>,
}

impl MemoryBudget {
    pub fn unlimited() -> Self {
        Self { limit_bytes: None }
    }

    pub fn with_limit(limit_bytes: Option<u64>) -> Self {
        Self { limit_bytes }
    }

    pub fn limit_bytes(&self) -> Option<u64> {
        self.limit_bytes
    }

    /// Check that `len` doubles fit the budget and the address space.
    pub fn admit(&self, target: BackendKind, len: usize) -> Result<u64> {
        let bytes = (len as u64)
            .checked_mul(size_of::<f64>() as u64)
            .filter(|bytes| *bytes <= isize::MAX as u64)
            .ok_or_else(|| BenchError::AllocationFailure {
                target: target.label(),
                len,
                bytes: u64::MAX,
                reason: "exceeds addressable memory".to_string(),
            })?;
        match self.limit_bytes {
            Some(limit) if bytes > limit => Err(BenchError::AllocationFailure {
                target: target.label(),
                len,
                bytes,
                reason: format!("exceeds memory limit of {} bytes", limit),
            }),
            _ => Ok(bytes),
        }
    }

    /// Admit `len` doubles and reserve them, failing instead of aborting when
    /// the allocator refuses.
    pub fn reserve(&self, target: BackendKind, len: usize) -> Result<Vec<f64>> {
        let bytes = self.admit(target, len)?;
        let mut values = Vec::new();
        values
            .try_reserve_exact(len)
            .map_err(|err| BenchError::AllocationFailure {
                target: target.label(),
                len,
                bytes,
                reason: err.to_string(),
            })?;
        Ok(values)
    }

    /// Fallible copy of `raw` into a fresh vector owned by the backend.
    pub fn copy_of(&self, target: BackendKind, raw: &RawSequence) -> Result<Vec<f64>> {
        let mut values = self.reserve(target, raw.len())?;
        values.extend_from_slice(raw.as_slice());
        Ok(values)
    }
}
