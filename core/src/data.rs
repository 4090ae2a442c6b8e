use std::ops::Deref;

use tracing::debug;

use crate::error::{BenchError, Result};
use crate::seed::{SeedCheckpoint, SeedState};

/// Fixed-length input sequence shared read-only by every backend adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSequence {
    values: Box<[f64]>,
}

impl RawSequence {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Index of the first element whose bit pattern differs from `other`.
    /// A length mismatch reports the shorter length.
    pub fn first_bit_mismatch(&self, other: &RawSequence) -> Option<usize> {
        let common = self.len().min(other.len());
        self.values
            .iter()
            .zip(other.values.iter())
            .position(|(a, b)| a.to_bits() != b.to_bits())
            .or((self.len() != other.len()).then_some(common))
    }
}

impl Deref for RawSequence {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.values
    }
}

/// Validate an engine-supplied size and convert it to an element count.
pub fn checked_len(requested: i64) -> Result<usize> {
    if requested < 0 {
        return Err(BenchError::invalid(format!(
            "array size must be non-negative, got {}",
            requested
        )));
    }
    usize::try_from(requested)
        .map_err(|_| BenchError::invalid(format!("array size {} does not fit in usize", requested)))
}

/// Draw `requested` values uniformly from [0, 1) out of `seed`.
pub fn generate(seed: &mut SeedState, requested: i64) -> Result<RawSequence> {
    let len = checked_len(requested)?;
    let bytes = (len as u64).saturating_mul(size_of::<f64>() as u64);
    let mut values = Vec::new();
    values
        .try_reserve_exact(len)
        .map_err(|err| BenchError::AllocationFailure {
            target: "raw",
            len,
            bytes,
            reason: err.to_string(),
        })?;
    let start = seed.position();
    values.extend((0..len).map(|_| seed.next_unit()));
    debug!(len, seed = seed.seed(), start, "generated raw sequence");
    Ok(RawSequence {
        values: values.into_boxed_slice(),
    })
}

impl From<Vec<f64>> for RawSequence {
    fn from(values: Vec<f64>) -> Self {
        Self {
            values: values.into_boxed_slice(),
        }
    }
}

/// Regenerate the sequence that started at `checkpoint` and require the same
/// bits. Guards comparability: a divergence means backends could have seen
/// different inputs.
pub fn verify_replay(checkpoint: SeedCheckpoint, sequence: &RawSequence) -> Result<()> {
    let mut replay = SeedState::restore(checkpoint);
    let again = generate(&mut replay, sequence.len() as i64)?;
    match sequence.first_bit_mismatch(&again) {
        None => Ok(()),
        Some(index) => Err(BenchError::NonDeterminism {
            seed: checkpoint.seed,
            position: checkpoint.position,
            index,
        }),
    }
}
