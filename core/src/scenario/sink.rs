use std::hint::black_box;

use arrow2::array::PrimitiveArray;
use ndarray::Array1;

use crate::backend::BackendKind;
use crate::backend::algebra::FieldElement;

/// Output of one timed invocation, in the backend's native representation.
///
/// The value means nothing beyond having been computed by that exact call; it
/// exists to be handed to a [`Sink`].
#[derive(Debug, Clone)]
pub enum SinkResult {
    Vectorized(Array1<f64>),
    Algebra(FieldElement<f64>),
    Columnar(PrimitiveArray<f64>),
    Scalar(Vec<f64>),
}

impl SinkResult {
    pub fn backend(&self) -> BackendKind {
        match self {
            SinkResult::Vectorized(_) => BackendKind::Vectorized,
            SinkResult::Algebra(_) => BackendKind::Algebra,
            SinkResult::Columnar(_) => BackendKind::Columnar,
            SinkResult::Scalar(_) => BackendKind::Scalar,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SinkResult::Vectorized(a) => a.len(),
            SinkResult::Algebra(a) => a.len(),
            SinkResult::Columnar(a) => a.len(),
            SinkResult::Scalar(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the values out. Never call this inside a timed region.
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            SinkResult::Vectorized(a) => a.to_vec(),
            SinkResult::Algebra(a) => a.as_slice().to_vec(),
            SinkResult::Columnar(a) => a.values().to_vec(),
            SinkResult::Scalar(a) => a.clone(),
        }
    }
}

/// Engine-supplied consumer that keeps results observable.
pub trait Sink {
    fn consume(&mut self, result: SinkResult);
}

/// Sink that escapes every result through `black_box` and counts them.
#[derive(Debug, Default)]
pub struct BlackHole {
    consumed: u64,
    elements: u64,
}

impl BlackHole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Total elements across every consumed result
    pub fn elements(&self) -> u64 {
        self.elements
    }
}

impl Sink for BlackHole {
    #[inline]
    fn consume(&mut self, result: SinkResult) {
        self.consumed += 1;
        self.elements += result.len() as u64;
        black_box(result);
    }
}
