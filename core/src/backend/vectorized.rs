use ndarray::Array1;

use super::{Backend, BackendKind, MemoryBudget};
use crate::data::RawSequence;
use crate::error::Result;
use crate::scenario::sink::SinkResult;

/// `ndarray` one-dimensional arrays with the library's own elementwise ops.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorizedBackend;

impl Backend for VectorizedBackend {
    const KIND: BackendKind = BackendKind::Vectorized;
    type Array = Array1<f64>;

    fn prepare(_len: usize) -> Self {
        VectorizedBackend
    }

    fn build(&self, raw: &RawSequence, budget: &MemoryBudget) -> Result<Array1<f64>> {
        Ok(Array1::from_vec(budget.copy_of(Self::KIND, raw)?))
    }

    #[inline]
    fn ln(&self, array: &Array1<f64>) -> Array1<f64> {
        array.mapv(f64::ln)
    }

    #[inline]
    fn mul(&self, lhs: &Array1<f64>, rhs: &Array1<f64>) -> Array1<f64> {
        lhs * rhs
    }

    fn read_back(array: &Array1<f64>) -> Vec<f64> {
        array.to_vec()
    }

    fn into_sink(array: Array1<f64>) -> SinkResult {
        SinkResult::Vectorized(array)
    }
}
