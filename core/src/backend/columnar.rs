use arrow2::array::PrimitiveArray;
use arrow2::compute::arithmetics::basic;
use arrow2::compute::arity::unary;

use super::{Backend, BackendKind, MemoryBudget};
use crate::data::RawSequence;
use crate::error::Result;
use crate::scenario::sink::SinkResult;

/// Columnar `arrow2` float arrays (no validity bitmap, inputs are dense).
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnarBackend;

impl Backend for ColumnarBackend {
    const KIND: BackendKind = BackendKind::Columnar;
    type Array = PrimitiveArray<f64>;

    fn prepare(_len: usize) -> Self {
        ColumnarBackend
    }

    fn build(&self, raw: &RawSequence, budget: &MemoryBudget) -> Result<PrimitiveArray<f64>> {
        Ok(PrimitiveArray::from_vec(budget.copy_of(Self::KIND, raw)?))
    }

    #[inline]
    fn ln(&self, array: &PrimitiveArray<f64>) -> PrimitiveArray<f64> {
        unary(array, f64::ln, array.data_type().clone())
    }

    #[inline]
    fn mul(&self, lhs: &PrimitiveArray<f64>, rhs: &PrimitiveArray<f64>) -> PrimitiveArray<f64> {
        basic::mul(lhs, rhs)
    }

    fn read_back(array: &PrimitiveArray<f64>) -> Vec<f64> {
        array.values().to_vec()
    }

    fn into_sink(array: PrimitiveArray<f64>) -> SinkResult {
        SinkResult::Columnar(array)
    }
}
