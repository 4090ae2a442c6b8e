use super::{Backend, BackendKind, MemoryBudget};
use crate::data::RawSequence;
use crate::error::Result;
use crate::scenario::sink::SinkResult;

/// Plain vectors walked index by index.
///
/// This is the anchor every other backend is judged against: the cost of the
/// operation with no array library in the way. The logarithm comes from
/// `libm`, a fixed pure-Rust port of the musl/FreeBSD math routines, so the
/// reference values do not depend on the platform's C library.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarBackend;

#[allow(clippy::needless_range_loop)]
impl Backend for ScalarBackend {
    const KIND: BackendKind = BackendKind::Scalar;
    type Array = Vec<f64>;

    fn prepare(_len: usize) -> Self {
        ScalarBackend
    }

    fn build(&self, raw: &RawSequence, budget: &MemoryBudget) -> Result<Vec<f64>> {
        budget.copy_of(Self::KIND, raw)
    }

    #[inline]
    fn ln(&self, array: &Vec<f64>) -> Vec<f64> {
        let mut out = vec![0.0; array.len()];
        for i in 0..array.len() {
            out[i] = libm::log(array[i]);
        }
        out
    }

    #[inline]
    fn mul(&self, lhs: &Vec<f64>, rhs: &Vec<f64>) -> Vec<f64> {
        assert_eq!(lhs.len(), rhs.len(), "operands must have equal length");
        let mut out = vec![0.0; lhs.len()];
        for i in 0..lhs.len() {
            out[i] = lhs[i] * rhs[i];
        }
        out
    }

    fn read_back(array: &Vec<f64>) -> Vec<f64> {
        array.clone()
    }

    fn into_sink(array: Vec<f64>) -> SinkResult {
        SinkResult::Scalar(array)
    }
}
