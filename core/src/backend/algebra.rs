//! Typed n-dimensional field algebra.
//!
//! Arrays never stand alone here: an [`NdField`] fixes the element type and
//! shape once, and every element is produced by, and operated on through, that
//! field. Instantiating the field is part of setup, so the cost of the
//! abstraction that remains in the timed path is only the per-operation one.

use std::marker::PhantomData;

use num_traits::Float;

use super::{Backend, BackendKind, MemoryBudget};
use crate::data::RawSequence;
use crate::error::{BenchError, Result};
use crate::scenario::sink::SinkResult;

/// Field of dense row-major arrays with a fixed shape.
#[derive(Debug, Clone, PartialEq)]
pub struct NdField<T: Float> {
    shape: Box<[usize]>,
    strides: Box<[usize]>,
    len: usize,
    _elem: PhantomData<T>,
}

/// Element of an [`NdField`]; a flat buffer tagged with its field's length.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldElement<T: Float> {
    buffer: Box<[T]>,
}

impl<T: Float> FieldElement<T> {
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.buffer
    }
}

impl<T: Float> NdField<T> {
    pub fn new(shape: &[usize]) -> Self {
        let mut strides = vec![1usize; shape.len()];
        for axis in (0..shape.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * shape[axis + 1];
        }
        Self {
            shape: shape.into(),
            strides: strides.into_boxed_slice(),
            len: shape.iter().product(),
            _elem: PhantomData,
        }
    }

    /// Total number of elements per array
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Build an element by evaluating `init` at every multi-index.
    pub fn produce(&self, init: impl FnMut(&[usize]) -> T) -> FieldElement<T> {
        self.produce_into(Vec::with_capacity(self.len), init)
    }

    /// Like [`NdField::produce`], filling a caller-provided buffer so the
    /// allocation can be made fallibly.
    pub fn produce_into(&self, mut buffer: Vec<T>, mut init: impl FnMut(&[usize]) -> T) -> FieldElement<T> {
        buffer.clear();
        let mut index = vec![0usize; self.shape.len()];
        buffer.extend((0..self.len).map(|flat| {
            let mut rest = flat;
            for (slot, stride) in index.iter_mut().zip(self.strides.iter()) {
                *slot = rest / stride;
                rest %= stride;
            }
            init(&index)
        }));
        FieldElement {
            buffer: buffer.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn map(&self, arg: &FieldElement<T>, op: impl Fn(T) -> T) -> FieldElement<T> {
        self.check(arg);
        FieldElement {
            buffer: arg.buffer.iter().map(|&v| op(v)).collect(),
        }
    }

    #[inline]
    pub fn ln(&self, arg: &FieldElement<T>) -> FieldElement<T> {
        self.map(arg, T::ln)
    }

    #[inline]
    pub fn multiply(&self, lhs: &FieldElement<T>, rhs: &FieldElement<T>) -> FieldElement<T> {
        self.check(lhs);
        self.check(rhs);
        FieldElement {
            buffer: lhs.buffer.iter().zip(rhs.buffer.iter()).map(|(&a, &b)| a * b).collect(),
        }
    }

    #[inline]
    fn check(&self, arg: &FieldElement<T>) {
        assert_eq!(arg.len(), self.len, "element does not belong to field of shape {:?}", self.shape);
    }
}

/// The field algebra over one-dimensional `f64` arrays.
#[derive(Debug, Clone)]
pub struct AlgebraBackend {
    field: NdField<f64>,
}

impl Backend for AlgebraBackend {
    const KIND: BackendKind = BackendKind::Algebra;
    type Array = FieldElement<f64>;

    fn prepare(len: usize) -> Self {
        Self {
            field: NdField::new(&[len]),
        }
    }

    fn build(&self, raw: &RawSequence, budget: &MemoryBudget) -> Result<FieldElement<f64>> {
        if raw.len() != self.field.len() {
            return Err(BenchError::invalid(format!(
                "sequence of {} elements does not match field shape {:?}",
                raw.len(),
                self.field.shape
            )));
        }
        let buffer = budget.reserve(Self::KIND, raw.len())?;
        Ok(self.field.produce_into(buffer, |idx| raw[idx[0]]))
    }

    #[inline]
    fn ln(&self, array: &FieldElement<f64>) -> FieldElement<f64> {
        self.field.ln(array)
    }

    #[inline]
    fn mul(&self, lhs: &FieldElement<f64>, rhs: &FieldElement<f64>) -> FieldElement<f64> {
        self.field.multiply(lhs, rhs)
    }

    fn read_back(array: &FieldElement<f64>) -> Vec<f64> {
        array.as_slice().to_vec()
    }

    fn into_sink(array: FieldElement<f64>) -> SinkResult {
        SinkResult::Algebra(array)
    }
}
