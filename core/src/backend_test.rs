mod tests {
    use crate::backend::algebra::NdField;
    use crate::backend::{
        AlgebraBackend, Backend, BackendKind, ColumnarBackend, MemoryBudget, ScalarBackend, VectorizedBackend,
    };
    use crate::data::generate;
    use crate::error::BenchError;
    use crate::seed::SeedState;
    use crate::RawSequence;
    use proptest::prelude::*;

    fn assert_close(actual: f64, expected: f64, max_relative: f64) {
        let diff = (actual - expected).abs();
        let scale = actual.abs().max(expected.abs());
        assert!(
            actual == expected || diff <= scale * max_relative,
            "{actual} vs {expected}: relative error {}",
            diff / scale
        );
    }

    fn sample(len: i64) -> RawSequence {
        generate(&mut SeedState::new(42), len).expect("generate sample")
    }

    fn round_trip<B: Backend>(raw: &RawSequence) -> Vec<f64> {
        let backend = B::prepare(raw.len());
        let array = backend.build(raw, &MemoryBudget::unlimited()).expect("build");
        B::read_back(&array)
    }

    fn product<B: Backend>(lhs: &RawSequence, rhs: &RawSequence) -> Vec<f64> {
        let backend = B::prepare(lhs.len());
        let budget = MemoryBudget::unlimited();
        let a = backend.build(lhs, &budget).unwrap();
        let b = backend.build(rhs, &budget).unwrap();
        B::read_back(&backend.mul(&a, &b))
    }

    fn logarithm<B: Backend>(raw: &RawSequence) -> Vec<f64> {
        let backend = B::prepare(raw.len());
        let a = backend.build(raw, &MemoryBudget::unlimited()).unwrap();
        B::read_back(&backend.ln(&a))
    }

    fn assert_same_bits(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert_eq!(a.to_bits(), e.to_bits(), "index {i}: {a} != {e}");
        }
    }

    #[test]
    fn test_build_reads_back_exact_values() {
        let raw = sample(257);
        let copy = raw.clone();
        assert_same_bits(&round_trip::<VectorizedBackend>(&raw), &raw);
        assert_same_bits(&round_trip::<AlgebraBackend>(&raw), &raw);
        assert_same_bits(&round_trip::<ColumnarBackend>(&raw), &raw);
        assert_same_bits(&round_trip::<ScalarBackend>(&raw), &raw);
        assert_eq!(raw, copy, "building must not mutate the raw sequence");
    }

    #[test]
    fn test_mul_is_exact_for_every_backend() {
        let mut seed = SeedState::new(42);
        let lhs = generate(&mut seed, 100).unwrap();
        let rhs = generate(&mut seed, 100).unwrap();
        let expected: Vec<f64> = lhs.iter().zip(rhs.iter()).map(|(a, b)| a * b).collect();

        assert_same_bits(&product::<VectorizedBackend>(&lhs, &rhs), &expected);
        assert_same_bits(&product::<AlgebraBackend>(&lhs, &rhs), &expected);
        assert_same_bits(&product::<ColumnarBackend>(&lhs, &rhs), &expected);
        assert_same_bits(&product::<ScalarBackend>(&lhs, &rhs), &expected);
    }

    #[test]
    fn test_ln_agrees_with_baseline() {
        let raw = sample(1_000);
        let baseline = logarithm::<ScalarBackend>(&raw);
        for candidate in [
            logarithm::<VectorizedBackend>(&raw),
            logarithm::<AlgebraBackend>(&raw),
            logarithm::<ColumnarBackend>(&raw),
        ] {
            assert_eq!(candidate.len(), baseline.len());
            for (c, b) in candidate.iter().zip(&baseline) {
                assert_close(*c, *b, 1e-9);
            }
        }
        assert_close(baseline[0], raw[0].ln(), 1e-12);
        for (b, x) in baseline.iter().zip(raw.iter()) {
            assert_eq!(b.to_bits(), libm::log(*x).to_bits());
        }
    }

    #[test]
    fn test_arrow_ln_keeps_nulls() {
        use arrow2::array::{Array, PrimitiveArray};

        let array = PrimitiveArray::<f64>::from([Some(1.0), None, Some(std::f64::consts::E)]);
        let out = ColumnarBackend.ln(&array);
        assert_eq!(out.len(), 3);
        assert_eq!(out.null_count(), 1);
        assert!(out.is_null(1));
        assert_eq!(out.value(0), 0.0);
        assert_close(out.value(2), 1.0, 1e-15);
    }

    #[test]
    fn test_empty_arrays_are_fine() {
        let raw = sample(0);
        assert!(round_trip::<VectorizedBackend>(&raw).is_empty());
        assert!(logarithm::<AlgebraBackend>(&raw).is_empty());
        assert!(logarithm::<ColumnarBackend>(&raw).is_empty());
        assert!(product::<ScalarBackend>(&raw, &raw).is_empty());
        assert!(product::<AlgebraBackend>(&raw, &raw).is_empty());
    }

    #[test]
    fn test_budget_rejects_oversized_handle() {
        let raw = sample(128);
        let budget = MemoryBudget::with_limit(Some(512));
        let err = ColumnarBackend::prepare(raw.len()).build(&raw, &budget).unwrap_err();
        match err {
            BenchError::AllocationFailure { target, len, bytes, .. } => {
                assert_eq!(target, "arrow");
                assert_eq!(len, 128);
                assert_eq!(bytes, 1024);
            }
            other => panic!("expected AllocationFailure, got {other:?}"),
        }
        assert!(budget.admit(BackendKind::Scalar, 64).is_ok());
    }

    #[test]
    fn test_budget_rejects_unaddressable_length() {
        let err = MemoryBudget::unlimited()
            .admit(BackendKind::Vectorized, usize::MAX)
            .unwrap_err();
        assert!(err.is_exclusion());
    }

    #[test]
    fn test_field_produce_visits_row_major_indices() {
        let field = NdField::<f64>::new(&[2, 3]);
        assert_eq!(field.len(), 6);
        let element = field.produce(|idx| (idx[0] * 10 + idx[1]) as f64);
        assert_eq!(element.as_slice(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        let doubled = field.map(&element, |v| v * 2.0);
        assert_eq!(doubled.as_slice()[5], 24.0);
    }

    #[test]
    fn test_field_build_copies_through_produce() {
        let raw = sample(5);
        let backend = AlgebraBackend::prepare(raw.len());
        let element = backend.build(&raw, &MemoryBudget::unlimited()).unwrap();
        assert_eq!(element.as_slice(), raw.as_slice());

        let err = AlgebraBackend::prepare(4).build(&raw, &MemoryBudget::unlimited()).unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfiguration(_)));

        let err = backend.build(&raw, &MemoryBudget::with_limit(Some(8))).unwrap_err();
        assert!(err.is_exclusion());
    }

    #[test]
    #[should_panic(expected = "does not belong to field")]
    fn test_field_multiply_rejects_foreign_element() {
        let small = NdField::<f64>::new(&[2]);
        let large = NdField::<f64>::new(&[3]);
        let a = small.produce(|idx| idx[0] as f64);
        let b = large.produce(|idx| idx[0] as f64);
        large.multiply(&b, &a);
    }

    #[test]
    fn test_backend_labels_round_trip() {
        for kind in BackendKind::ALL {
            assert_eq!(BackendKind::from_label(kind.label()), Some(kind));
        }
        assert_eq!(BackendKind::from_label(" NDARRAY "), Some(BackendKind::Vectorized));
        assert_eq!(BackendKind::from_label("numpy"), None);
    }

    proptest! {
        #[test]
        fn prop_mul_matches_ieee_product(len in 0i64..300, seed in any::<u64>()) {
            let mut state = SeedState::new(seed);
            let lhs = generate(&mut state, len).unwrap();
            let rhs = generate(&mut state, len).unwrap();
            let expected: Vec<u64> = lhs.iter().zip(rhs.iter()).map(|(a, b)| (a * b).to_bits()).collect();
            let got: Vec<u64> = product::<ColumnarBackend>(&lhs, &rhs).iter().map(|v| v.to_bits()).collect();
            prop_assert_eq!(got, expected.clone());
            let got: Vec<u64> = product::<VectorizedBackend>(&lhs, &rhs).iter().map(|v| v.to_bits()).collect();
            prop_assert_eq!(got, expected);
        }
    }
}
