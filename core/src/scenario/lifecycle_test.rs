mod tests {
    use crate::backend::BackendKind;
    use crate::error::BenchError;
    use crate::scenario::{BlackHole, Phase, ScenarioConfig, ScenarioKind, Trial};
    use crate::seed::SeedState;

    #[test]
    fn test_full_lifecycle_walk() {
        let config = ScenarioConfig::log();
        let mut seed = SeedState::new(42);
        let mut trial = Trial::new(ScenarioKind::Log, &config, 0);
        assert_eq!(trial.phase(), Phase::Unconfigured);

        trial.set_size(100).unwrap();
        let fixture = trial.setup(&mut seed).unwrap();
        assert_eq!(fixture.len(), 100);
        assert_eq!(trial.phase(), Phase::Setup);

        let mut hole = BlackHole::new();
        trial.start_warmup().unwrap();
        for backend in BackendKind::ALL {
            trial.run(backend, &mut hole).unwrap();
        }
        assert_eq!(trial.phase(), Phase::Warming);

        trial.start_measurement().unwrap();
        for _ in 0..3 {
            for backend in BackendKind::ALL {
                trial.run(backend, &mut hole).unwrap();
            }
        }
        assert_eq!(trial.phase(), Phase::Measuring);
        assert_eq!(hole.consumed(), 16);

        trial.tear_down().unwrap();
        assert_eq!(trial.phase(), Phase::TornDown);
        assert!(trial.fixture().is_none());
    }

    #[test]
    fn test_invoke_requires_warming_or_measuring() {
        let config = ScenarioConfig::multiplication();
        let mut seed = SeedState::new(42);
        let mut trial = Trial::new(ScenarioKind::Multiplication, &config, 0);
        assert!(matches!(
            trial.invoke(BackendKind::Scalar),
            Err(BenchError::Lifecycle {
                from: Phase::Unconfigured,
                ..
            })
        ));

        trial.set_size(10).unwrap();
        trial.setup(&mut seed).unwrap();
        assert!(matches!(
            trial.invoke(BackendKind::Scalar),
            Err(BenchError::Lifecycle { from: Phase::Setup, .. })
        ));

        trial.start_measurement().unwrap();
        assert_eq!(trial.invoke(BackendKind::Scalar).unwrap().len(), 10);
    }

    #[test]
    fn test_setup_runs_once_per_size() {
        let config = ScenarioConfig::log();
        let mut seed = SeedState::new(42);
        let mut trial = Trial::new(ScenarioKind::Log, &config, 1);
        trial.set_size(10).unwrap();
        trial.setup(&mut seed).unwrap();
        let err = trial.setup(&mut seed).unwrap_err();
        assert!(matches!(err, BenchError::Lifecycle { from: Phase::Setup, .. }));
        assert!(trial.set_size(20).is_err(), "size cannot change under a live fixture");

        trial.tear_down().unwrap();
        trial.set_size(20).unwrap();
        assert_eq!(trial.phase(), Phase::Unconfigured);
        assert_eq!(trial.setup(&mut seed).unwrap().len(), 20);
        assert_eq!(seed.position(), 30);
    }

    #[test]
    fn test_size_already_set_up_is_not_set_up_again() {
        let config = ScenarioConfig::log();
        let mut seed = SeedState::new(42);
        let mut trial = Trial::new(ScenarioKind::Log, &config, 0);
        trial.set_size(100).unwrap();
        trial.setup(&mut seed).unwrap();
        trial.tear_down().unwrap();

        let err = trial.set_size(100).unwrap_err();
        assert!(matches!(err, BenchError::Lifecycle { from: Phase::TornDown, .. }));
        assert_eq!(trial.phase(), Phase::TornDown);
        assert_eq!(seed.position(), 100, "no second draw for the same size");

        trial.set_size(1_000).unwrap();
        trial.setup(&mut seed).unwrap();
        assert_eq!(trial.completed_sizes(), &[100, 1_000]);
    }

    #[test]
    fn test_new_fork_sets_up_the_same_size_again() {
        let config = ScenarioConfig::log();
        let mut first = Trial::new(ScenarioKind::Log, &config, 0);
        first.set_size(100).unwrap();
        let a = first.setup(&mut SeedState::new(42)).unwrap().inputs().to_vec();

        let mut second = Trial::new(ScenarioKind::Log, &config, 1);
        assert_eq!(second.fork(), 1);
        second.set_size(100).unwrap();
        let b = second.setup(&mut SeedState::new(42)).unwrap().inputs().to_vec();
        assert_eq!(a, b);
    }

    #[test]
    fn test_setup_without_size_is_invalid() {
        let config = ScenarioConfig::log();
        let mut trial = Trial::new(ScenarioKind::Log, &config, 0);
        let err = trial.setup(&mut SeedState::default()).unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_negative_size_leaves_trial_unconfigured() {
        let config = ScenarioConfig::log();
        let mut trial = Trial::new(ScenarioKind::Log, &config, 0);
        trial.set_size(-1).unwrap();
        let err = trial.setup(&mut SeedState::default()).unwrap_err();
        assert!(matches!(err, BenchError::InvalidConfiguration(_)));
        assert_eq!(trial.phase(), Phase::Unconfigured);
        assert!(trial.fixture().is_none());
    }

    #[test]
    fn test_warmup_cannot_follow_measurement() {
        let config = ScenarioConfig::log();
        let mut trial = Trial::new(ScenarioKind::Log, &config, 0);
        trial.set_size(4).unwrap();
        trial.setup(&mut SeedState::default()).unwrap();
        trial.start_measurement().unwrap();
        assert!(trial.start_warmup().is_err());
        assert!(trial.start_measurement().is_ok());
    }

    #[test]
    fn test_tear_down_before_setup_is_rejected() {
        let config = ScenarioConfig::log();
        let mut trial = Trial::new(ScenarioKind::Log, &config, 0);
        assert!(trial.tear_down().is_err());
    }
}
