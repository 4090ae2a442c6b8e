use std::sync::Once;
use std::time::Duration;

use arrbench_core::perf::scenarios::BenchCase;
use arrbench_core::{ScenarioConfig, ScenarioKind, SeedState, Trial};
use criterion::{BenchmarkId, Criterion, Throughput};

// criterion rejects zero phase durations and fewer than 10 samples
const MIN_PHASE: Duration = Duration::from_millis(1);
const MIN_SAMPLES: usize = 10;

static TRACE_INIT: Once = Once::new();

/// Exclusions and setup milestones are logged by the core; show warnings by
/// default and honour `ARRBENCH_TRACE` as a filter expression.
fn init_tracing() {
    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;

        let filter = std::env::var("ARRBENCH_TRACE")
            .ok()
            .and_then(|expr| EnvFilter::try_new(expr).ok())
            .unwrap_or_else(|| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .try_init();
    });
}

/// Drive one scenario through every declared fork and size.
///
/// Each fork gets a fresh `SeedState`, the way a fresh process would; within
/// a fork the state is shared by consecutive sizes.
pub fn sweep(c: &mut Criterion, kind: ScenarioKind, config: &ScenarioConfig) {
    init_tracing();
    if let Err(err) = config.validate() {
        panic!("invalid {} configuration: {}", kind, err);
    }

    let mut group = c.benchmark_group(kind.label());
    group.warm_up_time(config.warmup.total().max(MIN_PHASE));
    group.measurement_time(config.measurement.total().max(MIN_PHASE));
    group.sample_size((config.measurement.iterations as usize).max(MIN_SAMPLES));

    for fork in 0..config.forks {
        let mut seed = SeedState::new(config.seed);
        let mut trial = Trial::new(kind, config, fork);
        for &size in &config.sizes {
            trial.set_size(size).expect("inject array size");
            let backends = trial.setup(&mut seed).expect("scenario setup").backends();

            group.throughput(Throughput::Elements(size as u64));
            trial.start_measurement().expect("enter measurement");
            for backend in backends {
                let case = trial.case(backend).expect("backend handle");
                let id = BenchCase {
                    scenario: kind,
                    backend,
                    size,
                    fork: trial.fork(),
                };
                // results reach 80 MB at 10^7; keep their release out of the sample
                group.bench_function(BenchmarkId::new(id.function_name(), id.parameter()), |b| {
                    b.iter_with_large_drop(|| case.invoke())
                });
            }
            trial.tear_down().expect("tear down size point");
        }
    }

    group.finish();
}
