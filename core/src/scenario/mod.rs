//! Benchmark scenarios: setup of inputs and handles, and the invoker table the
//! engine times.

pub mod config;
pub mod lifecycle;
pub mod sink;

#[cfg(test)]
mod lifecycle_test;

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{
    AlgebraBackend, Backend, BackendKind, ColumnarBackend, MemoryBudget, ScalarBackend, VectorizedBackend,
};
use crate::data::{self, RawSequence};
use crate::error::{BenchError, Result};
use crate::seed::SeedState;

pub use config::{BenchConfig, PhasePolicy, ScenarioConfig};
pub use lifecycle::{Phase, Trial};
pub use sink::{BlackHole, Sink, SinkResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Log,
    #[serde(alias = "mul")]
    Multiplication,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 2] = [ScenarioKind::Log, ScenarioKind::Multiplication];

    pub fn label(self) -> &'static str {
        match self {
            ScenarioKind::Log => "log",
            ScenarioKind::Multiplication => "multiplication",
        }
    }

    /// Raw sequences drawn per setup
    pub fn operands(self) -> usize {
        match self {
            ScenarioKind::Log => 1,
            ScenarioKind::Multiplication => 2,
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One timed entry point: a backend's prepared handles plus the operation.
pub trait Invoker {
    fn backend(&self) -> BackendKind;

    /// Compute the operation afresh and return the native result.
    fn invoke(&self) -> SinkResult;
}

struct LogCase<B: Backend> {
    backend: B,
    src: B::Array,
}

impl<B: Backend> Invoker for LogCase<B> {
    fn backend(&self) -> BackendKind {
        B::KIND
    }

    #[inline]
    fn invoke(&self) -> SinkResult {
        B::into_sink(self.backend.ln(&self.src))
    }
}

struct MulCase<B: Backend> {
    backend: B,
    lhs: B::Array,
    rhs: B::Array,
}

impl<B: Backend> Invoker for MulCase<B> {
    fn backend(&self) -> BackendKind {
        B::KIND
    }

    #[inline]
    fn invoke(&self) -> SinkResult {
        B::into_sink(self.backend.mul(&self.lhs, &self.rhs))
    }
}

fn build_case<B>(kind: ScenarioKind, inputs: &[RawSequence], budget: &MemoryBudget) -> Result<Box<dyn Invoker>>
where
    B: Backend + 'static,
    B::Array: 'static,
{
    let len = inputs.first().map(RawSequence::len).unwrap_or(0);
    let backend = B::prepare(len);
    match (kind, inputs) {
        (ScenarioKind::Log, [src]) => {
            let src = backend.build(src, budget)?;
            Ok(Box::new(LogCase { backend, src }))
        }
        (ScenarioKind::Multiplication, [first, second]) => {
            let lhs = backend.build(first, budget)?;
            let rhs = backend.build(second, budget)?;
            Ok(Box::new(MulCase { backend, lhs, rhs }))
        }
        _ => Err(BenchError::invalid(format!(
            "{} scenario expects {} operand(s), got {}",
            kind,
            kind.operands(),
            inputs.len()
        ))),
    }
}

fn build_for(
    kind: ScenarioKind,
    backend: BackendKind,
    inputs: &[RawSequence],
    budget: &MemoryBudget,
) -> Result<Box<dyn Invoker>> {
    match backend {
        BackendKind::Vectorized => build_case::<VectorizedBackend>(kind, inputs, budget),
        BackendKind::Algebra => build_case::<AlgebraBackend>(kind, inputs, budget),
        BackendKind::Columnar => build_case::<ColumnarBackend>(kind, inputs, budget),
        BackendKind::Scalar => build_case::<ScalarBackend>(kind, inputs, budget),
    }
}

/// A backend that sat out one size point, and why.
#[derive(Debug)]
pub struct Exclusion {
    pub backend: BackendKind,
    pub error: BenchError,
}

/// Inputs and handles for one (scenario, size, fork), built by setup.
pub struct Fixture {
    kind: ScenarioKind,
    len: usize,
    inputs: Vec<RawSequence>,
    cases: Vec<Box<dyn Invoker>>,
    exclusions: Vec<Exclusion>,
    setup_time: Duration,
}

impl fmt::Debug for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixture")
            .field("kind", &self.kind)
            .field("len", &self.len)
            .field("backends", &self.backends())
            .field("exclusions", &self.exclusions)
            .finish()
    }
}

impl Fixture {
    /// Draw the raw operands from `seed`, then build every enabled backend.
    ///
    /// The size is checked before anything is drawn. A backend whose handle
    /// cannot be allocated is recorded as an [`Exclusion`]; every other error
    /// aborts setup.
    pub fn setup(kind: ScenarioKind, config: &ScenarioConfig, requested: i64, seed: &mut SeedState) -> Result<Self> {
        let started = Instant::now();
        data::checked_len(requested)?;

        let mut inputs = Vec::with_capacity(kind.operands());
        for operand in 0..kind.operands() {
            let checkpoint = seed.checkpoint();
            let sequence = data::generate(seed, requested)?;
            if config.verify_determinism {
                data::verify_replay(checkpoint, &sequence)?;
            }
            debug!(%kind, operand, position = checkpoint.position, "operand drawn");
            inputs.push(sequence);
        }

        let budget = config.budget();
        let mut cases: Vec<Box<dyn Invoker>> = Vec::with_capacity(config.backends.len());
        let mut exclusions = Vec::new();
        for &backend in &config.backends {
            if cases.iter().any(|case| case.backend() == backend) {
                continue;
            }
            match build_for(kind, backend, &inputs, &budget) {
                Ok(case) => cases.push(case),
                Err(error) if error.is_exclusion() => {
                    warn!(%kind, %backend, size = requested, %error, "backend excluded from size point");
                    exclusions.push(Exclusion { backend, error });
                }
                Err(error) => return Err(error),
            }
        }

        let setup_time = started.elapsed();
        info!(
            %kind,
            size = requested,
            backends = cases.len(),
            excluded = exclusions.len(),
            setup_ms = setup_time.as_secs_f64() * 1e3,
            "setup complete"
        );
        Ok(Self {
            kind,
            len: inputs.first().map(RawSequence::len).unwrap_or(0),
            inputs,
            cases,
            exclusions,
            setup_time,
        })
    }

    pub fn kind(&self) -> ScenarioKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The raw operands every backend was built from
    pub fn inputs(&self) -> &[RawSequence] {
        &self.inputs
    }

    /// Participating backends, in declaration order
    pub fn backends(&self) -> Vec<BackendKind> {
        self.cases.iter().map(|case| case.backend()).collect()
    }

    pub fn exclusions(&self) -> &[Exclusion] {
        &self.exclusions
    }

    pub fn setup_time(&self) -> Duration {
        self.setup_time
    }

    pub fn cases(&self) -> impl Iterator<Item = &(dyn Invoker + 'static)> {
        self.cases.iter().map(|case| case.as_ref())
    }

    pub fn case(&self, backend: BackendKind) -> Result<&dyn Invoker> {
        self.cases()
            .find(|case| case.backend() == backend)
            .ok_or(BenchError::BackendUnavailable(backend))
    }

    pub fn invoke(&self, backend: BackendKind) -> Result<SinkResult> {
        Ok(self.case(backend)?.invoke())
    }
}
