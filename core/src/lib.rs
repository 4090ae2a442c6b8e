//! Elementwise array backend benchmarks.
//!
//! The crate owns the scenario side of the comparison: deterministic inputs,
//! per-backend handles built once per size point, and the invokers an external
//! engine (criterion, in `benches/`) times. It never times anything itself.

pub mod backend;
pub mod data;
pub mod error;
pub mod perf;
pub mod scenario;
pub mod seed;

#[cfg(test)]
mod backend_test;

pub use backend::{Backend, BackendKind, MemoryBudget};
pub use data::{RawSequence, generate};
pub use error::{BenchError, Result};
pub use scenario::{
    BenchConfig, BlackHole, Fixture, Invoker, Phase, PhasePolicy, ScenarioConfig, ScenarioKind, Sink, SinkResult,
    Trial,
};
pub use seed::{DEFAULT_SEED, SeedState};
