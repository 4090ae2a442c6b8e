//! Error types for arrbench scenarios

use thiserror::Error;

use crate::backend::BackendKind;
use crate::scenario::lifecycle::Phase;

/// Result type alias for scenario operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Errors surfaced to the benchmarking engine.
///
/// None of these are retried: setup failures are a deterministic function of
/// the configuration, so the same configuration fails the same way again.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Malformed scenario configuration (negative size, empty sweep, ...).
    /// Fatal to the scenario run and reported before any timing starts.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A backend could not materialize its handle at the requested size.
    /// Only that backend is excluded from the affected size point.
    #[error("allocation failure in {target} for {len} elements ({bytes} bytes): {reason}")]
    AllocationFailure {
        /// Backend label, or `raw` for the generator itself
        target: &'static str,
        /// Requested element count
        len: usize,
        /// Requested byte count
        bytes: u64,
        /// What went wrong
        reason: String,
    },

    /// Two setup runs with the same seed produced different sequences.
    #[error("non-deterministic input: seed {seed} at draw {position} diverged at index {index}")]
    NonDeterminism {
        /// Seed of the diverging state
        seed: u64,
        /// Draw position the sequence started at
        position: u64,
        /// First index whose bits differ
        index: usize,
    },

    /// The engine drove the trial through an illegal transition.
    #[error("illegal lifecycle transition from {from:?} via {action}")]
    Lifecycle {
        /// Phase the trial was in
        from: Phase,
        /// Requested action
        action: &'static str,
    },

    /// A backend that was excluded (or never enabled) was invoked.
    #[error("backend {0} has no handle for this size point")]
    BackendUnavailable(BackendKind),

    /// Configuration file could not be parsed
    #[error("config error in {path}: {msg}")]
    Config {
        /// File that failed to parse
        path: String,
        /// Parser message
        msg: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        BenchError::InvalidConfiguration(msg.into())
    }

    /// Whether the error only excludes one backend rather than failing the run
    pub fn is_exclusion(&self) -> bool {
        matches!(self, BenchError::AllocationFailure { .. })
    }
}
