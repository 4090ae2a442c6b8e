use tracing::debug;

use super::{Fixture, Invoker, ScenarioConfig, ScenarioKind, Sink, SinkResult};
use crate::backend::BackendKind;
use crate::error::{BenchError, Result};
use crate::seed::SeedState;

/// Where a trial is in the engine-driven lifecycle.
///
/// `Unconfigured -> Setup -> Warming -> Measuring -> TornDown`. Warming may be
/// skipped; Measuring repeats as often as the engine likes. Only a size this
/// trial has not set up yet (after tear-down) leads back to Setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unconfigured,
    Setup,
    Warming,
    Measuring,
    TornDown,
}

/// One (scenario, size, fork) run as seen from the core.
#[derive(Debug)]
pub struct Trial<'c> {
    kind: ScenarioKind,
    config: &'c ScenarioConfig,
    fork: u32,
    phase: Phase,
    size: Option<i64>,
    fixture: Option<Fixture>,
    completed: Vec<i64>,
}

impl<'c> Trial<'c> {
    pub fn new(kind: ScenarioKind, config: &'c ScenarioConfig, fork: u32) -> Self {
        Self {
            kind,
            config,
            fork,
            phase: Phase::Unconfigured,
            size: None,
            fixture: None,
            completed: Vec::new(),
        }
    }

    pub fn kind(&self) -> ScenarioKind {
        self.kind
    }

    pub fn fork(&self) -> u32 {
        self.fork
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn size(&self) -> Option<i64> {
        self.size
    }

    pub fn fixture(&self) -> Option<&Fixture> {
        self.fixture.as_ref()
    }

    /// Sizes this trial has already set up, in order
    pub fn completed_sizes(&self) -> &[i64] {
        &self.completed
    }

    /// Engine-side parameter injection. Allowed before setup or after
    /// tear-down; anything else would change the size under a live fixture.
    /// A size that was already set up in this trial is rejected: setup runs
    /// once per (scenario, size, fork).
    pub fn set_size(&mut self, size: i64) -> Result<()> {
        if self.completed.contains(&size) {
            return Err(BenchError::Lifecycle {
                from: self.phase,
                action: "set_size to a size already set up",
            });
        }
        match self.phase {
            Phase::Unconfigured | Phase::TornDown => {
                self.size = Some(size);
                self.phase = Phase::Unconfigured;
                Ok(())
            }
            from => Err(BenchError::Lifecycle { from, action: "set_size" }),
        }
    }

    /// Run data generation and every adapter once. The seed is borrowed for
    /// this call only.
    pub fn setup(&mut self, seed: &mut SeedState) -> Result<&Fixture> {
        if self.phase != Phase::Unconfigured {
            return Err(BenchError::Lifecycle {
                from: self.phase,
                action: "setup",
            });
        }
        let size = self
            .size
            .ok_or_else(|| BenchError::invalid("no array size injected before setup"))?;
        let fixture = Fixture::setup(self.kind, self.config, size, seed)?;
        debug!(kind = %self.kind, size, fork = self.fork, "trial set up");
        self.phase = Phase::Setup;
        self.completed.push(size);
        Ok(self.fixture.insert(fixture))
    }

    pub fn start_warmup(&mut self) -> Result<()> {
        match self.phase {
            Phase::Setup | Phase::Warming => {
                self.phase = Phase::Warming;
                Ok(())
            }
            from => Err(BenchError::Lifecycle {
                from,
                action: "start_warmup",
            }),
        }
    }

    pub fn start_measurement(&mut self) -> Result<()> {
        match self.phase {
            Phase::Setup | Phase::Warming | Phase::Measuring => {
                self.phase = Phase::Measuring;
                Ok(())
            }
            from => Err(BenchError::Lifecycle {
                from,
                action: "start_measurement",
            }),
        }
    }

    /// The invoker for `backend`, for engines that time calls themselves.
    pub fn case(&self, backend: BackendKind) -> Result<&dyn Invoker> {
        match (self.phase, self.fixture.as_ref()) {
            (Phase::Warming | Phase::Measuring, Some(fixture)) => fixture.case(backend),
            (from, _) => Err(BenchError::Lifecycle { from, action: "invoke" }),
        }
    }

    pub fn invoke(&self, backend: BackendKind) -> Result<SinkResult> {
        Ok(self.case(backend)?.invoke())
    }

    /// Invoke `backend` once and hand the result to `sink`.
    pub fn run(&self, backend: BackendKind, sink: &mut impl Sink) -> Result<()> {
        let case = self.case(backend)?;
        sink.consume(case.invoke());
        Ok(())
    }

    /// Drop the fixture and its handles.
    pub fn tear_down(&mut self) -> Result<()> {
        match self.phase {
            Phase::Setup | Phase::Warming | Phase::Measuring | Phase::TornDown => {
                self.fixture = None;
                self.phase = Phase::TornDown;
                Ok(())
            }
            from => Err(BenchError::Lifecycle {
                from,
                action: "tear_down",
            }),
        }
    }
}
