use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ScenarioKind;
use crate::backend::{BackendKind, MemoryBudget};
use crate::error::{BenchError, Result};
use crate::seed::DEFAULT_SEED;

/// Sizes swept by the full comparison: 10^2 through 10^7.
pub const FULL_SWEEP: [i64; 6] = [100, 1_000, 10_000, 100_000, 1_000_000, 10_000_000];

/// The one size the minimal multiplication run uses.
pub const SINGLE_SIZE: i64 = 1_000_000;

/// Length and count of one engine phase (warmup or measurement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhasePolicy {
    pub iterations: u32,
    /// Duration of each iteration in seconds
    pub seconds: u64,
}

impl PhasePolicy {
    pub const fn new(iterations: u32, seconds: u64) -> Self {
        Self { iterations, seconds }
    }

    pub fn total(&self) -> Duration {
        Duration::from_secs(self.seconds.saturating_mul(u64::from(self.iterations)))
    }
}

/// Declared execution policy and sweep for one scenario.
///
/// Read by the engine before any setup; the core never interprets timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub sizes: Vec<i64>,
    pub forks: u32,
    pub warmup: PhasePolicy,
    pub measurement: PhasePolicy,
    pub seed: u64,
    pub backends: Vec<BackendKind>,
    /// Re-derive each raw sequence from a seed checkpoint and compare bits
    pub verify_determinism: bool,
    /// Per-handle allocation cap in bytes
    pub memory_limit_bytes: Option<u64>,
}

impl ScenarioConfig {
    pub fn log() -> Self {
        Self {
            sizes: FULL_SWEEP.to_vec(),
            forks: 2,
            warmup: PhasePolicy::new(5, 10),
            measurement: PhasePolicy::new(10, 10),
            seed: DEFAULT_SEED,
            backends: BackendKind::ALL.to_vec(),
            verify_determinism: true,
            memory_limit_bytes: None,
        }
    }

    pub fn multiplication() -> Self {
        Self {
            forks: 1,
            ..Self::log()
        }
    }

    /// Single fixed size, the minimal multiplication configuration
    pub fn multiplication_single() -> Self {
        Self {
            sizes: vec![SINGLE_SIZE],
            ..Self::multiplication()
        }
    }

    pub fn for_kind(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::Log => Self::log(),
            ScenarioKind::Multiplication => Self::multiplication(),
        }
    }

    pub fn with_sizes(mut self, sizes: impl Into<Vec<i64>>) -> Self {
        self.sizes = sizes.into();
        self
    }

    pub fn with_backends(mut self, backends: impl Into<Vec<BackendKind>>) -> Self {
        self.backends = backends.into();
        self
    }

    pub fn budget(&self) -> MemoryBudget {
        MemoryBudget::with_limit(self.memory_limit_bytes)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sizes.is_empty() {
            return Err(BenchError::invalid("no array sizes declared"));
        }
        if let Some(size) = self.sizes.iter().find(|size| **size < 0) {
            return Err(BenchError::invalid(format!(
                "array size must be non-negative, got {}",
                size
            )));
        }
        for (i, size) in self.sizes.iter().enumerate() {
            if self.sizes[..i].contains(size) {
                return Err(BenchError::invalid(format!("array size {} declared twice", size)));
            }
        }
        if self.forks == 0 {
            return Err(BenchError::invalid("fork count must be at least 1"));
        }
        if self.measurement.iterations == 0 {
            return Err(BenchError::invalid("measurement needs at least one iteration"));
        }
        if self.backends.is_empty() {
            return Err(BenchError::invalid("no backends enabled"));
        }
        for (i, backend) in self.backends.iter().enumerate() {
            if self.backends[..i].contains(backend) {
                return Err(BenchError::invalid(format!("backend {} listed twice", backend)));
            }
        }
        Ok(())
    }
}

/// Declarations for both scenarios.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchConfig {
    pub log: ScenarioConfig,
    pub multiplication: ScenarioConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            log: ScenarioConfig::log(),
            multiplication: ScenarioConfig::multiplication(),
        }
    }
}

impl BenchConfig {
    pub fn scenario(&self, kind: ScenarioKind) -> &ScenarioConfig {
        match kind {
            ScenarioKind::Log => &self.log,
            ScenarioKind::Multiplication => &self.multiplication,
        }
    }

    pub fn scenario_mut(&mut self, kind: ScenarioKind) -> &mut ScenarioConfig {
        match kind {
            ScenarioKind::Log => &mut self.log,
            ScenarioKind::Multiplication => &mut self.multiplication,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.log.validate()?;
        self.multiplication.validate()
    }

    /// Load from TOML, or YAML when the extension says so.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let display = path.display().to_string();
        let file: ConfigFile = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&text).map_err(|e| BenchError::Config {
                path: display.clone(),
                msg: e.to_string(),
            })?,
            _ => toml::from_str(&text).map_err(|e| BenchError::Config {
                path: display.clone(),
                msg: e.to_string(),
            })?,
        };
        let config = file.resolve();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(text).map_err(|e| BenchError::Config {
            path: "<inline>".to_string(),
            msg: e.to_string(),
        })?;
        let config = file.resolve();
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    log: ScenarioSection,
    #[serde(default)]
    multiplication: ScenarioSection,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ScenarioSection {
    #[serde(default)]
    sizes: Option<Vec<i64>>,
    /// Shorthand for the single-size multiplication preset
    #[serde(default)]
    single_size: Option<bool>,
    #[serde(default)]
    forks: Option<u32>,
    #[serde(default)]
    warmup: PhaseSection,
    #[serde(default)]
    measurement: PhaseSection,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    backends: Option<Vec<BackendKind>>,
    #[serde(default)]
    verify_determinism: Option<bool>,
    #[serde(default)]
    memory_limit_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PhaseSection {
    #[serde(default)]
    iterations: Option<u32>,
    #[serde(default)]
    seconds: Option<u64>,
}

impl ConfigFile {
    fn resolve(self) -> BenchConfig {
        BenchConfig {
            log: self.log.apply(ScenarioConfig::log()),
            multiplication: self.multiplication.apply(ScenarioConfig::multiplication()),
        }
    }
}

impl ScenarioSection {
    fn apply(self, mut base: ScenarioConfig) -> ScenarioConfig {
        if self.single_size == Some(true) {
            base.sizes = vec![SINGLE_SIZE];
        }
        if let Some(sizes) = self.sizes {
            base.sizes = sizes;
        }
        if let Some(forks) = self.forks {
            base.forks = forks;
        }
        base.warmup = self.warmup.apply(base.warmup);
        base.measurement = self.measurement.apply(base.measurement);
        if let Some(seed) = self.seed {
            base.seed = seed;
        }
        if let Some(backends) = self.backends {
            base.backends = backends;
        }
        if let Some(verify) = self.verify_determinism {
            base.verify_determinism = verify;
        }
        if self.memory_limit_bytes.is_some() {
            base.memory_limit_bytes = self.memory_limit_bytes;
        }
        base
    }
}

impl PhaseSection {
    fn apply(self, base: PhasePolicy) -> PhasePolicy {
        PhasePolicy {
            iterations: self.iterations.unwrap_or(base.iterations),
            seconds: self.seconds.unwrap_or(base.seconds),
        }
    }
}
