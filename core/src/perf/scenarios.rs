use std::path::{Path, PathBuf};

use crate::backend::BackendKind;
use crate::error::Result;
use crate::scenario::{BenchConfig, ScenarioKind};

/// Environment variable naming an optional TOML/YAML config for bench runs.
pub const CONFIG_ENV: &str = "ARRBENCH_CONFIG";

/// One criterion case: `<scenario>/<backend>/<size>[_f<fork>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BenchCase {
    pub scenario: ScenarioKind,
    pub backend: BackendKind,
    pub size: i64,
    pub fork: u32,
}

impl BenchCase {
    pub fn group_name(&self) -> &'static str {
        self.scenario.label()
    }

    pub fn function_name(&self) -> &'static str {
        self.backend.label()
    }

    /// Criterion parameter; the first fork keeps the bare size.
    pub fn parameter(&self) -> String {
        if self.fork == 0 {
            self.size.to_string()
        } else {
            format!("{}_f{}", self.size, self.fork)
        }
    }

    pub fn bench_case_name(&self) -> String {
        format!("{}/{}/{}", self.group_name(), self.function_name(), self.parameter())
    }

    /// Where criterion leaves the point estimates for this case.
    pub fn estimates_path(&self, criterion_dir: &Path) -> PathBuf {
        criterion_dir
            .join(self.group_name())
            .join(self.function_name())
            .join(self.parameter())
            .join("new")
            .join("estimates.json")
    }
}

/// Every case the benches declare for `kind`, fork-major like the bench loop.
pub fn declared_cases(config: &BenchConfig, kind: ScenarioKind) -> Vec<BenchCase> {
    let scenario = config.scenario(kind);
    let mut cases = Vec::new();
    for fork in 0..scenario.forks {
        for &size in &scenario.sizes {
            for &backend in &scenario.backends {
                cases.push(BenchCase {
                    scenario: kind,
                    backend,
                    size,
                    fork,
                });
            }
        }
    }
    cases
}

/// Config for a bench run: the file named by `ARRBENCH_CONFIG`, or defaults.
pub fn load_bench_config() -> Result<BenchConfig> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => BenchConfig::load(Path::new(&path)),
        _ => Ok(BenchConfig::default()),
    }
}
