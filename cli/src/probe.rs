//! Single-shot probe of a scenario: one setup and one call per backend for
//! each size. Useful for checking a config before a long criterion run; it
//! does not produce statistics.

use std::time::Instant;

use arrbench_core::{BlackHole, ScenarioConfig, ScenarioKind, SeedState, Sink, Trial};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub(crate) struct ProbeRow {
    pub(crate) scenario: &'static str,
    pub(crate) size: i64,
    pub(crate) backend: &'static str,
    pub(crate) status: &'static str,
    pub(crate) setup_ms: f64,
    pub(crate) call_us: Option<f64>,
    pub(crate) result_len: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) note: Option<String>,
}

pub(crate) fn run(kind: ScenarioKind, config: &ScenarioConfig) -> anyhow::Result<Vec<ProbeRow>> {
    let mut seed = SeedState::new(config.seed);
    let mut trial = Trial::new(kind, config, 0);
    let mut sink = BlackHole::new();
    let mut rows = Vec::new();

    for &size in &config.sizes {
        trial.set_size(size)?;
        let fixture = trial.setup(&mut seed)?;
        let setup_ms = fixture.setup_time().as_secs_f64() * 1e3;
        for exclusion in fixture.exclusions() {
            rows.push(ProbeRow {
                scenario: kind.label(),
                size,
                backend: exclusion.backend.label(),
                status: "excluded",
                setup_ms,
                call_us: None,
                result_len: None,
                note: Some(exclusion.error.to_string()),
            });
        }
        let backends = fixture.backends();

        trial.start_warmup()?;
        for &backend in &backends {
            trial.run(backend, &mut sink)?;
        }

        trial.start_measurement()?;
        for &backend in &backends {
            let case = trial.case(backend)?;
            let started = Instant::now();
            let result = case.invoke();
            let elapsed = started.elapsed();
            let result_len = result.len();
            sink.consume(result);
            rows.push(ProbeRow {
                scenario: kind.label(),
                size,
                backend: backend.label(),
                status: "ok",
                setup_ms,
                call_us: Some(elapsed.as_secs_f64() * 1e6),
                result_len: Some(result_len),
                note: None,
            });
        }
        trial.tear_down()?;
    }

    info!(scenario = %kind, consumed = sink.consumed(), "probe finished");
    Ok(rows)
}

pub(crate) fn print(rows: &[ProbeRow], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }

    println!(
        "{:<15} {:>10} {:<8} {:<9} {:>11} {:>13}",
        "scenario", "size", "backend", "status", "setup_ms", "call_us"
    );
    for row in rows {
        let call = row.call_us.map(|us| format!("{:.2}", us)).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<15} {:>10} {:<8} {:<9} {:>11.3} {:>13}",
            row.scenario, row.size, row.backend, row.status, row.setup_ms, call
        );
        if let Some(note) = &row.note {
            println!("    {}", note);
        }
    }
    Ok(())
}
