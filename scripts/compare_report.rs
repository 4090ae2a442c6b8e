use anyhow::{Context, Result, anyhow};
use arrbench_core::{
    BackendKind, BenchConfig, ScenarioKind,
    perf::scenarios::{BenchCase, declared_cases, load_bench_config},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::warn;

#[cfg(test)]
mod compare_report_test;

#[derive(Debug)]
struct Options {
    run_bench: bool,
    benches: Vec<String>,
    criterion_dir: PathBuf,
    output_dir: PathBuf,
    config: Option<PathBuf>,
    timestamp: DateTime<Utc>,
    notes: Option<String>,
}

#[derive(Debug, Serialize)]
struct CaseMetrics {
    scenario: String,
    backend: String,
    size: i64,
    forks: usize,
    mean_ns: f64,
    median_ns: f64,
    std_dev_ns: f64,
    /// Baseline mean divided by this mean; above 1.0 beats the loop
    speedup_vs_loop: Option<f64>,
}

#[derive(Debug, Serialize)]
struct Report {
    generated_at: String,
    git_rev: Option<String>,
    notes: Option<String>,
    missing: Vec<String>,
    metrics: Vec<CaseMetrics>,
}

#[derive(Deserialize)]
struct EstimateFile {
    mean: EstimateEntry,
    median: EstimateEntry,
    std_dev: EstimateEntry,
}

#[derive(Deserialize)]
struct EstimateEntry {
    point_estimate: f64,
}

#[derive(Default)]
struct Accumulated {
    forks: usize,
    mean_ns: f64,
    median_ns: f64,
    std_dev_ns: f64,
}

fn main() -> Result<()> {
    init_tracing();
    let opts = parse_args(env::args().skip(1))?;
    let config = match &opts.config {
        Some(path) => BenchConfig::load(path).with_context(|| format!("load config {}", path.display()))?,
        None => load_bench_config().context("load bench config")?,
    };

    if opts.run_bench {
        for bench in &opts.benches {
            run_cargo_bench(bench, opts.config.as_deref())?;
        }
    }

    if !opts.output_dir.exists() {
        fs::create_dir_all(&opts.output_dir)
            .with_context(|| format!("create output directory {}", opts.output_dir.display()))?;
    }

    let (metrics, missing) = collect_metrics(&opts.criterion_dir, &config)?;

    let git_rev = env::var("GITHUB_SHA")
        .ok()
        .map(|sha| sha.chars().take(8).collect::<String>());
    let report = Report {
        generated_at: opts.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        git_rev,
        notes: opts.notes.clone(),
        missing,
        metrics,
    };

    let json_path = opts.output_dir.join("latest.json");
    let csv_path = opts.output_dir.join("latest.csv");
    write_json(&json_path, &report)?;
    write_csv(&csv_path, &report.metrics)?;

    println!(
        "Comparison report written -> {}, {} ({} cases, {} missing)",
        json_path.display(),
        csv_path.display(),
        report.metrics.len(),
        report.missing.len()
    );
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = env::var("ARRBENCH_TRACE")
        .ok()
        .and_then(|expr| EnvFilter::try_new(expr).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

/// Gather every declared case's estimates, averaged per (size, backend), and
/// the names of cases criterion has no output for.
fn collect_metrics(criterion_dir: &Path, config: &BenchConfig) -> Result<(Vec<CaseMetrics>, Vec<String>)> {
    let mut missing = Vec::new();
    let mut metrics = Vec::new();
    for kind in ScenarioKind::ALL {
        let mut per_point: BTreeMap<(i64, BackendKind), Accumulated> = BTreeMap::new();
        for case in declared_cases(config, kind) {
            match load_estimates(criterion_dir, &case)? {
                Some(estimates) => {
                    let acc = per_point.entry((case.size, case.backend)).or_default();
                    acc.forks += 1;
                    acc.mean_ns += estimates.mean.point_estimate;
                    acc.median_ns += estimates.median.point_estimate;
                    acc.std_dev_ns += estimates.std_dev.point_estimate;
                }
                None => {
                    warn!(case = %case.bench_case_name(), "no criterion estimates");
                    missing.push(case.bench_case_name());
                }
            }
        }
        metrics.extend(summarize(kind, per_point));
    }
    Ok((metrics, missing))
}

fn summarize(kind: ScenarioKind, per_point: BTreeMap<(i64, BackendKind), Accumulated>) -> Vec<CaseMetrics> {
    let baseline: BTreeMap<i64, f64> = per_point
        .iter()
        .filter(|((_, backend), acc)| *backend == BackendKind::Scalar && acc.forks > 0)
        .map(|((size, _), acc)| (*size, acc.mean_ns / acc.forks as f64))
        .collect();

    per_point
        .into_iter()
        .filter(|(_, acc)| acc.forks > 0)
        .map(|((size, backend), acc)| {
            let n = acc.forks as f64;
            let mean_ns = acc.mean_ns / n;
            CaseMetrics {
                scenario: kind.label().to_string(),
                backend: backend.label().to_string(),
                size,
                forks: acc.forks,
                mean_ns,
                median_ns: acc.median_ns / n,
                std_dev_ns: acc.std_dev_ns / n,
                speedup_vs_loop: baseline
                    .get(&size)
                    .filter(|_| mean_ns > 0.0)
                    .map(|base| base / mean_ns),
            }
        })
        .collect()
}

fn parse_args<I>(args: I) -> Result<Options>
where
    I: IntoIterator<Item = String>,
{
    let mut opts = Options {
        run_bench: true,
        benches: vec!["log_bench".to_string(), "multiplication_bench".to_string()],
        criterion_dir: PathBuf::from("target/criterion"),
        output_dir: PathBuf::from("target/arrbench-report"),
        config: None,
        timestamp: Utc::now(),
        notes: None,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--bench" => {
                let value = iter.next().context("expected <name> after --bench")?;
                opts.benches = vec![value];
            }
            "--criterion-dir" => {
                let value = iter.next().context("expected path after --criterion-dir <dir>")?;
                opts.criterion_dir = PathBuf::from(value);
            }
            "--output-dir" => {
                let value = iter.next().context("expected path after --output-dir <dir>")?;
                opts.output_dir = PathBuf::from(value);
            }
            "--config" => {
                let value = iter.next().context("expected path after --config <file>")?;
                opts.config = Some(PathBuf::from(value));
            }
            "--timestamp" => {
                let value = iter.next().context("expected RFC3339 timestamp after --timestamp")?;
                opts.timestamp = DateTime::parse_from_rfc3339(&value)
                    .context("parse --timestamp as RFC3339")?
                    .with_timezone(&Utc);
            }
            "--notes" => {
                let value = iter.next().context("expected string after --notes")?;
                opts.notes = Some(value);
            }
            "--skip-bench" => opts.run_bench = false,
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                return Err(anyhow!(
                    "unknown argument '{}'. Use --help for usage information.",
                    other
                ));
            }
        }
    }

    Ok(opts)
}

fn print_help() {
    println!("Usage: compare_report [options]");
    println!();
    println!("Options:");
    println!("  --bench <name>           Run only this bench target (log_bench, multiplication_bench)");
    println!("  --criterion-dir <path>   Path to Criterion output (default: target/criterion)");
    println!("  --output-dir <path>      Destination for latest.json / latest.csv");
    println!("  --config <file>          TOML/YAML scenario config (default: $ARRBENCH_CONFIG or built-in)");
    println!("  --timestamp <RFC3339>    Override timestamp for this report");
    println!("  --notes <text>           Attach notes to this report");
    println!("  --skip-bench             Skip running cargo bench; reuse existing output");
    println!("  --help, -h               Show this help message");
}

fn run_cargo_bench(bench: &str, config: Option<&Path>) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["bench", "-p", "arrbench-core", "--bench", bench, "--", "--noplot"]);
    if let Some(path) = config {
        cmd.env("ARRBENCH_CONFIG", path);
    }
    let status = cmd.status().context("failed to spawn cargo bench")?;
    if !status.success() {
        return Err(anyhow!("cargo bench --bench {} exited with {}", bench, status));
    }
    Ok(())
}

fn load_estimates(criterion_dir: &Path, case: &BenchCase) -> Result<Option<EstimateFile>> {
    let path = case.estimates_path(criterion_dir);
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let estimates = serde_json::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(estimates))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value).with_context(|| format!("write {}", path.display()))
}

fn write_csv(path: &Path, metrics: &[CaseMetrics]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path).with_context(|| format!("create {}", path.display()))?);
    writeln!(
        writer,
        "scenario,backend,size,forks,mean_ns,median_ns,std_dev_ns,speedup_vs_loop"
    )?;
    for metric in metrics {
        writeln!(
            writer,
            "{},{},{},{},{:.6},{:.6},{:.6},{}",
            metric.scenario,
            metric.backend,
            metric.size,
            metric.forks,
            metric.mean_ns,
            metric.median_ns,
            metric.std_dev_ns,
            metric
                .speedup_vs_loop
                .map(|ratio| format!("{:.4}", ratio))
                .unwrap_or_default()
        )?;
    }
    writer.flush()?;
    Ok(())
}
