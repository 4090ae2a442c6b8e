use std::path::PathBuf;

use anyhow::Context;
use arrbench_core::{BackendKind, BenchConfig, ScenarioConfig, ScenarioKind, perf::scenarios::CONFIG_ENV};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

mod probe;

const DEFAULT_TRACE_FILTER: &str = "arrbench_core=info,arrbench_cli=info";

#[derive(Debug, Parser)]
#[command(
    name = "arrbench",
    author,
    version,
    about = "Inspect and probe elementwise array backend benchmarks",
    long_about = None,
    after_help = "Timed runs: cargo bench -p arrbench-core (reads $ARRBENCH_CONFIG)"
)]
struct CliArgs {
    /// TOML or YAML scenario config; defaults to $ARRBENCH_CONFIG, then built-ins
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Emit JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScenarioArg {
    Log,
    #[value(alias = "mul")]
    Multiplication,
}

impl From<ScenarioArg> for ScenarioKind {
    fn from(value: ScenarioArg) -> Self {
        match value {
            ScenarioArg::Log => ScenarioKind::Log,
            ScenarioArg::Multiplication => ScenarioKind::Multiplication,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the declared sweep and execution policy of each scenario.
    List,
    /// Run setup and one call per backend for each size, outside any engine.
    Probe {
        #[arg(long, value_enum)]
        scenario: ScenarioArg,
        /// Array size to probe (repeatable); defaults to the declared sweep
        #[arg(long = "size", value_name = "N", allow_negative_numbers = true)]
        sizes: Vec<i64>,
        /// Restrict to these backends: ndarray, field, arrow, loop (repeatable)
        #[arg(long = "backend", value_name = "NAME", value_parser = parse_backend)]
        backends: Vec<BackendKind>,
        /// Use the single 10^6 multiplication point instead of the full sweep
        #[arg(long)]
        single_size: bool,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn parse_backend(raw: &str) -> Result<BackendKind, String> {
    BackendKind::from_label(raw).ok_or_else(|| format!("unknown backend '{}' (expected ndarray, field, arrow or loop)", raw))
}

/// Read an `ARRBENCH_TRACE` value: `None` leaves tracing off, `Some(None)`
/// asks for `RUST_LOG` or the default filter, `Some(Some(expr))` is a filter.
fn trace_setting(raw: &str) -> Option<Option<&str>> {
    let any_of = |words: &[&str], v: &str| words.iter().any(|w| v.eq_ignore_ascii_case(w));
    match raw.trim() {
        "" => None,
        v if any_of(&["0", "false", "off"], v) => None,
        v if any_of(&["1", "true", "on"], v) => Some(None),
        expr => Some(Some(expr)),
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let Ok(raw) = std::env::var("ARRBENCH_TRACE") else {
        return;
    };
    let Some(expr) = trace_setting(&raw) else {
        return;
    };
    let filter = expr
        .map(str::to_string)
        .or_else(|| std::env::var("RUST_LOG").ok())
        .and_then(|expr| EnvFilter::try_new(expr).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_TRACE_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

fn load_config(explicit: Option<&PathBuf>) -> anyhow::Result<BenchConfig> {
    let path = explicit
        .cloned()
        .or_else(|| std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()).map(PathBuf::from));
    match path {
        Some(path) => BenchConfig::load(&path).with_context(|| format!("load config {}", path.display())),
        None => Ok(BenchConfig::default()),
    }
}

#[derive(Debug, Serialize)]
struct ScenarioListing<'a> {
    scenario: &'static str,
    #[serde(flatten)]
    config: &'a ScenarioConfig,
}

fn list(config: &BenchConfig, json: bool) -> anyhow::Result<()> {
    let listings: Vec<ScenarioListing<'_>> = ScenarioKind::ALL
        .into_iter()
        .map(|kind| ScenarioListing {
            scenario: kind.label(),
            config: config.scenario(kind),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }

    for listing in &listings {
        let c = listing.config;
        let sizes: Vec<String> = c.sizes.iter().map(|s| s.to_string()).collect();
        let backends: Vec<&str> = c.backends.iter().map(|b| b.label()).collect();
        println!("{}", listing.scenario);
        println!("  sizes:        {}", sizes.join(", "));
        println!("  backends:     {}", backends.join(", "));
        println!("  forks:        {}", c.forks);
        println!("  warmup:       {} x {}s", c.warmup.iterations, c.warmup.seconds);
        println!("  measurement:  {} x {}s", c.measurement.iterations, c.measurement.seconds);
        println!("  seed:         {}", c.seed);
        if let Some(limit) = c.memory_limit_bytes {
            println!("  memory limit: {} bytes per handle", limit);
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let CliArgs { config, json, command } = CliArgs::parse();
    let mut bench_config = load_config(config.as_ref())?;

    match command {
        Commands::List => list(&bench_config, json),
        Commands::Probe {
            scenario,
            sizes,
            backends,
            single_size,
            seed,
        } => {
            let kind = ScenarioKind::from(scenario);
            let scenario_config = bench_config.scenario_mut(kind);
            if single_size {
                if kind != ScenarioKind::Multiplication {
                    anyhow::bail!("--single-size only applies to the multiplication scenario");
                }
                scenario_config.sizes = ScenarioConfig::multiplication_single().sizes;
            }
            if !sizes.is_empty() {
                scenario_config.sizes = sizes;
            }
            if !backends.is_empty() {
                scenario_config.backends = backends;
            }
            if let Some(seed) = seed {
                scenario_config.seed = seed;
            }
            scenario_config.validate()?;

            let rows = probe::run(kind, scenario_config)?;
            probe::print(&rows, json)
        }
    }
}
