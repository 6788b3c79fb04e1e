use std::{
    fs,
    path::PathBuf,
    process::ExitCode,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use clap::Parser;
use ferrite::{
    config::RuntimeConfig,
    model::{Api, ControlState, Model, PerThread, RecordingStatus, Status, StatusFanout, TracingStatus},
    runtime::{
        error::RuntimeResult,
        identifier::{IdentifierDatabase, IdentifierEntry},
        rng::{RngSeed, RngType, Sampling},
        summation::{Bound, summation_with},
        variant::{ValueType, Variant},
    },
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const BATCH: u64 = 4096;
const ESTIMATE_HANDLE: u64 = 1;
const HITS_HANDLE: u64 = 2;

#[derive(Parser, Debug)]
#[command(name = "ferrite", version, about = "Estimate pi by Monte-Carlo sampling on ferrite workers")]
struct Cli {
    /// JSON runtime configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Overrides the configured seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Overrides the configured generator.
    #[arg(long, value_enum)]
    rng: Option<RngType>,

    /// Total points across all workers.
    #[arg(long, default_value_t = 10_000_000)]
    samples: u64,

    /// Writes every status callback as JSON to this file.
    #[arg(long)]
    events_json: Option<PathBuf>,
}

/// Each worker throws points into the unit square and counts those inside
/// the quarter circle. Every batch ends at a checkpoint.
struct QuarterCircle {
    threads: usize,
    samples: u64,
    hits: AtomicU64,
}

impl QuarterCircle {
    fn share(&self, thread_id: u32) -> u64 {
        let base = self.samples / self.threads as u64;
        let extra = u64::from((thread_id as u64) < self.samples % self.threads as u64);
        base + extra
    }
}

impl Model for QuarterCircle {
    fn number_threads(&self) -> usize {
        self.threads
    }

    fn run_thread(&self, thread_id: u32, per_thread: &mut PerThread) -> RuntimeResult<()> {
        let mut remaining = self.share(thread_id);
        let mut batch = 0;
        while remaining > 0 {
            batch += 1;
            per_thread.c(batch)?;
            let count = remaining.min(BATCH);
            let mut inside = 0;
            for _ in 0..count {
                let x = per_thread.random_inclusive_exclusive();
                let y = per_thread.random_inclusive_exclusive();
                if x * x + y * y < 1.0 {
                    inside += 1;
                }
            }
            self.hits.fetch_add(inside, Ordering::Relaxed);
            remaining -= count;
        }
        per_thread.variable_updated(batch, HITS_HANDLE)
    }
}

fn leibniz(config: &RuntimeConfig) -> RuntimeResult<f64> {
    summation_with(Bound::Finite(0), Bound::PositiveInfinity, &config.summation, |m| {
        let sign = if m % 2 == 0 { 1.0 } else { -1.0 };
        Ok(4.0 * sign / (2 * m + 1) as f64)
    })
}

fn identifiers() -> RuntimeResult<IdentifierDatabase> {
    let mut database = IdentifierDatabase::new();
    database.insert(IdentifierEntry::new(ESTIMATE_HANDLE, "estimate", "main", ValueType::Real))?;
    database.insert(IdentifierEntry::new(HITS_HANDLE, "hits", "main", ValueType::Integer))?;
    Ok(database)
}

fn run(cli: Cli) -> Result<ControlState, String> {
    let mut config = match &cli.config {
        Some(path) => RuntimeConfig::load(path).map_err(|e| e.to_string())?,
        None => RuntimeConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.rng.seed = RngSeed::from_u64(seed);
    }
    if let Some(rng) = cli.rng {
        config.rng.rng_type = rng;
    }
    config.apply();

    let model = Arc::new(QuarterCircle {
        threads: cli.threads,
        samples: cli.samples,
        hits: AtomicU64::new(0),
    });
    let database = identifiers().map_err(|e| e.to_string())?;
    let api = Api::with_identifiers(model.clone(), database).map_err(|e| e.to_string())?;

    let recorder = Arc::new(RecordingStatus::new());
    let status: Arc<dyn Status> = Arc::new(StatusFanout(vec![
        Arc::new(TracingStatus),
        recorder.clone(),
    ]));

    info!(
        threads = cli.threads,
        samples = cli.samples,
        rng = %config.rng.rng_type,
        "sampling"
    );
    let state = api
        .run(config.rng.rng_type, config.rng.seed, status)
        .map_err(|e| e.to_string())?;

    if let Some(path) = &cli.events_json {
        let json = recorder.to_json().map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| format!("could not write `{}`: {}", path.display(), e))?;
    }
    if state != ControlState::Stopped {
        return Ok(state);
    }

    let hits = model.hits.load(Ordering::Relaxed);
    let estimate = 4.0 * hits as f64 / cli.samples.max(1) as f64;
    {
        let database = api.identifiers();
        database
            .entry(HITS_HANDLE)
            .set_value(Variant::Integer(hits as i64))
            .map_err(|e| e.to_string())?;
        database
            .entry(ESTIMATE_HANDLE)
            .set_value(Variant::Real(estimate))
            .map_err(|e| e.to_string())?;
        for entry in database.iter() {
            println!("{} = {}", entry.text1(), entry.value());
        }
    }

    match leibniz(&config) {
        Ok(series) => println!("series = {}", series),
        Err(e) => println!("series failed: {}", e),
    }
    println!("error = {:e}", (estimate - std::f64::consts::PI).abs());
    Ok(state)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(ControlState::Stopped) => ExitCode::SUCCESS,
        Ok(state) => {
            error!(%state, "run did not finish");
            ExitCode::FAILURE
        }
        Err(message) => {
            error!("{}", message);
            ExitCode::FAILURE
        }
    }
}
