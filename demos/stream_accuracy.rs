//! Drives seeded random-string streams through both sketch variants and reports
//! estimates against the exact number of distinct items.
//!
//! Environment variables:
//! - `STREAMS`: number of independent streams per variant (default 10)
//! - `STREAM_LENGTH`: items per stream (default 1000000)
//! - `CHECKPOINT`: items between two recorded estimates (default 10000)
//! - `RESULTS_PATH`: directory receiving `<variant>_stream.md` and `<variant>_stats.md`
//! - `RUST_LOG`: log filter, e.g. `cardinality_sketch=debug`

use std::collections::HashSet;
use std::error::Error;

use cardinality_sketch::{
    BiasCorrectedEstimator, CardinalityEstimator, ClassicEstimator, SketchError, SketchHasher,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabled::settings::{Settings, Style};
use tabled::{Table, Tabled};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_STREAMS: u64 = 10;
const DEFAULT_STREAM_LENGTH: usize = 1_000_000;
const DEFAULT_CHECKPOINT: usize = 10_000;
const STREAM_SEED: u64 = 42;
const HASH_SEED: u32 = 123;
const INDEX_BITS: u8 = 12;
const MAX_ITEM_LEN: usize = 30;
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-";

struct HarnessConfig {
    streams: u64,
    stream_length: usize,
    checkpoint: usize,
    results_path: Option<String>,
}

impl HarnessConfig {
    fn from_env() -> Self {
        Self {
            streams: env_or("STREAMS", DEFAULT_STREAMS).max(1),
            stream_length: env_or("STREAM_LENGTH", DEFAULT_STREAM_LENGTH),
            checkpoint: env_or("CHECKPOINT", DEFAULT_CHECKPOINT).max(1),
            results_path: std::env::var("RESULTS_PATH").ok(),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Estimates recorded at every checkpoint of one stream
struct StreamResult {
    estimates: Vec<f64>,
    /// Exact distinct counts, tracked for the first stream only
    exact: Vec<usize>,
}

#[derive(Tabled)]
struct StreamRecord {
    t: usize,
    exact: usize,
    estimate: String,
}

#[derive(Tabled)]
struct StatsRecord {
    t: usize,
    mean: String,
    sigma: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let config = HarnessConfig::from_env();
    info!(
        streams = config.streams,
        stream_length = config.stream_length,
        checkpoint = config.checkpoint,
        "running stream accuracy harness"
    );

    let classic = run_streams(&config, || ClassicEstimator::classic(HASH_SEED, INDEX_BITS))?;
    report(&config, "classic", &classic)?;

    let bias_corrected = run_streams(&config, || {
        BiasCorrectedEstimator::bias_corrected(u64::from(HASH_SEED), INDEX_BITS)
    })?;
    report(&config, "bias_corrected", &bias_corrected)?;

    Ok(())
}

/// Random item of 1 to `MAX_ITEM_LEN` characters from `CHARSET`
fn random_item(rng: &mut StdRng) -> String {
    let len = rng.gen_range(1..=MAX_ITEM_LEN);
    (0..len)
        .map(|_| char::from(CHARSET[rng.gen_range(0..CHARSET.len())]))
        .collect()
}

fn run_stream<H: SketchHasher>(
    config: &HarnessConfig,
    create: fn() -> Result<CardinalityEstimator<H>, SketchError>,
    stream: u64,
) -> Result<StreamResult, SketchError> {
    let mut rng = StdRng::seed_from_u64(STREAM_SEED + stream);
    let mut estimator = create()?;
    let mut distinct = (stream == 0).then(HashSet::new);
    let mut result = StreamResult {
        estimates: Vec::new(),
        exact: Vec::new(),
    };

    for t in 1..=config.stream_length {
        let item = random_item(&mut rng);
        estimator.insert(&item);
        if let Some(distinct) = distinct.as_mut() {
            distinct.insert(item);
        }
        if t % config.checkpoint == 0 {
            result.estimates.push(estimator.estimate());
            if let Some(distinct) = distinct.as_ref() {
                result.exact.push(distinct.len());
            }
        }
    }

    info!(stream, estimate = estimator.estimate(), "stream finished");
    Ok(result)
}

fn run_streams<H: SketchHasher + 'static>(
    config: &HarnessConfig,
    create: fn() -> Result<CardinalityEstimator<H>, SketchError>,
) -> Result<Vec<StreamResult>, Box<dyn Error>> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..config.streams)
            .map(|stream| scope.spawn(move || run_stream(config, create, stream)))
            .collect();
        handles
            .into_iter()
            .map(|handle| -> Result<StreamResult, Box<dyn Error>> {
                match handle.join() {
                    Ok(result) => Ok(result?),
                    Err(_) => Err("stream thread panicked".into()),
                }
            })
            .collect()
    })
}

/// Mean and population standard deviation
fn mean_sigma(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn report(
    config: &HarnessConfig,
    variant: &str,
    results: &[StreamResult],
) -> Result<(), Box<dyn Error>> {
    let Some(first) = results.first() else {
        return Ok(());
    };

    let stream_records: Vec<StreamRecord> = first
        .exact
        .iter()
        .zip(&first.estimates)
        .enumerate()
        .map(|(i, (&exact, &estimate))| StreamRecord {
            t: (i + 1) * config.checkpoint,
            exact,
            estimate: format!("{:.0}", estimate),
        })
        .collect();

    let stats_records: Vec<StatsRecord> = (0..first.estimates.len())
        .map(|i| {
            let estimates: Vec<f64> = results.iter().map(|r| r.estimates[i]).collect();
            let (mean, sigma) = mean_sigma(&estimates);
            StatsRecord {
                t: (i + 1) * config.checkpoint,
                mean: format!("{:.1}", mean),
                sigma: format!("{:.1}", sigma),
            }
        })
        .collect();

    let stream_table = Table::new(stream_records)
        .with(Settings::default().with(Style::markdown()))
        .to_string();
    let stats_table = Table::new(stats_records)
        .with(Settings::default().with(Style::markdown()))
        .to_string();

    println!("## {} stream\n\n{}\n", variant, stream_table);
    println!("## {} stats\n\n{}\n", variant, stats_table);

    if let Some(results_path) = &config.results_path {
        std::fs::write(format!("{}/{}_stream.md", results_path, variant), &stream_table)?;
        std::fs::write(format!("{}/{}_stats.md", results_path, variant), &stats_table)?;
        info!(variant, results_path = %results_path, "wrote result tables");
    }

    Ok(())
}
