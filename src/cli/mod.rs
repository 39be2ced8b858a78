//! JobGuard resampling CLI
//!
//! Loads a labeled CSV, oversamples the minority class and reports the
//! class balance before and after.

use clap::{Parser, Subcommand};
use colored::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::ResampleConfig;
use crate::synthetic::{class_counts, Variant};
use crate::utils::{DataLoader, DataSaver, LabeledData};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "jobguard-resample")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Minority-class oversampling for imbalanced job-posting data")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Oversample the minority class of a labeled CSV file
    Resample {
        /// Input CSV file with a header row
        #[arg(short, long)]
        data: PathBuf,

        /// Target column name
        #[arg(short, long)]
        target: String,

        /// Oversampling variant (see `variants`)
        #[arg(short, long)]
        variant: Option<String>,

        /// Random seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Number of nearest neighbors
        #[arg(short, long)]
        k_neighbors: Option<usize>,

        /// JSON config file; flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output CSV file for the resampled data
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the recognized variant names
    Variants,
}

/// Config file (or environment) first, then explicit flags
pub fn resolve_config(
    config_path: Option<&Path>,
    variant: Option<&str>,
    seed: Option<u64>,
    k_neighbors: Option<usize>,
) -> anyhow::Result<ResampleConfig> {
    let mut config = match config_path {
        Some(path) => ResampleConfig::from_file(path)?,
        None => ResampleConfig::from_env()?,
    };
    if let Some(name) = variant {
        config.variant = name.parse()?;
    }
    if let Some(seed) = seed {
        config.random_state = seed;
    }
    if let Some(k) = k_neighbors {
        config.k_neighbors = k;
    }
    config.validate()?;
    Ok(config)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_resample(
    data_path: &Path,
    target: &str,
    config: &ResampleConfig,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Resample");

    step_run("Loading data");
    let start = Instant::now();
    let data = DataLoader::new().load_labeled(data_path, target)?;
    step_done(&format!(
        "{} rows × {} features in {:?}",
        data.x.nrows(),
        data.x.ncols(),
        start.elapsed()
    ));

    let sampler = config.build()?;

    step_run(&format!("Running {}", sampler.name().cyan()));
    let start = Instant::now();
    let result = sampler.fit_resample(&data.x, &data.y)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    print_counts("Before", &class_counts(&data.y));
    print_counts("After", &class_counts(&result.y));
    println!(
        "  {:<16} {} {}",
        muted("Synthetic"),
        result.n_synthetic.to_string().white().bold(),
        dim(&format!("of {} attempted", result.n_attempted))
    );
    if result.n_dropped() > 0 {
        println!(
            "  {:<16} {}",
            muted("Dropped"),
            result.n_dropped().to_string().yellow()
        );
    }

    if let Some(path) = output {
        step_run(&format!("Saving → {}", path.display()));
        let resampled = LabeledData {
            x: result.x,
            y: result.y,
            feature_names: data.feature_names,
            target: data.target,
        };
        DataSaver::save_csv(&resampled, path)?;
        step_done(&format!("{} rows", resampled.x.nrows()));
    }

    println!();
    Ok(())
}

pub fn cmd_variants() -> anyhow::Result<()> {
    section("Variants");
    let default = ResampleConfig::default().variant;
    for variant in Variant::ALL {
        if variant == default {
            println!("  {} {}", variant.as_str().white(), ok("(default)"));
        } else {
            println!("  {}", variant.as_str().white());
        }
    }
    println!();
    Ok(())
}

fn print_counts(label: &str, counts: &BTreeMap<i64, usize>) {
    let parts: Vec<String> = counts
        .iter()
        .map(|(class, n)| format!("{}: {}", class, n))
        .collect();
    println!("  {:<16} {}", muted(label), parts.join("  ").white());
}
