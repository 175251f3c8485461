//! Training pipeline entry point.
//!
//! Usage: `train <dataset.csv> [output-dir]`
//!
//! Reads the heart-disease CSV, runs the full pipeline, and writes the
//! artifact set. The output directory falls back to `CARDIORISK_MODEL_DIR`
//! or `model/` beside the executable, matching where the serving binary
//! looks for it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardiorisk::adapters::FsArtifactStore;
use cardiorisk::application::{TrainConfig, TrainingService};
use cardiorisk::dataset::Dataset;

/// Environment variable overriding the split/oversampling seed.
const SEED_ENV: &str = "CARDIORISK_SEED";

/// Environment variable overriding the holdout share.
const HOLDOUT_ENV: &str = "CARDIORISK_HOLDOUT_RATIO";

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(dataset_path) = args.next().map(PathBuf::from) else {
        bail!("usage: train <dataset.csv> [output-dir]");
    };

    let store = match args.next() {
        Some(dir) => FsArtifactStore::new(dir),
        None => FsArtifactStore::resolve_default()?,
    };

    let config = load_train_config()?;

    println!("Loading dataset from {}", dataset_path.display());
    let dataset = Dataset::load_csv(&dataset_path)
        .with_context(|| format!("failed to load {}", dataset_path.display()))?;
    let (negatives, positives) = dataset.class_counts();
    println!(
        "Data: {} rows ({} absent, {} present)",
        dataset.len(),
        negatives,
        positives,
    );

    let service = TrainingService::new(Arc::new(store.clone()), config);
    let report = service.run(&dataset)?;

    println!("{:-<72}", "");
    println!(
        "Train rows: {} -> {} after oversampling",
        report.train_rows, report.resampled_rows,
    );
    println!("Selected columns: {:?}", report.selected_indices);
    if !report.converged {
        println!("WARNING: solver did not converge within the iteration cap");
    }
    if let Some(metrics) = &report.holdout {
        println!(
            "Holdout: {} | majority baseline {:.4}",
            metrics,
            metrics.majority_baseline(),
        );
    }
    println!("Artifacts saved to: {}", store.dir().display());

    Ok(())
}

/// Build the training configuration from environment overrides.
fn load_train_config() -> Result<TrainConfig> {
    let mut config = TrainConfig::default();
    if let Ok(seed) = std::env::var(SEED_ENV) {
        config.seed = seed
            .parse()
            .with_context(|| format!("{SEED_ENV} must be an integer, got '{seed}'"))?;
    }
    if let Ok(ratio) = std::env::var(HOLDOUT_ENV) {
        let parsed: f64 = ratio
            .parse()
            .with_context(|| format!("{HOLDOUT_ENV} must be a number, got '{ratio}'"))?;
        if !(0.0..1.0).contains(&parsed) {
            bail!("{HOLDOUT_ENV} must be in [0, 1), got {parsed}");
        }
        config.holdout_ratio = parsed;
    }
    Ok(config)
}
