//! Training-data ingestion.
//!
//! Reads the heart-disease table: a headerless CSV with the 13 feature
//! columns followed by an integer severity target, `?` marking missing
//! cells. The multi-class target is binarized (`target > 0` means disease
//! present) and rows with any missing value are dropped before fitting.

use std::path::Path;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

use crate::domain::HeartRecord;

/// Error type for dataset operations.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row {row}: cannot parse '{value}' in column '{column}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Dataset contains no usable rows")]
    Empty,
}

/// A labeled training table.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<HeartRecord>,
    pub labels: Vec<u8>,
}

/// One raw CSV row; columns are positional (the file has no header).
#[derive(Debug, Deserialize)]
struct CsvRow {
    age: String,
    sex: String,
    cp: String,
    trestbps: String,
    chol: String,
    fbs: String,
    restecg: String,
    thalach: String,
    exang: String,
    oldpeak: String,
    slope: String,
    ca: String,
    thal: String,
    target: String,
}

/// Parse one cell; `?` and empty cells are missing values.
fn parse_cell(
    raw: &str,
    row: usize,
    column: &'static str,
) -> Result<Option<f64>, DatasetError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "?" {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| DatasetError::InvalidValue {
            row,
            column,
            value: trimmed.to_string(),
        })
}

impl Dataset {
    /// Load a labeled table from a CSV file.
    ///
    /// Rows with any missing cell (including the target) are dropped, as
    /// the reference pipeline does; the drop count is logged.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, a cell is unparseable,
    /// or no complete row remains.
    pub fn load_csv(path: &Path) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut records = Vec::new();
        let mut labels = Vec::new();
        let mut dropped = 0usize;

        for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row?;
            let record = HeartRecord {
                age: parse_cell(&row.age, index, "age")?,
                sex: parse_cell(&row.sex, index, "sex")?,
                cp: parse_cell(&row.cp, index, "cp")?,
                trestbps: parse_cell(&row.trestbps, index, "trestbps")?,
                chol: parse_cell(&row.chol, index, "chol")?,
                fbs: parse_cell(&row.fbs, index, "fbs")?,
                restecg: parse_cell(&row.restecg, index, "restecg")?,
                thalach: parse_cell(&row.thalach, index, "thalach")?,
                exang: parse_cell(&row.exang, index, "exang")?,
                oldpeak: parse_cell(&row.oldpeak, index, "oldpeak")?,
                slope: parse_cell(&row.slope, index, "slope")?,
                ca: parse_cell(&row.ca, index, "ca")?,
                thal: parse_cell(&row.thal, index, "thal")?,
            };
            let target = parse_cell(&row.target, index, "target")?;

            match target {
                Some(severity) if record.is_complete() => {
                    records.push(record);
                    labels.push(u8::from(severity > 0.0));
                }
                _ => dropped += 1,
            }
        }

        if records.is_empty() {
            return Err(DatasetError::Empty);
        }
        tracing::info!(
            rows = records.len(),
            dropped,
            "Loaded training table"
        );
        Ok(Self { records, labels })
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Per-class row counts as `(negatives, positives)`.
    #[must_use]
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.labels.iter().filter(|&&l| l == 1).count();
        (self.labels.len() - positives, positives)
    }
}

/// A stratified train/holdout split.
#[derive(Debug, Clone)]
pub struct DataSplit {
    pub train: Dataset,
    pub holdout: Dataset,
}

/// Split a dataset preserving class ratios.
///
/// Each class is shuffled with a seeded RNG and the first `holdout_ratio`
/// share goes to the holdout. A zero ratio yields an empty holdout.
#[must_use]
pub fn stratified_split(dataset: &Dataset, holdout_ratio: f64, seed: u64) -> DataSplit {
    let mut class0: Vec<usize> = Vec::new();
    let mut class1: Vec<usize> = Vec::new();
    for (index, &label) in dataset.labels.iter().enumerate() {
        if label == 0 {
            class0.push(index);
        } else {
            class1.push(index);
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    class0.shuffle(&mut rng);
    class1.shuffle(&mut rng);

    let holdout0 = (class0.len() as f64 * holdout_ratio).round() as usize;
    let holdout1 = (class1.len() as f64 * holdout_ratio).round() as usize;

    let gather = |indices: &[usize]| Dataset {
        records: indices.iter().map(|&i| dataset.records[i].clone()).collect(),
        labels: indices.iter().map(|&i| dataset.labels[i]).collect(),
    };

    let holdout_indices: Vec<usize> = class0[..holdout0]
        .iter()
        .chain(class1[..holdout1].iter())
        .copied()
        .collect();
    let train_indices: Vec<usize> = class0[holdout0..]
        .iter()
        .chain(class1[holdout1..].iter())
        .copied()
        .collect();

    DataSplit {
        train: gather(&train_indices),
        holdout: gather(&holdout_indices),
    }
}
