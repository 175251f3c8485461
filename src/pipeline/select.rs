//! Mutual-information feature selection.
//!
//! Ranks every preprocessed column against the binary label and freezes
//! the top 8 as a positional index list. Computed once at training time;
//! inference only replays the stored indices.

use ndarray::Array2;

use crate::pipeline::PipelineError;

/// Number of columns retained by the selector.
pub const SELECTED_FEATURE_COUNT: usize = 8;

/// Bin count for continuous columns.
const HISTOGRAM_BINS: usize = 16;

/// Score every column of `matrix` by mutual information with the label.
///
/// Deterministic equal-width binning estimator: columns with at most
/// [`HISTOGRAM_BINS`] distinct values are treated as discrete (one-hot
/// indicators fall out naturally); wider columns are discretized into
/// [`HISTOGRAM_BINS`] equal-width bins over the observed range. Scores are
/// in nats; only the relative ranking matters.
#[must_use]
pub fn rank_mutual_information(matrix: &Array2<f64>, labels: &[u8]) -> Vec<f64> {
    let rows = matrix.nrows();
    if rows == 0 || rows != labels.len() {
        return vec![0.0; matrix.ncols()];
    }

    matrix
        .columns()
        .into_iter()
        .map(|column| {
            let values: Vec<f64> = column.iter().copied().collect();
            column_mutual_information(&values, labels)
        })
        .collect()
}

/// Mutual information between one discretized column and the binary label.
fn column_mutual_information(values: &[f64], labels: &[u8]) -> f64 {
    let bins = discretize(values);
    let bin_count = bins.iter().copied().max().map_or(0, |b| b + 1);
    if bin_count < 2 {
        // A constant column carries no information.
        return 0.0;
    }

    let n = values.len() as f64;
    let mut joint = vec![[0usize; 2]; bin_count];
    let mut label_counts = [0usize; 2];
    for (&bin, &label) in bins.iter().zip(labels) {
        let class = usize::from(label > 0);
        joint[bin][class] += 1;
        label_counts[class] += 1;
    }

    let mut mi = 0.0;
    for row in &joint {
        let bin_total = (row[0] + row[1]) as f64;
        for class in 0..2 {
            let count = row[class] as f64;
            if count == 0.0 {
                continue;
            }
            let p_joint = count / n;
            let p_bin = bin_total / n;
            let p_class = label_counts[class] as f64 / n;
            mi += p_joint * (p_joint / (p_bin * p_class)).ln();
        }
    }
    mi.max(0.0)
}

/// Map column values to dense bin indices.
fn discretize(values: &[f64]) -> Vec<usize> {
    let mut distinct: Vec<f64> = values.to_vec();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();

    if distinct.len() <= HISTOGRAM_BINS {
        // Discrete column: each distinct value is its own bin.
        return values
            .iter()
            .map(|v| {
                distinct
                    .binary_search_by(|probe| probe.total_cmp(v))
                    .unwrap_or(0)
            })
            .collect();
    }

    let min = distinct[0];
    let max = distinct[distinct.len() - 1];
    let width = (max - min) / HISTOGRAM_BINS as f64;
    values
        .iter()
        .map(|v| {
            let bin = ((v - min) / width) as usize;
            bin.min(HISTOGRAM_BINS - 1)
        })
        .collect()
}

/// Pick the `k` highest-scoring column indices.
///
/// Ranking is a stable sort by score descending with original-index
/// ascending as the tie-break; the retained indices are then returned in
/// ascending column order, which is the frozen order applied at inference.
///
/// # Errors
/// Returns an error if fewer than `k` columns are available.
pub fn select_top_k(scores: &[f64], k: usize) -> Result<Vec<usize>, PipelineError> {
    if scores.len() < k {
        return Err(PipelineError::InsufficientColumns {
            requested: k,
            available: scores.len(),
        });
    }

    let mut ranked: Vec<usize> = (0..scores.len()).collect();
    ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));

    let mut selected: Vec<usize> = ranked.into_iter().take(k).collect();
    selected.sort_unstable();
    Ok(selected)
}
