//! Synthetic minority oversampling.
//!
//! Training-only: equalizes class counts before the classifier fit by
//! interpolating new minority points between real minority samples and
//! their nearest minority neighbors. Never runs at inference.

use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::pipeline::PipelineError;

/// Synthetic minority oversampler.
#[derive(Debug, Clone)]
pub struct Smote {
    k_neighbors: usize,
    seed: u64,
}

impl Smote {
    /// Default neighbor count used by the training pipeline.
    pub const DEFAULT_K_NEIGHBORS: usize = 5;

    /// Create an oversampler with an explicit seed for reproducibility.
    #[must_use]
    pub fn new(k_neighbors: usize, seed: u64) -> Self {
        Self { k_neighbors, seed }
    }

    /// Resample `(x, y)` until both classes have equal counts.
    ///
    /// Synthetic rows are appended after the originals; original rows are
    /// never modified or reordered. Already-balanced input is returned
    /// unchanged. Deterministic for a fixed seed.
    ///
    /// # Errors
    /// Returns an error if rows and labels disagree in length, or if the
    /// minority class is smaller than `k_neighbors + 1` (the interpolation
    /// needs that many real points).
    pub fn resample(
        &self,
        x: &Array2<f64>,
        y: &[u8],
    ) -> Result<(Array2<f64>, Vec<u8>), PipelineError> {
        if x.nrows() != y.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: x.nrows(),
                got: y.len(),
            });
        }
        if y.is_empty() {
            return Err(PipelineError::EmptyTrainingSet);
        }

        let positives = y.iter().filter(|&&label| label > 0).count();
        let negatives = y.len() - positives;
        if positives == negatives {
            return Ok((x.clone(), y.to_vec()));
        }

        let minority_label: u8 = u8::from(positives < negatives);
        let minority: Vec<usize> = y
            .iter()
            .enumerate()
            .filter(|(_, &label)| (label > 0) == (minority_label == 1))
            .map(|(row, _)| row)
            .collect();
        let deficit = positives.abs_diff(negatives);

        if minority.len() <= self.k_neighbors {
            return Err(PipelineError::InsufficientMinoritySamples {
                minority: minority.len(),
                required: self.k_neighbors + 1,
            });
        }

        let neighbors = nearest_neighbors(x, &minority, self.k_neighbors);

        let width = x.ncols();
        let mut resampled = Array2::<f64>::zeros((x.nrows() + deficit, width));
        resampled.slice_mut(ndarray::s![..x.nrows(), ..]).assign(x);

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        for synth in 0..deficit {
            let base_slot = rng.gen_range(0..minority.len());
            let base_row = minority[base_slot];
            let neighbor_row = neighbors[base_slot][rng.gen_range(0..self.k_neighbors)];
            let gap: f64 = rng.gen();

            for col in 0..width {
                let base = x[[base_row, col]];
                let delta = x[[neighbor_row, col]] - base;
                resampled[[x.nrows() + synth, col]] = base + gap * delta;
            }
        }

        let mut labels = y.to_vec();
        labels.extend(std::iter::repeat(minority_label).take(deficit));
        Ok((resampled, labels))
    }
}

/// For each minority row, the `k` nearest other minority rows by squared
/// Euclidean distance, with row order breaking distance ties.
fn nearest_neighbors(x: &Array2<f64>, minority: &[usize], k: usize) -> Vec<Vec<usize>> {
    minority
        .iter()
        .map(|&row| {
            let mut candidates: Vec<(f64, usize)> = minority
                .iter()
                .filter(|&&other| other != row)
                .map(|&other| (squared_distance(x, row, other), other))
                .collect();
            candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            candidates.truncate(k);
            candidates.into_iter().map(|(_, other)| other).collect()
        })
        .collect()
}

fn squared_distance(x: &Array2<f64>, a: usize, b: usize) -> f64 {
    (0..x.ncols())
        .map(|col| {
            let d = x[[a, col]] - x[[b, col]];
            d * d
        })
        .sum()
}
