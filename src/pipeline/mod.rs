//! Pipeline layer: the feature-engineering and classification math.
//!
//! Pure computation over in-memory matrices; no IO. The stages mirror the
//! training flow: column preprocessing, mutual-information feature
//! selection, minority oversampling, and the logistic classifier.

mod balance;
mod metrics;
mod model;
mod preprocess;
mod select;

pub use balance::Smote;
pub use metrics::{classification_metrics, ClassificationMetrics};
pub use model::{LogisticModel, SolverOptions};
pub use preprocess::ColumnTransformer;
pub use select::{rank_mutual_information, select_top_k, SELECTED_FEATURE_COUNT};

use serde::{Deserialize, Serialize};

/// Error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Column '{field}' has no observed values to fit on")]
    DegenerateColumn { field: &'static str },

    #[error("Expected {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Cannot select {requested} features from {available} columns")]
    InsufficientColumns { requested: usize, available: usize },

    #[error(
        "Minority class has {minority} samples but oversampling requires at least {required}"
    )]
    InsufficientMinoritySamples { minority: usize, required: usize },

    #[error("Selected index {index} is out of bounds for width {width}")]
    IndexOutOfBounds { index: usize, width: usize },
}

/// The three co-versioned training outputs.
///
/// Index positions and feature widths are not self-describing, so the set
/// must always be persisted and loaded as a unit; [`ArtifactSet::validate`]
/// cross-checks the pieces against each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactSet {
    /// Fitted preprocessing transformer.
    pub transformer: ColumnTransformer,

    /// Fitted classifier over the selected feature space.
    pub classifier: LogisticModel,

    /// Frozen positional index list into the transformer's output.
    pub selected_indices: Vec<usize>,
}

impl ArtifactSet {
    /// Verify the three artifacts are mutually consistent.
    ///
    /// # Errors
    /// Returns an error if the index list has the wrong size, duplicates,
    /// or out-of-bounds entries, or if the classifier width does not match
    /// the selected feature count.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let width = self.transformer.output_width();

        if self.selected_indices.len() != SELECTED_FEATURE_COUNT {
            return Err(PipelineError::DimensionMismatch {
                expected: SELECTED_FEATURE_COUNT,
                got: self.selected_indices.len(),
            });
        }
        for &index in &self.selected_indices {
            if index >= width {
                return Err(PipelineError::IndexOutOfBounds { index, width });
            }
        }
        let mut seen = self.selected_indices.clone();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() != self.selected_indices.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.selected_indices.len(),
                got: seen.len(),
            });
        }

        if self.classifier.num_features() != self.selected_indices.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.selected_indices.len(),
                got: self.classifier.num_features(),
            });
        }

        Ok(())
    }

    /// Apply the frozen positional selection to one preprocessed row.
    ///
    /// # Errors
    /// Returns an error if an index exceeds the row width.
    pub fn select_row(&self, preprocessed: &[f64]) -> Result<Vec<f64>, PipelineError> {
        self.selected_indices
            .iter()
            .map(|&index| {
                preprocessed
                    .get(index)
                    .copied()
                    .ok_or(PipelineError::IndexOutOfBounds {
                        index,
                        width: preprocessed.len(),
                    })
            })
            .collect()
    }
}
