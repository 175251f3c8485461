//! Training service: the one-shot offline pipeline run.
//!
//! Orchestrates: stratified split -> fit transformer -> mutual-information
//! selection -> minority oversampling -> classifier fit -> holdout
//! evaluation -> artifact persistence. Single-pass and non-resumable; any
//! error aborts the run.

use std::sync::Arc;

use crate::adapters::StoreError;
use crate::dataset::{stratified_split, Dataset};
use crate::pipeline::{
    classification_metrics, rank_mutual_information, select_top_k, ArtifactSet,
    ClassificationMetrics, ColumnTransformer, LogisticModel, Smote, SolverOptions,
    SELECTED_FEATURE_COUNT,
};
use crate::ports::ArtifactStore;
use crate::CardioriskError;

/// Training run configuration.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Share of rows held out for evaluation; 0 disables the holdout.
    pub holdout_ratio: f64,
    /// Seed for every stochastic stage (split, oversampling).
    pub seed: u64,
    /// Neighbor count for the minority oversampler.
    pub smote_neighbors: usize,
    /// Classifier solver hyperparameters.
    pub solver: SolverOptions,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            holdout_ratio: 0.2,
            seed: 42,
            smote_neighbors: Smote::DEFAULT_K_NEIGHBORS,
            solver: SolverOptions::default(),
        }
    }
}

/// Summary of a completed training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Rows used for fitting after the holdout split.
    pub train_rows: usize,
    /// Train-split class counts as `(negatives, positives)`.
    pub class_counts: (usize, usize),
    /// Row count after oversampling.
    pub resampled_rows: usize,
    /// The frozen feature-selection index list.
    pub selected_indices: Vec<usize>,
    /// Whether the solver converged within its iteration cap.
    pub converged: bool,
    /// Holdout metrics; `None` when the holdout is disabled.
    pub holdout: Option<ClassificationMetrics>,
}

/// Service for running the offline training pipeline.
pub struct TrainingService<S>
where
    S: ArtifactStore,
{
    store: Arc<S>,
    config: TrainConfig,
}

impl<S> TrainingService<S>
where
    S: ArtifactStore,
    S::Error: Into<StoreError>,
{
    /// Create a training service writing to the given store.
    pub fn new(store: Arc<S>, config: TrainConfig) -> Self {
        Self { store, config }
    }

    /// Run the full pipeline on a loaded dataset and persist the artifacts.
    ///
    /// # Errors
    /// Returns error if any stage fails; nothing is persisted in that case.
    pub fn run(&self, dataset: &Dataset) -> Result<TrainingReport, CardioriskError> {
        tracing::info!(
            rows = dataset.len(),
            holdout_ratio = self.config.holdout_ratio,
            seed = self.config.seed,
            "Starting training run"
        );

        let split = stratified_split(dataset, self.config.holdout_ratio, self.config.seed);
        let train = &split.train;
        let class_counts = train.class_counts();
        tracing::info!(
            train = train.len(),
            holdout = split.holdout.len(),
            negatives = class_counts.0,
            positives = class_counts.1,
            "Step 1: Split dataset"
        );

        tracing::debug!("Step 2: Fitting preprocessing transformer...");
        let transformer = ColumnTransformer::fit(&train.records)?;
        let matrix = transformer.transform_table(&train.records)?;
        tracing::info!(width = transformer.output_width(), "Step 2: Fitted transformer");

        tracing::debug!("Step 3: Ranking columns by mutual information...");
        let scores = rank_mutual_information(&matrix, &train.labels);
        let selected_indices = select_top_k(&scores, SELECTED_FEATURE_COUNT)?;
        tracing::info!(indices = ?selected_indices, "Step 3: Froze selected columns");

        let selected = matrix.select(ndarray::Axis(1), &selected_indices);

        tracing::debug!("Step 4: Balancing classes...");
        let smote = Smote::new(self.config.smote_neighbors, self.config.seed);
        let (resampled, resampled_labels) = smote.resample(&selected, &train.labels)?;
        tracing::info!(
            rows = resampled.nrows(),
            "Step 4: Balanced classes by synthetic oversampling"
        );

        tracing::debug!("Step 5: Fitting classifier...");
        let classifier = LogisticModel::fit(&resampled, &resampled_labels, &self.config.solver)?;
        tracing::info!(
            converged = classifier.converged(),
            iterations = classifier.iterations(),
            "Step 5: Fitted classifier"
        );

        let artifacts = ArtifactSet {
            transformer,
            classifier,
            selected_indices,
        };

        let holdout = if split.holdout.is_empty() {
            None
        } else {
            let metrics = evaluate(&artifacts, &split.holdout)?;
            tracing::info!(%metrics, baseline = metrics.majority_baseline(), "Step 6: Holdout evaluation");
            Some(metrics)
        };

        self.store
            .save(&artifacts)
            .map_err(|e| CardioriskError::Artifact(e.into()))?;

        Ok(TrainingReport {
            train_rows: train.len(),
            class_counts,
            resampled_rows: resampled_labels.len(),
            selected_indices: artifacts.selected_indices,
            converged: artifacts.classifier.converged(),
            holdout,
        })
    }
}

/// Score a fitted artifact set against a labeled holdout.
fn evaluate(
    artifacts: &ArtifactSet,
    holdout: &Dataset,
) -> Result<ClassificationMetrics, CardioriskError> {
    let mut predictions = Vec::with_capacity(holdout.len());
    for record in &holdout.records {
        let preprocessed = artifacts.transformer.transform_record(record);
        let features = artifacts.select_row(&preprocessed)?;
        predictions.push(artifacts.classifier.predict(&features)?);
    }
    Ok(classification_metrics(&predictions, &holdout.labels))
}
