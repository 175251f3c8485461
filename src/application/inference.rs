//! Inference service: per-record prediction over a frozen artifact set.
//!
//! The service is the immutable context shared by every request: the
//! artifact set is loaded once at construction and never mutated, so
//! concurrent requests can share one instance without locking.

use crate::domain::{HeartRecord, PredictionOutcome};
use crate::pipeline::ArtifactSet;
use crate::ports::ArtifactStore;
use crate::CardioriskError;

/// Service for running single-record inference.
pub struct InferenceService {
    artifacts: ArtifactSet,
}

impl InferenceService {
    /// Create a service around an already-validated artifact set.
    ///
    /// # Errors
    /// Returns error if the set fails its consistency checks.
    pub fn new(artifacts: ArtifactSet) -> Result<Self, CardioriskError> {
        artifacts.validate()?;
        Ok(Self { artifacts })
    }

    /// Load the artifact set from a store and build the service.
    ///
    /// # Errors
    /// Returns error if the artifacts are missing, corrupt, or mismatched.
    pub fn from_store<S>(store: &S) -> Result<Self, CardioriskError>
    where
        S: ArtifactStore,
        S::Error: Into<crate::adapters::StoreError>,
    {
        let artifacts = store.load().map_err(|e| CardioriskError::Artifact(e.into()))?;
        Self::new(artifacts)
    }

    /// Width of the preprocessed feature space.
    #[must_use]
    pub fn feature_width(&self) -> usize {
        self.artifacts.transformer.output_width()
    }

    /// Run one record through the full prediction chain.
    ///
    /// transform -> frozen positional selection -> classify. Logs the
    /// outcome with its coarse risk band; raw clinical values are never
    /// logged.
    ///
    /// # Errors
    /// Returns error if any stage of the chain fails.
    pub fn predict(&self, record: &HeartRecord) -> Result<PredictionOutcome, CardioriskError> {
        tracing::debug!("Step 1: Preprocessing record...");
        let preprocessed = self.artifacts.transformer.transform_record(record);

        tracing::debug!("Step 2: Applying frozen column selection...");
        let features = self.artifacts.select_row(&preprocessed)?;

        tracing::debug!("Step 3: Scoring...");
        let probability = self.artifacts.classifier.predict_probability(&features)?;
        let outcome = PredictionOutcome::new(probability);

        tracing::info!(
            prediction = outcome.prediction,
            probability = format!("{:.4}", outcome.probability),
            risk = %outcome.risk_level(),
            "Inference complete"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{
        rank_mutual_information, select_top_k, ColumnTransformer, LogisticModel, SolverOptions,
        SELECTED_FEATURE_COUNT,
    };

    fn record(diseased: bool, wiggle: f64) -> HeartRecord {
        HeartRecord {
            age: Some(50.0 + wiggle + if diseased { 10.0 } else { 0.0 }),
            sex: Some(1.0),
            cp: Some(if diseased { 4.0 } else { 1.0 }),
            trestbps: Some(125.0 + wiggle),
            chol: Some(220.0 + wiggle),
            fbs: Some(0.0),
            restecg: Some(if diseased { 2.0 } else { 0.0 }),
            thalach: Some(if diseased { 110.0 } else { 170.0 } + wiggle),
            exang: Some(if diseased { 1.0 } else { 0.0 }),
            oldpeak: Some(if diseased { 2.8 } else { 0.2 }),
            slope: Some(if diseased { 2.0 } else { 1.0 }),
            ca: Some(if diseased { 3.0 } else { 0.0 }),
            thal: Some(if diseased { 7.0 } else { 3.0 }),
        }
    }

    fn fitted_service() -> InferenceService {
        let mut records = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let diseased = i % 2 == 0;
            records.push(record(diseased, (i / 2) as f64));
            labels.push(u8::from(diseased));
        }

        let transformer = ColumnTransformer::fit(&records).expect("fit transformer");
        let matrix = transformer.transform_table(&records).expect("transform");
        let scores = rank_mutual_information(&matrix, &labels);
        let selected_indices = select_top_k(&scores, SELECTED_FEATURE_COUNT).expect("select");
        let selected = matrix.select(ndarray::Axis(1), &selected_indices);
        let classifier =
            LogisticModel::fit(&selected, &labels, &SolverOptions::default()).expect("fit");

        InferenceService::new(ArtifactSet {
            transformer,
            classifier,
            selected_indices,
        })
        .expect("service")
    }

    #[test]
    fn test_predict_outcome_is_consistent() {
        let service = fitted_service();
        for probe in [record(true, 2.5), record(false, 2.5)] {
            let outcome = service.predict(&probe).expect("predict");
            assert!((0.0..=1.0).contains(&outcome.probability));
            assert_eq!(outcome.prediction, u8::from(outcome.probability >= 0.5));
        }
    }

    #[test]
    fn test_separates_probe_records() {
        let service = fitted_service();
        let sick = service.predict(&record(true, 1.0)).expect("predict");
        let healthy = service.predict(&record(false, 1.0)).expect("predict");
        assert!(sick.probability > healthy.probability);
    }

    #[test]
    fn test_unseen_category_still_predicts() {
        let service = fitted_service();
        let mut probe = record(false, 1.0);
        probe.thal = Some(99.0); // never seen at fit time
        let outcome = service.predict(&probe).expect("predict");
        assert!((0.0..=1.0).contains(&outcome.probability));
    }

    #[test]
    fn test_null_field_is_imputed() {
        let service = fitted_service();
        let mut probe = record(true, 1.0);
        probe.chol = None;
        assert!(service.predict(&probe).is_ok());
    }

    #[test]
    fn test_inconsistent_artifacts_rejected() {
        let service = fitted_service();
        let mut artifacts = service.artifacts.clone();
        artifacts.selected_indices.pop();
        assert!(InferenceService::new(artifacts).is_err());
    }
}
