//! Application layer: Use cases and services.
//!
//! This module orchestrates the pipeline stages with the artifact store
//! port to implement the two use cases: the offline training run and
//! per-request inference.

mod inference;
mod training;

pub use inference::InferenceService;
pub use training::{TrainConfig, TrainingReport, TrainingService};
