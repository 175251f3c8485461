//! # Cardiorisk
//!
//! Heart-disease risk classification from tabular clinical features.
//!
//! This crate provides:
//! - An offline training pipeline: column-wise preprocessing,
//!   mutual-information feature selection, synthetic minority
//!   oversampling, and an elastic-net logistic classifier
//! - A persisted, integrity-checked artifact set shared between training
//!   and serving
//! - A minimal HTTP inference service
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (records, predictions)
//! - `pipeline`: Pure feature-engineering and classification math
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (filesystem artifact store)
//! - `application`: Use cases orchestrating pipeline and ports
//! - `server`: HTTP surface

pub mod adapters;
pub mod application;
pub mod dataset;
pub mod domain;
pub mod pipeline;
pub mod ports;
pub mod server;

pub use domain::{HeartRecord, PredictionOutcome, RiskLevel};

/// Result type for cardiorisk operations.
pub type Result<T> = std::result::Result<T, CardioriskError>;

/// Main error type for cardiorisk.
#[derive(Debug, thiserror::Error)]
pub enum CardioriskError {
    #[error("Pipeline operation failed: {0}")]
    Pipeline(#[from] pipeline::PipelineError),

    #[error("Dataset operation failed: {0}")]
    Dataset(#[from] dataset::DatasetError),

    #[error("Artifact store operation failed: {0}")]
    Artifact(#[from] adapters::StoreError),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
