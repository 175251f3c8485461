//! Prediction result types.
//!
//! Represents the output of the heart-disease classifier.

use serde::{Deserialize, Serialize};

/// Coarse risk band derived from the predicted probability.
///
/// Used for logging and operator-facing summaries; the HTTP surface
/// returns the raw prediction and probability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Low risk of heart disease
    Low,
    /// Moderate risk, monitoring recommended
    Moderate,
    /// High risk, intervention recommended
    High,
}

impl RiskLevel {
    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - No significant indicators",
            Self::Moderate => "Moderate risk - Follow-up recommended",
            Self::High => "High risk - Immediate consultation advised",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Result of one classifier prediction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PredictionOutcome {
    /// Binary prediction (0 = no disease, 1 = disease present)
    pub prediction: u8,

    /// Probability of the positive (disease-present) class, in [0, 1]
    pub probability: f64,
}

impl PredictionOutcome {
    /// Create an outcome from the positive-class probability.
    ///
    /// The prediction thresholds at 0.5 by convention.
    #[must_use]
    pub fn new(probability: f64) -> Self {
        let prediction = u8::from(probability >= 0.5);
        Self {
            prediction,
            probability,
        }
    }

    /// Get the risk band for this probability.
    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        if self.probability < 0.3 {
            RiskLevel::Low
        } else if self.probability < 0.7 {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }
}
