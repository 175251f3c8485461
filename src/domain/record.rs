//! Clinical record types for heart-disease risk prediction.
//!
//! Field names follow the Cleveland heart-disease dataset: 13 input
//! columns, 5 numeric and 8 categorical (integer-coded).

use serde::{Deserialize, Deserializer, Serialize};

/// Numeric input columns, in declared order.
///
/// This order is load-bearing: the preprocessing transformer emits numeric
/// outputs in exactly this order, ahead of all one-hot groups.
pub const NUMERIC_FIELDS: [&str; 5] = ["age", "trestbps", "chol", "thalach", "oldpeak"];

/// Categorical input columns, in declared order.
pub const CATEGORICAL_FIELDS: [&str; 8] = [
    "sex", "cp", "fbs", "restecg", "exang", "slope", "ca", "thal",
];

/// Deserialize an `Option<f64>` while still requiring the key to be present.
///
/// A plain `Option` field is treated as optional by serde; routing through
/// `deserialize_with` (without `default`) makes an absent key an error while
/// an explicit `null` remains accepted and is imputed downstream.
fn required_nullable<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer)
}

/// One raw clinical record.
///
/// Every field key must be present in an inference request; a `null` value
/// is allowed and is filled with the training-time imputation statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRecord {
    /// Age in years
    #[serde(deserialize_with = "required_nullable")]
    pub age: Option<f64>,

    /// Sex: 1 = male, 0 = female
    #[serde(deserialize_with = "required_nullable")]
    pub sex: Option<f64>,

    /// Chest pain type (1-4)
    #[serde(deserialize_with = "required_nullable")]
    pub cp: Option<f64>,

    /// Resting blood pressure in mmHg
    #[serde(deserialize_with = "required_nullable")]
    pub trestbps: Option<f64>,

    /// Serum cholesterol in mg/dL
    #[serde(deserialize_with = "required_nullable")]
    pub chol: Option<f64>,

    /// Fasting blood sugar > 120 mg/dL: 1 = yes, 0 = no
    #[serde(deserialize_with = "required_nullable")]
    pub fbs: Option<f64>,

    /// Resting electrocardiographic result (0-2)
    #[serde(deserialize_with = "required_nullable")]
    pub restecg: Option<f64>,

    /// Maximum heart rate achieved
    #[serde(deserialize_with = "required_nullable")]
    pub thalach: Option<f64>,

    /// Exercise-induced angina: 1 = yes, 0 = no
    #[serde(deserialize_with = "required_nullable")]
    pub exang: Option<f64>,

    /// ST depression induced by exercise relative to rest
    #[serde(deserialize_with = "required_nullable")]
    pub oldpeak: Option<f64>,

    /// Slope of the peak exercise ST segment (1-3)
    #[serde(deserialize_with = "required_nullable")]
    pub slope: Option<f64>,

    /// Number of major vessels colored by fluoroscopy (0-3)
    #[serde(deserialize_with = "required_nullable")]
    pub ca: Option<f64>,

    /// Thallium stress result (3 = normal, 6 = fixed defect, 7 = reversible)
    #[serde(deserialize_with = "required_nullable")]
    pub thal: Option<f64>,
}

impl HeartRecord {
    /// Numeric field values in [`NUMERIC_FIELDS`] order.
    #[must_use]
    pub fn numeric_values(&self) -> [Option<f64>; 5] {
        [self.age, self.trestbps, self.chol, self.thalach, self.oldpeak]
    }

    /// Categorical field values in [`CATEGORICAL_FIELDS`] order.
    #[must_use]
    pub fn categorical_values(&self) -> [Option<f64>; 8] {
        [
            self.sex,
            self.cp,
            self.fbs,
            self.restecg,
            self.exang,
            self.slope,
            self.ca,
            self.thal,
        ]
    }

    /// Whether every field holds a value.
    ///
    /// Training drops incomplete rows before fitting; inference imputes
    /// instead.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.numeric_values().iter().all(Option::is_some)
            && self.categorical_values().iter().all(Option::is_some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> HeartRecord {
        HeartRecord {
            age: Some(54.0),
            sex: Some(1.0),
            cp: Some(3.0),
            trestbps: Some(130.0),
            chol: Some(246.0),
            fbs: Some(0.0),
            restecg: Some(1.0),
            thalach: Some(150.0),
            exang: Some(0.0),
            oldpeak: Some(1.4),
            slope: Some(2.0),
            ca: Some(0.0),
            thal: Some(3.0),
        }
    }

    #[test]
    fn test_field_order_matches_declared_constants() {
        let record = sample_record();
        let numeric = record.numeric_values();
        assert_eq!(numeric.len(), NUMERIC_FIELDS.len());
        assert_eq!(numeric[4], Some(1.4)); // oldpeak is last

        let categorical = record.categorical_values();
        assert_eq!(categorical.len(), CATEGORICAL_FIELDS.len());
        assert_eq!(categorical[0], Some(1.0)); // sex is first
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let json = r#"{"age": 54, "sex": 1}"#;
        let result: Result<HeartRecord, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_null_value_is_accepted() {
        let json = r#"{
            "age": 54, "sex": 1, "cp": 3, "trestbps": null, "chol": 246,
            "fbs": 0, "restecg": 1, "thalach": 150, "exang": 0,
            "oldpeak": 1.4, "slope": 2, "ca": 0, "thal": 3
        }"#;
        let record: HeartRecord = serde_json::from_str(json).expect("null should parse");
        assert_eq!(record.trestbps, None);
        assert!(!record.is_complete());
    }

    #[test]
    fn test_complete_record() {
        assert!(sample_record().is_complete());
    }
}
