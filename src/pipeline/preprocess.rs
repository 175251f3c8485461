//! Column-wise preprocessing transformer.
//!
//! Numeric columns are mean-imputed then min-max scaled; categorical
//! columns are most-frequent-imputed then one-hot encoded. All statistics
//! are learned once at fit time and frozen.
//!
//! Output column order is load-bearing: the 5 numeric columns in declared
//! order, then one one-hot group per categorical column in declared order,
//! categories within a group in fit-time first-encounter order. The
//! feature-selection index list is positional against this layout.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::domain::{HeartRecord, CATEGORICAL_FIELDS, NUMERIC_FIELDS};
use crate::pipeline::PipelineError;

/// Fit-time statistics for one numeric column.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NumericColumn {
    /// Imputation value: mean over the training population.
    mean: f64,
    /// Scaling bounds observed at fit time.
    min: f64,
    max: f64,
}

impl NumericColumn {
    /// Impute then min-max scale one value.
    ///
    /// Values outside the training-observed range are not clipped; they
    /// scale outside [0, 1], which is accepted behavior. A constant
    /// training column maps everything to 0.
    fn apply(&self, value: Option<f64>) -> f64 {
        let value = value.unwrap_or(self.mean);
        let range = self.max - self.min;
        if range == 0.0 {
            0.0
        } else {
            (value - self.min) / range
        }
    }
}

/// Fit-time statistics for one categorical column.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CategoricalColumn {
    /// Imputation value: most frequent training category.
    most_frequent: f64,
    /// Category vocabulary in first-encounter order.
    categories: Vec<f64>,
}

impl CategoricalColumn {
    /// Impute then one-hot encode one value into `out`.
    ///
    /// A category never seen at fit time produces an all-zero group.
    fn apply(&self, value: Option<f64>, out: &mut Vec<f64>) {
        let value = value.unwrap_or(self.most_frequent);
        for &category in &self.categories {
            out.push(if category == value { 1.0 } else { 0.0 });
        }
    }
}

/// Column-wise preprocessing transformer.
///
/// Constructed only by [`ColumnTransformer::fit`], so an instance is always
/// in a fitted state and its output width is fixed for its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnTransformer {
    numeric: Vec<NumericColumn>,
    categorical: Vec<CategoricalColumn>,
    output_width: usize,
}

impl ColumnTransformer {
    /// Learn per-column statistics from the training population.
    ///
    /// Missing cells are skipped when computing statistics; a column with
    /// no observed values at all cannot be fitted.
    ///
    /// # Errors
    /// Returns an error on an empty training set or a fully-missing column.
    pub fn fit(records: &[HeartRecord]) -> Result<Self, PipelineError> {
        if records.is_empty() {
            return Err(PipelineError::EmptyTrainingSet);
        }

        let mut numeric = Vec::with_capacity(NUMERIC_FIELDS.len());
        for (position, &field) in NUMERIC_FIELDS.iter().enumerate() {
            let values: Vec<f64> = records
                .iter()
                .filter_map(|r| r.numeric_values()[position])
                .collect();
            if values.is_empty() {
                return Err(PipelineError::DegenerateColumn { field });
            }

            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            numeric.push(NumericColumn { mean, min, max });
        }

        let mut categorical = Vec::with_capacity(CATEGORICAL_FIELDS.len());
        for (position, &field) in CATEGORICAL_FIELDS.iter().enumerate() {
            // Vocabulary in first-encounter order, counting as we go.
            let mut categories: Vec<f64> = Vec::new();
            let mut counts: Vec<usize> = Vec::new();
            for record in records {
                let Some(value) = record.categorical_values()[position] else {
                    continue;
                };
                match categories.iter().position(|&c| c == value) {
                    Some(slot) => counts[slot] += 1,
                    None => {
                        categories.push(value);
                        counts.push(1);
                    }
                }
            }
            if categories.is_empty() {
                return Err(PipelineError::DegenerateColumn { field });
            }

            // Ties resolve to the first-encountered category.
            let best = counts
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
                .map(|(slot, _)| slot)
                .unwrap_or(0);
            categorical.push(CategoricalColumn {
                most_frequent: categories[best],
                categories,
            });
        }

        let output_width =
            numeric.len() + categorical.iter().map(|c| c.categories.len()).sum::<usize>();

        Ok(Self {
            numeric,
            categorical,
            output_width,
        })
    }

    /// The fixed width of the preprocessed feature vector.
    #[must_use]
    pub fn output_width(&self) -> usize {
        self.output_width
    }

    /// Transform one record into a preprocessed feature row.
    #[must_use]
    pub fn transform_record(&self, record: &HeartRecord) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.output_width);
        for (column, value) in self.numeric.iter().zip(record.numeric_values()) {
            out.push(column.apply(value));
        }
        for (column, value) in self.categorical.iter().zip(record.categorical_values()) {
            column.apply(value, &mut out);
        }
        out
    }

    /// Transform a table of records into a preprocessed matrix.
    ///
    /// # Errors
    /// Returns an error if the table is empty.
    pub fn transform_table(&self, records: &[HeartRecord]) -> Result<Array2<f64>, PipelineError> {
        if records.is_empty() {
            return Err(PipelineError::EmptyTrainingSet);
        }
        let mut matrix = Array2::<f64>::zeros((records.len(), self.output_width));
        for (row, record) in records.iter().enumerate() {
            let features = self.transform_record(record);
            for (col, value) in features.into_iter().enumerate() {
                matrix[[row, col]] = value;
            }
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(age: f64, cp: f64) -> HeartRecord {
        HeartRecord {
            age: Some(age),
            sex: Some(1.0),
            cp: Some(cp),
            trestbps: Some(120.0),
            chol: Some(200.0),
            fbs: Some(0.0),
            restecg: Some(0.0),
            thalach: Some(150.0),
            exang: Some(0.0),
            oldpeak: Some(1.0),
            slope: Some(1.0),
            ca: Some(0.0),
            thal: Some(3.0),
        }
    }

    #[test]
    fn test_output_width_counts_categories() {
        let records = vec![record(40.0, 1.0), record(50.0, 2.0), record(60.0, 3.0)];
        let transformer = ColumnTransformer::fit(&records).expect("fit");
        // 5 numeric + cp has 3 categories + 7 single-category columns.
        assert_eq!(transformer.output_width(), 5 + 3 + 7);
    }

    #[test]
    fn test_min_max_scaling() {
        let records = vec![record(40.0, 1.0), record(60.0, 1.0)];
        let transformer = ColumnTransformer::fit(&records).expect("fit");
        let row = transformer.transform_record(&record(50.0, 1.0));
        assert!((row[0] - 0.5).abs() < 1e-12); // age midpoint

        // Out-of-range values scale outside [0, 1] rather than clipping.
        let row = transformer.transform_record(&record(80.0, 1.0));
        assert!((row[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let records = vec![record(40.0, 1.0), record(60.0, 1.0)];
        let transformer = ColumnTransformer::fit(&records).expect("fit");
        let row = transformer.transform_record(&record(40.0, 1.0));
        // trestbps is constant (120.0) in the training data.
        assert_eq!(row[1], 0.0);
    }

    #[test]
    fn test_numeric_null_imputed_with_mean() {
        let records = vec![record(40.0, 1.0), record(60.0, 1.0)];
        let transformer = ColumnTransformer::fit(&records).expect("fit");

        let mut probe = record(0.0, 1.0);
        probe.age = None;
        let row = transformer.transform_record(&probe);
        // Mean age is 50 -> scales to the midpoint.
        assert!((row[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_unseen_category_encodes_all_zero() {
        let records = vec![record(40.0, 1.0), record(60.0, 2.0)];
        let transformer = ColumnTransformer::fit(&records).expect("fit");

        let seen = transformer.transform_record(&record(40.0, 1.0));
        let unseen = transformer.transform_record(&record(40.0, 9.0));

        // cp group sits right after sex's single category.
        let cp_group = 6..8;
        assert_eq!(&seen[cp_group.clone()], &[1.0, 0.0]);
        assert_eq!(&unseen[cp_group], &[0.0, 0.0]);
    }

    #[test]
    fn test_categorical_null_imputed_with_most_frequent() {
        let records = vec![record(40.0, 2.0), record(50.0, 2.0), record(60.0, 1.0)];
        let transformer = ColumnTransformer::fit(&records).expect("fit");

        let mut probe = record(40.0, 0.0);
        probe.cp = None;
        let row = transformer.transform_record(&probe);
        // cp vocabulary is [2.0, 1.0] in encounter order; most frequent is 2.0.
        let cp_group = 6..8;
        assert_eq!(&row[cp_group], &[1.0, 0.0]);
    }

    #[test]
    fn test_transform_is_deterministic() {
        let records = vec![record(40.0, 1.0), record(55.0, 2.0), record(60.0, 3.0)];
        let transformer = ColumnTransformer::fit(&records).expect("fit");
        let probe = record(47.0, 2.0);
        assert_eq!(
            transformer.transform_record(&probe),
            transformer.transform_record(&probe)
        );
    }

    #[test]
    fn test_empty_training_set_rejected() {
        assert!(matches!(
            ColumnTransformer::fit(&[]),
            Err(PipelineError::EmptyTrainingSet)
        ));
    }
}
