//! Filesystem artifact store.
//!
//! Persists the artifact set as three JSON files plus a manifest under one
//! directory:
//!
//! - `transformer.json` - fitted preprocessing transformer
//! - `classifier.json` - fitted logistic classifier
//! - `selected_indices.json` - frozen feature-selection index list
//! - `manifest.json` - run id, timestamp, and SHA-256 per file
//!
//! The manifest binds the set to one training run: on load every checksum
//! is verified and the pieces are cross-checked structurally, so a
//! mixed-run or tampered set fails loudly instead of silently producing
//! wrong predictions.
//!
//! The default location resolves relative to the running executable, not
//! the process working directory, so a deployed service finds its models
//! no matter where it is launched from. `CARDIORISK_MODEL_DIR` overrides.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::pipeline::{ArtifactSet, ColumnTransformer, LogisticModel, PipelineError};
use crate::ports::ArtifactStore;

const TRANSFORMER_FILE: &str = "transformer.json";
const CLASSIFIER_FILE: &str = "classifier.json";
const INDICES_FILE: &str = "selected_indices.json";
const MANIFEST_FILE: &str = "manifest.json";

/// Manifest format version.
const MANIFEST_VERSION: u32 = 1;

/// Environment variable overriding the artifact directory.
pub const MODEL_DIR_ENV: &str = "CARDIORISK_MODEL_DIR";

/// Error type for artifact store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Artifact '{file}' is missing from {}", dir.display())]
    MissingArtifact { file: &'static str, dir: PathBuf },

    #[error("Artifact '{file}' does not match the manifest checksum")]
    ChecksumMismatch { file: &'static str },

    #[error("Artifact set is inconsistent: {0}")]
    Inconsistent(#[from] PipelineError),

    #[error("Cannot resolve the executable-relative model directory: {0}")]
    NoDefaultDir(String),
}

/// Manifest binding the artifact files of one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArtifactManifest {
    version: u32,
    run_id: String,
    created_at: DateTime<Utc>,
    /// File name -> SHA-256 hex digest.
    files: BTreeMap<String, String>,
}

/// Filesystem-backed [`ArtifactStore`].
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    /// Create a store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Resolve the artifact directory: `CARDIORISK_MODEL_DIR` if set,
    /// otherwise `model/` beside the running executable.
    ///
    /// # Errors
    /// Returns error if the executable path cannot be determined.
    pub fn resolve_default() -> Result<Self, StoreError> {
        if let Ok(dir) = std::env::var(MODEL_DIR_ENV) {
            return Ok(Self::new(dir));
        }
        let exe = std::env::current_exe()
            .map_err(|e| StoreError::NoDefaultDir(e.to_string()))?;
        let dir = exe
            .parent()
            .ok_or_else(|| StoreError::NoDefaultDir("executable has no parent".into()))?
            .join("model");
        Ok(Self::new(dir))
    }

    /// Directory this store reads and writes.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_verified(
        &self,
        file: &'static str,
        manifest: &ArtifactManifest,
    ) -> Result<Vec<u8>, StoreError> {
        let path = self.dir.join(file);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::MissingArtifact {
                    file,
                    dir: self.dir.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let expected = manifest
            .files
            .get(file)
            .ok_or(StoreError::ChecksumMismatch { file })?;
        if sha256_hex(&bytes) != *expected {
            return Err(StoreError::ChecksumMismatch { file });
        }
        Ok(bytes)
    }
}

impl ArtifactStore for FsArtifactStore {
    type Error = StoreError;

    fn save(&self, artifacts: &ArtifactSet) -> Result<(), StoreError> {
        artifacts.validate()?;
        std::fs::create_dir_all(&self.dir)?;

        let mut files = BTreeMap::new();
        let parts: [(&str, Vec<u8>); 3] = [
            (
                TRANSFORMER_FILE,
                serde_json::to_vec_pretty(&artifacts.transformer)?,
            ),
            (
                CLASSIFIER_FILE,
                serde_json::to_vec_pretty(&artifacts.classifier)?,
            ),
            (
                INDICES_FILE,
                serde_json::to_vec_pretty(&artifacts.selected_indices)?,
            ),
        ];
        for (file, bytes) in &parts {
            files.insert((*file).to_string(), sha256_hex(bytes));
            std::fs::write(self.dir.join(file), bytes)?;
        }

        let manifest = ArtifactManifest {
            version: MANIFEST_VERSION,
            run_id: new_run_id(),
            created_at: Utc::now(),
            files,
        };
        std::fs::write(
            self.dir.join(MANIFEST_FILE),
            serde_json::to_vec_pretty(&manifest)?,
        )?;

        tracing::info!(
            dir = %self.dir.display(),
            run_id = %manifest.run_id,
            "Saved artifact set"
        );
        Ok(())
    }

    fn load(&self) -> Result<ArtifactSet, StoreError> {
        let manifest_path = self.dir.join(MANIFEST_FILE);
        let manifest_bytes = match std::fs::read(&manifest_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::MissingArtifact {
                    file: MANIFEST_FILE,
                    dir: self.dir.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let manifest: ArtifactManifest = serde_json::from_slice(&manifest_bytes)?;

        let transformer: ColumnTransformer =
            serde_json::from_slice(&self.read_verified(TRANSFORMER_FILE, &manifest)?)?;
        let classifier: LogisticModel =
            serde_json::from_slice(&self.read_verified(CLASSIFIER_FILE, &manifest)?)?;
        let selected_indices: Vec<usize> =
            serde_json::from_slice(&self.read_verified(INDICES_FILE, &manifest)?)?;

        let artifacts = ArtifactSet {
            transformer,
            classifier,
            selected_indices,
        };
        artifacts.validate()?;

        tracing::info!(
            dir = %self.dir.display(),
            run_id = %manifest.run_id,
            width = artifacts.transformer.output_width(),
            "Loaded artifact set"
        );
        Ok(artifacts)
    }

    fn exists(&self) -> bool {
        self.dir.join(MANIFEST_FILE).is_file()
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Generate a random run id in UUID v4 format.
///
/// Uses ChaCha20 seeded from OS entropy so ids are unique across hosts
/// without coordination.
fn new_run_id() -> String {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HeartRecord;
    use crate::pipeline::{
        rank_mutual_information, select_top_k, LogisticModel, SolverOptions,
        SELECTED_FEATURE_COUNT,
    };

    fn record(age: f64, cp: f64, thal: f64) -> HeartRecord {
        HeartRecord {
            age: Some(age),
            sex: Some(if age > 50.0 { 1.0 } else { 0.0 }),
            cp: Some(cp),
            trestbps: Some(110.0 + age),
            chol: Some(180.0 + 2.0 * age),
            fbs: Some(if cp > 2.0 { 1.0 } else { 0.0 }),
            restecg: Some(if cp > 1.0 { 1.0 } else { 0.0 }),
            thalach: Some(200.0 - age),
            exang: Some(if thal > 3.0 { 1.0 } else { 0.0 }),
            oldpeak: Some(cp / 2.0),
            slope: Some(if age > 55.0 { 2.0 } else { 1.0 }),
            ca: Some((cp - 1.0).max(0.0)),
            thal: Some(thal),
        }
    }

    fn fitted_artifacts() -> ArtifactSet {
        fitted_artifacts_with(&SolverOptions::default())
    }

    fn fitted_artifacts_with(options: &SolverOptions) -> ArtifactSet {
        let mut records = Vec::new();
        let mut labels = Vec::new();
        for i in 0..24 {
            let diseased = i % 2 == 1;
            let age = 40.0 + i as f64;
            let cp = if diseased { 4.0 } else { 1.0 + (i % 2) as f64 };
            let thal = if diseased { 7.0 } else { 3.0 };
            records.push(record(age, cp, thal));
            labels.push(u8::from(diseased));
        }

        let transformer = ColumnTransformer::fit(&records).expect("fit transformer");
        let matrix = transformer.transform_table(&records).expect("transform");
        let scores = rank_mutual_information(&matrix, &labels);
        let selected_indices =
            select_top_k(&scores, SELECTED_FEATURE_COUNT).expect("select");

        let selected: Vec<f64> = matrix
            .rows()
            .into_iter()
            .flat_map(|row| {
                selected_indices
                    .iter()
                    .map(|&i| row[i])
                    .collect::<Vec<f64>>()
            })
            .collect();
        let selected = ndarray::Array2::from_shape_vec(
            (records.len(), SELECTED_FEATURE_COUNT),
            selected,
        )
        .expect("shape");

        let classifier = LogisticModel::fit(&selected, &labels, options).expect("fit");

        ArtifactSet {
            transformer,
            classifier,
            selected_indices,
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path());
        let artifacts = fitted_artifacts();

        assert!(!store.exists());
        store.save(&artifacts).expect("save");
        assert!(store.exists());

        let loaded = store.load().expect("load");
        assert_eq!(loaded.selected_indices, artifacts.selected_indices);
        assert_eq!(
            loaded.transformer.output_width(),
            artifacts.transformer.output_width()
        );
    }

    #[test]
    fn test_missing_manifest_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path());
        let err = store.load().unwrap_err();
        assert!(matches!(
            err,
            StoreError::MissingArtifact {
                file: "manifest.json",
                ..
            }
        ));
    }

    #[test]
    fn test_tampered_artifact_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path());
        store.save(&fitted_artifacts()).expect("save");

        // Flip the classifier file without updating the manifest.
        let path = dir.path().join(CLASSIFIER_FILE);
        let mut text = std::fs::read_to_string(&path).expect("read");
        text.push(' ');
        std::fs::write(&path, text).expect("write");

        let err = store.load().unwrap_err();
        assert!(matches!(
            err,
            StoreError::ChecksumMismatch {
                file: "classifier.json"
            }
        ));
    }

    #[test]
    fn test_mixed_run_rejected() {
        // Artifacts written by two runs must not load as one set.
        let dir_a = tempfile::tempdir().expect("tempdir");
        let dir_b = tempfile::tempdir().expect("tempdir");
        let store_a = FsArtifactStore::new(dir_a.path());
        let store_b = FsArtifactStore::new(dir_b.path());

        store_a.save(&fitted_artifacts()).expect("save a");
        let other_run = fitted_artifacts_with(&SolverOptions {
            penalty: 4.0,
            ..SolverOptions::default()
        });
        store_b.save(&other_run).expect("save b");

        // Splice b's classifier into a's directory.
        std::fs::copy(
            dir_b.path().join(CLASSIFIER_FILE),
            dir_a.path().join(CLASSIFIER_FILE),
        )
        .expect("copy");

        assert!(store_a.load().is_err());
    }

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(new_run_id(), new_run_id());
        assert_eq!(new_run_id().len(), 36);
    }
}
