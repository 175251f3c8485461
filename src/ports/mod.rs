//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the application services and the artifact persistence backend.

use crate::pipeline::ArtifactSet;

/// Trait for artifact persistence.
///
/// The artifact set is written once by the training pipeline and loaded
/// read-only by every inference-service instance; implementations must
/// persist and restore the set as a unit.
pub trait ArtifactStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a complete artifact set, replacing any previous one.
    ///
    /// # Errors
    /// Returns error if the set cannot be written.
    fn save(&self, artifacts: &ArtifactSet) -> Result<(), Self::Error>;

    /// Load the artifact set, verifying its integrity.
    ///
    /// # Errors
    /// Returns error if an artifact is missing, corrupt, or the pieces do
    /// not belong to the same training run.
    fn load(&self) -> Result<ArtifactSet, Self::Error>;

    /// Check whether a persisted artifact set is present.
    fn exists(&self) -> bool;
}
