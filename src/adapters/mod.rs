//! Adapters layer: Concrete implementations of ports.
//!
//! - `fs_store`: JSON artifact persistence on the local filesystem

pub mod fs_store;

pub use fs_store::{FsArtifactStore, StoreError};
