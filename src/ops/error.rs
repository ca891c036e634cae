//! Typed failures surfaced by the ensure pipeline.

use thiserror::Error;

/// Error kinds callers may want to match on.
///
/// Everything else in the pipeline travels as a plain [`anyhow::Error`]
/// with context attached.
#[derive(Debug, Error)]
pub enum EnsureError {
    /// The freshly computed digest disagrees with the one recorded in the
    /// lock.
    #[error("integrity check failed for {name}@{version}")]
    IntegrityMismatch { name: String, version: String },

    /// The linker walked to a package the downloader never produced a
    /// result for.
    #[error("no download result for {name}@{version}")]
    GraphInconsistency { name: String, version: String },

    /// The same package was requested at two incompatible versions.
    #[error("colliding versions for {name}: `{existing}` vs `{requested}`")]
    VersionCollision {
        name: String,
        existing: String,
        requested: String,
    },
}
