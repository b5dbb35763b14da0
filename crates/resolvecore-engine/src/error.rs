//! The unified error taxonomy for the collector and transformer pipeline.
//!
//! Each variant carries a human string identifying the offending artifact,
//! path, or range plus a [`ResolverErrorKind`] the caller can match on
//! without string-parsing the message.

use miette::Diagnostic;
use thiserror::Error;

use crate::result::CollectResult;

/// Machine-consumable kind tag, independent of the rendered message.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ResolverErrorKind {
    BadCoordinates,
    DescriptorReadFailed,
    RangeResolutionFailed,
    VersionFilterEmpty,
    UnsolvableVersionConflict,
    CycleDetected,
    Cancelled,
}

/// Unified error type for the resolution core.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolverError {
    /// A coordinate string did not match the Maven shorthand grammar.
    #[error("invalid coordinates: {spec}")]
    BadCoordinates { spec: String },

    /// A descriptor read failed; whether this is fatal is gated by the
    /// session's `ArtifactDescriptorPolicy`.
    #[error("failed to read descriptor for {artifact}: {message}")]
    #[diagnostic(help("check the repository list and descriptor policy"))]
    DescriptorReadFailed { artifact: String, message: String },

    /// Expanding a version range against the repository set failed.
    #[error("failed to resolve version range {range} for {artifact}: {message}")]
    RangeResolutionFailed { artifact: String, range: String, message: String },

    /// A `VersionFilter` emptied the candidate list for a ranged dependency.
    #[error("version filter left no candidates for {artifact}")]
    VersionFilterEmpty { artifact: String },

    /// Stage B's pairwise constraint intersection was empty for a conflict
    /// group.
    #[error("unsolvable version conflict in group {group}: {paths}")]
    #[diagnostic(help("widen one of the declared ranges or pin an explicit version"))]
    UnsolvableVersionConflict { group: String, paths: String },

    /// A dependency cycle was detected; non-fatal, recorded and severed.
    #[error("cycle detected: {path}")]
    CycleDetected { path: String },

    /// The caller requested cancellation.
    #[error("collection cancelled")]
    Cancelled,

    /// Wraps a partial [`CollectResult`] when a fatal error aborts
    /// collection or transformation. Preserves the first underlying cause.
    #[error("dependency collection failed: {cause}")]
    Collection {
        partial: Box<CollectResult>,
        #[source]
        cause: Box<ResolverError>,
    },
}

impl ResolverError {
    pub fn kind(&self) -> ResolverErrorKind {
        match self {
            ResolverError::BadCoordinates { .. } => ResolverErrorKind::BadCoordinates,
            ResolverError::DescriptorReadFailed { .. } => ResolverErrorKind::DescriptorReadFailed,
            ResolverError::RangeResolutionFailed { .. } => ResolverErrorKind::RangeResolutionFailed,
            ResolverError::VersionFilterEmpty { .. } => ResolverErrorKind::VersionFilterEmpty,
            ResolverError::UnsolvableVersionConflict { .. } => ResolverErrorKind::UnsolvableVersionConflict,
            ResolverError::CycleDetected { .. } => ResolverErrorKind::CycleDetected,
            ResolverError::Cancelled => ResolverErrorKind::Cancelled,
            ResolverError::Collection { cause, .. } => cause.kind(),
        }
    }
}

pub type ResolverResult<T> = Result<T, ResolverError>;
