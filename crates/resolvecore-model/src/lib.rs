//! Coordinate model for dependency resolution.
//!
//! This crate has no I/O and no async dependency: it defines the value
//! types (`Artifact`, `Dependency`, `Exclusion`, `MavenVersion`,
//! `VersionRange`, `VersionConstraint`) shared by the descriptor-reader
//! contract, the policy quartet, and the collector in `resolvecore-engine`.

pub mod artifact;
pub mod dependency;
pub mod version;

pub use artifact::{Artifact, ArtifactTypeDefaults, BadCoordinates, ConflictKey};
pub use dependency::{Dependency, Exclusion};
pub use version::{MavenVersion, VersionConstraint, VersionRange};
