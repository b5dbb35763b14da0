//! Reference collaborators implementing the engine's `ArtifactDescriptorReader`
//! and `VersionRangeResolver` contracts against real Maven repositories:
//! POM parsing, `maven-metadata.xml` parsing, and the transport seam that
//! decouples the two from any specific HTTP library.

pub mod error;
pub mod metadata;
pub mod pom;
pub mod reader;
pub mod repository;
pub mod transport;
pub mod version_resolver;

pub use error::MavenReaderError;
pub use metadata::{parse_metadata, parse_snapshot_metadata, MavenMetadata, SnapshotMetadata};
pub use pom::{parse_pom, ParentRef, Pom, PomDependency, PomExclusion, Relocation};
pub use reader::MavenDescriptorReader;
pub use repository::{coordinate_path, metadata_url, pom_url, snapshot_metadata_url, MAVEN_CENTRAL_URL};
pub use transport::{ArtifactTransport, FixtureTransport, ReqwestTransport, TransportError};
pub use version_resolver::MavenVersionResolver;
