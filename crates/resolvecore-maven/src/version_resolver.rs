//! [`VersionRangeResolver`] backed by `maven-metadata.xml` fetched over an
//! [`ArtifactTransport`].

use std::sync::Arc;

use async_trait::async_trait;
use resolvecore_engine::{RangeResolutionError, Session, VersionRangeRequest, VersionRangeResolver, VersionRangeResult};
use resolvecore_model::{MavenVersion, VersionConstraint};

use crate::metadata::parse_metadata;
use crate::repository::metadata_url;
use crate::transport::ArtifactTransport;

pub struct MavenVersionResolver {
    transport: Arc<dyn ArtifactTransport>,
}

impl MavenVersionResolver {
    pub fn new(transport: Arc<dyn ArtifactTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl VersionRangeResolver for MavenVersionResolver {
    async fn resolve(&self, _session: &Session, request: &VersionRangeRequest) -> Result<VersionRangeResult, RangeResolutionError> {
        let constraint = VersionConstraint::parse(&request.artifact.version);
        let mut versions = Vec::new();
        let mut repositories = Vec::new();

        for repo in &request.repositories {
            let url = metadata_url(&repo.url, &request.artifact.group_id, &request.artifact.artifact_id);
            let bytes = self
                .transport
                .fetch(&url)
                .await
                .map_err(|e| RangeResolutionError { artifact: request.artifact.to_string(), message: e.to_string() })?;
            let Some(bytes) = bytes else { continue };
            let text = String::from_utf8_lossy(&bytes).into_owned();
            let metadata = parse_metadata(&text)
                .map_err(|e| RangeResolutionError { artifact: request.artifact.to_string(), message: e.to_string() })?;
            for version in metadata.versions {
                if constraint.contains(&MavenVersion::parse(&version)) {
                    repositories.push(repo.id.clone());
                    versions.push(version);
                }
            }
        }

        versions.sort_by(|a, b| MavenVersion::parse(a).cmp(&MavenVersion::parse(b)));

        Ok(VersionRangeResult { versions, version_constraint: constraint, repositories })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FixtureTransport;
    use resolvecore_engine::{DependencyManager, DependencySelector, DependencyTraverser, VersionFilter};
    use resolvecore_model::Artifact;

    fn session() -> Session {
        Session::new(
            DependencySelector::default_scopes(),
            DependencyTraverser::FatArtifact,
            DependencyManager::default(),
            VersionFilter::Snapshot,
        )
    }

    #[tokio::test]
    async fn range_request_filters_metadata_versions_to_the_range() {
        let url = metadata_url("https://repo.example.com", "org.example", "lib");
        let xml = r#"<?xml version="1.0"?>
<metadata>
  <groupId>org.example</groupId>
  <artifactId>lib</artifactId>
  <versioning>
    <versions>
      <version>1.0</version>
      <version>1.5</version>
      <version>2.0</version>
      <version>2.5</version>
    </versions>
  </versioning>
</metadata>"#;
        let transport = Arc::new(FixtureTransport::new().with_file(url, xml));
        let resolver = MavenVersionResolver::new(transport);
        let request = VersionRangeRequest {
            artifact: Artifact::new("org.example", "lib", "[1.0,2.0)"),
            repositories: vec![resolvecore_engine::RemoteRepository::new("central", "https://repo.example.com")],
        };
        let result = resolver.resolve(&session(), &request).await.unwrap();
        assert_eq!(result.versions, vec!["1.0", "1.5"]);
    }

    #[tokio::test]
    async fn missing_metadata_yields_an_empty_result() {
        let transport = Arc::new(FixtureTransport::new());
        let resolver = MavenVersionResolver::new(transport);
        let request = VersionRangeRequest {
            artifact: Artifact::new("org.example", "missing", "[1.0,2.0)"),
            repositories: vec![resolvecore_engine::RemoteRepository::new("central", "https://repo.example.com")],
        };
        let result = resolver.resolve(&session(), &request).await.unwrap();
        assert!(result.versions.is_empty());
    }
}
