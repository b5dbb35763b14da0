//! [`ArtifactDescriptorReader`] backed by real POM files fetched over an
//! [`ArtifactTransport`].

use std::sync::Arc;

use async_trait::async_trait;
use resolvecore_engine::{ArtifactDescriptor, ArtifactDescriptorReader, DescriptorError, DescriptorRequest, Session};
use resolvecore_model::Artifact;

use crate::pom::{parse_pom, Pom};
use crate::repository::pom_url;
use crate::transport::ArtifactTransport;

/// Parent chains longer than this are treated as a cycle rather than
/// looped forever.
const MAX_PARENT_HOPS: usize = 32;

pub struct MavenDescriptorReader {
    transport: Arc<dyn ArtifactTransport>,
}

impl MavenDescriptorReader {
    pub fn new(transport: Arc<dyn ArtifactTransport>) -> Self {
        Self { transport }
    }

    async fn fetch_pom(&self, repositories: &[resolvecore_engine::RemoteRepository], artifact: &Artifact) -> Result<Option<String>, DescriptorError> {
        for repo in repositories {
            let url = pom_url(&repo.url, &artifact.group_id, &artifact.artifact_id, &artifact.version);
            let bytes = self.transport.fetch(&url).await.map_err(|e| DescriptorError {
                artifact: artifact.to_string(),
                message: e.to_string(),
            })?;
            if let Some(bytes) = bytes {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                return Ok(Some(text));
            }
        }
        Ok(None)
    }

    /// Fetch and fully resolve a POM, including its parent chain.
    async fn resolve_pom(
        &self,
        repositories: &[resolvecore_engine::RemoteRepository],
        artifact: &Artifact,
    ) -> Result<Option<Pom>, DescriptorError> {
        let Some(xml) = self.fetch_pom(repositories, artifact).await? else {
            return Ok(None);
        };
        let mut pom = parse_pom(&xml).map_err(|e| DescriptorError { artifact: artifact.to_string(), message: e.to_string() })?;

        let mut hops = 0;
        while let Some(parent_ref) = pom.parent.clone() {
            hops += 1;
            if hops > MAX_PARENT_HOPS {
                return Err(DescriptorError {
                    artifact: artifact.to_string(),
                    message: format!("parent chain exceeded {MAX_PARENT_HOPS} hops"),
                });
            }
            let parent_artifact = Artifact::new(parent_ref.group_id.clone(), parent_ref.artifact_id.clone(), parent_ref.version.clone());
            let Some(parent_xml) = self.fetch_pom(repositories, &parent_artifact).await? else {
                break;
            };
            let parent_pom = parse_pom(&parent_xml)
                .map_err(|e| DescriptorError { artifact: artifact.to_string(), message: e.to_string() })?;
            pom.apply_parent(&parent_pom);
            pom.parent = parent_pom.parent;
        }

        pom.resolve_properties();
        Ok(Some(pom))
    }
}

#[async_trait]
impl ArtifactDescriptorReader for MavenDescriptorReader {
    async fn read(&self, _session: &Session, request: &DescriptorRequest) -> Result<ArtifactDescriptor, DescriptorError> {
        let Some(pom) = self.resolve_pom(&request.repositories, &request.artifact).await? else {
            return Ok(ArtifactDescriptor::default());
        };

        let relocations = pom.relocated_artifact(&request.artifact).into_iter().collect();

        Ok(ArtifactDescriptor {
            artifact: Some(request.artifact.clone()),
            relocations,
            dependencies: pom.to_dependencies(),
            managed_dependencies: pom.to_managed_dependencies(),
            repositories: Vec::new(),
            aliases: Vec::new(),
        })
    }
}
