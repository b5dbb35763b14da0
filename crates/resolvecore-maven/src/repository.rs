//! Maven repository URL layout.
//!
//! Trimmed from the teacher's `kargo-maven::repository::MavenRepository`:
//! no credential fields here, since `resolvecore_engine::RemoteRepository`
//! already carries `auth`/`proxy` as opaque passthrough the core never
//! interprets. This module only computes the standard layout paths.

pub const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2";

/// Standard Maven layout path: `org.group:artifact:1.0` becomes
/// `org/group/artifact/1.0`.
pub fn coordinate_path(group_id: &str, artifact_id: &str, version: &str) -> String {
    format!("{}/{}/{}", group_id.replace('.', "/"), artifact_id, version)
}

pub fn pom_url(base_url: &str, group_id: &str, artifact_id: &str, version: &str) -> String {
    let filename = format!("{artifact_id}-{version}.pom");
    format!("{}/{}/{}", base_url.trim_end_matches('/'), coordinate_path(group_id, artifact_id, version), filename)
}

pub fn metadata_url(base_url: &str, group_id: &str, artifact_id: &str) -> String {
    format!("{}/{}/{}/maven-metadata.xml", base_url.trim_end_matches('/'), group_id.replace('.', "/"), artifact_id)
}

pub fn snapshot_metadata_url(base_url: &str, group_id: &str, artifact_id: &str, version: &str) -> String {
    format!(
        "{}/{}/maven-metadata.xml",
        base_url.trim_end_matches('/'),
        coordinate_path(group_id, artifact_id, version)
    )
}
