//! End-to-end scenarios run against `resolve()` with in-memory fixture
//! collaborators — no `resolvecore-maven`, so this exercises the engine
//! crate's public contracts directly rather than any Maven-specific
//! parsing.

use std::collections::BTreeMap;

use async_trait::async_trait;
use resolvecore_engine::{
    resolve, ArtifactDescriptor, ArtifactDescriptorReader, CollectRequest, DependencyManager, DependencySelector,
    DependencyTraverser, DescriptorError, DescriptorRequest, RangeResolutionError, RemoteRepository, Session,
    VersionFilter, VersionRangeRequest, VersionRangeResolver, VersionRangeResult,
};
use resolvecore_model::{Artifact, Dependency, Exclusion, VersionConstraint};

/// A fixed table of artifact -> descriptor, keyed by `group:artifact:version`.
#[derive(Default)]
struct FixtureReader {
    descriptors: BTreeMap<String, ArtifactDescriptor>,
}

fn key(artifact: &Artifact) -> String {
    format!("{}:{}:{}", artifact.group_id, artifact.artifact_id, artifact.version)
}

impl FixtureReader {
    fn with(mut self, artifact: Artifact, deps: Vec<Dependency>) -> Self {
        self.descriptors.insert(
            key(&artifact),
            ArtifactDescriptor { artifact: Some(artifact), dependencies: deps, ..Default::default() },
        );
        self
    }

    fn with_relocation(mut self, artifact: Artifact, relocated: Artifact) -> Self {
        self.descriptors.insert(
            key(&artifact),
            ArtifactDescriptor { artifact: Some(artifact), relocations: vec![relocated], ..Default::default() },
        );
        self
    }
}

#[async_trait]
impl ArtifactDescriptorReader for FixtureReader {
    async fn read(&self, _session: &Session, request: &DescriptorRequest) -> Result<ArtifactDescriptor, DescriptorError> {
        Ok(self.descriptors.get(&key(&request.artifact)).cloned().unwrap_or_default())
    }
}

/// A fixed table of `group:artifact` -> advertised versions, for range
/// requests. Returns an empty result for anything not registered.
#[derive(Default)]
struct FixtureRangeResolver {
    metadata: BTreeMap<String, Vec<String>>,
}

fn ga_key(artifact: &Artifact) -> String {
    format!("{}:{}", artifact.group_id, artifact.artifact_id)
}

impl FixtureRangeResolver {
    fn with(mut self, group_id: &str, artifact_id: &str, versions: &[&str]) -> Self {
        self.metadata.insert(
            format!("{group_id}:{artifact_id}"),
            versions.iter().map(|v| v.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl VersionRangeResolver for FixtureRangeResolver {
    async fn resolve(&self, _session: &Session, request: &VersionRangeRequest) -> Result<VersionRangeResult, RangeResolutionError> {
        let constraint = VersionConstraint::parse(&request.artifact.version);
        let mut versions: Vec<String> = self
            .metadata
            .get(&ga_key(&request.artifact))
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|v| constraint.contains(&resolvecore_model::MavenVersion::parse(v)))
            .collect();
        versions.sort_by(|a, b| resolvecore_model::MavenVersion::parse(a).cmp(&resolvecore_model::MavenVersion::parse(b)));
        let repositories = versions.iter().map(|_| "central".to_string()).collect();
        Ok(VersionRangeResult { versions, version_constraint: constraint, repositories })
    }
}

fn session() -> Session {
    Session::new(DependencySelector::default_scopes(), DependencyTraverser::FatArtifact, DependencyManager::empty(), VersionFilter::Snapshot)
}

fn repos() -> Vec<RemoteRepository> {
    vec![RemoteRepository::new("central", "https://repo.example.com")]
}

fn request_for(root: Artifact, direct: Vec<Dependency>) -> CollectRequest {
    CollectRequest {
        root: Some(Dependency::new(root)),
        root_artifact: None,
        direct_deps: direct,
        managed_deps: Vec::new(),
        repositories: repos(),
        context: String::new(),
    }
}

fn find_child<'a>(node: &'a resolvecore_engine::DependencyNode, artifact_id: &str) -> &'a resolvecore_engine::DependencyNode {
    node.children.iter().find(|c| c.artifact.artifact_id == artifact_id).unwrap_or_else(|| panic!("no child named {artifact_id}"))
}

/// S1 — diamond with version mediation: `app -> {lib-a, lib-b}`,
/// `lib-a -> util:2`, `lib-b -> util:1`. Nearest-wins puts both `util`
/// occurrences at the same depth, so the tie is broken by declaration
/// order: whichever of `lib-a`/`lib-b` is declared first determines which
/// `util` version survives.
#[tokio::test]
async fn s1_diamond_mediation_honors_declaration_order() {
    let reader = FixtureReader::default()
        .with(Artifact::new("g", "app", "1.0"), vec![])
        .with(Artifact::new("g", "lib-a", "1.0"), vec![Dependency::new(Artifact::new("g", "util", "2.0"))])
        .with(Artifact::new("g", "lib-b", "1.0"), vec![Dependency::new(Artifact::new("g", "util", "1.0"))])
        .with(Artifact::new("g", "util", "1.0"), vec![])
        .with(Artifact::new("g", "util", "2.0"), vec![]);
    let range_resolver = FixtureRangeResolver::default();

    let direct_a_first = vec![
        Dependency::new(Artifact::new("g", "lib-a", "1.0")),
        Dependency::new(Artifact::new("g", "lib-b", "1.0")),
    ];
    let request = request_for(Artifact::new("g", "app", "1.0"), direct_a_first);
    let result = resolve(&session(), &reader, &range_resolver, request).await.unwrap();
    let selected = find_child(find_child(&result.root_node, "lib-a"), "util").version.clone();
    assert_eq!(selected, Some("2.0".to_string()), "lib-a declared first, so its util:2.0 should win");

    let direct_b_first = vec![
        Dependency::new(Artifact::new("g", "lib-b", "1.0")),
        Dependency::new(Artifact::new("g", "lib-a", "1.0")),
    ];
    let request = request_for(Artifact::new("g", "app", "1.0"), direct_b_first);
    let result = resolve(&session(), &reader, &range_resolver, request).await.unwrap();
    let selected = find_child(find_child(&result.root_node, "lib-b"), "util").version.clone();
    assert_eq!(selected, Some("1.0".to_string()), "lib-b declared first, so its util:1.0 should win");
}

/// S2 — range intersection: two occurrences of `x` constrained by
/// overlapping ranges must resolve to a single version satisfying both.
#[tokio::test]
async fn s2_range_intersection_picks_a_mutually_satisfying_version() {
    let reader = FixtureReader::default()
        .with(Artifact::new("g", "app", "1.0"), vec![])
        .with(Artifact::new("g", "y", "1.0"), vec![Dependency::new(Artifact::new("g", "x", "[1.5,3.0)"))]);
    let range_resolver = FixtureRangeResolver::default().with("g", "x", &["1.0", "1.2", "1.6", "1.8", "2.1"]);

    let direct = vec![
        Dependency::new(Artifact::new("g", "x", "[1.0,2.0)")),
        Dependency::new(Artifact::new("g", "y", "1.0")),
    ];
    let request = request_for(Artifact::new("g", "app", "1.0"), direct);
    let result = resolve(&session(), &reader, &range_resolver, request).await.unwrap();

    let x_direct = find_child(&result.root_node, "x").version.clone();
    let x_via_y = find_child(find_child(&result.root_node, "y"), "x").version.clone();
    assert_eq!(x_direct, x_via_y, "both occurrences of x must converge on the same version");
    assert_eq!(x_direct, Some("1.8".to_string()));
}

/// S3 — exclusion: `app -> lib` (excluding `ex:*`), `lib -> ex`, `ex -> k`.
/// Both `ex` and its own transitive dependency `k` must be pruned, leaving
/// `app -> lib` as the only surviving edge.
#[tokio::test]
async fn s3_exclusion_prunes_the_excluded_artifact_and_its_subtree() {
    let reader = FixtureReader::default()
        .with(Artifact::new("g", "app", "1.0"), vec![])
        .with(Artifact::new("g", "lib", "1.0"), vec![Dependency::new(Artifact::new("ex", "ex", "1.0"))])
        .with(Artifact::new("ex", "ex", "1.0"), vec![Dependency::new(Artifact::new("g", "k", "1.0"))])
        .with(Artifact::new("g", "k", "1.0"), vec![]);

    let excluded_lib = Dependency::new(Artifact::new("g", "lib", "1.0")).with_exclusions([Exclusion::new("ex", "")]);
    let request = request_for(Artifact::new("g", "app", "1.0"), vec![excluded_lib]);
    let result = resolve(&session(), &reader, &FixtureRangeResolver::default(), request).await.unwrap();

    let lib_node = find_child(&result.root_node, "lib");
    assert!(lib_node.children.is_empty(), "ex (and transitively k) must be pruned, leaving app -> lib only");
}

/// S4 — relocation: a dependency on the old coordinates transparently
/// resolves to the relocation target's descriptor.
#[tokio::test]
async fn s4_relocated_artifact_resolves_through_to_its_new_coordinates() {
    let reader = FixtureReader::default()
        .with(Artifact::new("g", "app", "1.0"), vec![])
        .with_relocation(Artifact::new("g", "old-name", "1.0"), Artifact::new("g", "new-name", "1.0"))
        .with(Artifact::new("g", "new-name", "1.0"), vec![]);

    let request = request_for(Artifact::new("g", "app", "1.0"), vec![Dependency::new(Artifact::new("g", "old-name", "1.0"))]);
    let result = resolve(&session(), &reader, &FixtureRangeResolver::default(), request).await.unwrap();

    let node = &result.root_node.children[0];
    assert_eq!(node.artifact.artifact_id, "new-name");
    assert_eq!(node.relocations.len(), 1);
    assert_eq!(node.relocations[0].artifact_id, "old-name");
}

/// S5 — snapshot base version survives collection unchanged; exercised at
/// the model level in `artifact.rs`, and here end-to-end to confirm the
/// collector doesn't normalize it away.
#[tokio::test]
async fn s5_timestamped_snapshot_artifact_keeps_its_full_version_string() {
    let snapshot_version = "1.0-20240102.030405-7";
    let reader = FixtureReader::default()
        .with(Artifact::new("g", "app", "1.0"), vec![])
        .with(Artifact::new("g", "lib", snapshot_version), vec![]);

    let request = request_for(Artifact::new("g", "app", "1.0"), vec![Dependency::new(Artifact::new("g", "lib", snapshot_version))]);
    let result = resolve(&session(), &reader, &FixtureRangeResolver::default(), request).await.unwrap();

    let node = find_child(&result.root_node, "lib");
    assert_eq!(node.version.as_deref(), Some(snapshot_version));
    assert_eq!(node.artifact.base_version(), "1.0-SNAPSHOT");
}

/// S6 — cycle `a -> b -> a` is detected and severed rather than looping
/// forever; the collector records it instead of recursing unboundedly.
#[tokio::test]
async fn s6_direct_cycle_is_detected_and_severed() {
    let reader = FixtureReader::default()
        .with(Artifact::new("g", "app", "1.0"), vec![])
        .with(Artifact::new("g", "a", "1.0"), vec![Dependency::new(Artifact::new("g", "b", "1.0"))])
        .with(Artifact::new("g", "b", "1.0"), vec![Dependency::new(Artifact::new("g", "a", "1.0"))]);

    let request = request_for(Artifact::new("g", "app", "1.0"), vec![Dependency::new(Artifact::new("g", "a", "1.0"))]);
    let result = resolve(&session(), &reader, &FixtureRangeResolver::default(), request).await.unwrap();

    assert!(!result.cycles.is_empty(), "the a -> b -> a cycle must be recorded");
    let a_node = find_child(&result.root_node, "a");
    let b_node = find_child(a_node, "b");
    // The repeated `a` is never materialized as a node at all (spec
    // §4.3.2.c: a cycle back-edge is recorded, not expanded), so `b` ends
    // up with no children rather than a severed leaf.
    assert!(b_node.children.is_empty(), "the cycle must be recorded without expanding b -> a again");
}

/// Boundary behavior: an empty request (no root dependency or artifact)
/// yields an empty, labelled result rather than erroring.
#[tokio::test]
async fn empty_request_yields_an_empty_root_without_error() {
    let reader = FixtureReader::default();
    let request = CollectRequest::default();
    let result = resolve(&session(), &reader, &FixtureRangeResolver::default(), request).await.unwrap();
    assert!(result.root_node.children.is_empty());
    assert!(result.exceptions.is_empty());
}
