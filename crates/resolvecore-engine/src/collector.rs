//! C5: depth-first recursive dependency collection.
//!
//! Unlike the teacher's `kargo-resolver::resolver::resolve`, which walks a
//! flat BFS queue, this is genuine recursion: the spec requires an
//! ancestor path per node for cycle detection (§4.3.2.c), which a flat
//! queue cannot express without reconstructing the path for every entry.
//! `Box::pin` boxes the `async fn` recursion the compiler cannot otherwise
//! size. The teacher's batching idea survives at the fan-out point: all of
//! a node's accepted children are read concurrently, bounded by a
//! `Semaphore` sized from `Session::max_concurrent_fetches`, exactly as
//! `kargo-resolver::resolver::MAX_CONCURRENT_FETCHES` bounds sibling POM
//! fetches — but the final child order always matches declaration order,
//! never completion order.

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::future::join_all;
use resolvecore_model::{Artifact, ConflictKey, Dependency, VersionConstraint};
use tokio::sync::Semaphore;

use crate::cache::{fingerprint, ArtifactKey};
use crate::contracts::{
    ArtifactDescriptor, ArtifactDescriptorPolicy, ArtifactDescriptorReader, DescriptorRequest, Session,
    VersionRangeRequest, VersionRangeResolver,
};
use crate::error::ResolverError;
use crate::node::{Cycle, DependencyNode, ManagedBits};
use crate::policy::{DependencyManager, DependencySelector, DependencyTraverser, DerivationContext, VersionFilter};
use crate::result::{CollectRequest, CollectResult};

/// One expanded node plus everything accumulated while expanding it and
/// its descendants. Parents merge children's `exceptions`/`cycles` into
/// their own rather than relying on any shared mutable state, so sibling
/// expansion can run concurrently with a plain `join_all`.
struct NodeOutcome {
    /// `None` when the dependency was a cycle back-edge: spec §4.3.2.c
    /// chooses not to materialize that node at all ("do not create, to
    /// keep dirty graph finite"), so the cycle is recorded in `cycles`
    /// but contributes nothing to the parent's child list.
    node: Option<DependencyNode>,
    exceptions: Vec<ResolverError>,
    cycles: Vec<Cycle>,
}

struct Policies {
    selector: DependencySelector,
    traverser: DependencyTraverser,
    manager: DependencyManager,
    version_filter: VersionFilter,
}

/// What management changed about a dependency before its node was built,
/// per spec §4.3 step 2a's "record premanaged_* for changed attributes".
#[derive(Default, Clone)]
struct ManagedMeta {
    bits: ManagedBits,
    premanaged_version: Option<String>,
    premanaged_scope: Option<String>,
}

const MAX_RELOCATION_HOPS: usize = 8;

#[tracing::instrument(skip(session, reader, range_resolver, request))]
pub async fn collect_dependencies(
    session: &Session,
    reader: &dyn ArtifactDescriptorReader,
    range_resolver: &dyn VersionRangeResolver,
    request: CollectRequest,
) -> Result<CollectResult, ResolverError> {
    let root_artifact = match (&request.root, &request.root_artifact) {
        (Some(dep), _) => dep.artifact.clone(),
        (None, Some(artifact)) => artifact.clone(),
        (None, None) => {
            return Ok(CollectResult::new(DependencyNode::root_label(Artifact::new("", "", ""))));
        }
    };

    let mut root_node = match &request.root {
        Some(dep) => DependencyNode::from_dependency(dep.clone()),
        None => DependencyNode::root_label(root_artifact.clone()),
    };

    let mut exceptions = Vec::new();

    let descriptor = read_descriptor(session, reader, &root_artifact, &request.repositories).await;
    let descriptor = match descriptor {
        Ok(d) => d,
        Err(err) => {
            if matches!(session.descriptor_policy, ArtifactDescriptorPolicy::Strict) {
                return Err(ResolverError::Collection {
                    partial: Box::new(CollectResult::new(root_node)),
                    cause: Box::new(err),
                });
            }
            exceptions.push(err);
            ArtifactDescriptor::default()
        }
    };

    // Merge: request.direct_deps over descriptor.dependencies by conflict key.
    let merged_deps = merge_by_key(&descriptor.dependencies, &request.direct_deps);

    // Union repositories: descriptor first, request appended, dedup by id.
    let mut seen_repo_ids = BTreeSet::new();
    let mut repositories = Vec::new();
    for repo in descriptor.repositories.iter().chain(request.repositories.iter()) {
        if seen_repo_ids.insert(repo.id.clone()) {
            repositories.push(repo.clone());
        }
    }
    root_node.repositories = repositories.iter().map(|r| r.id.clone()).collect();

    let mut managed_pool = request.managed_deps.clone();
    managed_pool.extend(descriptor.managed_dependencies.clone());

    let policies = Policies {
        selector: session.selector.clone(),
        traverser: session.traverser.clone(),
        manager: session.manager.derive_child(&DerivationContext {
            artifact: &root_artifact,
            dependency: request.root.as_ref(),
            managed_dependencies: &managed_pool,
        }),
        version_filter: session.version_filter,
    };

    let outcome = expand_children(
        session,
        reader,
        range_resolver,
        &root_artifact,
        merged_deps,
        1,
        Arc::new(vec![root_artifact.clone()]),
        &repositories.iter().map(|r| r.id.clone()).collect::<Vec<_>>(),
        policies,
    )
    .await;

    match outcome {
        Ok((children, child_exceptions, cycles)) => {
            *root_node.children_mut() = children;
            exceptions.extend(child_exceptions);
            let mut result = CollectResult::new(root_node);
            result.exceptions = exceptions;
            result.cycles = cycles;
            Ok(result)
        }
        Err(fatal) => {
            let mut result = CollectResult::new(root_node);
            result.exceptions = exceptions;
            Err(ResolverError::Collection { partial: Box::new(result), cause: Box::new(fatal) })
        }
    }
}

/// Resolve and recurse into one accepted, to-be-expanded dependency,
/// returning its fully expanded subtree.
fn collect_node<'a>(
    session: &'a Session,
    reader: &'a dyn ArtifactDescriptorReader,
    range_resolver: &'a dyn VersionRangeResolver,
    dependency: Dependency,
    managed: ManagedMeta,
    depth: usize,
    ancestors: Arc<Vec<Artifact>>,
    repo_ids: Vec<String>,
    policies: Policies,
) -> Pin<Box<dyn Future<Output = Result<NodeOutcome, ResolverError>> + Send + 'a>> {
    Box::pin(async move {
        if session.is_cancelled() {
            return Err(ResolverError::Cancelled);
        }
        if let Some(max_depth) = session.max_depth() {
            if depth > max_depth {
                return Ok(NodeOutcome {
                    node: Some(DependencyNode::from_dependency(dependency)),
                    exceptions: Vec::new(),
                    cycles: Vec::new(),
                });
            }
        }

        // Spec §4.3.2.c: a dependency whose (group, artifact, classifier,
        // extension) repeats an ancestor's is a cycle back-edge. It is
        // recorded and never materialized as a node, so the dirty graph
        // stays finite and no terminal leaf needs pruning later.
        if ancestors.iter().any(|a| a.conflict_key() == dependency.artifact.conflict_key()) {
            let mut path: Vec<Artifact> = (*ancestors).clone();
            path.push(dependency.artifact.clone());
            return Ok(NodeOutcome { node: None, exceptions: Vec::new(), cycles: vec![Cycle { path }] });
        }

        // Fingerprint on the requested (pre-resolution) coordinates: two
        // nodes with the same artifact/version-spec, repositories, and
        // policy identities always expand into the same sub-tree. A hit
        // returns a logical clone — only this top-level node is fresh,
        // its children are reused by `Arc` reference (spec §4.5).
        let fp = fingerprint(
            &ArtifactKey { conflict_key: dependency.artifact.conflict_key(), version: dependency.artifact.version.clone() },
            &repo_ids,
            &[],
            &policies.selector,
            &policies.traverser,
            &policies.manager,
            &policies.version_filter,
        );
        if let Some(mut cached) = session.cache.get_subtree(&fp) {
            tracing::debug!(artifact = %dependency.artifact, "subtree cache hit");
            // Only the top-level node is fresh: its parent-relative
            // attributes (the dependency that named it, management deltas)
            // belong to this call site, not the cached occurrence's.
            cached.dependency = Some(dependency);
            cached.managed_bits = managed.bits;
            cached.premanaged_version = managed.premanaged_version;
            cached.premanaged_scope = managed.premanaged_scope;
            return Ok(NodeOutcome { node: Some(cached), exceptions: Vec::new(), cycles: Vec::new() });
        }

        let mut exceptions = Vec::new();
        let constraint = VersionConstraint::parse(&dependency.artifact.version);

        let candidates: Vec<String> = if constraint.is_range() {
            let request = VersionRangeRequest {
                artifact: dependency.artifact.clone(),
                repositories: Vec::new(),
            };
            match range_resolver.resolve(session, &request).await {
                Ok(result) => {
                    let mut versions = result.versions;
                    policies.version_filter.filter_versions(&dependency, &mut versions);
                    if versions.is_empty() {
                        return Err(ResolverError::VersionFilterEmpty {
                            artifact: dependency.artifact.to_string(),
                        });
                    }
                    versions.reverse(); // highest-first
                    versions
                }
                Err(err) => {
                    exceptions.push(ResolverError::RangeResolutionFailed {
                        artifact: dependency.artifact.to_string(),
                        range: dependency.artifact.version.clone(),
                        message: err.message,
                    });
                    return Ok(NodeOutcome {
                        node: Some(DependencyNode::from_dependency(dependency)),
                        exceptions,
                        cycles: Vec::new(),
                    });
                }
            }
        } else {
            vec![dependency.artifact.version.clone()]
        };

        let mut node = DependencyNode::from_dependency(dependency.clone());
        node.version_constraint = Some(constraint.clone());
        if constraint.is_range() {
            node.available_versions = candidates.clone();
        }
        node.managed_bits = managed.bits;
        node.premanaged_version = managed.premanaged_version;
        node.premanaged_scope = managed.premanaged_scope;

        let mut chosen_artifact = dependency.artifact.clone();
        let mut descriptor = ArtifactDescriptor::default();
        let mut read_ok = false;
        let mut relocations = Vec::new();

        'candidates: for version in &candidates {
            chosen_artifact = dependency.artifact.with_version(version.clone());
            let mut hops = 0;
            loop {
                match read_descriptor(session, reader, &chosen_artifact, &[]).await {
                    Ok(d) => {
                        if let Some(relocated) = d.relocations.first().cloned() {
                            relocations.push(chosen_artifact.clone());
                            if ancestors.iter().any(|a| a.conflict_key() == relocated.conflict_key()) {
                                let mut path: Vec<Artifact> = (*ancestors).clone();
                                path.push(relocated);
                                return Ok(NodeOutcome {
                                    node: None,
                                    exceptions,
                                    cycles: vec![Cycle { path }],
                                });
                            }
                            chosen_artifact = relocated;
                            hops += 1;
                            if hops > MAX_RELOCATION_HOPS {
                                exceptions.push(ResolverError::DescriptorReadFailed {
                                    artifact: chosen_artifact.to_string(),
                                    message: "relocation chain too long".to_string(),
                                });
                                break 'candidates;
                            }
                            continue;
                        }
                        descriptor = d;
                        read_ok = true;
                        break 'candidates;
                    }
                    Err(err) => {
                        match session.descriptor_policy {
                            ArtifactDescriptorPolicy::Strict => {
                                return Err(ResolverError::DescriptorReadFailed {
                                    artifact: chosen_artifact.to_string(),
                                    message: err.message,
                                });
                            }
                            _ => {
                                exceptions.push(ResolverError::DescriptorReadFailed {
                                    artifact: chosen_artifact.to_string(),
                                    message: err.message,
                                });
                                continue 'candidates;
                            }
                        }
                    }
                }
            }
        }

        node.artifact = chosen_artifact.clone();
        node.version = Some(chosen_artifact.version.clone());
        node.relocations = relocations;

        if !read_ok {
            return Ok(NodeOutcome { node: Some(node), exceptions, cycles: Vec::new() });
        }

        // Cycle check against the (possibly relocated) final coordinates:
        // the pre-read check above only guards the as-declared identity,
        // so a relocation that redirects onto an ancestor still needs
        // catching here. Same "do not create" treatment as the early check.
        if ancestors.iter().any(|a| a.conflict_key() == chosen_artifact.conflict_key()) {
            let mut path: Vec<Artifact> = (*ancestors).clone();
            path.push(chosen_artifact.clone());
            return Ok(NodeOutcome { node: None, exceptions, cycles: vec![Cycle { path }] });
        }

        node.aliases = descriptor.aliases.clone();

        if !policies.traverser.traverse_children(&dependency) {
            return Ok(NodeOutcome { node: Some(node), exceptions, cycles: Vec::new() });
        }

        let mut next_ancestors = (*ancestors).clone();
        next_ancestors.push(chosen_artifact.clone());
        let next_ancestors = Arc::new(next_ancestors);

        let child_manager = policies.manager.derive_child(&DerivationContext {
            artifact: &chosen_artifact,
            dependency: Some(&dependency),
            managed_dependencies: &descriptor.managed_dependencies,
        });
        let child_selector = policies.selector.derive_child(&DerivationContext {
            artifact: &chosen_artifact,
            dependency: Some(&dependency),
            managed_dependencies: &descriptor.managed_dependencies,
        });
        let child_traverser = policies.traverser.derive_child(&DerivationContext {
            artifact: &chosen_artifact,
            dependency: Some(&dependency),
            managed_dependencies: &descriptor.managed_dependencies,
        });
        let child_version_filter = policies.version_filter.derive_child(&DerivationContext {
            artifact: &chosen_artifact,
            dependency: Some(&dependency),
            managed_dependencies: &descriptor.managed_dependencies,
        });

        let child_repo_ids = repo_ids; // repositories are inherited unchanged in this simplified contract

        match expand_children(
            session,
            reader,
            range_resolver,
            &chosen_artifact,
            descriptor.dependencies,
            depth + 1,
            next_ancestors,
            &child_repo_ids,
            Policies {
                selector: child_selector,
                traverser: child_traverser,
                manager: child_manager,
                version_filter: child_version_filter,
            },
        )
        .await
        {
            Ok((children, child_exceptions, cycles)) => {
                *node.children_mut() = children;
                exceptions.extend(child_exceptions);
                // Subtrees that recorded an exception or cycle are not
                // cached: a later call with a different ancestor path could
                // resolve them differently (e.g. no cycle at all), and the
                // fingerprint does not capture the ancestor path.
                if exceptions.is_empty() && cycles.is_empty() {
                    session.cache.put_subtree(fp, node.clone());
                }
                Ok(NodeOutcome { node: Some(node), exceptions, cycles })
            }
            Err(fatal) => Err(fatal),
        }
    })
}

/// Expand one node's accepted children concurrently (bounded by the
/// session's semaphore), preserving declaration order in the result.
#[allow(clippy::too_many_arguments)]
async fn expand_children<'a>(
    session: &'a Session,
    reader: &'a dyn ArtifactDescriptorReader,
    range_resolver: &'a dyn VersionRangeResolver,
    parent_artifact: &Artifact,
    deps: Vec<Dependency>,
    depth: usize,
    ancestors: Arc<Vec<Artifact>>,
    repo_ids: &[String],
    policies: Policies,
) -> Result<(Vec<DependencyNode>, Vec<ResolverError>, Vec<Cycle>), ResolverError> {
    let semaphore = Arc::new(Semaphore::new(session.max_concurrent_fetches.max(1)));
    let mut accepted = Vec::new();
    let mut exceptions = Vec::new();
    let mut cycles = Vec::new();

    for dep in deps {
        let update = policies.manager.manage(&dep);
        let (dep, managed) = apply_management(dep, update);
        if !policies.selector.select(&dep, depth) {
            continue;
        }
        accepted.push((dep, managed));
    }

    let futures = accepted.into_iter().map(|(dep, managed)| {
        let session = session;
        let semaphore = Arc::clone(&semaphore);
        let ancestors = Arc::clone(&ancestors);
        let selector = policies.selector.clone();
        let traverser = policies.traverser;
        let manager = policies.manager.clone();
        let version_filter = policies.version_filter;
        let repo_ids = repo_ids.to_vec();
        async move {
            let _permit = semaphore.acquire().await.expect("semaphore closed");
            let outcome = collect_node(
                session,
                reader,
                range_resolver,
                dep,
                managed,
                depth,
                ancestors,
                repo_ids,
                Policies { selector, traverser, manager, version_filter },
            )
            .await?;
            Ok::<NodeOutcome, ResolverError>(outcome)
        }
    });

    let _ = parent_artifact; // retained for future repository-inheritance logic
    let results = join_all(futures).await;
    let mut nodes = Vec::with_capacity(results.len());
    for result in results {
        let outcome = result?;
        exceptions.extend(outcome.exceptions);
        cycles.extend(outcome.cycles);
        if let Some(node) = outcome.node {
            nodes.push(node);
        }
    }

    Ok((nodes, exceptions, cycles))
}

/// Apply a management update to a dependency, returning the updated
/// dependency and the premanaged version if the version changed.
fn apply_management(
    dep: Dependency,
    update: Option<crate::policy::ManagementUpdate>,
) -> (Dependency, ManagedMeta) {
    let Some(update) = update else { return (dep, ManagedMeta::default()) };
    let mut next = dep.clone();
    let mut meta = ManagedMeta::default();
    if let Some(version) = update.version {
        if version != next.artifact.version {
            meta.premanaged_version = Some(next.artifact.version.clone());
            meta.bits.insert(ManagedBits::VERSION);
        }
        next.artifact = next.artifact.with_version(version);
    }
    if let Some(scope) = update.scope {
        if scope != next.scope {
            meta.premanaged_scope = Some(next.scope.clone());
            meta.bits.insert(ManagedBits::SCOPE);
        }
        next = next.with_scope(scope);
    }
    if let Some(optional) = update.optional {
        if optional != next.optional {
            meta.bits.insert(ManagedBits::OPTIONAL);
        }
        next = next.with_optional(optional);
    }
    if let Some(exclusions) = update.exclusions {
        if !exclusions.is_empty() {
            meta.bits.insert(ManagedBits::EXCLUSIONS);
        }
        next = next.with_exclusions(exclusions);
    }
    (next, meta)
}

async fn read_descriptor(
    session: &Session,
    reader: &dyn ArtifactDescriptorReader,
    artifact: &Artifact,
    repositories: &[crate::contracts::RemoteRepository],
) -> Result<ArtifactDescriptor, ResolverError> {
    let key = ArtifactKey { conflict_key: artifact.conflict_key(), version: artifact.version.clone() };
    if let Some(cached) = session.cache.get_descriptor(&key) {
        tracing::debug!(artifact = %artifact, "descriptor cache hit");
        return Ok(cached);
    }

    let request = DescriptorRequest { artifact: artifact.clone(), repositories: repositories.to_vec() };
    match reader.read(session, &request).await {
        Ok(descriptor) => {
            session.cache.put_descriptor(key, descriptor.clone());
            Ok(descriptor)
        }
        Err(err) => {
            tracing::warn!(artifact = %artifact, message = %err.message, "descriptor read failed");
            Err(ResolverError::DescriptorReadFailed { artifact: artifact.to_string(), message: err.message })
        }
    }
}

/// Merge `overrides` over `base` by conflict key; `overrides` entries win.
/// Order: base entries first (in order), with overridden ones replaced
/// in-place, then any override with no matching base entry appended.
fn merge_by_key(base: &[Dependency], overrides: &[Dependency]) -> Vec<Dependency> {
    let mut by_key: std::collections::BTreeMap<ConflictKey, Dependency> =
        base.iter().map(|d| (d.artifact.conflict_key(), d.clone())).collect();
    let mut order: Vec<ConflictKey> = base.iter().map(|d| d.artifact.conflict_key()).collect();
    for dep in overrides {
        let key = dep.artifact.conflict_key();
        if !by_key.contains_key(&key) {
            order.push(key.clone());
        }
        by_key.insert(key, dep.clone());
    }
    order.into_iter().map(|key| by_key.remove(&key).expect("key was just inserted")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_overrides_on_key_collision() {
        let base = vec![Dependency::new(Artifact::new("g", "a", "1.0"))];
        let overrides = vec![Dependency::new(Artifact::new("g", "a", "2.0"))];
        let merged = merge_by_key(&base, &overrides);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].artifact.version, "2.0");
    }

    #[test]
    fn merge_preserves_base_order_and_appends_new_overrides() {
        let base = vec![
            Dependency::new(Artifact::new("g", "a", "1.0")),
            Dependency::new(Artifact::new("g", "b", "1.0")),
        ];
        let overrides = vec![Dependency::new(Artifact::new("g", "c", "1.0"))];
        let merged = merge_by_key(&base, &overrides);
        let ids: Vec<&str> = merged.iter().map(|d| d.artifact.artifact_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
