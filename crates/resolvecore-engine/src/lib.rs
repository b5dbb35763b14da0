//! Dependency collection and conflict-resolution engine.
//!
//! Wires C2's reference-collaborator contracts, the C4 policy quartet, the
//! C5 depth-first collector, the C6 graph transformer pipeline, and the C8
//! session cache behind one entry point: [`resolve`]. Callers supply an
//! [`ArtifactDescriptorReader`] and [`VersionRangeResolver`] (see
//! `resolvecore-maven` for the Maven-backed implementations) and a
//! [`CollectRequest`]; they get back a fully collected, conflict-resolved
//! [`CollectResult`].

pub mod cache;
pub mod collector;
pub mod contracts;
pub mod error;
pub mod node;
pub mod policy;
pub mod result;
pub mod transform;

pub use cache::{ArtifactKey, Fingerprint, SessionCache};
pub use collector::collect_dependencies;
pub use contracts::{
    ArtifactDescriptor, ArtifactDescriptorPolicy, ArtifactDescriptorReader, DescriptorError, DescriptorRequest,
    RangeResolutionError, RemoteRepository, RepositoryPolicy, ScopePriority, Session, VersionRangeRequest,
    VersionRangeResolver, VersionRangeResult,
};
pub use error::{ResolverError, ResolverErrorKind, ResolverResult};
pub use node::{Cycle, DependencyNode, ManagedBits, RepositoryId};
pub use policy::{DependencyManager, DependencySelector, DependencyTraverser, DerivationContext, VersionFilter};
pub use result::{CollectRequest, CollectResult};
pub use transform::{DirtyGraph, Pipeline, TransformContext};

/// Runs C5 collection followed by the C6 transform pipeline, producing the
/// final resolved graph. This is the composed entry point C7 describes:
/// `collect_dependencies` builds the dirty graph, `Pipeline::run` rewrites
/// it in place, and the cycles the collector already found are carried
/// forward into the pipeline's `DirtyGraph` so Stage E can fold its own
/// findings in alongside them.
#[tracing::instrument(skip(session, reader, range_resolver, request))]
pub async fn resolve(
    session: &Session,
    reader: &dyn ArtifactDescriptorReader,
    range_resolver: &dyn VersionRangeResolver,
    request: CollectRequest,
) -> Result<CollectResult, ResolverError> {
    let collected = collect_dependencies(session, reader, range_resolver, request).await?;

    let mut graph = DirtyGraph { root: collected.root_node, cycles: collected.cycles };
    let pipeline = Pipeline::new((*session.scope_priority).clone());

    match pipeline.run(&mut graph) {
        Ok(()) => Ok(CollectResult {
            root_node: graph.root,
            exceptions: collected.exceptions,
            cycles: graph.cycles,
        }),
        Err(fatal) => {
            let partial = CollectResult {
                root_node: graph.root,
                exceptions: collected.exceptions,
                cycles: graph.cycles,
            };
            Err(ResolverError::Collection { partial: Box::new(partial), cause: Box::new(fatal) })
        }
    }
}
