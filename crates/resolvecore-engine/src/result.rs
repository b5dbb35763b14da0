//! C7: the request/result types at the core's API boundary.

use resolvecore_model::{Artifact, Dependency};

use crate::contracts::RemoteRepository;
use crate::error::ResolverError;
use crate::node::{Cycle, DependencyNode};

/// The input to `collect_dependencies`.
#[derive(Debug, Clone, Default)]
pub struct CollectRequest {
    pub root: Option<Dependency>,
    pub root_artifact: Option<Artifact>,
    pub direct_deps: Vec<Dependency>,
    pub managed_deps: Vec<Dependency>,
    pub repositories: Vec<RemoteRepository>,
    pub context: String,
}

/// The output of `collect_dependencies`: the resolved graph root, any
/// non-fatal errors accumulated along the way, and the cycles detected and
/// severed.
#[derive(Debug, Clone)]
pub struct CollectResult {
    pub root_node: DependencyNode,
    pub exceptions: Vec<ResolverError>,
    pub cycles: Vec<Cycle>,
}

impl CollectResult {
    pub fn new(root_node: DependencyNode) -> Self {
        Self { root_node, exceptions: Vec::new(), cycles: Vec::new() }
    }
}
