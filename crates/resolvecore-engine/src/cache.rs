//! The session-scoped caching layer (C8): a descriptor cache and a
//! sub-tree cache, both behind `RwLock` so concurrent sibling descriptor
//! reads (see `collector`) can share them without a full concurrent-map
//! dependency the teacher never pulled in.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use resolvecore_model::ConflictKey;

use crate::contracts::ArtifactDescriptor;
use crate::node::DependencyNode;
use crate::policy::{DependencyManager, DependencySelector, DependencyTraverser, VersionFilter};

/// `artifact_key → descriptor`. Keyed on the artifact's conflict key plus
/// its version, since the conflict key alone discards the version.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ArtifactKey {
    pub conflict_key: ConflictKey,
    pub version: String,
}

/// Every input that can change a collected sub-tree, per spec §4.5's
/// coherency requirement: artifact identity, repository identities, the
/// inherited managed-dependency set (order-insensitive), and each active
/// policy's stable `identity()`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Fingerprint(pub u64);

pub fn fingerprint(
    artifact_key: &ArtifactKey,
    repositories: &[String],
    managed_dep_keys: &[String],
    selector: &DependencySelector,
    traverser: &DependencyTraverser,
    manager: &DependencyManager,
    version_filter: &VersionFilter,
) -> Fingerprint {
    let mut repos = repositories.to_vec();
    repos.sort();
    let mut managed = managed_dep_keys.to_vec();
    managed.sort();
    let parts = [
        artifact_key.conflict_key.to_string(),
        artifact_key.version.clone(),
        repos.join(","),
        managed.join(","),
        selector.identity().to_string(),
        traverser.identity().to_string(),
        manager.identity().to_string(),
        version_filter.identity().to_string(),
    ];
    Fingerprint(crate::policy::fnv1a(&parts.iter().map(String::as_str).collect::<Vec<_>>()))
}

#[derive(Clone)]
pub struct SessionCache {
    descriptors: Arc<RwLock<HashMap<ArtifactKey, ArtifactDescriptor>>>,
    subtrees: Arc<RwLock<HashMap<Fingerprint, DependencyNode>>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self {
            descriptors: Arc::new(RwLock::new(HashMap::new())),
            subtrees: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn get_descriptor(&self, key: &ArtifactKey) -> Option<ArtifactDescriptor> {
        self.descriptors.read().expect("descriptor cache poisoned").get(key).cloned()
    }

    pub fn put_descriptor(&self, key: ArtifactKey, descriptor: ArtifactDescriptor) {
        self.descriptors.write().expect("descriptor cache poisoned").insert(key, descriptor);
    }

    /// Returns a logical clone: the stored node's `children` (an `Arc`) is
    /// reused by reference, only the top-level node is copied, since its
    /// parent context differs from the cached occurrence's.
    pub fn get_subtree(&self, fp: &Fingerprint) -> Option<DependencyNode> {
        self.subtrees.read().expect("subtree cache poisoned").get(fp).cloned()
    }

    pub fn put_subtree(&self, fp: Fingerprint, node: DependencyNode) {
        self.subtrees.write().expect("subtree cache poisoned").insert(fp, node);
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}
