//! The dependency graph node and the dirty graph it forms during
//! collection.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use resolvecore_model::{Artifact, Dependency, VersionConstraint};

/// Bitmask over the node attributes that dependency management overrode.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct ManagedBits(u8);

impl ManagedBits {
    pub const VERSION: ManagedBits = ManagedBits(1 << 0);
    pub const SCOPE: ManagedBits = ManagedBits(1 << 1);
    pub const OPTIONAL: ManagedBits = ManagedBits(1 << 2);
    pub const PROPERTIES: ManagedBits = ManagedBits(1 << 3);
    pub const EXCLUSIONS: ManagedBits = ManagedBits(1 << 4);

    pub fn empty() -> Self {
        ManagedBits(0)
    }

    pub fn contains(self, flag: ManagedBits) -> bool {
        self.0 & flag.0 != 0
    }

    pub fn insert(&mut self, flag: ManagedBits) {
        self.0 |= flag.0;
    }
}

impl std::ops::BitOr for ManagedBits {
    type Output = ManagedBits;
    fn bitor(self, rhs: ManagedBits) -> ManagedBits {
        ManagedBits(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ManagedBits {
    fn bitor_assign(&mut self, rhs: ManagedBits) {
        self.0 |= rhs.0;
    }
}

/// A repository reference as the core sees it: only `id` is load-bearing,
/// everything else is opaque passthrough (see `contracts::RemoteRepository`).
pub type RepositoryId = String;

/// A cycle recorded during collection or cycle finalization: the ancestor
/// path from the root down to (and including) the repeated coordinate.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Cycle {
    pub path: Vec<Artifact>,
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.path.iter().map(|a| a.to_string()).collect();
        write!(f, "{}", parts.join(" -> "))
    }
}

/// A node in the dependency graph. Mutable during collection and
/// transformation; treated as read-only once handed to the caller in
/// `CollectResult`.
#[derive(Debug, Clone)]
pub struct DependencyNode {
    /// Absent only for the root-label-only case.
    pub dependency: Option<Dependency>,
    pub artifact: Artifact,
    /// Reference-counted for structural sharing (Stage F); callers that
    /// mutate must clone-on-write via [`DependencyNode::children_mut`].
    pub children: Arc<Vec<DependencyNode>>,
    pub version_constraint: Option<VersionConstraint>,
    pub version: Option<String>,
    pub managed_bits: ManagedBits,
    pub premanaged_version: Option<String>,
    pub premanaged_scope: Option<String>,
    pub relocations: Vec<Artifact>,
    pub aliases: Vec<Artifact>,
    pub repositories: Vec<RepositoryId>,
    /// Cross-stage scratch space; deliberately not reused after transforms.
    pub data: BTreeMap<String, String>,
    /// Set by Stage A; `None` until the transformer pipeline runs.
    pub conflict_group_id: Option<usize>,
    /// Populated during collection when this node's constraint was a
    /// range: the filtered candidates the range resolver advertised,
    /// highest-first. Stage B consults this to clamp a conflict group's
    /// selection into the intersected range.
    pub available_versions: Vec<String>,
}

impl DependencyNode {
    /// A node labelling only an artifact (used for the root when no
    /// `Dependency` was supplied).
    pub fn root_label(artifact: Artifact) -> Self {
        Self {
            dependency: None,
            artifact,
            children: Arc::new(Vec::new()),
            version_constraint: None,
            version: None,
            managed_bits: ManagedBits::empty(),
            premanaged_version: None,
            premanaged_scope: None,
            relocations: Vec::new(),
            aliases: Vec::new(),
            repositories: Vec::new(),
            data: BTreeMap::new(),
            conflict_group_id: None,
            available_versions: Vec::new(),
        }
    }

    /// A node for an accepted dependency, prior to version resolution.
    pub fn from_dependency(dependency: Dependency) -> Self {
        let artifact = dependency.artifact.clone();
        Self {
            dependency: Some(dependency),
            artifact,
            children: Arc::new(Vec::new()),
            version_constraint: None,
            version: None,
            managed_bits: ManagedBits::empty(),
            premanaged_version: None,
            premanaged_scope: None,
            relocations: Vec::new(),
            aliases: Vec::new(),
            repositories: Vec::new(),
            data: BTreeMap::new(),
            conflict_group_id: None,
            available_versions: Vec::new(),
        }
    }

    /// Mutable access to `children`, cloning the shared contents on first
    /// write (copy-on-write per spec §9's structural-sharing note).
    pub fn children_mut(&mut self) -> &mut Vec<DependencyNode> {
        Arc::make_mut(&mut self.children)
    }

    pub fn conflict_key(&self) -> resolvecore_model::ConflictKey {
        self.artifact.conflict_key()
    }
}
