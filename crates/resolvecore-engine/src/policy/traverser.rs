use resolvecore_model::Dependency;

use super::{fnv1a, DerivationContext};

/// `traverse_children(dep) -> bool`, called after selection to decide
/// whether to *expand* an accepted child (a node may be kept in the graph
/// without being expanded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyTraverser {
    /// Always expand — the teacher's implicit default.
    FatArtifact,
    /// Don't expand into `test`/`provided`/`system`-scoped children.
    Scope,
}

impl DependencyTraverser {
    pub fn traverse_children(&self, dep: &Dependency) -> bool {
        match self {
            DependencyTraverser::FatArtifact => true,
            DependencyTraverser::Scope => !matches!(dep.scope.as_str(), "test" | "provided" | "system"),
        }
    }

    /// Both built-ins are depth-independent: derivation is always a no-op.
    pub fn derive_child(&self, _ctx: &DerivationContext<'_>) -> Self {
        *self
    }

    pub fn identity(&self) -> u64 {
        match self {
            DependencyTraverser::FatArtifact => fnv1a(&["fat-artifact"]),
            DependencyTraverser::Scope => fnv1a(&["scope-traverser"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolvecore_model::Artifact;

    #[test]
    fn fat_artifact_always_traverses() {
        let dep = Dependency::new(Artifact::new("g", "a", "1.0")).with_scope("test");
        assert!(DependencyTraverser::FatArtifact.traverse_children(&dep));
    }

    #[test]
    fn scope_traverser_skips_test_scope() {
        let dep = Dependency::new(Artifact::new("g", "a", "1.0")).with_scope("test");
        assert!(!DependencyTraverser::Scope.traverse_children(&dep));
    }
}
