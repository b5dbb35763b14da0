use std::collections::BTreeSet;

use resolvecore_model::{Dependency, Exclusion};

use super::{fnv1a, DerivationContext};

/// `select(dep) -> bool`, called before a dependency is added as a child.
/// A closed set of built-in strategies, generalizing the teacher's inline
/// scope/optional/exclusion checks in `resolver.rs`.
#[derive(Debug, Clone, PartialEq)]
pub enum DependencySelector {
    /// Reject dependencies whose scope is in the given set.
    Scope(BTreeSet<String>),
    /// Reject optional dependencies once past the root (depth > 0).
    Optional,
    /// Reject dependencies excluded by the accumulated exclusion set
    /// inherited from ancestors.
    Exclusion(BTreeSet<Exclusion>),
    /// Accept only if every child selector accepts.
    And(Vec<DependencySelector>),
}

impl DependencySelector {
    /// The teacher's implicit default: skip `test`/`provided`/`system`.
    pub fn default_scopes() -> Self {
        DependencySelector::Scope(["test", "provided", "system"].into_iter().map(String::from).collect())
    }

    pub fn select(&self, dep: &Dependency, depth: usize) -> bool {
        match self {
            DependencySelector::Scope(rejected) => !rejected.contains(&dep.scope),
            DependencySelector::Optional => depth == 0 || !dep.optional,
            DependencySelector::Exclusion(exclusions) => !exclusions.iter().any(|e| e.matches(&dep.artifact)),
            DependencySelector::And(selectors) => selectors.iter().all(|s| s.select(dep, depth)),
        }
    }

    /// Derive the selector for this node's children. `Exclusion` grows to
    /// include the node's own dependency exclusions; everything else is a
    /// no-op and returns `self`.
    pub fn derive_child(&self, ctx: &DerivationContext<'_>) -> Self {
        match self {
            DependencySelector::Exclusion(inherited) => {
                let Some(dep) = ctx.dependency else { return self.clone() };
                if dep.exclusions.is_empty() {
                    return self.clone();
                }
                let mut next = inherited.clone();
                next.extend(dep.exclusions.iter().cloned());
                DependencySelector::Exclusion(next)
            }
            DependencySelector::And(selectors) => {
                DependencySelector::And(selectors.iter().map(|s| s.derive_child(ctx)).collect())
            }
            other => other.clone(),
        }
    }

    pub fn identity(&self) -> u64 {
        match self {
            DependencySelector::Scope(scopes) => {
                let joined: Vec<&str> = scopes.iter().map(String::as_str).collect();
                fnv1a(&["scope", &joined.join(",")])
            }
            DependencySelector::Optional => fnv1a(&["optional"]),
            DependencySelector::Exclusion(exclusions) => {
                let joined: Vec<String> = exclusions.iter().map(|e| e.to_string()).collect();
                fnv1a(&["exclusion", &joined.join(",")])
            }
            DependencySelector::And(selectors) => {
                let ids: Vec<String> = selectors.iter().map(|s| s.identity().to_string()).collect();
                fnv1a(&["and", &ids.join(",")])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolvecore_model::Artifact;

    fn dep(scope: &str, optional: bool) -> Dependency {
        Dependency::new(Artifact::new("g", "a", "1.0")).with_scope(scope).with_optional(optional)
    }

    #[test]
    fn scope_selector_rejects_listed_scopes() {
        let sel = DependencySelector::default_scopes();
        assert!(!sel.select(&dep("test", false), 1));
        assert!(sel.select(&dep("compile", false), 1));
    }

    #[test]
    fn optional_selector_allows_root_level_optional() {
        let sel = DependencySelector::Optional;
        assert!(sel.select(&dep("compile", true), 0));
        assert!(!sel.select(&dep("compile", true), 1));
    }

    #[test]
    fn identity_is_stable_and_value_based() {
        let a = DependencySelector::default_scopes();
        let b = DependencySelector::default_scopes();
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn derive_child_is_noop_for_scope_selector() {
        let sel = DependencySelector::default_scopes();
        let artifact = Artifact::new("g", "a", "1.0");
        let ctx = DerivationContext { artifact: &artifact, dependency: None, managed_dependencies: &[] };
        assert_eq!(sel.derive_child(&ctx), sel);
    }
}
