use std::collections::BTreeMap;

use resolvecore_model::{ConflictKey, Dependency, Exclusion};

use super::{fnv1a, DerivationContext};

/// The subset of a dependency's attributes a management entry overrides.
/// `None` fields mean "no change"; at least one field is expected to be
/// `Some` whenever a `ManagementUpdate` is returned.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ManagementUpdate {
    pub version: Option<String>,
    pub scope: Option<String>,
    pub optional: Option<bool>,
    pub exclusions: Option<Vec<Exclusion>>,
}

/// `manage(dep) -> Option<ManagementUpdate>`. The classic strategy applies
/// management entries keyed by `(group, artifact, classifier, extension)`,
/// generalizing the teacher's `Pom::managed_version` lookup to all four
/// overridable attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyManager {
    entries: BTreeMap<ConflictKey, ManagementUpdate>,
}

impl DependencyManager {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: impl IntoIterator<Item = (ConflictKey, ManagementUpdate)>) -> Self {
        Self { entries: entries.into_iter().collect() }
    }

    pub fn manage(&self, dep: &Dependency) -> Option<ManagementUpdate> {
        self.entries.get(&dep.artifact.conflict_key()).cloned()
    }

    /// Layers management declared by the current node's descriptor over the
    /// inherited manager; closest declaration wins, so entries passed here
    /// take precedence over (shadow) inherited ones with the same key.
    pub fn derive_child(&self, ctx: &DerivationContext<'_>) -> Self {
        let declared: Vec<(ConflictKey, ManagementUpdate)> = ctx
            .managed_dependencies
            .iter()
            .map(|dep| {
                let update = ManagementUpdate {
                    version: Some(dep.artifact.version.clone()),
                    scope: Some(dep.scope.clone()),
                    optional: Some(dep.optional),
                    exclusions: (!dep.exclusions.is_empty())
                        .then(|| dep.exclusions.iter().cloned().collect()),
                };
                (dep.artifact.conflict_key(), update)
            })
            .collect();
        if declared.is_empty() {
            return self.clone();
        }
        let mut merged = self.entries.clone();
        for (key, update) in declared {
            merged.insert(key, update);
        }
        DependencyManager { entries: merged }
    }

    pub fn identity(&self) -> u64 {
        let mut parts: Vec<String> = self
            .entries
            .iter()
            .map(|(k, v)| format!("{k}={v:?}"))
            .collect();
        parts.sort();
        fnv1a(&["manager", &parts.join(";")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolvecore_model::Artifact;

    #[test]
    fn manage_returns_none_for_unmanaged_dependency() {
        let mgr = DependencyManager::empty();
        let dep = Dependency::new(Artifact::new("g", "a", "1.0"));
        assert!(mgr.manage(&dep).is_none());
    }

    #[test]
    fn manage_overrides_version_for_matching_key() {
        let dep = Dependency::new(Artifact::new("g", "a", "2.0"));
        let update = ManagementUpdate { version: Some("2.0".into()), ..Default::default() };
        let mgr = DependencyManager::with_entries([(dep.artifact.conflict_key(), update)]);
        let target = Dependency::new(Artifact::new("g", "a", "1.0"));
        let result = mgr.manage(&target).unwrap();
        assert_eq!(result.version, Some("2.0".to_string()));
    }

    #[test]
    fn derive_child_is_noop_without_managed_deps() {
        let mgr = DependencyManager::empty();
        let artifact = Artifact::new("g", "a", "1.0");
        let ctx = super::DerivationContext { artifact: &artifact, dependency: None, managed_dependencies: &[] };
        assert_eq!(mgr.derive_child(&ctx), mgr);
    }

    #[test]
    fn closest_declaration_wins_on_derive() {
        let parent_dep = Dependency::new(Artifact::new("g", "a", "9.9"));
        let parent_mgr =
            DependencyManager::with_entries([(parent_dep.artifact.conflict_key(), ManagementUpdate {
                version: Some("9.9".into()),
                ..Default::default()
            })]);

        let closer_dep = Dependency::new(Artifact::new("g", "a", "1.0"));
        let artifact = Artifact::new("g", "x", "1.0");
        let ctx = super::DerivationContext {
            artifact: &artifact,
            dependency: None,
            managed_dependencies: std::slice::from_ref(&closer_dep),
        };
        let child_mgr = parent_mgr.derive_child(&ctx);
        let result = child_mgr.manage(&closer_dep).unwrap();
        assert_eq!(result.version, Some("1.0".to_string()));
    }
}
