//! Dependency declarations: an artifact paired with scope, optionality, and
//! exclusions.

use std::collections::BTreeSet;
use std::fmt;

use crate::artifact::Artifact;

/// An exclusion identity 4-tuple `(group_id, artifact_id, classifier,
/// extension)`. Any field left as the empty string is a wildcard matching
/// that field unconditionally — `Exclusion::all()` excludes everything.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Exclusion {
    pub group_id: String,
    pub artifact_id: String,
    pub classifier: String,
    pub extension: String,
}

impl Exclusion {
    /// An exclusion over `group_id:artifact_id` only; classifier and
    /// extension are left as wildcards.
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self { group_id: group_id.into(), artifact_id: artifact_id.into(), classifier: String::new(), extension: String::new() }
    }

    /// An exclusion over the full 4-tuple.
    pub fn with_coordinates(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        classifier: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self { group_id: group_id.into(), artifact_id: artifact_id.into(), classifier: classifier.into(), extension: extension.into() }
    }

    /// The universal exclusion: every field wildcarded.
    pub fn all() -> Self {
        Self::default()
    }

    /// Whether this exclusion matches the given artifact, honoring the
    /// empty-string wildcard in any of the four fields.
    pub fn matches(&self, artifact: &Artifact) -> bool {
        field_matches(&self.group_id, &artifact.group_id)
            && field_matches(&self.artifact_id, &artifact.artifact_id)
            && field_matches(&self.classifier, &artifact.classifier)
            && field_matches(&self.extension, &artifact.extension)
    }
}

impl Default for Exclusion {
    fn default() -> Self {
        Self { group_id: String::new(), artifact_id: String::new(), classifier: String::new(), extension: String::new() }
    }
}

fn field_matches(pattern: &str, value: &str) -> bool {
    pattern.is_empty() || pattern == value
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = |s: &str| if s.is_empty() { "*" } else { s };
        write!(f, "{}:{}:{}:{}", field(&self.group_id), field(&self.artifact_id), field(&self.extension), field(&self.classifier))
    }
}

/// A dependency declaration: the requested artifact plus the scope,
/// optionality, and exclusion set that travel with it through collection.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Dependency {
    pub artifact: Artifact,
    pub scope: String,
    pub optional: bool,
    pub exclusions: BTreeSet<Exclusion>,
}

impl Dependency {
    /// A dependency with the default `"compile"` scope, not optional, no
    /// exclusions.
    pub fn new(artifact: Artifact) -> Self {
        Self {
            artifact,
            scope: "compile".to_string(),
            optional: false,
            exclusions: BTreeSet::new(),
        }
    }

    pub fn with_scope(&self, scope: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.scope = scope.into();
        next
    }

    pub fn with_optional(&self, optional: bool) -> Self {
        let mut next = self.clone();
        next.optional = optional;
        next
    }

    pub fn with_artifact(&self, artifact: Artifact) -> Self {
        let mut next = self.clone();
        next.artifact = artifact;
        next
    }

    /// Returns a new dependency with `exclusions` merged in.
    pub fn with_exclusions(&self, exclusions: impl IntoIterator<Item = Exclusion>) -> Self {
        let mut next = self.clone();
        next.exclusions.extend(exclusions);
        next
    }

    /// True if any exclusion in this dependency's set matches the given
    /// artifact.
    pub fn is_excluded(&self, artifact: &Artifact) -> bool {
        self.exclusions.iter().any(|e| e.matches(artifact))
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.artifact, self.scope)?;
        if self.optional {
            write!(f, " optional")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lib(version: &str) -> Artifact {
        Artifact::new("org.example", "lib", version)
    }

    #[test]
    fn default_scope_is_compile() {
        let dep = Dependency::new(lib("1.0"));
        assert_eq!(dep.scope, "compile");
        assert!(!dep.optional);
        assert!(dep.exclusions.is_empty());
    }

    #[test]
    fn exclusion_wildcard_matches_any_artifact_id() {
        let excl = Exclusion::new("org.example", "");
        assert!(excl.matches(&Artifact::new("org.example", "lib", "1.0")));
        assert!(excl.matches(&Artifact::new("org.example", "other", "1.0")));
        assert!(!excl.matches(&Artifact::new("org.other", "lib", "1.0")));
    }

    #[test]
    fn exclusion_all_matches_everything() {
        let excl = Exclusion::all();
        assert!(excl.matches(&Artifact::new("anything", "goes", "1.0")));
    }

    #[test]
    fn exclusion_can_scope_to_classifier_and_extension() {
        let excl = Exclusion::with_coordinates("g", "a", "sources", "jar");
        assert!(excl.matches(&Artifact::new("g", "a", "1.0").with_classifier("sources")));
        assert!(!excl.matches(&Artifact::new("g", "a", "1.0").with_classifier("javadoc")));
    }

    #[test]
    fn is_excluded_checks_full_set() {
        let dep = Dependency::new(lib("1.0")).with_exclusions([Exclusion::new("org.bad", "thing")]);
        assert!(dep.is_excluded(&Artifact::new("org.bad", "thing", "1.0")));
        assert!(!dep.is_excluded(&Artifact::new("org.good", "thing", "1.0")));
    }

    #[test]
    fn with_methods_do_not_mutate_original() {
        let base = Dependency::new(lib("1.0"));
        let optional = base.with_optional(true);
        assert!(!base.optional);
        assert!(optional.optional);
    }
}
