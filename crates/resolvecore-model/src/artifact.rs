//! Artifact identity: coordinates, snapshot detection, and the artifact-type
//! registry used to fill in defaults the caller left blank.
//!
//! An **artifact** is the immutable identity of a resolvable unit, addressed
//! by `(group_id, artifact_id, extension, classifier, version)` plus an
//! open `properties` bag. Equality is structural over the whole tuple.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// The default extension assigned when a coordinate string omits one.
pub const DEFAULT_EXTENSION: &str = "jar";

/// Artifact identity, immutable once constructed.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Artifact {
    pub group_id: String,
    pub artifact_id: String,
    pub extension: String,
    pub classifier: String,
    pub version: String,
    pub properties: BTreeMap<String, String>,
}

impl Artifact {
    /// Construct an artifact with the default extension and no classifier.
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            classifier: String::new(),
            version: version.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Returns a new artifact with `version` replaced.
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.version = version.into();
        next
    }

    /// Returns a new artifact with `extension` replaced.
    pub fn with_extension(&self, extension: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.extension = extension.into();
        next
    }

    /// Returns a new artifact with `classifier` replaced.
    pub fn with_classifier(&self, classifier: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.classifier = classifier.into();
        next
    }

    /// Returns a new artifact with `properties` merged (new entries win on key collision).
    pub fn with_properties(&self, properties: BTreeMap<String, String>) -> Self {
        let mut next = self.clone();
        for (k, v) in properties {
            next.properties.insert(k, v);
        }
        next
    }

    /// Identity key ignoring version — `group:artifact:extension:classifier`.
    /// This is the conflict key used by Stage A of the graph transformer.
    pub fn conflict_key(&self) -> ConflictKey {
        ConflictKey {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            classifier: self.classifier.clone(),
            extension: self.extension.clone(),
        }
    }

    /// True if `version` is a snapshot: ends with `-SNAPSHOT` or matches the
    /// timestamped snapshot pattern `-YYYYMMDD.HHMMSS-N`.
    pub fn is_snapshot(&self) -> bool {
        is_snapshot(&self.version)
    }

    /// The base version: timestamped snapshots collapse to `-SNAPSHOT`,
    /// range literals (`[`, `(`) pass through unchanged, everything else
    /// is the identity.
    pub fn base_version(&self) -> String {
        base_version(&self.version)
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        if self.extension != DEFAULT_EXTENSION {
            write!(f, ":{}", self.extension)?;
        }
        if !self.classifier.is_empty() {
            write!(f, ":{}", self.classifier)?;
        }
        write!(f, ":{}", self.version)
    }
}

/// The `(group, artifact, classifier, extension)` key that identifies a
/// conflict group — at most one version of a conflict key survives
/// resolution.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ConflictKey {
    pub group_id: String,
    pub artifact_id: String,
    pub classifier: String,
    pub extension: String,
}

impl fmt::Display for ConflictKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        if self.extension != DEFAULT_EXTENSION {
            write!(f, ":{}", self.extension)?;
        }
        if !self.classifier.is_empty() {
            write!(f, ":{}", self.classifier)?;
        }
        Ok(())
    }
}

/// Failure to parse a coordinate string.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
#[error("invalid coordinate string: {0:?}")]
pub struct BadCoordinates(pub String);

/// Parse `"group:artifact[:extension[:classifier]]:version"`.
///
/// Extension defaults to `"jar"`, classifier to `""`, matching Maven's
/// shorthand coordinate grammar.
pub fn parse_coords(spec: &str) -> Result<Artifact, BadCoordinates> {
    let parts: Vec<&str> = spec.split(':').collect();
    let artifact = match parts.as_slice() {
        [group, artifact, version] => Artifact {
            group_id: group.to_string(),
            artifact_id: artifact.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            classifier: String::new(),
            version: version.to_string(),
            properties: BTreeMap::new(),
        },
        [group, artifact, extension, version] => Artifact {
            group_id: group.to_string(),
            artifact_id: artifact.to_string(),
            extension: extension.to_string(),
            classifier: String::new(),
            version: version.to_string(),
            properties: BTreeMap::new(),
        },
        [group, artifact, extension, classifier, version] => Artifact {
            group_id: group.to_string(),
            artifact_id: artifact.to_string(),
            extension: extension.to_string(),
            classifier: classifier.to_string(),
            version: version.to_string(),
            properties: BTreeMap::new(),
        },
        _ => return Err(BadCoordinates(spec.to_string())),
    };
    if artifact.group_id.is_empty() || artifact.artifact_id.is_empty() || artifact.version.is_empty() {
        return Err(BadCoordinates(spec.to_string()));
    }
    Ok(artifact)
}

/// True if `version` ends with `-SNAPSHOT` or matches the timestamped
/// snapshot pattern `-YYYYMMDD.HHMMSS-N`.
pub fn is_snapshot(version: &str) -> bool {
    version.ends_with("-SNAPSHOT") || timestamped_snapshot_base(version).is_some()
}

/// Collapse a timestamped snapshot (`1.0-20240115.120000-3`) back to its
/// `-SNAPSHOT` form (`1.0-SNAPSHOT`). Range literals and plain versions
/// pass through unchanged.
pub fn base_version(version: &str) -> String {
    if version.starts_with('[') || version.starts_with('(') {
        return version.to_string();
    }
    if let Some(base) = timestamped_snapshot_base(version) {
        return format!("{base}-SNAPSHOT");
    }
    version.to_string()
}

/// If `version` ends in the timestamped snapshot pattern
/// `-YYYYMMDD.HHMMSS-N`, returns the prefix before that suffix.
fn timestamped_snapshot_base(version: &str) -> Option<&str> {
    let (rest, build) = version.rsplit_once('-')?;
    if build.is_empty() || !build.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (base, timestamp) = rest.rsplit_once('-')?;
    let (date, time) = timestamp.split_once('.')?;
    let is_8_digits = date.len() == 8 && date.bytes().all(|b| b.is_ascii_digit());
    let is_6_digits = time.len() == 6 && time.bytes().all(|b| b.is_ascii_digit());
    if is_8_digits && is_6_digits {
        Some(base)
    } else {
        None
    }
}

/// Default extension/classifier/properties for a well-known artifact type
/// (e.g. `"pom"`, `"test-jar"`), consulted only when the caller leaves
/// those fields unset.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactTypeDefaults {
    pub extension: &'static str,
    pub classifier: &'static str,
}

/// Small static registry of well-known artifact types. A linear scan is
/// intentional: the table is short and fixed, so a `HashMap` would just be
/// ceremony.
const ARTIFACT_TYPES: &[(&str, ArtifactTypeDefaults)] = &[
    ("jar", ArtifactTypeDefaults { extension: "jar", classifier: "" }),
    ("pom", ArtifactTypeDefaults { extension: "pom", classifier: "" }),
    ("test-jar", ArtifactTypeDefaults { extension: "jar", classifier: "tests" }),
    ("javadoc", ArtifactTypeDefaults { extension: "jar", classifier: "javadoc" }),
    ("java-source", ArtifactTypeDefaults { extension: "jar", classifier: "sources" }),
    ("maven-plugin", ArtifactTypeDefaults { extension: "jar", classifier: "" }),
];

/// Look up the defaults for a named artifact type.
pub fn artifact_type_defaults(type_id: &str) -> Option<ArtifactTypeDefaults> {
    ARTIFACT_TYPES
        .iter()
        .find(|(id, _)| *id == type_id)
        .map(|(_, defaults)| *defaults)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_part_coordinate() {
        let a = parse_coords("org.example:lib:1.0").unwrap();
        assert_eq!(a.group_id, "org.example");
        assert_eq!(a.artifact_id, "lib");
        assert_eq!(a.extension, "jar");
        assert_eq!(a.classifier, "");
        assert_eq!(a.version, "1.0");
    }

    #[test]
    fn parses_four_part_coordinate_as_extension() {
        let a = parse_coords("org.example:lib:pom:1.0").unwrap();
        assert_eq!(a.extension, "pom");
        assert_eq!(a.classifier, "");
    }

    #[test]
    fn parses_five_part_coordinate_with_classifier() {
        let a = parse_coords("org.example:lib:jar:sources:1.0").unwrap();
        assert_eq!(a.extension, "jar");
        assert_eq!(a.classifier, "sources");
    }

    #[test]
    fn rejects_malformed_coordinate() {
        assert!(parse_coords("org.example:lib").is_err());
        assert!(parse_coords("").is_err());
        assert!(parse_coords("a:b:c:d:e:f").is_err());
    }

    #[test]
    fn snapshot_detection() {
        assert!(is_snapshot("1.0-SNAPSHOT"));
        assert!(is_snapshot("1.0-20240115.120000-3"));
        assert!(!is_snapshot("1.0"));
        assert!(!is_snapshot("1.0-jre"));
    }

    #[test]
    fn base_version_collapses_timestamp() {
        assert_eq!(base_version("1.0-20240115.120000-3"), "1.0-SNAPSHOT");
        assert_eq!(base_version("1.0-SNAPSHOT"), "1.0-SNAPSHOT");
        assert_eq!(base_version("1.0"), "1.0");
    }

    #[test]
    fn base_version_leaves_ranges_alone() {
        assert_eq!(base_version("[1.0,2.0)"), "[1.0,2.0)");
        assert_eq!(base_version("(,2.0]"), "(,2.0]");
    }

    #[test]
    fn base_version_is_idempotent() {
        let v = "1.0-20240115.120000-3";
        assert_eq!(base_version(&base_version(v)), base_version(v));
    }

    #[test]
    fn display_omits_default_extension_and_empty_classifier() {
        let a = Artifact::new("org.example", "lib", "1.0");
        assert_eq!(a.to_string(), "org.example:lib:1.0");
    }

    #[test]
    fn display_includes_extension_and_classifier() {
        let a = Artifact::new("org.example", "lib", "1.0")
            .with_extension("jar")
            .with_classifier("sources");
        assert_eq!(a.to_string(), "org.example:lib:sources:1.0");
    }

    #[test]
    fn conflict_key_ignores_version() {
        let a = Artifact::new("org.example", "lib", "1.0");
        let b = Artifact::new("org.example", "lib", "2.0");
        assert_eq!(a.conflict_key(), b.conflict_key());
    }

    #[test]
    fn artifact_type_lookup() {
        let d = artifact_type_defaults("test-jar").unwrap();
        assert_eq!(d.extension, "jar");
        assert_eq!(d.classifier, "tests");
        assert!(artifact_type_defaults("unknown-type").is_none());
    }
}
