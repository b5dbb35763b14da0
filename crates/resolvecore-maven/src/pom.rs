//! POM file parsing: dependency declarations, parent inheritance, property
//! interpolation, BOM imports, and `distributionManagement/relocation`.
//!
//! Adapted from the teacher's `kargo-maven::pom`; trimmed of nothing
//! structurally, but extended with relocation parsing (scenario S4) since
//! the teacher never modeled artifact relocation.

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::Reader;
use resolvecore_model::{Artifact, Dependency, Exclusion};

use crate::MavenReaderError;

/// A parsed POM (Project Object Model) file.
#[derive(Debug, Clone, Default)]
pub struct Pom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,

    pub parent: Option<ParentRef>,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<PomDependency>,
    pub dependency_management: Vec<PomDependency>,
    /// Present only when this POM's artifact has been relocated; taken
    /// from `<distributionManagement><relocation>`.
    pub relocation: Option<Relocation>,
}

#[derive(Debug, Clone)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub optional: bool,
    pub classifier: Option<String>,
    pub type_: Option<String>,
    pub exclusions: Vec<PomExclusion>,
}

#[derive(Debug, Clone)]
pub struct PomExclusion {
    pub group_id: String,
    pub artifact_id: String,
}

/// A `<relocation>` element: the new coordinates this artifact now lives
/// at. Any field left unset inherits from the original artifact.
#[derive(Debug, Clone, Default)]
pub struct Relocation {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
}

impl Pom {
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id.as_deref().or(self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    pub fn effective_version(&self) -> Option<&str> {
        self.version.as_deref().or(self.parent.as_ref().map(|p| p.version.as_str()))
    }

    /// Resolve `${property}` references using POM properties and the
    /// built-in `project.*` variables.
    pub fn interpolate(&self, input: &str) -> String {
        let mut result = input.to_string();
        let mut iterations = 0;
        while result.contains("${") && iterations < 20 {
            iterations += 1;
            let mut new = result.clone();
            while let Some(start) = new.find("${") {
                let Some(end) = new[start..].find('}') else { break };
                let key = &new[start + 2..start + end];
                match self.resolve_property(key) {
                    Some(val) => new = format!("{}{}{}", &new[..start], val, &new[start + end + 1..]),
                    None => break,
                }
            }
            if new == result {
                break;
            }
            result = new;
        }
        result
    }

    fn resolve_property(&self, key: &str) -> Option<String> {
        match key {
            "project.groupId" | "pom.groupId" => self.effective_group_id().map(String::from),
            "project.artifactId" | "pom.artifactId" => self.artifact_id.clone(),
            "project.version" | "pom.version" => self.effective_version().map(String::from),
            _ => self.properties.get(key).cloned(),
        }
    }

    /// Interpolate property references in every dependency's coordinates.
    pub fn resolve_properties(&mut self) {
        let snapshot = self.clone();
        for dep in self.dependencies.iter_mut().chain(self.dependency_management.iter_mut()) {
            dep.group_id = snapshot.interpolate(&dep.group_id);
            dep.artifact_id = snapshot.interpolate(&dep.artifact_id);
            if let Some(v) = &dep.version {
                dep.version = Some(snapshot.interpolate(v));
            }
        }
    }

    /// Merge a parent POM's properties and dependency management into this
    /// one; the child's own entries win on key collision.
    pub fn apply_parent(&mut self, parent: &Pom) {
        for (k, v) in &parent.properties {
            self.properties.entry(k.clone()).or_insert_with(|| v.clone());
        }
        if self.group_id.is_none() {
            self.group_id = parent.effective_group_id().map(String::from);
        }
        if self.version.is_none() {
            self.version = parent.effective_version().map(String::from);
        }
        for dm in &parent.dependency_management {
            let dominated = self
                .dependency_management
                .iter()
                .any(|d| d.group_id == dm.group_id && d.artifact_id == dm.artifact_id);
            if !dominated {
                self.dependency_management.push(dm.clone());
            }
        }
    }

    pub fn managed_version(&self, group_id: &str, artifact_id: &str) -> Option<&str> {
        self.dependency_management
            .iter()
            .find(|d| d.group_id == group_id && d.artifact_id == artifact_id)
            .and_then(|d| d.version.as_deref())
    }

    /// Convert this POM's direct dependencies to the engine's model,
    /// resolving each one's version from dependency management when the
    /// declaration itself omits it.
    pub fn to_dependencies(&self) -> Vec<Dependency> {
        self.dependencies.iter().map(|d| self.pom_dep_to_dependency(d)).collect()
    }

    pub fn to_managed_dependencies(&self) -> Vec<Dependency> {
        self.dependency_management.iter().map(|d| self.pom_dep_to_dependency(d)).collect()
    }

    fn pom_dep_to_dependency(&self, d: &PomDependency) -> Dependency {
        let version = d
            .version
            .clone()
            .or_else(|| self.managed_version(&d.group_id, &d.artifact_id).map(String::from))
            .unwrap_or_default();
        let extension = d.type_.clone().unwrap_or_else(|| "jar".to_string());
        let mut artifact = Artifact::new(d.group_id.clone(), d.artifact_id.clone(), version).with_extension(extension);
        if let Some(classifier) = &d.classifier {
            artifact = artifact.with_classifier(classifier.clone());
        }
        // Maven's own XML schema spells its exclusion wildcard as the
        // literal text `*`; the model's `Exclusion` spells it `""`.
        let wildcard = |s: &str| if s == "*" { String::new() } else { s.to_string() };
        let exclusions = d.exclusions.iter().map(|e| Exclusion::new(wildcard(&e.group_id), wildcard(&e.artifact_id))).collect();
        Dependency::new(artifact)
            .with_scope(d.scope.clone().unwrap_or_else(|| "compile".to_string()))
            .with_optional(d.optional)
            .with_exclusions(exclusions)
    }

    /// The relocated artifact this POM redirects to, if any, with any
    /// unset field defaulting to `original`'s corresponding coordinate.
    pub fn relocated_artifact(&self, original: &Artifact) -> Option<Artifact> {
        let reloc = self.relocation.as_ref()?;
        Some(Artifact::new(
            reloc.group_id.clone().unwrap_or_else(|| original.group_id.clone()),
            reloc.artifact_id.clone().unwrap_or_else(|| original.artifact_id.clone()),
            reloc.version.clone().unwrap_or_else(|| original.version.clone()),
        ))
    }
}

/// Parse a POM XML string into a [`Pom`].
pub fn parse_pom(xml: &str) -> Result<Pom, MavenReaderError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pom = Pom::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    let mut current_dep: Option<PomDependency> = None;
    let mut current_exclusion: Option<PomExclusion> = None;
    let mut current_parent: Option<ParentRef> = None;
    let mut current_relocation: Option<Relocation> = None;
    let mut in_dep_mgmt = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                path.push(tag);
                text_buf.clear();
                let ctx = path.join(">");

                match ctx.as_str() {
                    "project>dependencyManagement>dependencies>dependency" | "project>dependencies>dependency" => {
                        in_dep_mgmt = ctx.contains("dependencyManagement");
                        current_dep = Some(PomDependency {
                            group_id: String::new(),
                            artifact_id: String::new(),
                            version: None,
                            scope: None,
                            optional: false,
                            classifier: None,
                            type_: None,
                            exclusions: Vec::new(),
                        });
                    }
                    _ if ctx.ends_with(">exclusion") && current_dep.is_some() => {
                        current_exclusion =
                            Some(PomExclusion { group_id: String::new(), artifact_id: "*".to_string() });
                    }
                    "project>parent" => {
                        current_parent = Some(ParentRef {
                            group_id: String::new(),
                            artifact_id: String::new(),
                            version: String::new(),
                        });
                    }
                    "project>distributionManagement>relocation" => {
                        current_relocation = Some(Relocation::default());
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(_)) => {
                let ctx = path.join(">");
                let depth = path.len();

                if depth == 3 && path.get(1).map(String::as_str) == Some("properties") {
                    let name = path.last().cloned().unwrap_or_default();
                    pom.properties.insert(name, text_buf.clone());
                }

                if let Some(dep) = current_dep.as_mut() {
                    if let Some(excl) = current_exclusion.as_mut() {
                        match path.last().map(String::as_str) {
                            Some("groupId") => excl.group_id = text_buf.clone(),
                            Some("artifactId") => excl.artifact_id = text_buf.clone(),
                            _ => {}
                        }
                        if ctx.ends_with(">exclusion") {
                            if let Some(excl) = current_exclusion.take() {
                                dep.exclusions.push(excl);
                            }
                        }
                    } else {
                        match path.last().map(String::as_str) {
                            Some("groupId") if ctx.ends_with(">dependency>groupId") => dep.group_id = text_buf.clone(),
                            Some("artifactId") if ctx.ends_with(">dependency>artifactId") => {
                                dep.artifact_id = text_buf.clone()
                            }
                            Some("version") if ctx.ends_with(">dependency>version") => dep.version = Some(text_buf.clone()),
                            Some("scope") if ctx.ends_with(">dependency>scope") => dep.scope = Some(text_buf.clone()),
                            Some("optional") if ctx.ends_with(">dependency>optional") => {
                                dep.optional = text_buf.trim() == "true"
                            }
                            Some("classifier") if ctx.ends_with(">dependency>classifier") => {
                                dep.classifier = Some(text_buf.clone())
                            }
                            Some("type") if ctx.ends_with(">dependency>type") => dep.type_ = Some(text_buf.clone()),
                            _ => {}
                        }
                    }

                    if ctx == "project>dependencies>dependency" || ctx == "project>dependencyManagement>dependencies>dependency"
                    {
                        if let Some(dep) = current_dep.take() {
                            if in_dep_mgmt {
                                pom.dependency_management.push(dep);
                            } else {
                                pom.dependencies.push(dep);
                            }
                        }
                        in_dep_mgmt = false;
                    }
                }

                if let Some(parent) = current_parent.as_mut() {
                    match path.last().map(String::as_str) {
                        Some("groupId") if ctx == "project>parent>groupId" => parent.group_id = text_buf.clone(),
                        Some("artifactId") if ctx == "project>parent>artifactId" => parent.artifact_id = text_buf.clone(),
                        Some("version") if ctx == "project>parent>version" => parent.version = text_buf.clone(),
                        _ => {}
                    }
                    if ctx == "project>parent" {
                        pom.parent = current_parent.take();
                    }
                }

                if let Some(reloc) = current_relocation.as_mut() {
                    match path.last().map(String::as_str) {
                        Some("groupId") if ctx == "project>distributionManagement>relocation>groupId" => {
                            reloc.group_id = Some(text_buf.clone())
                        }
                        Some("artifactId") if ctx == "project>distributionManagement>relocation>artifactId" => {
                            reloc.artifact_id = Some(text_buf.clone())
                        }
                        Some("version") if ctx == "project>distributionManagement>relocation>version" => {
                            reloc.version = Some(text_buf.clone())
                        }
                        _ => {}
                    }
                    if ctx == "project>distributionManagement>relocation" {
                        pom.relocation = current_relocation.take();
                    }
                }

                if depth == 2 {
                    match path.last().map(String::as_str) {
                        Some("groupId") => pom.group_id = Some(text_buf.clone()),
                        Some("artifactId") => pom.artifact_id = Some(text_buf.clone()),
                        Some("version") => pom.version = Some(text_buf.clone()),
                        Some("packaging") => pom.packaging = Some(text_buf.clone()),
                        _ => {}
                    }
                }

                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(MavenReaderError::Xml { message: e.to_string() });
            }
            _ => {}
        }
    }

    Ok(pom)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_POM: &str = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>lib</artifactId>
    <version>1.0.0</version>
    <properties>
        <guava.version>32.0.0-jre</guava.version>
    </properties>
    <dependencies>
        <dependency>
            <groupId>com.google.guava</groupId>
            <artifactId>guava</artifactId>
            <version>${guava.version}</version>
        </dependency>
        <dependency>
            <groupId>junit</groupId>
            <artifactId>junit</artifactId>
            <version>4.13.2</version>
            <scope>test</scope>
        </dependency>
    </dependencies>
</project>"#;

    #[test]
    fn parse_and_interpolate() {
        let mut pom = parse_pom(SIMPLE_POM).unwrap();
        pom.resolve_properties();
        assert_eq!(pom.dependencies[0].version.as_deref(), Some("32.0.0-jre"));
        assert_eq!(pom.dependencies[1].scope.as_deref(), Some("test"));
    }

    #[test]
    fn to_dependencies_converts_shape() {
        let mut pom = parse_pom(SIMPLE_POM).unwrap();
        pom.resolve_properties();
        let deps = pom.to_dependencies();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].artifact.artifact_id, "guava");
        assert_eq!(deps[0].artifact.version, "32.0.0-jre");
        assert_eq!(deps[1].scope, "test");
    }

    #[test]
    fn relocation_parsing() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>old.group</groupId>
    <artifactId>old</artifactId>
    <version>1.0</version>
    <distributionManagement>
        <relocation>
            <groupId>new.group</groupId>
            <artifactId>new</artifactId>
            <version>1.0</version>
        </relocation>
    </distributionManagement>
</project>"#;
        let pom = parse_pom(xml).unwrap();
        let original = Artifact::new("old.group", "old", "1.0");
        let relocated = pom.relocated_artifact(&original).unwrap();
        assert_eq!(relocated.group_id, "new.group");
        assert_eq!(relocated.artifact_id, "new");
    }

    #[test]
    fn relocation_absent_by_default() {
        let pom = parse_pom(SIMPLE_POM).unwrap();
        assert!(pom.relocation.is_none());
    }

    #[test]
    fn parent_ref_and_dependency_management_inheritance() {
        let parent_xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>parent</artifactId>
    <version>2.0.0</version>
    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>com.google.guava</groupId>
                <artifactId>guava</artifactId>
                <version>32.0.0-jre</version>
            </dependency>
        </dependencies>
    </dependencyManagement>
</project>"#;
        let child_xml = r#"<?xml version="1.0"?>
<project>
    <parent>
        <groupId>org.example</groupId>
        <artifactId>parent</artifactId>
        <version>2.0.0</version>
    </parent>
    <artifactId>child</artifactId>
    <dependencies>
        <dependency>
            <groupId>com.google.guava</groupId>
            <artifactId>guava</artifactId>
        </dependency>
    </dependencies>
</project>"#;
        let parent = parse_pom(parent_xml).unwrap();
        let mut child = parse_pom(child_xml).unwrap();
        child.apply_parent(&parent);
        assert_eq!(child.effective_group_id(), Some("org.example"));
        assert_eq!(child.managed_version("com.google.guava", "guava"), Some("32.0.0-jre"));
        let deps = child.to_dependencies();
        assert_eq!(deps[0].artifact.version, "32.0.0-jre");
    }
}
