//! `maven-metadata.xml` parsing: artifact-level version listings and
//! version-level SNAPSHOT timestamp resolution.
//!
//! Adapted from the teacher's `kargo-maven::metadata`, unchanged in shape.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::MavenReaderError;

#[derive(Debug, Clone, Default)]
pub struct MavenMetadata {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub latest: Option<String>,
    pub release: Option<String>,
    /// Ascending, as Maven publishes them.
    pub versions: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotMetadata {
    pub version: Option<String>,
    pub timestamp: Option<String>,
    pub build_number: Option<u32>,
}

impl SnapshotMetadata {
    /// `artifactId-<base>-<timestamp>-<buildNumber>`, e.g.
    /// `my-lib-1.0-20240615.143022-42` for version `1.0-SNAPSHOT`.
    pub fn snapshot_base(&self, artifact_id: &str) -> Option<String> {
        let version = self.version.as_deref()?;
        let base = version.strip_suffix("-SNAPSHOT")?;
        let ts = self.timestamp.as_deref()?;
        let bn = self.build_number?;
        Some(format!("{artifact_id}-{base}-{ts}-{bn}"))
    }
}

pub fn parse_metadata(xml: &str) -> Result<MavenMetadata, MavenReaderError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut meta = MavenMetadata::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
                text_buf.clear();
            }
            Ok(Event::Text(ref e)) => text_buf = e.unescape().unwrap_or_default().to_string(),
            Ok(Event::End(_)) => {
                match path.join(">").as_str() {
                    "metadata>groupId" => meta.group_id = Some(text_buf.clone()),
                    "metadata>artifactId" => meta.artifact_id = Some(text_buf.clone()),
                    "metadata>versioning>latest" => meta.latest = Some(text_buf.clone()),
                    "metadata>versioning>release" => meta.release = Some(text_buf.clone()),
                    "metadata>versioning>versions>version" => meta.versions.push(text_buf.clone()),
                    _ => {}
                }
                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(MavenReaderError::Xml { message: e.to_string() }),
            _ => {}
        }
    }

    Ok(meta)
}

pub fn parse_snapshot_metadata(xml: &str) -> Result<SnapshotMetadata, MavenReaderError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut meta = SnapshotMetadata::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
                text_buf.clear();
            }
            Ok(Event::Text(ref e)) => text_buf = e.unescape().unwrap_or_default().to_string(),
            Ok(Event::End(_)) => {
                match path.join(">").as_str() {
                    "metadata>version" => meta.version = Some(text_buf.clone()),
                    "metadata>versioning>snapshot>timestamp" => meta.timestamp = Some(text_buf.clone()),
                    "metadata>versioning>snapshot>buildNumber" => meta.build_number = text_buf.parse().ok(),
                    _ => {}
                }
                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(MavenReaderError::Xml { message: e.to_string() }),
            _ => {}
        }
    }

    Ok(meta)
}
