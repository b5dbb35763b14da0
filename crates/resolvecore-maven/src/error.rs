//! Errors raised while reading Maven coordinates over an [`ArtifactTransport`](crate::transport::ArtifactTransport).

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic, Clone)]
pub enum MavenReaderError {
    #[error("malformed Maven XML: {message}")]
    Xml { message: String },

    #[error("transport fetch failed for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("too many parent POM hops resolving {artifact} (possible cycle)")]
    ParentChainTooLong { artifact: String },
}
