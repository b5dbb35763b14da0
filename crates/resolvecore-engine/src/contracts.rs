//! External collaborator contracts: the descriptor reader, the version
//! range resolver, and the session the core reads configuration from.
//!
//! These traits are the only surface the algorithm crate exposes to
//! `resolvecore-maven` (or any other reference/production implementation);
//! the core never imports an HTTP or XML crate itself.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use resolvecore_model::{Artifact, Dependency};
use thiserror::Error;

use crate::cache::SessionCache;
use crate::policy::{DependencySelector, DependencyTraverser, DependencyManager, VersionFilter};

/// A remote repository reference. Only `id` is load-bearing for the core
/// (deduplication); the rest is opaque passthrough to the reference
/// collaborators.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RemoteRepository {
    pub id: String,
    pub content_type: String,
    pub url: String,
    pub proxy: Option<String>,
    pub auth: Option<String>,
    pub mirror_of_ids: Vec<String>,
    pub release_policy: RepositoryPolicy,
    pub snapshot_policy: RepositoryPolicy,
}

impl RemoteRepository {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content_type: "default".to_string(),
            url: url.into(),
            proxy: None,
            auth: None,
            mirror_of_ids: Vec::new(),
            release_policy: RepositoryPolicy::default(),
            snapshot_policy: RepositoryPolicy::default(),
        }
    }
}

/// Whether a repository is consulted for release and/or snapshot versions.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RepositoryPolicy {
    pub enabled: bool,
}

impl Default for RepositoryPolicy {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// How the collector reacts to a failed descriptor read.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum ArtifactDescriptorPolicy {
    /// Any read failure is fatal.
    Strict,
    /// A read failure for a missing artifact is ignored (node kept, no
    /// children); other errors are fatal.
    IgnoreMissing,
    /// All read failures are ignored.
    #[default]
    IgnoreErrors,
}

/// Declared direct dependencies, management entries, relocations, and
/// repository contributions of an artifact, as read from its descriptor.
#[derive(Debug, Clone, Default)]
pub struct ArtifactDescriptor {
    pub artifact: Option<Artifact>,
    pub relocations: Vec<Artifact>,
    pub dependencies: Vec<Dependency>,
    pub managed_dependencies: Vec<Dependency>,
    pub repositories: Vec<RemoteRepository>,
    pub aliases: Vec<Artifact>,
}

#[derive(Debug, Clone)]
pub struct DescriptorRequest {
    pub artifact: Artifact,
    pub repositories: Vec<RemoteRepository>,
}

#[derive(Debug, Error, Clone)]
#[error("failed to read descriptor for {artifact}: {message}")]
pub struct DescriptorError {
    pub artifact: String,
    pub message: String,
}

/// Reference-contract: resolves an artifact to its declared dependencies.
#[async_trait]
pub trait ArtifactDescriptorReader: Send + Sync {
    async fn read(
        &self,
        session: &Session,
        request: &DescriptorRequest,
    ) -> Result<ArtifactDescriptor, DescriptorError>;
}

#[derive(Debug, Clone)]
pub struct VersionRangeRequest {
    pub artifact: Artifact,
    pub repositories: Vec<RemoteRepository>,
}

#[derive(Debug, Clone)]
pub struct VersionRangeResult {
    /// Ordered ascending.
    pub versions: Vec<String>,
    pub version_constraint: resolvecore_model::VersionConstraint,
    /// The repository each version was advertised by, aligned with `versions`.
    pub repositories: Vec<String>,
}

#[derive(Debug, Error, Clone)]
#[error("failed to resolve range for {artifact}: {message}")]
pub struct RangeResolutionError {
    pub artifact: String,
    pub message: String,
}

/// Reference-contract: expands a version range into concrete candidates.
#[async_trait]
pub trait VersionRangeResolver: Send + Sync {
    async fn resolve(
        &self,
        session: &Session,
        request: &VersionRangeRequest,
    ) -> Result<VersionRangeResult, RangeResolutionError>;
}

/// Scope priority as a configurable ordered table (highest priority first),
/// per the open question in spec §9: the implementer accepts the table
/// rather than hard-coding one.
#[derive(Debug, Clone)]
pub struct ScopePriority {
    order: Vec<String>,
}

impl ScopePriority {
    /// The conventional Maven ordering: compile > runtime > provided > test > system.
    pub fn maven_default() -> Self {
        Self {
            order: ["compile", "runtime", "provided", "test", "system"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    pub fn custom(order: Vec<String>) -> Self {
        Self { order }
    }

    /// Lower is higher priority; unknown scopes sort after every known one.
    pub fn rank(&self, scope: &str) -> usize {
        self.order.iter().position(|s| s == scope).unwrap_or(self.order.len())
    }
}

/// A bag of configuration the collector reads but never writes: the
/// offline flag, the active policy quartet, a flat config-properties map,
/// the session cache, and a cooperative cancellation flag.
#[derive(Clone)]
pub struct Session {
    pub offline: bool,
    pub selector: DependencySelector,
    pub traverser: DependencyTraverser,
    pub manager: DependencyManager,
    pub version_filter: VersionFilter,
    pub scope_priority: Arc<ScopePriority>,
    pub descriptor_policy: ArtifactDescriptorPolicy,
    pub config_properties: BTreeMap<String, String>,
    pub cache: SessionCache,
    cancelled: Arc<AtomicBool>,
    pub max_concurrent_fetches: usize,
}

impl Session {
    pub fn new(
        selector: DependencySelector,
        traverser: DependencyTraverser,
        manager: DependencyManager,
        version_filter: VersionFilter,
    ) -> Self {
        Self {
            offline: false,
            selector,
            traverser,
            manager,
            version_filter,
            scope_priority: Arc::new(ScopePriority::maven_default()),
            descriptor_policy: ArtifactDescriptorPolicy::default(),
            config_properties: BTreeMap::new(),
            cache: SessionCache::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
            max_concurrent_fetches: 8,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// `collector.maxDepth`: hard cap on recursion depth. Default: unbounded.
    pub fn max_depth(&self) -> Option<usize> {
        self.config_properties.get("collector.maxDepth").and_then(|v| v.parse().ok())
    }

    /// `collector.impl`: selects between multiple collector strategies, if
    /// the caller registers more than one. Opaque to the core otherwise.
    pub fn collector_impl(&self) -> Option<&str> {
        self.config_properties.get("collector.impl").map(String::as_str)
    }
}
