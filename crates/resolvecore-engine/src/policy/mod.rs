//! The policy quartet: four stateless, value-equal strategy objects that
//! steer collection. Each is a closed `enum` of built-in strategies so that
//! equality and a stable [`identity`] fingerprint come for free from
//! `#[derive(PartialEq)]` plus a small FNV hash over the discriminant and
//! parameters.
//!
//! Every policy implements `derive_child`, returning `self.clone()` when
//! derivation would be a no-op — this maximizes the structural sharing the
//! sub-tree cache (C8) relies on.

mod manager;
mod selector;
mod traverser;
mod version_filter;

pub use manager::{DependencyManager, ManagementUpdate};
pub use selector::DependencySelector;
pub use traverser::DependencyTraverser;
pub use version_filter::VersionFilter;

use resolvecore_model::{Artifact, Dependency};

/// The context handed to `derive_child`: the node whose children are about
/// to be collected, and the managed dependencies its descriptor declared.
/// Mirrors spec §4.3 step 3's `context = { session, artifact, dependency,
/// managed_dependencies }`.
#[derive(Debug, Clone)]
pub struct DerivationContext<'a> {
    pub artifact: &'a Artifact,
    pub dependency: Option<&'a Dependency>,
    pub managed_dependencies: &'a [Dependency],
}

/// FNV-1a over a sequence of string parts, used for each policy variant's
/// stable `identity()` fingerprint. Small and dependency-free, matching the
/// teacher's preference for hand-rolled hashing over pulling in a crate for
/// something this contained (cf. `kargo-util::hash`).
pub(crate) fn fnv1a(parts: &[&str]) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET;
    for part in parts {
        for byte in part.as_bytes() {
            hash ^= *byte as u64;
            hash = hash.wrapping_mul(PRIME);
        }
        hash ^= 0xff;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
