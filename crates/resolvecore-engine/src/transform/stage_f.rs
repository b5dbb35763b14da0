//! Stage F — tree shaping and structural sharing.
//!
//! Bottom-up: computes a structural signature per node from its resolved
//! identity and its children's own signatures, then shares `children`
//! vectors that hash identically via `Arc` clone instead of duplicating
//! them. Optional — callers that don't need the memory win can skip it
//! (`Pipeline::enable_tree_shaping = false`).

use std::collections::HashMap;
use std::sync::Arc;

use super::{DirtyGraph, TransformContext};
use crate::error::ResolverError;
use crate::node::DependencyNode;

pub fn run(graph: &mut DirtyGraph, _ctx: &mut TransformContext) -> Result<(), ResolverError> {
    let mut cache: HashMap<u64, Arc<Vec<DependencyNode>>> = HashMap::new();
    shape(&mut graph.root, &mut cache);
    Ok(())
}

fn shape(node: &mut DependencyNode, cache: &mut HashMap<u64, Arc<Vec<DependencyNode>>>) -> u64 {
    let mut child_signatures = Vec::with_capacity(node.children.len());
    for child in node.children_mut() {
        child_signatures.push(shape(child, cache));
    }

    let own_signature = node_signature(node, &child_signatures);

    if !node.children.is_empty() {
        let children_signature = combine(&child_signatures);
        match cache.get(&children_signature) {
            Some(shared) if structurally_equal(shared, &node.children) => {
                node.children = Arc::clone(shared);
            }
            _ => {
                cache.insert(children_signature, Arc::clone(&node.children));
            }
        }
    }

    own_signature
}

fn structurally_equal(a: &[DependencyNode], b: &[DependencyNode]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b.iter()).all(|(x, y)| {
            x.conflict_group_id == y.conflict_group_id
                && x.version == y.version
                && x.dependency.as_ref().map(|d| (&d.scope, d.optional))
                    == y.dependency.as_ref().map(|d| (&d.scope, d.optional))
                && Arc::ptr_eq(&x.children, &y.children)
        })
}

fn node_signature(node: &DependencyNode, child_signatures: &[u64]) -> u64 {
    let parts: Vec<String> = vec![
        node.conflict_group_id.map(|id| id.to_string()).unwrap_or_default(),
        node.version.clone().unwrap_or_default(),
        node.dependency.as_ref().map(|d| d.scope.clone()).unwrap_or_default(),
        node.dependency.as_ref().map(|d| d.optional.to_string()).unwrap_or_default(),
        node.dependency
            .as_ref()
            .map(|d| d.exclusions.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(","))
            .unwrap_or_default(),
    ];
    let mut joined = parts.join("\u{1}");
    joined.push('\u{1}');
    joined.push_str(&combine(child_signatures).to_string());
    fnv1a(&joined)
}

fn combine(signatures: &[u64]) -> u64 {
    let joined = signatures.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(",");
    fnv1a(&joined)
}

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in s.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
