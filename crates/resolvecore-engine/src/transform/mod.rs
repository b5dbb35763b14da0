//! C6: the ordered graph transformer pipeline (Stages A through F).
//!
//! Each stage is a free function over a [`DirtyGraph`] and a shared
//! [`TransformContext`] scratch map, composed in order by [`Pipeline`].
//! Stages never attach ad hoc fields to `DependencyNode` itself (spec §9's
//! "avoid attaching opaque fields to the canonical node") — anything a
//! later stage needs from an earlier one travels through the context.

mod stage_a;
mod stage_b;
mod stage_c;
mod stage_d;
mod stage_e;
mod stage_f;

use resolvecore_model::{Artifact, Exclusion};

use crate::contracts::ScopePriority;
use crate::error::ResolverError;
use crate::node::{Cycle, DependencyNode};

/// The dirty graph produced by collection, rewritten in place by the
/// pipeline. `cycles` starts as whatever C5 recorded; Stage E may append
/// to it.
pub struct DirtyGraph {
    pub root: DependencyNode,
    pub cycles: Vec<Cycle>,
}

/// Per-pass scratch space threaded between stages. Holds `serde_json::Value`
/// so stages can exchange arbitrary intermediate structures without the
/// canonical node growing stage-specific fields.
#[derive(Debug, Default)]
pub struct TransformContext {
    values: std::collections::BTreeMap<String, serde_json::Value>,
}

impl TransformContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: serde_json::Value) {
        self.values.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }
}

/// Runs the six canonical stages in the order the spec mandates: A before
/// B; B before C and D; E last.
pub struct Pipeline {
    pub scope_priority: ScopePriority,
    pub enable_tree_shaping: bool,
}

impl Pipeline {
    pub fn new(scope_priority: ScopePriority) -> Self {
        Self { scope_priority, enable_tree_shaping: true }
    }

    #[tracing::instrument(skip(self, graph))]
    pub fn run(&self, graph: &mut DirtyGraph) -> Result<(), ResolverError> {
        let mut ctx = TransformContext::new();
        ctx.set(
            "scope_priority",
            serde_json::Value::Array(
                self.scope_priority_order().into_iter().map(serde_json::Value::String).collect(),
            ),
        );

        stage_a::run(graph, &mut ctx)?;
        stage_b::run(graph, &mut ctx)?;
        stage_c::run(graph, &mut ctx)?;
        stage_d::run(graph, &mut ctx)?;
        stage_e::run(graph, &mut ctx)?;
        if self.enable_tree_shaping {
            stage_f::run(graph, &mut ctx)?;
        }
        Ok(())
    }

    fn scope_priority_order(&self) -> Vec<String> {
        // ScopePriority only exposes `rank`; reconstruct its order by
        // ranking the conventional scope vocabulary and sorting by rank.
        let mut scopes: Vec<String> =
            ["compile", "runtime", "provided", "test", "system"].into_iter().map(String::from).collect();
        scopes.sort_by_key(|s| self.scope_priority.rank(s));
        scopes
    }
}

/// Walks every node in the tree (pre-order), calling `f` on each. Safe to
/// mutate node fields from within `f`, but not to reach into `children`
/// through anything other than the `node` argument `f` receives.
pub(crate) fn walk_mut(node: &mut DependencyNode, f: &mut impl FnMut(&mut DependencyNode, usize, usize), depth: usize, order: &mut usize) {
    f(node, depth, *order);
    *order += 1;
    for child in node.children_mut() {
        walk_mut(child, f, depth + 1, order);
    }
}

pub(crate) fn walk(node: &DependencyNode, f: &mut impl FnMut(&DependencyNode, usize), depth: usize) {
    f(node, depth);
    for child in node.children.iter() {
        walk(child, f, depth + 1);
    }
}

pub(crate) fn artifact_excluded_by(exclusions: &std::collections::BTreeSet<Exclusion>, artifact: &Artifact) -> bool {
    exclusions.iter().any(|e| e.matches(artifact))
}
