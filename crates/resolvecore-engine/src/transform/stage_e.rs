//! Stage E — cycle finalization.
//!
//! The collector never materializes a child whose coordinates repeat an
//! ancestor's (it records a [`Cycle`](crate::node::Cycle) and stops
//! instead), so the tree handed to this stage should already be acyclic.
//! This stage re-verifies that with a defensive ancestor-stack DFS,
//! severing and recording any cycle it somehow still finds rather than
//! trusting the invariant blindly.

use resolvecore_model::ConflictKey;

use super::{DirtyGraph, TransformContext};
use crate::error::ResolverError;
use crate::node::{Cycle, DependencyNode};

pub fn run(graph: &mut DirtyGraph, _ctx: &mut TransformContext) -> Result<(), ResolverError> {
    let mut stack = vec![graph.root.conflict_key()];
    let mut found = Vec::new();
    sever(&mut graph.root, &mut stack, &mut found);
    graph.cycles.extend(found);
    Ok(())
}

fn sever(node: &mut DependencyNode, stack: &mut Vec<ConflictKey>, found: &mut Vec<Cycle>) {
    let mut kept = Vec::with_capacity(node.children.len());
    let mut severed_any = false;

    for mut child in node.children.iter().cloned() {
        let key = child.conflict_key();
        if stack.contains(&key) {
            found.push(Cycle { path: vec![child.artifact.clone()] });
            severed_any = true;
            continue;
        }
        stack.push(key);
        sever(&mut child, stack, found);
        stack.pop();
        kept.push(child);
    }

    if severed_any {
        *node.children_mut() = kept;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolvecore_model::{Artifact, Dependency};

    #[test]
    fn acyclic_tree_is_unchanged() {
        let mut root = DependencyNode::root_label(Artifact::new("app", "app", "1.0"));
        *root.children_mut() =
            vec![DependencyNode::from_dependency(Dependency::new(Artifact::new("g", "lib", "1.0")))];
        let mut graph = DirtyGraph { root, cycles: Vec::new() };
        run(&mut graph, &mut TransformContext::new()).unwrap();
        assert_eq!(graph.root.children.len(), 1);
        assert!(graph.cycles.is_empty());
    }

    #[test]
    fn defensive_pass_severs_a_stray_self_referencing_child() {
        // Constructed directly rather than through the collector, since C5
        // never produces this shape on its own.
        let mut root = DependencyNode::root_label(Artifact::new("app", "app", "1.0"));
        let child =
            DependencyNode::from_dependency(Dependency::new(Artifact::new("app", "app", "1.0")));
        *root.children_mut() = vec![child];
        let mut graph = DirtyGraph { root, cycles: Vec::new() };
        run(&mut graph, &mut TransformContext::new()).unwrap();
        assert!(graph.root.children.is_empty());
        assert_eq!(graph.cycles.len(), 1);
    }
}
