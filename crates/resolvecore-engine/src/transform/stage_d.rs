//! Stage D — exclusion propagation.
//!
//! Top-down: each node inherits its parent's accumulated exclusion set and
//! adds its own declared exclusions before handing the union to its
//! children. A child whose artifact matches the accumulated set is pruned
//! outright (no reparenting to another reachable path).

use std::collections::BTreeSet;

use resolvecore_model::Exclusion;

use super::{artifact_excluded_by, DirtyGraph, TransformContext};
use crate::error::ResolverError;
use crate::node::DependencyNode;

pub fn run(graph: &mut DirtyGraph, _ctx: &mut TransformContext) -> Result<(), ResolverError> {
    prune(&mut graph.root, &BTreeSet::new());
    Ok(())
}

fn prune(node: &mut DependencyNode, inherited: &BTreeSet<Exclusion>) {
    let mut accumulated = inherited.clone();
    if let Some(dep) = &node.dependency {
        accumulated.extend(dep.exclusions.iter().cloned());
    }

    if accumulated.is_empty() {
        for child in node.children_mut() {
            prune(child, &accumulated);
        }
        return;
    }

    let retained: Vec<DependencyNode> = node
        .children
        .iter()
        .filter(|child| !artifact_excluded_by(&accumulated, &child.artifact))
        .cloned()
        .collect();
    *node.children_mut() = retained;
    for child in node.children_mut() {
        prune(child, &accumulated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolvecore_model::{Artifact, Dependency, Exclusion};

    #[test]
    fn excluded_direct_child_is_pruned() {
        let dep = Dependency::new(Artifact::new("app", "root", "1.0"))
            .with_exclusions(std::collections::BTreeSet::from([Exclusion::new("g", "bad")]));
        let mut root = DependencyNode::from_dependency(dep);
        *root.children_mut() = vec![
            DependencyNode::from_dependency(Dependency::new(Artifact::new("g", "bad", "1.0"))),
            DependencyNode::from_dependency(Dependency::new(Artifact::new("g", "good", "1.0"))),
        ];

        let mut graph = DirtyGraph { root, cycles: Vec::new() };
        run(&mut graph, &mut TransformContext::new()).unwrap();

        assert_eq!(graph.root.children.len(), 1);
        assert_eq!(graph.root.children[0].artifact.artifact_id, "good");
    }

    #[test]
    fn exclusion_propagates_to_grandchildren() {
        let dep = Dependency::new(Artifact::new("app", "root", "1.0"))
            .with_exclusions(std::collections::BTreeSet::from([Exclusion::all()]));
        let mut root = DependencyNode::from_dependency(dep);
        let mut mid =
            DependencyNode::from_dependency(Dependency::new(Artifact::new("g", "mid", "1.0")));
        *mid.children_mut() =
            vec![DependencyNode::from_dependency(Dependency::new(Artifact::new("g", "leaf", "1.0")))];
        *root.children_mut() = vec![mid];

        let mut graph = DirtyGraph { root, cycles: Vec::new() };
        run(&mut graph, &mut TransformContext::new()).unwrap();

        // `root` itself is never filtered by its own exclusions, only its
        // descendants; `mid`'s only child matches the universal exclusion.
        assert_eq!(graph.root.children.len(), 1);
        assert!(graph.root.children[0].children.is_empty());
    }
}
