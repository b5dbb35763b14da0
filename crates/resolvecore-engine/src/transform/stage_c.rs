//! Stage C — scope and optional-flag selection.
//!
//! Per conflict group, the widest (highest-priority) scope across every
//! occurrence wins, and the group is optional only if every occurrence
//! declared it optional. Applied uniformly to every node sharing the
//! group id, matching Maven's "nearest definition wins, but a non-optional
//! declaration anywhere makes the whole group non-optional" behavior.

use std::collections::BTreeMap;

use super::{walk_mut, DirtyGraph, TransformContext};
use crate::error::ResolverError;
use crate::node::ManagedBits;

struct Selection {
    scope: String,
    optional: bool,
}

pub fn run(graph: &mut DirtyGraph, ctx: &mut TransformContext) -> Result<(), ResolverError> {
    let priority: Vec<String> = match ctx.get("scope_priority") {
        Some(serde_json::Value::Array(items)) => {
            items.iter().filter_map(|v| v.as_str().map(String::from)).collect()
        }
        _ => vec!["compile".into(), "runtime".into(), "provided".into(), "test".into(), "system".into()],
    };
    let rank = |scope: &str| priority.iter().position(|s| s == scope).unwrap_or(priority.len());

    let mut groups: BTreeMap<usize, Selection> = BTreeMap::new();

    super::walk(&graph.root, &mut |node, _depth| {
        let Some(group_id) = node.conflict_group_id else { return };
        let Some(dep) = node.dependency.as_ref() else { return };
        groups
            .entry(group_id)
            .and_modify(|sel| {
                if rank(&dep.scope) < rank(&sel.scope) {
                    sel.scope = dep.scope.clone();
                }
                sel.optional = sel.optional && dep.optional;
            })
            .or_insert_with(|| Selection { scope: dep.scope.clone(), optional: dep.optional });
    });

    let mut order = 0usize;
    walk_mut(
        &mut graph.root,
        &mut |node, _depth, _order| {
            let Some(group_id) = node.conflict_group_id else { return };
            let Some(selection) = groups.get(&group_id) else { return };
            let Some(dep) = node.dependency.clone() else { return };
            let scope_changed = dep.scope != selection.scope;
            let optional_changed = dep.optional != selection.optional;
            if scope_changed {
                node.managed_bits |= ManagedBits::SCOPE;
            }
            if optional_changed {
                node.managed_bits |= ManagedBits::OPTIONAL;
            }
            node.dependency =
                Some(dep.with_scope(selection.scope.clone()).with_optional(selection.optional));
        },
        0,
        &mut order,
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::DependencyNode;
    use crate::transform::stage_a;
    use resolvecore_model::{Artifact, Dependency};

    #[test]
    fn widest_scope_across_occurrences_wins() {
        let compile_dep = Dependency::new(Artifact::new("g", "lib", "1.0")).with_scope("compile");
        let test_dep = Dependency::new(Artifact::new("g", "lib", "1.0")).with_scope("test");

        let mut root = DependencyNode::root_label(Artifact::new("app", "app", "1.0"));
        *root.children_mut() = vec![
            DependencyNode::from_dependency(test_dep),
            DependencyNode::from_dependency(compile_dep),
        ];

        let mut graph = DirtyGraph { root, cycles: Vec::new() };
        stage_a::run(&mut graph, &mut TransformContext::new()).unwrap();
        let mut ctx = TransformContext::new();
        ctx.set(
            "scope_priority",
            serde_json::Value::Array(
                vec!["compile", "runtime", "provided", "test", "system"]
                    .into_iter()
                    .map(|s| serde_json::Value::String(s.to_string()))
                    .collect(),
            ),
        );
        run(&mut graph, &mut ctx).unwrap();

        for child in graph.root.children.iter() {
            assert_eq!(child.dependency.as_ref().unwrap().scope, "compile");
        }
    }

    #[test]
    fn group_is_optional_only_if_all_occurrences_are() {
        let a = Dependency::new(Artifact::new("g", "lib", "1.0")).with_optional(true);
        let b = Dependency::new(Artifact::new("g", "lib", "1.0")).with_optional(false);

        let mut root = DependencyNode::root_label(Artifact::new("app", "app", "1.0"));
        *root.children_mut() =
            vec![DependencyNode::from_dependency(a), DependencyNode::from_dependency(b)];

        let mut graph = DirtyGraph { root, cycles: Vec::new() };
        stage_a::run(&mut graph, &mut TransformContext::new()).unwrap();
        run(&mut graph, &mut TransformContext::new()).unwrap();

        for child in graph.root.children.iter() {
            assert!(!child.dependency.as_ref().unwrap().optional);
        }
    }
}
