//! Stage B — version selection.
//!
//! For each conflict group, intersects every occurrence's version
//! constraint; an empty intersection is `UnsolvableVersionConflict`. The
//! nearest-depth occurrence wins (ties broken by first-declared) as long
//! as its resolved version still lies in the intersected constraint;
//! otherwise the intersected recommended version, or the highest
//! advertised version inside the intersected range, is chosen instead.

use std::collections::BTreeMap;

use resolvecore_model::{MavenVersion, VersionConstraint};

use super::{walk_mut, DirtyGraph, TransformContext};
use crate::error::ResolverError;
use crate::node::ManagedBits;

struct Occurrence {
    depth: usize,
    order: usize,
    constraint: VersionConstraint,
    resolved_version: Option<String>,
    available_versions: Vec<String>,
}

pub fn run(graph: &mut DirtyGraph, _ctx: &mut TransformContext) -> Result<(), ResolverError> {
    let mut groups: BTreeMap<usize, Vec<Occurrence>> = BTreeMap::new();
    let mut order_counter = 0usize;

    super::walk(&graph.root, &mut |node, depth| {
        let Some(group_id) = node.conflict_group_id else { return };
        let Some(constraint) = node.version_constraint.clone() else { return };
        groups.entry(group_id).or_default().push(Occurrence {
            depth,
            order: order_counter,
            constraint,
            resolved_version: node.version.clone(),
            available_versions: node.available_versions.clone(),
        });
        order_counter += 1;
    });

    let mut selections: BTreeMap<usize, String> = BTreeMap::new();

    for (group_id, occurrences) in &groups {
        if occurrences.is_empty() {
            continue;
        }
        let mut intersected = occurrences[0].constraint.clone();
        for occ in &occurrences[1..] {
            intersected = intersected.intersect(&occ.constraint);
        }
        if intersected.is_empty() {
            let paths: Vec<String> = occurrences
                .iter()
                .map(|o| format!("{} (depth {})", o.constraint, o.depth))
                .collect();
            return Err(ResolverError::UnsolvableVersionConflict {
                group: group_id.to_string(),
                paths: paths.join("; "),
            });
        }

        // Nearest-depth wins; ties broken by first-declared (lowest
        // `order`). This is Maven's mediation rule and applies whether the
        // occurrences are plain recommended versions or ranges — a diamond
        // conflict between two bare versions (e.g. util:2 vs util:1, both
        // at depth 2) is mediated by declaration order, not by picking the
        // numerically newer one.
        let mut candidates: Vec<&Occurrence> =
            occurrences.iter().filter(|o| o.resolved_version.is_some()).collect();
        candidates.sort_by_key(|o| (o.depth, o.order));
        let winner_version = candidates.first().and_then(|o| o.resolved_version.clone());

        // Only the `Ranges` arm clamps the nearest-wins winner into the
        // intersected constraint (spec step 4: the chosen version "must
        // lie inside the intersected range"). A `Recommended` intersection
        // (spec step 3) is just a narrowed set of acceptable versions, not
        // itself the winner — two bare recommended versions at equal depth
        // are still mediated by declaration order, not by which one
        // `intersect` happened to keep.
        let selected = match &intersected {
            VersionConstraint::Ranges(_) => match winner_version {
                Some(v) if intersected.contains(&MavenVersion::parse(&v)) => v,
                _ => {
                    // The nearest-wins candidate falls outside the
                    // intersected range: fall back to the highest
                    // advertised version that still satisfies it.
                    let mut all_available: Vec<String> = occurrences
                        .iter()
                        .flat_map(|o| o.available_versions.iter().cloned())
                        .collect();
                    all_available.sort_by(|a, b| MavenVersion::parse(a).cmp(&MavenVersion::parse(b)));
                    all_available
                        .into_iter()
                        .rev()
                        .find(|v| intersected.contains(&MavenVersion::parse(v)))
                        .ok_or_else(|| ResolverError::UnsolvableVersionConflict {
                            group: group_id.to_string(),
                            paths: format!("no advertised version satisfies {intersected}"),
                        })?
                }
            },
            VersionConstraint::Recommended(v) => winner_version.unwrap_or_else(|| v.original.clone()),
            VersionConstraint::Empty => unreachable!("handled above"),
        };
        selections.insert(*group_id, selected);
    }

    let mut order = 0usize;
    walk_mut(
        &mut graph.root,
        &mut |node, _depth, _order| {
            let Some(group_id) = node.conflict_group_id else { return };
            let Some(selected) = selections.get(&group_id) else { return };
            let changed = node.version.as_deref() != Some(selected.as_str());
            if changed {
                node.managed_bits |= ManagedBits::VERSION;
            }
            node.artifact = node.artifact.with_version(selected.clone());
            node.version = Some(selected.clone());
        },
        0,
        &mut order,
    );

    Ok(())
}
