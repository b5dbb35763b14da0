//! Stage A — conflict-group identification.
//!
//! Groups nodes by conflict key `(group, artifact, classifier, extension)`
//! augmented by declared aliases, and attaches the resulting
//! `conflict_group_id` to each node.

use std::collections::BTreeMap;

use resolvecore_model::ConflictKey;

use super::{walk_mut, DirtyGraph, TransformContext};
use crate::error::ResolverError;

pub fn run(graph: &mut DirtyGraph, _ctx: &mut TransformContext) -> Result<(), ResolverError> {
    let mut registry: BTreeMap<ConflictKey, usize> = BTreeMap::new();
    let mut next_id = 0usize;
    let mut order = 0usize;

    walk_mut(
        &mut graph.root,
        &mut |node, _depth, _order| {
            let primary = node.conflict_key();
            let id = *registry.entry(primary).or_insert_with(|| {
                let id = next_id;
                next_id += 1;
                id
            });
            // Aliases fold into the same group: any alias already seen
            // adopts that group's id instead of minting a new one.
            let mut id = id;
            for alias in &node.aliases {
                let alias_key = alias.conflict_key();
                if let Some(existing) = registry.get(&alias_key) {
                    id = *existing;
                } else {
                    registry.insert(alias_key, id);
                }
            }
            node.conflict_group_id = Some(id);
        },
        0,
        &mut order,
    );

    Ok(())
}
