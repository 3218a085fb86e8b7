use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::schema::EntitySchema;

/// Order entities so every foreign-key parent precedes its children.
///
/// Ties are broken by table name, so the order is stable across runs. Parents
/// referenced but not present in `entities` are ignored.
pub fn load_order(entities: &[&'static EntitySchema]) -> Result<Vec<&'static EntitySchema>> {
    let by_name: BTreeMap<&str, &'static EntitySchema> =
        entities.iter().map(|schema| (schema.name, *schema)).collect();
    let graph = build_adjacency(&by_name);

    toposort(&graph)
        .map(|order| order.into_iter().filter_map(|name| by_name.get(name).copied()).collect())
        .map_err(|cycle| Error::Cycle(cycle.into_iter().map(str::to_string).collect()))
}

/// Edges point from referenced (parent) table to referencing (child) table.
fn build_adjacency<'a>(
    by_name: &BTreeMap<&'a str, &'static EntitySchema>,
) -> BTreeMap<&'a str, BTreeSet<&'a str>> {
    let mut graph: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for (name, schema) in by_name {
        graph.entry(*name).or_default();
        for fk in schema.foreign_keys {
            if fk.references == *name {
                // Self-references do not constrain load order across tables.
                continue;
            }
            if let Some((parent, _)) = by_name.get_key_value(fk.references) {
                graph.entry(*parent).or_default().insert(*name);
            }
        }
    }

    graph
}

fn toposort<'a>(graph: &BTreeMap<&'a str, BTreeSet<&'a str>>) -> std::result::Result<Vec<&'a str>, Vec<&'a str>> {
    let mut indegree: BTreeMap<&str, usize> = graph.keys().map(|node| (*node, 0)).collect();
    for targets in graph.values() {
        for target in targets {
            *indegree.entry(*target).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<&str> = indegree
        .iter()
        .filter_map(|(node, count)| (*count == 0).then_some(*node))
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    while let Some(node) = ready.pop_first() {
        order.push(node);
        if let Some(targets) = graph.get(node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(*target);
                    }
                }
            }
        }
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        Err(indegree
            .into_iter()
            .filter_map(|(node, count)| (count > 0).then_some(node))
            .collect())
    }
}
