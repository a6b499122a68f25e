//! Plain-text rendering of the normalized taxonomy.
//!
//! Works off the synced payloads alone, so it can print a tree from a
//! reopened database without rebuilding the in-memory graph. Synonyms are
//! listed beneath their accepted taxon with an "=" marker.

use std::collections::{BTreeMap, HashSet};

use clade_graph::NodeId;

use crate::error::Result;
use crate::store::PayloadStore;
use crate::types::NameUsage;

/// Render the whole taxonomy as an indented text tree.
pub fn render_tree(payloads: &PayloadStore) -> Result<String> {
    let usages: BTreeMap<NodeId, NameUsage> = payloads.load_all()?.into_iter().collect();

    let mut children: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    let mut synonyms: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    let mut roots: Vec<NodeId> = Vec::new();
    for (id, usage) in &usages {
        if usage.is_synonym() || !usage.accepted_ids.is_empty() {
            for accepted in &usage.accepted_ids {
                synonyms.entry(*accepted).or_default().push(*id);
            }
            continue;
        }
        match usage.parent_id {
            Some(parent) => children.entry(parent).or_default().push(*id),
            None => roots.push(*id),
        }
    }
    let by_name = |ids: &mut Vec<NodeId>| {
        ids.sort_by(|a, b| label(&usages, *a).cmp(&label(&usages, *b)));
    };
    by_name(&mut roots);
    for ids in children.values_mut() {
        by_name(ids);
    }
    for ids in synonyms.values_mut() {
        by_name(ids);
    }

    let mut out = String::new();
    let mut visited = HashSet::new();
    for root in roots {
        write_node(&mut out, &usages, &children, &synonyms, root, 0, &mut visited);
    }
    Ok(out)
}

fn write_node(
    out: &mut String,
    usages: &BTreeMap<NodeId, NameUsage>,
    children: &BTreeMap<NodeId, Vec<NodeId>>,
    synonyms: &BTreeMap<NodeId, Vec<NodeId>>,
    node: NodeId,
    depth: usize,
    visited: &mut HashSet<NodeId>,
) {
    if !visited.insert(node) {
        return;
    }
    let indent = "  ".repeat(depth);
    out.push_str(&indent);
    out.push_str(&label(usages, node));
    if let Some(rank) = usages.get(&node).and_then(|u| u.name.rank) {
        out.push_str(" [");
        out.push_str(rank.as_str());
        out.push(']');
    }
    out.push('\n');
    if let Some(syns) = synonyms.get(&node) {
        for syn in syns {
            out.push_str(&indent);
            out.push_str("  = ");
            out.push_str(&label(usages, *syn));
            out.push('\n');
        }
    }
    if let Some(kids) = children.get(&node) {
        for kid in kids {
            write_node(out, usages, children, synonyms, *kid, depth + 1, visited);
        }
    }
}

fn label(usages: &BTreeMap<NodeId, NameUsage>, id: NodeId) -> String {
    usages
        .get(&id)
        .and_then(|u| u.name.scientific_name.clone())
        .unwrap_or_else(|| "?".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Name;
    use crate::store::GraphStore;
    use crate::types::TaxonomicStatus;
    use clade_graph::Rank;

    fn usage(store: &mut GraphStore, name: &str, rank: Rank, status: TaxonomicStatus) -> NodeId {
        let mut n = Name::default();
        n.scientific_name = Some(name.to_string());
        n.rank = Some(rank);
        let mut u = NameUsage::new(n);
        u.status = Some(status);
        store.create_usage(&u).unwrap()
    }

    #[test]
    fn renders_hierarchy_and_synonyms() {
        let mut store = GraphStore::in_memory().unwrap();
        let family = usage(&mut store, "Pinaceae", Rank::Family, TaxonomicStatus::Accepted);
        let abies = usage(&mut store, "Abies", Rank::Genus, TaxonomicStatus::Accepted);
        let alba = usage(&mut store, "Abies alba", Rank::Species, TaxonomicStatus::Accepted);
        let syn = usage(
            &mut store,
            "Pinus picea",
            Rank::Species,
            TaxonomicStatus::Synonym,
        );
        store.assign_parent(family, abies).unwrap();
        store.assign_parent(abies, alba).unwrap();
        store.create_synonym_rel(syn, alba).unwrap();
        store.sync_relations(100).unwrap();

        let tree = render_tree(store.payloads()).unwrap();
        assert_eq!(
            tree,
            "Pinaceae [family]\n\
             \x20 Abies [genus]\n\
             \x20   Abies alba [species]\n\
             \x20     = Pinus picea\n"
        );
    }

    #[test]
    fn roots_are_sorted_by_name() {
        let mut store = GraphStore::in_memory().unwrap();
        usage(&mut store, "Zygophyllaceae", Rank::Family, TaxonomicStatus::Accepted);
        usage(&mut store, "Asteraceae", Rank::Family, TaxonomicStatus::Accepted);
        store.sync_relations(100).unwrap();

        let tree = render_tree(store.payloads()).unwrap();
        let lines: Vec<&str> = tree.lines().collect();
        assert_eq!(lines, vec!["Asteraceae [family]", "Zygophyllaceae [family]"]);
    }

    #[test]
    fn stale_parent_loops_do_not_hang_the_renderer() {
        let mut store = GraphStore::in_memory().unwrap();
        let a = usage(&mut store, "Aus", Rank::Genus, TaxonomicStatus::Accepted);
        let b = usage(&mut store, "Bus", Rank::Genus, TaxonomicStatus::Accepted);
        // write contradictory payload references directly
        store.update(a, |u| u.parent_id = None).unwrap();
        store
            .update(b, |u| {
                u.parent_id = Some(a);
            })
            .unwrap();
        store.update(a, |u| u.parent_id = Some(b)).unwrap();

        let tree = render_tree(store.payloads()).unwrap();
        // no root exists, nothing rendered, but no infinite loop either
        assert_eq!(tree, "");
    }
}
