//! Hierarchy resolution from related-activity declarations.
//!
//! Type 1 names the referenced activity as the declarer's parent, type
//! 2 as its child; both normalise to a directed PARENT_OF edge. Type 3
//! declares siblings, and further siblings are inferred from children
//! sharing an explicit parent. Every edge keeps the set of activities
//! that declared (or implied) it as provenance.

use std::collections::{BTreeMap, BTreeSet};

use iatigraph_db::queries::links::{HierarchyKind, HierarchyLinkRow};
use iatigraph_db::queries::source::RelatedActivityRow;

use crate::non_empty;

const RELATION_PARENT: i64 = 1;
const RELATION_CHILD: i64 = 2;
const RELATION_SIBLING: i64 = 3;

/// Normalised (a, b) with a < b, so both declaration orders of a
/// sibling pair land on the same key. Same-activity pairs are dropped.
fn sibling_key(a: &str, b: &str) -> Option<(String, String)> {
    match a.cmp(b) {
        std::cmp::Ordering::Less => Some((a.to_string(), b.to_string())),
        std::cmp::Ordering::Greater => Some((b.to_string(), a.to_string())),
        std::cmp::Ordering::Equal => None,
    }
}

/// Compress related-activity declarations into hierarchy edges.
///
/// Parent edges come first in the output, ordered by (parent, child);
/// sibling edges follow, ordered by the normalised pair. A pair
/// declared as both type 1 and type 2 (from either side) collapses to
/// one PARENT_OF edge whose provenance lists every declarer.
pub fn compress_hierarchy(declarations: &[RelatedActivityRow]) -> Vec<HierarchyLinkRow> {
    // (parent, child) -> declaring activities
    let mut parent_child: BTreeMap<(String, String), BTreeSet<String>> = BTreeMap::new();
    let mut siblings: BTreeMap<(String, String), BTreeSet<String>> = BTreeMap::new();

    for decl in declarations {
        let (Some(declarer), Some(reference), Some(relation)) = (
            non_empty(&decl.iatiidentifier),
            non_empty(&decl.related_ref),
            decl.relation_type,
        ) else {
            continue;
        };
        match relation {
            RELATION_PARENT => {
                parent_child
                    .entry((reference.to_string(), declarer.to_string()))
                    .or_default()
                    .insert(declarer.to_string());
            }
            RELATION_CHILD => {
                parent_child
                    .entry((declarer.to_string(), reference.to_string()))
                    .or_default()
                    .insert(declarer.to_string());
            }
            RELATION_SIBLING => {
                if let Some(key) = sibling_key(declarer, reference) {
                    siblings.entry(key).or_default().insert(declarer.to_string());
                }
            }
            _ => {}
        }
    }

    // Children sharing an explicit parent are siblings; the shared
    // parent is the provenance for the inferred pair.
    let mut children_of: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (parent, child) in parent_child.keys() {
        children_of.entry(parent).or_default().insert(child);
    }
    for (parent, children) in &children_of {
        for &a in children {
            for &b in children.iter().filter(|&&b| b > a) {
                if let Some(key) = sibling_key(a, b) {
                    siblings.entry(key).or_default().insert((*parent).to_string());
                }
            }
        }
    }

    let mut edges = Vec::with_capacity(parent_child.len() + siblings.len());
    for ((parent, child), declared_by) in parent_child {
        edges.push(HierarchyLinkRow {
            source_node_id: parent,
            target_node_id: child,
            relationship_type: HierarchyKind::ParentOf,
            declared_by: declared_by.into_iter().collect(),
        });
    }
    for ((a, b), declared_by) in siblings {
        edges.push(HierarchyLinkRow {
            source_node_id: a,
            target_node_id: b,
            relationship_type: HierarchyKind::SiblingOf,
            declared_by: declared_by.into_iter().collect(),
        });
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(declarer: &str, reference: &str, relation: i64) -> RelatedActivityRow {
        RelatedActivityRow {
            iatiidentifier: Some(declarer.to_string()),
            related_ref: Some(reference.to_string()),
            relation_type: Some(relation),
        }
    }

    fn parents(edges: &[HierarchyLinkRow]) -> Vec<&HierarchyLinkRow> {
        edges
            .iter()
            .filter(|e| e.relationship_type == HierarchyKind::ParentOf)
            .collect()
    }

    fn siblings(edges: &[HierarchyLinkRow]) -> Vec<&HierarchyLinkRow> {
        edges
            .iter()
            .filter(|e| e.relationship_type == HierarchyKind::SiblingOf)
            .collect()
    }

    #[test]
    fn test_types_one_and_two_normalise_to_parent_of() {
        // CHILD declares PARENT as its parent; PARENT declares CHILD
        // as its child. Both encode the same edge.
        let edges = compress_hierarchy(&[
            decl("CHILD", "PARENT", 1),
            decl("PARENT", "CHILD", 2),
        ]);
        let p = parents(&edges);
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].source_node_id, "PARENT");
        assert_eq!(p[0].target_node_id, "CHILD");
        assert_eq!(p[0].declared_by, vec!["CHILD", "PARENT"]);
    }

    #[test]
    fn test_sibling_pair_normalised_across_declaration_order() {
        let edges = compress_hierarchy(&[decl("B", "A", 3), decl("A", "B", 3)]);
        let s = siblings(&edges);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].source_node_id, "A");
        assert_eq!(s[0].target_node_id, "B");
        assert_eq!(s[0].declared_by, vec!["A", "B"]);
    }

    #[test]
    fn test_self_sibling_dropped() {
        assert!(compress_hierarchy(&[decl("A", "A", 3)]).is_empty());
    }

    #[test]
    fn test_siblings_inferred_from_shared_parent() {
        let edges = compress_hierarchy(&[decl("C1", "P", 1), decl("C2", "P", 1)]);
        let s = siblings(&edges);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].source_node_id, "C1");
        assert_eq!(s[0].target_node_id, "C2");
        // The shared parent, not the children, vouches for the edge.
        assert_eq!(s[0].declared_by, vec!["P"]);
    }

    #[test]
    fn test_explicit_and_inferred_sibling_merge_provenance() {
        let edges = compress_hierarchy(&[
            decl("C1", "P", 1),
            decl("C2", "P", 1),
            decl("C1", "C2", 3),
        ]);
        let s = siblings(&edges);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].declared_by, vec!["C1", "P"]);
    }

    #[test]
    fn test_unknown_relation_types_ignored() {
        // Types 4 (cofunded) and 5 (third party) carry no hierarchy.
        assert!(compress_hierarchy(&[decl("A", "B", 4), decl("A", "B", 5)]).is_empty());
    }

    #[test]
    fn test_parent_edges_precede_sibling_edges() {
        let edges = compress_hierarchy(&[decl("C1", "P", 1), decl("C1", "C2", 3)]);
        assert_eq!(edges[0].relationship_type, HierarchyKind::ParentOf);
        assert_eq!(edges[1].relationship_type, HierarchyKind::SiblingOf);
    }
}
