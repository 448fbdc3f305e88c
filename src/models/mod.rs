use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub(crate) type MenuId = i64;

/// One menu entry.
///
/// `children` is derived from the flat `parentId` relation (or accepted
/// as-is from an already-nested response); the flat relation stays the
/// source of truth. Wire keys are camelCase (`parentId`, `orderNo`).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MenuRecord {
    pub id: MenuId,

    /// Absent means root. Never a `0` sentinel (see `build_forest`).
    #[serde(default)]
    pub parent_id: Option<MenuId>,

    pub name: String,

    /// Absent means a non-navigable grouping node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Sibling sort key; ties keep arrival order.
    #[serde(default)]
    pub order_no: i64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuRecord>,
}

fn sort_siblings(nodes: &mut [MenuRecord]) {
    // sort_by_key is stable: equal orderNo keeps the collaborator's order.
    nodes.sort_by_key(|n| n.order_no);
}

/// Ids of every node that sits on a parent-chain cycle in the raw relation.
fn cycle_members(nodes: &[MenuRecord]) -> HashSet<MenuId> {
    let parent: HashMap<MenuId, MenuId> = nodes
        .iter()
        .filter_map(|n| n.parent_id.map(|p| (n.id, p)))
        .collect();

    let mut members: HashSet<MenuId> = HashSet::new();
    for n in nodes {
        let mut path: Vec<MenuId> = vec![];
        let mut cur = n.id;
        loop {
            if let Some(pos) = path.iter().position(|&x| x == cur) {
                members.extend(path[pos..].iter().copied());
                break;
            }
            path.push(cur);
            match parent.get(&cur) {
                Some(&p) => cur = p,
                None => break,
            }
        }
    }
    members
}

fn normalize_nested(nodes: &mut Vec<MenuRecord>, parent: Option<MenuId>) {
    for n in nodes.iter_mut() {
        n.parent_id = parent;
        let id = n.id;
        normalize_nested(&mut n.children, Some(id));
    }
    sort_siblings(nodes);
}

/// Materialize the forest from a collaborator response (flat or nested).
///
/// Invariants guaranteed on the result:
/// - every `parent_id` resolves to a present node, or is absent (root);
/// - sibling groups are sorted by `order_no`, stable on ties.
///
/// A flat `parent_id` that does not resolve (unknown id, self-reference,
/// the legacy `0` sentinel when no record with id 0 exists, or a member of
/// a cycle in the raw relation) is cleared and the node surfaces as a
/// root. Nothing is dropped.
pub(crate) fn build_forest(records: Vec<MenuRecord>) -> Vec<MenuRecord> {
    if records.iter().any(|r| !r.children.is_empty()) {
        // Already nested: re-link and re-sort, trust the nesting.
        let mut roots = records;
        normalize_nested(&mut roots, None);
        return roots;
    }

    let known: HashSet<MenuId> = records.iter().map(|r| r.id).collect();
    let cyclic = cycle_members(&records);

    let mut nodes = records;
    for n in nodes.iter_mut() {
        if let Some(p) = n.parent_id {
            if p == n.id || !known.contains(&p) || cyclic.contains(&n.id) {
                n.parent_id = None;
            }
        }
    }

    let mut children_of: HashMap<MenuId, Vec<MenuRecord>> = HashMap::new();
    let mut roots: Vec<MenuRecord> = vec![];
    for n in nodes {
        match n.parent_id {
            Some(p) => children_of.entry(p).or_default().push(n),
            None => roots.push(n),
        }
    }

    fn attach(node: &mut MenuRecord, children_of: &mut HashMap<MenuId, Vec<MenuRecord>>) {
        if let Some(mut kids) = children_of.remove(&node.id) {
            for k in kids.iter_mut() {
                attach(k, children_of);
            }
            sort_siblings(&mut kids);
            node.children = kids;
        }
    }

    for r in roots.iter_mut() {
        attach(r, &mut children_of);
    }
    sort_siblings(&mut roots);
    roots
}

pub(crate) fn find_menu<'a>(forest: &'a [MenuRecord], id: MenuId) -> Option<&'a MenuRecord> {
    for n in forest {
        if n.id == id {
            return Some(n);
        }
        if let Some(hit) = find_menu(&n.children, id) {
            return Some(hit);
        }
    }
    None
}

pub(crate) fn contains_id(forest: &[MenuRecord], id: MenuId) -> bool {
    find_menu(forest, id).is_some()
}

/// Ids strictly below `id` (the node itself is not its own descendant).
pub(crate) fn descendant_ids(forest: &[MenuRecord], id: MenuId) -> HashSet<MenuId> {
    fn collect(node: &MenuRecord, out: &mut HashSet<MenuId>) {
        for c in &node.children {
            out.insert(c.id);
            collect(c, out);
        }
    }

    let mut out = HashSet::new();
    if let Some(n) = find_menu(forest, id) {
        collect(n, &mut out);
    }
    out
}

/// Would reparenting `id` under `new_parent` make `id` its own ancestor?
pub(crate) fn would_create_cycle(
    forest: &[MenuRecord],
    id: MenuId,
    new_parent: Option<MenuId>,
) -> bool {
    match new_parent {
        None => false,
        Some(p) => p == id || descendant_ids(forest, id).contains(&p),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ParentChoice {
    pub id: MenuId,
    pub name: String,
    pub depth: usize,
}

/// Valid reparent targets, pre-order with depth for indented labels.
///
/// When `exclude` names a node, that node and its whole subtree are left
/// out, so the picker can never offer a choice that would form a cycle.
pub(crate) fn parent_choices(forest: &[MenuRecord], exclude: Option<MenuId>) -> Vec<ParentChoice> {
    fn walk(
        nodes: &[MenuRecord],
        depth: usize,
        exclude: Option<MenuId>,
        out: &mut Vec<ParentChoice>,
    ) {
        for n in nodes {
            if exclude == Some(n.id) {
                continue;
            }
            out.push(ParentChoice {
                id: n.id,
                name: n.name.clone(),
                depth,
            });
            walk(&n.children, depth + 1, exclude, out);
        }
    }

    let mut out = vec![];
    walk(forest, 0, exclude, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(id: MenuId, parent_id: Option<MenuId>, name: &str, order_no: i64) -> MenuRecord {
        MenuRecord {
            id,
            parent_id,
            name: name.to_string(),
            url: None,
            order_no,
            children: vec![],
        }
    }

    #[test]
    fn test_flat_list_builds_sorted_forest() {
        let forest = build_forest(vec![
            flat(3, Some(1), "Reports", 1),
            flat(1, None, "Home", 0),
            flat(2, Some(1), "About", 0),
            flat(4, None, "Admin", 5),
        ]);

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].id, 1);
        assert_eq!(forest[1].id, 4);

        let kids: Vec<MenuId> = forest[0].children.iter().map(|c| c.id).collect();
        assert_eq!(kids, vec![2, 3]);
        assert_eq!(forest[0].children[0].parent_id, Some(1));
    }

    #[test]
    fn test_sibling_order_ties_keep_arrival_order() {
        let forest = build_forest(vec![
            flat(10, None, "b", 7),
            flat(11, None, "a", 7),
            flat(12, None, "c", 7),
        ]);
        let ids: Vec<MenuId> = forest.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }

    #[test]
    fn test_nested_input_accepted_and_normalized() {
        let mut root = flat(1, None, "Home", 0);
        root.children = vec![flat(3, None, "Late", 2), flat(2, None, "Early", 1)];

        let forest = build_forest(vec![root]);
        assert_eq!(forest.len(), 1);

        let kids: Vec<MenuId> = forest[0].children.iter().map(|c| c.id).collect();
        assert_eq!(kids, vec![2, 3]);
        // Nesting wins over whatever parentId the payload carried.
        assert!(forest[0].children.iter().all(|c| c.parent_id == Some(1)));
    }

    #[test]
    fn test_dangling_parent_promoted_to_root() {
        let forest = build_forest(vec![flat(1, None, "Home", 0), flat(2, Some(99), "Lost", 0)]);
        assert_eq!(forest.len(), 2);
        let lost = forest.iter().find(|n| n.id == 2).expect("node kept");
        assert_eq!(lost.parent_id, None);
    }

    #[test]
    fn test_zero_sentinel_parent_treated_as_root() {
        let forest = build_forest(vec![flat(1, Some(0), "Home", 0), flat(2, Some(1), "About", 0)]);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].parent_id, None);
        assert_eq!(forest[0].children[0].id, 2);
    }

    #[test]
    fn test_zero_parent_kept_when_id_zero_is_issued() {
        let forest = build_forest(vec![flat(0, None, "Root", 0), flat(1, Some(0), "Child", 0)]);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].id, 0);
        assert_eq!(forest[0].children[0].parent_id, Some(0));
    }

    #[test]
    fn test_cyclic_input_promoted_to_roots() {
        // 1 -> 2 -> 1 in the raw relation; 3 hangs below the cycle.
        let forest = build_forest(vec![
            flat(1, Some(2), "a", 0),
            flat(2, Some(1), "b", 0),
            flat(3, Some(2), "c", 0),
        ]);

        assert_eq!(forest.len(), 2);
        assert!(forest.iter().all(|n| n.parent_id.is_none()));
        let b = forest.iter().find(|n| n.id == 2).expect("cycle member kept");
        assert_eq!(b.children[0].id, 3);
    }

    #[test]
    fn test_descendant_ids_deep() {
        let forest = build_forest(vec![
            flat(1, None, "a", 0),
            flat(2, Some(1), "b", 0),
            flat(3, Some(2), "c", 0),
            flat(4, Some(3), "d", 0),
            flat(5, None, "e", 0),
        ]);

        let ds = descendant_ids(&forest, 1);
        assert_eq!(ds, HashSet::from([2, 3, 4]));
        assert!(descendant_ids(&forest, 4).is_empty());
    }

    #[test]
    fn test_cycle_validator_rejects_self_and_descendants() {
        // Chain 1 -> 2 -> ... -> 6, then try to hang 1 below every depth.
        let mut records = vec![flat(1, None, "n1", 0)];
        for id in 2..=6 {
            records.push(flat(id, Some(id - 1), &format!("n{id}"), 0));
        }
        let forest = build_forest(records);

        assert!(would_create_cycle(&forest, 1, Some(1)));
        for target in 2..=6 {
            assert!(would_create_cycle(&forest, 1, Some(target)));
        }
        // The other direction is fine: a leaf can move to the top.
        assert!(!would_create_cycle(&forest, 6, Some(1)));
        assert!(!would_create_cycle(&forest, 6, None));
    }

    #[test]
    fn test_parent_choices_exclude_subtree() {
        let forest = build_forest(vec![
            flat(1, None, "a", 0),
            flat(2, Some(1), "b", 0),
            flat(3, Some(2), "c", 0),
            flat(4, None, "d", 1),
        ]);

        let all: Vec<MenuId> = parent_choices(&forest, None).iter().map(|c| c.id).collect();
        assert_eq!(all, vec![1, 2, 3, 4]);

        let without_b: Vec<MenuId> =
            parent_choices(&forest, Some(2)).iter().map(|c| c.id).collect();
        assert_eq!(without_b, vec![1, 4]);

        let depths: Vec<usize> = parent_choices(&forest, None).iter().map(|c| c.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_record_parses_with_absent_optionals() {
        let json = r#"{"id": 7, "name": "Docs", "orderNo": 3}"#;
        let parsed: MenuRecord = serde_json::from_str(json).expect("record should parse");
        assert_eq!(parsed.id, 7);
        assert_eq!(parsed.parent_id, None);
        assert_eq!(parsed.url, None);
        assert_eq!(parsed.order_no, 3);
        assert!(parsed.children.is_empty());
    }
}
