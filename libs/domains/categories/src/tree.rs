//! Pure planning over one channel's live categories.
//!
//! Repositories load the sibling groups under a lock, ask these functions what
//! has to change and persist only the returned moves. Nothing here touches
//! storage, so both repositories share the exact same tree rules.
//!
//! Invariants kept by every plan:
//! - each sibling group `(channel, parent)` is numbered `base, base + 1, ...`
//! - no category becomes its own ancestor

use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

use crate::models::{Category, CategoryNode, ChildrenStrategy, NestedCategory};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("no siblings given")]
    EmptySiblings,
    #[error("sibling listed more than once")]
    DuplicateSibling,
    #[error("unknown category {0}")]
    Unknown(i64),
    #[error("move would create a cycle")]
    Cycle,
    #[error("category {0} has children")]
    HasChildren(i64),
    #[error("last root of the channel")]
    LastRoot,
}

/// Position and parent linkage of one live category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub id: i64,
    pub parent: Option<i64>,
    pub position: i32,
}

impl From<&Category> for Slot {
    fn from(category: &Category) -> Self {
        Self {
            id: category.key,
            parent: category.parent_key,
            position: category.position,
        }
    }
}

/// New parent and position for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub id: i64,
    pub parent: Option<i64>,
    pub position: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletePlan {
    /// Categories to soft delete, the target first
    pub trash: Vec<i64>,
    pub moves: Vec<Move>,
}

/// Sibling groups keyed by parent, each ordered by `(position, id)`
fn groups(slots: &[Slot]) -> HashMap<Option<i64>, Vec<Slot>> {
    let mut groups: HashMap<Option<i64>, Vec<Slot>> = HashMap::new();
    for slot in slots {
        groups.entry(slot.parent).or_default().push(*slot);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|s| (s.position, s.id));
    }
    groups
}

/// Number `ordered` densely under `parent`, keeping only real changes
fn renumber(
    ordered: &[i64],
    parent: Option<i64>,
    base: i32,
    current: &HashMap<i64, Slot>,
    moves: &mut Vec<Move>,
) {
    for (index, id) in ordered.iter().enumerate() {
        let position = base + index as i32;
        let unchanged = current
            .get(id)
            .is_some_and(|s| s.parent == parent && s.position == position);
        if !unchanged {
            moves.push(Move {
                id: *id,
                parent,
                position,
            });
        }
    }
}

/// Position of a category appended to the group of `parent`
pub fn next_position(slots: &[Slot], parent: Option<i64>, base: i32) -> i32 {
    base + slots.iter().filter(|s| s.parent == parent).count() as i32
}

/// Every category below `id`, breadth first
pub fn descendants(slots: &[Slot], id: i64) -> Vec<i64> {
    let groups = groups(slots);
    let mut found = Vec::new();
    let mut queue = vec![id];
    while let Some(current) = queue.pop() {
        if let Some(children) = groups.get(&Some(current)) {
            for child in children {
                found.push(child.id);
                queue.insert(0, child.id);
            }
        }
    }
    found
}

/// Rewrite the group of `parent` so `siblings` come first, in order.
///
/// Listed categories moving in from another group leave a gap there, which
/// is closed by renumbering that group as well.
pub fn plan_reorder(
    slots: &[Slot],
    parent: Option<i64>,
    siblings: &[i64],
    base: i32,
) -> Result<Vec<Move>, TreeError> {
    if siblings.is_empty() {
        return Err(TreeError::EmptySiblings);
    }
    let listed: HashSet<i64> = siblings.iter().copied().collect();
    if listed.len() != siblings.len() {
        return Err(TreeError::DuplicateSibling);
    }

    let current: HashMap<i64, Slot> = slots.iter().map(|s| (s.id, *s)).collect();
    for id in siblings.iter().chain(parent.iter()) {
        if !current.contains_key(id) {
            return Err(TreeError::Unknown(*id));
        }
    }

    // walk up from the new parent; meeting a listed node means a cycle
    let mut ancestor = parent;
    while let Some(id) = ancestor {
        if listed.contains(&id) {
            return Err(TreeError::Cycle);
        }
        ancestor = current.get(&id).and_then(|s| s.parent);
    }

    let groups = groups(slots);
    let mut moves = Vec::new();

    let mut target: Vec<i64> = siblings.to_vec();
    if let Some(existing) = groups.get(&parent) {
        target.extend(existing.iter().map(|s| s.id).filter(|id| !listed.contains(id)));
    }
    renumber(&target, parent, base, &current, &mut moves);

    let mut left: Vec<Option<i64>> = siblings
        .iter()
        .filter_map(|id| current.get(id))
        .map(|s| s.parent)
        .filter(|p| *p != parent)
        .collect();
    left.sort();
    left.dedup();

    for old_parent in left {
        let remaining: Vec<i64> = groups
            .get(&old_parent)
            .map(|g| g.iter().map(|s| s.id).filter(|id| !listed.contains(id)).collect())
            .unwrap_or_default();
        renumber(&remaining, old_parent, base, &current, &mut moves);
    }

    Ok(moves)
}

/// Soft delete `id` and decide what happens to its children.
pub fn plan_delete(
    slots: &[Slot],
    id: i64,
    strategy: ChildrenStrategy,
    base: i32,
) -> Result<DeletePlan, TreeError> {
    let current: HashMap<i64, Slot> = slots.iter().map(|s| (s.id, *s)).collect();
    let target = *current.get(&id).ok_or(TreeError::Unknown(id))?;
    let groups = groups(slots);

    let children: Vec<i64> = groups
        .get(&Some(id))
        .map(|g| g.iter().map(|s| s.id).collect())
        .unwrap_or_default();
    let siblings: Vec<i64> = groups
        .get(&target.parent)
        .map(|g| g.iter().map(|s| s.id).collect())
        .unwrap_or_default();

    let mut plan = DeletePlan {
        trash: vec![id],
        moves: Vec::new(),
    };

    let group_after: Vec<i64> = match strategy {
        ChildrenStrategy::Forbid => {
            if !children.is_empty() {
                return Err(TreeError::HasChildren(id));
            }
            siblings.into_iter().filter(|s| *s != id).collect()
        }
        ChildrenStrategy::Cascade => {
            plan.trash.extend(descendants(slots, id));
            siblings.into_iter().filter(|s| *s != id).collect()
        }
        ChildrenStrategy::Reparent => siblings
            .into_iter()
            .flat_map(|s| if s == id { children.clone() } else { vec![s] })
            .collect(),
    };

    if target.parent.is_none() && group_after.is_empty() {
        return Err(TreeError::LastRoot);
    }

    renumber(&group_after, target.parent, base, &current, &mut plan.moves);
    Ok(plan)
}

/// Nest live categories under their parents, siblings ordered by position.
///
/// Categories whose parent is not in `categories` are dropped along with
/// their subtree.
pub fn build_tree(categories: Vec<Category>) -> Vec<CategoryNode> {
    let mut by_parent: BTreeMap<Option<i64>, Vec<Category>> = BTreeMap::new();
    for category in categories {
        by_parent.entry(category.parent_key).or_default().push(category);
    }
    for group in by_parent.values_mut() {
        group.sort_by_key(|c| (c.position, c.key));
    }

    fn attach(
        parent: Option<i64>,
        by_parent: &mut BTreeMap<Option<i64>, Vec<Category>>,
    ) -> Vec<CategoryNode> {
        by_parent
            .remove(&parent)
            .unwrap_or_default()
            .into_iter()
            .map(|category| {
                let children = attach(Some(category.key), by_parent);
                CategoryNode { category, children }
            })
            .collect()
    }

    attach(None, &mut by_parent)
}

/// Depth-first listing of a tree
pub fn flatten_nested(tree: Vec<CategoryNode>) -> Vec<NestedCategory> {
    fn walk(nodes: Vec<CategoryNode>, depth: usize, out: &mut Vec<NestedCategory>) {
        for node in nodes {
            out.push(NestedCategory {
                category: node.category,
                depth,
            });
            walk(node.children, depth + 1, out);
        }
    }

    let mut out = Vec::new();
    walk(tree, 0, &mut out);
    out
}

/// Apply `moves` to `slots`, for checking plans
pub fn apply(slots: &mut [Slot], moves: &[Move]) {
    for m in moves {
        if let Some(slot) = slots.iter_mut().find(|s| s.id == m.id) {
            slot.parent = m.parent;
            slot.position = m.position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::{AuditFields, now_utc};

    fn slot(id: i64, parent: Option<i64>, position: i32) -> Slot {
        Slot {
            id,
            parent,
            position,
        }
    }

    /// roots 1,2,3; 1 -> (4, 5); 4 -> 6
    fn sample() -> Vec<Slot> {
        vec![
            slot(1, None, 0),
            slot(2, None, 1),
            slot(3, None, 2),
            slot(4, Some(1), 0),
            slot(5, Some(1), 1),
            slot(6, Some(4), 0),
        ]
    }

    fn group(slots: &[Slot], parent: Option<i64>) -> Vec<(i64, i32)> {
        let mut g: Vec<_> = slots
            .iter()
            .filter(|s| s.parent == parent)
            .map(|s| (s.id, s.position))
            .collect();
        g.sort_by_key(|(_, p)| *p);
        g
    }

    fn assert_all_dense(slots: &[Slot], base: i32) {
        let parents: HashSet<Option<i64>> = slots.iter().map(|s| s.parent).collect();
        for parent in parents {
            let positions: Vec<i32> = group(slots, parent).into_iter().map(|(_, p)| p).collect();
            let expected: Vec<i32> = (0..positions.len() as i32).map(|i| base + i).collect();
            assert_eq!(positions, expected, "group {:?}", parent);
        }
    }

    #[test]
    fn moving_last_root_to_front_shifts_the_others() {
        let mut slots = sample();
        let moves = plan_reorder(&slots, None, &[3], 0).unwrap();
        apply(&mut slots, &moves);

        assert_eq!(group(&slots, None), vec![(3, 0), (1, 1), (2, 2)]);
        assert_eq!(moves.len(), 3);
    }

    #[test]
    fn reparenting_closes_the_gap_left_behind() {
        let mut slots = sample();
        let moves = plan_reorder(&slots, Some(2), &[4], 0).unwrap();
        apply(&mut slots, &moves);

        assert_eq!(group(&slots, Some(2)), vec![(4, 0)]);
        assert_eq!(group(&slots, Some(1)), vec![(5, 0)]);
        // 6 travels with its parent untouched
        assert_eq!(group(&slots, Some(4)), vec![(6, 0)]);
        assert_all_dense(&slots, 0);
    }

    #[test]
    fn unlisted_children_follow_in_their_old_order() {
        let mut slots = sample();
        let moves = plan_reorder(&slots, None, &[5, 2], 1).unwrap();
        apply(&mut slots, &moves);

        assert_eq!(group(&slots, None), vec![(5, 1), (2, 2), (1, 3), (3, 4)]);
        assert_eq!(group(&slots, Some(1)), vec![(4, 1)]);
    }

    #[test]
    fn rejects_cycles() {
        let slots = sample();
        assert_eq!(plan_reorder(&slots, Some(6), &[1], 0), Err(TreeError::Cycle));
        assert_eq!(plan_reorder(&slots, Some(4), &[4], 0), Err(TreeError::Cycle));
        assert!(plan_reorder(&slots, Some(5), &[4], 0).is_ok());
    }

    #[test]
    fn rejects_bad_sibling_lists() {
        let slots = sample();
        assert_eq!(plan_reorder(&slots, None, &[], 0), Err(TreeError::EmptySiblings));
        assert_eq!(plan_reorder(&slots, None, &[1, 1], 0), Err(TreeError::DuplicateSibling));
        assert_eq!(plan_reorder(&slots, None, &[99], 0), Err(TreeError::Unknown(99)));
        assert_eq!(plan_reorder(&slots, Some(98), &[1], 0), Err(TreeError::Unknown(98)));
    }

    #[test]
    fn noop_reorder_moves_nothing() {
        let slots = sample();
        assert!(plan_reorder(&slots, None, &[1, 2, 3], 0).unwrap().is_empty());
    }

    #[test]
    fn reorder_repairs_gapped_groups() {
        let mut slots = vec![slot(1, None, 0), slot(2, None, 5), slot(3, None, 9)];
        let moves = plan_reorder(&slots, None, &[1], 0).unwrap();
        apply(&mut slots, &moves);
        assert_all_dense(&slots, 0);
    }

    #[test]
    fn forbid_refuses_parents() {
        let slots = sample();
        assert_eq!(
            plan_delete(&slots, 1, ChildrenStrategy::Forbid, 0),
            Err(TreeError::HasChildren(1))
        );

        let plan = plan_delete(&slots, 2, ChildrenStrategy::Forbid, 0).unwrap();
        assert_eq!(plan.trash, vec![2]);
        assert_eq!(plan.moves, vec![Move { id: 3, parent: None, position: 1 }]);
    }

    #[test]
    fn cascade_trashes_the_subtree() {
        let slots = sample();
        let plan = plan_delete(&slots, 1, ChildrenStrategy::Cascade, 0).unwrap();
        let mut trashed = plan.trash.clone();
        trashed.sort();
        assert_eq!(trashed, vec![1, 4, 5, 6]);
        assert_eq!(plan.trash[0], 1);
    }

    #[test]
    fn reparent_splices_children_into_the_slot() {
        let mut slots = sample();
        let plan = plan_delete(&slots, 1, ChildrenStrategy::Reparent, 0).unwrap();
        assert_eq!(plan.trash, vec![1]);

        slots.retain(|s| s.id != 1);
        apply(&mut slots, &plan.moves);
        assert_eq!(group(&slots, None), vec![(4, 0), (5, 1), (2, 2), (3, 3)]);
        assert_all_dense(&slots, 0);
    }

    #[test]
    fn last_root_cannot_be_removed() {
        let slots = vec![slot(1, None, 0), slot(2, Some(1), 0)];
        assert_eq!(
            plan_delete(&slots, 1, ChildrenStrategy::Cascade, 0),
            Err(TreeError::LastRoot)
        );
        // children take over as roots
        assert!(plan_delete(&slots, 1, ChildrenStrategy::Reparent, 0).is_ok());
        assert!(plan_delete(&slots, 2, ChildrenStrategy::Forbid, 0).is_ok());
    }

    #[test]
    fn next_position_respects_base() {
        let slots = sample();
        assert_eq!(next_position(&slots, None, 0), 3);
        assert_eq!(next_position(&slots, Some(5), 1), 1);
    }

    #[test]
    fn descendants_cover_all_levels() {
        let mut found = descendants(&sample(), 1);
        found.sort();
        assert_eq!(found, vec![4, 5, 6]);
        assert!(descendants(&sample(), 6).is_empty());
    }

    fn category(key: i64, parent: Option<i64>, position: i32) -> Category {
        Category {
            key,
            id: format!("h{}", key),
            name: BTreeMap::from([("en".to_string(), format!("c{}", key))]),
            slug: format!("c{}", key),
            parent_key: parent,
            parent_id: parent.map(|p| format!("h{}", p)),
            position,
            channel: "webstore".to_string(),
            audit: AuditFields::default(),
            created_at: now_utc(),
            updated_at: now_utc(),
            deleted_at: None,
        }
    }

    #[test]
    fn tree_and_nested_list_follow_positions() {
        let categories = vec![
            category(2, None, 1),
            category(1, None, 0),
            category(5, Some(1), 1),
            category(4, Some(1), 0),
            category(6, Some(4), 0),
            // parent missing from the set
            category(9, Some(77), 0),
        ];

        let tree = build_tree(categories);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].category.key, 1);
        assert_eq!(tree[0].children[0].category.key, 4);
        assert_eq!(tree[0].children[0].children[0].category.key, 6);

        let nested: Vec<(i64, usize)> = flatten_nested(tree)
            .into_iter()
            .map(|n| (n.category.key, n.depth))
            .collect();
        assert_eq!(nested, vec![(1, 0), (4, 1), (6, 2), (5, 1), (2, 0)]);
    }
}
