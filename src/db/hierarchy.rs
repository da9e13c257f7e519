//! Reconstructing the implicit group tree from the flat, `level`-annotated
//! group sequence, and flattening it back.

use std::collections::HashMap;

use crate::db::entry::Entry;
use crate::db::group::Group;
use crate::error::HierarchyError;

/// One node of the tree rebuilt by [`reconstruct`]. Unlike [`Group`], a
/// `GroupNode` owns its children and the entries routed to it, so it only
/// ever exists as a throwaway view -- [`crate::Database`] keeps its
/// canonical state as flat lists and rebuilds this on every call to
/// `hierarchy()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNode {
    pub group: Group,
    pub children: Vec<GroupNode>,
    pub entries: Vec<Entry>,
}

/// The synthetic level-(-1) root produced by [`reconstruct`]. Its own
/// `children` are the level-0 groups; `unrouted_entries` holds entries
/// whose `group_id` did not match any group, reported rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RootNode {
    pub children: Vec<GroupNode>,
    pub unrouted_entries: Vec<Entry>,
}

/// Rebuild the group tree from `groups` (in on-disk pre-order) and route
/// `entries` to their owning group by `group_id`.
///
/// A `level` that jumps more than one deeper than the current stack top is
/// rejected as [`HierarchyError`]; a shallower or equal level pops the stack
/// until the invariant holds, which is always valid since every group is
/// compared against level -1 at the bottom of the stack. A repeated
/// `groupid` is also rejected rather than silently overwriting the earlier
/// group's entry-routing slot.
pub fn reconstruct(groups: &[Group], entries: &[Entry]) -> Result<RootNode, HierarchyError> {
    // `stack` holds (level, index-path) so each node is addressed by
    // position rather than by a borrowed reference, sidestepping the need
    // for parent back-pointers while building the tree top-down.
    let mut root = RootNode::default();
    let mut stack: Vec<(i32, Vec<usize>)> = vec![(-1, Vec::new())];
    let mut index: HashMap<u32, Vec<usize>> = HashMap::new();

    for group in groups {
        let level = group.level as i32;
        while level != stack.last().map(|(l, _)| *l + 1).unwrap_or(0) {
            if stack.len() == 1 {
                return Err(HierarchyError::Malformed(
                    crate::error::DatabaseIntegrityError::InvalidGroupLevel {
                        group_level: group.level,
                        current_level: stack.last().map(|(l, _)| *l).unwrap_or(-1),
                    },
                ));
            }
            stack.pop();
        }

        let parent_path = stack.last().map(|(_, p)| p.clone()).unwrap_or_default();
        let node = GroupNode {
            group: group.clone(),
            children: Vec::new(),
            entries: Vec::new(),
        };

        let mut child_path = parent_path.clone();
        if parent_path.is_empty() {
            root.children.push(node);
            child_path.push(root.children.len() - 1);
        } else {
            let parent = node_at_mut(&mut root, &parent_path);
            parent.children.push(node);
            child_path.push(parent.children.len() - 1);
        }

        if index.contains_key(&group.groupid) {
            return Err(HierarchyError::Malformed(
                crate::error::DatabaseIntegrityError::DuplicateGroupId(group.groupid),
            ));
        }
        index.insert(group.groupid, child_path.clone());
        stack.push((level, child_path));
    }

    for entry in entries {
        match index.get(&entry.group_id) {
            Some(path) => node_at_mut(&mut root, path).entries.push(entry.clone()),
            None => root.unrouted_entries.push(entry.clone()),
        }
    }

    Ok(root)
}

fn node_at_mut<'a>(root: &'a mut RootNode, path: &[usize]) -> &'a mut GroupNode {
    let mut node = &mut root.children[path[0]];
    for &i in &path[1..] {
        node = &mut node.children[i];
    }
    node
}

/// Depth-first pre-order traversal, inverse of [`reconstruct`]: emits each
/// node's group with `level` recomputed from tree depth, followed by every
/// entry in the same order the tree holds them.
pub fn flatten(root: &RootNode) -> (Vec<Group>, Vec<Entry>) {
    let mut groups = Vec::new();
    let mut entries = Vec::new();
    for child in &root.children {
        flatten_node(child, 0, &mut groups, &mut entries);
    }
    entries.extend(root.unrouted_entries.iter().cloned());
    (groups, entries)
}

fn flatten_node(node: &GroupNode, level: u16, groups: &mut Vec<Group>, entries: &mut Vec<Entry>) {
    let mut group = node.group.clone();
    group.level = level;
    groups.push(group);
    entries.extend(node.entries.iter().cloned());
    for child in &node.children {
        flatten_node(child, level + 1, groups, entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(groupid: u32, level: u16) -> Group {
        Group {
            groupid,
            level,
            ..Group::default()
        }
    }

    fn entry(group_id: u32) -> Entry {
        let mut entry = Entry::default();
        entry.group_id = group_id;
        entry
    }

    #[test]
    fn reconstructs_a_nested_forest() {
        // A(0) B(1) C(1) D(2) E(0) -> root{A{B, C{D}}, E}
        let groups = vec![
            group(1, 0),
            group(2, 1),
            group(3, 1),
            group(4, 2),
            group(5, 0),
        ];
        let root = reconstruct(&groups, &[]).unwrap();

        assert_eq!(root.children.len(), 2);
        let a = &root.children[0];
        assert_eq!(a.group.groupid, 1);
        assert_eq!(a.children.len(), 2);
        assert_eq!(a.children[0].group.groupid, 2);
        let c = &a.children[1];
        assert_eq!(c.group.groupid, 3);
        assert_eq!(c.children.len(), 1);
        assert_eq!(c.children[0].group.groupid, 4);
        assert_eq!(root.children[1].group.groupid, 5);
    }

    #[test]
    fn routes_entries_to_their_group_and_reports_unrouted_ones() {
        let groups = vec![group(1, 0), group(2, 1)];
        let entries = vec![entry(1), entry(2), entry(999)];
        let root = reconstruct(&groups, &entries).unwrap();

        assert_eq!(root.children[0].entries.len(), 1);
        assert_eq!(root.children[0].children[0].entries.len(), 1);
        assert_eq!(root.unrouted_entries.len(), 1);
        assert_eq!(root.unrouted_entries[0].group_id, 999);
    }

    #[test]
    fn rejects_a_level_jump_of_more_than_one() {
        let groups = vec![group(1, 0), group(2, 2)];
        assert!(matches!(
            reconstruct(&groups, &[]).unwrap_err(),
            HierarchyError::Malformed(crate::error::DatabaseIntegrityError::InvalidGroupLevel {
                ..
            })
        ));
    }

    #[test]
    fn flatten_is_the_inverse_of_reconstruct() {
        let groups = vec![
            group(1, 0),
            group(2, 1),
            group(3, 1),
            group(4, 2),
            group(5, 0),
        ];
        let root = reconstruct(&groups, &[]).unwrap();
        let (flattened, _) = flatten(&root);
        let levels: Vec<u16> = flattened.iter().map(|g| g.level).collect();
        let ids: Vec<u32> = flattened.iter().map(|g| g.groupid).collect();
        assert_eq!(levels, vec![0, 1, 1, 2, 0]);
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn rejects_a_duplicate_groupid() {
        let groups = vec![group(1, 0), group(1, 0)];
        assert!(matches!(
            reconstruct(&groups, &[]).unwrap_err(),
            HierarchyError::Malformed(crate::error::DatabaseIntegrityError::DuplicateGroupId(1))
        ));
    }

    #[test]
    fn empty_input_yields_an_empty_tree() {
        let root = reconstruct(&[], &[]).unwrap();
        assert!(root.children.is_empty());
        assert!(root.unrouted_entries.is_empty());
    }
}
