//! Ancestor / descendant queries over a [`ReceiptStore`].
//!
//! Results are returned in store insertion order, which is topological, so an
//! ancestor list always lists older receipts first. Unknown ids give empty
//! results.

use std::collections::HashSet;

use crate::receipt::{Receipt, ReceiptId};
use crate::store::ReceiptStore;

impl ReceiptStore {
    /// Every receipt reachable by following parent edges from `id`,
    /// excluding `id` itself.
    pub fn ancestors(&self, id: &ReceiptId) -> Vec<&Receipt> {
        self.in_store_order(self.ancestor_ids(id))
    }

    /// Ids of every ancestor of `id`, unordered. Empty for unknown ids.
    pub(crate) fn ancestor_ids(&self, id: &ReceiptId) -> HashSet<&ReceiptId> {
        let mut seen: HashSet<&ReceiptId> = HashSet::new();
        let mut stack: Vec<&ReceiptId> = match self.get(id) {
            Some(receipt) => receipt.parent_ids.iter().collect(),
            None => return seen,
        };
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(receipt) = self.get(current) {
                stack.extend(receipt.parent_ids.iter());
            }
        }
        seen
    }

    /// Every receipt that has `id` as a direct or transitive parent.
    pub fn descendants(&self, id: &ReceiptId) -> Vec<&Receipt> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut seen: HashSet<&ReceiptId> = HashSet::new();
        let mut stack: Vec<&ReceiptId> = self.children_ids(id).collect();
        while let Some(current) = stack.pop() {
            if seen.insert(current) {
                stack.extend(self.children_ids(current));
            }
        }
        self.in_store_order(seen)
    }

    /// Direct children of `id`, in insertion order.
    pub fn children_of(&self, id: &ReceiptId) -> Vec<&Receipt> {
        self.children_ids(id).filter_map(|c| self.get(c)).collect()
    }

    /// Receipts with no parents.
    pub fn roots(&self) -> Vec<&Receipt> {
        self.iter().filter(|r| r.is_root()).collect()
    }

    /// Receipts nothing points at yet.
    pub fn leaves(&self) -> Vec<&Receipt> {
        self.iter()
            .filter(|r| self.relationships_from(&r.id).next().is_none())
            .collect()
    }

    fn children_ids<'a>(&'a self, id: &ReceiptId) -> impl Iterator<Item = &'a ReceiptId> + 'a {
        self.relationships_from(id).map(|r| &r.child_id)
    }

    fn in_store_order(&self, ids: HashSet<&ReceiptId>) -> Vec<&Receipt> {
        let mut positions: Vec<usize> = ids.into_iter().filter_map(|id| self.position(id)).collect();
        positions.sort_unstable();
        positions.into_iter().map(|i| &self.receipts()[i]).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn names(receipts: &[&Receipt]) -> Vec<String> {
        receipts.iter().map(|r| r.id.to_string()).collect()
    }

    /// a -> b -> d, a -> c -> d, e isolated.
    fn sample() -> ReceiptStore {
        let mut store = ReceiptStore::new();
        store.append(ReceiptDraft::new("a", Domain::Transaction, "t")).unwrap();
        store
            .append(ReceiptDraft::new("b", Domain::Content, "c").with_parent("a", RelationType::Causes))
            .unwrap();
        store
            .append(ReceiptDraft::new("c", Domain::Operations, "o").with_parent("a", RelationType::Causes))
            .unwrap();
        store
            .append(ReceiptDraft::new("d", Domain::Transaction, "t").with_parents(["c", "b"], RelationType::Fulfills))
            .unwrap();
        store.append(ReceiptDraft::new("e", Domain::Content, "c")).unwrap();
        store
    }

    #[test]
    fn ancestors_in_topological_order() {
        let store = sample();
        assert_eq!(names(&store.ancestors(&"d".into())), vec!["a", "b", "c"]);
        assert!(store.ancestors(&"a".into()).is_empty());
        assert!(store.ancestors(&"ghost".into()).is_empty());
    }

    #[test]
    fn descendants_deduplicate_merge_points() {
        let store = sample();
        assert_eq!(names(&store.descendants(&"a".into())), vec!["b", "c", "d"]);
        assert!(store.descendants(&"d".into()).is_empty());
        assert!(store.descendants(&"ghost".into()).is_empty());
    }

    #[test]
    fn roots_leaves_children() {
        let store = sample();
        assert_eq!(names(&store.roots()), vec!["a", "e"]);
        assert_eq!(names(&store.leaves()), vec!["d", "e"]);
        assert_eq!(names(&store.children_of(&"a".into())), vec!["b", "c"]);
    }
}
