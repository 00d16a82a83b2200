//! Proof Path Finder: every causal chain between two receipts.
//!
//! Paths follow relationship edges from parent to child. The search is a
//! depth-first walk over each node's outgoing edges in insertion order, with a
//! visited set per branch. At a merge point (a receipt with several parents)
//! every route through every parent is reported, which is what lets a caller
//! reconstruct all chains from a triggering event to a resolving one.
//!
//! Unknown ids and unconnected pairs produce no paths rather than an error.
//!
//! # Limits
//!
//! Dense graphs can have exponentially many paths. [`PathLimits`] caps the
//! number of paths collected and the number of edges per path.
//! [`PathSearch::truncated`] is set only when a route to the target really was
//! left out, never merely because unexplored dead-end branches remained.
//!
//! # Example
//!
//! ```
//! use provenant_graph::prelude::*;
//!
//! let mut store = ReceiptStore::new();
//! store.append(ReceiptDraft::new("r0", Domain::Transaction, "charge")).unwrap();
//! store.append(ReceiptDraft::new("r1", Domain::Content, "receipt.pdf")
//!     .with_parent("r0", RelationType::Evidences)).unwrap();
//!
//! let paths = find_paths(&store, &"r0".into(), &"r1".into());
//! assert_eq!(paths.len(), 1);
//! assert_eq!(paths[0].relations, vec![RelationType::Evidences]);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::receipt::ReceiptId;
use crate::relation::{RelationType, Relationship};
use crate::store::ReceiptStore;

// ---------------------------------------------------------------------------
// ProofPath
// ---------------------------------------------------------------------------

/// One directed chain of edges from a start receipt to a target receipt.
///
/// `relations[i]` is the type of the edge `receipt_ids[i] -> receipt_ids[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofPath {
    /// Receipts along the path, start first.
    pub receipt_ids: Vec<ReceiptId>,
    /// Edge types along the path. One shorter than `receipt_ids`.
    pub relations: Vec<RelationType>,
}

impl ProofPath {
    /// Number of edges.
    pub fn hops(&self) -> usize {
        self.relations.len()
    }

    /// `(parent, child, relation)` triples along the path.
    pub fn edges(&self) -> impl Iterator<Item = (&ReceiptId, &ReceiptId, RelationType)> {
        self.receipt_ids
            .windows(2)
            .zip(self.relations.iter())
            .map(|(pair, &relation)| (&pair[0], &pair[1], relation))
    }

    /// Returns `true` if the path passes through `id`.
    pub fn contains(&self, id: &ReceiptId) -> bool {
        self.receipt_ids.contains(id)
    }
}

// ---------------------------------------------------------------------------
// PathLimits / PathSearch
// ---------------------------------------------------------------------------

/// Caps applied to a path search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PathLimits {
    /// Stop after collecting this many paths.
    pub max_paths: Option<usize>,
    /// Do not follow paths longer than this many edges.
    pub max_hops: Option<usize>,
}

impl PathLimits {
    /// No caps at all.
    pub fn unbounded() -> Self {
        Self::default()
    }
}

/// Result of a bounded path search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSearch {
    /// Paths found, in discovery order.
    pub paths: Vec<ProofPath>,
    /// `true` if at least one more route to the target exists that a limit
    /// kept out of `paths`.
    pub truncated: bool,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// All paths from `start` to `target` using the store's configured limits.
///
/// A truncated search still returns the paths found so far; use
/// [`find_paths_with_limits`] to learn whether truncation happened.
pub fn find_paths(store: &ReceiptStore, start: &ReceiptId, target: &ReceiptId) -> Vec<ProofPath> {
    find_paths_with_limits(store, start, target, store.config().path_limits()).paths
}

/// All paths from `start` to `target` under explicit limits.
///
/// `start == target` yields the single zero-edge path `[start]`.
pub fn find_paths_with_limits(
    store: &ReceiptStore,
    start: &ReceiptId,
    target: &ReceiptId,
    limits: PathLimits,
) -> PathSearch {
    let (Some(start_receipt), Some(target_receipt)) = (store.get(start), store.get(target)) else {
        return PathSearch::default();
    };
    if start == target {
        return PathSearch {
            paths: vec![ProofPath {
                receipt_ids: vec![start.clone()],
                relations: Vec::new(),
            }],
            truncated: false,
        };
    }
    // Depth strictly increases along every edge.
    if start_receipt.depth >= target_receipt.depth {
        return PathSearch::default();
    }

    // Only receipts that can reach the target are worth entering.
    let leads_to_target = store.ancestor_ids(target);
    if !leads_to_target.contains(start) {
        return PathSearch::default();
    }

    let mut search = Search {
        store,
        target,
        limits,
        leads_to_target,
        ids: vec![start],
        relations: Vec::new(),
        on_branch: HashSet::from([start]),
        found: PathSearch::default(),
    };
    search.run(start);

    trace!(
        start = %start,
        target = %target,
        paths = search.found.paths.len(),
        truncated = search.found.truncated,
        "proof path search finished"
    );
    if search.found.truncated {
        warn!(
            start = %start,
            target = %target,
            max_paths = ?limits.max_paths,
            max_hops = ?limits.max_hops,
            "proof path search truncated by limits"
        );
    }
    search.found
}

/// Outgoing edges of one receipt on the current branch, not yet visited.
type Frame<'a> = std::vec::IntoIter<&'a Relationship>;

/// DFS state for one query.
///
/// The walk keeps its own stack of [`Frame`]s, so chain length is bounded by
/// memory rather than by the thread's stack.
struct Search<'a> {
    store: &'a ReceiptStore,
    target: &'a ReceiptId,
    limits: PathLimits,
    /// Ancestors of `target`.
    leads_to_target: HashSet<&'a ReceiptId>,
    /// Receipts on the current branch.
    ids: Vec<&'a ReceiptId>,
    /// Edge types on the current branch.
    relations: Vec<RelationType>,
    /// Same receipts as `ids`, for O(1) membership.
    on_branch: HashSet<&'a ReceiptId>,
    found: PathSearch,
}

impl<'a> Search<'a> {
    fn run(&mut self, start: &'a ReceiptId) {
        let mut frames: Vec<Frame<'a>> = vec![self.frame(start)];
        while let Some(edges) = frames.last_mut() {
            let Some(edge) = edges.next() else {
                frames.pop();
                self.leave();
                continue;
            };
            let child = &edge.child_id;
            let is_target = child == self.target;
            if !is_target && !self.leads_to_target.contains(child) {
                continue;
            }
            if self.on_branch.contains(child) {
                continue;
            }

            // Fewest edges any route through `child` can have.
            let min_hops = self.relations.len() + if is_target { 1 } else { 2 };
            if self.limits.max_hops.is_some_and(|max| min_hops > max) {
                self.found.truncated = true;
                continue;
            }
            // `child` reaches the target, so at least one more route exists.
            if self.is_full() {
                self.found.truncated = true;
                return;
            }

            if is_target {
                self.record(edge);
            } else {
                self.enter(child, edge.relation_type);
                frames.push(self.frame(child));
            }
        }
    }

    fn frame(&self, id: &ReceiptId) -> Frame<'a> {
        self.store
            .relationships_from(id)
            .collect::<Vec<_>>()
            .into_iter()
    }

    fn is_full(&self) -> bool {
        self.limits
            .max_paths
            .is_some_and(|max| self.found.paths.len() >= max)
    }

    fn enter(&mut self, id: &'a ReceiptId, relation: RelationType) {
        self.ids.push(id);
        self.relations.push(relation);
        self.on_branch.insert(id);
    }

    fn leave(&mut self) {
        if let Some(id) = self.ids.pop() {
            self.on_branch.remove(id);
        }
        self.relations.pop();
    }

    fn record(&mut self, last: &'a Relationship) {
        let mut receipt_ids: Vec<ReceiptId> = self.ids.iter().map(|id| (*id).clone()).collect();
        receipt_ids.push(last.child_id.clone());
        let mut relations = self.relations.clone();
        relations.push(last.relation_type);
        self.found.paths.push(ProofPath {
            receipt_ids,
            relations,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
