//! Depth-based tier gating.
//!
//! A [`TierLimit`] caps the graph depth a viewer may see. Projecting a store
//! through a limit yields a [`TierView`]: the receipts with `depth < limit`
//! (strict, so a receipt sitting exactly on the limit is hidden) and the ids
//! that were withheld. The projection borrows the store and never changes it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::paths::ProofPath;
use crate::receipt::{Receipt, ReceiptId};

// ---------------------------------------------------------------------------
// TierLimit
// ---------------------------------------------------------------------------

/// Maximum visible depth, exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierLimit {
    /// Everything is visible.
    #[default]
    Unbounded,
    /// Only receipts with `depth < n` are visible. `MaxDepth(0)` hides all.
    MaxDepth(u32),
}

impl TierLimit {
    /// Returns `true` if a receipt at `depth` is visible under this limit.
    pub fn admits(self, depth: u32) -> bool {
        match self {
            TierLimit::Unbounded => true,
            TierLimit::MaxDepth(limit) => depth < limit,
        }
    }
}

// ---------------------------------------------------------------------------
// TierView
// ---------------------------------------------------------------------------

/// The visible subset of a store under a [`TierLimit`].
#[derive(Debug, Clone)]
pub struct TierView<'a> {
    limit: TierLimit,
    visible: Vec<&'a Receipt>,
    /// Same receipts as `visible`, by id.
    visible_ids: HashSet<&'a ReceiptId>,
    hidden: Vec<&'a ReceiptId>,
}

impl<'a> TierView<'a> {
    /// Split `receipts` by `limit`, preserving their order.
    pub fn project(receipts: impl IntoIterator<Item = &'a Receipt>, limit: TierLimit) -> Self {
        let mut visible = Vec::new();
        let mut visible_ids = HashSet::new();
        let mut hidden = Vec::new();
        for receipt in receipts {
            if limit.admits(receipt.depth) {
                visible.push(receipt);
                visible_ids.insert(&receipt.id);
            } else {
                hidden.push(&receipt.id);
            }
        }
        Self {
            limit,
            visible,
            visible_ids,
            hidden,
        }
    }

    /// The limit this view was projected with.
    pub fn limit(&self) -> TierLimit {
        self.limit
    }

    /// Visible receipts in store order.
    pub fn visible(&self) -> &[&'a Receipt] {
        &self.visible
    }

    /// Ids of hidden receipts in store order.
    pub fn hidden(&self) -> &[&'a ReceiptId] {
        &self.hidden
    }

    /// Number of hidden receipts.
    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }

    /// Returns `true` if `id` is in the visible subset.
    pub fn is_visible(&self, id: &ReceiptId) -> bool {
        self.visible_ids.contains(id)
    }

    /// Returns `true` if every receipt on `path` is visible, i.e. the whole
    /// path can be highlighted at this tier.
    pub fn admits_path(&self, path: &ProofPath) -> bool {
        path.receipt_ids.iter().all(|id| self.visible_ids.contains(id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
