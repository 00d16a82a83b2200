//! Completeness Scorer: a coverage heuristic for one receipt.
//!
//! The score adds four independent 0.25 bonuses:
//!
//! | bonus        | awarded when                                                  |
//! |--------------|---------------------------------------------------------------|
//! | provenance   | the receipt has at least one parent                           |
//! | cross-domain | its parents span two or more distinct domains                 |
//! | fulfills     | one of the edges it declared to its parents is `fulfills`     |
//! | anchored     | its depth is greater than zero                                |
//!
//! This measures how well a receipt is wired into the graph. It says nothing
//! about whether the receipt's crypto fields are intact; for that, run the
//! integrity verifier. A "complete" receipt is not a "verified" one.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::receipt::{Receipt, ReceiptId};
use crate::relation::{RelationType, Relationship};
use crate::store::ReceiptStore;

/// Weight of each bonus.
pub const BONUS: f64 = 0.25;

/// Which bonuses a receipt earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompletenessScore {
    /// At least one parent.
    pub provenance: bool,
    /// Parents span two or more domains.
    pub cross_domain: bool,
    /// At least one declared `fulfills` edge.
    pub fulfills: bool,
    /// Depth greater than zero.
    pub anchored: bool,
}

impl CompletenessScore {
    /// Score in `[0.0, 1.0]`.
    pub fn value(&self) -> f64 {
        let earned = [self.provenance, self.cross_domain, self.fulfills, self.anchored]
            .into_iter()
            .filter(|&b| b)
            .count();
        (earned as f64 * BONUS).min(1.0)
    }

    /// Returns `true` when every bonus was earned.
    pub fn is_full(&self) -> bool {
        self.provenance && self.cross_domain && self.fulfills && self.anchored
    }
}

/// Score one receipt given its resolved parents and the relationships it
/// declared (those whose `child_id` is the receipt).
///
/// Relationships belonging to other receipts are ignored.
pub fn completeness<'a>(
    receipt: &Receipt,
    parents: &[&Receipt],
    relationships: impl IntoIterator<Item = &'a Relationship>,
) -> CompletenessScore {
    let domains: HashSet<_> = parents.iter().map(|p| p.domain).collect();
    CompletenessScore {
        provenance: !parents.is_empty(),
        cross_domain: domains.len() >= 2,
        fulfills: relationships
            .into_iter()
            .any(|r| r.child_id == receipt.id && r.relation_type == RelationType::Fulfills),
        anchored: receipt.depth > 0,
    }
}

impl ReceiptStore {
    /// Completeness of a stored receipt. Unknown ids score zero.
    pub fn completeness(&self, id: &ReceiptId) -> CompletenessScore {
        let Some(receipt) = self.get(id) else {
            return CompletenessScore::default();
        };
        completeness(receipt, &self.parents_of(id), self.relationships_into(id))
    }
}
