//! Provenant Graph -- an append-only, hash-chained DAG of receipts.
//!
//! Receipts are immutable attestations in three domains (transaction, content,
//! operations). Each one names its parents with a typed relationship, carries
//! a depth derived at creation time, and a BLAKE3 hash chain that makes any
//! change to an ancestor visible in every descendant.
//!
//! The crate exposes a handful of primitives over an explicit
//! [`ReceiptStore`](store::ReceiptStore) value; any sequencing (demos,
//! step-through narration, persistence) belongs to the caller.
//!
//! # Modules
//!
//! - [`receipt`], [`relation`]: the data model.
//! - [`hash`]: the Hash Chain Generator.
//! - [`store`]: the append-only store and Depth Calculator.
//! - [`tier`]: the Tier Visibility Filter.
//! - [`paths`]: the Proof Path Finder.
//! - [`score`]: the Completeness Scorer.
//! - [`lineage`]: ancestor and descendant queries.
//! - [`config`]: store configuration.
//!
//! # Quick Start
//!
//! ```
//! use provenant_graph::prelude::*;
//!
//! let mut store = ReceiptStore::new();
//! store.append(ReceiptDraft::new("R0", Domain::Transaction, "order.placed")).unwrap();
//! store.append(ReceiptDraft::new("R1", Domain::Content, "invoice.issued")
//!     .with_parent("R0", RelationType::Fulfills)).unwrap();
//! store.append(ReceiptDraft::new("R2", Domain::Operations, "shipment.sent")
//!     .with_parent("R0", RelationType::Fulfills)).unwrap();
//! store.append(ReceiptDraft::new("R3", Domain::Transaction, "refund.issued")
//!     .with_parents(["R1", "R2"], RelationType::Invalidates)).unwrap();
//!
//! let paths = find_paths(&store, &"R0".into(), &"R3".into());
//! assert_eq!(paths.len(), 2);
//! assert_eq!(store.completeness(&"R3".into()).value(), 0.75);
//! assert_eq!(store.visible_at(TierLimit::MaxDepth(2)).hidden_count(), 1);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod hash;
pub mod lineage;
pub mod paths;
pub mod receipt;
pub mod relation;
pub mod score;
pub mod store;
pub mod tier;

use receipt::ReceiptId;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by graph operations.
///
/// Only mutations and parsing fail; read-only queries degrade to empty
/// results for unknown ids.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A declared parent is not in the store.
    #[error("receipt '{receipt}' references missing parent '{parent}'")]
    MissingParent {
        receipt: ReceiptId,
        parent: ReceiptId,
    },

    /// The insertion would make the receipt its own ancestor.
    ///
    /// Only a self-parent can trigger this. Every other parent must already
    /// be stored, and a stored receipt can never gain the new id as an
    /// ancestor, so appends cannot close a longer loop.
    #[error("receipt '{receipt}' would form a cycle through parent '{via}'")]
    Cycle { receipt: ReceiptId, via: ReceiptId },

    /// A relation tag outside the closed set.
    #[error(
        "invalid relation type '{tag}'. Expected one of: causes, evidences, fulfills, invalidates, amends, references"
    )]
    InvalidRelationType { tag: String },

    /// The id is already taken.
    #[error("receipt '{receipt}' already exists")]
    DuplicateReceipt { receipt: ReceiptId },

    /// The same parent was listed more than once.
    #[error("receipt '{receipt}' lists parent '{parent}' more than once")]
    DuplicateParent {
        receipt: ReceiptId,
        parent: ReceiptId,
    },

    /// Receipt ids must be non-empty.
    #[error("receipt id must not be empty")]
    EmptyId,

    /// The configuration is malformed.
    #[error("invalid graph configuration: {details}")]
    Config { details: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::GraphConfig;
    pub use crate::hash::{Digest, HashChainGenerator, HashInput};
    pub use crate::paths::{find_paths, find_paths_with_limits, PathLimits, PathSearch, ProofPath};
    pub use crate::receipt::{CryptoFields, Domain, ParentLink, Payload, Receipt, ReceiptDraft, ReceiptId};
    pub use crate::relation::{RelationType, Relationship};
    pub use crate::score::{completeness, CompletenessScore};
    pub use crate::store::ReceiptStore;
    pub use crate::tier::{TierLimit, TierView};
    pub use crate::GraphError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn id(s: &str) -> ReceiptId {
        ReceiptId::new(s)
    }

    /// R0 (root, transaction); R1, R2 fulfil R0 from content and operations;
    /// R3 invalidates both.
    fn refund_graph() -> ReceiptStore {
        let mut store = ReceiptStore::new();
        store
            .append(ReceiptDraft::new("R0", Domain::Transaction, "order.placed").with_label("Order #1001"))
            .unwrap();
        store
            .append(
                ReceiptDraft::new("R1", Domain::Content, "invoice.issued")
                    .with_parent("R0", RelationType::Fulfills),
            )
            .unwrap();
        store
            .append(
                ReceiptDraft::new("R2", Domain::Operations, "shipment.sent")
                    .with_parent("R0", RelationType::Fulfills),
            )
            .unwrap();
        store
            .append(
                ReceiptDraft::new("R3", Domain::Transaction, "refund.issued")
                    .with_parents(["R1", "R2"], RelationType::Invalidates),
            )
            .unwrap();
        store
    }

    #[test]
    fn worked_example_depths() {
        let store = refund_graph();
        let depths: Vec<u32> = ["R0", "R1", "R2", "R3"]
            .iter()
            .map(|n| store.get(&id(n)).unwrap().depth)
            .collect();
        assert_eq!(depths, vec![0, 1, 1, 2]);
    }

    #[test]
    fn worked_example_paths() {
        let store = refund_graph();
        let paths = find_paths(&store, &id("R0"), &id("R3"));
        let routes: Vec<Vec<&str>> = paths
            .iter()
            .map(|p| p.receipt_ids.iter().map(|r| r.as_str()).collect())
            .collect();
        assert_eq!(routes, vec![vec!["R0", "R1", "R3"], vec!["R0", "R2", "R3"]]);
        for path in &paths {
            assert_eq!(
                path.relations,
                vec![RelationType::Fulfills, RelationType::Invalidates]
            );
        }
    }

    #[test]
    fn worked_example_completeness() {
        let store = refund_graph();
        let score = store.completeness(&id("R3"));
        assert!(score.provenance);
        assert!(score.cross_domain);
        assert!(!score.fulfills);
        assert!(score.anchored);
        assert_eq!(score.value(), 0.75);

        // R1: one parent domain, but it fulfils.
        assert_eq!(store.completeness(&id("R1")).value(), 0.75);
        assert_eq!(store.completeness(&id("R0")).value(), 0.0);
    }

    #[test]
    fn worked_example_tiers() {
        let store = refund_graph();
        let view = store.visible_at(TierLimit::MaxDepth(2));
        assert_eq!(view.visible().len(), 3);
        let hidden: Vec<&str> = view.hidden().iter().map(|id| id.as_str()).collect();
        assert_eq!(hidden, vec!["R3"]);

        let paths = find_paths(&store, &id("R0"), &id("R3"));
        assert!(paths.iter().all(|p| !view.admits_path(p)));
        assert!(paths
            .iter()
            .all(|p| store.visible_at(TierLimit::Unbounded).admits_path(p)));
    }

    #[test]
    fn amendment_is_a_new_receipt() {
        let mut store = refund_graph();
        let original = store.get(&id("R1")).unwrap().clone();
        store
            .append(
                ReceiptDraft::new("R1a", Domain::Content, "invoice.corrected")
                    .with_link(ParentLink::new("R1", RelationType::Amends).with_description("wrong VAT rate")),
            )
            .unwrap();

        assert_eq!(store.get(&id("R1")).unwrap(), &original);
        assert_eq!(store.len(), 5);
        let descendants: Vec<&str> = store
            .descendants(&id("R1"))
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(descendants, vec!["R3", "R1a"]);
    }

    #[test]
    fn error_messages_name_the_receipts() {
        let err = GraphError::MissingParent {
            receipt: id("R9"),
            parent: id("R8"),
        };
        assert_eq!(
            err.to_string(),
            "receipt 'R9' references missing parent 'R8'"
        );
    }
}
