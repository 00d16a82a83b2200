//! The append-only receipt store.
//!
//! [`ReceiptStore`] owns every [`Receipt`] and [`Relationship`] of one graph.
//! Its only transition is [`append`](ReceiptStore::append): a draft is
//! validated in full, its depth and crypto fields are derived, and then the
//! receipt and all of its relationships are committed together. Nothing is
//! ever updated or removed, and there is no mutable access to stored records.
//!
//! Separate stores are fully isolated; there is no global "current" graph.
//!
//! # Example
//!
//! ```
//! use provenant_graph::prelude::*;
//!
//! let mut store = ReceiptStore::new();
//! store.append(ReceiptDraft::new("r0", Domain::Transaction, "order.placed")).unwrap();
//! store
//!     .append(ReceiptDraft::new("r1", Domain::Content, "invoice.issued")
//!         .with_parent("r0", RelationType::Fulfills))
//!     .unwrap();
//!
//! let r1 = store.get(&"r1".into()).unwrap();
//! assert_eq!(r1.depth, 1);
//! assert_eq!(store.len(), 2);
//!
//! // Unknown parents are rejected and nothing is written.
//! let err = store
//!     .append(ReceiptDraft::new("r2", Domain::Operations, "x").with_parent("nope", RelationType::Causes))
//!     .unwrap_err();
//! assert!(matches!(err, GraphError::MissingParent { .. }));
//! assert_eq!(store.len(), 2);
//! ```

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::config::GraphConfig;
use crate::hash::{Digest, HashChainGenerator, HashInput};
use crate::receipt::{Receipt, ReceiptDraft, ReceiptId};
use crate::relation::Relationship;
use crate::tier::{TierLimit, TierView};
use crate::GraphError;

// ---------------------------------------------------------------------------
// ReceiptStore
// ---------------------------------------------------------------------------

/// Append-only collection of receipts keyed by id.
///
/// Receipts are kept in insertion order, which is also a topological order:
/// every parent precedes its children.
#[derive(Debug, Clone)]
pub struct ReceiptStore {
    /// Receipts in insertion order.
    receipts: Vec<Receipt>,
    /// Receipt id -> position in `receipts`.
    index: HashMap<ReceiptId, usize>,
    /// All relationships in insertion order.
    relationships: Vec<Relationship>,
    /// Parent id -> positions in `relationships` where it is the parent.
    outgoing: HashMap<ReceiptId, Vec<usize>>,
    /// Child id -> positions in `relationships` where it is the child.
    incoming: HashMap<ReceiptId, Vec<usize>>,
    generator: HashChainGenerator,
    config: GraphConfig,
    /// Next logical timestamp.
    clock: u64,
}

impl ReceiptStore {
    /// Create an empty store with [`GraphConfig::default`].
    pub fn new() -> Self {
        Self::build(GraphConfig::default())
    }

    /// Create an empty store with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Config`] if the configuration is invalid.
    pub fn with_config(config: GraphConfig) -> Result<Self, GraphError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: GraphConfig) -> Self {
        Self {
            receipts: Vec::new(),
            index: HashMap::new(),
            relationships: Vec::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
            generator: HashChainGenerator::new(config.key_id.clone()),
            config,
            clock: 0,
        }
    }

    // -- the single transition ----------------------------------------------

    /// Validate `draft`, derive its depth and crypto fields, and commit it
    /// together with one [`Relationship`] per parent link.
    ///
    /// The logical timestamp is the number of receipts already in the store.
    ///
    /// # Errors
    ///
    /// Nothing is written when any of these is returned:
    /// - [`GraphError::EmptyId`] if the draft id is empty.
    /// - [`GraphError::DuplicateReceipt`] if the id is already taken.
    /// - [`GraphError::DuplicateParent`] if a parent is listed twice.
    /// - [`GraphError::Cycle`] if the draft names itself as a parent.
    /// - [`GraphError::MissingParent`] if a parent is not in the store.
    pub fn append(&mut self, draft: ReceiptDraft) -> Result<&Receipt, GraphError> {
        if let Err(e) = self.validate(&draft) {
            warn!(receipt = %draft.id, error = %e, "rejected receipt append");
            return Err(e);
        }

        let depth = self.depth_for(&draft)?;
        let parent_hashes: Vec<Digest> = draft
            .parent_ids()
            .filter_map(|p| self.get(p))
            .map(|p| p.crypto.hash)
            .collect();

        let timestamp = self.clock;
        let crypto = self.generator.generate(&HashInput {
            id: &draft.id,
            domain: draft.domain,
            receipt_type: &draft.receipt_type,
            label: &draft.label,
            payload_digest: draft.payload.digest(),
            parent_hashes: &parent_hashes,
            timestamp,
        });

        // -- commit (infallible from here on) --
        let ReceiptDraft {
            id,
            domain,
            receipt_type,
            label,
            payload,
            parents,
        } = draft;

        let mut parent_ids = Vec::with_capacity(parents.len());
        for link in parents {
            let position = self.relationships.len();
            self.outgoing
                .entry(link.parent_id.clone())
                .or_default()
                .push(position);
            self.incoming.entry(id.clone()).or_default().push(position);
            parent_ids.push(link.parent_id.clone());
            self.relationships.push(Relationship {
                parent_id: link.parent_id,
                child_id: id.clone(),
                relation_type: link.relation,
                description: link.description,
            });
        }

        let position = self.receipts.len();
        self.index.insert(id.clone(), position);
        self.receipts.push(Receipt {
            id,
            domain,
            receipt_type,
            label,
            payload,
            parent_ids,
            depth,
            crypto,
        });
        self.clock += 1;

        let receipt = &self.receipts[position];
        debug!(
            receipt = %receipt.id,
            domain = %receipt.domain,
            depth = receipt.depth,
            parents = receipt.parent_ids.len(),
            hash = %receipt.crypto.hash,
            "receipt appended"
        );
        Ok(receipt)
    }

    /// Run every insertion check without touching the store.
    fn validate(&self, draft: &ReceiptDraft) -> Result<(), GraphError> {
        if draft.id.is_empty() {
            return Err(GraphError::EmptyId);
        }
        if self.contains(&draft.id) {
            return Err(GraphError::DuplicateReceipt {
                receipt: draft.id.clone(),
            });
        }

        let mut seen: HashSet<&ReceiptId> = HashSet::with_capacity(draft.parents.len());
        for parent in draft.parent_ids() {
            if !seen.insert(parent) {
                return Err(GraphError::DuplicateParent {
                    receipt: draft.id.clone(),
                    parent: parent.clone(),
                });
            }
            if *parent == draft.id {
                return Err(GraphError::Cycle {
                    receipt: draft.id.clone(),
                    via: parent.clone(),
                });
            }
            if !self.contains(parent) {
                return Err(GraphError::MissingParent {
                    receipt: draft.id.clone(),
                    parent: parent.clone(),
                });
            }
        }

        Ok(())
    }

    /// Depth Calculator: 0 for roots, else one more than the deepest parent.
    fn depth_for(&self, draft: &ReceiptDraft) -> Result<u32, GraphError> {
        let mut deepest: Option<u32> = None;
        for parent in draft.parent_ids() {
            let receipt = self.get(parent).ok_or_else(|| GraphError::MissingParent {
                receipt: draft.id.clone(),
                parent: parent.clone(),
            })?;
            deepest = Some(deepest.map_or(receipt.depth, |d| d.max(receipt.depth)));
        }
        Ok(deepest.map_or(0, |d| d + 1))
    }

    // -- lookups ------------------------------------------------------------

    /// Look up a receipt by id.
    pub fn get(&self, id: &ReceiptId) -> Option<&Receipt> {
        self.index.get(id).map(|&i| &self.receipts[i])
    }

    /// Returns `true` if a receipt with this id exists.
    pub fn contains(&self, id: &ReceiptId) -> bool {
        self.index.contains_key(id)
    }

    /// Number of receipts.
    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    /// Returns `true` if the store holds no receipts.
    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }

    /// Receipts in insertion (topological) order.
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    /// Iterate receipts in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Receipt> {
        self.receipts.iter()
    }

    /// Insertion position of a receipt.
    pub fn position(&self, id: &ReceiptId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// All relationships in insertion order.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Edges this receipt declared to its parents, in declaration order.
    pub fn relationships_into<'a>(
        &'a self,
        id: &ReceiptId,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.edges(self.incoming.get(id))
    }

    /// Edges where this receipt is the parent, in insertion order.
    pub fn relationships_from<'a>(
        &'a self,
        id: &ReceiptId,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.edges(self.outgoing.get(id))
    }

    fn edges<'a>(
        &'a self,
        positions: Option<&'a Vec<usize>>,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        positions
            .into_iter()
            .flatten()
            .map(move |&i| &self.relationships[i])
    }

    /// Resolved immediate parents, in declaration order.
    pub fn parents_of(&self, id: &ReceiptId) -> Vec<&Receipt> {
        self.get(id)
            .map(|r| r.parent_ids.iter().filter_map(|p| self.get(p)).collect())
            .unwrap_or_default()
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// The generator used to stamp crypto fields.
    pub fn generator(&self) -> &HashChainGenerator {
        &self.generator
    }

    // -- tier projection ----------------------------------------------------

    /// Tier Visibility Filter over this store.
    pub fn visible_at(&self, limit: TierLimit) -> TierView<'_> {
        TierView::project(self.receipts.iter(), limit)
    }

    /// [`visible_at`](Self::visible_at) with the configured default tier.
    pub fn visible_at_default_tier(&self) -> TierView<'_> {
        self.visible_at(self.config.default_tier)
    }
}

impl Default for ReceiptStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a ReceiptStore {
    type Item = &'a Receipt;
    type IntoIter = std::slice::Iter<'a, Receipt>;

    fn into_iter(self) -> Self::IntoIter {
        self.receipts.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
