//! Receipt records and the drafts used to create them.
//!
//! A [`Receipt`] is an immutable attestation in one of three [`Domain`]s. It is
//! created exactly once, by [`ReceiptStore::append`](crate::store::ReceiptStore::append)
//! from a caller-supplied [`ReceiptDraft`], and is never mutated afterwards.
//! Logical amendments and invalidations are new receipts pointing at the
//! original with [`RelationType::Amends`] / [`RelationType::Invalidates`].
//!
//! # Example
//!
//! ```
//! use provenant_graph::receipt::{Domain, ReceiptDraft};
//! use provenant_graph::relation::RelationType;
//!
//! let root = ReceiptDraft::new("order-1", Domain::Transaction, "order.placed")
//!     .with_label("Order placed");
//! let child = ReceiptDraft::new("ship-1", Domain::Operations, "shipment.sent")
//!     .with_parent("order-1", RelationType::Fulfills);
//!
//! assert!(root.parents.is_empty());
//! assert_eq!(child.parents.len(), 1);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hash::Digest;
use crate::relation::RelationType;
use crate::GraphError;

// ---------------------------------------------------------------------------
// ReceiptId
// ---------------------------------------------------------------------------

/// Caller-chosen, store-unique identifier of a receipt.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptId(String);

impl ReceiptId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty identifier, which the store rejects.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ReceiptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReceiptId({})", self.0)
    }
}

impl fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReceiptId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ReceiptId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for ReceiptId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Domain
// ---------------------------------------------------------------------------

/// Classification tag of a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Payments, orders, refunds.
    Transaction,
    /// Documents, media, published artifacts.
    Content,
    /// Deployments, incidents, fulfilment steps.
    Operations,
}

impl Domain {
    /// Every domain, in declaration order.
    pub const ALL: [Domain; 3] = [Domain::Transaction, Domain::Content, Domain::Operations];

    /// Stable lowercase tag. This is what enters the hash chain.
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Transaction => "transaction",
            Domain::Content => "content",
            Domain::Operations => "operations",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Opaque payload bytes. The engine never looks inside; only the BLAKE3
/// digest of the bytes takes part in the hash chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Vec<u8>);

impl Payload {
    /// An empty payload.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the payload holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// BLAKE3 digest of the payload bytes.
    pub fn digest(&self) -> Digest {
        Digest::of(&self.0)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

// ---------------------------------------------------------------------------
// CryptoFields
// ---------------------------------------------------------------------------

/// Integrity bundle produced by the
/// [`HashChainGenerator`](crate::hash::HashChainGenerator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoFields {
    /// Hash over the receipt's identity, content digest and `parent_hash`.
    pub hash: Digest,
    /// Hash of the sorted immediate-parent hashes, or [`Digest::EMPTY`] for roots.
    pub parent_hash: Digest,
    /// Keyed digest of `hash` under the key derived from `key_id`.
    pub signature: Digest,
    /// Logical timestamp (the store's append sequence number).
    pub timestamp: u64,
    /// Identifier of the key that produced `signature`.
    pub key_id: String,
}

// ---------------------------------------------------------------------------
// Receipt
// ---------------------------------------------------------------------------

/// An immutable, hash-chained record in the receipt graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Store-unique identifier.
    pub id: ReceiptId,
    /// Which of the three domains this receipt belongs to.
    pub domain: Domain,
    /// Free-form type tag, e.g. `"refund.issued"`.
    #[serde(rename = "type")]
    pub receipt_type: String,
    /// Human-readable label.
    pub label: String,
    /// Opaque payload.
    pub payload: Payload,
    /// Immediate parents in the order they were declared.
    pub parent_ids: Vec<ReceiptId>,
    /// Longest distance from any root. Roots have depth 0.
    pub depth: u32,
    /// Integrity fields.
    pub crypto: CryptoFields,
}

impl Receipt {
    /// Returns `true` if this receipt has no parents.
    pub fn is_root(&self) -> bool {
        self.parent_ids.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ParentLink
// ---------------------------------------------------------------------------

/// One declared edge from a draft to an existing parent receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentLink {
    /// The existing receipt this draft points at.
    pub parent_id: ReceiptId,
    /// How the new receipt relates to the parent.
    pub relation: RelationType,
    /// Free-form explanation of the edge.
    pub description: String,
}

impl ParentLink {
    /// Link with an empty description.
    pub fn new(parent_id: impl Into<ReceiptId>, relation: RelationType) -> Self {
        Self {
            parent_id: parent_id.into(),
            relation,
            description: String::new(),
        }
    }

    /// Link from an untyped relation tag (e.g. `"fulfills"`).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidRelationType`] if `tag` is not one of the
    /// six relation types.
    pub fn tagged(
        parent_id: impl Into<ReceiptId>,
        tag: &str,
        description: impl Into<String>,
    ) -> Result<Self, GraphError> {
        Ok(Self {
            parent_id: parent_id.into(),
            relation: tag.parse()?,
            description: description.into(),
        })
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

// ---------------------------------------------------------------------------
// ReceiptDraft
// ---------------------------------------------------------------------------

/// Everything the caller decides about a receipt before it is appended.
///
/// Depth and crypto fields are derived by the store and cannot be supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDraft {
    /// Identifier for the new receipt.
    pub id: ReceiptId,
    /// Domain of the new receipt.
    pub domain: Domain,
    /// Free-form type tag.
    #[serde(rename = "type")]
    pub receipt_type: String,
    /// Human-readable label.
    #[serde(default)]
    pub label: String,
    /// Opaque payload.
    #[serde(default)]
    pub payload: Payload,
    /// Declared parent edges, in order.
    #[serde(default)]
    pub parents: Vec<ParentLink>,
}

impl ReceiptDraft {
    /// A root draft with no label, payload or parents.
    pub fn new(
        id: impl Into<ReceiptId>,
        domain: Domain,
        receipt_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            domain,
            receipt_type: receipt_type.into(),
            label: String::new(),
            payload: Payload::empty(),
            parents: Vec::new(),
        }
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the payload.
    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Add one parent edge.
    pub fn with_parent(self, parent_id: impl Into<ReceiptId>, relation: RelationType) -> Self {
        self.with_link(ParentLink::new(parent_id, relation))
    }

    /// Add several parents sharing one relation type.
    pub fn with_parents<I, P>(mut self, parent_ids: I, relation: RelationType) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ReceiptId>,
    {
        self.parents
            .extend(parent_ids.into_iter().map(|p| ParentLink::new(p, relation)));
        self
    }

    /// Add a fully specified parent link.
    pub fn with_link(mut self, link: ParentLink) -> Self {
        self.parents.push(link);
        self
    }

    /// Parent ids in declaration order.
    pub fn parent_ids(&self) -> impl Iterator<Item = &ReceiptId> {
        self.parents.iter().map(|l| &l.parent_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
