//! Flat, versioned export of a receipt store.
//!
//! An [`ExportDocument`] lists every receipt as an [`ExportRecord`] in store
//! insertion order, followed by every relationship. It carries the payload
//! *digest* rather than the payload itself, which is enough for
//! [`verify_document`](crate::verify::verify_document) to recompute the whole
//! hash chain. Writing the JSON to disk is left to the caller.
//!
//! # Example
//!
//! ```
//! use provenant_audit::export::{export_store, ExportDocument};
//! use provenant_graph::prelude::*;
//!
//! let mut store = ReceiptStore::new();
//! store.append(ReceiptDraft::new("r0", Domain::Transaction, "charge")).unwrap();
//!
//! let json = export_store(&store).to_json_pretty().unwrap();
//! let back = ExportDocument::from_json(&json).unwrap();
//! assert_eq!(back.receipts.len(), 1);
//! assert_eq!(back.receipts[0].relation_type, None);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use provenant_graph::hash::Digest;
use provenant_graph::receipt::{Domain, Receipt, ReceiptId};
use provenant_graph::relation::{RelationType, Relationship};
use provenant_graph::store::ReceiptStore;

use crate::AuditError;

/// Current export format version.
pub const EXPORT_FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// ExportRecord
// ---------------------------------------------------------------------------

/// One receipt, flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub id: ReceiptId,
    pub domain: Domain,
    #[serde(rename = "type")]
    pub receipt_type: String,
    pub label: String,
    pub parent_ids: Vec<ReceiptId>,
    /// Relation of the first declared parent edge; `None` for roots. The full
    /// edge list is in [`ExportDocument::relationships`].
    pub relation_type: Option<RelationType>,
    pub depth: u32,
    pub payload_digest: Digest,
    pub hash: Digest,
    pub parent_hash: Digest,
    pub signature: Digest,
    pub timestamp: u64,
    pub key_id: String,
}

impl ExportRecord {
    fn from_receipt(receipt: &Receipt, relation_type: Option<RelationType>) -> Self {
        Self {
            id: receipt.id.clone(),
            domain: receipt.domain,
            receipt_type: receipt.receipt_type.clone(),
            label: receipt.label.clone(),
            parent_ids: receipt.parent_ids.clone(),
            relation_type,
            depth: receipt.depth,
            payload_digest: receipt.payload.digest(),
            hash: receipt.crypto.hash,
            parent_hash: receipt.crypto.parent_hash,
            signature: receipt.crypto.signature,
            timestamp: receipt.crypto.timestamp,
            key_id: receipt.crypto.key_id.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// ExportDocument
// ---------------------------------------------------------------------------

/// A complete, serializable dump of one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// Format version; see [`EXPORT_FORMAT_VERSION`].
    pub version: u32,
    /// Receipts in insertion order.
    pub receipts: Vec<ExportRecord>,
    /// Relationships in insertion order.
    pub relationships: Vec<Relationship>,
}

impl ExportDocument {
    /// Compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, AuditError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Indented JSON, for files meant to be read by people.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, AuditError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document and check its version.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Json`] for malformed JSON and
    /// [`AuditError::UnsupportedVersion`] for any version other than
    /// [`EXPORT_FORMAT_VERSION`].
    pub fn from_json(text: &str) -> Result<Self, AuditError> {
        let document: ExportDocument = serde_json::from_str(text)?;
        if document.version != EXPORT_FORMAT_VERSION {
            return Err(AuditError::UnsupportedVersion {
                found: document.version,
                supported: EXPORT_FORMAT_VERSION,
            });
        }
        Ok(document)
    }

    /// Look up a record by id.
    pub fn record(&self, id: &ReceiptId) -> Option<&ExportRecord> {
        self.receipts.iter().find(|r| r.id == *id)
    }
}

/// Flatten `store` into an [`ExportDocument`].
pub fn export_store(store: &ReceiptStore) -> ExportDocument {
    let receipts: Vec<ExportRecord> = store
        .iter()
        .map(|receipt| {
            let primary = store
                .relationships_into(&receipt.id)
                .next()
                .map(|r| r.relation_type);
            ExportRecord::from_receipt(receipt, primary)
        })
        .collect();

    debug!(
        receipts = receipts.len(),
        relationships = store.relationships().len(),
        "exported receipt store"
    );

    ExportDocument {
        version: EXPORT_FORMAT_VERSION,
        receipts,
        relationships: store.relationships().to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use provenant_graph::receipt::ReceiptDraft;

    fn sample() -> ReceiptStore {
        let mut store = ReceiptStore::new();
        store
            .append(ReceiptDraft::new("R0", Domain::Transaction, "order").with_payload("secret terms"))
            .unwrap();
        store
            .append(
                ReceiptDraft::new("R1", Domain::Content, "invoice")
                    .with_label("Invoice")
                    .with_parent("R0", RelationType::Fulfills),
            )
            .unwrap();
        store
    }

    #[test]
    fn records_mirror_receipts() {
        let store = sample();
        let doc = export_store(&store);
        assert_eq!(doc.version, EXPORT_FORMAT_VERSION);
        assert_eq!(doc.receipts.len(), 2);
        assert_eq!(doc.relationships.len(), 1);

        let r1 = doc.record(&ReceiptId::new("R1")).unwrap();
        let stored = store.get(&ReceiptId::new("R1")).unwrap();
        assert_eq!(r1.relation_type, Some(RelationType::Fulfills));
        assert_eq!(r1.depth, 1);
        assert_eq!(r1.hash, stored.crypto.hash);
        assert_eq!(r1.parent_ids, vec![ReceiptId::new("R0")]);
    }

    #[test]
    fn payload_bytes_are_not_exported() {
        let json = export_store(&sample()).to_json().unwrap();
        assert!(!json.contains("secret terms"));
        assert!(json.contains("\"payloadDigest\""));
        assert!(json.contains("\"type\":\"invoice\""));
    }

    #[test]
    fn json_roundtrip() {
        let doc = export_store(&sample());
        let back = ExportDocument::from_json(&doc.to_json_pretty().unwrap()).unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn unknown_version_rejected() {
        let mut doc = export_store(&sample());
        doc.version = 99;
        let json = serde_json::to_string(&doc).unwrap();
        assert!(matches!(
            ExportDocument::from_json(&json),
            Err(AuditError::UnsupportedVersion { found: 99, supported: 1 })
        ));
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(
            ExportDocument::from_json("{\"version\":1"),
            Err(AuditError::Json(_))
        ));
    }
}
