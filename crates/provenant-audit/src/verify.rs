//! Integrity verification by recomputing the hash chain.
//!
//! The verifier walks receipts in insertion order and recomputes, for each
//! one, its depth, `parent_hash`, `hash` and `signature`. Parent hashes are
//! taken from the *recomputed* values of the parents, not from what the
//! parents' records claim. Editing any hashed field of one record therefore
//! produces a finding on that record and on every record downstream of it,
//! even if the editor also rewrote the record's own `hash`.
//!
//! # Example
//!
//! ```
//! use provenant_audit::export::export_store;
//! use provenant_audit::verify::verify_document;
//! use provenant_graph::prelude::*;
//!
//! let mut store = ReceiptStore::new();
//! store.append(ReceiptDraft::new("a", Domain::Transaction, "charge")).unwrap();
//! store.append(ReceiptDraft::new("b", Domain::Content, "receipt")
//!     .with_parent("a", RelationType::Evidences)).unwrap();
//!
//! let mut doc = export_store(&store);
//! assert!(verify_document(&doc, store.generator().key_id()).is_intact());
//!
//! doc.receipts[0].label = "edited".to_owned();
//! let report = verify_document(&doc, store.generator().key_id());
//! assert_eq!(report.tampered_ids().len(), 2);
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use provenant_graph::hash::{Digest, HashChainGenerator, HashInput};
use provenant_graph::receipt::ReceiptId;
use provenant_graph::relation::RelationType;
use provenant_graph::store::ReceiptStore;

use crate::export::{export_store, ExportDocument};

// ---------------------------------------------------------------------------
// VerifyResult
// ---------------------------------------------------------------------------

/// Pass/fail verdict for one receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResult {
    /// Whether verification succeeded.
    pub ok: bool,
    /// Reason for failure, if any.
    pub reason: Option<String>,
}

impl VerifyResult {
    /// A passing result.
    pub fn ok() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    /// A failing result.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

/// What is wrong with a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FindingKind {
    /// The id appeared earlier in the document.
    DuplicateReceipt,
    /// A parent id does not appear before this record.
    MissingParent { parent: ReceiptId },
    /// Recorded depth disagrees with the parents' recomputed depths.
    DepthMismatch { recorded: u32, expected: u32 },
    /// Recorded `parent_hash` disagrees with the parents' recomputed hashes.
    ParentHashMismatch { recorded: Digest, expected: Digest },
    /// Recorded `hash` disagrees with the recomputed hash.
    HashMismatch { recorded: Digest, expected: Digest },
    /// Recorded `signature` is not a signature of the recorded `hash`.
    SignatureMismatch,
    /// The record was stamped with a different key id.
    KeyMismatch { recorded: String, expected: String },
    /// The relationship list disagrees with the record's parents.
    RelationshipMismatch { details: String },
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingKind::DuplicateReceipt => write!(f, "duplicate receipt id"),
            FindingKind::MissingParent { parent } => {
                write!(f, "parent '{parent}' is missing or appears later")
            }
            FindingKind::DepthMismatch { recorded, expected } => {
                write!(f, "depth is {recorded}, expected {expected}")
            }
            FindingKind::ParentHashMismatch { recorded, expected } => {
                write!(f, "parent hash is {recorded}, expected {expected}")
            }
            FindingKind::HashMismatch { recorded, expected } => {
                write!(f, "hash is {recorded}, expected {expected}")
            }
            FindingKind::SignatureMismatch => write!(f, "signature does not match hash"),
            FindingKind::KeyMismatch { recorded, expected } => {
                write!(f, "signed with key '{recorded}', expected '{expected}'")
            }
            FindingKind::RelationshipMismatch { details } => {
                write!(f, "relationship mismatch: {details}")
            }
        }
    }
}

/// One defect on one receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub receipt_id: ReceiptId,
    #[serde(flatten)]
    pub kind: FindingKind,
}

// ---------------------------------------------------------------------------
// IntegrityReport
// ---------------------------------------------------------------------------

/// Outcome of verifying a store or document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// Number of receipt records examined.
    pub checked: usize,
    /// Every defect found, in document order.
    pub findings: Vec<Finding>,
}

impl IntegrityReport {
    /// Returns `true` when nothing was found.
    pub fn is_intact(&self) -> bool {
        self.findings.is_empty()
    }

    /// Ids of every receipt with at least one finding.
    pub fn tampered_ids(&self) -> BTreeSet<ReceiptId> {
        self.findings.iter().map(|f| f.receipt_id.clone()).collect()
    }

    /// Findings for one receipt.
    pub fn findings_for<'a>(&'a self, id: &'a ReceiptId) -> impl Iterator<Item = &'a FindingKind> {
        self.findings
            .iter()
            .filter(move |f| f.receipt_id == *id)
            .map(|f| &f.kind)
    }

    /// Pass/fail verdict for one receipt, with every reason joined.
    pub fn result_for(&self, id: &ReceiptId) -> VerifyResult {
        let reasons: Vec<String> = self.findings_for(id).map(|k| k.to_string()).collect();
        if reasons.is_empty() {
            VerifyResult::ok()
        } else {
            VerifyResult::failed(reasons.join("; "))
        }
    }

    fn push(&mut self, receipt_id: &ReceiptId, kind: FindingKind) {
        self.findings.push(Finding {
            receipt_id: receipt_id.clone(),
            kind,
        });
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify a live store against its own key.
pub fn verify_store(store: &ReceiptStore) -> IntegrityReport {
    verify_document(&export_store(store), store.generator().key_id())
}

/// Verify an exported document, expecting every record to be signed under
/// `key_id`.
pub fn verify_document(document: &ExportDocument, key_id: &str) -> IntegrityReport {
    let generator = HashChainGenerator::new(key_id);
    let mut report = IntegrityReport {
        checked: document.receipts.len(),
        findings: Vec::new(),
    };
    // id -> (recomputed hash, recomputed depth)
    let mut recomputed: HashMap<&ReceiptId, (Digest, u32)> = HashMap::new();

    for record in &document.receipts {
        if recomputed.contains_key(&record.id) {
            report.push(&record.id, FindingKind::DuplicateReceipt);
            continue;
        }
        if record.key_id != key_id {
            report.push(
                &record.id,
                FindingKind::KeyMismatch {
                    recorded: record.key_id.clone(),
                    expected: key_id.to_owned(),
                },
            );
        }

        let mut parent_hashes = Vec::with_capacity(record.parent_ids.len());
        let mut deepest: Option<u32> = None;
        for parent in &record.parent_ids {
            match recomputed.get(parent) {
                Some(&(hash, depth)) => {
                    parent_hashes.push(hash);
                    deepest = Some(deepest.map_or(depth, |d| d.max(depth)));
                }
                None => report.push(
                    &record.id,
                    FindingKind::MissingParent {
                        parent: parent.clone(),
                    },
                ),
            }
        }

        let expected_depth = deepest.map_or(0, |d| d + 1);
        if record.depth != expected_depth {
            report.push(
                &record.id,
                FindingKind::DepthMismatch {
                    recorded: record.depth,
                    expected: expected_depth,
                },
            );
        }

        let expected = generator.generate(&HashInput {
            id: &record.id,
            domain: record.domain,
            receipt_type: &record.receipt_type,
            label: &record.label,
            payload_digest: record.payload_digest,
            parent_hashes: &parent_hashes,
            timestamp: record.timestamp,
        });
        if record.parent_hash != expected.parent_hash {
            report.push(
                &record.id,
                FindingKind::ParentHashMismatch {
                    recorded: record.parent_hash,
                    expected: expected.parent_hash,
                },
            );
        }
        if record.hash != expected.hash {
            report.push(
                &record.id,
                FindingKind::HashMismatch {
                    recorded: record.hash,
                    expected: expected.hash,
                },
            );
        }
        if record.signature != generator.sign(&record.hash) {
            report.push(&record.id, FindingKind::SignatureMismatch);
        }

        recomputed.insert(&record.id, (expected.hash, expected_depth));
    }

    check_relationships(document, &mut report);

    if report.is_intact() {
        debug!(checked = report.checked, "receipt chain verified");
    } else {
        warn!(
            checked = report.checked,
            findings = report.findings.len(),
            tampered = report.tampered_ids().len(),
            "receipt chain verification failed"
        );
    }
    report
}

/// Every declared parent must have exactly one matching relationship, no
/// relationship may exist without a declared parent, and each record's
/// `relation_type` must match its first edge.
fn check_relationships(document: &ExportDocument, report: &mut IntegrityReport) {
    let mut edges: HashMap<(&ReceiptId, &ReceiptId), Vec<RelationType>> = HashMap::new();
    let mut first_edge: HashMap<&ReceiptId, RelationType> = HashMap::new();
    for rel in &document.relationships {
        edges
            .entry((&rel.parent_id, &rel.child_id))
            .or_default()
            .push(rel.relation_type);
        first_edge.entry(&rel.child_id).or_insert(rel.relation_type);
    }

    let mut declared: HashSet<(&ReceiptId, &ReceiptId)> = HashSet::new();
    for record in &document.receipts {
        for parent in &record.parent_ids {
            declared.insert((parent, &record.id));
            match edges.get(&(parent, &record.id)).map(Vec::len) {
                Some(1) => {}
                Some(n) => report.push(
                    &record.id,
                    FindingKind::RelationshipMismatch {
                        details: format!("{n} relationships from parent '{parent}'"),
                    },
                ),
                None => report.push(
                    &record.id,
                    FindingKind::RelationshipMismatch {
                        details: format!("no relationship from parent '{parent}'"),
                    },
                ),
            }
        }
        if record.relation_type != first_edge.get(&record.id).copied() {
            report.push(
                &record.id,
                FindingKind::RelationshipMismatch {
                    details: "relation type disagrees with first relationship".to_owned(),
                },
            );
        }
    }

    for rel in &document.relationships {
        if !declared.contains(&(&rel.parent_id, &rel.child_id)) {
            report.push(
                &rel.child_id,
                FindingKind::RelationshipMismatch {
                    details: format!("undeclared relationship from parent '{}'", rel.parent_id),
                },
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
