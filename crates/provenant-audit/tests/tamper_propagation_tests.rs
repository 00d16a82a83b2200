//! Tamper detection over exported documents.
//!
//! Random receipt graphs are exported, one record is edited, and the verifier
//! must flag exactly that record and its descendants.

use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;
use provenant_audit::prelude::*;
use provenant_graph::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Field of a record to edit.
#[derive(Debug, Clone, Copy)]
enum Edit {
    Label,
    ReceiptType,
    Domain,
    PayloadDigest,
    Timestamp,
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        Just(Edit::Label),
        Just(Edit::ReceiptType),
        Just(Edit::Domain),
        Just(Edit::PayloadDigest),
        Just(Edit::Timestamp),
    ]
}

fn apply(edit: Edit, record: &mut ExportRecord) {
    match edit {
        Edit::Label => record.label.push_str(" (edited)"),
        Edit::ReceiptType => record.receipt_type = format!("{}.forged", record.receipt_type),
        Edit::Domain => {
            record.domain = match record.domain {
                Domain::Transaction => Domain::Content,
                Domain::Content => Domain::Operations,
                Domain::Operations => Domain::Transaction,
            }
        }
        Edit::PayloadDigest => record.payload_digest = Digest::of(b"substituted payload"),
        Edit::Timestamp => record.timestamp += 1_000,
    }
}

/// Build a store where receipt `i` takes parents from `picks[i]` (mod i).
fn build(picks: &[Vec<usize>]) -> ReceiptStore {
    let mut store = ReceiptStore::new();
    for (i, parents) in picks.iter().enumerate() {
        let mut draft = ReceiptDraft::new(format!("r{i}"), Domain::ALL[i % 3], "generated")
            .with_label(format!("receipt {i}"))
            .with_payload(format!("payload {i}").as_str());
        if i > 0 {
            let mut seen = HashSet::new();
            for pick in parents {
                let p = pick % i;
                if seen.insert(p) {
                    draft = draft.with_parent(format!("r{p}"), RelationType::Causes);
                }
            }
        }
        store.append(draft).unwrap();
    }
    store
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn edit_flags_record_and_descendants(
        picks in prop::collection::vec(prop::collection::vec(0..64usize, 0..3), 2..25),
        pick in 0..64usize,
        edit in edit_strategy(),
    ) {
        init_tracing();
        let store = build(&picks);
        let k = pick % store.len();
        let target = store.receipts()[k].id.clone();

        let mut doc = export_store(&store);
        apply(edit, &mut doc.receipts[k]);
        let report = verify_document(&doc, store.generator().key_id());

        let expected: BTreeSet<ReceiptId> = store
            .descendants(&target)
            .into_iter()
            .map(|r| r.id.clone())
            .chain(std::iter::once(target.clone()))
            .collect();
        prop_assert_eq!(report.tampered_ids(), expected);
        prop_assert!(!report.result_for(&target).ok);
    }

    #[test]
    fn untouched_export_verifies_after_json_roundtrip(
        picks in prop::collection::vec(prop::collection::vec(0..64usize, 0..3), 1..25),
    ) {
        let store = build(&picks);
        let json = export_store(&store).to_json().unwrap();
        let doc = ExportDocument::from_json(&json).unwrap();
        let report = verify_document(&doc, store.generator().key_id());
        prop_assert!(report.is_intact());
        prop_assert_eq!(report.checked, store.len());
    }
}

#[test]
fn verify_store_matches_verify_document() {
    init_tracing();
    let store = build(&[vec![], vec![0], vec![0, 1], vec![2]]);
    assert_eq!(
        verify_store(&store),
        verify_document(&export_store(&store), store.generator().key_id())
    );
    assert!(verify_store(&store).is_intact());
}

#[test]
fn report_serializes_for_callers() {
    let store = build(&[vec![], vec![0]]);
    let mut doc = export_store(&store);
    doc.receipts[1].depth = 9;

    let report = verify_document(&doc, store.generator().key_id());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["checked"], 2);
    assert_eq!(json["findings"][0]["receipt_id"], "r1");
    assert_eq!(json["findings"][0]["kind"], "depth_mismatch");
}

#[test]
fn deep_chain_verifies_and_propagates() {
    init_tracing();
    let len = 20_000;
    let mut store = ReceiptStore::new();
    for i in 0..len {
        let mut draft = ReceiptDraft::new(format!("c{i}"), Domain::ALL[i % 3], "step");
        if i > 0 {
            draft = draft.with_parent(format!("c{}", i - 1), RelationType::Causes);
        }
        store.append(draft).unwrap();
    }

    let report = verify_store(&store);
    assert!(report.is_intact());
    assert_eq!(report.checked, len);

    let mut doc = export_store(&store);
    doc.receipts[len - 10].label.push_str(" (edited)");
    let report = verify_document(&doc, store.generator().key_id());
    assert_eq!(report.tampered_ids().len(), 10);
    assert!(!report.result_for(&ReceiptId::new(format!("c{}", len - 1))).ok);
    assert!(report.result_for(&ReceiptId::new(format!("c{}", len - 11))).ok);
}
