//! End-to-end scenario: an order that is fulfilled across domains, amended,
//! and finally refunded, queried the way a presentation layer would.

use provenant_graph::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

fn id(s: &str) -> ReceiptId {
    ReceiptId::new(s)
}

/// order -> {invoice, pick} ; pick -> ship ; invoice -> invoice-fix (amends);
/// {invoice-fix, ship} -> delivered ; {delivered, order} -> refund.
fn scenario(config: GraphConfig) -> ReceiptStore {
    let mut store = ReceiptStore::with_config(config).unwrap();
    let drafts = vec![
        ReceiptDraft::new("order", Domain::Transaction, "order.placed")
            .with_label("Order #1001")
            .with_payload(r#"{"total":"49.00"}"#),
        ReceiptDraft::new("invoice", Domain::Content, "invoice.issued")
            .with_parent("order", RelationType::Fulfills),
        ReceiptDraft::new("pick", Domain::Operations, "warehouse.picked")
            .with_parent("order", RelationType::Causes),
        ReceiptDraft::new("ship", Domain::Operations, "shipment.sent")
            .with_parent("pick", RelationType::Causes),
        ReceiptDraft::new("invoice-fix", Domain::Content, "invoice.corrected").with_link(
            ParentLink::tagged("invoice", "amends", "VAT corrected").unwrap(),
        ),
        ReceiptDraft::new("delivered", Domain::Operations, "delivery.confirmed")
            .with_parent("invoice-fix", RelationType::Evidences)
            .with_parent("ship", RelationType::Fulfills),
        ReceiptDraft::new("refund", Domain::Transaction, "refund.issued")
            .with_parent("delivered", RelationType::Invalidates)
            .with_parent("order", RelationType::Invalidates),
    ];
    for draft in drafts {
        store.append(draft).unwrap();
    }
    store
}

#[test]
fn scenario_depths_and_lineage() {
    init_tracing();
    let store = scenario(GraphConfig::default());

    assert_eq!(store.get(&id("delivered")).unwrap().depth, 3);
    assert_eq!(store.get(&id("refund")).unwrap().depth, 4);

    let ancestors: Vec<&str> = store
        .ancestors(&id("refund"))
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(
        ancestors,
        vec!["order", "invoice", "pick", "ship", "invoice-fix", "delivered"]
    );
}

#[test]
fn scenario_prove_the_refund() {
    init_tracing();
    let store = scenario(GraphConfig::default());
    let paths = find_paths(&store, &id("order"), &id("refund"));

    let routes: Vec<Vec<&str>> = paths
        .iter()
        .map(|p| p.receipt_ids.iter().map(|r| r.as_str()).collect())
        .collect();
    assert_eq!(
        routes,
        vec![
            vec!["order", "invoice", "invoice-fix", "delivered", "refund"],
            vec!["order", "pick", "ship", "delivered", "refund"],
            vec!["order", "refund"],
        ]
    );
    assert_eq!(
        paths[0].relations,
        vec![
            RelationType::Fulfills,
            RelationType::Amends,
            RelationType::Evidences,
            RelationType::Invalidates
        ]
    );
}

#[test]
fn scenario_limits_from_config() {
    init_tracing();
    let config = GraphConfig::from_json(r#"{"max_paths": 1, "default_tier": {"max_depth": 3}}"#)
        .unwrap();
    let store = scenario(config);

    let search = find_paths_with_limits(
        &store,
        &id("order"),
        &id("refund"),
        store.config().path_limits(),
    );
    assert_eq!(search.paths.len(), 1);
    assert!(search.truncated);

    let view = store.visible_at_default_tier();
    let hidden: Vec<&str> = view.hidden().iter().map(|r| r.as_str()).collect();
    assert_eq!(hidden, vec!["delivered", "refund"]);
}

#[test]
fn scenario_completeness() {
    init_tracing();
    let store = scenario(GraphConfig::default());

    // Operations + content parents, declared fulfils, depth > 0.
    assert!(store.completeness(&id("delivered")).is_full());
    // Operations + transaction parents, but only invalidates edges.
    assert_eq!(store.completeness(&id("refund")).value(), 0.75);
    // Single parent, causes.
    assert_eq!(store.completeness(&id("pick")).value(), 0.5);
}

#[test]
fn rejected_append_keeps_store_consistent() {
    init_tracing();
    let mut store = scenario(GraphConfig::default());
    let before = store.len();
    let relationships_before = store.relationships().len();

    let err = store
        .append(
            ReceiptDraft::new("chargeback", Domain::Transaction, "chargeback")
                .with_parent("refund", RelationType::Causes)
                .with_parent("dispute", RelationType::Causes),
        )
        .unwrap_err();
    assert_eq!(
        err,
        GraphError::MissingParent {
            receipt: id("chargeback"),
            parent: id("dispute"),
        }
    );
    assert_eq!(store.len(), before);
    assert_eq!(store.relationships().len(), relationships_before);
    assert!(store.children_of(&id("refund")).is_empty());

    // The logical clock did not advance either.
    let next = store
        .append(ReceiptDraft::new("dispute", Domain::Transaction, "dispute.opened"))
        .unwrap();
    assert_eq!(next.crypto.timestamp, before as u64);
}
