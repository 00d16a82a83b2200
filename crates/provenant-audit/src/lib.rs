//! Provenant Audit -- export and integrity verification for receipt graphs.
//!
//! This crate consumes a [`ReceiptStore`](provenant_graph::store::ReceiptStore)
//! built with [`provenant_graph`] and provides:
//!
//! - [`export`]: a flat, versioned [`ExportDocument`](export::ExportDocument)
//!   with a JSON codec, ready for a "save as file" action.
//! - [`verify`]: recomputes the hash chain of a store or document and reports
//!   every record whose integrity fields no longer add up.
//!
//! Completeness scores from the graph crate measure coverage; only this
//! crate's verifier says anything about tampering.

#![deny(unsafe_code)]

pub mod export;
pub mod verify;

/// Errors produced by export parsing.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The document is not valid JSON for the export schema.
    #[error("export document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document was written by an incompatible format version.
    #[error("unsupported export version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::export::{export_store, ExportDocument, ExportRecord, EXPORT_FORMAT_VERSION};
    pub use crate::verify::{
        verify_document, verify_store, Finding, FindingKind, IntegrityReport, VerifyResult,
    };
    pub use crate::AuditError;
}
