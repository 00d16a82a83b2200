//! Typed edges between receipts.
//!
//! A [`Relationship`] always points from an existing parent to the child that
//! declared it. Relationships are recorded together with their child receipt
//! and are immutable afterwards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::receipt::ReceiptId;
use crate::GraphError;

// ---------------------------------------------------------------------------
// RelationType
// ---------------------------------------------------------------------------

/// Closed set of edge semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    /// The parent triggered the child.
    Causes,
    /// The child is evidence supporting the parent.
    Evidences,
    /// The child completes an obligation stated by the parent.
    Fulfills,
    /// The child voids the parent.
    Invalidates,
    /// The child corrects the parent.
    Amends,
    /// Informational link with no causal weight.
    References,
}

impl RelationType {
    /// Every relation type, in declaration order.
    pub const ALL: [RelationType; 6] = [
        RelationType::Causes,
        RelationType::Evidences,
        RelationType::Fulfills,
        RelationType::Invalidates,
        RelationType::Amends,
        RelationType::References,
    ];

    /// Lowercase wire tag.
    pub fn as_str(self) -> &'static str {
        match self {
            RelationType::Causes => "causes",
            RelationType::Evidences => "evidences",
            RelationType::Fulfills => "fulfills",
            RelationType::Invalidates => "invalidates",
            RelationType::Amends => "amends",
            RelationType::References => "references",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = GraphError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        RelationType::ALL
            .into_iter()
            .find(|r| r.as_str() == tag)
            .ok_or_else(|| GraphError::InvalidRelationType {
                tag: tag.to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// Relationship
// ---------------------------------------------------------------------------

/// A typed parent -> child edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    /// The older receipt.
    pub parent_id: ReceiptId,
    /// The receipt that declared this edge.
    pub child_id: ReceiptId,
    /// Edge semantics.
    pub relation_type: RelationType,
    /// Free-form explanation.
    pub description: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_every_tag() {
        for relation in RelationType::ALL {
            assert_eq!(relation.as_str().parse::<RelationType>().unwrap(), relation);
        }
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!("Fulfills".parse::<RelationType>().is_err());
        assert!("".parse::<RelationType>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_tags() {
        let json = serde_json::to_string(&RelationType::Invalidates).unwrap();
        assert_eq!(json, "\"invalidates\"");
        assert!(serde_json::from_str::<RelationType>("\"supersedes\"").is_err());
    }
}
