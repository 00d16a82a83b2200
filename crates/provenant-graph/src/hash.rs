//! Deterministic hash chaining for receipts.
//!
//! The [`HashChainGenerator`] turns a receipt's identity, content digest and
//! immediate-parent hashes into a [`CryptoFields`] bundle. It holds no mutable
//! state and draws no randomness, so any verifier holding the same key id can
//! recompute every field and compare.
//!
//! # Chaining
//!
//! - `parent_hash` is the BLAKE3 digest of the parents' *hashes*, sorted and
//!   concatenated. Roots use [`Digest::EMPTY`].
//! - `hash` covers the id, domain, type, label, payload digest, `parent_hash`
//!   and the logical timestamp, each length-prefixed under a fixed context tag.
//! - `signature` is a keyed BLAKE3 digest of `hash`, keyed by
//!   [`blake3::derive_key`] over the key id.
//!
//! Changing any hashed field of a receipt therefore changes its `hash`, the
//! `parent_hash` of each child, and transitively every descendant.
//!
//! The signature is a stand-in: it proves the bundle was produced by someone
//! who knows the key id, which is not a secret. Replacing it with a real
//! signature scheme only touches [`HashChainGenerator::sign`].
//!
//! # Example
//!
//! ```
//! use provenant_graph::hash::{Digest, HashChainGenerator, HashInput};
//! use provenant_graph::receipt::{Domain, ReceiptId};
//!
//! let generator = HashChainGenerator::new("demo-key");
//! let id = ReceiptId::new("order-1");
//! let input = HashInput {
//!     id: &id,
//!     domain: Domain::Transaction,
//!     receipt_type: "order.placed",
//!     label: "Order placed",
//!     payload_digest: Digest::of(b"{}"),
//!     parent_hashes: &[],
//!     timestamp: 0,
//! };
//!
//! let a = generator.generate(&input);
//! let b = generator.generate(&input);
//! assert_eq!(a, b);
//! assert_eq!(a.parent_hash, Digest::EMPTY);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::receipt::{CryptoFields, Domain, ReceiptId};

/// Context tag mixed into every receipt hash.
const RECEIPT_HASH_CONTEXT: &[u8] = b"provenant.receipt.v1";

/// Context string for deriving signing keys from key ids.
const SIGNING_KEY_CONTEXT: &str = "provenant 2024-06 receipt signing key";

// ---------------------------------------------------------------------------
// Digest
// ---------------------------------------------------------------------------

/// A 32-byte BLAKE3 output. Serialized as 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Sentinel used as the `parent_hash` of root receipts.
    pub const EMPTY: Digest = Digest([0u8; 32]);

    /// BLAKE3 of `bytes`.
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns `true` for [`Digest::EMPTY`].
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl From<blake3::Hash> for Digest {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl FromStr for Digest {
    type Err = hex::FromHexError;

    /// Parse exactly 64 hex characters.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(text, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Digest({}..)", &hex[..12])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// HashInput
// ---------------------------------------------------------------------------

/// Everything the generator hashes for one receipt.
///
/// `parent_hashes` may be given in any order; the generator sorts them.
#[derive(Debug, Clone)]
pub struct HashInput<'a> {
    /// Receipt identifier.
    pub id: &'a ReceiptId,
    /// Receipt domain.
    pub domain: Domain,
    /// Free-form type tag.
    pub receipt_type: &'a str,
    /// Human-readable label.
    pub label: &'a str,
    /// BLAKE3 digest of the opaque payload.
    pub payload_digest: Digest,
    /// Hashes of the immediate parents.
    pub parent_hashes: &'a [Digest],
    /// Logical timestamp.
    pub timestamp: u64,
}

// ---------------------------------------------------------------------------
// HashChainGenerator
// ---------------------------------------------------------------------------

/// Produces [`CryptoFields`] for receipts. Cheap to clone.
#[derive(Clone)]
pub struct HashChainGenerator {
    key_id: String,
    signing_key: [u8; 32],
}

impl fmt::Debug for HashChainGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashChainGenerator")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl HashChainGenerator {
    /// Build a generator whose signing key is derived from `key_id`.
    pub fn new(key_id: impl Into<String>) -> Self {
        let key_id = key_id.into();
        let signing_key = blake3::derive_key(SIGNING_KEY_CONTEXT, key_id.as_bytes());
        Self {
            key_id,
            signing_key,
        }
    }

    /// The key id stamped on every bundle.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Compute the full integrity bundle for one receipt.
    pub fn generate(&self, input: &HashInput<'_>) -> CryptoFields {
        let parent_hash = Self::parent_hash(input.parent_hashes);
        let hash = Self::receipt_hash(input, &parent_hash);
        CryptoFields {
            hash,
            parent_hash,
            signature: self.sign(&hash),
            timestamp: input.timestamp,
            key_id: self.key_id.clone(),
        }
    }

    /// Digest of the sorted, concatenated parent hashes.
    ///
    /// Returns [`Digest::EMPTY`] when there are no parents.
    pub fn parent_hash(parent_hashes: &[Digest]) -> Digest {
        if parent_hashes.is_empty() {
            return Digest::EMPTY;
        }
        let mut sorted = parent_hashes.to_vec();
        sorted.sort_unstable();

        let mut hasher = blake3::Hasher::new();
        for digest in &sorted {
            hasher.update(digest.as_bytes());
        }
        hasher.finalize().into()
    }

    /// Digest over the receipt's fields and its already-computed parent hash.
    pub fn receipt_hash(input: &HashInput<'_>, parent_hash: &Digest) -> Digest {
        let mut hasher = blake3::Hasher::new();
        update_framed(&mut hasher, RECEIPT_HASH_CONTEXT);
        update_framed(&mut hasher, input.id.as_str().as_bytes());
        update_framed(&mut hasher, input.domain.as_str().as_bytes());
        update_framed(&mut hasher, input.receipt_type.as_bytes());
        update_framed(&mut hasher, input.label.as_bytes());
        update_framed(&mut hasher, input.payload_digest.as_bytes());
        update_framed(&mut hasher, parent_hash.as_bytes());
        hasher.update(&input.timestamp.to_le_bytes());
        hasher.finalize().into()
    }

    /// Keyed digest of `hash`.
    pub fn sign(&self, hash: &Digest) -> Digest {
        blake3::keyed_hash(&self.signing_key, hash.as_bytes()).into()
    }
}

/// Length-prefix a field so adjacent fields cannot bleed into each other.
fn update_framed(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
