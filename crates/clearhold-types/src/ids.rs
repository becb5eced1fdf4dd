//! Identifiers used throughout ClearHold.
//!
//! Principal and project identities use UUIDv7 for time-ordered
//! lexicographic sorting. Order and dispute keys are derived 256-bit
//! SHA-256 digests so that the same inputs always name the same record.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Unique identifier for a principal: buyer, signer, project owner, or a
/// component's own custody account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// The all-zero account. Never a valid principal; operations reject it.
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// The nil account is never a valid principal; operations reject it.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ProjectId
// ---------------------------------------------------------------------------

/// Unique identifier for a tokenized asset project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ProjectId(pub Uuid);

impl ProjectId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ChainId
// ---------------------------------------------------------------------------

/// Settlement-rail selector mixed into order key derivation so the same
/// order placed against different rails never collides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// OrderKey
// ---------------------------------------------------------------------------

/// Derived 256-bit order identifier.
///
/// Computed as SHA-256 over a domain separator and
/// `(buyer, project, chain, asset, nonce)` where `nonce` is the ledger's
/// monotonic placement counter. The same inputs always derive the same key,
/// and the nonce guarantees a fresh key per placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderKey(pub [u8; 32]);

impl OrderKey {
    #[must_use]
    pub fn derive(
        buyer: AccountId,
        project: ProjectId,
        chain: ChainId,
        asset: &str,
        nonce: u64,
    ) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"clearhold:order:v1:");
        hasher.update(buyer.0.as_bytes());
        hasher.update(project.0.as_bytes());
        hasher.update(chain.0.to_le_bytes());
        hasher.update(asset.as_bytes());
        hasher.update(nonce.to_le_bytes());
        Self(hasher.finalize().into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ord:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// DisputeKey
// ---------------------------------------------------------------------------

/// Derived 256-bit dispute identifier, keyed off the vault's monotonic
/// dispute counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct DisputeKey(pub [u8; 32]);

impl DisputeKey {
    #[must_use]
    pub fn derive(counter: u64) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"clearhold:dispute:v1:");
        hasher.update(counter.to_le_bytes());
        Self(hasher.finalize().into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for DisputeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dsp:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_uniqueness() {
        let a = AccountId::new();
        let b = AccountId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn account_id_ordering() {
        let a = AccountId::new();
        let b = AccountId::new();
        assert!(a < b);
    }

    #[test]
    fn nil_account_detection() {
        assert!(AccountId::nil().is_nil());
        assert!(!AccountId::new().is_nil());
    }

    #[test]
    fn order_key_deterministic() {
        let buyer = AccountId::new();
        let project = ProjectId::new();
        let chain = ChainId(137);
        let a = OrderKey::derive(buyer, project, chain, "VILLA-A", 0);
        let b = OrderKey::derive(buyer, project, chain, "VILLA-A", 0);
        assert_eq!(a, b);
    }

    #[test]
    fn order_key_varies_with_nonce() {
        let buyer = AccountId::new();
        let project = ProjectId::new();
        let chain = ChainId(137);
        let a = OrderKey::derive(buyer, project, chain, "VILLA-A", 0);
        let b = OrderKey::derive(buyer, project, chain, "VILLA-A", 1);
        assert_ne!(a, b);
    }

    #[test]
    fn order_key_varies_with_buyer() {
        let project = ProjectId::new();
        let chain = ChainId(137);
        let a = OrderKey::derive(AccountId::new(), project, chain, "VILLA-A", 0);
        let b = OrderKey::derive(AccountId::new(), project, chain, "VILLA-A", 0);
        assert_ne!(a, b);
    }

    #[test]
    fn dispute_key_varies_with_counter() {
        let a = DisputeKey::derive(0);
        let b = DisputeKey::derive(1);
        assert_ne!(a, b);
        assert_eq!(a, DisputeKey::derive(0));
    }

    #[test]
    fn key_display_prefixes() {
        let key = OrderKey::derive(AccountId::new(), ProjectId::new(), ChainId(1), "X", 0);
        assert!(key.to_string().starts_with("ord:"));
        let dsp = DisputeKey::derive(7);
        assert!(dsp.to_string().starts_with("dsp:"));
        assert_eq!(key.short().len(), 8);
    }

    #[test]
    fn serde_roundtrips() {
        let acc = AccountId::new();
        let json = serde_json::to_string(&acc).unwrap();
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(acc, back);

        let key = OrderKey::derive(acc, ProjectId::new(), ChainId(1), "VILLA-A", 3);
        let json = serde_json::to_string(&key).unwrap();
        let back: OrderKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, back);
    }
}
