//! The asset-mint seam.
//!
//! Minting the purchased units is the one effect the engine cannot verify
//! in advance, so finalization orders it before any funds move.

use rust_decimal::Decimal;

use crate::{AccountId, Result};

/// Mints asset units to a buyer once their order is finalized.
pub trait AssetIssuer {
    fn mint(&mut self, recipient: AccountId, asset: &str, units: Decimal) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Records every mint; can be toggled to refuse, for abort-path tests.
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Clone, Default)]
pub struct RecordingIssuer {
    minted: Vec<(AccountId, String, Decimal)>,
    failing: bool,
}

#[cfg(any(test, feature = "test-helpers"))]
impl RecordingIssuer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// While failing, every mint is rejected.
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// Total units minted to `recipient` for `asset`.
    #[must_use]
    pub fn minted_to(&self, recipient: AccountId, asset: &str) -> Decimal {
        self.minted
            .iter()
            .filter(|(to, a, _)| *to == recipient && a == asset)
            .map(|(_, _, units)| *units)
            .sum()
    }

    #[must_use]
    pub fn mint_count(&self) -> usize {
        self.minted.len()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl AssetIssuer for RecordingIssuer {
    fn mint(&mut self, recipient: AccountId, asset: &str, units: Decimal) -> Result<()> {
        if self.failing {
            return Err(crate::ClearholdError::MintRejected {
                reason: "issuer unavailable".to_string(),
            });
        }
        self.minted.push((recipient, asset.to_string(), units));
        Ok(())
    }
}
