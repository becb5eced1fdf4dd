//! Per-action signature ledgers for threshold approval.
//!
//! Each release or dispute resolution carries its own [`SignerSet`]: the
//! principals who have approved it so far. The set is cleared once the
//! threshold action executes, so the same nominal action can never replay
//! against stale approvals.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{AccountId, ClearholdError, Result};

// ---------------------------------------------------------------------------
// SignerSet
// ---------------------------------------------------------------------------

/// The approvals recorded against one nominal action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerSet {
    signers: HashSet<AccountId>,
}

impl SignerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an approval. Returns the new count, or `AlreadySigned` if the
    /// principal already approved.
    pub fn record(&mut self, signer: AccountId) -> Result<usize> {
        if !self.signers.insert(signer) {
            return Err(ClearholdError::AlreadySigned { signer });
        }
        Ok(self.signers.len())
    }

    /// Remove a recorded approval so a failed downstream effect unwinds the
    /// recording. Returns whether the signer had approved.
    pub fn revoke(&mut self, signer: AccountId) -> bool {
        self.signers.remove(&signer)
    }

    #[must_use]
    pub fn has_signed(&self, signer: AccountId) -> bool {
        self.signers.contains(&signer)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.signers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    /// Reset after the threshold action executed.
    pub fn clear(&mut self) {
        self.signers.clear();
    }
}

// ---------------------------------------------------------------------------
// ApprovalOutcome
// ---------------------------------------------------------------------------

/// What a threshold-gated signing call achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalOutcome {
    /// Approval recorded; the threshold has not been reached yet.
    Pending { approvals: usize, required: usize },
    /// This approval tipped the threshold and the action executed.
    Executed,
}

impl ApprovalOutcome {
    #[must_use]
    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
