//! Dispute records for the vault's custody contest sub-protocol.
//!
//! A dispute snapshots the deposit it contests at raise time. Resolution
//! signatures are only counted inside the `[timeout, expiration]` window:
//! the timeout gives the counterparty time to respond, the expiration stops
//! stale disputes from resolving long after the facts moved on.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, AssetId, ClearholdError, Currency, DisputeKey, OrderKey, Result};

/// A contest over the disposition of a custodied deposit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispute {
    pub key: DisputeKey,
    /// The order whose deposit is contested.
    pub order: OrderKey,
    pub buyer: AccountId,
    pub reason: String,
    /// Deposit amount snapshotted at raise time.
    pub amount: Decimal,
    pub asset: AssetId,
    pub currency: Currency,
    pub raised_at: DateTime<Utc>,
    /// Resolution opens here.
    pub timeout_at: DateTime<Utc>,
    /// Resolution closes here.
    pub expires_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolved_to: Option<AccountId>,
}

impl Dispute {
    /// Whether resolution signatures may be counted at `now`. Both window
    /// bounds are inclusive.
    #[must_use]
    pub fn resolution_window_open(&self, now: DateTime<Utc>) -> bool {
        now >= self.timeout_at && now <= self.expires_at
    }

    /// Permanently mark the dispute resolved in favour of `to`.
    pub fn mark_resolved(&mut self, to: AccountId) -> Result<()> {
        if self.resolved {
            return Err(ClearholdError::DisputeAlreadyResolved(self.key));
        }
        self.resolved = true;
        self.resolved_to = Some(to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn dummy(raised_at: DateTime<Utc>) -> Dispute {
        Dispute {
            key: DisputeKey::derive(0),
            order: OrderKey([7u8; 32]),
            buyer: AccountId::new(),
            reason: "units never conveyed".to_string(),
            amount: Decimal::new(41, 0),
            asset: "VILLA-A".to_string(),
            currency: Currency::Usdt,
            raised_at,
            timeout_at: raised_at + Duration::days(7),
            expires_at: raised_at + Duration::days(30),
            resolved: false,
            resolved_to: None,
        }
    }

    #[test]
    fn window_bounds_inclusive() {
        let raised = Utc::now();
        let dispute = dummy(raised);
        assert!(!dispute.resolution_window_open(raised));
        assert!(!dispute.resolution_window_open(raised + Duration::days(7) - Duration::seconds(1)));
        assert!(dispute.resolution_window_open(dispute.timeout_at));
        assert!(dispute.resolution_window_open(raised + Duration::days(8)));
        assert!(dispute.resolution_window_open(dispute.expires_at));
        assert!(!dispute.resolution_window_open(dispute.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn resolution_is_permanent() {
        let mut dispute = dummy(Utc::now());
        let winner = AccountId::new();
        dispute.mark_resolved(winner).unwrap();
        assert!(dispute.resolved);
        assert_eq!(dispute.resolved_to, Some(winner));
        assert!(matches!(
            dispute.mark_resolved(AccountId::new()),
            Err(ClearholdError::DisputeAlreadyResolved(_))
        ));
        // First resolution stands.
        assert_eq!(dispute.resolved_to, Some(winner));
    }

    #[test]
    fn serde_roundtrip() {
        let dispute = dummy(Utc::now());
        let json = serde_json::to_string(&dispute).unwrap();
        let back: Dispute = serde_json::from_str(&json).unwrap();
        assert_eq!(dispute, back);
    }
}
