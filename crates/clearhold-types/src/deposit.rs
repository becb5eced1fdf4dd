//! Per-order custody records held by the Escrow Vault.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, AssetId, Currency};

/// Funds held in vault custody against a single order.
///
/// Created on the first deposit for an order, accumulated on later deposits
/// (which must agree on buyer and currency), decremented on each release,
/// and removed once the amount reaches zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    pub buyer: AccountId,
    pub amount: Decimal,
    pub asset: AssetId,
    pub currency: Currency,
}

impl Deposit {
    /// A drained deposit is deleted by the vault.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.amount.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drained_detection() {
        let mut deposit = Deposit {
            buyer: AccountId::new(),
            amount: Decimal::new(41, 0),
            asset: "VILLA-A".to_string(),
            currency: Currency::Usdt,
        };
        assert!(!deposit.is_drained());
        deposit.amount = Decimal::ZERO;
        assert!(deposit.is_drained());
    }

    #[test]
    fn serde_roundtrip() {
        let deposit = Deposit {
            buyer: AccountId::new(),
            amount: Decimal::new(201, 0),
            asset: "VILLA-A".to_string(),
            currency: Currency::Usdc,
        };
        let json = serde_json::to_string(&deposit).unwrap();
        let back: Deposit = serde_json::from_str(&json).unwrap();
        assert_eq!(deposit, back);
    }
}
