//! The order ledger and its book of record.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::warn;

use clearhold_types::{
    AccountId, Authorizer, Capability, ClearholdError, Clock, Currency, LedgerToken, Order,
    OrderKey, Result, SettlementConfig, SignerSet,
};

// ============================================================
// Ledger
// ============================================================

/// Owner of order records, their state machine, and the signature ledger
/// for fund releases.
///
/// The ledger decides *whether* funds may move; the vault it instructs is
/// the component that moves them. Mutating operations take `&mut self`, so
/// a ledger shared across tasks serializes behind its lock.
pub struct OrderLedger {
    pub(crate) account: AccountId,
    pub(crate) config: SettlementConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) auth: Arc<dyn Authorizer>,
    pub(crate) orders: HashMap<OrderKey, Order>,
    pub(crate) release_approvals: HashMap<OrderKey, SignerSet>,
    /// Placement counter mixed into key derivation. Advances only after a
    /// placement's custody deposit succeeds.
    pub(crate) nonce: u64,
}

impl OrderLedger {
    /// Creates an empty ledger operating `account` against the configured
    /// project.
    ///
    /// # Panics
    ///
    /// Panics if `account` is nil, if the signature threshold is zero, if
    /// either configured percentage exceeds 100, or if the investment
    /// bounds are inverted.
    #[must_use]
    pub fn new(
        account: AccountId,
        config: SettlementConfig,
        clock: Arc<dyn Clock>,
        auth: Arc<dyn Authorizer>,
    ) -> Self {
        assert!(!account.is_nil(), "ledger account must not be nil");
        assert!(
            config.required_signatures >= 1,
            "signature threshold must be at least 1"
        );
        assert!(
            config.project.eoi_percent <= 100,
            "EOI percent must not exceed 100"
        );
        assert!(
            config.project.dividend_percent <= 100,
            "dividend percent must not exceed 100"
        );
        assert!(
            config.project.min_investment <= config.project.max_investment,
            "investment bounds are inverted"
        );
        Self {
            account,
            config,
            clock,
            auth,
            orders: HashMap::new(),
            release_approvals: HashMap::new(),
            nonce: 0,
        }
    }

    // ------------------------------------------------------------
    // Recovery
    // ------------------------------------------------------------

    /// Moves `amount` of the ledger's own rail balance to `recipient`.
    ///
    /// Order-linked funds live in the vault, never here; this sweep exists
    /// for recovering stray transfers sent to the ledger account.
    ///
    /// # Errors
    ///
    /// Fails if the caller lacks the admin capability or the balance
    /// cannot cover `amount`.
    pub fn emergency_withdraw(
        &mut self,
        token: &mut dyn LedgerToken,
        caller: AccountId,
        recipient: AccountId,
        currency: Currency,
        amount: Decimal,
    ) -> Result<()> {
        if !self.auth.check(caller, Capability::Admin) {
            return Err(ClearholdError::Unauthorized {
                reason: "emergency withdrawal requires the admin capability".to_string(),
            });
        }
        if recipient.is_nil() {
            return Err(ClearholdError::InvalidAccount);
        }
        if amount <= Decimal::ZERO {
            return Err(ClearholdError::InvalidAmount { amount });
        }
        let available = token.balance_of(currency, self.account);
        if available < amount {
            return Err(ClearholdError::InsufficientBalance {
                needed: amount,
                available,
            });
        }

        token.transfer(currency, self.account, recipient, amount)?;

        warn!(
            recipient = %recipient,
            amount = %amount,
            currency = %currency,
            by = %caller,
            "Emergency withdrawal from ledger"
        );
        Ok(())
    }

    // ------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------

    /// Account the ledger itself holds rail funds under (distinct from the
    /// vault's custody account).
    #[must_use]
    pub fn account(&self) -> AccountId {
        self.account
    }

    #[must_use]
    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    #[must_use]
    pub fn order(&self, key: &OrderKey) -> Option<&Order> {
        self.orders.get(key)
    }

    #[must_use]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Signatures collected so far toward releasing `order`'s funds.
    #[must_use]
    pub fn release_approval_count(&self, order: &OrderKey) -> usize {
        self.release_approvals.get(order).map_or(0, SignerSet::count)
    }
}

// ============================================================
// Tests
// ============================================================
