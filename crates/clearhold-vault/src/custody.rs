//! Escrow custody core.
//!
//! The [`EscrowVault`] holds buyer funds under derived order keys until a
//! quorum of signers (or the order ledger, acting on its own lifecycle
//! rules) instructs a release. Funds only ever move through the payment
//! rail passed into each operation; the vault itself keeps the book of
//! record for what it is holding and for whom.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use clearhold_types::{
    AccountId, ApprovalOutcome, Authorizer, Capability, ClearholdError, Clock, Currency, Deposit,
    Dispute, DisputeKey, LedgerToken, OrderKey, Result, SettlementConfig, SignerSet,
};

// ============================================================
// Vault
// ============================================================

/// Custodian for order-scoped escrow deposits.
///
/// All mutating operations take `&mut self`, so a vault shared across
/// tasks serializes behind its lock and no release can observe another
/// release half-applied.
pub struct EscrowVault {
    pub(crate) account: AccountId,
    pub(crate) config: SettlementConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) auth: Arc<dyn Authorizer>,
    pub(crate) deposits: HashMap<OrderKey, Deposit>,
    pub(crate) release_approvals: HashMap<OrderKey, SignerSet>,
    pub(crate) disputes: HashMap<DisputeKey, Dispute>,
    pub(crate) dispute_approvals: HashMap<DisputeKey, SignerSet>,
    pub(crate) dispute_counter: u64,
    pub(crate) dividend_pools: HashMap<Currency, Decimal>,
}

impl EscrowVault {
    /// Creates an empty vault custodying funds under `account`.
    ///
    /// # Panics
    ///
    /// Panics if `account` is nil, if the configured signature threshold
    /// is zero, or if the dispute timeout does not precede the dispute
    /// expiration (the resolution window would be empty).
    #[must_use]
    pub fn new(
        account: AccountId,
        config: SettlementConfig,
        clock: Arc<dyn Clock>,
        auth: Arc<dyn Authorizer>,
    ) -> Self {
        assert!(!account.is_nil(), "vault account must not be nil");
        assert!(
            config.required_signatures >= 1,
            "signature threshold must be at least 1"
        );
        assert!(
            config.windows.dispute_timeout < config.windows.dispute_expiration,
            "dispute timeout must precede dispute expiration"
        );
        Self {
            account,
            config,
            clock,
            auth,
            deposits: HashMap::new(),
            release_approvals: HashMap::new(),
            disputes: HashMap::new(),
            dispute_approvals: HashMap::new(),
            dispute_counter: 0,
            dividend_pools: HashMap::new(),
        }
    }

    // ------------------------------------------------------------
    // Deposits
    // ------------------------------------------------------------

    /// Pulls `amount` from `buyer` into custody under `order`.
    ///
    /// The buyer must have approved the vault account as a spender on
    /// the rail beforehand. Repeat deposits accumulate, but only in the
    /// original currency and only from the original buyer.
    ///
    /// # Errors
    ///
    /// Fails without moving funds if the arguments are malformed, if an
    /// existing deposit disagrees on buyer or currency, or if the rail
    /// rejects the pull (balance or allowance too low).
    pub fn deposit(
        &mut self,
        token: &mut dyn LedgerToken,
        order: OrderKey,
        buyer: AccountId,
        amount: Decimal,
        asset: &str,
        currency: Currency,
    ) -> Result<()> {
        // 1. Validate the pull before anything moves.
        if buyer.is_nil() {
            return Err(ClearholdError::InvalidAccount);
        }
        if amount <= Decimal::ZERO {
            return Err(ClearholdError::InvalidAmount { amount });
        }
        if asset.is_empty() {
            return Err(ClearholdError::InvalidAsset);
        }
        if let Some(existing) = self.deposits.get(&order) {
            if existing.currency != currency {
                return Err(ClearholdError::DepositMismatch {
                    reason: format!(
                        "deposit is denominated in {}, got {currency}",
                        existing.currency
                    ),
                });
            }
            if existing.buyer != buyer {
                return Err(ClearholdError::DepositMismatch {
                    reason: "deposit belongs to a different buyer".to_string(),
                });
            }
        }

        // 2. Pull the funds. If the rail refuses, no custody record is
        //    created or touched.
        token.transfer_from(currency, buyer, self.account, self.account, amount)?;

        // 3. Record custody.
        let entry = self.deposits.entry(order).or_insert_with(|| Deposit {
            buyer,
            amount: Decimal::ZERO,
            asset: asset.to_string(),
            currency,
        });
        entry.amount += amount;

        debug!(
            order = %order,
            buyer = %buyer,
            amount = %amount,
            currency = %currency,
            held = %entry.amount,
            "Deposit custodied"
        );
        Ok(())
    }

    // ------------------------------------------------------------
    // Threshold releases
    // ------------------------------------------------------------

    /// Records a signer's approval to pay `amount` from `order`'s
    /// deposit to `to`, executing the release once the threshold is met.
    ///
    /// The signature that would tip the threshold is only recorded if
    /// the vault can actually cover the payout, so a failed execution
    /// never strands a full approval set.
    ///
    /// # Errors
    ///
    /// Fails if the caller lacks the signer capability, has already
    /// signed, or if the requested amount exceeds the deposit or the
    /// vault's rail balance.
    pub fn sign_release(
        &mut self,
        token: &mut dyn LedgerToken,
        caller: AccountId,
        order: OrderKey,
        to: AccountId,
        amount: Decimal,
    ) -> Result<ApprovalOutcome> {
        if !self.auth.check(caller, Capability::Signer) {
            return Err(ClearholdError::Unauthorized {
                reason: "release approval requires the signer capability".to_string(),
            });
        }
        if to.is_nil() {
            return Err(ClearholdError::InvalidAccount);
        }
        if amount <= Decimal::ZERO {
            return Err(ClearholdError::InvalidAmount { amount });
        }
        let deposit = self
            .deposits
            .get(&order)
            .ok_or(ClearholdError::DepositNotFound(order))?;
        if amount > deposit.amount {
            return Err(ClearholdError::ReleaseExceedsDeposit {
                requested: amount,
                held: deposit.amount,
            });
        }
        let currency = deposit.currency;

        let required = self.config.required_signatures;
        let set = self.release_approvals.entry(order).or_default();

        // Funds check happens before the tipping signature lands.
        let tips = !set.has_signed(caller) && set.count() + 1 >= required;
        if tips {
            let available = token.balance_of(currency, self.account);
            if available < amount {
                return Err(ClearholdError::InsufficientVaultFunds {
                    needed: amount,
                    available,
                });
            }
        }

        let approvals = set.record(caller)?;
        if approvals < required {
            debug!(
                order = %order,
                signer = %caller,
                approvals,
                required,
                "Release approval recorded"
            );
            return Ok(ApprovalOutcome::Pending {
                approvals,
                required,
            });
        }

        self.execute_release(token, order, to, amount)?;
        Ok(ApprovalOutcome::Executed)
    }

    /// Releases `amount` from `order`'s deposit to `to` without signer
    /// quorum.
    ///
    /// This is the order ledger's path: refunds and settlements whose
    /// authorization already happened at the lifecycle layer (buyer
    /// cancellation, finalized-order payout, admin recovery).
    ///
    /// # Errors
    ///
    /// Fails if no deposit exists under `order`, or if `amount` exceeds
    /// the deposit or the vault's rail balance.
    pub fn release(
        &mut self,
        token: &mut dyn LedgerToken,
        order: OrderKey,
        to: AccountId,
        amount: Decimal,
    ) -> Result<()> {
        if to.is_nil() {
            return Err(ClearholdError::InvalidAccount);
        }
        if amount <= Decimal::ZERO {
            return Err(ClearholdError::InvalidAmount { amount });
        }
        self.execute_release(token, order, to, amount)
    }

    /// Pays out part of a deposit and settles the custody book.
    ///
    /// Order of effects: rail transfer, deposit decrement, record
    /// deletion once drained, approval reset. Pending signatures for the
    /// order are cleared after every executed release so stale approvals
    /// can never replay against a refilled deposit.
    fn execute_release(
        &mut self,
        token: &mut dyn LedgerToken,
        order: OrderKey,
        to: AccountId,
        amount: Decimal,
    ) -> Result<()> {
        let deposit = self
            .deposits
            .get(&order)
            .ok_or(ClearholdError::DepositNotFound(order))?;
        if amount > deposit.amount {
            return Err(ClearholdError::ReleaseExceedsDeposit {
                requested: amount,
                held: deposit.amount,
            });
        }
        let currency = deposit.currency;
        let available = token.balance_of(currency, self.account);
        if available < amount {
            return Err(ClearholdError::InsufficientVaultFunds {
                needed: amount,
                available,
            });
        }

        token.transfer(currency, self.account, to, amount)?;

        let Some(deposit) = self.deposits.get_mut(&order) else {
            return Err(ClearholdError::DepositNotFound(order));
        };
        deposit.amount -= amount;
        let drained = deposit.is_drained();
        if drained {
            self.deposits.remove(&order);
        }
        self.release_approvals.remove(&order);

        info!(
            order = %order,
            to = %to,
            amount = %amount,
            currency = %currency,
            drained,
            "Custodied funds released"
        );
        Ok(())
    }

    // ------------------------------------------------------------
    // Recovery
    // ------------------------------------------------------------

    /// Moves `amount` of the vault's rail balance to `recipient`,
    /// bypassing deposits, approvals, and pools.
    ///
    /// Custody records are deliberately left untouched; reconciling them
    /// afterwards is the operator's problem, which is why this demands
    /// the admin capability.
    ///
    /// # Errors
    ///
    /// Fails if the caller lacks the admin capability or the vault's
    /// rail balance cannot cover `amount`.
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
            return Err(ClearholdError::InsufficientVaultFunds {
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
            "Emergency withdrawal from vault"
        );
        Ok(())
    }

    // ------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------

    /// Account the vault custodies funds under on the payment rail.
    #[must_use]
    pub fn account(&self) -> AccountId {
        self.account
    }

    #[must_use]
    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    /// Deposit currently held under `order`, if any.
    #[must_use]
    pub fn deposit_for(&self, order: &OrderKey) -> Option<&Deposit> {
        self.deposits.get(order)
    }

    #[must_use]
    pub fn deposit_count(&self) -> usize {
        self.deposits.len()
    }

    /// Signatures collected so far toward releasing `order`'s deposit.
    #[must_use]
    pub fn release_approval_count(&self, order: &OrderKey) -> usize {
        self.release_approvals.get(order).map_or(0, SignerSet::count)
    }

    /// Sum of all deposits held in `currency`.
    ///
    /// Together with the dividend pool this must equal the vault's rail
    /// balance whenever no operation is in flight.
    #[must_use]
    pub fn total_custodied(&self, currency: Currency) -> Decimal {
        self.deposits
            .values()
            .filter(|d| d.currency == currency)
            .map(|d| d.amount)
            .sum()
    }
}

// ============================================================
// Tests
// ============================================================
