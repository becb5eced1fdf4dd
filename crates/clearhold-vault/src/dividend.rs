//! Per-rail dividend pool.
//!
//! Finalized orders fund the pool; admins pay investors out of it. The
//! pool is bookkeeping over the vault's single rail balance, segregated
//! per currency so a USDT distribution can never draw on USDC deposits.

use rust_decimal::Decimal;
use tracing::{debug, info};

use clearhold_types::{
    AccountId, Capability, ClearholdError, Currency, LedgerToken, Result,
};

use crate::EscrowVault;

impl EscrowVault {
    /// Pulls `amount` from `payer` into the `currency` dividend pool.
    ///
    /// The payer must have approved the vault account as a spender, same
    /// as for order deposits.
    ///
    /// # Errors
    ///
    /// Fails without moving funds if the arguments are malformed or the
    /// rail rejects the pull.
    pub fn deposit_dividend(
        &mut self,
        token: &mut dyn LedgerToken,
        payer: AccountId,
        currency: Currency,
        amount: Decimal,
    ) -> Result<()> {
        if payer.is_nil() {
            return Err(ClearholdError::InvalidAccount);
        }
        if amount <= Decimal::ZERO {
            return Err(ClearholdError::InvalidAmount { amount });
        }

        token.transfer_from(currency, payer, self.account, self.account, amount)?;
        let pool = self.dividend_pools.entry(currency).or_insert(Decimal::ZERO);
        *pool += amount;

        debug!(
            payer = %payer,
            amount = %amount,
            currency = %currency,
            pool = %pool,
            "Dividend deposited"
        );
        Ok(())
    }

    /// Pays `amount` from the `currency` pool to `recipient`.
    ///
    /// # Errors
    ///
    /// Fails if the caller lacks the admin capability, or if the pool or
    /// the vault's rail balance cannot cover `amount`.
    pub fn distribute_dividend(
        &mut self,
        token: &mut dyn LedgerToken,
        caller: AccountId,
        recipient: AccountId,
        currency: Currency,
        amount: Decimal,
    ) -> Result<()> {
        if !self.auth.check(caller, Capability::Admin) {
            return Err(ClearholdError::Unauthorized {
                reason: "dividend distribution requires the admin capability".to_string(),
            });
        }
        if recipient.is_nil() {
            return Err(ClearholdError::InvalidAccount);
        }
        if amount <= Decimal::ZERO {
            return Err(ClearholdError::InvalidAmount { amount });
        }
        let pool = self.dividend_pool(currency);
        if pool < amount {
            return Err(ClearholdError::InsufficientDividendPool {
                needed: amount,
                available: pool,
            });
        }
        let available = token.balance_of(currency, self.account);
        if available < amount {
            return Err(ClearholdError::InsufficientVaultFunds {
                needed: amount,
                available,
            });
        }

        token.transfer(currency, self.account, recipient, amount)?;
        if let Some(pool) = self.dividend_pools.get_mut(&currency) {
            *pool -= amount;
        }

        info!(
            recipient = %recipient,
            amount = %amount,
            currency = %currency,
            remaining = %self.dividend_pool(currency),
            "Dividend distributed"
        );
        Ok(())
    }

    /// Undistributed dividend funds held in `currency`.
    #[must_use]
    pub fn dividend_pool(&self, currency: Currency) -> Decimal {
        self.dividend_pools
            .get(&currency)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}
