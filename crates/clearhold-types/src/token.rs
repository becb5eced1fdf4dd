//! The custodial value-transfer seam.
//!
//! Components move funds exclusively through [`LedgerToken`]; the engine
//! never mints or burns. `transfer` moves funds the caller custodies (the
//! engine only ever passes its own custody account as `from`), while
//! `transfer_from` spends an allowance the owner granted to the custodian.
//! Amount checks treat the token as authoritative: insufficient balance or
//! allowance fails hard, never truncates.

use rust_decimal::Decimal;

use crate::{AccountId, Currency, Result};

/// Fungible-value primitives over a set of payment rails.
pub trait LedgerToken {
    /// Move `amount` of `currency` out of funds the caller custodies.
    fn transfer(
        &mut self,
        currency: Currency,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<()>;

    /// Move `amount` of `currency` from `owner` to `to`, consuming the
    /// allowance `owner` granted to `spender`.
    fn transfer_from(
        &mut self,
        currency: Currency,
        owner: AccountId,
        spender: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<()>;

    fn balance_of(&self, currency: Currency, account: AccountId) -> Decimal;

    fn allowance(&self, currency: Currency, owner: AccountId, spender: AccountId) -> Decimal;
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// In-memory token bank with per-rail balances and allowances.
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Clone, Default)]
pub struct InMemoryToken {
    balances: std::collections::HashMap<(AccountId, Currency), Decimal>,
    allowances: std::collections::HashMap<(AccountId, AccountId, Currency), Decimal>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl InMemoryToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit fresh funds to an account (test fixture setup).
    pub fn mint(&mut self, currency: Currency, account: AccountId, amount: Decimal) {
        *self.balances.entry((account, currency)).or_insert(Decimal::ZERO) += amount;
    }

    /// Set (not add to) the allowance `owner` grants `spender`.
    pub fn approve(
        &mut self,
        currency: Currency,
        owner: AccountId,
        spender: AccountId,
        amount: Decimal,
    ) {
        self.allowances.insert((owner, spender, currency), amount);
    }

    /// Sum of all balances on one rail. Engine operations must never
    /// change it.
    #[must_use]
    pub fn total_supply(&self, currency: Currency) -> Decimal {
        self.balances
            .iter()
            .filter(|((_, c), _)| *c == currency)
            .map(|(_, amount)| *amount)
            .sum()
    }

    fn debit(&mut self, currency: Currency, from: AccountId, amount: Decimal) -> Result<()> {
        let balance = self.balance_of(currency, from);
        if balance < amount {
            return Err(crate::ClearholdError::InsufficientBalance {
                needed: amount,
                available: balance,
            });
        }
        *self.balances.entry((from, currency)).or_insert(Decimal::ZERO) -= amount;
        Ok(())
    }

    fn credit(&mut self, currency: Currency, to: AccountId, amount: Decimal) {
        *self.balances.entry((to, currency)).or_insert(Decimal::ZERO) += amount;
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl LedgerToken for InMemoryToken {
    fn transfer(
        &mut self,
        currency: Currency,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<()> {
        self.debit(currency, from, amount)?;
        self.credit(currency, to, amount);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        currency: Currency,
        owner: AccountId,
        spender: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<()> {
        let approved = self.allowance(currency, owner, spender);
        if approved < amount {
            return Err(crate::ClearholdError::InsufficientAllowance {
                needed: amount,
                approved,
            });
        }
        self.debit(currency, owner, amount)?;
        self.allowances.insert((owner, spender, currency), approved - amount);
        self.credit(currency, to, amount);
        Ok(())
    }

    fn balance_of(&self, currency: Currency, account: AccountId) -> Decimal {
        self.balances
            .get(&(account, currency))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn allowance(&self, currency: Currency, owner: AccountId, spender: AccountId) -> Decimal {
        self.allowances
            .get(&(owner, spender, currency))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}
