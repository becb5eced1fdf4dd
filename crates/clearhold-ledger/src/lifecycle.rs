//! Lifecycle transitions after placement: document signature,
//! finalization, cancellation, and stuck-order recovery.

use rust_decimal::Decimal;
use tracing::info;

use clearhold_types::{
    AccountId, AssetIssuer, Capability, ClearholdError, LedgerToken, OrderKey, OrderStatus,
    Result,
};
use clearhold_vault::EscrowVault;

use crate::OrderLedger;

impl OrderLedger {
    /// Records the buyer's signature on the purchase documents,
    /// transitioning the order from `Pending` to `DocumentsSigned`.
    ///
    /// # Errors
    ///
    /// Fails if the caller is not the buyer, the order is not `Pending`,
    /// or the order has expired.
    pub fn sign_documents(&mut self, caller: AccountId, order: OrderKey) -> Result<()> {
        let now = self.clock.now();
        let Some(record) = self.orders.get_mut(&order) else {
            return Err(ClearholdError::OrderNotFound(order));
        };
        if caller != record.buyer {
            return Err(ClearholdError::Unauthorized {
                reason: "only the buyer may sign purchase documents".to_string(),
            });
        }
        if record.status != OrderStatus::Pending {
            return Err(ClearholdError::OrderNotPending {
                status: record.status,
            });
        }
        if record.is_expired(now) {
            return Err(ClearholdError::OrderExpired {
                deadline: record.expires_at,
            });
        }
        record.mark_documents_signed()?;

        info!(order = %order, buyer = %caller, "Purchase documents signed");
        Ok(())
    }

    /// Completes payment and mints the purchased units, transitioning the
    /// order from `DocumentsSigned` to `Finalized`.
    ///
    /// EOI orders pay the outstanding remainder here; every order also
    /// funds the project's dividend share. The mint is the one external
    /// effect whose failure cannot be predicted, so it runs before any
    /// funds move; the two transfers that follow are precondition-verified
    /// against the buyer's balance and allowance. A failure at any point
    /// leaves the order `DocumentsSigned` and all balances untouched.
    ///
    /// # Errors
    ///
    /// Fails if the caller is neither the buyer nor an admin, the order is
    /// not `DocumentsSigned`, the order has expired, the buyer cannot fund
    /// the remainder plus dividend, or the issuer rejects the mint.
    pub fn finalize_order(
        &mut self,
        vault: &mut EscrowVault,
        token: &mut dyn LedgerToken,
        issuer: &mut dyn AssetIssuer,
        caller: AccountId,
        order: OrderKey,
    ) -> Result<()> {
        // 1. Guards, against a read-only view of the order.
        let now = self.clock.now();
        let Some(record) = self.orders.get(&order) else {
            return Err(ClearholdError::OrderNotFound(order));
        };
        if caller != record.buyer && !self.auth.check(caller, Capability::Admin) {
            return Err(ClearholdError::Unauthorized {
                reason: "finalization requires the buyer or the admin capability".to_string(),
            });
        }
        if record.status != OrderStatus::DocumentsSigned {
            return Err(ClearholdError::DocumentsNotSigned {
                status: record.status,
            });
        }
        if record.is_expired(now) {
            return Err(ClearholdError::OrderExpired {
                deadline: record.expires_at,
            });
        }

        // 2. Outstanding amounts: the unpaid remainder plus the dividend
        //    share of the total value.
        let remainder = if record.has_full_payment {
            Decimal::ZERO
        } else {
            record.total_value - record.booking_payment
        };
        let dividend = record
            .total_value
            .checked_mul(Decimal::from(self.config.project.dividend_percent))
            .ok_or(ClearholdError::AmountOverflow)?
            / Decimal::ONE_HUNDRED;
        let outstanding = remainder
            .checked_add(dividend)
            .ok_or(ClearholdError::AmountOverflow)?;
        let buyer = record.buyer;
        let currency = record.currency;
        let asset = record.asset.clone();
        let units = record.units;

        if outstanding > Decimal::ZERO {
            let available = token.balance_of(currency, buyer);
            if available < outstanding {
                return Err(ClearholdError::InsufficientBalance {
                    needed: outstanding,
                    available,
                });
            }
            let approved = token.allowance(currency, buyer, vault.account());
            if approved < outstanding {
                return Err(ClearholdError::InsufficientAllowance {
                    needed: outstanding,
                    approved,
                });
            }
        }

        // 3. Mint first; a refusal aborts before any funds move.
        issuer.mint(buyer, &asset, units)?;

        // 4. Collect the remainder into custody and the dividend share
        //    into the pool. Both pulls were verified in step 2.
        if remainder > Decimal::ZERO {
            vault.deposit(token, order, buyer, remainder, &asset, currency)?;
        }
        if dividend > Decimal::ZERO {
            vault.deposit_dividend(token, buyer, currency, dividend)?;
        }

        // 5. Commit the transition and start the release timelock.
        let unlocks_at = self.config.windows.release_unlock_at(now);
        let Some(record) = self.orders.get_mut(&order) else {
            return Err(ClearholdError::OrderNotFound(order));
        };
        record.mark_finalized(unlocks_at)?;

        info!(
            order = %order,
            buyer = %buyer,
            remainder = %remainder,
            dividend = %dividend,
            unlocks_at = %unlocks_at,
            "Order finalized"
        );
        Ok(())
    }

    /// Cancels an open order and refunds the custodied amount to the
    /// buyer.
    ///
    /// Buyers must wait out the cancellation delay from placement; admins
    /// may cancel immediately.
    ///
    /// # Errors
    ///
    /// Fails if the caller is neither the buyer nor an admin, the order is
    /// not open, or a non-admin cancels before the delay elapses.
    pub fn cancel_order(
        &mut self,
        vault: &mut EscrowVault,
        token: &mut dyn LedgerToken,
        caller: AccountId,
        order: OrderKey,
    ) -> Result<()> {
        let now = self.clock.now();
        let Some(record) = self.orders.get(&order) else {
            return Err(ClearholdError::OrderNotFound(order));
        };
        let is_admin = self.auth.check(caller, Capability::Admin);
        if caller != record.buyer && !is_admin {
            return Err(ClearholdError::Unauthorized {
                reason: "cancellation requires the buyer or the admin capability".to_string(),
            });
        }
        if !record.is_open() {
            return Err(ClearholdError::OrderNotOpen {
                status: record.status,
            });
        }
        if !is_admin {
            let allowed_at = self.config.windows.cancel_allowed_at(record.created_at);
            if now < allowed_at {
                return Err(ClearholdError::CancellationDelayNotMet { allowed_at });
            }
        }
        let refund = record.net_payable();
        let buyer = record.buyer;

        vault.release(token, order, buyer, refund)?;

        let Some(record) = self.orders.get_mut(&order) else {
            return Err(ClearholdError::OrderNotFound(order));
        };
        record.mark_cancelled()?;

        info!(
            order = %order,
            buyer = %buyer,
            refund = %refund,
            admin = is_admin,
            "Order cancelled"
        );
        Ok(())
    }

    /// Admin recovery for an order that never progressed past its
    /// expiration: refunds the custodied amount and cancels, with no
    /// cancellation-delay requirement.
    ///
    /// # Errors
    ///
    /// Fails if the caller lacks the admin capability, the order is not
    /// open, or the order has not expired yet.
    pub fn resolve_stuck_order(
        &mut self,
        vault: &mut EscrowVault,
        token: &mut dyn LedgerToken,
        caller: AccountId,
        order: OrderKey,
    ) -> Result<()> {
        if !self.auth.check(caller, Capability::Admin) {
            return Err(ClearholdError::Unauthorized {
                reason: "stuck-order recovery requires the admin capability".to_string(),
            });
        }
        let now = self.clock.now();
        let Some(record) = self.orders.get(&order) else {
            return Err(ClearholdError::OrderNotFound(order));
        };
        if !record.is_open() {
            return Err(ClearholdError::OrderNotOpen {
                status: record.status,
            });
        }
        if !record.is_expired(now) {
            return Err(ClearholdError::OrderNotExpired {
                deadline: record.expires_at,
            });
        }
        let refund = record.net_payable();
        let buyer = record.buyer;

        vault.release(token, order, buyer, refund)?;

        let Some(record) = self.orders.get_mut(&order) else {
            return Err(ClearholdError::OrderNotFound(order));
        };
        record.mark_cancelled()?;

        info!(
            order = %order,
            buyer = %buyer,
            refund = %refund,
            by = %caller,
            "Stuck order recovered"
        );
        Ok(())
    }
}
