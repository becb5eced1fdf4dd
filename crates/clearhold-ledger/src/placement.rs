//! Order placement: validation, payment computation, key derivation, and
//! the custody hand-off to the vault.

use rust_decimal::Decimal;
use tracing::info;

use clearhold_types::{
    constants, ClearholdError, LedgerToken, Order, OrderKey, OrderRequest, OrderStatus,
    OrderTerms, PaymentType, Result,
};
use clearhold_vault::EscrowVault;

use crate::OrderLedger;

impl OrderLedger {
    /// Places a new order and takes custody of the buyer's payment.
    ///
    /// EOI orders fund the booking payment (the configured percentage of
    /// the units value, plus the full fees); full-payment orders fund the
    /// entire order value. The derived key is returned for all later
    /// operations on the order.
    ///
    /// A failed placement retains no state at all: the nonce only advances
    /// after the vault's custody deposit succeeds, so a retry derives the
    /// same key.
    ///
    /// # Errors
    ///
    /// Fails on malformed requests, a project mismatch or inactive
    /// project, units outside the investment bounds, terms that leave the
    /// representable decimal range, fees above half the total value, or a
    /// buyer balance/allowance that cannot cover the required payment.
    pub fn place_order(
        &mut self,
        vault: &mut EscrowVault,
        token: &mut dyn LedgerToken,
        request: OrderRequest,
    ) -> Result<OrderKey> {
        // 1. Static validation. Nothing is touched until every guard holds.
        if request.buyer.is_nil() {
            return Err(ClearholdError::InvalidAccount);
        }
        let project = &self.config.project;
        if request.project != project.id {
            return Err(ClearholdError::ProjectMismatch {
                requested: request.project,
                configured: project.id,
            });
        }
        if request.asset.is_empty() {
            return Err(ClearholdError::InvalidAsset);
        }
        if !project.active {
            return Err(ClearholdError::ProjectInactive(project.id));
        }
        if request.units <= Decimal::ZERO {
            return Err(ClearholdError::InvalidAmount {
                amount: request.units,
            });
        }
        let max_units = project
            .max_investment
            .min(Decimal::from(constants::MAX_ORDER_UNITS));
        if request.units < project.min_investment || request.units > max_units {
            return Err(ClearholdError::UnitsOutOfBounds {
                units: request.units,
                min: project.min_investment,
                max: max_units,
            });
        }
        if request.unit_price <= Decimal::ZERO {
            return Err(ClearholdError::InvalidAmount {
                amount: request.unit_price,
            });
        }
        if request.fees < Decimal::ZERO {
            return Err(ClearholdError::InvalidAmount {
                amount: request.fees,
            });
        }

        // 2. Payment terms. Doubling the fees past the decimal range also
        //    means the half-of-total cap is broken.
        let terms = OrderTerms::compute(
            request.units,
            request.unit_price,
            request.fees,
            project.eoi_percent,
        )?;
        let fees_within_cap = request
            .fees
            .checked_mul(Decimal::TWO)
            .is_some_and(|doubled| doubled <= terms.total_value);
        if !fees_within_cap {
            return Err(ClearholdError::FeeTooHigh {
                fees: request.fees,
                total_value: terms.total_value,
            });
        }
        let required = terms.required_payment(request.payment_type);

        // 3. Funding precheck against the vault as spender, so the custody
        //    deposit below cannot fail for lack of funds.
        let available = token.balance_of(request.currency, request.buyer);
        if available < required {
            return Err(ClearholdError::InsufficientBalance {
                needed: required,
                available,
            });
        }
        let approved = token.allowance(request.currency, request.buyer, vault.account());
        if approved < required {
            return Err(ClearholdError::InsufficientAllowance {
                needed: required,
                approved,
            });
        }

        // 4. Derive the key and take custody. The nonce advances only once
        //    the deposit succeeded.
        let key = OrderKey::derive(
            request.buyer,
            request.project,
            project.chain,
            &request.asset,
            self.nonce,
        );
        vault.deposit(
            token,
            key,
            request.buyer,
            required,
            &request.asset,
            request.currency,
        )?;
        self.nonce += 1;

        // 5. Record the order.
        let now = self.clock.now();
        let order = Order {
            key,
            buyer: request.buyer,
            project: request.project,
            asset: request.asset,
            units: request.units,
            unit_price: request.unit_price,
            fees: request.fees,
            total_value: terms.total_value,
            booking_payment: terms.booking_payment,
            currency: request.currency,
            payment_type: request.payment_type,
            status: OrderStatus::Pending,
            released: false,
            has_full_payment: matches!(request.payment_type, PaymentType::Full),
            created_at: now,
            expires_at: self.config.windows.order_expiry_at(now),
            release_timelock: None,
        };

        info!(
            order = %key,
            buyer = %request.buyer,
            units = %request.units,
            funded = %required,
            payment = %request.payment_type,
            expires_at = %order.expires_at,
            "Order placed"
        );
        self.orders.insert(key, order);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use clearhold_types::{
        AccountId, ChainId, Clock, Currency, InMemoryToken, ManualClock, ProjectConfig,
        ProjectId, SettlementConfig, StaticAuthorizer,
    };

    use super::*;

    struct Rig {
        ledger: OrderLedger,
        vault: EscrowVault,
        token: InMemoryToken,
        clock: Arc<ManualClock>,
        buyer: AccountId,
        project: ProjectId,
    }

    fn setup() -> Rig {
        let buyer = AccountId::new();
        let project = ProjectId::new();
        let config = SettlementConfig::for_project(ProjectConfig::active(
            project,
            AccountId::new(),
            ChainId(137),
        ));

        let clock = Arc::new(ManualClock::at(Utc::now()));
        let auth = Arc::new(StaticAuthorizer::new());
        let vault = EscrowVault::new(
            AccountId::new(),
            config.clone(),
            clock.clone(),
            auth.clone(),
        );
        let ledger = OrderLedger::new(AccountId::new(), config, clock.clone(), auth);

        let mut token = InMemoryToken::new();
        token.mint(Currency::Usdt, buyer, Decimal::new(1_000, 0));
        token.approve(Currency::Usdt, buyer, vault.account(), Decimal::new(1_000, 0));

        Rig {
            ledger,
            vault,
            token,
            clock,
            buyer,
            project,
        }
    }

    fn eoi_request(rig: &Rig) -> OrderRequest {
        OrderRequest {
            buyer: rig.buyer,
            project: rig.project,
            asset: "VILLA-A".to_string(),
            units: Decimal::new(100, 0),
            unit_price: Decimal::new(2, 0),
            fees: Decimal::new(1, 0),
            payment_type: PaymentType::Eoi,
            currency: Currency::Usdt,
        }
    }

    #[test]
    fn eoi_placement_funds_the_booking_payment() {
        let mut rig = setup();
        let placed_at = rig.clock.now();
        let request = eoi_request(&rig);
        let key = rig
            .ledger
            .place_order(&mut rig.vault, &mut rig.token, request)
            .unwrap();

        let order = rig.ledger.order(&key).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_value, Decimal::new(201, 0));
        assert_eq!(order.booking_payment, Decimal::new(41, 0));
        assert!(!order.has_full_payment);
        assert_eq!(order.created_at, placed_at);
        assert_eq!(order.expires_at, placed_at + chrono::Duration::days(7));
        assert_eq!(order.release_timelock, None);

        // Custody holds exactly the booking payment.
        assert_eq!(
            rig.vault.deposit_for(&key).unwrap().amount,
            Decimal::new(41, 0)
        );
        assert_eq!(
            rig.token.balance_of(Currency::Usdt, rig.buyer),
            Decimal::new(959, 0)
        );
    }

    #[test]
    fn full_placement_funds_the_total_value() {
        let mut rig = setup();
        let mut request = eoi_request(&rig);
        request.payment_type = PaymentType::Full;
        let key = rig
            .ledger
            .place_order(&mut rig.vault, &mut rig.token, request)
            .unwrap();

        let order = rig.ledger.order(&key).unwrap();
        assert!(order.has_full_payment);
        assert_eq!(order.net_payable(), Decimal::new(201, 0));
        assert_eq!(
            rig.vault.deposit_for(&key).unwrap().amount,
            Decimal::new(201, 0)
        );
    }

    #[test]
    fn consecutive_placements_derive_distinct_keys() {
        let mut rig = setup();
        let request = eoi_request(&rig);
        let a = rig
            .ledger
            .place_order(&mut rig.vault, &mut rig.token, request)
            .unwrap();
        let request = eoi_request(&rig);
        let b = rig
            .ledger
            .place_order(&mut rig.vault, &mut rig.token, request)
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(rig.ledger.order_count(), 2);
        // The second deposit landed under its own key.
        assert_eq!(rig.vault.deposit_count(), 2);
    }

    #[test]
    fn rejects_wrong_or_inactive_project() {
        let mut rig = setup();
        let mut request = eoi_request(&rig);
        request.project = ProjectId::new();
        let err = rig
            .ledger
            .place_order(&mut rig.vault, &mut rig.token, request)
            .unwrap_err();
        assert!(matches!(err, ClearholdError::ProjectMismatch { .. }));

        rig.ledger.config.project.active = false;
        let request = eoi_request(&rig);
        let err = rig
            .ledger
            .place_order(&mut rig.vault, &mut rig.token, request)
            .unwrap_err();
        assert!(matches!(err, ClearholdError::ProjectInactive(_)));
        assert_eq!(rig.ledger.order_count(), 0);
    }

    #[test]
    fn rejects_malformed_requests() {
        let mut rig = setup();

        let mut request = eoi_request(&rig);
        request.buyer = AccountId::nil();
        assert!(matches!(
            rig.ledger
                .place_order(&mut rig.vault, &mut rig.token, request)
                .unwrap_err(),
            ClearholdError::InvalidAccount
        ));

        let mut request = eoi_request(&rig);
        request.asset = String::new();
        assert!(matches!(
            rig.ledger
                .place_order(&mut rig.vault, &mut rig.token, request)
                .unwrap_err(),
            ClearholdError::InvalidAsset
        ));

        let mut request = eoi_request(&rig);
        request.unit_price = Decimal::ZERO;
        assert!(matches!(
            rig.ledger
                .place_order(&mut rig.vault, &mut rig.token, request)
                .unwrap_err(),
            ClearholdError::InvalidAmount { .. }
        ));

        let mut request = eoi_request(&rig);
        request.fees = Decimal::new(-1, 0);
        assert!(matches!(
            rig.ledger
                .place_order(&mut rig.vault, &mut rig.token, request)
                .unwrap_err(),
            ClearholdError::InvalidAmount { .. }
        ));
    }

    #[test]
    fn rejects_units_outside_bounds() {
        let mut rig = setup();

        let mut request = eoi_request(&rig);
        request.units = Decimal::ZERO;
        assert!(matches!(
            rig.ledger
                .place_order(&mut rig.vault, &mut rig.token, request)
                .unwrap_err(),
            ClearholdError::InvalidAmount { .. }
        ));

        let mut request = eoi_request(&rig);
        request.units = Decimal::new(1_000_001, 0);
        assert!(matches!(
            rig.ledger
                .place_order(&mut rig.vault, &mut rig.token, request)
                .unwrap_err(),
            ClearholdError::UnitsOutOfBounds { .. }
        ));

        rig.ledger.config.project.min_investment = Decimal::new(10, 0);
        let mut request = eoi_request(&rig);
        request.units = Decimal::new(9, 0);
        assert!(matches!(
            rig.ledger
                .place_order(&mut rig.vault, &mut rig.token, request)
                .unwrap_err(),
            ClearholdError::UnitsOutOfBounds { .. }
        ));
    }

    #[test]
    fn rejects_terms_beyond_the_decimal_range() {
        let mut rig = setup();
        let mut request = eoi_request(&rig);
        // The price alone is valid; the product with 100 units is not
        // representable.
        request.unit_price = Decimal::MAX / Decimal::TWO;
        let err = rig
            .ledger
            .place_order(&mut rig.vault, &mut rig.token, request)
            .unwrap_err();
        assert!(matches!(err, ClearholdError::AmountOverflow));
        assert_eq!(rig.ledger.order_count(), 0);
        assert_eq!(rig.vault.deposit_count(), 0);
    }

    #[test]
    fn rejects_fees_above_half_the_total() {
        let mut rig = setup();
        let mut request = eoi_request(&rig);
        // Units value 200; fees 201 make the total 401 and 2×201 > 401.
        request.fees = Decimal::new(201, 0);
        let err = rig
            .ledger
            .place_order(&mut rig.vault, &mut rig.token, request)
            .unwrap_err();
        assert!(matches!(err, ClearholdError::FeeTooHigh { .. }));
    }

    #[test]
    fn rejects_underfunded_buyers() {
        let mut rig = setup();
        let poor = AccountId::new();
        rig.token.mint(Currency::Usdt, poor, Decimal::new(40, 0));
        rig.token
            .approve(Currency::Usdt, poor, rig.vault.account(), Decimal::new(100, 0));

        let mut request = eoi_request(&rig);
        request.buyer = poor;
        let err = rig
            .ledger
            .place_order(&mut rig.vault, &mut rig.token, request)
            .unwrap_err();
        // Scenario amount: the booking payment is 41 and the buyer has 40.
        assert!(matches!(
            err,
            ClearholdError::InsufficientBalance { needed, available }
                if needed == Decimal::new(41, 0) && available == Decimal::new(40, 0)
        ));
        assert_eq!(rig.ledger.order_count(), 0);
        assert_eq!(rig.vault.deposit_count(), 0);
    }

    #[test]
    fn rejects_missing_allowance() {
        let mut rig = setup();
        let unapproved = AccountId::new();
        rig.token
            .mint(Currency::Usdt, unapproved, Decimal::new(100, 0));

        let mut request = eoi_request(&rig);
        request.buyer = unapproved;
        let err = rig
            .ledger
            .place_order(&mut rig.vault, &mut rig.token, request)
            .unwrap_err();
        assert!(matches!(err, ClearholdError::InsufficientAllowance { .. }));
    }

    #[test]
    fn failed_placement_keeps_the_nonce() {
        let mut rig = setup();
        let expected = OrderKey::derive(
            rig.buyer,
            rig.project,
            ChainId(137),
            "VILLA-A",
            0,
        );

        // Drain the buyer so the first attempt fails at the balance guard.
        let stash = AccountId::new();
        rig.token
            .transfer(Currency::Usdt, rig.buyer, stash, Decimal::new(1_000, 0))
            .unwrap();
        let request = eoi_request(&rig);
        assert!(rig
            .ledger
            .place_order(&mut rig.vault, &mut rig.token, request)
            .is_err());

        // Refund and retry: the same key material is used.
        rig.token
            .transfer(Currency::Usdt, stash, rig.buyer, Decimal::new(1_000, 0))
            .unwrap();
        let request = eoi_request(&rig);
        let key = rig
            .ledger
            .place_order(&mut rig.vault, &mut rig.token, request)
            .unwrap();
        assert_eq!(key, expected);
    }
}
