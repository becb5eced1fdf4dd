//! Threshold-approved release of finalized order funds to the project
//! owner.

use tracing::{debug, info};

use clearhold_types::{
    AccountId, ApprovalOutcome, Capability, ClearholdError, LedgerToken, OrderKey, OrderStatus,
    Result,
};
use clearhold_vault::EscrowVault;

use crate::OrderLedger;

impl OrderLedger {
    /// Records a signer's approval to release a finalized order's funds to
    /// the project owner, executing once the threshold is met.
    ///
    /// Below the threshold nothing moves. On the tipping call the ledger
    /// instructs the vault to pay the net amount; if the vault refuses,
    /// the tipping approval is revoked so the ledger records no partial
    /// state and the same signer can retry once the cause is fixed. A
    /// completed release is final.
    ///
    /// # Errors
    ///
    /// Fails if the caller lacks the signer capability or already signed,
    /// if the order is not `Finalized` or was already released, or before
    /// the release timelock elapses.
    pub fn sign_fund_release(
        &mut self,
        vault: &mut EscrowVault,
        token: &mut dyn LedgerToken,
        caller: AccountId,
        order: OrderKey,
    ) -> Result<ApprovalOutcome> {
        if !self.auth.check(caller, Capability::Signer) {
            return Err(ClearholdError::Unauthorized {
                reason: "fund release requires the signer capability".to_string(),
            });
        }
        let now = self.clock.now();
        let Some(record) = self.orders.get(&order) else {
            return Err(ClearholdError::OrderNotFound(order));
        };
        if record.status != OrderStatus::Finalized {
            return Err(ClearholdError::OrderNotFinalized {
                status: record.status,
            });
        }
        if record.released {
            return Err(ClearholdError::AlreadyReleased(order));
        }
        let Some(unlocks_at) = record.release_timelock else {
            return Err(ClearholdError::Internal(
                "finalized order missing its release timelock".to_string(),
            ));
        };
        if now < unlocks_at {
            return Err(ClearholdError::TimelockNotMet { unlocks_at });
        }
        let net = record.net_payable();
        let owner = self.config.project.owner;
        let required = self.config.required_signatures;

        let set = self.release_approvals.entry(order).or_default();
        let approvals = set.record(caller)?;
        if approvals < required {
            debug!(
                order = %order,
                signer = %caller,
                approvals,
                required,
                "Fund release approval recorded"
            );
            return Ok(ApprovalOutcome::Pending {
                approvals,
                required,
            });
        }

        // Threshold reached. A vault refusal unwinds the tipping approval
        // so this call leaves no trace.
        if let Err(err) = vault.release(token, order, owner, net) {
            if let Some(set) = self.release_approvals.get_mut(&order) {
                set.revoke(caller);
            }
            return Err(err);
        }

        let Some(record) = self.orders.get_mut(&order) else {
            return Err(ClearholdError::OrderNotFound(order));
        };
        record.mark_released()?;
        self.release_approvals.remove(&order);

        info!(
            order = %order,
            owner = %owner,
            amount = %net,
            "Order funds released to project owner"
        );
        Ok(ApprovalOutcome::Executed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use clearhold_types::{
        ChainId, Currency, InMemoryToken, ManualClock, OrderRequest, PaymentType, ProjectConfig,
        ProjectId, RecordingIssuer, SettlementConfig, StaticAuthorizer,
    };
    use rust_decimal::Decimal;

    use super::*;

    struct Rig {
        ledger: OrderLedger,
        vault: EscrowVault,
        token: InMemoryToken,
        clock: Arc<ManualClock>,
        signers: Vec<AccountId>,
        buyer: AccountId,
        owner: AccountId,
    }

    fn setup(required: usize) -> Rig {
        let buyer = AccountId::new();
        let owner = AccountId::new();
        let signers: Vec<AccountId> = (0..3).map(|_| AccountId::new()).collect();

        let mut auth = StaticAuthorizer::new();
        for s in &signers {
            auth.grant_signer(*s);
        }
        let auth = Arc::new(auth);

        let mut config = SettlementConfig::for_project(ProjectConfig::active(
            ProjectId::new(),
            owner,
            ChainId(1),
        ));
        config.required_signatures = required;

        let clock = Arc::new(ManualClock::at(Utc::now()));
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
            signers,
            buyer,
            owner,
        }
    }

    /// Places, signs, and finalizes the worked-example EOI order, leaving
    /// 201 in custody behind a 7-day timelock.
    fn finalized_order(rig: &mut Rig) -> OrderKey {
        let request = OrderRequest {
            buyer: rig.buyer,
            project: rig.ledger.config.project.id,
            asset: "VILLA-A".to_string(),
            units: Decimal::new(100, 0),
            unit_price: Decimal::new(2, 0),
            fees: Decimal::new(1, 0),
            payment_type: PaymentType::Eoi,
            currency: Currency::Usdt,
        };
        let key = rig
            .ledger
            .place_order(&mut rig.vault, &mut rig.token, request)
            .unwrap();
        rig.ledger.sign_documents(rig.buyer, key).unwrap();
        let mut issuer = RecordingIssuer::new();
        rig.ledger
            .finalize_order(&mut rig.vault, &mut rig.token, &mut issuer, rig.buyer, key)
            .unwrap();
        key
    }

    #[test]
    fn release_is_locked_before_the_timelock() {
        let mut rig = setup(2);
        let key = finalized_order(&mut rig);

        let err = rig
            .ledger
            .sign_fund_release(&mut rig.vault, &mut rig.token, rig.signers[0], key)
            .unwrap_err();
        assert!(matches!(err, ClearholdError::TimelockNotMet { .. }));
        assert_eq!(rig.ledger.release_approval_count(&key), 0);
    }

    #[test]
    fn first_approval_moves_nothing() {
        let mut rig = setup(2);
        let key = finalized_order(&mut rig);
        rig.clock.advance_days(7);

        let outcome = rig
            .ledger
            .sign_fund_release(&mut rig.vault, &mut rig.token, rig.signers[0], key)
            .unwrap();
        assert_eq!(
            outcome,
            ApprovalOutcome::Pending {
                approvals: 1,
                required: 2
            }
        );
        assert_eq!(rig.token.balance_of(Currency::Usdt, rig.owner), Decimal::ZERO);
        assert!(!rig.ledger.order(&key).unwrap().released);
    }

    #[test]
    fn second_approval_pays_the_owner() {
        let mut rig = setup(2);
        let key = finalized_order(&mut rig);
        rig.clock.advance_days(7);

        rig.ledger
            .sign_fund_release(&mut rig.vault, &mut rig.token, rig.signers[0], key)
            .unwrap();
        let outcome = rig
            .ledger
            .sign_fund_release(&mut rig.vault, &mut rig.token, rig.signers[1], key)
            .unwrap();
        assert_eq!(outcome, ApprovalOutcome::Executed);

        assert_eq!(
            rig.token.balance_of(Currency::Usdt, rig.owner),
            Decimal::new(201, 0)
        );
        let order = rig.ledger.order(&key).unwrap();
        assert!(order.released);
        assert_eq!(rig.ledger.release_approval_count(&key), 0);
        assert!(rig.vault.deposit_for(&key).is_none());
    }

    #[test]
    fn repeat_signer_is_rejected() {
        let mut rig = setup(2);
        let key = finalized_order(&mut rig);
        rig.clock.advance_days(7);

        rig.ledger
            .sign_fund_release(&mut rig.vault, &mut rig.token, rig.signers[0], key)
            .unwrap();
        let err = rig
            .ledger
            .sign_fund_release(&mut rig.vault, &mut rig.token, rig.signers[0], key)
            .unwrap_err();
        assert!(matches!(err, ClearholdError::AlreadySigned { .. }));
        assert_eq!(rig.ledger.release_approval_count(&key), 1);
    }

    #[test]
    fn non_signers_are_rejected() {
        let mut rig = setup(1);
        let key = finalized_order(&mut rig);
        rig.clock.advance_days(7);
        let err = rig
            .ledger
            .sign_fund_release(&mut rig.vault, &mut rig.token, rig.buyer, key)
            .unwrap_err();
        assert!(matches!(err, ClearholdError::Unauthorized { .. }));
    }

    #[test]
    fn released_orders_reject_further_approvals() {
        let mut rig = setup(1);
        let key = finalized_order(&mut rig);
        rig.clock.advance_days(7);

        rig.ledger
            .sign_fund_release(&mut rig.vault, &mut rig.token, rig.signers[0], key)
            .unwrap();
        let err = rig
            .ledger
            .sign_fund_release(&mut rig.vault, &mut rig.token, rig.signers[1], key)
            .unwrap_err();
        assert!(matches!(err, ClearholdError::AlreadyReleased(_)));
    }

    #[test]
    fn release_requires_a_finalized_order() {
        let mut rig = setup(1);
        let request = OrderRequest {
            buyer: rig.buyer,
            project: rig.ledger.config.project.id,
            asset: "VILLA-A".to_string(),
            units: Decimal::new(100, 0),
            unit_price: Decimal::new(2, 0),
            fees: Decimal::new(1, 0),
            payment_type: PaymentType::Eoi,
            currency: Currency::Usdt,
        };
        let key = rig
            .ledger
            .place_order(&mut rig.vault, &mut rig.token, request)
            .unwrap();
        rig.clock.advance_days(7);

        let err = rig
            .ledger
            .sign_fund_release(&mut rig.vault, &mut rig.token, rig.signers[0], key)
            .unwrap_err();
        assert!(matches!(err, ClearholdError::OrderNotFinalized { .. }));
    }

    #[test]
    fn vault_refusal_unwinds_the_tipping_approval() {
        let mut rig = setup(2);
        let key = finalized_order(&mut rig);
        rig.clock.advance_days(7);

        rig.ledger
            .sign_fund_release(&mut rig.vault, &mut rig.token, rig.signers[0], key)
            .unwrap();

        // Empty the vault's rail balance so the execution arm fails.
        let drained = rig.token.balance_of(Currency::Usdt, rig.vault.account());
        rig.token
            .transfer(Currency::Usdt, rig.vault.account(), rig.buyer, drained)
            .unwrap();

        let err = rig
            .ledger
            .sign_fund_release(&mut rig.vault, &mut rig.token, rig.signers[1], key)
            .unwrap_err();
        assert!(matches!(err, ClearholdError::InsufficientVaultFunds { .. }));

        // The tipping signature was revoked; the first approval stands.
        assert_eq!(rig.ledger.release_approval_count(&key), 1);
        assert!(!rig.ledger.order(&key).unwrap().released);

        // Restore the balance and the same signer completes the release.
        rig.token
            .transfer(Currency::Usdt, rig.buyer, rig.vault.account(), drained)
            .unwrap();
        let outcome = rig
            .ledger
            .sign_fund_release(&mut rig.vault, &mut rig.token, rig.signers[1], key)
            .unwrap();
        assert_eq!(outcome, ApprovalOutcome::Executed);
    }
}
