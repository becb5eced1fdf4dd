//! Dispute engine for contested deposits.
//!
//! A dispute freezes a claim over an order's deposit without freezing the
//! deposit itself: it snapshots the held amount at raise time and opens a
//! resolution window `[timeout, expiration]` during which a signer quorum
//! may pay the snapshot to an arbitrary party. Resolution consumes the
//! deposit record entirely.

use tracing::{debug, info};

use clearhold_types::{
    AccountId, ApprovalOutcome, Capability, ClearholdError, Dispute, DisputeKey, LedgerToken,
    OrderKey, Result, SignerSet,
};

use crate::EscrowVault;

impl EscrowVault {
    /// Opens a dispute over the deposit held for `order`.
    ///
    /// Only the depositor or the project owner may raise one. The deposit
    /// amount is snapshotted into the dispute record; later deposits or
    /// releases do not change what a resolution will pay out.
    ///
    /// # Errors
    ///
    /// Fails if the reason is empty or too long, if no deposit exists for
    /// `order`, or if the caller is neither the depositor nor the project
    /// owner.
    pub fn raise_dispute(
        &mut self,
        caller: AccountId,
        order: OrderKey,
        reason: &str,
    ) -> Result<DisputeKey> {
        if reason.is_empty() {
            return Err(ClearholdError::EmptyDisputeReason);
        }
        if reason.len() > self.config.max_dispute_reason_len {
            return Err(ClearholdError::DisputeReasonTooLong {
                len: reason.len(),
                max: self.config.max_dispute_reason_len,
            });
        }
        let deposit = self
            .deposits
            .get(&order)
            .ok_or(ClearholdError::DepositNotFound(order))?;
        if caller != deposit.buyer && caller != self.config.project.owner {
            return Err(ClearholdError::Unauthorized {
                reason: "dispute requires the depositor or the project owner".to_string(),
            });
        }

        let now = self.clock.now();
        let key = DisputeKey::derive(self.dispute_counter);
        let dispute = Dispute {
            key,
            order,
            buyer: deposit.buyer,
            reason: reason.to_string(),
            amount: deposit.amount,
            asset: deposit.asset.clone(),
            currency: deposit.currency,
            raised_at: now,
            timeout_at: self.config.windows.dispute_opens_at(now),
            expires_at: self.config.windows.dispute_closes_at(now),
            resolved: false,
            resolved_to: None,
        };
        self.dispute_counter += 1;

        info!(
            dispute = %key,
            order = %order,
            raised_by = %caller,
            amount = %dispute.amount,
            opens_at = %dispute.timeout_at,
            closes_at = %dispute.expires_at,
            "Dispute raised"
        );
        self.disputes.insert(key, dispute);
        Ok(key)
    }

    /// Records a signer's approval to resolve `dispute` in favour of
    /// `resolved_to`, executing once the threshold is met.
    ///
    /// Signatures are only counted inside the resolution window. Execution
    /// pays the snapshotted amount to the winner, marks the dispute
    /// resolved, and consumes the contested deposit whole; any funds
    /// deposited after the snapshot stay in the vault unassigned until an
    /// operator reconciles them.
    ///
    /// # Errors
    ///
    /// Fails if the caller lacks the signer capability or already signed,
    /// if the dispute is unknown or resolved, if `now` falls outside the
    /// window, or if the vault cannot cover the snapshot.
    pub fn sign_dispute_resolution(
        &mut self,
        token: &mut dyn LedgerToken,
        caller: AccountId,
        dispute: DisputeKey,
        resolved_to: AccountId,
    ) -> Result<ApprovalOutcome> {
        if !self.auth.check(caller, Capability::Signer) {
            return Err(ClearholdError::Unauthorized {
                reason: "dispute resolution requires the signer capability".to_string(),
            });
        }
        if resolved_to.is_nil() {
            return Err(ClearholdError::InvalidAccount);
        }
        let record = self
            .disputes
            .get(&dispute)
            .ok_or(ClearholdError::DisputeNotFound(dispute))?;
        if record.resolved {
            return Err(ClearholdError::DisputeAlreadyResolved(dispute));
        }
        let now = self.clock.now();
        if now < record.timeout_at {
            return Err(ClearholdError::DisputeTimeoutNotReached {
                opens_at: record.timeout_at,
            });
        }
        if now > record.expires_at {
            return Err(ClearholdError::DisputeExpired {
                closed_at: record.expires_at,
            });
        }
        let currency = record.currency;
        let amount = record.amount;
        let order = record.order;

        let required = self.config.required_signatures;
        let set = self.dispute_approvals.entry(dispute).or_default();

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
                dispute = %dispute,
                signer = %caller,
                approvals,
                required,
                "Dispute resolution approval recorded"
            );
            return Ok(ApprovalOutcome::Pending {
                approvals,
                required,
            });
        }

        token.transfer(currency, self.account, resolved_to, amount)?;

        let Some(record) = self.disputes.get_mut(&dispute) else {
            return Err(ClearholdError::DisputeNotFound(dispute));
        };
        record.mark_resolved(resolved_to)?;
        self.deposits.remove(&order);
        self.release_approvals.remove(&order);
        self.dispute_approvals.remove(&dispute);

        info!(
            dispute = %dispute,
            order = %order,
            resolved_to = %resolved_to,
            amount = %amount,
            currency = %currency,
            "Dispute resolved"
        );
        Ok(ApprovalOutcome::Executed)
    }

    // ------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------

    #[must_use]
    pub fn dispute(&self, key: &DisputeKey) -> Option<&Dispute> {
        self.disputes.get(key)
    }

    #[must_use]
    pub fn dispute_count(&self) -> usize {
        self.disputes.len()
    }

    /// Signatures collected so far toward resolving `dispute`.
    #[must_use]
    pub fn dispute_approval_count(&self, dispute: &DisputeKey) -> usize {
        self.dispute_approvals
            .get(dispute)
            .map_or(0, SignerSet::count)
    }
}
