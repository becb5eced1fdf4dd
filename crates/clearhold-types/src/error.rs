//! Error types for the ClearHold settlement engine.
//!
//! All errors use the `CH_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Validation errors
//! - 2xx: Order state errors
//! - 3xx: Custody / dispute state errors
//! - 4xx: Temporal window errors
//! - 5xx: Authorization errors
//! - 6xx: Resource / funds errors
//! - 7xx: External collaborator errors
//! - 9xx: General / internal errors

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AccountId, DisputeKey, OrderKey, OrderStatus, ProjectId};

/// Central error enum for all ClearHold operations.
#[derive(Debug, Error)]
pub enum ClearholdError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// A nil principal was supplied where a real account is required.
    #[error("CH_ERR_100: Invalid account: nil principal")]
    InvalidAccount,

    /// A zero or negative quantity was supplied.
    #[error("CH_ERR_101: Invalid amount: {amount}")]
    InvalidAmount { amount: Decimal },

    /// The asset identifier is empty.
    #[error("CH_ERR_102: Invalid asset: empty identifier")]
    InvalidAsset,

    /// The order names a project other than the configured one.
    #[error("CH_ERR_103: Project mismatch: requested {requested}, configured {configured}")]
    ProjectMismatch {
        requested: ProjectId,
        configured: ProjectId,
    },

    /// The configured project is not accepting orders.
    #[error("CH_ERR_104: Project inactive: {0}")]
    ProjectInactive(ProjectId),

    /// The requested unit amount falls outside the investment bounds.
    #[error("CH_ERR_105: Units out of bounds: {units} not in [{min}, {max}]")]
    UnitsOutOfBounds {
        units: Decimal,
        min: Decimal,
        max: Decimal,
    },

    /// Fees may not exceed half of the total order value.
    #[error("CH_ERR_106: Fee too high: {fees} against total {total_value}")]
    FeeTooHigh { fees: Decimal, total_value: Decimal },

    /// A dispute must carry a reason.
    #[error("CH_ERR_107: Dispute reason is empty")]
    EmptyDisputeReason,

    /// The dispute reason exceeds the configured maximum length.
    #[error("CH_ERR_108: Dispute reason too long: {len} > {max}")]
    DisputeReasonTooLong { len: usize, max: usize },

    /// Payment arithmetic left the representable decimal range.
    #[error("CH_ERR_109: Amount overflow in payment computation")]
    AmountOverflow,

    // =================================================================
    // Order State Errors (2xx)
    // =================================================================
    /// The requested order was not found in the ledger.
    #[error("CH_ERR_200: Order not found: {0}")]
    OrderNotFound(OrderKey),

    /// The operation requires a `Pending` order.
    #[error("CH_ERR_201: Order not pending: status {status}")]
    OrderNotPending { status: OrderStatus },

    /// The operation requires a `DocumentsSigned` order.
    #[error("CH_ERR_202: Documents not signed: status {status}")]
    DocumentsNotSigned { status: OrderStatus },

    /// The operation requires a `Finalized` order.
    #[error("CH_ERR_203: Order not finalized: status {status}")]
    OrderNotFinalized { status: OrderStatus },

    /// The operation requires an order still open (`Pending` or `DocumentsSigned`).
    #[error("CH_ERR_204: Order not open: status {status}")]
    OrderNotOpen { status: OrderStatus },

    /// Funds for this order have already been released.
    #[error("CH_ERR_205: Funds already released for order {0}")]
    AlreadyReleased(OrderKey),

    /// The caller has already approved this action.
    #[error("CH_ERR_206: Already signed by {signer}")]
    AlreadySigned { signer: AccountId },

    // =================================================================
    // Custody / Dispute State Errors (3xx)
    // =================================================================
    /// No custody record exists for the order.
    #[error("CH_ERR_300: Deposit not found for order {0}")]
    DepositNotFound(OrderKey),

    /// A release may not exceed the remaining deposit.
    #[error("CH_ERR_301: Release exceeds deposit: requested {requested}, held {held}")]
    ReleaseExceedsDeposit { requested: Decimal, held: Decimal },

    /// An accumulating deposit disagreed with the existing record.
    #[error("CH_ERR_302: Deposit mismatch: {reason}")]
    DepositMismatch { reason: String },

    /// The requested dispute was not found in the vault.
    #[error("CH_ERR_303: Dispute not found: {0}")]
    DisputeNotFound(DisputeKey),

    /// The dispute has already been resolved.
    #[error("CH_ERR_304: Dispute already resolved: {0}")]
    DisputeAlreadyResolved(DisputeKey),

    // =================================================================
    // Temporal Window Errors (4xx)
    // =================================================================
    /// The order's expiration window has passed.
    #[error("CH_ERR_400: Order expired at {deadline}")]
    OrderExpired { deadline: DateTime<Utc> },

    /// Stuck-order recovery requires the expiration to have passed.
    #[error("CH_ERR_401: Order not yet expired: deadline {deadline}")]
    OrderNotExpired { deadline: DateTime<Utc> },

    /// Fund release is locked until the release timelock elapses.
    #[error("CH_ERR_402: Release timelock not met: unlocks at {unlocks_at}")]
    TimelockNotMet { unlocks_at: DateTime<Utc> },

    /// Non-admin cancellation must wait out the cancellation delay.
    #[error("CH_ERR_403: Cancellation delay not met: allowed at {allowed_at}")]
    CancellationDelayNotMet { allowed_at: DateTime<Utc> },

    /// Dispute resolution opens only after the dispute timeout.
    #[error("CH_ERR_404: Dispute timeout not reached: opens at {opens_at}")]
    DisputeTimeoutNotReached { opens_at: DateTime<Utc> },

    /// Dispute resolution closes at the dispute expiration.
    #[error("CH_ERR_405: Dispute expired at {closed_at}")]
    DisputeExpired { closed_at: DateTime<Utc> },

    // =================================================================
    // Authorization Errors (5xx)
    // =================================================================
    /// The caller lacks the required role or identity.
    #[error("CH_ERR_500: Unauthorized: {reason}")]
    Unauthorized { reason: String },

    // =================================================================
    // Resource / Funds Errors (6xx)
    // =================================================================
    /// The payer's token balance does not cover the required amount.
    #[error("CH_ERR_600: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    /// The payer's allowance to the custodian does not cover the amount.
    #[error("CH_ERR_601: Insufficient allowance: need {needed}, approved {approved}")]
    InsufficientAllowance { needed: Decimal, approved: Decimal },

    /// The vault's own token balance does not cover the payout.
    #[error("CH_ERR_602: Insufficient vault funds: need {needed}, have {available}")]
    InsufficientVaultFunds { needed: Decimal, available: Decimal },

    /// The dividend pool does not cover the distribution.
    #[error("CH_ERR_603: Insufficient dividend pool: need {needed}, have {available}")]
    InsufficientDividendPool { needed: Decimal, available: Decimal },

    // =================================================================
    // External Collaborator Errors (7xx)
    // =================================================================
    /// The asset issuer refused to mint.
    #[error("CH_ERR_700: Mint rejected: {reason}")]
    MintRejected { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("CH_ERR_900: Internal error: {0}")]
    Internal(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, ClearholdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = ClearholdError::DepositNotFound(OrderKey([0u8; 32]));
        let msg = format!("{err}");
        assert!(msg.starts_with("CH_ERR_300"), "Got: {msg}");
    }

    #[test]
    fn insufficient_balance_display() {
        let err = ClearholdError::InsufficientBalance {
            needed: Decimal::new(41, 0),
            available: Decimal::new(40, 0),
        };
        let msg = format!("{err}");
        assert!(msg.contains("CH_ERR_600"));
        assert!(msg.contains("41"));
        assert!(msg.contains("40"));
    }

    #[test]
    fn status_error_display() {
        let err = ClearholdError::OrderNotPending {
            status: OrderStatus::Finalized,
        };
        let msg = format!("{err}");
        assert!(msg.contains("CH_ERR_201"));
        assert!(msg.contains("FINALIZED"));
    }

    #[test]
    fn all_errors_have_ch_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(ClearholdError::InvalidAccount),
            Box::new(ClearholdError::EmptyDisputeReason),
            Box::new(ClearholdError::AlreadySigned {
                signer: AccountId::new(),
            }),
            Box::new(ClearholdError::AmountOverflow),
            Box::new(ClearholdError::MintRejected {
                reason: "issuer offline".into(),
            }),
            Box::new(ClearholdError::Internal("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("CH_ERR_"),
                "Error missing CH_ERR_ prefix: {msg}"
            );
        }
    }
}
