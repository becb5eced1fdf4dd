//! Order records and their lifecycle state machine.
//!
//! ```text
//!   Pending ──► DocumentsSigned ──► Finalized   (terminal, success)
//!      │               │
//!      └───────┬───────┘
//!              ▼
//!          Cancelled                            (terminal)
//! ```
//!
//! Status transitions only move forward or sideways into `Cancelled`; the
//! `released` flag is set once, from `Finalized` only. Window and
//! authorization guards live in the ledger; the record enforces the state
//! machine itself.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AccountId, AssetId, ClearholdError, Currency, OrderKey, ProjectId, Result,
};

// ---------------------------------------------------------------------------
// PaymentType
// ---------------------------------------------------------------------------

/// How the buyer funds the order at placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentType {
    /// Expression of interest: a booking percentage up front, remainder at
    /// finalization.
    Eoi,
    /// The entire order value up front.
    Full,
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eoi => write!(f, "EOI"),
            Self::Full => write!(f, "FULL"),
        }
    }
}

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

/// Lifecycle states of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Placed and funded, awaiting document signature.
    Pending,
    /// Buyer has signed the purchase documents.
    DocumentsSigned,
    /// Payment complete, asset units minted. Terminal success state.
    Finalized,
    /// Withdrawn or recovered. Terminal state.
    Cancelled,
}

impl OrderStatus {
    /// Whether the state machine permits moving from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::DocumentsSigned)
                | (Self::Pending | Self::DocumentsSigned, Self::Cancelled)
                | (Self::DocumentsSigned, Self::Finalized)
        )
    }

    /// Open orders can still be signed, finalized, or cancelled.
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::DocumentsSigned)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finalized | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::DocumentsSigned => write!(f, "DOCUMENTS_SIGNED"),
            Self::Finalized => write!(f, "FINALIZED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

// ---------------------------------------------------------------------------
// OrderRequest
// ---------------------------------------------------------------------------

/// A buyer's placement request, before validation and key derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub buyer: AccountId,
    pub project: ProjectId,
    pub asset: AssetId,
    pub units: Decimal,
    pub unit_price: Decimal,
    pub fees: Decimal,
    pub payment_type: PaymentType,
    pub currency: Currency,
}

// ---------------------------------------------------------------------------
// OrderTerms
// ---------------------------------------------------------------------------

/// Monetary terms computed at placement.
///
/// `total_value` includes fees; `booking_payment` is the EOI percentage of
/// the units value plus the full fees, so fees are never deferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTerms {
    pub units_value: Decimal,
    pub total_value: Decimal,
    pub booking_payment: Decimal,
}

impl OrderTerms {
    /// Computes the monetary terms for an order. Every step is checked:
    /// an order large enough to leave the decimal range is rejected, not
    /// wrapped or panicked on.
    ///
    /// # Errors
    ///
    /// Fails with `AmountOverflow` when any intermediate amount exceeds
    /// the representable range.
    pub fn compute(
        units: Decimal,
        unit_price: Decimal,
        fees: Decimal,
        eoi_percent: u32,
    ) -> Result<Self> {
        let units_value = units
            .checked_mul(unit_price)
            .ok_or(ClearholdError::AmountOverflow)?;
        let total_value = units_value
            .checked_add(fees)
            .ok_or(ClearholdError::AmountOverflow)?;
        let eoi_share = units_value
            .checked_mul(Decimal::from(eoi_percent))
            .ok_or(ClearholdError::AmountOverflow)?
            / Decimal::ONE_HUNDRED;
        let booking_payment = eoi_share
            .checked_add(fees)
            .ok_or(ClearholdError::AmountOverflow)?;
        Ok(Self {
            units_value,
            total_value,
            booking_payment,
        })
    }

    /// The amount the buyer must fund at placement.
    #[must_use]
    pub fn required_payment(&self, payment_type: PaymentType) -> Decimal {
        match payment_type {
            PaymentType::Eoi => self.booking_payment,
            PaymentType::Full => self.total_value,
        }
    }
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// A staged purchase commitment held by the Order Ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub key: OrderKey,
    pub buyer: AccountId,
    pub project: ProjectId,
    pub asset: AssetId,
    pub units: Decimal,
    pub unit_price: Decimal,
    pub fees: Decimal,
    /// `units × unit_price + fees`.
    pub total_value: Decimal,
    /// EOI share of the units value plus fees.
    pub booking_payment: Decimal,
    pub currency: Currency,
    pub payment_type: PaymentType,
    pub status: OrderStatus,
    /// Set exactly once, when custodied funds leave for the project owner.
    pub released: bool,
    /// True once the entire `total_value` has been collected.
    pub has_full_payment: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Set at finalization; release approvals are rejected before it.
    pub release_timelock: Option<DateTime<Utc>>,
}

impl Order {
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// The amount currently custodied for this order: the full value once
    /// payment completed, otherwise the booking portion.
    #[must_use]
    pub fn net_payable(&self) -> Decimal {
        if self.has_full_payment {
            self.total_value
        } else {
            self.booking_payment
        }
    }

    /// `Pending` → `DocumentsSigned`.
    pub fn mark_documents_signed(&mut self) -> Result<()> {
        if self.status != OrderStatus::Pending {
            return Err(ClearholdError::OrderNotPending {
                status: self.status,
            });
        }
        self.status = OrderStatus::DocumentsSigned;
        Ok(())
    }

    /// `DocumentsSigned` → `Finalized`. Finalization always completes
    /// payment, so the full-payment flag is set here as well.
    pub fn mark_finalized(&mut self, unlocks_at: DateTime<Utc>) -> Result<()> {
        if self.status != OrderStatus::DocumentsSigned {
            return Err(ClearholdError::DocumentsNotSigned {
                status: self.status,
            });
        }
        self.status = OrderStatus::Finalized;
        self.has_full_payment = true;
        self.release_timelock = Some(unlocks_at);
        Ok(())
    }

    /// `Pending` / `DocumentsSigned` → `Cancelled`.
    pub fn mark_cancelled(&mut self) -> Result<()> {
        if !self.status.is_open() {
            return Err(ClearholdError::OrderNotOpen {
                status: self.status,
            });
        }
        self.status = OrderStatus::Cancelled;
        Ok(())
    }

    /// Set the one-shot released flag on a `Finalized` order.
    pub fn mark_released(&mut self) -> Result<()> {
        if self.status != OrderStatus::Finalized {
            return Err(ClearholdError::OrderNotFinalized {
                status: self.status,
            });
        }
        if self.released {
            return Err(ClearholdError::AlreadyReleased(self.key));
        }
        self.released = true;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    /// A pending EOI order with the canonical worked-example terms:
    /// 100 units at price 2 with fee 1 and a 20% booking share.
    #[must_use]
    pub fn dummy_eoi(buyer: AccountId, project: ProjectId) -> Self {
        let units = Decimal::new(100, 0);
        let unit_price = Decimal::new(2, 0);
        let fees = Decimal::new(1, 0);
        let terms = OrderTerms::compute(units, unit_price, fees, 20).unwrap();
        let created_at = Utc::now();
        Self {
            key: OrderKey::derive(buyer, project, crate::ChainId(1), "VILLA-A", 0),
            buyer,
            project,
            asset: "VILLA-A".to_string(),
            units,
            unit_price,
            fees,
            total_value: terms.total_value,
            booking_payment: terms.booking_payment,
            currency: Currency::Usdt,
            payment_type: PaymentType::Eoi,
            status: OrderStatus::Pending,
            released: false,
            has_full_payment: false,
            created_at,
            expires_at: created_at + chrono::Duration::days(7),
            release_timelock: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
