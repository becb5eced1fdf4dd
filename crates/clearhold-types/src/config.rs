//! Configuration types for the settlement engine.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{constants, AccountId, ChainId, ProjectId};

/// Add a window to a timestamp, saturating at the representable maximum
/// rather than wrapping.
fn deadline(from: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|delta| from.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

/// The single project this engine instance settles orders against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub id: ProjectId,
    /// Receives released order funds.
    pub owner: AccountId,
    /// Mixed into order key derivation.
    pub chain: ChainId,
    /// Inactive projects reject placements.
    pub active: bool,
    /// Minimum units per order.
    pub min_investment: Decimal,
    /// Maximum units per order (the absolute system cap still applies).
    pub max_investment: Decimal,
    /// Booking share of the units value, percent. Must be ≤ 100.
    pub eoi_percent: u32,
    /// Dividend share of the total order value, percent. Must be ≤ 100.
    pub dividend_percent: u32,
}

impl ProjectConfig {
    /// An active project with default bounds and shares.
    #[must_use]
    pub fn active(id: ProjectId, owner: AccountId, chain: ChainId) -> Self {
        Self {
            id,
            owner,
            chain,
            active: true,
            min_investment: Decimal::from(constants::DEFAULT_MIN_ORDER_UNITS),
            max_investment: Decimal::from(constants::DEFAULT_MAX_ORDER_UNITS),
            eoi_percent: constants::DEFAULT_EOI_PERCENT,
            dividend_percent: constants::DEFAULT_DIVIDEND_PERCENT,
        }
    }
}

// ---------------------------------------------------------------------------
// WindowConfig
// ---------------------------------------------------------------------------

/// The five protocol time windows. All deadlines are computed from these
/// against timestamps taken from the injected clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub order_expiration: Duration,
    pub cancellation_delay: Duration,
    pub release_timelock: Duration,
    pub dispute_timeout: Duration,
    pub dispute_expiration: Duration,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            order_expiration: Duration::from_secs(constants::DEFAULT_ORDER_EXPIRATION_SECS),
            cancellation_delay: Duration::from_secs(constants::DEFAULT_CANCELLATION_DELAY_SECS),
            release_timelock: Duration::from_secs(constants::DEFAULT_RELEASE_TIMELOCK_SECS),
            dispute_timeout: Duration::from_secs(constants::DEFAULT_DISPUTE_TIMEOUT_SECS),
            dispute_expiration: Duration::from_secs(constants::DEFAULT_DISPUTE_EXPIRATION_SECS),
        }
    }
}

impl WindowConfig {
    /// When an order placed at `placed` goes stale.
    #[must_use]
    pub fn order_expiry_at(&self, placed: DateTime<Utc>) -> DateTime<Utc> {
        deadline(placed, self.order_expiration)
    }

    /// When a non-admin buyer may first cancel an order placed at `placed`.
    #[must_use]
    pub fn cancel_allowed_at(&self, placed: DateTime<Utc>) -> DateTime<Utc> {
        deadline(placed, self.cancellation_delay)
    }

    /// When funds of an order finalized at `finalized` become releasable.
    #[must_use]
    pub fn release_unlock_at(&self, finalized: DateTime<Utc>) -> DateTime<Utc> {
        deadline(finalized, self.release_timelock)
    }

    /// When a dispute raised at `raised` becomes resolvable.
    #[must_use]
    pub fn dispute_opens_at(&self, raised: DateTime<Utc>) -> DateTime<Utc> {
        deadline(raised, self.dispute_timeout)
    }

    /// When a dispute raised at `raised` stops being resolvable.
    #[must_use]
    pub fn dispute_closes_at(&self, raised: DateTime<Utc>) -> DateTime<Utc> {
        deadline(raised, self.dispute_expiration)
    }
}

// ---------------------------------------------------------------------------
// SettlementConfig
// ---------------------------------------------------------------------------

/// Full engine configuration shared by the Order Ledger and Escrow Vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementConfig {
    pub project: ProjectConfig,
    pub windows: WindowConfig,
    /// Distinct approvals required before a threshold action executes.
    pub required_signatures: usize,
    /// Upper bound on dispute reason length, bytes.
    pub max_dispute_reason_len: usize,
}

impl SettlementConfig {
    /// Default windows and threshold around the given project.
    #[must_use]
    pub fn for_project(project: ProjectConfig) -> Self {
        Self {
            project,
            windows: WindowConfig::default(),
            required_signatures: constants::DEFAULT_REQUIRED_SIGNATURES,
            max_dispute_reason_len: constants::MAX_DISPUTE_REASON_LEN,
        }
    }
}
