//! System-wide constants for the ClearHold settlement engine.

/// Default order expiration window (placement to forced staleness), seconds.
pub const DEFAULT_ORDER_EXPIRATION_SECS: u64 = 7 * 86_400;

/// Default delay before a non-admin buyer may cancel, seconds.
pub const DEFAULT_CANCELLATION_DELAY_SECS: u64 = 86_400;

/// Default timelock between finalization and fund release, seconds.
pub const DEFAULT_RELEASE_TIMELOCK_SECS: u64 = 7 * 86_400;

/// Default wait before a dispute becomes resolvable, seconds.
pub const DEFAULT_DISPUTE_TIMEOUT_SECS: u64 = 7 * 86_400;

/// Default window after which an unresolved dispute freezes, seconds.
pub const DEFAULT_DISPUTE_EXPIRATION_SECS: u64 = 30 * 86_400;

/// Default number of distinct approvals required for threshold actions.
pub const DEFAULT_REQUIRED_SIGNATURES: usize = 2;

/// Default booking (EOI) share of the units value, percent.
pub const DEFAULT_EOI_PERCENT: u32 = 20;

/// Default dividend share of the total order value, percent.
pub const DEFAULT_DIVIDEND_PERCENT: u32 = 5;

/// Absolute cap on units per order, regardless of project bounds.
pub const MAX_ORDER_UNITS: u64 = 10_000_000;

/// Default per-project minimum investment, units.
pub const DEFAULT_MIN_ORDER_UNITS: u64 = 1;

/// Default per-project maximum investment, units.
pub const DEFAULT_MAX_ORDER_UNITS: u64 = 1_000_000;

/// Maximum dispute reason length, bytes.
pub const MAX_DISPUTE_REASON_LEN: usize = 500;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "ClearHold";
