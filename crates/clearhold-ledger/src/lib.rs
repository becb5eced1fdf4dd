//! # ClearHold Ledger
//!
//! The decision plane of the ClearHold settlement engine. The ledger owns
//! order records and their state machine:
//!
//! ```text
//!   Pending ──► DocumentsSigned ──► Finalized ──► released
//!      │               │
//!      └───────┬───────┘
//!              ▼
//!          Cancelled
//! ```
//!
//! Placement validates the request, computes the payment terms, derives
//! the order key, and hands the buyer's funds to the vault. Finalization
//! mints the purchased units and completes payment. Release is a
//! threshold action: designated signers approve through
//! [`OrderLedger::sign_fund_release`] and the tipping approval instructs
//! the vault to pay the project owner. Cancellation and stuck-order
//! recovery route the custodied funds back to the buyer.
//!
//! Every window guard (expiration, cancellation delay, release timelock)
//! reads time from the injected [`clearhold_types::Clock`]; every
//! privileged path asks the injected [`clearhold_types::Authorizer`].

pub mod ledger;
pub mod lifecycle;
pub mod placement;
pub mod release;

pub use ledger::OrderLedger;
