//! # ClearHold Vault
//!
//! The custody plane of the ClearHold settlement engine. The vault holds
//! buyer funds against derived order keys and pays them out through three
//! doors, each with its own authorization story:
//!
//! - **Threshold releases** ([`EscrowVault::sign_release`]): a quorum of
//!   signers approves a payout of part or all of a deposit.
//! - **Ledger releases** ([`EscrowVault::release`]): the order ledger
//!   instructs a payout whose authorization already happened at the
//!   lifecycle layer (cancellation refunds, finalized settlements).
//! - **Dispute resolutions** ([`EscrowVault::sign_dispute_resolution`]):
//!   a quorum resolves a contested deposit inside its resolution window.
//!
//! A per-currency dividend pool rides alongside custody so finalized
//! orders can fund investor payouts from the same rail balance.
//!
//! The vault never talks to a payment rail on its own; every operation
//! that moves funds takes the rail as a `&mut dyn LedgerToken` argument.

pub mod custody;
pub mod dispute;
pub mod dividend;

pub use custody::EscrowVault;
