//! # clearhold-types
//!
//! Shared types, errors, and configuration for the **ClearHold** settlement
//! engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`ProjectId`], [`ChainId`], [`OrderKey`], [`DisputeKey`]
//! - **Order model**: [`Order`], [`OrderRequest`], [`OrderTerms`], [`OrderStatus`], [`PaymentType`]
//! - **Custody model**: [`Deposit`], [`Dispute`]
//! - **Approval model**: [`SignerSet`], [`ApprovalOutcome`]
//! - **Currency model**: [`Currency`], [`AssetId`]
//! - **Collaborator seams**: [`Clock`], [`Authorizer`], [`LedgerToken`], [`AssetIssuer`]
//! - **Configuration**: [`SettlementConfig`], [`ProjectConfig`], [`WindowConfig`]
//! - **Errors**: [`ClearholdError`] with `CH_ERR_` prefix codes
//! - **Constants**: protocol windows, thresholds, and caps

pub mod access;
pub mod approval;
pub mod clock;
pub mod config;
pub mod constants;
pub mod currency;
pub mod deposit;
pub mod dispute;
pub mod error;
pub mod ids;
pub mod issuer;
pub mod order;
pub mod token;

// Re-export all primary types at crate root for ergonomic imports:
//   use clearhold_types::{Order, Deposit, Dispute, SignerSet, ...};

pub use access::*;
pub use approval::*;
pub use clock::*;
pub use config::*;
pub use currency::*;
pub use deposit::*;
pub use dispute::*;
pub use error::*;
pub use ids::*;
pub use issuer::*;
pub use order::*;
pub use token::*;

// Constants are accessed via `clearhold_types::constants::FOO`
// (not re-exported to avoid name collisions).
