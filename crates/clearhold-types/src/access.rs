//! Capability checks for privileged operations.
//!
//! The engine never inspects role tables itself; it asks the injected
//! [`Authorizer`] whether a principal holds a capability. `Admin` gates the
//! recovery, sweep, and distribution paths; `Signer` gates threshold
//! approvals. A deployment may grant both to the same principals.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::AccountId;

/// Privileges a principal can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Admin,
    Signer,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "ADMIN"),
            Self::Signer => write!(f, "SIGNER"),
        }
    }
}

/// Answers "does principal P hold capability C".
pub trait Authorizer: Send + Sync {
    fn check(&self, principal: AccountId, capability: Capability) -> bool;
}

/// Fixed grant sets, the way a deployment wires its known admins and
/// release signers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticAuthorizer {
    admins: HashSet<AccountId>,
    signers: HashSet<AccountId>,
}

impl StaticAuthorizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant_admin(&mut self, principal: AccountId) {
        self.admins.insert(principal);
    }

    pub fn grant_signer(&mut self, principal: AccountId) {
        self.signers.insert(principal);
    }
}

impl Authorizer for StaticAuthorizer {
    fn check(&self, principal: AccountId, capability: Capability) -> bool {
        match capability {
            Capability::Admin => self.admins.contains(&principal),
            Capability::Signer => self.signers.contains(&principal),
        }
    }
}
