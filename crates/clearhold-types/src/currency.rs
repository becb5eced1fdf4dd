//! Payment currency selection.
//!
//! The currency picks the funding rail funds move through; all arithmetic
//! is carried by [`rust_decimal::Decimal`] regardless of rail.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported payment rails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Currency {
    Usdt,
    Usdc,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usdt => write!(f, "USDT"),
            Self::Usdc => write!(f, "USDC"),
        }
    }
}

/// Asset identifier, e.g. "VILLA-A". Non-empty wherever an operation
/// accepts one.
pub type AssetId = String;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_rail_symbols() {
        assert_eq!(Currency::Usdt.to_string(), "USDT");
        assert_eq!(Currency::Usdc.to_string(), "USDC");
    }
}
