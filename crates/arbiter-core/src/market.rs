use serde::{Deserialize, Serialize};

use crate::types::{Address, Balance, TokenId};

/// A marketplace token as stored in the state DB.
///
/// Prices are denominated in USD (fixed-point, scaled 1e6) and converted to
/// native units at mint time through the price feed's latest answer. `supply`
/// is the remaining mintable count and only ever decreases.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenData {
    pub id: TokenId,
    pub creator: Address,
    /// Remaining mintable supply.
    pub supply: u64,
    /// Metadata reference. Opaque; only non-emptiness is validated.
    pub uri: String,
    /// Mint price in USD, scaled 1e6.
    pub price_usd: Balance,
    /// Creator royalty per mint, in basis points (capped at 2000).
    pub royalty_bps: u16,
}
