//! arbiter-market
//!
//! Token marketplace priced off the automated feed: creators register a
//! token with a USD price and a royalty cut, buyers mint at the native-unit
//! cost derived from the feed's latest answer. Minting refuses outright while
//! no valid price has been applied — the feed's zero sentinel is a hard gate,
//! not a free mint.

pub mod engine;

pub use engine::{MarketConfig, Marketplace};
