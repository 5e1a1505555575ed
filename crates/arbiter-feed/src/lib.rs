//! arbiter-feed
//!
//! Automated price feed over the oracle network: a periodic eligibility
//! check triggers a new price request, and a separate apply step installs
//! the decoded price once the network has consensus. The two steps are
//! independent polls — nothing in here blocks or retries on its own.

pub mod automation;

pub use automation::{ApplyOutcome, PriceFeed, TriggerOutcome};
