//! arbiter-escrow
//!
//! Challenge lifecycle with an escrowed prize: creation locks the prize
//! (native or stable token), submissions and one-vote-per-address tallying
//! run until the deadline, and settlement pays a single winner exactly once.
//! There is no explicit close call — settlement is derived the first time a
//! query observes that the deadline has passed.

pub mod engine;
pub mod query;

pub use engine::{ChallengeEscrow, SettleOutcome};
pub use query::{ChallengeDetails, ChallengeQuery};
