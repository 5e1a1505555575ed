pub mod db;
pub mod ledger;

pub use db::StateDb;
pub use ledger::{NativeLedger, StableToken};
