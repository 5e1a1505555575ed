use serde::{Deserialize, Serialize};

use crate::types::{Address, Balance};

/// Native-currency account state as stored in the state DB.
///
/// The stable-token ledger (balances and allowances) is kept in separate
/// trees keyed by address; this record only carries the native balance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    pub balance: Balance,
}

impl Account {
    pub fn new(address: Address) -> Self {
        Self { address, balance: 0 }
    }
}
