use arbiter_core::account::Account;
use arbiter_core::error::ArbiterError;
use arbiter_core::types::{Address, Balance};

use crate::db::StateDb;

// ── NativeLedger ─────────────────────────────────────────────────────────────

/// Native-currency balance operations over the state DB.
///
/// `debit` validates before writing, so a failed movement leaves state
/// untouched; callers sequence a debit before the matching credit to keep
/// fund-moving transitions atomic under the serialized transaction order.
pub struct NativeLedger<'a> {
    db: &'a StateDb,
}

impl<'a> NativeLedger<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    pub fn balance_of(&self, address: &Address) -> Result<Balance, ArbiterError> {
        Ok(self.db.get_account(address)?.map(|a| a.balance).unwrap_or(0))
    }

    pub fn credit(&self, address: &Address, amount: Balance) -> Result<(), ArbiterError> {
        let mut acc = self
            .db
            .get_account(address)?
            .unwrap_or_else(|| Account::new(*address));
        acc.balance += amount;
        self.db.put_account(&acc)
    }

    pub fn debit(&self, address: &Address, amount: Balance) -> Result<(), ArbiterError> {
        let mut acc = self
            .db
            .get_account(address)?
            .ok_or_else(|| ArbiterError::UnknownAccount(address.to_hex()))?;
        if acc.balance < amount {
            return Err(ArbiterError::InsufficientBalance {
                need: amount,
                have: acc.balance,
            });
        }
        acc.balance -= amount;
        self.db.put_account(&acc)
    }
}

// ── StableToken ──────────────────────────────────────────────────────────────

/// USDC-style 6-decimal token ledger: `balance_of`, `allowance`, `approve`,
/// `transfer_from`. Models the collaborator token the escrow pulls prizes
/// from; `mint` exists for genesis/test seeding only.
pub struct StableToken<'a> {
    db: &'a StateDb,
}

impl<'a> StableToken<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    pub fn balance_of(&self, address: &Address) -> Result<Balance, ArbiterError> {
        self.db.get_token_balance(address)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Result<Balance, ArbiterError> {
        self.db.get_token_allowance(owner, spender)
    }

    /// Set `spender`'s allowance over `owner`'s tokens (overwrite semantics).
    pub fn approve(
        &self,
        owner: &Address,
        spender: &Address,
        amount: Balance,
    ) -> Result<(), ArbiterError> {
        self.db.put_token_allowance(owner, spender, amount)
    }

    /// Seed a balance outside the transfer rules.
    pub fn mint(&self, to: &Address, amount: Balance) -> Result<(), ArbiterError> {
        let current = self.db.get_token_balance(to)?;
        self.db.put_token_balance(to, current + amount)
    }

    pub fn transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: Balance,
    ) -> Result<(), ArbiterError> {
        let from_balance = self.db.get_token_balance(from)?;
        if from_balance < amount {
            return Err(ArbiterError::InsufficientBalance {
                need: amount,
                have: from_balance,
            });
        }
        let to_balance = self.db.get_token_balance(to)?;
        self.db.put_token_balance(from, from_balance - amount)?;
        self.db.put_token_balance(to, to_balance + amount)
    }

    /// Allowance-gated pull: `spender` moves `amount` of `owner`'s tokens to
    /// `to`. Both checks pass before any balance or allowance is written.
    pub fn transfer_from(
        &self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: Balance,
    ) -> Result<(), ArbiterError> {
        let approved = self.db.get_token_allowance(owner, spender)?;
        if approved < amount {
            return Err(ArbiterError::InsufficientAllowance { need: amount, approved });
        }
        let owner_balance = self.db.get_token_balance(owner)?;
        if owner_balance < amount {
            return Err(ArbiterError::InsufficientBalance {
                need: amount,
                have: owner_balance,
            });
        }

        let to_balance = self.db.get_token_balance(to)?;
        self.db.put_token_allowance(owner, spender, approved - amount)?;
        self.db.put_token_balance(owner, owner_balance - amount)?;
        self.db.put_token_balance(to, to_balance + amount)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("arbiter_ledger_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    #[test]
    fn native_debit_requires_funds() {
        let db = temp_db("native_debit");
        let ledger = NativeLedger::new(&db);
        let a = addr(1);

        ledger.credit(&a, 100).unwrap();
        ledger.debit(&a, 60).unwrap();
        assert_eq!(ledger.balance_of(&a).unwrap(), 40);

        let err = ledger.debit(&a, 41).unwrap_err();
        assert!(matches!(err, ArbiterError::InsufficientBalance { need: 41, have: 40 }));
        // Failed debit left the balance untouched.
        assert_eq!(ledger.balance_of(&a).unwrap(), 40);
    }

    #[test]
    fn native_debit_unknown_account() {
        let db = temp_db("native_unknown");
        let ledger = NativeLedger::new(&db);
        assert!(matches!(
            ledger.debit(&addr(5), 1).unwrap_err(),
            ArbiterError::UnknownAccount(_)
        ));
    }

    #[test]
    fn transfer_from_requires_allowance_before_balance() {
        let db = temp_db("tf_allowance");
        let token = StableToken::new(&db);
        let (owner, spender, dest) = (addr(1), addr(2), addr(3));

        token.mint(&owner, 2_000_000).unwrap();

        // No approval yet.
        let err = token.transfer_from(&spender, &owner, &dest, 1_000_000).unwrap_err();
        assert!(matches!(err, ArbiterError::InsufficientAllowance { approved: 0, .. }));

        // Approved but underfunded.
        token.approve(&owner, &spender, 5_000_000).unwrap();
        let err = token.transfer_from(&spender, &owner, &dest, 3_000_000).unwrap_err();
        assert!(matches!(err, ArbiterError::InsufficientBalance { .. }));
        // Nothing moved on failure.
        assert_eq!(token.balance_of(&owner).unwrap(), 2_000_000);
        assert_eq!(token.allowance(&owner, &spender).unwrap(), 5_000_000);
    }

    #[test]
    fn transfer_from_consumes_allowance() {
        let db = temp_db("tf_consume");
        let token = StableToken::new(&db);
        let (owner, spender, dest) = (addr(1), addr(2), addr(3));

        token.mint(&owner, 3_000_000).unwrap();
        token.approve(&owner, &spender, 1_000_000).unwrap();
        token.transfer_from(&spender, &owner, &dest, 1_000_000).unwrap();

        assert_eq!(token.balance_of(&owner).unwrap(), 2_000_000);
        assert_eq!(token.balance_of(&dest).unwrap(), 1_000_000);
        assert_eq!(token.allowance(&owner, &spender).unwrap(), 0);
    }
}
