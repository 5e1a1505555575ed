use arbiter_core::account::Account;
use arbiter_core::challenge::Challenge;
use arbiter_core::error::ArbiterError;
use arbiter_core::feed::PriceFeedState;
use arbiter_core::market::TokenData;
use arbiter_core::request::{OracleRequest, PromptRecord, RequestKind, TxVerificationRecord};
use arbiter_core::types::{Address, Balance, ChallengeId, RequestId, TokenId};
use std::path::Path;

/// Persistent state database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees (analogous to column families):
///   accounts         — Address bytes                  → bincode(Account)
///   token_balances   — Address bytes                  → bincode(Balance)
///   token_allowances — owner bytes ++ spender bytes   → bincode(Balance)
///   requests         — RequestId bytes                → bincode(OracleRequest)
///   latest_requests  — [kind key byte]                → RequestId bytes
///   challenges       — ChallengeId big-endian         → bincode(Challenge)
///   votes            — ChallengeId BE ++ voter bytes  → [] (membership set)
///   tokens           — TokenId big-endian             → bincode(TokenData)
///   holdings         — TokenId BE ++ owner bytes      → bincode(u64 count)
///   feed             — fixed key                      → bincode(PriceFeedState)
///   results          — fixed keys                     → bincode(applied record)
///   meta             — utf8 key bytes                 → raw bytes
pub struct StateDb {
    _db: sled::Db,
    accounts: sled::Tree,
    token_balances: sled::Tree,
    token_allowances: sled::Tree,
    requests: sled::Tree,
    latest_requests: sled::Tree,
    challenges: sled::Tree,
    votes: sled::Tree,
    tokens: sled::Tree,
    holdings: sled::Tree,
    feed: sled::Tree,
    results: sled::Tree,
    meta: sled::Tree,
}

const FEED_KEY: &[u8] = b"price_feed";
const PROMPT_KEY: &[u8] = b"latest_prompt";
const TX_RESULT_KEY: &[u8] = b"latest_tx_result";
const NEXT_CHALLENGE_ID_KEY: &str = "next_challenge_id";
const NEXT_TOKEN_ID_KEY: &str = "next_token_id";

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ArbiterError> {
        let db = sled::open(path).map_err(|e| ArbiterError::Storage(e.to_string()))?;
        let accounts         = db.open_tree("accounts").map_err(|e| ArbiterError::Storage(e.to_string()))?;
        let token_balances   = db.open_tree("token_balances").map_err(|e| ArbiterError::Storage(e.to_string()))?;
        let token_allowances = db.open_tree("token_allowances").map_err(|e| ArbiterError::Storage(e.to_string()))?;
        let requests         = db.open_tree("requests").map_err(|e| ArbiterError::Storage(e.to_string()))?;
        let latest_requests  = db.open_tree("latest_requests").map_err(|e| ArbiterError::Storage(e.to_string()))?;
        let challenges       = db.open_tree("challenges").map_err(|e| ArbiterError::Storage(e.to_string()))?;
        let votes            = db.open_tree("votes").map_err(|e| ArbiterError::Storage(e.to_string()))?;
        let tokens           = db.open_tree("tokens").map_err(|e| ArbiterError::Storage(e.to_string()))?;
        let holdings         = db.open_tree("holdings").map_err(|e| ArbiterError::Storage(e.to_string()))?;
        let feed             = db.open_tree("feed").map_err(|e| ArbiterError::Storage(e.to_string()))?;
        let results          = db.open_tree("results").map_err(|e| ArbiterError::Storage(e.to_string()))?;
        let meta             = db.open_tree("meta").map_err(|e| ArbiterError::Storage(e.to_string()))?;
        Ok(Self {
            _db: db,
            accounts,
            token_balances,
            token_allowances,
            requests,
            latest_requests,
            challenges,
            votes,
            tokens,
            holdings,
            feed,
            results,
            meta,
        })
    }

    // ── Accounts ─────────────────────────────────────────────────────────────

    pub fn get_account(&self, address: &Address) -> Result<Option<Account>, ArbiterError> {
        match self.accounts.get(address.as_bytes()).map_err(|e| ArbiterError::Storage(e.to_string()))? {
            Some(bytes) => {
                let acc = bincode::deserialize(&bytes)
                    .map_err(|e| ArbiterError::Serialization(e.to_string()))?;
                Ok(Some(acc))
            }
            None => Ok(None),
        }
    }

    pub fn put_account(&self, account: &Account) -> Result<(), ArbiterError> {
        let bytes = bincode::serialize(account)
            .map_err(|e| ArbiterError::Serialization(e.to_string()))?;
        self.accounts
            .insert(account.address.as_bytes(), bytes)
            .map_err(|e| ArbiterError::Storage(e.to_string()))?;
        Ok(())
    }

    // ── Stable-token ledger ──────────────────────────────────────────────────

    pub fn get_token_balance(&self, address: &Address) -> Result<Balance, ArbiterError> {
        match self.token_balances.get(address.as_bytes()).map_err(|e| ArbiterError::Storage(e.to_string()))? {
            Some(bytes) => bincode::deserialize(&bytes)
                .map_err(|e| ArbiterError::Serialization(e.to_string())),
            None => Ok(0),
        }
    }

    pub fn put_token_balance(&self, address: &Address, balance: Balance) -> Result<(), ArbiterError> {
        let bytes = bincode::serialize(&balance)
            .map_err(|e| ArbiterError::Serialization(e.to_string()))?;
        self.token_balances
            .insert(address.as_bytes(), bytes)
            .map_err(|e| ArbiterError::Storage(e.to_string()))?;
        Ok(())
    }

    fn allowance_key(owner: &Address, spender: &Address) -> [u8; 40] {
        let mut key = [0u8; 40];
        key[..20].copy_from_slice(owner.as_bytes());
        key[20..].copy_from_slice(spender.as_bytes());
        key
    }

    pub fn get_token_allowance(&self, owner: &Address, spender: &Address) -> Result<Balance, ArbiterError> {
        let key = Self::allowance_key(owner, spender);
        match self.token_allowances.get(key).map_err(|e| ArbiterError::Storage(e.to_string()))? {
            Some(bytes) => bincode::deserialize(&bytes)
                .map_err(|e| ArbiterError::Serialization(e.to_string())),
            None => Ok(0),
        }
    }

    pub fn put_token_allowance(
        &self,
        owner: &Address,
        spender: &Address,
        amount: Balance,
    ) -> Result<(), ArbiterError> {
        let key = Self::allowance_key(owner, spender);
        let bytes = bincode::serialize(&amount)
            .map_err(|e| ArbiterError::Serialization(e.to_string()))?;
        self.token_allowances
            .insert(key, bytes)
            .map_err(|e| ArbiterError::Storage(e.to_string()))?;
        Ok(())
    }

    // ── Oracle requests ──────────────────────────────────────────────────────

    pub fn get_request(&self, id: &RequestId) -> Result<Option<OracleRequest>, ArbiterError> {
        match self.requests.get(id.as_bytes()).map_err(|e| ArbiterError::Storage(e.to_string()))? {
            Some(bytes) => {
                let req = bincode::deserialize(&bytes)
                    .map_err(|e| ArbiterError::Serialization(e.to_string()))?;
                Ok(Some(req))
            }
            None => Ok(None),
        }
    }

    pub fn put_request(&self, request: &OracleRequest) -> Result<(), ArbiterError> {
        let bytes = bincode::serialize(request)
            .map_err(|e| ArbiterError::Serialization(e.to_string()))?;
        self.requests
            .insert(request.id.as_bytes(), bytes)
            .map_err(|e| ArbiterError::Storage(e.to_string()))?;
        Ok(())
    }

    /// The most recent request id submitted for `kind`, or the zero sentinel.
    pub fn latest_request_id(&self, kind: RequestKind) -> Result<RequestId, ArbiterError> {
        match self.latest_requests.get([kind.key()]).map_err(|e| ArbiterError::Storage(e.to_string()))? {
            Some(bytes) if bytes.len() == 32 => {
                let mut arr = [0u8; 32];
                arr.copy_from_slice(&bytes);
                Ok(RequestId::from_bytes(arr))
            }
            Some(_) => Err(ArbiterError::Storage("corrupt latest-request entry".into())),
            None => Ok(RequestId::ZERO),
        }
    }

    pub fn set_latest_request_id(&self, kind: RequestKind, id: &RequestId) -> Result<(), ArbiterError> {
        self.latest_requests
            .insert([kind.key()], id.as_bytes().as_ref())
            .map_err(|e| ArbiterError::Storage(e.to_string()))?;
        Ok(())
    }

    // ── Challenges ───────────────────────────────────────────────────────────

    pub fn get_challenge(&self, id: ChallengeId) -> Result<Option<Challenge>, ArbiterError> {
        match self.challenges.get(id.to_be_bytes()).map_err(|e| ArbiterError::Storage(e.to_string()))? {
            Some(bytes) => {
                let c = bincode::deserialize(&bytes)
                    .map_err(|e| ArbiterError::Serialization(e.to_string()))?;
                Ok(Some(c))
            }
            None => Ok(None),
        }
    }

    pub fn put_challenge(&self, challenge: &Challenge) -> Result<(), ArbiterError> {
        let bytes = bincode::serialize(challenge)
            .map_err(|e| ArbiterError::Serialization(e.to_string()))?;
        self.challenges
            .insert(challenge.id.to_be_bytes(), bytes)
            .map_err(|e| ArbiterError::Storage(e.to_string()))?;
        Ok(())
    }

    /// All challenges in id order (big-endian keys iterate ascending).
    pub fn iter_challenges(&self) -> Result<Vec<Challenge>, ArbiterError> {
        let mut out = Vec::new();
        for item in self.challenges.iter() {
            let (_, bytes) = item.map_err(|e| ArbiterError::Storage(e.to_string()))?;
            let c = bincode::deserialize(&bytes)
                .map_err(|e| ArbiterError::Serialization(e.to_string()))?;
            out.push(c);
        }
        Ok(out)
    }

    /// Allocate the next sequential challenge id, starting from 0.
    pub fn next_challenge_id(&self) -> Result<ChallengeId, ArbiterError> {
        self.next_sequential(NEXT_CHALLENGE_ID_KEY)
    }

    /// Allocate the next value of a meta-tree counter, starting from 0.
    fn next_sequential(&self, key: &str) -> Result<u64, ArbiterError> {
        let next = match self.get_meta(key)? {
            Some(bytes) if bytes.len() == 8 => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&bytes);
                u64::from_be_bytes(arr)
            }
            _ => 0,
        };
        self.put_meta(key, &(next + 1).to_be_bytes())?;
        Ok(next)
    }

    // ── Vote records ─────────────────────────────────────────────────────────

    fn vote_key(challenge_id: ChallengeId, voter: &Address) -> [u8; 28] {
        let mut key = [0u8; 28];
        key[..8].copy_from_slice(&challenge_id.to_be_bytes());
        key[8..].copy_from_slice(voter.as_bytes());
        key
    }

    pub fn has_voted(&self, challenge_id: ChallengeId, voter: &Address) -> Result<bool, ArbiterError> {
        let key = Self::vote_key(challenge_id, voter);
        self.votes
            .contains_key(key)
            .map_err(|e| ArbiterError::Storage(e.to_string()))
    }

    pub fn record_vote(&self, challenge_id: ChallengeId, voter: &Address) -> Result<(), ArbiterError> {
        let key = Self::vote_key(challenge_id, voter);
        self.votes
            .insert(key, b"".as_ref())
            .map_err(|e| ArbiterError::Storage(e.to_string()))?;
        Ok(())
    }

    // ── Marketplace tokens ───────────────────────────────────────────────────

    pub fn get_token(&self, id: TokenId) -> Result<Option<TokenData>, ArbiterError> {
        match self.tokens.get(id.to_be_bytes()).map_err(|e| ArbiterError::Storage(e.to_string()))? {
            Some(bytes) => {
                let t = bincode::deserialize(&bytes)
                    .map_err(|e| ArbiterError::Serialization(e.to_string()))?;
                Ok(Some(t))
            }
            None => Ok(None),
        }
    }

    pub fn put_token(&self, token: &TokenData) -> Result<(), ArbiterError> {
        let bytes = bincode::serialize(token)
            .map_err(|e| ArbiterError::Serialization(e.to_string()))?;
        self.tokens
            .insert(token.id.to_be_bytes(), bytes)
            .map_err(|e| ArbiterError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Allocate the next sequential token id, starting from 0.
    pub fn next_token_id(&self) -> Result<TokenId, ArbiterError> {
        self.next_sequential(NEXT_TOKEN_ID_KEY)
    }

    fn holding_key(token_id: TokenId, owner: &Address) -> [u8; 28] {
        let mut key = [0u8; 28];
        key[..8].copy_from_slice(&token_id.to_be_bytes());
        key[8..].copy_from_slice(owner.as_bytes());
        key
    }

    /// Minted count of `token_id` held by `owner`, zero when absent.
    pub fn get_holding(&self, token_id: TokenId, owner: &Address) -> Result<u64, ArbiterError> {
        let key = Self::holding_key(token_id, owner);
        match self.holdings.get(key).map_err(|e| ArbiterError::Storage(e.to_string()))? {
            Some(bytes) => bincode::deserialize(&bytes)
                .map_err(|e| ArbiterError::Serialization(e.to_string())),
            None => Ok(0),
        }
    }

    pub fn put_holding(&self, token_id: TokenId, owner: &Address, count: u64) -> Result<(), ArbiterError> {
        let key = Self::holding_key(token_id, owner);
        let bytes = bincode::serialize(&count)
            .map_err(|e| ArbiterError::Serialization(e.to_string()))?;
        self.holdings
            .insert(key, bytes)
            .map_err(|e| ArbiterError::Storage(e.to_string()))?;
        Ok(())
    }

    // ── Price-feed state ─────────────────────────────────────────────────────

    /// Current feed state; a fresh database starts from the defaults.
    pub fn get_feed_state(&self) -> Result<PriceFeedState, ArbiterError> {
        match self.feed.get(FEED_KEY).map_err(|e| ArbiterError::Storage(e.to_string()))? {
            Some(bytes) => bincode::deserialize(&bytes)
                .map_err(|e| ArbiterError::Serialization(e.to_string())),
            None => Ok(PriceFeedState::default()),
        }
    }

    pub fn put_feed_state(&self, state: &PriceFeedState) -> Result<(), ArbiterError> {
        let bytes = bincode::serialize(state)
            .map_err(|e| ArbiterError::Serialization(e.to_string()))?;
        self.feed
            .insert(FEED_KEY, bytes)
            .map_err(|e| ArbiterError::Storage(e.to_string()))?;
        Ok(())
    }

    // ── Applied oracle results ───────────────────────────────────────────────

    pub fn get_latest_prompt(&self) -> Result<Option<PromptRecord>, ArbiterError> {
        match self.results.get(PROMPT_KEY).map_err(|e| ArbiterError::Storage(e.to_string()))? {
            Some(bytes) => {
                let rec = bincode::deserialize(&bytes)
                    .map_err(|e| ArbiterError::Serialization(e.to_string()))?;
                Ok(Some(rec))
            }
            None => Ok(None),
        }
    }

    pub fn put_latest_prompt(&self, record: &PromptRecord) -> Result<(), ArbiterError> {
        let bytes = bincode::serialize(record)
            .map_err(|e| ArbiterError::Serialization(e.to_string()))?;
        self.results
            .insert(PROMPT_KEY, bytes)
            .map_err(|e| ArbiterError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_latest_tx_result(&self) -> Result<Option<TxVerificationRecord>, ArbiterError> {
        match self.results.get(TX_RESULT_KEY).map_err(|e| ArbiterError::Storage(e.to_string()))? {
            Some(bytes) => {
                let rec = bincode::deserialize(&bytes)
                    .map_err(|e| ArbiterError::Serialization(e.to_string()))?;
                Ok(Some(rec))
            }
            None => Ok(None),
        }
    }

    pub fn put_latest_tx_result(&self, record: &TxVerificationRecord) -> Result<(), ArbiterError> {
        let bytes = bincode::serialize(record)
            .map_err(|e| ArbiterError::Serialization(e.to_string()))?;
        self.results
            .insert(TX_RESULT_KEY, bytes)
            .map_err(|e| ArbiterError::Storage(e.to_string()))?;
        Ok(())
    }

    // ── Meta ─────────────────────────────────────────────────────────────────

    pub fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), ArbiterError> {
        self.meta
            .insert(key.as_bytes(), value)
            .map_err(|e| ArbiterError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, ArbiterError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(|e| ArbiterError::Storage(e.to_string()))
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), ArbiterError> {
        self._db.flush().map_err(|e| ArbiterError::Storage(e.to_string()))?;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
