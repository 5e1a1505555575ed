use std::sync::Arc;

use arbiter_core::constants::{
    BPS_DENOMINATOR, DEFAULT_CREATION_FEE, DEFAULT_PLATFORM_FEE_BPS, MAX_ROYALTY_BPS,
    UNITS_PER_NATIVE,
};
use arbiter_core::error::ArbiterError;
use arbiter_core::event::{Event, EventSink};
use arbiter_core::market::TokenData;
use arbiter_core::types::{Address, Balance, TokenId};
use arbiter_store::{NativeLedger, StateDb};
use tracing::info;

const PAUSED_KEY: &str = "market_paused";

/// Marketplace fee policy, fixed at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct MarketConfig {
    /// Flat native-unit fee charged for creating a token.
    pub creation_fee: Balance,
    /// Platform cut of each mint, in basis points.
    pub platform_fee_bps: u16,
    /// Account receiving creation and platform fees.
    pub fee_recipient: Address,
}

impl MarketConfig {
    pub fn new(fee_recipient: Address) -> Self {
        Self {
            creation_fee: DEFAULT_CREATION_FEE,
            platform_fee_bps: DEFAULT_PLATFORM_FEE_BPS,
            fee_recipient,
        }
    }
}

/// The token marketplace.
///
/// USD-denominated prices, converted to native units at mint time through
/// the price feed's stored answer. Every mutating operation checks all
/// preconditions before any fund movement, and a mint splits the payment in
/// one transition: platform fee to the fee recipient, the rest (royalty
/// included) to the creator.
pub struct Marketplace {
    db: Arc<StateDb>,
    sink: Arc<dyn EventSink>,
    config: MarketConfig,
}

impl Marketplace {
    pub fn new(db: Arc<StateDb>, sink: Arc<dyn EventSink>, config: MarketConfig) -> Self {
        Self { db, sink, config }
    }

    pub fn db(&self) -> &StateDb {
        &self.db
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    // ── Pause gate ───────────────────────────────────────────────────────────

    pub fn is_paused(&self) -> Result<bool, ArbiterError> {
        Ok(self.db.get_meta(PAUSED_KEY)?.map(|v| v == [1]).unwrap_or(false))
    }

    pub fn set_paused(&self, paused: bool) -> Result<(), ArbiterError> {
        self.db.put_meta(PAUSED_KEY, &[paused as u8])
    }

    fn ensure_not_paused(&self) -> Result<(), ArbiterError> {
        if self.is_paused()? {
            return Err(ArbiterError::Paused);
        }
        Ok(())
    }

    // ── Create ───────────────────────────────────────────────────────────────

    /// Register a token and collect the creation fee.
    ///
    /// `attached_value` models the native currency sent along with the call
    /// and must equal the configured creation fee exactly.
    pub fn create_token(
        &self,
        creator: Address,
        supply: u64,
        uri: &str,
        price_usd: Balance,
        royalty_bps: u16,
        attached_value: Balance,
    ) -> Result<TokenId, ArbiterError> {
        self.ensure_not_paused()?;
        if uri.is_empty() {
            return Err(ArbiterError::EmptyTokenUri);
        }
        if supply == 0 {
            return Err(ArbiterError::ZeroSupply);
        }
        if price_usd == 0 {
            return Err(ArbiterError::ZeroAmount);
        }
        if royalty_bps > MAX_ROYALTY_BPS {
            return Err(ArbiterError::RoyaltyTooHigh { bps: royalty_bps, max: MAX_ROYALTY_BPS });
        }
        if attached_value != self.config.creation_fee {
            return Err(ArbiterError::AttachedValueMismatch {
                expected: self.config.creation_fee,
                attached: attached_value,
            });
        }

        let native = NativeLedger::new(&self.db);
        native.debit(&creator, self.config.creation_fee)?;
        native.credit(&self.config.fee_recipient, self.config.creation_fee)?;

        let id = self.db.next_token_id()?;
        let token = TokenData {
            id,
            creator,
            supply,
            uri: uri.to_string(),
            price_usd,
            royalty_bps,
        };
        self.db.put_token(&token)?;

        info!(token_id = id, %creator, supply, price_usd, royalty_bps, "token created");
        self.sink.emit(Event::TokenCreated {
            token_id: id,
            creator,
            supply,
            price_usd,
            royalty_bps,
        });
        Ok(id)
    }

    // ── Pricing ──────────────────────────────────────────────────────────────

    /// Current mint cost of `token_id` in native units, derived from the
    /// feed: `price_usd * UNITS_PER_NATIVE / latest_answer`. Fails with
    /// `NoValidPrice` while the feed has never applied a usable answer.
    pub fn current_price_native(&self, token_id: TokenId) -> Result<Balance, ArbiterError> {
        let token = self
            .db
            .get_token(token_id)?
            .ok_or(ArbiterError::TokenNotFound(token_id))?;
        let answer = self.db.get_feed_state()?.latest_answer;
        if answer == 0 {
            return Err(ArbiterError::NoValidPrice);
        }
        Ok(token.price_usd * UNITS_PER_NATIVE / answer)
    }

    // ── Mint ─────────────────────────────────────────────────────────────────

    /// Mint one unit of `token_id` to `buyer` at the feed-derived price.
    ///
    /// Returns the native price paid. The buyer's attached value must match
    /// the current price exactly; a stale quote is rejected rather than
    /// partially honored.
    pub fn mint(
        &self,
        token_id: TokenId,
        buyer: Address,
        attached_value: Balance,
    ) -> Result<Balance, ArbiterError> {
        self.ensure_not_paused()?;
        let mut token = self
            .db
            .get_token(token_id)?
            .ok_or(ArbiterError::TokenNotFound(token_id))?;
        if token.supply == 0 {
            return Err(ArbiterError::SoldOut(token_id));
        }

        let price_native = self.current_price_native(token_id)?;
        if attached_value != price_native {
            return Err(ArbiterError::AttachedValueMismatch {
                expected: price_native,
                attached: attached_value,
            });
        }

        let platform_fee = price_native * self.config.platform_fee_bps as Balance / BPS_DENOMINATOR;
        let royalty = price_native * token.royalty_bps as Balance / BPS_DENOMINATOR;

        // On a primary mint the creator is also the seller, so the royalty
        // is part of their take; it is still reported separately.
        let native = NativeLedger::new(&self.db);
        native.debit(&buyer, price_native)?;
        native.credit(&self.config.fee_recipient, platform_fee)?;
        native.credit(&token.creator, price_native - platform_fee)?;

        token.supply -= 1;
        self.db.put_token(&token)?;
        let held = self.db.get_holding(token_id, &buyer)?;
        self.db.put_holding(token_id, &buyer, held + 1)?;

        info!(token_id, %buyer, price_native, platform_fee, royalty, "token minted");
        self.sink.emit(Event::TokenMinted {
            token_id,
            buyer,
            creator: token.creator,
            price_native,
            platform_fee,
            royalty,
        });
        Ok(price_native)
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn get_token(&self, token_id: TokenId) -> Result<TokenData, ArbiterError> {
        self.db
            .get_token(token_id)?
            .ok_or(ArbiterError::TokenNotFound(token_id))
    }

    /// Minted count of `token_id` held by `owner`.
    pub fn holding(&self, token_id: TokenId, owner: &Address) -> Result<u64, ArbiterError> {
        self.db.get_holding(token_id, owner)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_core::event::RecordingSink;
    use arbiter_core::feed::PriceFeedState;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    const FEE_RECIPIENT: u8 = 0xFE;

    fn setup(name: &str) -> (Marketplace, Arc<RecordingSink>) {
        let dir = std::env::temp_dir().join(format!("arbiter_market_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        let db = Arc::new(StateDb::open(&dir).expect("open temp db"));
        let sink = Arc::new(RecordingSink::new());
        let market = Marketplace::new(db, sink.clone(), MarketConfig::new(addr(FEE_RECIPIENT)));
        (market, sink)
    }

    fn fund(market: &Marketplace, who: Address, amount: Balance) {
        NativeLedger::new(market.db()).credit(&who, amount).unwrap();
    }

    /// Install an applied feed answer directly; the feed crate's own tests
    /// cover how it gets there.
    fn set_feed_answer(market: &Marketplace, answer: Balance) {
        let state = PriceFeedState { latest_answer: answer, ..PriceFeedState::default() };
        market.db().put_feed_state(&state).unwrap();
    }

    fn dollar_token(market: &Marketplace, creator: Address) -> TokenId {
        // $1.00 at 2.5% royalty, supply 100, standard creation fee.
        market
            .create_token(creator, 100, "ipfs://metadata", 1_000_000, 250, DEFAULT_CREATION_FEE)
            .unwrap()
    }

    #[test]
    fn create_validates_and_collects_fee() {
        let (market, _) = setup("create");
        let creator = addr(1);
        fund(&market, creator, 1_000);

        assert!(matches!(
            market.create_token(creator, 100, "", 1_000_000, 250, DEFAULT_CREATION_FEE),
            Err(ArbiterError::EmptyTokenUri)
        ));
        assert!(matches!(
            market.create_token(creator, 0, "ipfs://m", 1_000_000, 250, DEFAULT_CREATION_FEE),
            Err(ArbiterError::ZeroSupply)
        ));
        assert!(matches!(
            market.create_token(creator, 100, "ipfs://m", 0, 250, DEFAULT_CREATION_FEE),
            Err(ArbiterError::ZeroAmount)
        ));
        assert!(matches!(
            market.create_token(creator, 100, "ipfs://m", 1_000_000, 2_001, DEFAULT_CREATION_FEE),
            Err(ArbiterError::RoyaltyTooHigh { bps: 2_001, max: 2_000 })
        ));
        assert!(matches!(
            market.create_token(creator, 100, "ipfs://m", 1_000_000, 250, 0),
            Err(ArbiterError::AttachedValueMismatch { .. })
        ));
        // Rejected calls charged nothing.
        let native = NativeLedger::new(market.db());
        assert_eq!(native.balance_of(&creator).unwrap(), 1_000);

        let id = dollar_token(&market, creator);
        assert_eq!(id, 0);
        assert_eq!(native.balance_of(&creator).unwrap(), 1_000 - DEFAULT_CREATION_FEE);
        assert_eq!(native.balance_of(&addr(FEE_RECIPIENT)).unwrap(), DEFAULT_CREATION_FEE);
    }

    #[test]
    fn mint_refused_while_no_valid_price() {
        let (market, _) = setup("no_price");
        let creator = addr(1);
        fund(&market, creator, 1_000);
        let id = dollar_token(&market, creator);

        // Fresh feed: latest_answer is the zero sentinel.
        assert!(matches!(
            market.current_price_native(id).unwrap_err(),
            ArbiterError::NoValidPrice
        ));
        assert!(matches!(
            market.mint(id, addr(2), 0).unwrap_err(),
            ArbiterError::NoValidPrice
        ));
        assert_eq!(market.get_token(id).unwrap().supply, 100);
    }

    #[test]
    fn mint_price_derives_from_feed_answer() {
        let (market, _) = setup("pricing");
        let creator = addr(1);
        fund(&market, creator, 1_000);
        let id = dollar_token(&market, creator);

        // $1.00 at $2431.17 per native coin → 411 units (floored).
        set_feed_answer(&market, 2_431_170_000);
        assert_eq!(market.current_price_native(id).unwrap(), 411);

        // The quote tracks the feed: a cheaper coin costs more units.
        set_feed_answer(&market, 1_000_000_000);
        assert_eq!(market.current_price_native(id).unwrap(), 1_000);
    }

    #[test]
    fn mint_splits_payment_and_records_holding() {
        let (market, sink) = setup("split");
        let creator = addr(1);
        let buyer = addr(2);
        fund(&market, creator, 1_000);
        fund(&market, buyer, 10_000);
        let id = dollar_token(&market, creator);
        set_feed_answer(&market, 1_000_000_000); // $1000 per coin → 1_000 units per mint
        sink.take();

        // Stale or wrong quotes are rejected before any movement.
        assert!(matches!(
            market.mint(id, buyer, 999).unwrap_err(),
            ArbiterError::AttachedValueMismatch { expected: 1_000, attached: 999 }
        ));

        assert_eq!(market.mint(id, buyer, 1_000).unwrap(), 1_000);

        let native = NativeLedger::new(market.db());
        // 2.5% platform fee on 1_000 units = 25; the rest goes to the creator.
        assert_eq!(native.balance_of(&buyer).unwrap(), 9_000);
        assert_eq!(
            native.balance_of(&addr(FEE_RECIPIENT)).unwrap(),
            DEFAULT_CREATION_FEE + 25
        );
        assert_eq!(
            native.balance_of(&creator).unwrap(),
            1_000 - DEFAULT_CREATION_FEE + 975
        );

        assert_eq!(market.get_token(id).unwrap().supply, 99);
        assert_eq!(market.holding(id, &buyer).unwrap(), 1);

        let events = sink.take();
        assert!(matches!(
            events.as_slice(),
            [Event::TokenMinted { price_native: 1_000, platform_fee: 25, royalty: 25, .. }]
        ));
    }

    #[test]
    fn supply_exhausts_to_sold_out() {
        let (market, _) = setup("sold_out");
        let creator = addr(1);
        let buyer = addr(2);
        fund(&market, creator, 1_000);
        fund(&market, buyer, 10_000);
        set_feed_answer(&market, 1_000_000_000);

        let id = market
            .create_token(creator, 2, "ipfs://m", 1_000_000, 0, DEFAULT_CREATION_FEE)
            .unwrap();
        market.mint(id, buyer, 1_000).unwrap();
        market.mint(id, buyer, 1_000).unwrap();
        assert_eq!(market.holding(id, &buyer).unwrap(), 2);

        assert!(matches!(
            market.mint(id, buyer, 1_000).unwrap_err(),
            ArbiterError::SoldOut(_)
        ));
    }

    #[test]
    fn paused_rejects_create_and_mint() {
        let (market, _) = setup("paused");
        let creator = addr(1);
        fund(&market, creator, 1_000);
        let id = dollar_token(&market, creator);
        set_feed_answer(&market, 1_000_000_000);

        market.set_paused(true).unwrap();
        assert!(matches!(
            market.create_token(creator, 1, "ipfs://m", 1, 0, DEFAULT_CREATION_FEE),
            Err(ArbiterError::Paused)
        ));
        assert!(matches!(
            market.mint(id, addr(2), 1_000).unwrap_err(),
            ArbiterError::Paused
        ));

        market.set_paused(false).unwrap();
        fund(&market, addr(2), 1_000);
        assert!(market.mint(id, addr(2), 1_000).is_ok());
    }

    #[test]
    fn unknown_token_is_an_error() {
        let (market, _) = setup("unknown");
        assert!(matches!(
            market.get_token(9).unwrap_err(),
            ArbiterError::TokenNotFound(9)
        ));
        assert!(matches!(
            market.mint(9, addr(2), 1).unwrap_err(),
            ArbiterError::TokenNotFound(9)
        ));
    }
}
