use std::sync::Arc;

use arbiter_core::error::ArbiterError;
use arbiter_core::event::{Event, EventSink};
use arbiter_core::feed::PriceFeedState;
use arbiter_core::request::RequestKind;
use arbiter_core::types::{Balance, RequestId, Timestamp};
use arbiter_oracle::decode::{decode, DomainValue};
use arbiter_oracle::gateway::ProverGateway;
use arbiter_oracle::seams::{DataProver, RequestSubmitter};
use arbiter_oracle::tracker::RequestTracker;
use arbiter_store::StateDb;
use tracing::{info, warn};

/// Outcome of a trigger attempt. "Not due yet" is the normal state for a
/// polling keeper, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriggerOutcome {
    Submitted(RequestId),
    NotDue,
}

/// Outcome of an apply attempt. Everything but `Applied` is a harmless
/// no-op that leaves prior feed state untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied(Balance),
    /// No price request has ever been submitted.
    NoRequest,
    /// Consensus not reached yet; stay pending and retry later.
    AwaitingConsensus,
    /// Decoded cleanly to zero — a valid decode, but not a usable price.
    ZeroPrice,
    /// The latest request's price was installed earlier.
    AlreadyApplied,
}

/// The automated price feed.
///
/// State machine per request: `Idle → RequestPending → Resolvable → Applied`,
/// looping back to idle when the next trigger fires. The feed never reverts
/// on "not ready yet" — unavailable results, zero prices, and the pause flag
/// all degrade to no-ops.
pub struct PriceFeed {
    db: Arc<StateDb>,
    tracker: RequestTracker,
    gateway: ProverGateway,
    sink: Arc<dyn EventSink>,
    /// Network-side payload identifying the price pair to fetch.
    pair: String,
}

impl PriceFeed {
    pub fn new(
        db: Arc<StateDb>,
        submitter: Arc<dyn RequestSubmitter>,
        prover: Arc<dyn DataProver>,
        sink: Arc<dyn EventSink>,
        pair: impl Into<String>,
    ) -> Self {
        let tracker = RequestTracker::new(db.clone(), submitter, sink.clone());
        let gateway = ProverGateway::new(prover);
        Self { db, tracker, gateway, sink, pair: pair.into() }
    }

    // ── Admin toggles ────────────────────────────────────────────────────────

    pub fn set_paused(&self, paused: bool) -> Result<(), ArbiterError> {
        let mut state = self.db.get_feed_state()?;
        state.paused = paused;
        self.db.put_feed_state(&state)
    }

    pub fn set_automation_enabled(&self, enabled: bool) -> Result<(), ArbiterError> {
        let mut state = self.db.get_feed_state()?;
        state.automation_enabled = enabled;
        self.db.put_feed_state(&state)
    }

    pub fn set_interval(&self, interval_secs: i64) -> Result<(), ArbiterError> {
        let mut state = self.db.get_feed_state()?;
        state.interval_secs = interval_secs;
        self.db.put_feed_state(&state)
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn state(&self) -> Result<PriceFeedState, ArbiterError> {
        self.db.get_feed_state()
    }

    /// Fixed-point price scaled by 1e6; 0 means no valid price yet.
    pub fn latest_answer(&self) -> Result<Balance, ArbiterError> {
        Ok(self.db.get_feed_state()?.latest_answer)
    }

    pub fn latest_request_id(&self) -> Result<RequestId, ArbiterError> {
        self.tracker.latest(RequestKind::PriceUpdate)
    }

    pub fn check_eligible(&self, now: Timestamp) -> Result<bool, ArbiterError> {
        Ok(self.db.get_feed_state()?.check_eligible(now))
    }

    // ── Automation ───────────────────────────────────────────────────────────

    /// Submit a new price request if the interval has elapsed and both gates
    /// are open. Ineligibility silently returns `NotDue`.
    pub fn trigger(&self, now: Timestamp) -> Result<TriggerOutcome, ArbiterError> {
        let mut state = self.db.get_feed_state()?;
        if !state.check_eligible(now) {
            return Ok(TriggerOutcome::NotDue);
        }

        let id = self
            .tracker
            .submit(RequestKind::PriceUpdate, self.pair.as_bytes(), now)?;
        state.last_automation_check = now;
        self.db.put_feed_state(&state)?;
        Ok(TriggerOutcome::Submitted(id))
    }

    /// Install the latest request's price if the network has resolved it.
    /// Applies each request at most once; a zero decode leaves the previous
    /// answer in place until a usable value arrives.
    pub fn apply(&self, now: Timestamp) -> Result<ApplyOutcome, ArbiterError> {
        let id = self.tracker.latest(RequestKind::PriceUpdate)?;
        if id.is_zero() {
            return Ok(ApplyOutcome::NoRequest);
        }
        let Some(request) = self.tracker.get(&id)? else {
            return Ok(ApplyOutcome::NoRequest);
        };
        if request.applied {
            return Ok(ApplyOutcome::AlreadyApplied);
        }

        let bytes = match self.gateway.raw_result(&id) {
            Ok(bytes) => bytes,
            Err(ArbiterError::ResultUnavailable(_)) => return Ok(ApplyOutcome::AwaitingConsensus),
            Err(e) => return Err(e),
        };

        let DomainValue::Price(price) = decode(RequestKind::PriceUpdate, &bytes)? else {
            unreachable!("decoder returns Price for PriceUpdate");
        };
        if price == 0 {
            warn!(request_id = %id, "price resolved to zero; keeping previous answer");
            return Ok(ApplyOutcome::ZeroPrice);
        }

        let mut state = self.db.get_feed_state()?;
        state.latest_answer = price;
        state.last_update_time = now;
        self.db.put_feed_state(&state)?;
        self.tracker.mark_applied(&id)?;

        info!(request_id = %id, price, updated_at = now, "price applied");
        self.sink.emit(Event::PriceApplied { request_id: id, price, updated_at: now });
        Ok(ApplyOutcome::Applied(price))
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_core::event::RecordingSink;
    use arbiter_oracle::testing::MockOracleNetwork;

    fn setup(name: &str) -> (PriceFeed, Arc<MockOracleNetwork>, Arc<RecordingSink>) {
        let dir = std::env::temp_dir().join(format!("arbiter_feed_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        let db = Arc::new(StateDb::open(&dir).expect("open temp db"));
        let network = Arc::new(MockOracleNetwork::new());
        let sink = Arc::new(RecordingSink::new());
        let feed = PriceFeed::new(db, network.clone(), network.clone(), sink.clone(), "eth-usdc");
        (feed, network, sink)
    }

    fn price_word(value: u128) -> Vec<u8> {
        let mut word = [0u8; 32];
        word[16..].copy_from_slice(&value.to_be_bytes());
        word.to_vec()
    }

    const T0: i64 = 1_700_000_000;

    #[test]
    fn trigger_twice_within_interval_submits_once() {
        let (feed, network, _) = setup("gating");

        // Fresh state: last check 0, so the first trigger is due.
        assert!(matches!(feed.trigger(T0).unwrap(), TriggerOutcome::Submitted(_)));
        assert_eq!(feed.trigger(T0 + 10).unwrap(), TriggerOutcome::NotDue);
        assert_eq!(network.submission_count(), 1);

        // After the interval, a second request goes out.
        let interval = feed.state().unwrap().interval_secs;
        assert!(matches!(
            feed.trigger(T0 + interval).unwrap(),
            TriggerOutcome::Submitted(_)
        ));
        assert_eq!(network.submission_count(), 2);
    }

    #[test]
    fn paused_and_disabled_suppress_triggers() {
        let (feed, network, _) = setup("toggles");

        feed.set_paused(true).unwrap();
        assert_eq!(feed.trigger(T0).unwrap(), TriggerOutcome::NotDue);
        feed.set_paused(false).unwrap();

        feed.set_automation_enabled(false).unwrap();
        assert_eq!(feed.trigger(T0).unwrap(), TriggerOutcome::NotDue);
        feed.set_automation_enabled(true).unwrap();

        assert!(matches!(feed.trigger(T0).unwrap(), TriggerOutcome::Submitted(_)));
        assert_eq!(network.submission_count(), 1);
    }

    #[test]
    fn apply_is_idempotent_per_request() {
        let (feed, network, sink) = setup("idempotent");

        let TriggerOutcome::Submitted(id) = feed.trigger(T0).unwrap() else {
            panic!("expected submission");
        };
        assert_eq!(feed.apply(T0 + 30).unwrap(), ApplyOutcome::AwaitingConsensus);

        network.resolve(&id, true, price_word(2_431_170_000));
        assert_eq!(feed.apply(T0 + 60).unwrap(), ApplyOutcome::Applied(2_431_170_000));
        assert_eq!(feed.latest_answer().unwrap(), 2_431_170_000);
        assert_eq!(feed.state().unwrap().last_update_time, T0 + 60);

        // Second apply after a single resolved request is a no-op.
        assert_eq!(feed.apply(T0 + 90).unwrap(), ApplyOutcome::AlreadyApplied);
        assert_eq!(feed.state().unwrap().last_update_time, T0 + 60);

        let applied_events = sink
            .take()
            .into_iter()
            .filter(|e| matches!(e, Event::PriceApplied { .. }))
            .count();
        assert_eq!(applied_events, 1);
    }

    #[test]
    fn zero_price_leaves_prior_state_untouched() {
        let (feed, network, _) = setup("zero_price");

        let TriggerOutcome::Submitted(first) = feed.trigger(T0).unwrap() else {
            panic!("expected submission");
        };
        network.resolve(&first, true, price_word(1_850_000_000));
        feed.apply(T0 + 60).unwrap();

        let interval = feed.state().unwrap().interval_secs;
        let TriggerOutcome::Submitted(second) = feed.trigger(T0 + interval).unwrap() else {
            panic!("expected submission");
        };
        network.resolve(&second, true, price_word(0));

        assert_eq!(feed.apply(T0 + interval + 60).unwrap(), ApplyOutcome::ZeroPrice);
        // Previous answer and its timestamp survive.
        assert_eq!(feed.latest_answer().unwrap(), 1_850_000_000);
        assert_eq!(feed.state().unwrap().last_update_time, T0 + 60);

        // A usable value can still arrive for the same request later.
        network.resolve(&second, true, price_word(1_900_000_000));
        assert_eq!(
            feed.apply(T0 + interval + 120).unwrap(),
            ApplyOutcome::Applied(1_900_000_000)
        );
    }

    #[test]
    fn apply_without_any_request_is_a_noop() {
        let (feed, _, _) = setup("no_request");
        assert_eq!(feed.apply(T0).unwrap(), ApplyOutcome::NoRequest);
        assert_eq!(feed.latest_answer().unwrap(), 0);
        assert!(feed.latest_request_id().unwrap().is_zero());
    }

    #[test]
    fn last_update_time_distinct_from_last_check() {
        let (feed, network, _) = setup("timestamps");

        let TriggerOutcome::Submitted(id) = feed.trigger(T0).unwrap() else {
            panic!("expected submission");
        };
        let state = feed.state().unwrap();
        assert_eq!(state.last_automation_check, T0);
        assert_eq!(state.last_update_time, 0);

        network.resolve(&id, true, price_word(2_000_000_000));
        feed.apply(T0 + 45).unwrap();
        let state = feed.state().unwrap();
        assert_eq!(state.last_automation_check, T0);
        assert_eq!(state.last_update_time, T0 + 45);
    }
}
