use std::sync::Arc;

use arbiter_core::error::ArbiterError;
use arbiter_core::event::{Event, EventSink};
use arbiter_core::request::{OracleRequest, RequestKind};
use arbiter_core::types::{RequestId, Timestamp};
use arbiter_store::StateDb;
use tracing::info;

use crate::seams::RequestSubmitter;

/// Keyed table from operation kind to the pending oracle request.
///
/// A newer submission of the same kind supersedes the older unresolved one:
/// callers treat superseded requests as abandoned, not failed. Older requests
/// stay queryable by id but are never retried automatically. The table is an
/// explicit kind-keyed mapping (not a singleton) so multiple independent feed
/// instances can share one store without code duplication.
pub struct RequestTracker {
    db: Arc<StateDb>,
    submitter: Arc<dyn RequestSubmitter>,
    sink: Arc<dyn EventSink>,
}

impl RequestTracker {
    pub fn new(
        db: Arc<StateDb>,
        submitter: Arc<dyn RequestSubmitter>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self { db, submitter, sink }
    }

    /// Forward `payload` to the network, record the assigned id as the
    /// latest for `kind`, and notify observers.
    pub fn submit(
        &self,
        kind: RequestKind,
        payload: &[u8],
        now: Timestamp,
    ) -> Result<RequestId, ArbiterError> {
        let id = self.submitter.submit(kind, payload)?;

        let request = OracleRequest::new(id, kind, now);
        self.db.put_request(&request)?;
        self.db.set_latest_request_id(kind, &id)?;

        info!(request_id = %id, ?kind, submitted_at = now, "oracle request submitted");
        self.sink.emit(Event::RequestSubmitted {
            kind,
            request_id: id,
            submitted_at: now,
        });
        Ok(id)
    }

    /// The most recent request id for `kind`; the zero sentinel if nothing
    /// was ever submitted.
    pub fn latest(&self, kind: RequestKind) -> Result<RequestId, ArbiterError> {
        self.db.latest_request_id(kind)
    }

    /// Any recorded request by id, latest or superseded.
    pub fn get(&self, id: &RequestId) -> Result<Option<OracleRequest>, ArbiterError> {
        self.db.get_request(id)
    }

    /// Mark a request as applied, pinning the at-most-once invariant.
    pub fn mark_applied(&self, id: &RequestId) -> Result<(), ArbiterError> {
        if let Some(mut request) = self.db.get_request(id)? {
            request.applied = true;
            self.db.put_request(&request)?;
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockOracleNetwork;
    use arbiter_core::event::RecordingSink;

    fn temp_db(name: &str) -> Arc<StateDb> {
        let dir = std::env::temp_dir().join(format!("arbiter_tracker_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        Arc::new(StateDb::open(&dir).expect("open temp db"))
    }

    #[test]
    fn submit_records_latest_and_emits() {
        let db = temp_db("submit");
        let network = Arc::new(MockOracleNetwork::new());
        let sink = Arc::new(RecordingSink::new());
        let tracker = RequestTracker::new(db, network, sink.clone());

        let id = tracker.submit(RequestKind::PriceUpdate, b"eth-usdc", 1_000).unwrap();
        assert_eq!(tracker.latest(RequestKind::PriceUpdate).unwrap(), id);

        let recorded = tracker.get(&id).unwrap().unwrap();
        assert_eq!(recorded.kind, RequestKind::PriceUpdate);
        assert_eq!(recorded.submitted_at, 1_000);
        assert!(!recorded.applied);

        let events = sink.take();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Event::RequestSubmitted { kind: RequestKind::PriceUpdate, request_id, submitted_at: 1_000 }
                if request_id == id
        ));
    }

    #[test]
    fn newer_request_supersedes_but_old_stays_queryable() {
        let db = temp_db("supersede");
        let network = Arc::new(MockOracleNetwork::new());
        let tracker = RequestTracker::new(db, network, Arc::new(RecordingSink::new()));

        let first = tracker.submit(RequestKind::PromptGeneration, b"haiku", 1_000).unwrap();
        let second = tracker.submit(RequestKind::PromptGeneration, b"sonnet", 2_000).unwrap();

        assert_ne!(first, second);
        assert_eq!(tracker.latest(RequestKind::PromptGeneration).unwrap(), second);
        // Superseded request is abandoned, not erased.
        assert!(tracker.get(&first).unwrap().is_some());
    }

    #[test]
    fn kinds_do_not_interfere() {
        let db = temp_db("kinds");
        let network = Arc::new(MockOracleNetwork::new());
        let tracker = RequestTracker::new(db, network, Arc::new(RecordingSink::new()));

        let price = tracker.submit(RequestKind::PriceUpdate, b"eth-usdc", 1_000).unwrap();
        let tx = tracker.submit(RequestKind::TxVerification, b"84532-0xabc", 1_000).unwrap();

        assert_eq!(tracker.latest(RequestKind::PriceUpdate).unwrap(), price);
        assert_eq!(tracker.latest(RequestKind::TxVerification).unwrap(), tx);
        assert!(tracker.latest(RequestKind::PromptGeneration).unwrap().is_zero());
    }
}
