use std::sync::Arc;

use arbiter_core::error::ArbiterError;
use arbiter_core::event::{Event, EventSink};
use arbiter_core::request::{PromptRecord, RequestKind, TxVerificationRecord};
use arbiter_core::types::{RequestId, Timestamp};
use arbiter_store::StateDb;
use tracing::info;

use crate::decode::{decode, DomainValue};
use crate::gateway::ProverGateway;
use crate::seams::{DataProver, RequestSubmitter};
use crate::tracker::RequestTracker;

const PAUSED_KEY: &str = "oracle_client_paused";

/// Outcome of a resolution attempt. None of these are errors: "not ready
/// yet" states degrade to harmless no-ops so polling callers retry freely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Result decoded and stored; observers notified.
    Applied,
    /// This request's result was applied earlier; nothing changed.
    AlreadyApplied,
    /// The prover has no consensus result yet. Retry later.
    AwaitingConsensus,
    /// Nothing was ever submitted for this kind.
    NoRequest,
}

/// Prompt-generation and transaction-verification flows over the oracle.
///
/// Requests go out through the `RequestTracker`; resolutions gate on the
/// prover, decode, store the latest value, and mark the request applied so a
/// second resolve of the same request is a no-op.
pub struct OracleClient {
    db: Arc<StateDb>,
    tracker: RequestTracker,
    gateway: ProverGateway,
    sink: Arc<dyn EventSink>,
}

impl OracleClient {
    pub fn new(
        db: Arc<StateDb>,
        submitter: Arc<dyn RequestSubmitter>,
        prover: Arc<dyn DataProver>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let tracker = RequestTracker::new(db.clone(), submitter, sink.clone());
        let gateway = ProverGateway::new(prover);
        Self { db, tracker, gateway, sink }
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

    // ── Requests ─────────────────────────────────────────────────────────────

    pub fn request_prompt(&self, payload: &[u8], now: Timestamp) -> Result<RequestId, ArbiterError> {
        self.ensure_not_paused()?;
        self.tracker.submit(RequestKind::PromptGeneration, payload, now)
    }

    /// Input is formatted `"<chainId>-<txHash>"`, the shape the network's
    /// verification program expects.
    pub fn request_tx_verification(
        &self,
        chain_id: u64,
        tx_hash: &str,
        now: Timestamp,
    ) -> Result<RequestId, ArbiterError> {
        self.ensure_not_paused()?;
        let input = format!("{chain_id}-{tx_hash}");
        self.tracker.submit(RequestKind::TxVerification, input.as_bytes(), now)
    }

    // ── Resolutions ──────────────────────────────────────────────────────────

    pub fn resolve_prompt(&self) -> Result<Resolution, ArbiterError> {
        let (request, bytes) = match self.pending_result(RequestKind::PromptGeneration)? {
            Ok(ready) => ready,
            Err(outcome) => return Ok(outcome),
        };

        let DomainValue::Prompt(text) = decode(RequestKind::PromptGeneration, &bytes)? else {
            unreachable!("decoder returns Prompt for PromptGeneration");
        };

        self.db.put_latest_prompt(&PromptRecord { request_id: request.id, text })?;
        self.tracker.mark_applied(&request.id)?;
        info!(request_id = %request.id, "prompt stored");
        self.sink.emit(Event::PromptStored { request_id: request.id });
        Ok(Resolution::Applied)
    }

    pub fn resolve_tx_verification(&self) -> Result<Resolution, ArbiterError> {
        let (request, bytes) = match self.pending_result(RequestKind::TxVerification)? {
            Ok(ready) => ready,
            Err(outcome) => return Ok(outcome),
        };

        let DomainValue::TxOutcome(outcome) = decode(RequestKind::TxVerification, &bytes)? else {
            unreachable!("decoder returns TxOutcome for TxVerification");
        };

        let record = TxVerificationRecord {
            request_id: request.id,
            verdict: outcome.verdict,
            raw: outcome.raw,
        };
        self.db.put_latest_tx_result(&record)?;
        self.tracker.mark_applied(&request.id)?;
        info!(request_id = %request.id, verdict = ?record.verdict, "tx verification recorded");
        self.sink.emit(Event::TxVerificationRecorded {
            request_id: request.id,
            verdict: record.verdict,
        });
        Ok(Resolution::Applied)
    }

    /// Shared gate: latest request for `kind`, short-circuiting into a no-op
    /// `Resolution` when there is nothing to do yet. Decode errors are NOT
    /// absorbed here — a permanently malformed result must surface as an
    /// error, distinct from "retry later".
    #[allow(clippy::type_complexity)]
    fn pending_result(
        &self,
        kind: RequestKind,
    ) -> Result<Result<(arbiter_core::request::OracleRequest, Vec<u8>), Resolution>, ArbiterError>
    {
        let id = self.tracker.latest(kind)?;
        if id.is_zero() {
            return Ok(Err(Resolution::NoRequest));
        }
        let Some(request) = self.tracker.get(&id)? else {
            return Ok(Err(Resolution::NoRequest));
        };
        if request.applied {
            return Ok(Err(Resolution::AlreadyApplied));
        }
        match self.gateway.raw_result(&id) {
            Ok(bytes) => Ok(Ok((request, bytes))),
            Err(ArbiterError::ResultUnavailable(_)) => Ok(Err(Resolution::AwaitingConsensus)),
            Err(e) => Err(e),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// The most recent applied prompt, if any request has resolved yet.
    pub fn latest_prompt(&self) -> Result<Option<PromptRecord>, ArbiterError> {
        self.db.get_latest_prompt()
    }

    pub fn latest_tx_result(&self) -> Result<Option<TxVerificationRecord>, ArbiterError> {
        self.db.get_latest_tx_result()
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
