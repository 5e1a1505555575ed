use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::challenge::PrizeType;
use crate::request::{RequestKind, TxVerdict};
use crate::types::{Address, Balance, ChallengeId, RequestId, SubmissionIndex, Timestamp, TokenId};

// ── Event ────────────────────────────────────────────────────────────────────

/// Typed outbound notification emitted synchronously with each state
/// transition, consumable by external observers without affecting core
/// logic. The on-chain analogue is an event log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    RequestSubmitted {
        kind: RequestKind,
        request_id: RequestId,
        submitted_at: Timestamp,
    },
    PriceApplied {
        request_id: RequestId,
        price: Balance,
        updated_at: Timestamp,
    },
    PromptStored {
        request_id: RequestId,
    },
    TxVerificationRecorded {
        request_id: RequestId,
        verdict: TxVerdict,
    },
    ChallengeCreated {
        challenge_id: ChallengeId,
        creator: Address,
        ipfs_url: String,
        duration: i64,
        prize_amount: Balance,
        prize_type: PrizeType,
    },
    SolutionSubmitted {
        challenge_id: ChallengeId,
        index: SubmissionIndex,
        submitter: Address,
        ipfs_hash: String,
    },
    VoteCast {
        challenge_id: ChallengeId,
        index: SubmissionIndex,
        voter: Address,
    },
    WinnerDetermined {
        challenge_id: ChallengeId,
        winner: Address,
        prize_amount: Balance,
        prize_type: PrizeType,
    },
    PrizeRefunded {
        challenge_id: ChallengeId,
        creator: Address,
        prize_amount: Balance,
        prize_type: PrizeType,
    },
    TokenCreated {
        token_id: TokenId,
        creator: Address,
        supply: u64,
        price_usd: Balance,
        royalty_bps: u16,
    },
    TokenMinted {
        token_id: TokenId,
        buyer: Address,
        creator: Address,
        /// Total paid by the buyer, in native units.
        price_native: Balance,
        platform_fee: Balance,
        royalty: Balance,
    },
}

// ── EventSink ────────────────────────────────────────────────────────────────

/// Receives events as transitions are applied. Implementations must not
/// influence core logic — a sink that fails has no way to veto a transition.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Discards every event. Default for callers that only care about state.
#[derive(Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: Event) {}
}

/// Buffers events for later draining. Used by tests and by observers that
/// poll rather than subscribe.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain and return all buffered events in emission order.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut self.events.lock().expect("event buffer poisoned"))
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("event buffer poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: Event) {
        self.events.lock().expect("event buffer poisoned").push(event);
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_preserves_order() {
        let sink = RecordingSink::new();
        sink.emit(Event::PromptStored { request_id: RequestId::from_bytes([1u8; 32]) });
        sink.emit(Event::PromptStored { request_id: RequestId::from_bytes([2u8; 32]) });

        let events = sink.take();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            Event::PromptStored { request_id } if request_id == RequestId::from_bytes([1u8; 32])
        ));
        assert!(sink.is_empty());
    }
}
