use serde::{Deserialize, Serialize};

use crate::types::{RequestId, Timestamp};

// ── RequestKind ──────────────────────────────────────────────────────────────

/// The three oracle operations a consumer may correlate on. Exactly one
/// *latest* request is tracked per kind; a newer submission supersedes an
/// older unresolved one, which is then treated as abandoned, not failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    PriceUpdate,
    PromptGeneration,
    TxVerification,
}

impl RequestKind {
    /// Stable one-byte key used by the store's latest-per-kind table.
    pub fn key(&self) -> u8 {
        match self {
            RequestKind::PriceUpdate => 0,
            RequestKind::PromptGeneration => 1,
            RequestKind::TxVerification => 2,
        }
    }
}

// ── OracleRequest ────────────────────────────────────────────────────────────

/// A pending or resolved oracle operation as stored in the state DB.
///
/// The id is assigned by the external network at submission time and captured
/// from the submission call's return value. `applied` guards the at-most-once
/// application invariant: a second attempt to apply an already-applied
/// request is a no-op, never a double-apply.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OracleRequest {
    pub id: RequestId,
    pub kind: RequestKind,
    pub submitted_at: Timestamp,
    pub applied: bool,
}

impl OracleRequest {
    pub fn new(id: RequestId, kind: RequestKind, submitted_at: Timestamp) -> Self {
        Self { id, kind, submitted_at, applied: false }
    }
}

// ── TxVerdict ────────────────────────────────────────────────────────────────

/// Classification of a transaction-verification result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxVerdict {
    Successful,
    Failed,
    Unknown,
}

// ── Applied results ──────────────────────────────────────────────────────────

/// The most recent prompt applied from a resolved PromptGeneration request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromptRecord {
    pub request_id: RequestId,
    pub text: String,
}

/// The most recent outcome applied from a resolved TxVerification request.
/// `raw` keeps the original result text for display by outer layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxVerificationRecord {
    pub request_id: RequestId,
    pub verdict: TxVerdict,
    pub raw: String,
}
