use thiserror::Error;

/// Error taxonomy for the arbiter contracts.
///
/// Precondition and resource violations are rejected synchronously, before
/// any fund movement. "Not yet ready" oracle states are deliberately NOT
/// errors — they surface as typed no-op outcomes so polling callers can
/// retry freely. Decode errors are distinct from "unavailable" so a caller
/// does not retry forever on a permanently malformed result.
#[derive(Debug, Error)]
pub enum ArbiterError {
    // ── Fund / ledger errors ─────────────────────────────────────────────────
    #[error("insufficient balance: need {need} units, have {have}")]
    InsufficientBalance { need: u128, have: u128 },

    #[error("insufficient allowance: need {need} units, approved {approved}")]
    InsufficientAllowance { need: u128, approved: u128 },

    #[error("attached value mismatch: prize is {expected} units, attached {attached}")]
    AttachedValueMismatch { expected: u128, attached: u128 },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("unknown account: {0}")]
    UnknownAccount(String),

    // ── Challenge errors ─────────────────────────────────────────────────────
    #[error("challenge not found: {0}")]
    ChallengeNotFound(u64),

    #[error("challenge {0} is no longer active")]
    ChallengeInactive(u64),

    #[error("challenge {id} has ended (end time {end_time})")]
    ChallengeEnded { id: u64, end_time: i64 },

    #[error("duration must be greater than zero")]
    ZeroDuration,

    #[error("challenge statement URL must not be empty")]
    EmptyStatementUrl,

    #[error("submission index {index} out of range ({count} submissions)")]
    SubmissionOutOfRange { index: u32, count: u32 },

    #[error("address {0} has already voted on this challenge")]
    AlreadyVoted(String),

    #[error("voting for your own submission is not allowed")]
    SelfVote,

    // ── Marketplace errors ───────────────────────────────────────────────────
    #[error("token not found: {0}")]
    TokenNotFound(u64),

    #[error("token {0} is sold out")]
    SoldOut(u64),

    #[error("royalty {bps} bps exceeds the {max} bps cap")]
    RoyaltyTooHigh { bps: u16, max: u16 },

    #[error("no valid price available; run a price update first")]
    NoValidPrice,

    #[error("token URI must not be empty")]
    EmptyTokenUri,

    #[error("supply must be greater than zero")]
    ZeroSupply,

    // ── Oracle errors ────────────────────────────────────────────────────────
    #[error("result unavailable for request {0} (no consensus or unknown id)")]
    ResultUnavailable(String),

    #[error("malformed price payload: {0}")]
    MalformedPrice(String),

    #[error("prompt result is empty")]
    NoPromptAvailable,

    #[error("result is not valid UTF-8")]
    InvalidUtf8,

    #[error("malformed transaction-verification payload: {0}")]
    MalformedTxPayload(String),

    // ── Pause gate ───────────────────────────────────────────────────────────
    #[error("operations are paused")]
    Paused,

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl ArbiterError {
    /// True for decode/format failures — permanently bad data that retrying
    /// will never fix, as opposed to `ResultUnavailable`.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            ArbiterError::MalformedPrice(_)
                | ArbiterError::NoPromptAvailable
                | ArbiterError::InvalidUtf8
                | ArbiterError::MalformedTxPayload(_)
        )
    }
}
