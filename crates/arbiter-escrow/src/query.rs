use arbiter_core::challenge::{Challenge, ChallengeStatus, PrizeType, Submission};
use arbiter_core::error::ArbiterError;
use arbiter_core::types::{Address, Balance, ChallengeId, Timestamp};

use crate::engine::ChallengeEscrow;

/// Flat read-model of one challenge, with the time-derived fields resolved
/// against the caller's clock.
#[derive(Clone, Debug, PartialEq)]
pub struct ChallengeDetails {
    pub id: ChallengeId,
    pub creator: Address,
    pub ipfs_url: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub prize_amount: Balance,
    pub prize_type: PrizeType,
    pub is_active: bool,
    /// Zero address while undetermined or when the prize was refunded.
    pub winner: Address,
    pub submission_count: u32,
}

impl ChallengeDetails {
    fn from_challenge(c: &Challenge) -> Self {
        Self {
            id: c.id,
            creator: c.creator,
            ipfs_url: c.ipfs_url.clone(),
            start_time: c.start_time,
            end_time: c.end_time(),
            prize_amount: c.prize_amount,
            prize_type: c.prize_type,
            is_active: c.is_active(),
            winner: c.winner(),
            submission_count: c.submissions.len() as u32,
        }
    }
}

/// Query helpers for challenges.
///
/// Settlement is lazy: each read first runs the settle transition for the
/// challenges it touches, so a past-deadline challenge is paid out and
/// reported as completed on first observation rather than by a background
/// job.
pub struct ChallengeQuery<'a> {
    escrow: &'a ChallengeEscrow,
}

impl<'a> ChallengeQuery<'a> {
    pub fn new(escrow: &'a ChallengeEscrow) -> Self {
        Self { escrow }
    }

    /// Fetch a single challenge, settling it first if its deadline passed.
    pub fn details(&self, id: ChallengeId, now: Timestamp) -> Result<ChallengeDetails, ArbiterError> {
        self.escrow.settle(id, now)?;
        let c = self
            .escrow
            .get(id)?
            .ok_or(ArbiterError::ChallengeNotFound(id))?;
        Ok(ChallengeDetails::from_challenge(&c))
    }

    /// All submissions in insertion order (the voting index order).
    pub fn submissions(&self, id: ChallengeId, now: Timestamp) -> Result<Vec<Submission>, ArbiterError> {
        self.escrow.settle(id, now)?;
        let c = self
            .escrow
            .get(id)?
            .ok_or(ArbiterError::ChallengeNotFound(id))?;
        Ok(c.submissions)
    }

    /// Whether `voter` has already voted on `id`. Settles first like every
    /// other read, so observation order never matters to a caller.
    pub fn has_voted(
        &self,
        id: ChallengeId,
        voter: &Address,
        now: Timestamp,
    ) -> Result<bool, ArbiterError> {
        self.escrow.settle(id, now)?;
        self.escrow.db().has_voted(id, voter)
    }

    /// Seconds until the submission window closes, zero once it has.
    pub fn time_remaining(&self, id: ChallengeId, now: Timestamp) -> Result<i64, ArbiterError> {
        self.escrow.settle(id, now)?;
        let c = self
            .escrow
            .get(id)?
            .ok_or(ArbiterError::ChallengeNotFound(id))?;
        Ok((c.end_time() - now).max(0))
    }

    /// Challenges whose window is still open, after settling any that ended.
    pub fn active_challenges(&self, now: Timestamp) -> Result<Vec<ChallengeDetails>, ArbiterError> {
        self.settled_snapshot(now, |c| c.is_active())
    }

    /// Challenges that have been settled (winner paid or prize refunded).
    pub fn completed_challenges(&self, now: Timestamp) -> Result<Vec<ChallengeDetails>, ArbiterError> {
        self.settled_snapshot(now, |c| !c.is_active())
    }

    fn settled_snapshot(
        &self,
        now: Timestamp,
        keep: impl Fn(&Challenge) -> bool,
    ) -> Result<Vec<ChallengeDetails>, ArbiterError> {
        for c in self.escrow.db().iter_challenges()? {
            if c.is_active() && c.has_ended(now) {
                self.escrow.settle(c.id, now)?;
            }
        }
        let mut out = Vec::new();
        for c in self.escrow.db().iter_challenges()? {
            if keep(&c) {
                out.push(ChallengeDetails::from_challenge(&c));
            }
        }
        Ok(out)
    }

    /// Human-readable summary of a challenge's state.
    pub fn describe(&self, id: ChallengeId, now: Timestamp) -> Result<String, ArbiterError> {
        self.escrow.settle(id, now)?;
        let c = self
            .escrow
            .get(id)?
            .ok_or(ArbiterError::ChallengeNotFound(id))?;

        let status_str = match &c.status {
            ChallengeStatus::Active => {
                let secs_remaining = c.end_time() - now;
                format!(
                    "Active — {} submissions, closes in {}s",
                    c.submissions.len(),
                    secs_remaining.max(0)
                )
            }
            ChallengeStatus::Completed { settled_at, winner } if winner.is_zero() => {
                format!("Completed at {} — no submissions, prize refunded", settled_at)
            }
            ChallengeStatus::Completed { settled_at, winner } => {
                format!("Completed at {} — winner {}", settled_at, winner)
            }
        };

        let asset = match c.prize_type {
            PrizeType::Native => "native",
            PrizeType::StableToken => "stable",
        };
        Ok(format!(
            "Challenge {} | prize {} ({}) | creator {} | {}",
            c.id, c.prize_amount, asset, c.creator, status_str
        ))
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
