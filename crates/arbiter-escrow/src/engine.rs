use std::sync::Arc;

use arbiter_core::challenge::{Challenge, ChallengeStatus, PrizeType, Submission};
use arbiter_core::error::ArbiterError;
use arbiter_core::event::{Event, EventSink};
use arbiter_core::types::{Address, Balance, ChallengeId, SubmissionIndex, Timestamp};
use arbiter_store::{NativeLedger, StableToken, StateDb};
use tracing::info;

/// Outcome of a settlement attempt. Settlement is derived from time, so an
/// early or repeated call is a normal no-op, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettleOutcome {
    /// The deadline has not passed; the challenge is still accepting
    /// submissions and votes.
    StillRunning,
    /// Settled by an earlier observation; stored values are final.
    AlreadyCompleted,
    /// Prize paid to the winning submitter.
    WinnerPaid(Address),
    /// No submissions arrived; the prize went back to the creator.
    Refunded,
}

/// The challenge escrow engine.
///
/// Every mutating operation is an atomic, serialized transition: all
/// preconditions are checked before any fund movement or state write, so a
/// rejected call leaves nothing partially applied. Escrowed funds sit in the
/// engine's own account and leave it only through `settle`.
pub struct ChallengeEscrow {
    db: Arc<StateDb>,
    sink: Arc<dyn EventSink>,
    escrow_account: Address,
}

impl ChallengeEscrow {
    pub fn new(db: Arc<StateDb>, sink: Arc<dyn EventSink>, escrow_account: Address) -> Self {
        Self { db, sink, escrow_account }
    }

    pub fn db(&self) -> &StateDb {
        &self.db
    }

    pub fn escrow_account(&self) -> Address {
        self.escrow_account
    }

    // ── create ───────────────────────────────────────────────────────────────

    /// Create a challenge and lock its prize atomically.
    ///
    /// `attached_value` models the native currency sent along with the call:
    /// it must equal the prize for native prizes and must be zero for token
    /// prizes, which are instead pulled through the creator's pre-approved
    /// allowance.
    pub fn create_challenge(
        &self,
        creator: Address,
        ipfs_url: &str,
        duration: i64,
        prize_amount: Balance,
        prize_type: PrizeType,
        attached_value: Balance,
        now: Timestamp,
    ) -> Result<ChallengeId, ArbiterError> {
        if ipfs_url.is_empty() {
            return Err(ArbiterError::EmptyStatementUrl);
        }
        if duration <= 0 {
            return Err(ArbiterError::ZeroDuration);
        }
        if prize_amount == 0 {
            return Err(ArbiterError::ZeroAmount);
        }

        // Escrow the prize before anything else is written; the ledgers
        // validate funds and reject without partial movement.
        match prize_type {
            PrizeType::Native => {
                if attached_value != prize_amount {
                    return Err(ArbiterError::AttachedValueMismatch {
                        expected: prize_amount,
                        attached: attached_value,
                    });
                }
                let native = NativeLedger::new(&self.db);
                native.debit(&creator, prize_amount)?;
                native.credit(&self.escrow_account, prize_amount)?;
            }
            PrizeType::StableToken => {
                if attached_value != 0 {
                    return Err(ArbiterError::AttachedValueMismatch {
                        expected: 0,
                        attached: attached_value,
                    });
                }
                let token = StableToken::new(&self.db);
                token.transfer_from(&self.escrow_account, &creator, &self.escrow_account, prize_amount)?;
            }
        }

        let id = self.db.next_challenge_id()?;
        let challenge = Challenge {
            id,
            creator,
            ipfs_url: ipfs_url.to_string(),
            duration,
            start_time: now,
            prize_amount,
            prize_type,
            status: ChallengeStatus::Active,
            submissions: Vec::new(),
        };
        self.db.put_challenge(&challenge)?;

        info!(challenge_id = id, %creator, prize_amount, ?prize_type, "challenge created");
        self.sink.emit(Event::ChallengeCreated {
            challenge_id: id,
            creator,
            ipfs_url: challenge.ipfs_url.clone(),
            duration,
            prize_amount,
            prize_type,
        });
        Ok(id)
    }

    // ── submit ───────────────────────────────────────────────────────────────

    /// Append a solution; the returned index is the stable voting reference.
    pub fn submit_solution(
        &self,
        id: ChallengeId,
        submitter: Address,
        ipfs_hash: &str,
        now: Timestamp,
    ) -> Result<SubmissionIndex, ArbiterError> {
        let mut challenge = self.require_open(id, now)?;

        let index = challenge.submissions.len() as SubmissionIndex;
        challenge.submissions.push(Submission {
            ipfs_hash: ipfs_hash.to_string(),
            submitter,
            vote_count: 0,
        });
        self.db.put_challenge(&challenge)?;

        info!(challenge_id = id, index, %submitter, "solution submitted");
        self.sink.emit(Event::SolutionSubmitted {
            challenge_id: id,
            index,
            submitter,
            ipfs_hash: ipfs_hash.to_string(),
        });
        Ok(index)
    }

    // ── vote ─────────────────────────────────────────────────────────────────

    /// Cast exactly one vote per (challenge, voter). All checks run before
    /// the check-then-set write pair, so a rejection changes nothing.
    pub fn vote(
        &self,
        id: ChallengeId,
        voter: Address,
        index: SubmissionIndex,
        now: Timestamp,
    ) -> Result<(), ArbiterError> {
        let mut challenge = self.require_open(id, now)?;

        if self.db.has_voted(id, &voter)? {
            return Err(ArbiterError::AlreadyVoted(voter.to_hex()));
        }
        let count = challenge.submissions.len() as SubmissionIndex;
        let Some(submission) = challenge.submissions.get_mut(index as usize) else {
            return Err(ArbiterError::SubmissionOutOfRange { index, count });
        };
        if submission.submitter == voter {
            return Err(ArbiterError::SelfVote);
        }

        submission.vote_count += 1;
        self.db.record_vote(id, &voter)?;
        self.db.put_challenge(&challenge)?;

        info!(challenge_id = id, index, %voter, "vote cast");
        self.sink.emit(Event::VoteCast { challenge_id: id, index, voter });
        Ok(())
    }

    // ── settle ───────────────────────────────────────────────────────────────

    /// Derive and memoize the final state once the deadline has passed.
    ///
    /// Winner = first submission with a strictly greater vote count than any
    /// earlier one, so ties resolve to the lowest index. With zero
    /// submissions the prize is refunded to the creator. The stored
    /// `Completed` status makes the payout happen at most once no matter how
    /// many observers race past the deadline.
    pub fn settle(&self, id: ChallengeId, now: Timestamp) -> Result<SettleOutcome, ArbiterError> {
        let mut challenge = self
            .db
            .get_challenge(id)?
            .ok_or(ArbiterError::ChallengeNotFound(id))?;

        if let ChallengeStatus::Completed { .. } = challenge.status {
            return Ok(SettleOutcome::AlreadyCompleted);
        }
        if !challenge.has_ended(now) {
            return Ok(SettleOutcome::StillRunning);
        }

        // Stage the whole settlement first, then commit every write in one
        // tail block: a rejected payout leaves the challenge untouched and
        // retryable, and the remaining writes sit adjacent to it.
        let (recipient, winner, event, outcome) = match challenge.winning_submission() {
            Some(index) => {
                let winner = challenge.submissions[index as usize].submitter;
                let event = Event::WinnerDetermined {
                    challenge_id: id,
                    winner,
                    prize_amount: challenge.prize_amount,
                    prize_type: challenge.prize_type,
                };
                (winner, winner, event, SettleOutcome::WinnerPaid(winner))
            }
            None => {
                let creator = challenge.creator;
                let event = Event::PrizeRefunded {
                    challenge_id: id,
                    creator,
                    prize_amount: challenge.prize_amount,
                    prize_type: challenge.prize_type,
                };
                (creator, Address::ZERO, event, SettleOutcome::Refunded)
            }
        };
        challenge.status = ChallengeStatus::Completed { settled_at: now, winner };

        self.pay_out(&challenge, &recipient)?;
        self.db.put_challenge(&challenge)?;

        info!(
            challenge_id = id,
            %recipient,
            prize = challenge.prize_amount,
            refunded = winner.is_zero(),
            "challenge settled"
        );
        self.sink.emit(event);
        Ok(outcome)
    }

    pub fn get(&self, id: ChallengeId) -> Result<Option<Challenge>, ArbiterError> {
        self.db.get_challenge(id)
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    /// Load a challenge that is active and still inside its window.
    fn require_open(&self, id: ChallengeId, now: Timestamp) -> Result<Challenge, ArbiterError> {
        let challenge = self
            .db
            .get_challenge(id)?
            .ok_or(ArbiterError::ChallengeNotFound(id))?;
        if !challenge.is_active() {
            return Err(ArbiterError::ChallengeInactive(id));
        }
        if challenge.has_ended(now) {
            return Err(ArbiterError::ChallengeEnded { id, end_time: challenge.end_time() });
        }
        Ok(challenge)
    }

    /// The single fund-release path: move the escrowed prize to `recipient`
    /// in the prize asset.
    fn pay_out(&self, challenge: &Challenge, recipient: &Address) -> Result<(), ArbiterError> {
        match challenge.prize_type {
            PrizeType::Native => {
                let native = NativeLedger::new(&self.db);
                native.debit(&self.escrow_account, challenge.prize_amount)?;
                native.credit(recipient, challenge.prize_amount)
            }
            PrizeType::StableToken => {
                let token = StableToken::new(&self.db);
                token.transfer(&self.escrow_account, recipient, challenge.prize_amount)
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
