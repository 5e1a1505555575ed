use serde::{Deserialize, Serialize};

use crate::types::{Address, Balance, ChallengeId, Timestamp};

// ── PrizeType ────────────────────────────────────────────────────────────────

/// Asset class funding a challenge prize.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrizeType {
    /// Native chain currency, attached at creation.
    Native,
    /// 6-decimal USDC-style token, pulled via an allowance-gated transfer.
    StableToken,
}

// ── Submission ───────────────────────────────────────────────────────────────

/// One solution submitted to a challenge. The submitter address is immutable
/// once recorded; the vote count only increases, by exactly 1 per valid vote.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub ipfs_hash: String,
    pub submitter: Address,
    pub vote_count: u32,
}

// ── ChallengeStatus ──────────────────────────────────────────────────────────

/// Per-challenge state machine: `Active → Completed`, terminal. There is no
/// explicit close call — settlement is derived the first time a query
/// observes `now >= end_time`, and the stored `Completed` status memoizes it
/// so the payout happens at most once even under concurrent observers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ChallengeStatus {
    Active,
    Completed {
        settled_at: Timestamp,
        /// The zero address when the challenge ended with no submissions
        /// and the prize was refunded to the creator.
        winner: Address,
    },
}

// ── Challenge ────────────────────────────────────────────────────────────────

/// A challenge with its escrowed prize, as stored in the state DB.
///
/// The prize is escrowed atomically at creation and never available for
/// withdrawal except through the single settle path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub creator: Address,
    /// Reference to the challenge statement. Opaque; only non-emptiness is
    /// validated.
    pub ipfs_url: String,
    pub duration: i64,
    pub start_time: Timestamp,
    pub prize_amount: Balance,
    pub prize_type: PrizeType,
    pub status: ChallengeStatus,
    /// Insertion order is the stable index used for voting.
    pub submissions: Vec<Submission>,
}

impl Challenge {
    pub fn end_time(&self) -> Timestamp {
        self.start_time + self.duration
    }

    pub fn is_active(&self) -> bool {
        self.status == ChallengeStatus::Active
    }

    /// True once the submission window has closed, whether or not the
    /// challenge has been settled yet.
    pub fn has_ended(&self, now: Timestamp) -> bool {
        now >= self.end_time()
    }

    /// The winner address, or the zero sentinel while undetermined.
    pub fn winner(&self) -> Address {
        match &self.status {
            ChallengeStatus::Active => Address::ZERO,
            ChallengeStatus::Completed { winner, .. } => *winner,
        }
    }

    /// Index of the winning submission: the first submission with a strictly
    /// greater vote count than every earlier one wins, so ties resolve to the
    /// lowest index. None when there are no submissions.
    pub fn winning_submission(&self) -> Option<u32> {
        let mut best: Option<(u32, u32)> = None;
        for (i, sub) in self.submissions.iter().enumerate() {
            match best {
                Some((_, votes)) if sub.vote_count <= votes => {}
                _ => best = Some((i as u32, sub.vote_count)),
            }
        }
        best.map(|(i, _)| i)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn challenge_with_votes(votes: &[u32]) -> Challenge {
        Challenge {
            id: 1,
            creator: Address::from_bytes([1u8; 20]),
            ipfs_url: "ipfs://statement".into(),
            duration: 3600,
            start_time: 0,
            prize_amount: 1_000_000,
            prize_type: PrizeType::StableToken,
            status: ChallengeStatus::Active,
            submissions: votes
                .iter()
                .enumerate()
                .map(|(i, &v)| Submission {
                    ipfs_hash: format!("ipfs://solution-{i}"),
                    submitter: Address::from_bytes([i as u8 + 10; 20]),
                    vote_count: v,
                })
                .collect(),
        }
    }

    #[test]
    fn winner_is_strict_max() {
        let c = challenge_with_votes(&[1, 4, 2]);
        assert_eq!(c.winning_submission(), Some(1));
    }

    #[test]
    fn tie_resolves_to_lowest_index() {
        let c = challenge_with_votes(&[3, 3, 5, 5]);
        assert_eq!(c.winning_submission(), Some(2));
    }

    #[test]
    fn no_submissions_no_winner() {
        let c = challenge_with_votes(&[]);
        assert_eq!(c.winning_submission(), None);
        assert_eq!(c.winner(), Address::ZERO);
    }

    #[test]
    fn all_zero_votes_picks_first() {
        let c = challenge_with_votes(&[0, 0, 0]);
        assert_eq!(c.winning_submission(), Some(0));
    }
}
