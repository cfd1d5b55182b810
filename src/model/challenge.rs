use chrono::{DateTime, Utc};
use docstore::Document;
use serde::{Deserialize, Serialize};

use super::{Entrant, Submission};

/// Regulation length of a penalty shootout.
pub const PENALTY_ROUNDS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Expired,
    Declined,
}

impl ChallengeStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ChallengeStatus::Completed | ChallengeStatus::Expired | ChallengeStatus::Declined
        )
    }
}

/// Which seat of a challenge a participant occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeSide {
    Challenger,
    Opponent,
}

impl ChallengeSide {
    pub fn other(self) -> ChallengeSide {
        match self {
            ChallengeSide::Challenger => ChallengeSide::Opponent,
            ChallengeSide::Opponent => ChallengeSide::Challenger,
        }
    }
}

/// Shootout summary, written once when the penalty pair resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyResult {
    pub challenger_score: u32,
    pub opponent_score: u32,
    pub total_rounds: u32,
    pub winner_id: String,
}

/// An asynchronous head-to-head duel. Each player plays a round on their
/// own time and reports the score; the document records what each side
/// reported and the outcome the pair reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    /// Invite code, present only on challenges created as shareable links.
    pub code: Option<String>,
    pub challenger: Entrant,
    /// Unset while a link challenge waits to be claimed.
    pub opponent: Option<Entrant>,
    pub status: ChallengeStatus,
    pub challenger_score: Option<Submission>,
    pub opponent_score: Option<Submission>,
    /// Set once regulation scores tie; the pair then settles it with a
    /// shootout.
    pub went_to_penalties: bool,
    pub challenger_penalty: Option<u32>,
    pub opponent_penalty: Option<u32>,
    pub penalty_result: Option<PenaltyResult>,
    /// None on a terminal challenge means it ended without a result.
    pub winner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub deadline: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Challenge {
    /// The seat `user_id` occupies, if any.
    pub fn side_of(&self, user_id: &str) -> Option<ChallengeSide> {
        if self.challenger.id == user_id {
            Some(ChallengeSide::Challenger)
        } else if self.opponent.as_ref().is_some_and(|o| o.id == user_id) {
            Some(ChallengeSide::Opponent)
        } else {
            None
        }
    }

    pub fn is_party(&self, user_id: &str) -> bool {
        self.side_of(user_id).is_some()
    }

    pub fn opponent_id(&self) -> Option<&str> {
        self.opponent.as_ref().map(|o| o.id.as_str())
    }

    pub fn score(&self, side: ChallengeSide) -> Option<&Submission> {
        match side {
            ChallengeSide::Challenger => self.challenger_score.as_ref(),
            ChallengeSide::Opponent => self.opponent_score.as_ref(),
        }
    }

    pub(crate) fn score_mut(&mut self, side: ChallengeSide) -> &mut Option<Submission> {
        match side {
            ChallengeSide::Challenger => &mut self.challenger_score,
            ChallengeSide::Opponent => &mut self.opponent_score,
        }
    }

    pub fn penalty(&self, side: ChallengeSide) -> Option<u32> {
        match side {
            ChallengeSide::Challenger => self.challenger_penalty,
            ChallengeSide::Opponent => self.opponent_penalty,
        }
    }

    pub(crate) fn penalty_mut(&mut self, side: ChallengeSide) -> &mut Option<u32> {
        match side {
            ChallengeSide::Challenger => &mut self.challenger_penalty,
            ChallengeSide::Opponent => &mut self.opponent_penalty,
        }
    }
}

impl Document for Challenge {
    fn id(&self) -> &str {
        &self.id
    }
}
