pub mod challenge;
pub mod tournament;

pub use challenge::{Challenge, ChallengeSide, ChallengeStatus, PenaltyResult};
pub use tournament::{
    BracketRound, BracketSlot, KnockoutBracket, MatchSide, MatchStatus, StandingRow, Tournament,
    TournamentMatch, TournamentStatus, TournamentType,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Shared pieces: a participant as the caller identifies them, and one
// side's reported result
// ---------------------------------------------------------------------------

/// Identity is owned upstream; this system only echoes what it was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entrant {
    pub id: String,
    pub display_name: String,
    pub photo_url: Option<String>,
}

impl Entrant {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            photo_url: None,
        }
    }
}

/// One side's reported regulation result. Written at most once per side;
/// a non-null submission is never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub score: u32,
    /// Opaque reference into the gameplay engine's record of the round.
    pub round_ref: String,
    pub completed_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(score: u32, round_ref: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            score,
            round_ref: round_ref.into(),
            completed_at: at,
        }
    }
}
