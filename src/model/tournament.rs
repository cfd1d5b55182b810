use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use docstore::Document;
use serde::{Deserialize, Serialize};

use super::{Entrant, Submission};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentType {
    Knockout,
    League,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl TournamentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TournamentStatus::Completed | TournamentStatus::Cancelled)
    }
}

/// A multi-player competition. Pending while the roster fills, active once
/// fixtures exist, terminal at completed or cancelled. The roster is frozen
/// the moment the tournament leaves pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: String,
    pub name: String,
    pub creator_id: String,
    pub kind: TournamentType,
    pub is_public: bool,
    pub max_players: u32,
    pub match_deadline_hours: i64,
    pub participants: Vec<Entrant>,
    pub status: TournamentStatus,
    /// 1-based round currently being played (knockout). 0 while pending.
    pub current_round: u32,
    pub bracket: Option<KnockoutBracket>,
    pub standings: Option<BTreeMap<String, StandingRow>>,
    pub winner_id: Option<String>,
    /// Invite code, present only on private tournaments.
    pub code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Tournament {
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p.id == user_id)
    }

    pub fn participant(&self, user_id: &str) -> Option<&Entrant> {
        self.participants.iter().find(|p| p.id == user_id)
    }

    /// Total fixtures a full league season produces for this roster.
    pub fn league_fixture_count(&self) -> usize {
        let n = self.participants.len();
        n * (n - 1) / 2
    }
}

impl Document for Tournament {
    fn id(&self) -> &str {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Knockout bracket: fully shaped at start, only winners written afterward
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnockoutBracket {
    pub rounds: Vec<BracketRound>,
}

impl KnockoutBracket {
    pub fn total_rounds(&self) -> u32 {
        self.rounds.len() as u32
    }

    /// Slot at (1-based round, 0-based position).
    pub fn slot(&self, round: u32, position: u32) -> Option<&BracketSlot> {
        self.rounds
            .get(round as usize - 1)?
            .slots
            .get(position as usize)
    }

    pub(crate) fn slot_mut(&mut self, round: u32, position: u32) -> Option<&mut BracketSlot> {
        self.rounds
            .get_mut(round as usize - 1)?
            .slots
            .get_mut(position as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketRound {
    /// 1-based; round r holds participant_count / 2^r slots.
    pub number: u32,
    pub name: String,
    pub slots: Vec<BracketSlot>,
}

/// One pairing in the bracket. Sides stay unset until fed by the two
/// predecessor slots; the winner is written exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketSlot {
    pub id: String,
    /// 0-based within the round.
    pub position: u32,
    pub home: Option<Entrant>,
    pub away: Option<Entrant>,
    pub winner_id: Option<String>,
    /// Unset until the pairing is known and its match materializes.
    pub deadline: Option<DateTime<Utc>>,
}

impl BracketSlot {
    pub fn both_known(&self) -> bool {
        self.home.is_some() && self.away.is_some()
    }
}

// ---------------------------------------------------------------------------
// Tournament matches: live documents the players actually submit against
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    InProgress,
    Completed,
    /// Regulation tied; waiting on the penalty pair. Not terminal.
    Penalty,
    Forfeit,
}

impl MatchStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Forfeit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSide {
    Home,
    Away,
}

impl MatchSide {
    pub fn other(self) -> MatchSide {
        match self {
            MatchSide::Home => MatchSide::Away,
            MatchSide::Away => MatchSide::Home,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentMatch {
    pub id: String,
    pub tournament_id: String,
    /// How ties resolve: knockout escalates to penalties, league records a
    /// draw.
    pub format: TournamentType,
    pub round: u32,
    pub position: u32,
    pub home: Entrant,
    pub away: Entrant,
    pub home_score: Option<Submission>,
    pub away_score: Option<Submission>,
    pub status: MatchStatus,
    /// None on a terminal match means a draw or a double forfeit.
    pub winner_id: Option<String>,
    pub forfeited_by: Option<String>,
    pub went_to_penalties: bool,
    pub home_penalty: Option<u32>,
    pub away_penalty: Option<u32>,
    pub deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TournamentMatch {
    /// Fresh pending match for a known pairing. The id is derived from the
    /// coordinates, so every writer building this match builds the same id.
    pub(crate) fn new(
        tournament_id: &str,
        format: TournamentType,
        round: u32,
        position: u32,
        home: Entrant,
        away: Entrant,
        deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: crate::codes::match_id(tournament_id, round, position),
            tournament_id: tournament_id.to_owned(),
            format,
            round,
            position,
            home,
            away,
            home_score: None,
            away_score: None,
            status: MatchStatus::Pending,
            winner_id: None,
            forfeited_by: None,
            went_to_penalties: false,
            home_penalty: None,
            away_penalty: None,
            deadline,
            created_at: now,
            completed_at: None,
        }
    }

    pub fn side_of(&self, user_id: &str) -> Option<MatchSide> {
        if self.home.id == user_id {
            Some(MatchSide::Home)
        } else if self.away.id == user_id {
            Some(MatchSide::Away)
        } else {
            None
        }
    }

    pub fn entrant(&self, side: MatchSide) -> &Entrant {
        match side {
            MatchSide::Home => &self.home,
            MatchSide::Away => &self.away,
        }
    }

    pub fn score(&self, side: MatchSide) -> Option<&Submission> {
        match side {
            MatchSide::Home => self.home_score.as_ref(),
            MatchSide::Away => self.away_score.as_ref(),
        }
    }

    pub(crate) fn score_mut(&mut self, side: MatchSide) -> &mut Option<Submission> {
        match side {
            MatchSide::Home => &mut self.home_score,
            MatchSide::Away => &mut self.away_score,
        }
    }

    pub fn penalty(&self, side: MatchSide) -> Option<u32> {
        match side {
            MatchSide::Home => self.home_penalty,
            MatchSide::Away => self.away_penalty,
        }
    }

    pub(crate) fn penalty_mut(&mut self, side: MatchSide) -> &mut Option<u32> {
        match side {
            MatchSide::Home => &mut self.home_penalty,
            MatchSide::Away => &mut self.away_penalty,
        }
    }
}

impl Document for TournamentMatch {
    fn id(&self) -> &str {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// League standings
// ---------------------------------------------------------------------------

/// One participant's aggregate league record. Rebuilt from the terminal
/// fixtures rather than incremented in place, so replays converge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub scored: u32,
    pub conceded: u32,
    /// Always scored minus conceded.
    pub goal_difference: i64,
    /// 3 a win, 1 a draw, 0 a loss.
    pub points: u32,
}
