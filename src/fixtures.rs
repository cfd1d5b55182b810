//! Initial match topology: knockout bracket skeletons and round-robin
//! fixture lists. Everything here is pure; callers supply the clock and the
//! randomness.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::codes;
use crate::error::{Error, Result};
use crate::model::{
    BracketRound, BracketSlot, Entrant, KnockoutBracket, StandingRow, TournamentMatch,
    TournamentType,
};

pub const KNOCKOUT_SIZES: [usize; 4] = [4, 8, 16, 32];
pub const LEAGUE_MIN_PLAYERS: usize = 3;

/// Bracket skeleton plus the round-1 match documents. Later rounds hold
/// empty slots only; their matches materialize as pairings resolve.
#[derive(Debug)]
pub struct KnockoutSetup {
    pub bracket: KnockoutBracket,
    pub matches: Vec<TournamentMatch>,
}

pub fn generate_knockout(
    tournament_id: &str,
    participants: &[Entrant],
    match_deadline: Duration,
    now: DateTime<Utc>,
    rng: &mut impl Rng,
) -> Result<KnockoutSetup> {
    if !KNOCKOUT_SIZES.contains(&participants.len()) {
        return Err(Error::Validation(format!(
            "knockout needs 4, 8, 16 or 32 players, got {}",
            participants.len()
        )));
    }

    let mut shuffled: Vec<Entrant> = participants.to_vec();
    shuffled.shuffle(rng);

    let total_rounds = shuffled.len().ilog2();
    let deadline = now + match_deadline;

    // Round 1: consecutive shuffled entries pair off and play immediately.
    let mut first_slots = Vec::with_capacity(shuffled.len() / 2);
    let mut matches = Vec::with_capacity(shuffled.len() / 2);
    for (i, pair) in shuffled.chunks_exact(2).enumerate() {
        let [home, away] = pair else { continue };
        let position = i as u32;
        first_slots.push(BracketSlot {
            id: codes::slot_id(1, position + 1),
            position,
            home: Some(home.clone()),
            away: Some(away.clone()),
            winner_id: None,
            deadline: Some(deadline),
        });
        matches.push(TournamentMatch::new(
            tournament_id,
            TournamentType::Knockout,
            1,
            position,
            home.clone(),
            away.clone(),
            deadline,
            now,
        ));
    }

    let mut rounds = vec![BracketRound {
        number: 1,
        name: round_name(total_rounds, 1),
        slots: first_slots,
    }];

    for number in 2..=total_rounds {
        let count = shuffled.len() >> number;
        let slots = (0..count as u32)
            .map(|position| BracketSlot {
                id: codes::slot_id(number, position + 1),
                position,
                home: None,
                away: None,
                winner_id: None,
                deadline: None,
            })
            .collect();
        rounds.push(BracketRound {
            number,
            name: round_name(total_rounds, number),
            slots,
        });
    }

    Ok(KnockoutSetup {
        bracket: KnockoutBracket { rounds },
        matches,
    })
}

/// Name a round by its distance to the final.
pub fn round_name(total_rounds: u32, number: u32) -> String {
    match total_rounds - number + 1 {
        1 => "Final".to_string(),
        2 => "Semi-Finals".to_string(),
        3 => "Quarter-Finals".to_string(),
        4 => "Round of 16".to_string(),
        _ => format!("Round {number}"),
    }
}

/// Every unordered pair plays exactly once; all fixtures are independent
/// and share one deadline window from the start of the season.
pub fn generate_league(
    tournament_id: &str,
    participants: &[Entrant],
    match_deadline: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<TournamentMatch>> {
    if participants.len() < LEAGUE_MIN_PLAYERS {
        return Err(Error::Validation(format!(
            "league needs at least {LEAGUE_MIN_PLAYERS} players, got {}",
            participants.len()
        )));
    }

    let deadline = now + match_deadline;
    let mut matches = Vec::with_capacity(participants.len() * (participants.len() - 1) / 2);
    for (i, home) in participants.iter().enumerate() {
        for away in &participants[i + 1..] {
            let position = matches.len() as u32;
            matches.push(TournamentMatch::new(
                tournament_id,
                TournamentType::League,
                1,
                position,
                home.clone(),
                away.clone(),
                deadline,
                now,
            ));
        }
    }
    Ok(matches)
}

pub fn initial_standings(participants: &[Entrant]) -> BTreeMap<String, StandingRow> {
    participants
        .iter()
        .map(|p| (p.id.clone(), StandingRow::default()))
        .collect()
}
