//! Knockout advancement as re-derivation. The bracket is a pure function of
//! the terminal match set: every pass rewrites winners, feeds decided slots
//! into the next round's pairings and materializes matches for pairings that
//! lack one, instead of patching a single edge. Running a pass twice with
//! the same inputs is a no-op, which is what lets the sweeper use it as a
//! repair step after a crash or a lost write.

use chrono::{DateTime, Duration, Utc};

use crate::codes;
use crate::model::{Tournament, TournamentMatch, TournamentStatus};

pub(crate) struct AdvancePlan {
    /// Whether the tournament document itself needs a commit.
    pub changed: bool,
    /// Live documents for pairings that became fully known in this pass.
    pub new_matches: Vec<TournamentMatch>,
}

pub(crate) fn replan(
    tournament: &mut Tournament,
    matches: &[TournamentMatch],
    now: DateTime<Utc>,
) -> AdvancePlan {
    let before = tournament.clone();
    let mut new_matches = Vec::new();

    let tournament_id = tournament.id.clone();
    let kind = tournament.kind;
    let window = Duration::hours(tournament.match_deadline_hours);
    let participants = tournament.participants.clone();

    let Some(bracket) = tournament.bracket.as_mut() else {
        return AdvancePlan {
            changed: false,
            new_matches,
        };
    };
    let total = bracket.total_rounds();

    // Winners come straight off the terminal matches. A double forfeit has
    // no winner and leaves its slot stalled.
    for m in matches {
        if !m.status.is_terminal() {
            continue;
        }
        let Some(winner) = &m.winner_id else { continue };
        if let Some(slot) = bracket.slot_mut(m.round, m.position) {
            slot.winner_id = Some(winner.clone());
        }
    }

    // Decided slot p sends its winner to side p % 2 of slot p / 2 one round
    // up.
    for round in 1..total {
        let width = bracket.rounds[round as usize - 1].slots.len() as u32;
        for position in 0..width {
            let Some(winner_id) = bracket
                .slot(round, position)
                .and_then(|s| s.winner_id.clone())
            else {
                continue;
            };
            let Some(winner) = participants.iter().find(|p| p.id == winner_id).cloned() else {
                continue;
            };
            let Some(next) = bracket.slot_mut(round + 1, position / 2) else {
                continue;
            };
            if position % 2 == 0 {
                next.home = Some(winner);
            } else {
                next.away = Some(winner);
            }
        }
    }

    // Materialize a live match for every fully-known, undecided pairing
    // that lacks one. Round 1 is included, so a start that committed its
    // bracket but died before inserting the documents heals here.
    for round in 1..=total {
        let width = bracket.rounds[round as usize - 1].slots.len() as u32;
        for position in 0..width {
            let Some(slot) = bracket.slot_mut(round, position) else {
                continue;
            };
            if !slot.both_known() || slot.winner_id.is_some() {
                continue;
            }
            let id = codes::match_id(&tournament_id, round, position);
            if let Some(live) = matches.iter().find(|m| m.id == id) {
                if slot.deadline.is_none() {
                    slot.deadline = Some(live.deadline);
                }
                continue;
            }
            let deadline = *slot.deadline.get_or_insert(now + window);
            let (Some(home), Some(away)) = (slot.home.clone(), slot.away.clone()) else {
                continue;
            };
            new_matches.push(TournamentMatch::new(
                &tournament_id,
                kind,
                round,
                position,
                home,
                away,
                deadline,
                now,
            ));
        }
    }

    // The current round is the first one with an undecided slot.
    let current_round = (1..=total)
        .find(|&round| {
            bracket.rounds[round as usize - 1]
                .slots
                .iter()
                .any(|s| s.winner_id.is_none())
        })
        .unwrap_or(total);
    let champion = bracket
        .rounds
        .last()
        .and_then(|r| r.slots.first())
        .and_then(|s| s.winner_id.clone());

    tournament.current_round = current_round;
    if let Some(champion) = champion
        && tournament.status == TournamentStatus::Active
    {
        tournament.winner_id = Some(champion);
        tournament.status = TournamentStatus::Completed;
        tournament.completed_at = Some(now);
    }

    AdvancePlan {
        changed: *tournament != before,
        new_matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::fixtures;
    use crate::model::{Entrant, MatchStatus, Submission, TournamentType};

    fn entrants(n: usize) -> Vec<Entrant> {
        (0..n)
            .map(|i| Entrant::new(format!("p{i}"), format!("Player {i}")))
            .collect()
    }

    fn knockout(n: usize) -> (Tournament, Vec<TournamentMatch>) {
        let now = Utc::now();
        let players = entrants(n);
        let mut rng = StdRng::seed_from_u64(7);
        let setup =
            fixtures::generate_knockout("t1", &players, Duration::hours(24), now, &mut rng)
                .unwrap();
        let tournament = Tournament {
            id: "t1".into(),
            name: "Cup".into(),
            creator_id: "p0".into(),
            kind: TournamentType::Knockout,
            is_public: true,
            max_players: n as u32,
            match_deadline_hours: 24,
            participants: players,
            status: TournamentStatus::Active,
            current_round: 1,
            bracket: Some(setup.bracket),
            standings: None,
            winner_id: None,
            code: None,
            created_at: now,
            started_at: Some(now),
            completed_at: None,
        };
        (tournament, setup.matches)
    }

    fn decide(m: &mut TournamentMatch, home: u32, away: u32) {
        let now = Utc::now();
        m.home_score = Some(Submission::new(home, "r", now));
        m.away_score = Some(Submission::new(away, "r", now));
        m.status = MatchStatus::Completed;
        m.winner_id = if home > away {
            Some(m.home.id.clone())
        } else {
            Some(m.away.id.clone())
        };
        m.completed_at = Some(now);
    }

    #[test]
    fn nothing_decided_changes_nothing() {
        let (mut tournament, matches) = knockout(4);
        let plan = replan(&mut tournament, &matches, Utc::now());
        assert!(!plan.changed);
        assert!(plan.new_matches.is_empty());
        assert_eq!(tournament.current_round, 1);
    }

    #[test]
    fn one_result_feeds_the_next_round_but_does_not_pair() {
        let (mut tournament, mut matches) = knockout(4);
        decide(&mut matches[0], 3, 1);
        let winner = matches[0].winner_id.clone().unwrap();

        let plan = replan(&mut tournament, &matches, Utc::now());
        assert!(plan.changed);
        assert!(plan.new_matches.is_empty());

        let bracket = tournament.bracket.as_ref().unwrap();
        assert_eq!(bracket.slot(1, 0).unwrap().winner_id.as_ref(), Some(&winner));
        let next = bracket.slot(2, 0).unwrap();
        assert_eq!(next.home.as_ref().map(|e| e.id.as_str()), Some(winner.as_str()));
        assert!(next.away.is_none());
        assert_eq!(tournament.current_round, 1);
    }

    #[test]
    fn both_results_materialize_the_final() {
        let now = Utc::now();
        let (mut tournament, mut matches) = knockout(4);
        decide(&mut matches[0], 3, 1);
        decide(&mut matches[1], 0, 2);
        let w0 = matches[0].winner_id.clone().unwrap();
        let w1 = matches[1].winner_id.clone().unwrap();

        let plan = replan(&mut tournament, &matches, now);
        assert!(plan.changed);
        assert_eq!(plan.new_matches.len(), 1);

        let last = &plan.new_matches[0];
        assert_eq!(last.id, "t1:r2m0");
        assert_eq!(last.home.id, w0);
        assert_eq!(last.away.id, w1);
        assert_eq!(last.status, MatchStatus::Pending);
        assert_eq!(last.deadline, now + Duration::hours(24));

        let slot = tournament.bracket.as_ref().unwrap().slot(2, 0).unwrap();
        assert!(slot.both_known());
        assert_eq!(slot.deadline, Some(now + Duration::hours(24)));
        assert_eq!(tournament.current_round, 2);
    }

    #[test]
    fn champion_completes_the_tournament() {
        let (mut tournament, mut matches) = knockout(4);
        decide(&mut matches[0], 3, 1);
        decide(&mut matches[1], 0, 2);
        let plan = replan(&mut tournament, &matches, Utc::now());
        let mut last = plan.new_matches.into_iter().next().unwrap();
        decide(&mut last, 5, 4);
        let champion = last.winner_id.clone().unwrap();
        matches.push(last);

        let plan = replan(&mut tournament, &matches, Utc::now());
        assert!(plan.changed);
        assert_eq!(tournament.status, TournamentStatus::Completed);
        assert_eq!(tournament.winner_id.as_ref(), Some(&champion));
        assert!(tournament.completed_at.is_some());
        assert_eq!(tournament.current_round, 2);

        // A further pass over the same inputs settles down.
        let plan = replan(&mut tournament, &matches, Utc::now());
        assert!(!plan.changed);
        assert!(plan.new_matches.is_empty());
    }

    #[test]
    fn a_stalled_slot_blocks_its_pairing() {
        let (mut tournament, mut matches) = knockout(4);
        // Double forfeit: terminal, no winner.
        matches[0].status = MatchStatus::Forfeit;
        matches[0].completed_at = Some(Utc::now());
        decide(&mut matches[1], 2, 0);

        let plan = replan(&mut tournament, &matches, Utc::now());
        assert!(plan.new_matches.is_empty());
        let bracket = tournament.bracket.as_ref().unwrap();
        assert!(bracket.slot(1, 0).unwrap().winner_id.is_none());
        let next = bracket.slot(2, 0).unwrap();
        assert!(next.home.is_none());
        assert!(next.away.is_some());
        assert_eq!(tournament.current_round, 1);
    }

    #[test]
    fn missing_round_one_documents_reappear() {
        let (mut tournament, _) = knockout(4);
        // As if the start committed its bracket and died before inserting.
        let plan = replan(&mut tournament, &[], Utc::now());
        assert!(!plan.changed);
        assert_eq!(plan.new_matches.len(), 2);
        let ids: Vec<&str> = plan.new_matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["t1:r1m0", "t1:r1m1"]);
        let slots = &tournament.bracket.as_ref().unwrap().rounds[0].slots;
        for (slot, m) in slots.iter().zip(&plan.new_matches) {
            assert_eq!(slot.home.as_ref().map(|e| e.id.as_str()), Some(m.home.id.as_str()));
            assert_eq!(slot.away.as_ref().map(|e| e.id.as_str()), Some(m.away.id.as_str()));
        }
    }

    #[test]
    fn eight_players_pair_by_adjacent_slots() {
        let (mut tournament, mut matches) = knockout(8);
        for m in matches.iter_mut() {
            decide(m, 1, 0);
        }
        let winners: Vec<String> = matches
            .iter()
            .map(|m| m.winner_id.clone().unwrap())
            .collect();

        let plan = replan(&mut tournament, &matches, Utc::now());
        assert_eq!(plan.new_matches.len(), 2);
        let semi_0 = &plan.new_matches[0];
        let semi_1 = &plan.new_matches[1];
        assert_eq!((semi_0.home.id.as_str(), semi_0.away.id.as_str()), (winners[0].as_str(), winners[1].as_str()));
        assert_eq!((semi_1.home.id.as_str(), semi_1.away.id.as_str()), (winners[2].as_str(), winners[3].as_str()));
        assert_eq!(tournament.current_round, 2);
    }
}
