//! League table as a fold. Rows start zeroed for the whole roster, one pass
//! over the terminal fixtures rebuilds every number, and the season
//! completes when the last fixture lands. Rebuilding from scratch instead of
//! incrementing in place means concurrent submitters and replays converge
//! on the same table.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::model::{MatchStatus, StandingRow, Tournament, TournamentMatch, TournamentStatus};

/// Rebuild the table and, when every fixture is terminal, complete the
/// season. Returns whether the tournament document changed.
pub(crate) fn refold(
    tournament: &mut Tournament,
    matches: &[TournamentMatch],
    now: DateTime<Utc>,
) -> bool {
    let before = tournament.clone();

    let mut table: BTreeMap<String, StandingRow> = tournament
        .participants
        .iter()
        .map(|p| (p.id.clone(), StandingRow::default()))
        .collect();

    let mut terminal = 0usize;
    for fixture in matches {
        if !fixture.status.is_terminal() {
            continue;
        }
        terminal += 1;
        apply(&mut table, fixture);
    }
    for row in table.values_mut() {
        row.goal_difference = i64::from(row.scored) - i64::from(row.conceded);
    }

    let champion = if terminal == tournament.league_fixture_count()
        && tournament.status == TournamentStatus::Active
    {
        champion(&table, matches)
    } else {
        None
    };

    tournament.standings = Some(table);
    if let Some(champion) = champion {
        tournament.winner_id = Some(champion);
        tournament.status = TournamentStatus::Completed;
        tournament.completed_at = Some(now);
    }

    *tournament != before
}

fn apply(table: &mut BTreeMap<String, StandingRow>, fixture: &TournamentMatch) {
    let home = fixture.home.id.as_str();
    let away = fixture.away.id.as_str();

    if fixture.status == MatchStatus::Completed
        && let (Some(hs), Some(aw)) = (&fixture.home_score, &fixture.away_score)
    {
        let (hg, ag) = (hs.score, aw.score);
        if let Some(row) = table.get_mut(home) {
            row.played += 1;
            row.scored += hg;
            row.conceded += ag;
        }
        if let Some(row) = table.get_mut(away) {
            row.played += 1;
            row.scored += ag;
            row.conceded += hg;
        }
        match fixture.winner_id.as_deref() {
            Some(w) => {
                let (winner, loser) = if w == home { (home, away) } else { (away, home) };
                if let Some(row) = table.get_mut(winner) {
                    row.won += 1;
                    row.points += 3;
                }
                if let Some(row) = table.get_mut(loser) {
                    row.lost += 1;
                }
            }
            None => {
                for side in [home, away] {
                    if let Some(row) = table.get_mut(side) {
                        row.drawn += 1;
                        row.points += 1;
                    }
                }
            }
        }
        return;
    }

    // Forfeits count as a played fixture but put no goals on the board.
    match fixture.winner_id.as_deref() {
        Some(w) => {
            let (winner, loser) = if w == home { (home, away) } else { (away, home) };
            if let Some(row) = table.get_mut(winner) {
                row.played += 1;
                row.won += 1;
                row.points += 3;
            }
            if let Some(row) = table.get_mut(loser) {
                row.played += 1;
                row.lost += 1;
            }
        }
        None => {
            for side in [home, away] {
                if let Some(row) = table.get_mut(side) {
                    row.played += 1;
                    row.lost += 1;
                }
            }
        }
    }
}

/// Ranking: points, then goal difference, then goals scored, then the
/// head-to-head result when exactly two sides are level on all three, then
/// the lower id.
fn champion(table: &BTreeMap<String, StandingRow>, matches: &[TournamentMatch]) -> Option<String> {
    let mut rows: Vec<(&String, &StandingRow)> = table.iter().collect();
    rows.sort_by(|(a_id, a), (b_id, b)| {
        b.points
            .cmp(&a.points)
            .then(b.goal_difference.cmp(&a.goal_difference))
            .then(b.scored.cmp(&a.scored))
            .then(a_id.cmp(b_id))
    });
    let (top_id, top) = rows.first()?;

    let level: Vec<&str> = rows
        .iter()
        .filter(|(_, r)| {
            r.points == top.points
                && r.goal_difference == top.goal_difference
                && r.scored == top.scored
        })
        .map(|(id, _)| id.as_str())
        .collect();
    if level.len() == 2
        && let Some(winner) = head_to_head(level[0], level[1], matches)
    {
        return Some(winner);
    }
    Some((*top_id).clone())
}

/// Winner of the meeting between the two, if it was decisive. A drawn
/// meeting decides nothing.
fn head_to_head(a: &str, b: &str, matches: &[TournamentMatch]) -> Option<String> {
    matches.iter().find_map(|m| {
        let met = (m.home.id == a && m.away.id == b) || (m.home.id == b && m.away.id == a);
        if met && m.status.is_terminal() {
            m.winner_id.clone()
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::fixtures;
    use crate::model::{Entrant, Submission, TournamentType};

    fn entrants(n: usize) -> Vec<Entrant> {
        (0..n)
            .map(|i| Entrant::new(format!("p{i}"), format!("Player {i}")))
            .collect()
    }

    fn league(n: usize) -> (Tournament, Vec<TournamentMatch>) {
        let now = Utc::now();
        let players = entrants(n);
        let matches =
            fixtures::generate_league("t1", &players, Duration::hours(24), now).unwrap();
        let tournament = Tournament {
            id: "t1".into(),
            name: "Sunday League".into(),
            creator_id: "p0".into(),
            kind: TournamentType::League,
            is_public: true,
            max_players: n as u32,
            match_deadline_hours: 24,
            participants: players.clone(),
            status: TournamentStatus::Active,
            current_round: 1,
            bracket: None,
            standings: Some(fixtures::initial_standings(&players)),
            winner_id: None,
            code: None,
            created_at: now,
            started_at: Some(now),
            completed_at: None,
        };
        (tournament, matches)
    }

    fn fixture_between<'a>(
        matches: &'a mut [TournamentMatch],
        home: &str,
        away: &str,
    ) -> &'a mut TournamentMatch {
        matches
            .iter_mut()
            .find(|m| {
                (m.home.id == home && m.away.id == away)
                    || (m.home.id == away && m.away.id == home)
            })
            .unwrap()
    }

    /// Settles the fixture with `first` scoring `a` and `second` scoring
    /// `b`, whichever way the sides were drawn.
    fn play(matches: &mut [TournamentMatch], first: &str, a: u32, second: &str, b: u32) {
        let m = fixture_between(matches, first, second);
        let now = Utc::now();
        let (hg, ag) = if m.home.id == first { (a, b) } else { (b, a) };
        m.home_score = Some(Submission::new(hg, "r", now));
        m.away_score = Some(Submission::new(ag, "r", now));
        m.status = MatchStatus::Completed;
        m.winner_id = match hg.cmp(&ag) {
            std::cmp::Ordering::Greater => Some(m.home.id.clone()),
            std::cmp::Ordering::Less => Some(m.away.id.clone()),
            std::cmp::Ordering::Equal => None,
        };
        m.completed_at = Some(now);
    }

    fn forfeit(matches: &mut [TournamentMatch], winner: Option<&str>, a: &str, b: &str) {
        let m = fixture_between(matches, a, b);
        m.status = MatchStatus::Forfeit;
        m.winner_id = winner.map(str::to_owned);
        m.forfeited_by = winner.map(|w| if w == a { b.to_owned() } else { a.to_owned() });
        m.completed_at = Some(Utc::now());
    }

    #[test]
    fn wins_draws_and_goals_add_up() {
        let (mut tournament, mut matches) = league(3);
        play(&mut matches, "p0", 2, "p1", 0);
        play(&mut matches, "p1", 1, "p2", 1);

        assert!(refold(&mut tournament, &matches, Utc::now()));
        let table = tournament.standings.as_ref().unwrap();
        assert_eq!(
            table["p0"],
            StandingRow {
                played: 1,
                won: 1,
                drawn: 0,
                lost: 0,
                scored: 2,
                conceded: 0,
                goal_difference: 2,
                points: 3
            }
        );
        assert_eq!(table["p1"].played, 2);
        assert_eq!(table["p1"].points, 1);
        assert_eq!(table["p1"].goal_difference, -2);
        assert_eq!(table["p2"].drawn, 1);
        // Two fixtures of three are in, the season stays open.
        assert_eq!(tournament.status, TournamentStatus::Active);
        assert!(tournament.winner_id.is_none());
    }

    #[test]
    fn finished_season_crowns_a_champion() {
        let (mut tournament, mut matches) = league(3);
        play(&mut matches, "p0", 2, "p1", 0);
        play(&mut matches, "p1", 1, "p2", 1);
        play(&mut matches, "p2", 0, "p0", 0);

        assert!(refold(&mut tournament, &matches, Utc::now()));
        assert_eq!(tournament.status, TournamentStatus::Completed);
        assert_eq!(tournament.winner_id.as_deref(), Some("p0"));
        assert!(tournament.completed_at.is_some());

        let table = tournament.standings.as_ref().unwrap();
        let decisive = 1;
        let drawn = 2;
        let points: u32 = table.values().map(|r| r.points).sum();
        assert_eq!(points, 3 * decisive + 2 * drawn);
        let difference: i64 = table.values().map(|r| r.goal_difference).sum();
        assert_eq!(difference, 0);
        assert!(table.values().all(|r| r.played == 2));
    }

    #[test]
    fn refold_converges() {
        let (mut tournament, mut matches) = league(3);
        play(&mut matches, "p0", 2, "p1", 0);
        assert!(refold(&mut tournament, &matches, Utc::now()));
        assert!(!refold(&mut tournament, &matches, Utc::now()));
    }

    #[test]
    fn goal_difference_breaks_level_points() {
        let (mut tournament, mut matches) = league(3);
        // p0 and p2 finish on four points each; p2 beat p1 by the wider
        // margin and takes it on difference.
        play(&mut matches, "p0", 1, "p1", 0);
        play(&mut matches, "p2", 4, "p1", 0);
        play(&mut matches, "p2", 1, "p0", 1);

        refold(&mut tournament, &matches, Utc::now());
        let table = tournament.standings.as_ref().unwrap();
        assert_eq!(table["p0"].points, table["p2"].points);
        assert_eq!(tournament.winner_id.as_deref(), Some("p2"));
    }

    #[test]
    fn head_to_head_splits_an_exact_two_way_tie() {
        let (mut tournament, mut matches) = league(3);
        // p0 and p2 end level on points, difference and goals scored, and
        // p2 won their meeting.
        play(&mut matches, "p0", 2, "p1", 1);
        play(&mut matches, "p1", 2, "p2", 1);
        play(&mut matches, "p2", 3, "p0", 2);

        refold(&mut tournament, &matches, Utc::now());
        let table = tournament.standings.as_ref().unwrap();
        assert_eq!(table["p0"].points, 3);
        assert_eq!(table["p2"].points, 3);
        assert_eq!(table["p0"].goal_difference, table["p2"].goal_difference);
        assert_eq!(table["p0"].scored, table["p2"].scored);
        assert_eq!(tournament.winner_id.as_deref(), Some("p2"));
    }

    #[test]
    fn a_three_way_tie_falls_back_to_the_lowest_id() {
        let (mut tournament, mut matches) = league(3);
        // A perfect cycle of 1-0 wins: everyone level everywhere, and no
        // two-way meeting to consult.
        play(&mut matches, "p0", 1, "p1", 0);
        play(&mut matches, "p1", 1, "p2", 0);
        play(&mut matches, "p2", 1, "p0", 0);

        refold(&mut tournament, &matches, Utc::now());
        assert_eq!(tournament.winner_id.as_deref(), Some("p0"));
    }

    #[test]
    fn forfeits_score_no_goals() {
        let (mut tournament, mut matches) = league(3);
        forfeit(&mut matches, Some("p0"), "p0", "p1");
        forfeit(&mut matches, None, "p1", "p2");

        refold(&mut tournament, &matches, Utc::now());
        let table = tournament.standings.as_ref().unwrap();
        assert_eq!(table["p0"].points, 3);
        assert_eq!(table["p0"].won, 1);
        assert_eq!(table["p0"].scored, 0);
        assert_eq!(table["p1"].played, 2);
        assert_eq!(table["p1"].lost, 2);
        assert_eq!(table["p1"].points, 0);
        assert_eq!(table["p2"].lost, 1);
        assert_eq!(table["p2"].points, 0);
        assert!(table.values().all(|r| r.scored == 0 && r.conceded == 0));
    }
}
