//! End-to-end season driver. Spins up a full in-process instance, plays a
//! challenge, a knockout cup and a league through their lifecycles (a tie,
//! a shootout and a deadline forfeit included) and prints the closing
//! state.

use chrono::{Duration, Utc};
use log::info;
use matchday::model::{Entrant, MatchStatus, TournamentStatus, TournamentType};
use matchday::{Matchday, NewTournament, Settings};
use rand::Rng;
use rand::thread_rng;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let app = Matchday::new(Settings::load());

    challenge_round(&app).await?;
    knockout_cup(&app).await?;
    league_season(&app).await?;

    Ok(())
}

/// Open link, claim, tied regulation, shootout.
async fn challenge_round(app: &Matchday) -> anyhow::Result<()> {
    let challenges = app.challenges();
    let link = challenges.create_link(Entrant::new("ava", "Ava")).await?;
    let code = link
        .code
        .clone()
        .ok_or_else(|| anyhow::anyhow!("link without a code"))?;
    info!("challenge link open under {code}");

    challenges
        .claim_by_code(&code, Entrant::new("ben", "Ben"))
        .await?;
    challenges.submit_score(&link.id, "ava", 3, "friendly").await?;
    challenges.submit_score(&link.id, "ben", 3, "friendly").await?;
    challenges.submit_penalty_score(&link.id, "ava", 4).await?;
    let done = challenges.submit_penalty_score(&link.id, "ben", 2).await?;

    println!(
        "challenge winner: {}",
        done.winner_id.as_deref().unwrap_or("nobody")
    );
    let stats = challenges.stats_for("ava").await;
    println!("ava's record: {}", serde_json::to_string(&stats)?);
    Ok(())
}

/// Eight players, random scores, shootouts where needed, runs to a
/// champion.
async fn knockout_cup(app: &Matchday) -> anyhow::Result<()> {
    let tournaments = app.tournaments();
    let cup = tournaments
        .create(
            Entrant::new("p0", "Player 0"),
            NewTournament {
                name: "Weekend Cup".into(),
                kind: TournamentType::Knockout,
                is_public: true,
                max_players: 8,
                match_deadline_hours: None,
            },
        )
        .await?;
    for i in 1..8 {
        tournaments
            .join(&cup.id, Entrant::new(format!("p{i}"), format!("Player {i}")))
            .await?;
    }
    tournaments.start(&cup.id, "p0").await?;

    let mut rng = thread_rng();
    loop {
        let Some(t) = tournaments.tournament(&cup.id).await else {
            break;
        };
        if t.status != TournamentStatus::Active {
            break;
        }
        let open: Vec<_> = tournaments
            .matches_for(&cup.id)
            .await
            .into_iter()
            .filter(|m| !m.status.is_terminal())
            .collect();
        for m in open {
            tournaments
                .submit_match_score(&m.id, &m.home.id, rng.gen_range(0..6), "cup night")
                .await?;
            let updated = tournaments
                .submit_match_score(&m.id, &m.away.id, rng.gen_range(0..6), "cup night")
                .await?;
            if updated.status == MatchStatus::Penalty {
                tournaments
                    .submit_match_penalty_score(&m.id, &m.home.id, rng.gen_range(0..5))
                    .await?;
                tournaments
                    .submit_match_penalty_score(&m.id, &m.away.id, rng.gen_range(0..5))
                    .await?;
            }
        }
    }

    let done = tournaments
        .tournament(&cup.id)
        .await
        .ok_or_else(|| anyhow::anyhow!("cup vanished"))?;
    println!(
        "cup champion: {}",
        done.winner_id.as_deref().unwrap_or("nobody")
    );
    Ok(())
}

/// Five players by invite code; the last fixture goes one-sided and falls
/// to the deadline sweep.
async fn league_season(app: &Matchday) -> anyhow::Result<()> {
    let tournaments = app.tournaments();
    let league = tournaments
        .create(
            Entrant::new("q0", "Quinn 0"),
            NewTournament {
                name: "Evening League".into(),
                kind: TournamentType::League,
                is_public: false,
                max_players: 5,
                match_deadline_hours: Some(48),
            },
        )
        .await?;
    let code = league
        .code
        .clone()
        .ok_or_else(|| anyhow::anyhow!("private league without a code"))?;
    for i in 1..5 {
        tournaments
            .join_by_code(&code, Entrant::new(format!("q{i}"), format!("Quinn {i}")))
            .await?;
    }
    tournaments.start(&league.id, "q0").await?;

    let mut rng = thread_rng();
    let fixtures = tournaments.matches_for(&league.id).await;
    let (last, played) = fixtures
        .split_last()
        .ok_or_else(|| anyhow::anyhow!("league without fixtures"))?;
    for m in played {
        tournaments
            .submit_match_score(&m.id, &m.home.id, rng.gen_range(0..4), "match day")
            .await?;
        tournaments
            .submit_match_score(&m.id, &m.away.id, rng.gen_range(0..4), "match day")
            .await?;
    }
    tournaments
        .submit_match_score(&last.id, &last.home.id, 2, "match day")
        .await?;

    let report = app
        .sweeper()
        .sweep_once_at(Utc::now() + Duration::hours(49))
        .await;
    info!("sweep forfeited {} matches", report.matches);

    let done = tournaments
        .tournament(&league.id)
        .await
        .ok_or_else(|| anyhow::anyhow!("league vanished"))?;
    println!(
        "league winner: {}",
        done.winner_id.as_deref().unwrap_or("nobody")
    );
    if let Some(standings) = &done.standings {
        println!("{}", serde_json::to_string_pretty(standings)?);
    }
    Ok(())
}
