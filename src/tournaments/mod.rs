//! Tournament coordination: roster lifecycle, fixture kick-off, match
//! resolution and the follow-on bookkeeping that keeps brackets and tables
//! consistent.
//!
//! Tournament and match documents live in separate collections and there is
//! no multi-document transaction. Consistency comes from the other
//! direction: submissions settle the match document atomically, and the
//! bracket or table is then re-derived from the terminal match set. Any
//! derivation pass that is lost gets redone by the next one.

mod advance;
mod standings;

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use docstore::{Collection, CommitError, Event, MAX_TXN_ATTEMPTS, Txn, TxnError};
use log::{debug, error, info, warn};
use rand::thread_rng;
use tokio::sync::broadcast;

use crate::codes;
use crate::error::{Error, Result};
use crate::fixtures;
use crate::model::{
    Entrant, MatchSide, MatchStatus, Submission, Tournament, TournamentMatch, TournamentStatus,
    TournamentType,
};
use crate::settings::Settings;

/// Creation parameters. The creator is seeded as the first participant.
#[derive(Debug, Clone)]
pub struct NewTournament {
    pub name: String,
    pub kind: TournamentType,
    pub is_public: bool,
    pub max_players: u32,
    /// Hours each materialized match stays open; defaults from settings.
    pub match_deadline_hours: Option<i64>,
}

#[derive(Clone)]
pub struct TournamentService {
    tournaments: Collection<Tournament>,
    matches: Collection<TournamentMatch>,
    settings: Settings,
}

impl TournamentService {
    pub fn new(
        tournaments: Collection<Tournament>,
        matches: Collection<TournamentMatch>,
        settings: Settings,
    ) -> Self {
        Self {
            tournaments,
            matches,
            settings,
        }
    }

    // -----------------------------------------------------------------
    // Roster lifecycle
    // -----------------------------------------------------------------

    pub async fn create(&self, creator: Entrant, params: NewTournament) -> Result<Tournament> {
        let name = params.name.trim();
        if name.is_empty() {
            return Err(Error::Validation("tournament name is required".into()));
        }
        match params.kind {
            TournamentType::Knockout => {
                if !fixtures::KNOCKOUT_SIZES.contains(&(params.max_players as usize)) {
                    return Err(Error::Validation(format!(
                        "knockout needs 4, 8, 16 or 32 players, got {}",
                        params.max_players
                    )));
                }
            }
            TournamentType::League => {
                if (params.max_players as usize) < fixtures::LEAGUE_MIN_PLAYERS {
                    return Err(Error::Validation(format!(
                        "league needs at least {} players, got {}",
                        fixtures::LEAGUE_MIN_PLAYERS,
                        params.max_players
                    )));
                }
            }
        }

        let now = Utc::now();
        let code = (!params.is_public).then(|| codes::tournament_code(&mut thread_rng()));
        let tournament = Tournament {
            id: codes::fresh_id(),
            name: name.to_owned(),
            creator_id: creator.id.clone(),
            kind: params.kind,
            is_public: params.is_public,
            max_players: params.max_players,
            match_deadline_hours: params
                .match_deadline_hours
                .unwrap_or(self.settings.match_deadline_hours),
            participants: vec![creator],
            status: TournamentStatus::Pending,
            current_round: 0,
            bracket: None,
            standings: None,
            winner_id: None,
            code,
            created_at: now,
            started_at: None,
            completed_at: None,
        };
        self.tournaments
            .insert(tournament.clone())
            .await
            .map_err(|e| Error::Conflict(e.to_string()))?;
        info!(
            "tournament {} ({}) created by {}",
            tournament.id, tournament.name, tournament.creator_id
        );
        Ok(tournament)
    }

    /// Join while the roster is still open.
    pub async fn join(&self, tournament_id: &str, entrant: Entrant) -> Result<Tournament> {
        let joined = self
            .tournaments
            .update(tournament_id, |t: &mut Tournament| {
                if t.status != TournamentStatus::Pending {
                    return Err(Error::Conflict(format!(
                        "tournament {} is no longer accepting players",
                        t.id
                    )));
                }
                if t.is_participant(&entrant.id) {
                    return Err(Error::Conflict(format!(
                        "{} already joined tournament {}",
                        entrant.id, t.id
                    )));
                }
                if t.participants.len() as u32 >= t.max_players {
                    return Err(Error::Conflict(format!("tournament {} is full", t.id)));
                }
                t.participants.push(entrant.clone());
                Ok(Txn::Commit)
            })
            .await
            .map_err(|e| Error::from_txn("tournament", tournament_id, e))?;
        info!("{} joined tournament {tournament_id}", entrant.id);
        Ok(joined)
    }

    /// Resolve a private invite code, then join.
    pub async fn join_by_code(&self, code: &str, entrant: Entrant) -> Result<Tournament> {
        let code = codes::normalize_code(code);
        if !codes::is_well_formed(&code, codes::TOURNAMENT_CODE_PREFIX) {
            return Err(Error::Validation(format!(
                "malformed tournament code {code}"
            )));
        }
        let found = self
            .tournaments
            .find(|t| {
                t.code.as_deref() == Some(code.as_str()) && t.status == TournamentStatus::Pending
            })
            .await
            .ok_or_else(|| Error::NotFound(format!("tournament code {code}")))?;
        self.join(&found.id, entrant).await
    }

    /// Walk away before the start. The creator deletes instead.
    pub async fn leave(&self, tournament_id: &str, user_id: &str) -> Result<Tournament> {
        let left = self
            .tournaments
            .update(tournament_id, |t: &mut Tournament| {
                if t.status != TournamentStatus::Pending {
                    return Err(Error::Conflict(format!(
                        "tournament {} has already started",
                        t.id
                    )));
                }
                if t.creator_id == user_id {
                    return Err(Error::Conflict(
                        "the creator cannot leave; delete the tournament instead".into(),
                    ));
                }
                if !t.is_participant(user_id) {
                    return Err(Error::Conflict(format!(
                        "{user_id} is not in tournament {}",
                        t.id
                    )));
                }
                t.participants.retain(|p| p.id != user_id);
                Ok(Txn::Commit)
            })
            .await
            .map_err(|e| Error::from_txn("tournament", tournament_id, e))?;
        info!("{user_id} left tournament {tournament_id}");
        Ok(left)
    }

    /// Creator tears the tournament down. A pending one vanishes with its
    /// invite code; an active one cancels in place so players can see what
    /// happened. Terminal ones conflict, so racing deletes lose cleanly.
    pub async fn delete(&self, tournament_id: &str, user_id: &str) -> Result<()> {
        let tournament = self
            .tournaments
            .get(tournament_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("tournament {tournament_id}")))?;
        if tournament.creator_id != user_id {
            return Err(Error::Unauthorized("only the creator can delete".into()));
        }
        match tournament.status {
            TournamentStatus::Pending => {
                let removed = self
                    .tournaments
                    .delete_if(tournament_id, |t| {
                        t.status == TournamentStatus::Pending && t.creator_id == user_id
                    })
                    .await;
                if removed.is_none() {
                    return Err(Error::Conflict(format!(
                        "tournament {tournament_id} changed before it could be deleted"
                    )));
                }
                info!("tournament {tournament_id} deleted before start");
            }
            TournamentStatus::Active => {
                self.cancel_active(tournament_id).await?;
                info!("tournament {tournament_id} cancelled while active");
            }
            TournamentStatus::Completed | TournamentStatus::Cancelled => {
                return Err(Error::Conflict(format!(
                    "tournament {tournament_id} is already over"
                )));
            }
        }
        Ok(())
    }

    async fn cancel_active(&self, tournament_id: &str) -> Result<()> {
        let now = Utc::now();
        self.tournaments
            .update(tournament_id, |t: &mut Tournament| {
                if t.status != TournamentStatus::Active {
                    return Err(Error::Conflict(format!(
                        "tournament {} is no longer active",
                        t.id
                    )));
                }
                t.status = TournamentStatus::Cancelled;
                t.completed_at = Some(now);
                Ok(Txn::Commit)
            })
            .await
            .map_err(|e| Error::from_txn("tournament", tournament_id, e))?;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Kick-off
    // -----------------------------------------------------------------

    /// Freeze the roster, shape the fixtures and open play.
    ///
    /// The pending-to-active flip carries the whole bracket or table in one
    /// commit; match documents are inserted afterwards. If the process dies
    /// in between, the next repair pass re-derives the missing documents
    /// from the committed bracket or the frozen roster.
    pub async fn start(&self, tournament_id: &str, user_id: &str) -> Result<Tournament> {
        let tournament = self
            .tournaments
            .get(tournament_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("tournament {tournament_id}")))?;
        if tournament.creator_id != user_id {
            return Err(Error::Unauthorized("only the creator can start".into()));
        }
        if tournament.status != TournamentStatus::Pending {
            return Err(Error::Conflict(format!(
                "tournament {tournament_id} has already started"
            )));
        }

        let now = Utc::now();
        let window = Duration::hours(tournament.match_deadline_hours);
        let (bracket, standings, matches) = match tournament.kind {
            TournamentType::Knockout => {
                let setup = fixtures::generate_knockout(
                    tournament_id,
                    &tournament.participants,
                    window,
                    now,
                    &mut thread_rng(),
                )?;
                (Some(setup.bracket), None, setup.matches)
            }
            TournamentType::League => {
                let fixtures_list =
                    fixtures::generate_league(tournament_id, &tournament.participants, window, now)?;
                let table = fixtures::initial_standings(&tournament.participants);
                (None, Some(table), fixtures_list)
            }
        };

        // The fixtures were shaped from the roster read above; if somebody
        // joined in between, the flip must not ship a bracket that misses
        // them.
        let roster: Vec<String> = tournament.participants.iter().map(|p| p.id.clone()).collect();
        let started = self
            .tournaments
            .update(tournament_id, |t: &mut Tournament| {
                if t.status != TournamentStatus::Pending {
                    return Err(Error::Conflict(format!(
                        "tournament {} has already started",
                        t.id
                    )));
                }
                if t.participants.len() != roster.len()
                    || !t.participants.iter().zip(&roster).all(|(p, id)| p.id == *id)
                {
                    return Err(Error::Conflict(format!(
                        "tournament {} roster changed, retry the start",
                        t.id
                    )));
                }
                t.status = TournamentStatus::Active;
                t.current_round = 1;
                t.bracket = bracket.clone();
                t.standings = standings.clone();
                t.started_at = Some(now);
                Ok(Txn::Commit)
            })
            .await
            .map_err(|e| Error::from_txn("tournament", tournament_id, e))?;

        let mut opened = 0;
        for m in &matches {
            if self.matches.insert_if_absent(m.clone()).await {
                opened += 1;
            }
        }
        info!(
            "tournament {tournament_id} started with {} players, {opened} matches open",
            started.participants.len()
        );
        Ok(started)
    }

    // -----------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------

    /// Record one side's regulation score. Same write-once, order-blind
    /// contract as challenge scores. Ties split by format: a knockout match
    /// opens a shootout, a league fixture records a draw.
    pub async fn submit_match_score(
        &self,
        match_id: &str,
        user_id: &str,
        score: u32,
        round_ref: &str,
    ) -> Result<TournamentMatch> {
        let now = Utc::now();
        let mut just_finished = false;
        let updated = self
            .matches
            .update(match_id, |m: &mut TournamentMatch| {
                just_finished = false;
                let Some(side) = m.side_of(user_id) else {
                    return Err(Error::Unauthorized(format!(
                        "{user_id} is not part of this match"
                    )));
                };
                if m.score(side).is_some() {
                    return Ok(Txn::Skip);
                }
                if m.status.is_terminal() {
                    return Err(Error::Conflict(format!(
                        "match {} is already settled",
                        m.id
                    )));
                }

                *m.score_mut(side) = Some(Submission::new(score, round_ref, now));
                if m.status == MatchStatus::Pending {
                    m.status = MatchStatus::InProgress;
                }

                let (home, away) = match (&m.home_score, &m.away_score) {
                    (Some(hs), Some(aw)) => (hs.score, aw.score),
                    _ => return Ok(Txn::Commit),
                };
                match home.cmp(&away) {
                    Ordering::Greater => {
                        m.winner_id = Some(m.home.id.clone());
                        m.status = MatchStatus::Completed;
                        m.completed_at = Some(now);
                        just_finished = true;
                    }
                    Ordering::Less => {
                        m.winner_id = Some(m.away.id.clone());
                        m.status = MatchStatus::Completed;
                        m.completed_at = Some(now);
                        just_finished = true;
                    }
                    Ordering::Equal => match m.format {
                        TournamentType::Knockout => {
                            m.status = MatchStatus::Penalty;
                            m.went_to_penalties = true;
                        }
                        TournamentType::League => {
                            m.winner_id = None;
                            m.status = MatchStatus::Completed;
                            m.completed_at = Some(now);
                            just_finished = true;
                        }
                    },
                }
                Ok(Txn::Commit)
            })
            .await
            .map_err(|e| Error::from_txn("match", match_id, e))?;

        if just_finished {
            self.after_match(&updated).await;
        } else if updated.status == MatchStatus::Penalty {
            info!("match {match_id} tied, off to penalties");
        } else {
            debug!("match {match_id}: score in from {user_id}");
        }
        Ok(updated)
    }

    /// Shootout score for a knockout match that tied in regulation.
    /// Write-once per side; a tied shootout goes to the side recorded
    /// first.
    pub async fn submit_match_penalty_score(
        &self,
        match_id: &str,
        user_id: &str,
        score: u32,
    ) -> Result<TournamentMatch> {
        let now = Utc::now();
        let mut just_finished = false;
        let updated = self
            .matches
            .update(match_id, |m: &mut TournamentMatch| {
                just_finished = false;
                let Some(side) = m.side_of(user_id) else {
                    return Err(Error::Unauthorized(format!(
                        "{user_id} is not part of this match"
                    )));
                };
                if m.penalty(side).is_some() {
                    return Ok(Txn::Skip);
                }
                if m.status.is_terminal() {
                    return Err(Error::Conflict(format!(
                        "match {} is already settled",
                        m.id
                    )));
                }
                if !m.went_to_penalties {
                    return Err(Error::Conflict(format!(
                        "match {} is not in a shootout",
                        m.id
                    )));
                }

                *m.penalty_mut(side) = Some(score);
                let (Some(hp), Some(ap)) = (m.home_penalty, m.away_penalty) else {
                    return Ok(Txn::Commit);
                };
                let winner_id = match hp.cmp(&ap) {
                    Ordering::Greater => m.home.id.clone(),
                    Ordering::Less => m.away.id.clone(),
                    // Tied shootout: the other side's score was in first.
                    Ordering::Equal => m.entrant(side.other()).id.clone(),
                };
                m.winner_id = Some(winner_id);
                m.status = MatchStatus::Completed;
                m.completed_at = Some(now);
                just_finished = true;
                Ok(Txn::Commit)
            })
            .await
            .map_err(|e| Error::from_txn("match", match_id, e))?;

        if just_finished {
            self.after_match(&updated).await;
        } else {
            debug!("match {match_id}: penalty score in from {user_id}");
        }
        Ok(updated)
    }

    /// Follow-on bookkeeping once a match turns terminal. Failures are
    /// logged and swallowed; the submitter's write already landed and the
    /// next repair pass redoes the derivation.
    async fn after_match(&self, finished: &TournamentMatch) {
        info!(
            "match {} completed, winner {}",
            finished.id,
            finished.winner_id.as_deref().unwrap_or("none")
        );
        let outcome = match finished.format {
            TournamentType::Knockout => self.advance_bracket(&finished.tournament_id).await,
            TournamentType::League => self.refresh_standings(&finished.tournament_id).await,
        };
        if let Err(e) = outcome {
            error!(
                "tournament {}: post-match bookkeeping failed: {e}",
                finished.tournament_id
            );
        }
    }

    // -----------------------------------------------------------------
    // Derivation passes
    // -----------------------------------------------------------------

    /// Re-derive the bracket from the terminal matches and commit it if
    /// anything moved. Also the crash-repair path: match documents lost
    /// between a commit and an insert reappear here. Returns whether the
    /// pass changed anything.
    pub async fn advance_bracket(&self, tournament_id: &str) -> Result<bool> {
        let now = Utc::now();
        for _ in 0..MAX_TXN_ATTEMPTS {
            let Some((mut tournament, version)) =
                self.tournaments.get_versioned(tournament_id).await
            else {
                return Err(Error::NotFound(format!("tournament {tournament_id}")));
            };
            if tournament.kind != TournamentType::Knockout
                || tournament.bracket.is_none()
                || tournament.status == TournamentStatus::Cancelled
            {
                return Ok(false);
            }
            let matches = self
                .matches
                .filter(|m| m.tournament_id == tournament_id)
                .await;

            let plan = advance::replan(&mut tournament, &matches, now);
            let mut opened = false;
            for m in &plan.new_matches {
                if self.matches.insert_if_absent(m.clone()).await {
                    info!(
                        "tournament {tournament_id}: round {} match {} is open",
                        m.round, m.position
                    );
                    opened = true;
                }
            }
            if !plan.changed {
                return Ok(opened);
            }
            match self.tournaments.try_commit(version, tournament.clone()).await {
                Ok(_) => {
                    if tournament.status == TournamentStatus::Completed {
                        info!(
                            "tournament {tournament_id} completed, champion {}",
                            tournament.winner_id.as_deref().unwrap_or("none")
                        );
                    }
                    return Ok(true);
                }
                Err(CommitError::VersionConflict) => continue,
                Err(CommitError::NotFound) => {
                    return Err(Error::NotFound(format!("tournament {tournament_id}")));
                }
            }
        }
        Err(Error::from_txn(
            "tournament",
            tournament_id,
            TxnError::Contention {
                attempts: MAX_TXN_ATTEMPTS,
            },
        ))
    }

    /// Rebuild the league table from the terminal fixtures and commit it if
    /// it moved. Also the crash-repair path: fixture documents lost between
    /// a commit and an insert reappear here, rebuilt from the frozen roster.
    /// Completing the last fixture completes the season. Returns whether the
    /// pass changed anything.
    pub async fn refresh_standings(&self, tournament_id: &str) -> Result<bool> {
        let now = Utc::now();
        for _ in 0..MAX_TXN_ATTEMPTS {
            let Some((mut tournament, version)) =
                self.tournaments.get_versioned(tournament_id).await
            else {
                return Err(Error::NotFound(format!("tournament {tournament_id}")));
            };
            if tournament.kind != TournamentType::League
                || tournament.standings.is_none()
                || tournament.status == TournamentStatus::Cancelled
            {
                return Ok(false);
            }
            let matches = self
                .matches
                .filter(|m| m.tournament_id == tournament_id)
                .await;

            // The fixture list is a pure function of the frozen roster and
            // the start time, so a lost document comes back identical.
            let mut opened = false;
            if let Some(started) = tournament.started_at {
                let window = Duration::hours(tournament.match_deadline_hours);
                let expected = fixtures::generate_league(
                    tournament_id,
                    &tournament.participants,
                    window,
                    started,
                )?;
                for m in &expected {
                    if matches.iter().any(|have| have.id == m.id) {
                        continue;
                    }
                    if self.matches.insert_if_absent(m.clone()).await {
                        info!(
                            "tournament {tournament_id}: fixture {} restored",
                            m.position
                        );
                        opened = true;
                    }
                }
            }

            if !standings::refold(&mut tournament, &matches, now) {
                return Ok(opened);
            }
            match self.tournaments.try_commit(version, tournament.clone()).await {
                Ok(_) => {
                    if tournament.status == TournamentStatus::Completed {
                        info!(
                            "tournament {tournament_id} completed, champion {}",
                            tournament.winner_id.as_deref().unwrap_or("none")
                        );
                    }
                    return Ok(true);
                }
                Err(CommitError::VersionConflict) => continue,
                Err(CommitError::NotFound) => {
                    return Err(Error::NotFound(format!("tournament {tournament_id}")));
                }
            }
        }
        Err(Error::from_txn(
            "tournament",
            tournament_id,
            TxnError::Contention {
                attempts: MAX_TXN_ATTEMPTS,
            },
        ))
    }

    // -----------------------------------------------------------------
    // Expiry and repair
    // -----------------------------------------------------------------

    /// Forfeit every live match past its deadline: a sole submitter takes
    /// the win, an untouched match forfeits both ways and leaves no winner.
    /// Bookkeeping runs per forfeited match, after its write lands.
    pub async fn sweep_matches_at(&self, now: DateTime<Utc>) -> usize {
        let due = self
            .matches
            .filter(|m| !m.status.is_terminal() && m.deadline < now)
            .await;
        let mut swept = 0;
        for stale in due {
            match self.forfeit(&stale.id, now).await {
                Ok(Some(forfeited)) => {
                    swept += 1;
                    self.after_match(&forfeited).await;
                }
                Ok(None) => {}
                Err(e) => warn!("match {}: sweep failed: {e}", stale.id),
            }
        }
        swept
    }

    async fn forfeit(
        &self,
        match_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TournamentMatch>> {
        let mut changed = false;
        let updated = self
            .matches
            .update(match_id, |m: &mut TournamentMatch| {
                changed = false;
                if m.status.is_terminal() || m.deadline >= now {
                    return Ok(Txn::Skip);
                }
                let sole = if m.went_to_penalties {
                    match (m.home_penalty, m.away_penalty) {
                        (Some(_), None) => Some(MatchSide::Home),
                        (None, Some(_)) => Some(MatchSide::Away),
                        _ => None,
                    }
                } else {
                    match (&m.home_score, &m.away_score) {
                        (Some(_), None) => Some(MatchSide::Home),
                        (None, Some(_)) => Some(MatchSide::Away),
                        _ => None,
                    }
                };
                match sole {
                    Some(side) => {
                        m.winner_id = Some(m.entrant(side).id.clone());
                        m.forfeited_by = Some(m.entrant(side.other()).id.clone());
                    }
                    None => {
                        m.winner_id = None;
                        m.forfeited_by = None;
                    }
                }
                m.status = MatchStatus::Forfeit;
                m.completed_at = Some(now);
                changed = true;
                Ok(Txn::Commit)
            })
            .await
            .map_err(|e| Error::from_txn("match", match_id, e))?;
        if changed {
            info!(
                "match {match_id} forfeited, winner {}",
                updated.winner_id.as_deref().unwrap_or("none")
            );
            Ok(Some(updated))
        } else {
            Ok(None)
        }
    }

    /// Repair pass over every active tournament: re-derives brackets and
    /// tables, which also heals missing match documents and derivations
    /// lost to an earlier failure.
    pub async fn resync_active(&self) -> usize {
        let active = self
            .tournaments
            .filter(|t| t.status == TournamentStatus::Active)
            .await;
        let mut repaired = 0;
        for tournament in active {
            let outcome = match tournament.kind {
                TournamentType::Knockout => self.advance_bracket(&tournament.id).await,
                TournamentType::League => self.refresh_standings(&tournament.id).await,
            };
            match outcome {
                Ok(true) => {
                    repaired += 1;
                    debug!("tournament {}: resync applied changes", tournament.id);
                }
                Ok(false) => {}
                Err(e) => warn!("tournament {}: resync failed: {e}", tournament.id),
            }
        }
        repaired
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    pub async fn tournament(&self, tournament_id: &str) -> Option<Tournament> {
        self.tournaments.get(tournament_id).await
    }

    /// Open tournaments anyone can join, newest first.
    pub async fn public_listing(&self) -> Vec<Tournament> {
        let mut list = self
            .tournaments
            .filter(|t| t.is_public && t.status == TournamentStatus::Pending)
            .await;
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    /// Everything this user plays in or created, newest first.
    pub async fn tournaments_for(&self, user_id: &str) -> Vec<Tournament> {
        let mut list = self
            .tournaments
            .filter(|t| t.is_participant(user_id) || t.creator_id == user_id)
            .await;
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    /// A tournament's matches in bracket order.
    pub async fn matches_for(&self, tournament_id: &str) -> Vec<TournamentMatch> {
        let mut list = self
            .matches
            .filter(|m| m.tournament_id == tournament_id)
            .await;
        list.sort_by_key(|m| (m.round, m.position));
        list
    }

    /// Resolve an invite code to its tournament, whatever its state.
    pub async fn tournament_by_code(&self, code: &str) -> Option<Tournament> {
        let code = codes::normalize_code(code);
        self.tournaments
            .find(|t| t.code.as_deref() == Some(code.as_str()))
            .await
    }

    pub async fn match_by_id(&self, match_id: &str) -> Option<TournamentMatch> {
        self.matches.get(match_id).await
    }

    pub fn watch_tournaments(&self) -> broadcast::Receiver<Event<Tournament>> {
        self.tournaments.watch()
    }

    pub fn watch_matches(&self) -> broadcast::Receiver<Event<TournamentMatch>> {
        self.matches.watch()
    }
}
