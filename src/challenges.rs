use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use docstore::{Collection, Event, Txn};
use log::{debug, info, warn};
use rand::thread_rng;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::codes;
use crate::error::{Error, Result};
use crate::model::challenge::PENALTY_ROUNDS;
use crate::model::{Challenge, ChallengeSide, ChallengeStatus, Entrant, PenaltyResult, Submission};
use crate::settings::Settings;

/// Lifecycle, resolution and expiry for head-to-head challenges.
///
/// Every mutation is a single-document optimistic transaction; the per-side
/// write-once rule stands in for locking, so callers can retry anything.
#[derive(Clone)]
pub struct ChallengeService {
    challenges: Collection<Challenge>,
    settings: Settings,
}

/// Lifetime record across a user's challenges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChallengeStats {
    pub sent: usize,
    pub received: usize,
    pub won: usize,
    pub lost: usize,
    pub pending: usize,
}

impl ChallengeService {
    pub fn new(challenges: Collection<Challenge>, settings: Settings) -> Self {
        Self {
            challenges,
            settings,
        }
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// Direct challenge against a known opponent.
    pub async fn create(&self, challenger: Entrant, opponent: Entrant) -> Result<Challenge> {
        if challenger.id == opponent.id {
            return Err(Error::Validation("you cannot challenge yourself".into()));
        }
        let now = Utc::now();
        let deadline = now + self.settings.challenge_deadline();
        self.insert(blank_challenge(challenger, Some(opponent), None, deadline, now))
            .await
    }

    /// Open challenge link: no opponent yet, a shareable invite code, and a
    /// longer window for somebody to claim it.
    pub async fn create_link(&self, challenger: Entrant) -> Result<Challenge> {
        let now = Utc::now();
        let deadline = now + self.settings.link_deadline();
        let code = codes::challenge_code(&mut thread_rng());
        self.insert(blank_challenge(challenger, None, Some(code), deadline, now))
            .await
    }

    async fn insert(&self, challenge: Challenge) -> Result<Challenge> {
        self.challenges
            .insert(challenge.clone())
            .await
            .map_err(|e| Error::Conflict(e.to_string()))?;
        info!(
            "challenge {} created by {}",
            challenge.id, challenge.challenger.id
        );
        Ok(challenge)
    }

    /// Claim an open link. Race-safe: exactly one claimant wins a code, the
    /// rest see a conflict. Claiming resets the play window.
    pub async fn claim_by_code(&self, code: &str, claimant: Entrant) -> Result<Challenge> {
        let code = codes::normalize_code(code);
        if !codes::is_well_formed(&code, codes::CHALLENGE_CODE_PREFIX) {
            return Err(Error::Validation(format!("malformed challenge code {code}")));
        }
        let found = self
            .challenges
            .find(|c| c.code.as_deref() == Some(code.as_str()))
            .await
            .ok_or_else(|| Error::NotFound(format!("challenge code {code}")))?;
        if found.challenger.id == claimant.id {
            return Err(Error::Validation("you cannot claim your own challenge".into()));
        }

        let now = Utc::now();
        let deadline = now + self.settings.challenge_deadline();
        let id = found.id.clone();
        let claimed = self
            .challenges
            .update(&id, |c: &mut Challenge| {
                if c.status != ChallengeStatus::Pending {
                    return Err(Error::Conflict(format!(
                        "challenge {} is no longer open",
                        c.id
                    )));
                }
                if c.opponent.is_some() {
                    return Err(Error::Conflict(format!(
                        "challenge {} was already claimed",
                        c.id
                    )));
                }
                c.opponent = Some(claimant.clone());
                c.status = ChallengeStatus::Accepted;
                c.accepted_at = Some(now);
                c.deadline = deadline;
                Ok(Txn::Commit)
            })
            .await
            .map_err(|e| Error::from_txn("challenge", &id, e))?;
        info!("challenge {id} claimed by {}", claimant.id);
        Ok(claimed)
    }

    /// Invited opponent takes a direct challenge on. Resets the play window.
    pub async fn accept(&self, challenge_id: &str, user_id: &str) -> Result<Challenge> {
        let now = Utc::now();
        let deadline = now + self.settings.challenge_deadline();
        let accepted = self
            .challenges
            .update(challenge_id, |c: &mut Challenge| {
                if c.opponent_id() != Some(user_id) {
                    return Err(Error::Unauthorized(
                        "only the invited opponent can accept".into(),
                    ));
                }
                if c.status != ChallengeStatus::Pending {
                    return Err(Error::Conflict(format!(
                        "challenge {} is not awaiting acceptance",
                        c.id
                    )));
                }
                c.status = ChallengeStatus::Accepted;
                c.accepted_at = Some(now);
                c.deadline = deadline;
                Ok(Txn::Commit)
            })
            .await
            .map_err(|e| Error::from_txn("challenge", challenge_id, e))?;
        info!("challenge {challenge_id} accepted by {user_id}");
        Ok(accepted)
    }

    /// Invited opponent turns a direct challenge down.
    pub async fn decline(&self, challenge_id: &str, user_id: &str) -> Result<Challenge> {
        let now = Utc::now();
        let declined = self
            .challenges
            .update(challenge_id, |c: &mut Challenge| {
                if c.opponent_id() != Some(user_id) {
                    return Err(Error::Unauthorized(
                        "only the invited opponent can decline".into(),
                    ));
                }
                if c.status != ChallengeStatus::Pending {
                    return Err(Error::Conflict(format!(
                        "challenge {} is not awaiting acceptance",
                        c.id
                    )));
                }
                c.status = ChallengeStatus::Declined;
                c.completed_at = Some(now);
                Ok(Txn::Commit)
            })
            .await
            .map_err(|e| Error::from_txn("challenge", challenge_id, e))?;
        info!("challenge {challenge_id} declined by {user_id}");
        Ok(declined)
    }

    /// Challenger withdraws a challenge nobody has accepted yet. The only
    /// path that removes a challenge document outright.
    pub async fn cancel(&self, challenge_id: &str, user_id: &str) -> Result<()> {
        let challenge = self
            .challenges
            .get(challenge_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("challenge {challenge_id}")))?;
        if challenge.challenger.id != user_id {
            return Err(Error::Unauthorized("only the challenger can cancel".into()));
        }
        if challenge.status != ChallengeStatus::Pending {
            return Err(Error::Conflict(format!(
                "challenge {challenge_id} can no longer be cancelled"
            )));
        }
        let removed = self
            .challenges
            .delete_if(challenge_id, |c| {
                c.status == ChallengeStatus::Pending && c.challenger.id == user_id
            })
            .await;
        if removed.is_none() {
            return Err(Error::Conflict(format!(
                "challenge {challenge_id} changed before it could be cancelled"
            )));
        }
        info!("challenge {challenge_id} cancelled by its challenger");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Resolution: one atomic read-modify-write per submission
    // -----------------------------------------------------------------

    /// Record one side's regulation score. Idempotent per side: once a
    /// score is in, resubmissions change nothing. The write that lands the
    /// second score also decides the outcome: higher score wins, equal
    /// scores send the pair to a shootout and the challenge stays open.
    pub async fn submit_score(
        &self,
        challenge_id: &str,
        user_id: &str,
        score: u32,
        round_ref: &str,
    ) -> Result<Challenge> {
        let now = Utc::now();
        let updated = self
            .challenges
            .update(challenge_id, |c: &mut Challenge| {
                let Some(side) = c.side_of(user_id) else {
                    return Err(Error::Unauthorized(format!(
                        "{user_id} is not part of this challenge"
                    )));
                };
                if c.score(side).is_some() {
                    return Ok(Txn::Skip);
                }
                if c.status.is_terminal() {
                    return Err(Error::Conflict(format!(
                        "challenge {} is already settled",
                        c.id
                    )));
                }
                if c.status == ChallengeStatus::Pending {
                    return Err(Error::Conflict(format!(
                        "challenge {} has not been accepted",
                        c.id
                    )));
                }

                *c.score_mut(side) = Some(Submission::new(score, round_ref, now));
                if c.status == ChallengeStatus::Accepted {
                    c.status = ChallengeStatus::InProgress;
                }

                let (challenger, opponent) = match (&c.challenger_score, &c.opponent_score) {
                    (Some(cs), Some(os)) => (cs.score, os.score),
                    _ => return Ok(Txn::Commit), // waiting on the other side
                };
                match challenger.cmp(&opponent) {
                    Ordering::Greater => {
                        c.winner_id = Some(c.challenger.id.clone());
                        c.status = ChallengeStatus::Completed;
                        c.completed_at = Some(now);
                    }
                    Ordering::Less => {
                        let Some(op_id) = c.opponent_id().map(str::to_owned) else {
                            return Err(Error::Conflict(format!(
                                "challenge {} has a score but no opponent",
                                c.id
                            )));
                        };
                        c.winner_id = Some(op_id);
                        c.status = ChallengeStatus::Completed;
                        c.completed_at = Some(now);
                    }
                    Ordering::Equal => c.went_to_penalties = true,
                }
                Ok(Txn::Commit)
            })
            .await
            .map_err(|e| Error::from_txn("challenge", challenge_id, e))?;

        match updated.status {
            ChallengeStatus::Completed => info!(
                "challenge {challenge_id} completed, winner {}",
                updated.winner_id.as_deref().unwrap_or("none")
            ),
            _ if updated.went_to_penalties => {
                info!("challenge {challenge_id} tied, off to penalties")
            }
            _ => debug!("challenge {challenge_id}: score in from {user_id}, waiting on the other side"),
        }
        Ok(updated)
    }

    /// Record one side's shootout score, with the same per-side write-once
    /// rule. A shootout that also ties goes to the side whose score was
    /// recorded first. That is order-dependent and kept deliberately;
    /// sudden death is the obvious alternative.
    pub async fn submit_penalty_score(
        &self,
        challenge_id: &str,
        user_id: &str,
        score: u32,
    ) -> Result<Challenge> {
        let now = Utc::now();
        let updated = self
            .challenges
            .update(challenge_id, |c: &mut Challenge| {
                let Some(side) = c.side_of(user_id) else {
                    return Err(Error::Unauthorized(format!(
                        "{user_id} is not part of this challenge"
                    )));
                };
                if c.penalty(side).is_some() {
                    return Ok(Txn::Skip);
                }
                if c.status.is_terminal() {
                    return Err(Error::Conflict(format!(
                        "challenge {} is already settled",
                        c.id
                    )));
                }
                if !c.went_to_penalties {
                    return Err(Error::Conflict(format!(
                        "challenge {} is not in a shootout",
                        c.id
                    )));
                }

                *c.penalty_mut(side) = Some(score);
                let (Some(cp), Some(op)) = (c.challenger_penalty, c.opponent_penalty) else {
                    return Ok(Txn::Commit);
                };
                let Some(opponent_id) = c.opponent_id().map(str::to_owned) else {
                    return Err(Error::Conflict(format!(
                        "challenge {} has penalties but no opponent",
                        c.id
                    )));
                };
                let winner_id = match cp.cmp(&op) {
                    Ordering::Greater => c.challenger.id.clone(),
                    Ordering::Less => opponent_id,
                    // Tied shootout: this submission arrived second, so the
                    // other side's score was in first and keeps the win.
                    Ordering::Equal => match side {
                        ChallengeSide::Challenger => opponent_id,
                        ChallengeSide::Opponent => c.challenger.id.clone(),
                    },
                };
                c.penalty_result = Some(PenaltyResult {
                    challenger_score: cp,
                    opponent_score: op,
                    total_rounds: PENALTY_ROUNDS,
                    winner_id: winner_id.clone(),
                });
                c.winner_id = Some(winner_id);
                c.status = ChallengeStatus::Completed;
                c.completed_at = Some(now);
                Ok(Txn::Commit)
            })
            .await
            .map_err(|e| Error::from_txn("challenge", challenge_id, e))?;

        if updated.status == ChallengeStatus::Completed {
            info!(
                "challenge {challenge_id} decided on penalties, winner {}",
                updated.winner_id.as_deref().unwrap_or("none")
            );
        } else {
            debug!("challenge {challenge_id}: penalty score in from {user_id}");
        }
        Ok(updated)
    }

    // -----------------------------------------------------------------
    // Expiry
    // -----------------------------------------------------------------

    /// Push every challenge past its deadline into a terminal state:
    /// unaccepted ones expire, one-sided ones complete as a forfeit win
    /// for the side that played. Safe to re-run on any cadence.
    pub async fn sweep_once_at(&self, now: DateTime<Utc>) -> usize {
        let due = self
            .challenges
            .filter(|c| !c.status.is_terminal() && c.deadline < now)
            .await;
        let mut swept = 0;
        for challenge in due {
            match self.expire(&challenge.id, now).await {
                Ok(true) => swept += 1,
                Ok(false) => {}
                Err(e) => warn!("challenge {}: sweep failed: {e}", challenge.id),
            }
        }
        swept
    }

    async fn expire(&self, challenge_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let mut changed = false;
        self.challenges
            .update(challenge_id, |c: &mut Challenge| {
                changed = false;
                if c.status.is_terminal() || c.deadline >= now {
                    return Ok(Txn::Skip);
                }
                if c.status == ChallengeStatus::Pending {
                    c.status = ChallengeStatus::Expired;
                } else {
                    // Forfeit to a sole submitter; with zero (or, defensively,
                    // two) submissions there is nobody to award it to.
                    let sole = if c.went_to_penalties {
                        match (c.challenger_penalty, c.opponent_penalty) {
                            (Some(_), None) => Some(ChallengeSide::Challenger),
                            (None, Some(_)) => Some(ChallengeSide::Opponent),
                            _ => None,
                        }
                    } else {
                        match (&c.challenger_score, &c.opponent_score) {
                            (Some(_), None) => Some(ChallengeSide::Challenger),
                            (None, Some(_)) => Some(ChallengeSide::Opponent),
                            _ => None,
                        }
                    };
                    match sole {
                        Some(ChallengeSide::Challenger) => {
                            c.winner_id = Some(c.challenger.id.clone());
                            c.status = ChallengeStatus::Completed;
                        }
                        Some(ChallengeSide::Opponent) => {
                            c.winner_id = c.opponent_id().map(str::to_owned);
                            c.status = ChallengeStatus::Completed;
                        }
                        None => c.status = ChallengeStatus::Expired,
                    }
                }
                c.completed_at = Some(now);
                changed = true;
                Ok(Txn::Commit)
            })
            .await
            .map_err(|e| Error::from_txn("challenge", challenge_id, e))?;
        if changed {
            info!("challenge {challenge_id} swept past its deadline");
        }
        Ok(changed)
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    pub async fn challenge(&self, challenge_id: &str) -> Option<Challenge> {
        self.challenges.get(challenge_id).await
    }

    /// Everything the user is a party to, newest first.
    pub async fn challenges_for(&self, user_id: &str) -> Vec<Challenge> {
        let mut list = self.challenges.filter(|c| c.is_party(user_id)).await;
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    /// Direct challenges waiting on this user's answer.
    pub async fn pending_for(&self, user_id: &str) -> Vec<Challenge> {
        let mut list = self
            .challenges
            .filter(|c| c.status == ChallengeStatus::Pending && c.opponent_id() == Some(user_id))
            .await;
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    /// Accepted or under way.
    pub async fn active_for(&self, user_id: &str) -> Vec<Challenge> {
        let mut list = self
            .challenges
            .filter(|c| {
                c.is_party(user_id)
                    && matches!(
                        c.status,
                        ChallengeStatus::Accepted | ChallengeStatus::InProgress
                    )
            })
            .await;
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    /// Settled ones, most recently finished first.
    pub async fn completed_for(&self, user_id: &str) -> Vec<Challenge> {
        let mut list = self
            .challenges
            .filter(|c| c.is_party(user_id) && c.status.is_terminal())
            .await;
        list.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        list
    }

    pub async fn stats_for(&self, user_id: &str) -> ChallengeStats {
        let mut stats = ChallengeStats::default();
        for c in self.challenges.filter(|c| c.is_party(user_id)).await {
            if c.challenger.id == user_id {
                stats.sent += 1;
            } else {
                stats.received += 1;
            }
            match c.status {
                ChallengeStatus::Pending => stats.pending += 1,
                ChallengeStatus::Completed => match c.winner_id.as_deref() {
                    Some(w) if w == user_id => stats.won += 1,
                    Some(_) => stats.lost += 1,
                    None => {}
                },
                _ => {}
            }
        }
        stats
    }

    /// Change feed over every challenge document.
    pub fn watch(&self) -> broadcast::Receiver<Event<Challenge>> {
        self.challenges.watch()
    }
}

fn blank_challenge(
    challenger: Entrant,
    opponent: Option<Entrant>,
    code: Option<String>,
    deadline: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Challenge {
    Challenge {
        id: codes::fresh_id(),
        code,
        challenger,
        opponent,
        status: ChallengeStatus::Pending,
        challenger_score: None,
        opponent_score: None,
        went_to_penalties: false,
        challenger_penalty: None,
        opponent_penalty: None,
        penalty_result: None,
        winner_id: None,
        created_at: now,
        accepted_at: None,
        deadline,
        completed_at: None,
    }
}
