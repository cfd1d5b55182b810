//! Deadline enforcement. One periodic task walks every live challenge and
//! tournament match past its window, expires or forfeits it, and re-derives
//! the affected brackets and tables.

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info};
use tokio::time::interval;

use crate::challenges::ChallengeService;
use crate::tournaments::TournamentService;

/// What one pass moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub challenges: usize,
    pub matches: usize,
    pub resynced: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.challenges + self.matches + self.resynced
    }
}

/// Periodic deadline sweep. Every step is idempotent, so overlapping or
/// repeated passes converge instead of double-applying anything.
pub struct Sweeper {
    challenges: ChallengeService,
    tournaments: TournamentService,
    interval: Duration,
}

impl Sweeper {
    pub fn new(
        challenges: ChallengeService,
        tournaments: TournamentService,
        interval: Duration,
    ) -> Self {
        Self {
            challenges,
            tournaments,
            interval,
        }
    }

    /// One pass over everything, judged against the given instant.
    pub async fn sweep_once_at(&self, now: DateTime<Utc>) -> SweepReport {
        let report = SweepReport {
            challenges: self.challenges.sweep_once_at(now).await,
            matches: self.tournaments.sweep_matches_at(now).await,
            resynced: self.tournaments.resync_active().await,
        };
        if report.total() > 0 {
            info!(
                "sweep moved {} challenges and {} matches, resynced {} tournaments",
                report.challenges, report.matches, report.resynced
            );
        }
        report
    }

    pub async fn run(self) {
        let mut ticker = interval(self.interval);
        // Skip the immediate first tick so startup isn't a sweep.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let report = self.sweep_once_at(Utc::now()).await;
            debug!("sweep pass done, {} documents moved", report.total());
        }
    }
}
