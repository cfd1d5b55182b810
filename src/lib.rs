//! Asynchronous head-to-head competition over shared document state.
//!
//! Players never have to be online together: each side of a challenge or
//! tournament match reports its own score whenever its game finishes, and
//! the write that lands the second score settles the outcome. Everything
//! sits on [`docstore`]'s versioned collections; single-document
//! transactions plus idempotent re-derivation stand in for cross-document
//! atomicity.
//!
//! Three moving parts: [`ChallengeService`] for 1v1 challenges,
//! [`TournamentService`] for knockout brackets and league seasons, and a
//! [`Sweeper`] that enforces deadlines and repairs derived state.
//! [`Matchday`] wires them over shared collections.

pub mod challenges;
pub mod codes;
pub mod error;
pub mod fixtures;
pub mod model;
pub mod settings;
pub mod sweeper;
pub mod tournaments;

pub use challenges::{ChallengeService, ChallengeStats};
pub use error::{Error, Result};
pub use settings::Settings;
pub use sweeper::{SweepReport, Sweeper};
pub use tournaments::{NewTournament, TournamentService};

use docstore::Collection;

/// The assembled application: one service per domain over fresh shared
/// collections, plus a sweeper factory.
#[derive(Clone)]
pub struct Matchday {
    challenges: ChallengeService,
    tournaments: TournamentService,
    settings: Settings,
}

impl Matchday {
    pub fn new(settings: Settings) -> Self {
        let challenges = ChallengeService::new(Collection::new(), settings.clone());
        let tournaments =
            TournamentService::new(Collection::new(), Collection::new(), settings.clone());
        Self {
            challenges,
            tournaments,
            settings,
        }
    }

    pub fn challenges(&self) -> &ChallengeService {
        &self.challenges
    }

    pub fn tournaments(&self) -> &TournamentService {
        &self.tournaments
    }

    /// A sweeper over this instance's collections on the configured
    /// cadence. Run it as its own task; services stay usable alongside.
    pub fn sweeper(&self) -> Sweeper {
        Sweeper::new(
            self.challenges.clone(),
            self.tournaments.clone(),
            std::time::Duration::from_secs(self.settings.sweep_interval_secs),
        )
    }
}

impl Default for Matchday {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
