use chrono::Duration;

/// Deadline and sweep defaults. Every field can be overridden through a
/// `MATCHDAY_*` environment variable; unparseable values fall back to the
/// default.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Window for a direct challenge, and for an accepted one to be played.
    pub challenge_deadline_hours: i64,
    /// Shareable invite links wait longer for a claimant.
    pub link_deadline_hours: i64,
    /// Per-match window for tournaments that don't set their own.
    pub match_deadline_hours: i64,
    /// Sweeper cadence.
    pub sweep_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            challenge_deadline_hours: 24,
            link_deadline_hours: 72,
            match_deadline_hours: 24,
            sweep_interval_secs: 60,
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        let defaults = Self::default();
        Self {
            challenge_deadline_hours: env_parse(
                "MATCHDAY_CHALLENGE_DEADLINE_HOURS",
                defaults.challenge_deadline_hours,
            ),
            link_deadline_hours: env_parse(
                "MATCHDAY_LINK_DEADLINE_HOURS",
                defaults.link_deadline_hours,
            ),
            match_deadline_hours: env_parse(
                "MATCHDAY_MATCH_DEADLINE_HOURS",
                defaults.match_deadline_hours,
            ),
            sweep_interval_secs: env_parse(
                "MATCHDAY_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval_secs,
            ),
        }
    }

    pub fn challenge_deadline(&self) -> Duration {
        Duration::hours(self.challenge_deadline_hours)
    }

    pub fn link_deadline(&self) -> Duration {
        Duration::hours(self.link_deadline_hours)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
