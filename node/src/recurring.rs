//! Recurring tournament templates.
//!
//! A template describes a tournament that should exist for every period of its cadence: each
//! UTC day for `daily`, each ISO week (Monday 00:00 UTC) for `weekly`. The period's start time
//! is part of the tournament's natural key, so creating the same period twice is a no-op.

use serde::{Deserialize, Serialize};

use podium_types::{TournamentConfig, TournamentKind, DAY_MS, WEEK_MS};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecurringTemplate {
    pub kind: TournamentKind,
    pub game_id: String,
    #[serde(default)]
    pub entry_fee: u64,
    pub max_participants: u32,
    #[serde(default)]
    pub prize_weights: Vec<f64>,
    /// Tournament length; defaults to the full period.
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

/// 1970-01-01 was a Thursday: three days after the Monday that starts its ISO week.
const EPOCH_WEEKDAY_OFFSET: u64 = 3;

impl RecurringTemplate {
    pub fn period_ms(&self) -> Option<u64> {
        match self.kind {
            TournamentKind::Daily => Some(DAY_MS),
            TournamentKind::Weekly => Some(WEEK_MS),
            _ => None,
        }
    }

    /// Start of the period containing `now_ms`.
    pub fn period_start_ms(&self, now_ms: u64) -> Option<u64> {
        match self.kind {
            TournamentKind::Daily => Some(now_ms - now_ms % DAY_MS),
            TournamentKind::Weekly => {
                let days = now_ms / DAY_MS;
                let monday = days.saturating_sub((days + EPOCH_WEEKDAY_OFFSET) % 7);
                Some(monday * DAY_MS)
            }
            _ => None,
        }
    }

    /// Tournament configuration for the period containing `now_ms`.
    pub fn config_for(&self, now_ms: u64) -> Option<TournamentConfig> {
        let period_ms = self.period_ms()?;
        let start_at_ms = self.period_start_ms(now_ms)?;
        let duration_ms = self.duration_ms.unwrap_or(period_ms);
        Some(TournamentConfig {
            kind: self.kind,
            game_id: self.game_id.clone(),
            start_at_ms,
            end_at_ms: start_at_ms.saturating_add(duration_ms),
            entry_fee: self.entry_fee,
            max_participants: self.max_participants,
            prize_weights: self.prize_weights.clone(),
        })
    }

    pub fn validate(&self, min_duration_ms: u64) -> Result<(), String> {
        let period_ms = self
            .period_ms()
            .ok_or_else(|| format!("kind must be daily or weekly (got {})", self.kind))?;
        if let Some(duration_ms) = self.duration_ms {
            if duration_ms > period_ms {
                return Err(format!(
                    "duration_ms {duration_ms} exceeds the {} period ({period_ms}ms)",
                    self.kind
                ));
            }
        }
        let config = self
            .config_for(0)
            .ok_or_else(|| "no period for template".to_string())?;
        config
            .validate(min_duration_ms)
            .map_err(|err| err.to_string())
    }
}
