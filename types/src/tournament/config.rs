use serde::{Deserialize, Serialize};

use super::{
    ConfigError, TournamentKind, MAX_GAME_ID_LENGTH, MAX_PARTICIPANTS, MAX_PAYOUT_POSITIONS,
    PRIZE_WEIGHT_TOLERANCE,
};

/// Parameters for `CreateTournament`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentConfig {
    pub kind: TournamentKind,
    pub game_id: String,
    pub start_at_ms: u64,
    pub end_at_ms: u64,
    /// Entry fee in the smallest currency unit.
    pub entry_fee: u64,
    pub max_participants: u32,
    /// Optional custom payout curve. Empty selects the hyperbolic curve.
    #[serde(default)]
    pub prize_weights: Vec<f64>,
}

impl TournamentConfig {
    /// Validate the configuration.
    ///
    /// `min_duration_ms` is the shortest tournament the scheduler is configured to observe.
    pub fn validate(&self, min_duration_ms: u64) -> Result<(), ConfigError> {
        if self.start_at_ms >= self.end_at_ms {
            return Err(ConfigError::InvalidWindow {
                start_at_ms: self.start_at_ms,
                end_at_ms: self.end_at_ms,
            });
        }
        let duration_ms = self.end_at_ms - self.start_at_ms;
        if duration_ms < min_duration_ms {
            return Err(ConfigError::DurationTooShort {
                duration_ms,
                min_ms: min_duration_ms,
            });
        }
        if self.max_participants < 1 || self.max_participants > MAX_PARTICIPANTS {
            return Err(ConfigError::InvalidMaxParticipants {
                value: self.max_participants,
                max: MAX_PARTICIPANTS,
            });
        }
        if self.game_id.is_empty() || self.game_id.len() > MAX_GAME_ID_LENGTH {
            return Err(ConfigError::InvalidGameId {
                len: self.game_id.len(),
                max: MAX_GAME_ID_LENGTH,
            });
        }
        validate_prize_weights(&self.prize_weights)
    }

    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            kind: self.kind,
            game_id: self.game_id.clone(),
            start_at_ms: self.start_at_ms,
        }
    }
}

/// Check that weights are finite, non-negative, non-increasing, fit the payout table and sum to
/// at most 1.
pub fn validate_prize_weights(weights: &[f64]) -> Result<(), ConfigError> {
    if weights.len() > MAX_PAYOUT_POSITIONS {
        return Err(ConfigError::TooManyPrizeWeights {
            len: weights.len(),
            max: MAX_PAYOUT_POSITIONS,
        });
    }
    if let Some(index) = weights.iter().position(|w| !w.is_finite() || *w < 0.0) {
        return Err(ConfigError::InvalidPrizeWeight { index });
    }
    if let Some(index) = weights.windows(2).position(|pair| pair[1] > pair[0]) {
        return Err(ConfigError::PrizeWeightsIncreasing { index: index + 1 });
    }
    let sum: f64 = weights.iter().sum();
    if sum > 1.0 + PRIZE_WEIGHT_TOLERANCE {
        return Err(ConfigError::PrizeWeightsExceedPool { sum });
    }
    Ok(())
}

/// Identity of a tournament independent of its allocated id.
///
/// Recurring creation uses it to detect that a period already has a tournament.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NaturalKey {
    pub kind: TournamentKind,
    pub game_id: String,
    pub start_at_ms: u64,
}
