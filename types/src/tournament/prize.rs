//! Prize calculator.
//!
//! Pure functions from `(prize_pool, ranked winners)` to per-position amounts. No state, no
//! clock. All arithmetic is integer, in the smallest currency unit, and every division rounds
//! down, so the sum of awards never exceeds the pool. The truncated remainder is reported as
//! `undistributed` rather than assigned to anyone.
//!
//! ## Curves
//!
//! 1. **Hyperbolic** (default): first place takes `winner_share_bps` of the pool. The rest is
//!    split over positions `2..=n` with weights `1/2, 1/3, 1/4, 1/5`, after reserving
//!    `minimum_prize` for each of them off the top. A lone winner takes the whole pool.
//! 2. **FixedShare**: used when the reserved minimums do not fit in the remaining pool. Shares
//!    `50/30/20/10/5` are normalised over the paid positions.
//! 3. **Weighted**: a tournament that carries its own `prize_weights` reserves `minimum_prize`
//!    for each paid position and pays position `i` that minimum plus
//!    `floor(distributable * weights[i])`. If the pool cannot cover the minimums it is split
//!    proportionally instead.
//!
//! ```rust
//! use podium_types::prize::{payout_amounts, PayoutCurve, PrizeSettings};
//!
//! let settings = PrizeSettings::default();
//! let (curve, amounts) = payout_amounts(22_500, 3, &settings, &[]);
//! assert_eq!(curve, PayoutCurve::Hyperbolic);
//! assert_eq!(amounts[0], 11_250);
//! assert!(amounts.iter().sum::<u64>() <= 22_500);
//! ```

use serde::{Deserialize, Serialize};

use super::{
    ConfigError, ParticipantId, RankedEntry, BPS_DENOMINATOR, DEFAULT_MINIMUM_PRIZE,
    DEFAULT_POOL_CONTRIBUTION_BPS, DEFAULT_WINNER_SHARE_BPS, FALLBACK_SHARES_PERCENT,
    HYPERBOLIC_WEIGHT_SCALE, MAX_PAYOUT_POSITIONS, MIN_WINNER_SHARE_BPS,
};

/// Payout and fee parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeSettings {
    pub winner_share_bps: u16,
    pub minimum_prize: u64,
    pub payout_positions: usize,
    pub pool_contribution_bps: u16,
}

impl Default for PrizeSettings {
    fn default() -> Self {
        Self {
            winner_share_bps: DEFAULT_WINNER_SHARE_BPS,
            minimum_prize: DEFAULT_MINIMUM_PRIZE,
            payout_positions: MAX_PAYOUT_POSITIONS,
            pool_contribution_bps: DEFAULT_POOL_CONTRIBUTION_BPS,
        }
    }
}

impl PrizeSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max_bps = BPS_DENOMINATOR as u16;
        if self.winner_share_bps < MIN_WINNER_SHARE_BPS || self.winner_share_bps > max_bps {
            return Err(ConfigError::InvalidBps {
                field: "winner_share_bps",
                value: self.winner_share_bps,
                min: MIN_WINNER_SHARE_BPS,
                max: max_bps,
            });
        }
        if self.pool_contribution_bps > max_bps {
            return Err(ConfigError::InvalidBps {
                field: "pool_contribution_bps",
                value: self.pool_contribution_bps,
                min: 0,
                max: max_bps,
            });
        }
        if self.payout_positions == 0 || self.payout_positions > MAX_PAYOUT_POSITIONS {
            return Err(ConfigError::InvalidPayoutPositions {
                value: self.payout_positions,
                max: MAX_PAYOUT_POSITIONS,
            });
        }
        Ok(())
    }
}

/// Which curve produced a distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutCurve {
    Hyperbolic,
    FixedShare,
    Weighted,
}

/// One paid position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeAward {
    pub rank: u32,
    pub participant_id: ParticipantId,
    pub amount: u64,
}

/// Settlement amounts for a ranked tournament. Derived, never stored on its own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeDistribution {
    pub prize_pool: u64,
    pub curve: PayoutCurve,
    pub awards: Vec<PrizeAward>,
    /// Rounding remainder (or the whole pool when nobody ranked).
    pub undistributed: u64,
}

impl PrizeDistribution {
    pub fn total_awarded(&self) -> u64 {
        self.awards.iter().map(|award| award.amount).sum()
    }
}

/// Display-only projection of a tournament's payouts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizePreview {
    pub participant_count: u32,
    pub prize_pool: u64,
    pub platform_revenue: u64,
    pub curve: PayoutCurve,
    pub amounts: Vec<u64>,
}

fn mul_div(value: u64, numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        return 0;
    }
    (value as u128 * numerator as u128 / denominator as u128) as u64
}

/// Split an entry fee into `(pool_contribution, platform_revenue)`.
///
/// The two parts always add back up to `entry_fee`.
pub fn split_entry_fee(entry_fee: u64, pool_contribution_bps: u16) -> (u64, u64) {
    let contribution = mul_div(entry_fee, pool_contribution_bps as u64, BPS_DENOMINATOR);
    (contribution, entry_fee - contribution)
}

/// Hyperbolic-with-minimum amounts for `positions` winners.
///
/// Returns `None` when the minimums for positions `2..=n` cannot be reserved from what is left
/// after first place.
pub fn hyperbolic_amounts(pool: u64, positions: usize, settings: &PrizeSettings) -> Option<Vec<u64>> {
    match positions {
        0 => return Some(Vec::new()),
        1 => return Some(vec![pool]),
        _ => {}
    }
    let positions = positions.min(MAX_PAYOUT_POSITIONS);

    // Round the runner-up share down so first place absorbs the odd unit.
    let runner_up_bps = BPS_DENOMINATOR - settings.winner_share_bps as u64;
    let remaining = mul_div(pool, runner_up_bps, BPS_DENOMINATOR);
    let first = pool - remaining;

    let reserved = settings.minimum_prize.checked_mul((positions - 1) as u64)?;
    if reserved > remaining {
        return None;
    }
    let distributable = remaining - reserved;

    let weights: Vec<u64> = (2..=positions as u64)
        .map(|rank| HYPERBOLIC_WEIGHT_SCALE / rank)
        .collect();
    let total_weight: u64 = weights.iter().sum();

    let mut amounts = Vec::with_capacity(positions);
    amounts.push(first);
    for weight in weights {
        amounts.push(settings.minimum_prize + mul_div(distributable, weight, total_weight));
    }
    Some(amounts)
}

/// Fixed-share amounts, normalised over the first `positions` shares.
pub fn fixed_share_amounts(pool: u64, positions: usize) -> Vec<u64> {
    let shares = &FALLBACK_SHARES_PERCENT[..positions.min(MAX_PAYOUT_POSITIONS)];
    let total: u64 = shares.iter().sum();
    shares
        .iter()
        .map(|share| mul_div(pool, *share, total))
        .collect()
}

/// Amounts from caller-supplied fractional weights.
///
/// When the pool covers `minimum_prize` for every paid position, that minimum is reserved off
/// the top and the rest is split by weight, so each position gets `minimum_prize +
/// floor(distributable * weight)`. Otherwise the whole pool is split proportionally. Shares are
/// capped by what is left, so float error can never push the total over the pool.
pub fn weighted_amounts(pool: u64, weights: &[f64], minimum_prize: u64) -> Vec<u64> {
    let reserved = minimum_prize
        .checked_mul(weights.len() as u64)
        .filter(|reserved| *reserved <= pool);
    let (floor, distributable) = match reserved {
        Some(reserved) => (minimum_prize, pool - reserved),
        None => (0, pool),
    };
    let mut left = distributable;
    weights
        .iter()
        .map(|weight| {
            let share = ((distributable as f64) * weight).floor() as u64;
            let share = share.min(left);
            left -= share;
            floor + share
        })
        .collect()
}

/// Pick the curve for `winners` ranked participants and compute its amounts.
pub fn payout_amounts(
    pool: u64,
    winners: usize,
    settings: &PrizeSettings,
    weights: &[f64],
) -> (PayoutCurve, Vec<u64>) {
    if !weights.is_empty() {
        let positions = winners.min(weights.len());
        return (
            PayoutCurve::Weighted,
            weighted_amounts(pool, &weights[..positions], settings.minimum_prize),
        );
    }
    let positions = winners.min(settings.payout_positions);
    match hyperbolic_amounts(pool, positions, settings) {
        Some(amounts) => (PayoutCurve::Hyperbolic, amounts),
        None => (PayoutCurve::FixedShare, fixed_share_amounts(pool, positions)),
    }
}

/// Assign payouts to a final ranking.
pub fn distribute(
    pool: u64,
    ranking: &[RankedEntry],
    settings: &PrizeSettings,
    weights: &[f64],
) -> PrizeDistribution {
    let (curve, amounts) = payout_amounts(pool, ranking.len(), settings, weights);
    let awards: Vec<PrizeAward> = ranking
        .iter()
        .zip(amounts)
        .map(|(entry, amount)| PrizeAward {
            rank: entry.rank,
            participant_id: entry.participant_id.clone(),
            amount,
        })
        .collect();
    let awarded: u64 = awards.iter().map(|award| award.amount).sum();
    PrizeDistribution {
        prize_pool: pool,
        curve,
        awards,
        undistributed: pool - awarded,
    }
}

/// Project payouts for `participant_count` entrants paying `entry_fee` each.
pub fn preview(
    participant_count: u32,
    entry_fee: u64,
    settings: &PrizeSettings,
    weights: &[f64],
) -> PrizePreview {
    let (contribution, revenue) = split_entry_fee(entry_fee, settings.pool_contribution_bps);
    let prize_pool = contribution.saturating_mul(participant_count as u64);
    let platform_revenue = revenue.saturating_mul(participant_count as u64);
    let (curve, amounts) = payout_amounts(prize_pool, participant_count as usize, settings, weights);
    PrizePreview {
        participant_count,
        prize_pool,
        platform_revenue,
        curve,
        amounts,
    }
}
