/// Basis-point denominator (10_000 bps = 100%).
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Maximum number of paid positions on any payout curve.
pub const MAX_PAYOUT_POSITIONS: usize = 5;

/// Share of the pool awarded to first place on the hyperbolic curve.
pub const DEFAULT_WINNER_SHARE_BPS: u16 = 5_000;

/// Smallest winner share that keeps the hyperbolic curve non-increasing.
pub const MIN_WINNER_SHARE_BPS: u16 = 5_000;

/// Per-position floor on the hyperbolic curve (smallest currency unit).
pub const DEFAULT_MINIMUM_PRIZE: u64 = 100;

/// Fraction of each entry fee credited to the prize pool (the rest is platform revenue).
pub const DEFAULT_POOL_CONTRIBUTION_BPS: u16 = 9_000;

/// Fixed shares (percent) used when the hyperbolic minimums cannot be funded.
///
/// These sum to 115 and are normalised over the paid positions before use.
pub const FALLBACK_SHARES_PERCENT: [u64; MAX_PAYOUT_POSITIONS] = [50, 30, 20, 10, 5];

/// Least common multiple of 1..=5, used to express `1/k` weights as integers.
pub const HYPERBOLIC_WEIGHT_SCALE: u64 = 60;

/// Tolerance applied when checking that prize weights sum to at most 1.
pub const PRIZE_WEIGHT_TOLERANCE: f64 = 1e-9;

/// Upper bound on participants per tournament.
pub const MAX_PARTICIPANTS: u32 = 1_000_000;

/// Maximum accepted score.
pub const MAX_SCORE: u64 = 1_000_000_000_000;

/// Maximum opaque metadata length attached to a score submission.
pub const MAX_METADATA_LENGTH: usize = 1_024;

/// Maximum game identifier length.
pub const MAX_GAME_ID_LENGTH: usize = 64;

/// Maximum participant identifier length.
pub const MAX_PARTICIPANT_ID_LENGTH: usize = 128;

/// Milliseconds per day.
pub const DAY_MS: u64 = 86_400_000;

/// Milliseconds per week.
pub const WEEK_MS: u64 = 7 * DAY_MS;
