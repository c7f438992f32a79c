//! Default tunables for [`crate::Config`].

use podium_types::{
    DAY_MS, DEFAULT_MINIMUM_PRIZE, DEFAULT_POOL_CONTRIBUTION_BPS, DEFAULT_WINNER_SHARE_BPS,
    MAX_PAYOUT_POSITIONS,
};

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_MIN_TOURNAMENT_DURATION_MS: u64 = 60_000;
pub const DEFAULT_ARCHIVE_RETENTION_MS: u64 = DAY_MS;
pub const DEFAULT_RECURRING_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_POOL_CONTRIBUTION: u16 = DEFAULT_POOL_CONTRIBUTION_BPS;
pub const DEFAULT_WINNER_SHARE: u16 = DEFAULT_WINNER_SHARE_BPS;
pub const DEFAULT_MINIMUM: u64 = DEFAULT_MINIMUM_PRIZE;
pub const DEFAULT_PAYOUT_POSITIONS: usize = MAX_PAYOUT_POSITIONS;
pub const DEFAULT_EVENT_BUFFER: usize = 1_024;
pub const DEFAULT_DELIVERY_ATTEMPTS: u32 = 3;
pub const DEFAULT_DELIVERY_BACKOFF_MS: u64 = 200;
