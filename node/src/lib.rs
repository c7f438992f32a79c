//! Podium node.
//!
//! Hosts a [`service::TournamentService`] on a tokio runtime, drives time-based transitions with
//! a [`scheduler::Scheduler`] and fans lifecycle events out through a
//! [`dispatcher::Dispatcher`].

use serde::{Deserialize, Serialize};
use std::{num::NonZeroUsize, str::FromStr, time::Duration};
use thiserror::Error;
use tracing::Level;

use podium_execution::StoreSettings;
use podium_types::{ConfigError, PrizeSettings, BPS_DENOMINATOR};

mod backoff;
pub mod clock;
pub mod defaults;
pub mod dispatcher;
pub mod recurring;
pub mod scheduler;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatcher::{DeliveryPolicy, Dispatcher, EventSink, LogSink};
pub use recurring::RecurringTemplate;
pub use scheduler::Scheduler;
pub use service::TournamentService;

/// Configuration for the node, loaded from YAML.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,

    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    #[serde(default = "default_min_tournament_duration_ms")]
    pub min_tournament_duration_ms: u64,
    #[serde(default = "default_archive_retention_ms")]
    pub archive_retention_ms: u64,
    #[serde(default = "default_recurring_interval_ms")]
    pub recurring_interval_ms: u64,

    #[serde(default = "default_pool_contribution_bps")]
    pub pool_contribution_bps: u16,
    #[serde(default = "default_winner_share_bps")]
    pub winner_share_bps: u16,
    #[serde(default = "default_minimum_prize")]
    pub minimum_prize: u64,
    #[serde(default = "default_payout_positions")]
    pub payout_positions: usize,

    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    #[serde(default = "default_delivery_attempts")]
    pub delivery_attempts: u32,
    #[serde(default = "default_delivery_backoff_ms")]
    pub delivery_backoff_ms: u64,

    #[serde(default)]
    pub recurring: Vec<RecurringTemplate>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            sweep_interval_ms: default_sweep_interval_ms(),
            min_tournament_duration_ms: default_min_tournament_duration_ms(),
            archive_retention_ms: default_archive_retention_ms(),
            recurring_interval_ms: default_recurring_interval_ms(),
            pool_contribution_bps: default_pool_contribution_bps(),
            winner_share_bps: default_winner_share_bps(),
            minimum_prize: default_minimum_prize(),
            payout_positions: default_payout_positions(),
            event_buffer: default_event_buffer(),
            delivery_attempts: default_delivery_attempts(),
            delivery_backoff_ms: default_delivery_backoff_ms(),
            recurring: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum NodeConfigError {
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
    #[error("{field} must be at most {max} bps (got {value})")]
    InvalidBps {
        field: &'static str,
        value: u16,
        max: u64,
    },
    #[error("invalid prize settings: {0}")]
    InvalidPrize(#[from] ConfigError),
    #[error(
        "sweep_interval_ms must not exceed min_tournament_duration_ms (sweep={sweep_interval_ms}, min={min_tournament_duration_ms})"
    )]
    SweepTooSlow {
        sweep_interval_ms: u64,
        min_tournament_duration_ms: u64,
    },
    #[error("recurring template {index} is invalid: {reason}")]
    InvalidTemplate { index: usize, reason: String },
}

#[derive(Debug)]
pub struct ValidatedConfig {
    pub log_level: Level,
    pub json_logs: bool,
    pub sweep_interval: Duration,
    pub recurring_interval: Duration,
    pub archive_retention_ms: u64,
    pub store: StoreSettings,
    pub prize: PrizeSettings,
    pub event_buffer: NonZeroUsize,
    pub delivery: DeliveryPolicy,
    pub recurring: Vec<RecurringTemplate>,
}

fn default_log_level() -> String {
    defaults::DEFAULT_LOG_LEVEL.to_string()
}

fn default_sweep_interval_ms() -> u64 {
    defaults::DEFAULT_SWEEP_INTERVAL_MS
}

fn default_min_tournament_duration_ms() -> u64 {
    defaults::DEFAULT_MIN_TOURNAMENT_DURATION_MS
}

fn default_archive_retention_ms() -> u64 {
    defaults::DEFAULT_ARCHIVE_RETENTION_MS
}

fn default_recurring_interval_ms() -> u64 {
    defaults::DEFAULT_RECURRING_INTERVAL_MS
}

fn default_pool_contribution_bps() -> u16 {
    defaults::DEFAULT_POOL_CONTRIBUTION
}

fn default_winner_share_bps() -> u16 {
    defaults::DEFAULT_WINNER_SHARE
}

fn default_minimum_prize() -> u64 {
    defaults::DEFAULT_MINIMUM
}

fn default_payout_positions() -> usize {
    defaults::DEFAULT_PAYOUT_POSITIONS
}

fn default_event_buffer() -> usize {
    defaults::DEFAULT_EVENT_BUFFER
}

fn default_delivery_attempts() -> u32 {
    defaults::DEFAULT_DELIVERY_ATTEMPTS
}

fn default_delivery_backoff_ms() -> u64 {
    defaults::DEFAULT_DELIVERY_BACKOFF_MS
}

fn ensure_nonzero(field: &'static str, value: u64) -> Result<(), NodeConfigError> {
    if value == 0 {
        return Err(NodeConfigError::InvalidNonZero { field, value });
    }
    Ok(())
}

impl Config {
    pub fn validate(self) -> Result<ValidatedConfig, NodeConfigError> {
        ensure_nonzero("sweep_interval_ms", self.sweep_interval_ms)?;
        ensure_nonzero("min_tournament_duration_ms", self.min_tournament_duration_ms)?;
        ensure_nonzero("recurring_interval_ms", self.recurring_interval_ms)?;
        ensure_nonzero("delivery_attempts", self.delivery_attempts as u64)?;
        ensure_nonzero("delivery_backoff_ms", self.delivery_backoff_ms)?;
        let event_buffer = NonZeroUsize::new(self.event_buffer).ok_or(
            NodeConfigError::InvalidNonZero {
                field: "event_buffer",
                value: 0,
            },
        )?;

        // A sweep slower than the shortest tournament could skip its whole window.
        if self.sweep_interval_ms > self.min_tournament_duration_ms {
            return Err(NodeConfigError::SweepTooSlow {
                sweep_interval_ms: self.sweep_interval_ms,
                min_tournament_duration_ms: self.min_tournament_duration_ms,
            });
        }

        if self.pool_contribution_bps as u64 > BPS_DENOMINATOR {
            return Err(NodeConfigError::InvalidBps {
                field: "pool_contribution_bps",
                value: self.pool_contribution_bps,
                max: BPS_DENOMINATOR,
            });
        }
        let prize = PrizeSettings {
            winner_share_bps: self.winner_share_bps,
            minimum_prize: self.minimum_prize,
            payout_positions: self.payout_positions,
            pool_contribution_bps: self.pool_contribution_bps,
        };
        prize.validate()?;

        for (index, template) in self.recurring.iter().enumerate() {
            template
                .validate(self.min_tournament_duration_ms)
                .map_err(|reason| NodeConfigError::InvalidTemplate { index, reason })?;
        }

        let log_level =
            Level::from_str(&self.log_level).map_err(|_| NodeConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        Ok(ValidatedConfig {
            log_level,
            json_logs: self.json_logs,
            sweep_interval: Duration::from_millis(self.sweep_interval_ms),
            recurring_interval: Duration::from_millis(self.recurring_interval_ms),
            archive_retention_ms: self.archive_retention_ms,
            store: StoreSettings {
                min_duration_ms: self.min_tournament_duration_ms,
                pool_contribution_bps: self.pool_contribution_bps,
            },
            prize,
            event_buffer,
            delivery: DeliveryPolicy {
                attempts: self.delivery_attempts,
                backoff: Duration::from_millis(self.delivery_backoff_ms),
            },
            recurring: self.recurring,
        })
    }
}
