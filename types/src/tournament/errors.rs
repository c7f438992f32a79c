use thiserror::Error;

use super::{ParticipantId, TournamentId, TournamentStatus};

/// Malformed tournament or prize parameters. Rejected before any state is touched.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("start_at must be before end_at (start_at={start_at_ms}, end_at={end_at_ms})")]
    InvalidWindow { start_at_ms: u64, end_at_ms: u64 },
    #[error("tournament too short (duration={duration_ms}ms, min={min_ms}ms)")]
    DurationTooShort { duration_ms: u64, min_ms: u64 },
    #[error("max_participants must be between 1 and {max} (got {value})")]
    InvalidMaxParticipants { value: u32, max: u32 },
    #[error("game_id must be 1..={max} bytes (len={len})")]
    InvalidGameId { len: usize, max: usize },
    #[error("prize weights must sum to at most 1 (sum={sum})")]
    PrizeWeightsExceedPool { sum: f64 },
    #[error("prize weight at position {index} must be a finite non-negative number")]
    InvalidPrizeWeight { index: usize },
    #[error("prize weights must not increase with rank (position {index} exceeds the one before)")]
    PrizeWeightsIncreasing { index: usize },
    #[error("at most {max} prize weights are allowed (got {len})")]
    TooManyPrizeWeights { len: usize, max: usize },
    #[error("{field} must be within {min}..={max} bps (got {value})")]
    InvalidBps {
        field: &'static str,
        value: u16,
        min: u16,
        max: u16,
    },
    #[error("payout_positions must be between 1 and {max} (got {value})")]
    InvalidPayoutPositions { value: usize, max: usize },
    #[error("tournament {existing} already uses this kind, game_id and start_at with a different config")]
    DuplicateNaturalKey { existing: TournamentId },
}

/// Lookup of an unknown tournament id.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("tournament {0} not found")]
    NotFound(TournamentId),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("tournament {0} not found")]
    NotFound(TournamentId),
    #[error("too late to join: tournament {id} has ended")]
    NotJoinable {
        id: TournamentId,
        status: TournamentStatus,
    },
    #[error("already entered tournament {id}")]
    AlreadyJoined {
        id: TournamentId,
        participant_id: ParticipantId,
    },
    #[error("tournament full ({max} participants)")]
    Full { id: TournamentId, max: u32 },
    #[error("entry fee not covered (required={required}, paid={paid})")]
    InsufficientFee { required: u64, paid: u64 },
    #[error("participant id must be 1..={max} bytes (len={len})")]
    InvalidParticipant { len: usize, max: usize },
}

impl From<LookupError> for JoinError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound(id) => Self::NotFound(id),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ScoreError {
    #[error("tournament {0} not found")]
    NotFound(TournamentId),
    #[error("tournament {id} is not accepting scores ({status})")]
    TournamentNotActive {
        id: TournamentId,
        status: TournamentStatus,
    },
    #[error("not entered in tournament {id}")]
    NotAParticipant {
        id: TournamentId,
        participant_id: ParticipantId,
    },
    #[error("invalid score: {reason}")]
    InvalidScore { reason: &'static str },
}

impl From<LookupError> for ScoreError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound(id) => Self::NotFound(id),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("tournament {0} not found")]
    NotFound(TournamentId),
    #[error("tournament {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: TournamentId,
        from: TournamentStatus,
        to: TournamentStatus,
    },
}

impl From<LookupError> for TransitionError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound(id) => Self::NotFound(id),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SettlementError {
    #[error("tournament {0} not found")]
    NotFound(TournamentId),
    #[error("tournament {id} has not ended ({status})")]
    NotEnded {
        id: TournamentId,
        status: TournamentStatus,
    },
}

impl From<LookupError> for SettlementError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound(id) => Self::NotFound(id),
        }
    }
}
