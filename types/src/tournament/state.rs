use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};

use super::{NaturalKey, ParticipantId, TournamentConfig, TournamentId};

/// Tournament cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentKind {
    Daily,
    Weekly,
    Monthly,
    Seasonal,
    Custom,
}

impl TournamentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Seasonal => "seasonal",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for TournamentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tournament lifecycle status.
///
/// Ordered `Scheduled < Active < Ended`; a tournament's status never decreases.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    #[default]
    Scheduled,
    Active,
    Ended,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }

    /// Whether `self -> next` is a legal transition.
    ///
    /// `Scheduled -> Ended` is the cancellation path; everything else must advance one step.
    pub fn can_transition_to(self, next: TournamentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Scheduled, Self::Active)
                | (Self::Active, Self::Ended)
                | (Self::Scheduled, Self::Ended)
        )
    }

    pub fn is_joinable(self) -> bool {
        self != Self::Ended
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tournament record. Owned and mutated exclusively by the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub kind: TournamentKind,
    pub game_id: String,
    pub status: TournamentStatus,
    pub start_at_ms: u64,
    pub end_at_ms: u64,
    pub entry_fee: u64,
    pub max_participants: u32,
    pub participants: BTreeSet<ParticipantId>,
    /// Accumulated pool; grows with each join and is frozen once `Ended`.
    pub prize_pool: u64,
    /// Cumulative house take from entry fees.
    pub platform_revenue: u64,
    pub prize_weights: Vec<f64>,
    pub created_at_ms: u64,
    pub ended_at_ms: Option<u64>,
}

impl Tournament {
    pub fn new(id: TournamentId, config: TournamentConfig, created_at_ms: u64) -> Self {
        Self {
            id,
            kind: config.kind,
            game_id: config.game_id,
            status: TournamentStatus::Scheduled,
            start_at_ms: config.start_at_ms,
            end_at_ms: config.end_at_ms,
            entry_fee: config.entry_fee,
            max_participants: config.max_participants,
            participants: BTreeSet::new(),
            prize_pool: 0,
            platform_revenue: 0,
            prize_weights: config.prize_weights,
            created_at_ms,
            ended_at_ms: None,
        }
    }

    /// The creation parameters this tournament was built from.
    pub fn config(&self) -> TournamentConfig {
        TournamentConfig {
            kind: self.kind,
            game_id: self.game_id.clone(),
            start_at_ms: self.start_at_ms,
            end_at_ms: self.end_at_ms,
            entry_fee: self.entry_fee,
            max_participants: self.max_participants,
            prize_weights: self.prize_weights.clone(),
        }
    }

    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            kind: self.kind,
            game_id: self.game_id.clone(),
            start_at_ms: self.start_at_ms,
        }
    }

    pub fn contains_participant(&self, participant: &str) -> bool {
        self.participants.contains(participant)
    }

    /// Add a participant.
    /// Returns true if the participant was added, false if they were already present.
    pub fn add_participant(&mut self, participant: ParticipantId) -> bool {
        self.participants.insert(participant)
    }

    pub fn participant_count(&self) -> u32 {
        self.participants.len() as u32
    }

    pub fn is_full(&self) -> bool {
        self.participant_count() >= self.max_participants
    }

    /// Status the wall clock says this tournament should be in.
    pub fn due_status(&self, now_ms: u64) -> TournamentStatus {
        if now_ms >= self.end_at_ms {
            TournamentStatus::Ended
        } else if now_ms >= self.start_at_ms {
            TournamentStatus::Active
        } else {
            TournamentStatus::Scheduled
        }
    }

    /// Milliseconds until the next boundary: start while scheduled, end while active.
    pub fn time_remaining_ms(&self, now_ms: u64) -> u64 {
        match self.status {
            TournamentStatus::Scheduled => self.start_at_ms.saturating_sub(now_ms),
            TournamentStatus::Active => self.end_at_ms.saturating_sub(now_ms),
            TournamentStatus::Ended => 0,
        }
    }

    pub fn info(&self, now_ms: u64) -> TournamentInfo {
        TournamentInfo {
            id: self.id,
            status: self.status,
            time_remaining_ms: self.time_remaining_ms(now_ms),
            prize_pool: self.prize_pool,
            participant_count: self.participant_count(),
        }
    }
}

/// Summary returned by `GetTournamentInfo`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentInfo {
    pub id: TournamentId,
    pub status: TournamentStatus,
    pub time_remaining_ms: u64,
    pub prize_pool: u64,
    pub participant_count: u32,
}

/// Outcome of a successful join.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinReceipt {
    pub tournament_id: TournamentId,
    pub participant_count: u32,
    pub prize_pool: u64,
    /// Portion of the fee credited to the pool.
    pub pool_contribution: u64,
    /// Portion of the fee kept as platform revenue.
    pub platform_revenue: u64,
}

/// Result of a status transition attempt that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The status moved from `from` to the requested status.
    Applied { from: TournamentStatus },
    /// The tournament was already in the requested status; nothing changed.
    Unchanged,
}

impl Transition {
    pub fn applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}
