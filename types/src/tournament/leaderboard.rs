use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{ParticipantId, ScoreError, TournamentId, MAX_METADATA_LENGTH, MAX_SCORE};

/// A participant's best accepted score in a tournament.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub tournament_id: TournamentId,
    pub participant_id: ParticipantId,
    pub score: u64,
    pub submitted_at_ms: u64,
    /// Ledger-wide arrival order, breaks ties between equal timestamps.
    pub sequence: u64,
    pub metadata: String,
}

impl ScoreEntry {
    /// Leaderboard order: higher score first, then earlier submission, then earlier arrival.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then(self.submitted_at_ms.cmp(&other.submitted_at_ms))
            .then(self.sequence.cmp(&other.sequence))
    }

    pub fn ranks_ahead_of(&self, other: &Self) -> bool {
        self.rank_cmp(other) == Ordering::Less
    }
}

/// Leaderboard row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: u32,
    pub participant_id: ParticipantId,
    pub score: u64,
    pub submitted_at_ms: u64,
}

/// Outcome of an accepted score submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResult {
    pub accepted: bool,
    pub rank: u32,
    pub is_new_best: bool,
}

/// Sort entries into leaderboard order and assign 1-based ranks.
pub fn rank_entries(mut entries: Vec<ScoreEntry>) -> Vec<RankedEntry> {
    entries.sort_by(ScoreEntry::rank_cmp);
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| RankedEntry {
            rank: (i + 1) as u32,
            participant_id: entry.participant_id,
            score: entry.score,
            submitted_at_ms: entry.submitted_at_ms,
        })
        .collect()
}

/// Reject scores and metadata outside the accepted bounds.
pub fn validate_submission(score: u64, metadata: &str) -> Result<(), ScoreError> {
    if score > MAX_SCORE {
        return Err(ScoreError::InvalidScore {
            reason: "score exceeds maximum",
        });
    }
    if metadata.len() > MAX_METADATA_LENGTH {
        return Err(ScoreError::InvalidScore {
            reason: "metadata too long",
        });
    }
    Ok(())
}
