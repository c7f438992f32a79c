//! Per-tournament best-score ledger.
//!
//! Each tournament has a board of participant slots. A slot is a `Mutex<ScoreEntry>` holding
//! the participant's best accepted score, so read-modify-write on one participant never blocks
//! another. Ranks are computed on demand: `1 + |entries strictly ahead|` under the order
//! `(score desc, submitted_at asc, sequence asc)`.
//!
//! The ledger does not know tournament status. Callers check it under the tournament lock
//! before submitting; once [`ScoreLedger::freeze`] has captured a final ranking the board
//! refuses further submissions on its own.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, OnceLock, RwLock,
    },
};

use podium_types::{
    rank_entries, validate_submission, LookupError, ParticipantId, RankedEntry, ScoreEntry,
    ScoreError, SubmitResult, TournamentId, TournamentStatus,
};

use crate::{lock, read, write};

#[derive(Default)]
struct Board {
    slots: RwLock<HashMap<ParticipantId, Mutex<ScoreEntry>>>,
    final_ranking: OnceLock<Vec<RankedEntry>>,
}

impl Board {
    fn snapshot(&self) -> Vec<ScoreEntry> {
        read(&self.slots)
            .values()
            .map(|slot| lock(slot).clone())
            .collect()
    }

    fn rank_of(&self, best: &ScoreEntry) -> u32 {
        // One slot lock at a time; never while holding the submitter's own slot.
        let ahead = read(&self.slots)
            .iter()
            .filter(|(participant, _)| **participant != best.participant_id)
            .filter(|(_, slot)| lock(slot).ranks_ahead_of(best))
            .count();
        ahead as u32 + 1
    }
}

#[derive(Default)]
pub struct ScoreLedger {
    boards: RwLock<HashMap<TournamentId, Arc<Board>>>,
    sequence: AtomicU64,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn board(&self, tournament_id: TournamentId) -> Option<Arc<Board>> {
        read(&self.boards).get(&tournament_id).cloned()
    }

    /// Register an empty board. Opening an existing board leaves it untouched.
    pub fn open(&self, tournament_id: TournamentId) {
        write(&self.boards).entry(tournament_id).or_default();
    }

    /// Record a score, keeping only the participant's best.
    ///
    /// Scores not strictly above the stored best are accepted as no-ops and report the
    /// participant's current rank.
    pub fn submit(
        &self,
        tournament_id: TournamentId,
        participant_id: &str,
        score: u64,
        metadata: &str,
        now_ms: u64,
    ) -> Result<SubmitResult, ScoreError> {
        validate_submission(score, metadata)?;
        let board = self
            .board(tournament_id)
            .ok_or(ScoreError::NotFound(tournament_id))?;
        if board.final_ranking.get().is_some() {
            return Err(ScoreError::TournamentNotActive {
                id: tournament_id,
                status: TournamentStatus::Ended,
            });
        }

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let candidate = ScoreEntry {
            tournament_id,
            participant_id: participant_id.to_string(),
            score,
            submitted_at_ms: now_ms,
            sequence,
            metadata: metadata.to_string(),
        };

        let (best, is_new_best) = {
            let slots = read(&board.slots);
            match slots.get(participant_id) {
                Some(slot) => Self::offer(&mut lock(slot), candidate),
                None => {
                    drop(slots);
                    let mut slots = write(&board.slots);
                    match slots.get_mut(participant_id) {
                        // Lost the race to insert; fall back to the compare path.
                        Some(slot) => Self::offer(
                            slot.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner()),
                            candidate,
                        ),
                        None => {
                            slots.insert(
                                candidate.participant_id.clone(),
                                Mutex::new(candidate.clone()),
                            );
                            (candidate, true)
                        }
                    }
                }
            }
        };

        let rank = board.rank_of(&best);
        tracing::debug!(
            tournament_id,
            participant = participant_id,
            score,
            best = best.score,
            rank,
            is_new_best,
            "score submitted"
        );
        Ok(SubmitResult {
            accepted: true,
            rank,
            is_new_best,
        })
    }

    fn offer(stored: &mut ScoreEntry, candidate: ScoreEntry) -> (ScoreEntry, bool) {
        if candidate.score > stored.score {
            *stored = candidate;
            (stored.clone(), true)
        } else {
            (stored.clone(), false)
        }
    }

    /// Current leaderboard, or the frozen ranking once the tournament has settled.
    ///
    /// `limit = 0` returns every entry.
    pub fn leaderboard(
        &self,
        tournament_id: TournamentId,
        limit: usize,
    ) -> Result<Vec<RankedEntry>, LookupError> {
        let board = self
            .board(tournament_id)
            .ok_or(LookupError::NotFound(tournament_id))?;
        let mut ranking = match board.final_ranking.get() {
            Some(frozen) => frozen.clone(),
            None => rank_entries(board.snapshot()),
        };
        if limit > 0 {
            ranking.truncate(limit);
        }
        Ok(ranking)
    }

    pub fn participant_best(
        &self,
        tournament_id: TournamentId,
        participant_id: &str,
    ) -> Option<ScoreEntry> {
        let board = self.board(tournament_id)?;
        let slots = read(&board.slots);
        slots.get(participant_id).map(|slot| lock(slot).clone())
    }

    /// Capture the final ranking. Only the first call snapshots; later calls return the same
    /// ranking. An unknown tournament has no ranking and gets an empty one without a board being
    /// created for it.
    pub fn freeze(&self, tournament_id: TournamentId) -> Vec<RankedEntry> {
        match self.board(tournament_id) {
            Some(board) => board
                .final_ranking
                .get_or_init(|| rank_entries(board.snapshot()))
                .clone(),
            None => Vec::new(),
        }
    }

    /// Freeze the board and drop its per-participant slots, keeping only the final ranking.
    /// Returns false for an unknown tournament.
    pub fn compact(&self, tournament_id: TournamentId) -> bool {
        let Some(board) = self.board(tournament_id) else {
            return false;
        };
        self.freeze(tournament_id);
        let mut slots = write(&board.slots);
        let released = slots.len();
        slots.clear();
        slots.shrink_to_fit();
        tracing::debug!(tournament_id, released, "ledger board compacted");
        true
    }

    pub fn board_count(&self) -> usize {
        read(&self.boards).len()
    }

    pub fn final_ranking(&self, tournament_id: TournamentId) -> Option<Vec<RankedEntry>> {
        self.board(tournament_id)?
            .final_ranking
            .get()
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> ScoreLedger {
        let ledger = ScoreLedger::new();
        ledger.open(1);
        ledger
    }

    fn order(ranking: &[RankedEntry]) -> Vec<&str> {
        ranking.iter().map(|r| r.participant_id.as_str()).collect()
    }

    #[test]
    fn test_first_submission_is_new_best() {
        let ledger = ledger();
        let result = ledger.submit(1, "alice", 100, "", 10).unwrap();
        assert_eq!(
            result,
            SubmitResult {
                accepted: true,
                rank: 1,
                is_new_best: true
            }
        );
    }

    #[test]
    fn test_lower_or_equal_score_is_noop() {
        let ledger = ledger();
        ledger.submit(1, "alice", 300, "first", 10).unwrap();
        ledger.submit(1, "bob", 200, "", 11).unwrap();

        for score in [300, 299, 0] {
            let result = ledger.submit(1, "alice", score, "retry", 50).unwrap();
            assert!(result.accepted);
            assert!(!result.is_new_best);
            assert_eq!(result.rank, 1);
        }
        let best = ledger.participant_best(1, "alice").unwrap();
        assert_eq!(best.score, 300);
        assert_eq!(best.submitted_at_ms, 10);
        assert_eq!(best.metadata, "first");
    }

    #[test]
    fn test_higher_score_replaces_best() {
        let ledger = ledger();
        ledger.submit(1, "alice", 100, "", 10).unwrap();
        ledger.submit(1, "bob", 200, "", 11).unwrap();
        let result = ledger.submit(1, "alice", 250, "", 12).unwrap();
        assert!(result.is_new_best);
        assert_eq!(result.rank, 1);
        assert_eq!(ledger.participant_best(1, "alice").unwrap().submitted_at_ms, 12);
    }

    #[test]
    fn test_ties_go_to_earlier_submission() {
        let ledger = ledger();
        ledger.submit(1, "a", 100, "", 1).unwrap();
        ledger.submit(1, "b", 300, "", 2).unwrap();
        let c = ledger.submit(1, "c", 300, "", 3).unwrap();
        assert_eq!(c.rank, 2);

        let board = ledger.leaderboard(1, 0).unwrap();
        assert_eq!(order(&board), vec!["b", "c", "a"]);
        // Stable across repeated reads.
        assert_eq!(ledger.leaderboard(1, 0).unwrap(), board);
        assert_eq!(order(&ledger.leaderboard(1, 2).unwrap()), vec!["b", "c"]);
    }

    #[test]
    fn test_same_timestamp_ties_use_arrival_order() {
        let ledger = ledger();
        ledger.submit(1, "x", 500, "", 7).unwrap();
        ledger.submit(1, "y", 500, "", 7).unwrap();
        assert_eq!(order(&ledger.leaderboard(1, 0).unwrap()), vec!["x", "y"]);
    }

    #[test]
    fn test_invalid_score_rejected() {
        let ledger = ledger();
        assert!(matches!(
            ledger.submit(1, "alice", u64::MAX, "", 0),
            Err(ScoreError::InvalidScore { .. })
        ));
        assert!(ledger.participant_best(1, "alice").is_none());
    }

    #[test]
    fn test_unknown_board() {
        let ledger = ScoreLedger::new();
        assert_eq!(
            ledger.submit(9, "alice", 1, "", 0),
            Err(ScoreError::NotFound(9))
        );
        assert_eq!(ledger.leaderboard(9, 10), Err(LookupError::NotFound(9)));
    }

    #[test]
    fn test_freeze_is_immutable() {
        let ledger = ledger();
        ledger.submit(1, "a", 10, "", 1).unwrap();
        ledger.submit(1, "b", 20, "", 2).unwrap();

        let frozen = ledger.freeze(1);
        assert_eq!(order(&frozen), vec!["b", "a"]);
        assert!(matches!(
            ledger.submit(1, "a", 99, "", 3),
            Err(ScoreError::TournamentNotActive { .. })
        ));
        assert_eq!(ledger.freeze(1), frozen);
        assert_eq!(ledger.final_ranking(1), Some(frozen.clone()));
        assert_eq!(ledger.leaderboard(1, 0).unwrap(), frozen);
    }

    #[test]
    fn test_freeze_without_scores() {
        let ledger = ledger();
        assert!(ledger.final_ranking(1).is_none());
        assert!(ledger.freeze(1).is_empty());
        assert_eq!(ledger.final_ranking(1), Some(Vec::new()));
    }

    #[test]
    fn test_freeze_unknown_board_creates_nothing() {
        let ledger = ScoreLedger::new();
        assert!(ledger.freeze(5).is_empty());
        assert!(ledger.final_ranking(5).is_none());
        assert_eq!(ledger.board_count(), 0);
    }

    #[test]
    fn test_compact_keeps_final_ranking() {
        let ledger = ledger();
        ledger.submit(1, "a", 10, "", 1).unwrap();
        ledger.submit(1, "b", 20, "", 2).unwrap();

        assert!(ledger.compact(1));
        assert!(ledger.participant_best(1, "a").is_none());
        let ranking = ledger.leaderboard(1, 0).unwrap();
        assert_eq!(order(&ranking), vec!["b", "a"]);
        assert_eq!(ledger.final_ranking(1), Some(ranking));
        assert!(!ledger.compact(2));
    }
}
