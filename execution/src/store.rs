//! Tournament registry and lifecycle state machine.
//!
//! The store is the only writer of [`Tournament`] records. Tournaments live in one of two
//! partitions: `active` (anything the scheduler may still need to look at) and `history`
//! (ended tournaments past their retention window). Lookups consult both.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
};

use podium_types::{
    prize::split_entry_fee, ConfigError, JoinError, JoinReceipt, LookupError, NaturalKey,
    ParticipantId, Tournament, TournamentConfig, TournamentId, TournamentStatus, Transition,
    TransitionError, DEFAULT_POOL_CONTRIBUTION_BPS, MAX_PARTICIPANT_ID_LENGTH,
};

use crate::{read, write};

type Slot = Arc<RwLock<Tournament>>;

/// Store-wide parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreSettings {
    /// Shortest tournament `create` accepts.
    pub min_duration_ms: u64,
    /// Share of each entry fee credited to the pool.
    pub pool_contribution_bps: u16,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            min_duration_ms: 0,
            pool_contribution_bps: DEFAULT_POOL_CONTRIBUTION_BPS,
        }
    }
}

/// Result of `create`.
#[derive(Clone, Debug, PartialEq)]
pub struct Created {
    pub tournament: Tournament,
    /// False when a tournament with the same natural key already existed.
    pub created: bool,
}

#[derive(Default)]
struct Registry {
    active: HashMap<TournamentId, Slot>,
    history: HashMap<TournamentId, Slot>,
    keys: HashMap<NaturalKey, TournamentId>,
}

impl Registry {
    fn slot(&self, id: TournamentId) -> Option<Slot> {
        self.active
            .get(&id)
            .or_else(|| self.history.get(&id))
            .cloned()
    }
}

pub struct TournamentStore {
    settings: StoreSettings,
    next_id: AtomicU64,
    registry: RwLock<Registry>,
}

impl TournamentStore {
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            settings,
            next_id: AtomicU64::new(1),
            registry: RwLock::new(Registry::default()),
        }
    }

    pub fn settings(&self) -> StoreSettings {
        self.settings
    }

    fn slot(&self, id: TournamentId) -> Result<Slot, LookupError> {
        read(&self.registry)
            .slot(id)
            .ok_or(LookupError::NotFound(id))
    }

    /// Validate `config` and register a new scheduled tournament.
    ///
    /// If a tournament with the same natural key and the same config exists, it is returned
    /// unchanged with `created = false`. The same key with a different config is rejected with
    /// `DuplicateNaturalKey`.
    pub fn create(&self, config: TournamentConfig, now_ms: u64) -> Result<Created, ConfigError> {
        config.validate(self.settings.min_duration_ms)?;
        let key = config.natural_key();

        let mut registry = write(&self.registry);
        if let Some(existing) = registry.keys.get(&key).and_then(|id| registry.slot(*id)) {
            let tournament = read(&existing).clone();
            if tournament.config() != config {
                return Err(ConfigError::DuplicateNaturalKey {
                    existing: tournament.id,
                });
            }
            return Ok(Created {
                tournament,
                created: false,
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let tournament = Tournament::new(id, config, now_ms);
        registry.keys.insert(key, id);
        registry
            .active
            .insert(id, Arc::new(RwLock::new(tournament.clone())));
        drop(registry);

        tracing::info!(
            tournament_id = id,
            kind = %tournament.kind,
            game_id = %tournament.game_id,
            start_at_ms = tournament.start_at_ms,
            end_at_ms = tournament.end_at_ms,
            entry_fee = tournament.entry_fee,
            max_participants = tournament.max_participants,
            "tournament created"
        );
        Ok(Created {
            tournament,
            created: true,
        })
    }

    /// Snapshot of a tournament.
    pub fn get(&self, id: TournamentId) -> Result<Tournament, LookupError> {
        self.with_tournament(id, Tournament::clone)
    }

    /// Run `f` against a tournament while holding its read lock.
    ///
    /// Transitions and joins on the same tournament wait until `f` returns, so a status observed
    /// inside `f` stays current for its whole duration.
    pub fn with_tournament<R>(
        &self,
        id: TournamentId,
        f: impl FnOnce(&Tournament) -> R,
    ) -> Result<R, LookupError> {
        let slot = self.slot(id)?;
        let tournament = read(&slot);
        Ok(f(&tournament))
    }

    pub fn find_by_natural_key(&self, key: &NaturalKey) -> Option<TournamentId> {
        read(&self.registry).keys.get(key).copied()
    }

    /// Admit a participant.
    ///
    /// Checks run in order: unknown id, ended, duplicate, capacity, fee. Only the configured
    /// fraction of the entry fee reaches the pool; any overpayment is ignored.
    pub fn join(
        &self,
        id: TournamentId,
        participant_id: &str,
        paid_fee: u64,
    ) -> Result<JoinReceipt, JoinError> {
        if participant_id.is_empty() || participant_id.len() > MAX_PARTICIPANT_ID_LENGTH {
            return Err(JoinError::InvalidParticipant {
                len: participant_id.len(),
                max: MAX_PARTICIPANT_ID_LENGTH,
            });
        }
        let slot = self.slot(id)?;
        let mut tournament = write(&slot);

        if !tournament.status.is_joinable() {
            return Err(JoinError::NotJoinable {
                id,
                status: tournament.status,
            });
        }
        if tournament.contains_participant(participant_id) {
            return Err(JoinError::AlreadyJoined {
                id,
                participant_id: participant_id.to_string(),
            });
        }
        if tournament.is_full() {
            return Err(JoinError::Full {
                id,
                max: tournament.max_participants,
            });
        }
        if paid_fee < tournament.entry_fee {
            return Err(JoinError::InsufficientFee {
                required: tournament.entry_fee,
                paid: paid_fee,
            });
        }

        let (pool_contribution, platform_revenue) =
            split_entry_fee(tournament.entry_fee, self.settings.pool_contribution_bps);
        tournament.add_participant(ParticipantId::from(participant_id));
        tournament.prize_pool = tournament.prize_pool.saturating_add(pool_contribution);
        tournament.platform_revenue = tournament.platform_revenue.saturating_add(platform_revenue);

        tracing::debug!(
            tournament_id = id,
            participant = participant_id,
            participants = tournament.participant_count(),
            prize_pool = tournament.prize_pool,
            "participant joined"
        );
        Ok(JoinReceipt {
            tournament_id: id,
            participant_count: tournament.participant_count(),
            prize_pool: tournament.prize_pool,
            pool_contribution,
            platform_revenue,
        })
    }

    /// Move a tournament to `next`.
    ///
    /// Requesting the current status is a no-op reported as [`Transition::Unchanged`]; of any
    /// number of concurrent callers requesting the same move, exactly one sees
    /// [`Transition::Applied`]. Returns a snapshot taken under the same lock.
    pub fn transition(
        &self,
        id: TournamentId,
        next: TournamentStatus,
        now_ms: u64,
    ) -> Result<(Transition, Tournament), TransitionError> {
        let slot = self.slot(id)?;
        let mut tournament = write(&slot);
        let from = tournament.status;
        if from == next {
            return Ok((Transition::Unchanged, tournament.clone()));
        }
        if !from.can_transition_to(next) {
            return Err(TransitionError::InvalidTransition { id, from, to: next });
        }
        tournament.status = next;
        if next == TournamentStatus::Ended {
            tournament.ended_at_ms = Some(now_ms);
        }

        tracing::info!(
            tournament_id = id,
            from = %from,
            to = %next,
            participants = tournament.participant_count(),
            prize_pool = tournament.prize_pool,
            "tournament transitioned"
        );
        Ok((Transition::Applied { from }, tournament.clone()))
    }

    /// Transitions the clock says are overdue, sorted by id.
    ///
    /// A tournament whose window has fully passed while still scheduled is reported once, with
    /// `Active` as the target: it still passes through the active state before ending.
    pub fn due_transitions(&self, now_ms: u64) -> Vec<(TournamentId, TournamentStatus)> {
        let slots: Vec<Slot> = read(&self.registry).active.values().cloned().collect();
        let mut due: Vec<_> = slots
            .iter()
            .filter_map(|slot| {
                let tournament = read(slot);
                let target = tournament.due_status(now_ms);
                if target <= tournament.status {
                    return None;
                }
                let next = match tournament.status {
                    TournamentStatus::Scheduled => TournamentStatus::Active,
                    _ => target,
                };
                Some((tournament.id, next))
            })
            .collect();
        due.sort_unstable();
        due
    }

    /// Ids in the active partition, sorted.
    pub fn active_ids(&self) -> Vec<TournamentId> {
        let mut ids: Vec<_> = read(&self.registry).active.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Move tournaments that ended at least `retention_ms` ago into history.
    pub fn archive_ended(&self, now_ms: u64, retention_ms: u64) -> Vec<TournamentId> {
        let mut registry = write(&self.registry);
        let mut expired: Vec<TournamentId> = registry
            .active
            .iter()
            .filter(|(_, slot)| {
                let tournament = read(slot);
                tournament.status == TournamentStatus::Ended
                    && tournament
                        .ended_at_ms
                        .is_some_and(|ended| now_ms.saturating_sub(ended) >= retention_ms)
            })
            .map(|(id, _)| *id)
            .collect();
        expired.sort_unstable();
        for id in &expired {
            if let Some(slot) = registry.active.remove(id) {
                registry.history.insert(*id, slot);
            }
        }
        drop(registry);

        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "archived ended tournaments");
        }
        expired
    }

    pub fn active_len(&self) -> usize {
        read(&self.registry).active.len()
    }

    pub fn history_len(&self) -> usize {
        read(&self.registry).history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podium_types::{TournamentKind, DAY_MS};

    const START: u64 = 10_000;

    fn config(game_id: &str) -> TournamentConfig {
        TournamentConfig {
            kind: TournamentKind::Daily,
            game_id: game_id.to_string(),
            start_at_ms: START,
            end_at_ms: START + DAY_MS,
            entry_fee: 500,
            max_participants: 3,
            prize_weights: Vec::new(),
        }
    }

    fn store() -> TournamentStore {
        TournamentStore::new(StoreSettings {
            min_duration_ms: 60_000,
            ..Default::default()
        })
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let store = store();
        let a = store.create(config("a"), 0).unwrap();
        let b = store.create(config("b"), 0).unwrap();
        assert!(a.created && b.created);
        assert_eq!(a.tournament.id, 1);
        assert_eq!(b.tournament.id, 2);
        assert_eq!(a.tournament.status, TournamentStatus::Scheduled);
        assert_eq!(store.active_ids(), vec![1, 2]);
    }

    #[test]
    fn test_create_is_idempotent_on_natural_key() {
        let store = store();
        let first = store.create(config("a"), 0).unwrap();
        store.join(first.tournament.id, "alice", 500).unwrap();

        let again = store.create(config("a"), 5).unwrap();
        assert!(!again.created);
        assert_eq!(again.tournament.id, first.tournament.id);
        assert_eq!(again.tournament.participant_count(), 1);
        assert_eq!(store.active_len(), 1);
        assert_eq!(
            store.find_by_natural_key(&config("a").natural_key()),
            Some(first.tournament.id)
        );
    }

    #[test]
    fn test_create_rejects_conflicting_config_on_natural_key() {
        let store = store();
        let first = store.create(config("a"), 0).unwrap();

        let mut conflicting = config("a");
        conflicting.entry_fee = 10_000;
        conflicting.max_participants = 2;
        assert_eq!(
            store.create(conflicting, 5),
            Err(ConfigError::DuplicateNaturalKey {
                existing: first.tournament.id
            })
        );
        let stored = store.get(first.tournament.id).unwrap();
        assert_eq!(stored.entry_fee, 500);
        assert_eq!(stored.max_participants, 3);
        assert_eq!(store.active_len(), 1);
    }

    #[test]
    fn test_create_rejects_invalid_config() {
        let store = store();
        let mut cfg = config("a");
        cfg.end_at_ms = START + 1_000;
        assert!(matches!(
            store.create(cfg, 0),
            Err(ConfigError::DurationTooShort { .. })
        ));
        assert_eq!(store.active_len(), 0);
    }

    #[test]
    fn test_get_unknown() {
        assert_eq!(store().get(42), Err(LookupError::NotFound(42)));
    }

    #[test]
    fn test_join_credits_pool_and_revenue() {
        let store = store();
        let id = store.create(config("a"), 0).unwrap().tournament.id;
        let receipt = store.join(id, "alice", 700).unwrap();
        assert_eq!(receipt.pool_contribution, 450);
        assert_eq!(receipt.platform_revenue, 50);
        assert_eq!(receipt.prize_pool, 450);
        assert_eq!(receipt.participant_count, 1);

        let tournament = store.get(id).unwrap();
        assert_eq!(tournament.prize_pool, 450);
        assert_eq!(tournament.platform_revenue, 50);
    }

    #[test]
    fn test_join_errors() {
        let store = store();
        let id = store.create(config("a"), 0).unwrap().tournament.id;
        assert_eq!(store.join(99, "alice", 500), Err(JoinError::NotFound(99)));
        assert_eq!(
            store.join(id, "alice", 499),
            Err(JoinError::InsufficientFee {
                required: 500,
                paid: 499
            })
        );
        assert!(matches!(
            store.join(id, "", 500),
            Err(JoinError::InvalidParticipant { .. })
        ));

        store.join(id, "alice", 500).unwrap();
        assert!(matches!(
            store.join(id, "alice", 500),
            Err(JoinError::AlreadyJoined { .. })
        ));
        store.join(id, "bob", 500).unwrap();
        store.join(id, "carol", 500).unwrap();
        assert_eq!(store.join(id, "dave", 500), Err(JoinError::Full { id, max: 3 }));
        assert_eq!(store.get(id).unwrap().prize_pool, 3 * 450);
    }

    #[test]
    fn test_join_allowed_while_active_rejected_when_ended() {
        let store = store();
        let id = store.create(config("a"), 0).unwrap().tournament.id;
        store.transition(id, TournamentStatus::Active, START).unwrap();
        store.join(id, "alice", 500).unwrap();

        store
            .transition(id, TournamentStatus::Ended, START + DAY_MS)
            .unwrap();
        assert_eq!(
            store.join(id, "bob", 500),
            Err(JoinError::NotJoinable {
                id,
                status: TournamentStatus::Ended
            })
        );
        let tournament = store.get(id).unwrap();
        assert_eq!(tournament.participant_count(), 1);
        assert_eq!(tournament.prize_pool, 450);
    }

    #[test]
    fn test_transition_rules() {
        let store = store();
        let id = store.create(config("a"), 0).unwrap().tournament.id;

        let (transition, _) = store.transition(id, TournamentStatus::Active, START).unwrap();
        assert_eq!(
            transition,
            Transition::Applied {
                from: TournamentStatus::Scheduled
            }
        );
        let (transition, _) = store.transition(id, TournamentStatus::Active, START).unwrap();
        assert_eq!(transition, Transition::Unchanged);
        assert_eq!(
            store.transition(id, TournamentStatus::Scheduled, START),
            Err(TransitionError::InvalidTransition {
                id,
                from: TournamentStatus::Active,
                to: TournamentStatus::Scheduled,
            })
        );

        let (transition, snapshot) = store.transition(id, TournamentStatus::Ended, 77).unwrap();
        assert!(transition.applied());
        assert_eq!(snapshot.ended_at_ms, Some(77));
        assert!(store.transition(id, TournamentStatus::Active, 78).is_err());
        assert_eq!(
            store.transition(404, TournamentStatus::Active, 0),
            Err(TransitionError::NotFound(404))
        );
    }

    #[test]
    fn test_cancel_from_scheduled() {
        let store = store();
        let id = store.create(config("a"), 0).unwrap().tournament.id;
        let (transition, snapshot) = store.transition(id, TournamentStatus::Ended, 5).unwrap();
        assert!(transition.applied());
        assert_eq!(snapshot.status, TournamentStatus::Ended);
    }

    #[test]
    fn test_due_transitions() {
        let store = store();
        let a = store.create(config("a"), 0).unwrap().tournament.id;
        let b = store.create(config("b"), 0).unwrap().tournament.id;

        assert!(store.due_transitions(START - 1).is_empty());
        assert_eq!(
            store.due_transitions(START),
            vec![(a, TournamentStatus::Active), (b, TournamentStatus::Active)]
        );

        store.transition(a, TournamentStatus::Active, START).unwrap();
        // b missed its whole window; it still steps through active first.
        assert_eq!(
            store.due_transitions(START + DAY_MS),
            vec![(a, TournamentStatus::Ended), (b, TournamentStatus::Active)]
        );
    }

    #[test]
    fn test_archive_moves_to_history() {
        let store = store();
        let a = store.create(config("a"), 0).unwrap().tournament.id;
        let b = store.create(config("b"), 0).unwrap().tournament.id;
        store.transition(a, TournamentStatus::Ended, 1_000).unwrap();

        assert!(store.archive_ended(1_500, 1_000).is_empty());
        assert_eq!(store.archive_ended(2_000, 1_000), vec![a]);
        assert_eq!(store.active_ids(), vec![b]);
        assert_eq!(store.history_len(), 1);

        // Archived tournaments stay readable and keep their natural key.
        assert_eq!(store.get(a).unwrap().status, TournamentStatus::Ended);
        assert!(!store.create(config("a"), 3_000).unwrap().created);
    }
}
