//! Tournament service facade.
//!
//! The only public entry point for tournament operations. Owns the store and ledger, samples the
//! clock once per call, and emits lifecycle events after the state change they describe has
//! been committed and its locks released.

use std::sync::{Arc, Mutex};

use podium_execution::{Created, ScoreLedger, TournamentStore};
use podium_types::{
    prize, validate_prize_weights, validate_submission, ConfigError, Event, JoinError,
    JoinReceipt, LookupError, ParticipantId, PrizeDistribution, PrizePreview, PrizeSettings,
    RankedEntry, ScoreEntry, ScoreError, SettlementError, SubmitResult, Tournament,
    TournamentConfig, TournamentId, TournamentInfo, TournamentStatus, Transition,
    TransitionError,
};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    dispatcher::{Dispatcher, EventSink},
    recurring::RecurringTemplate,
    scheduler::TimerCommand,
    Clock, ValidatedConfig,
};

pub struct TournamentService {
    store: TournamentStore,
    ledger: ScoreLedger,
    prize: PrizeSettings,
    templates: Vec<RecurringTemplate>,
    archive_retention_ms: u64,
    clock: Arc<dyn Clock>,
    dispatcher: Dispatcher,
    timers: mpsc::UnboundedSender<TimerCommand>,
    timer_commands: Mutex<Option<mpsc::UnboundedReceiver<TimerCommand>>>,
}

impl TournamentService {
    /// Build a service and start its event dispatcher. Must be called from within a tokio
    /// runtime.
    pub fn new(
        config: &ValidatedConfig,
        clock: Arc<dyn Clock>,
        sinks: Vec<Arc<dyn EventSink>>,
    ) -> (Arc<Self>, JoinHandle<()>) {
        let (dispatcher, dispatcher_handle) =
            Dispatcher::spawn(config.event_buffer.get(), config.delivery, sinks);
        let (timers, timer_commands) = mpsc::unbounded_channel();
        let service = Arc::new(Self {
            store: TournamentStore::new(config.store),
            ledger: ScoreLedger::new(),
            prize: config.prize,
            templates: config.recurring.clone(),
            archive_retention_ms: config.archive_retention_ms,
            clock,
            dispatcher,
            timers,
            timer_commands: Mutex::new(Some(timer_commands)),
        });
        (service, dispatcher_handle)
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Hand the timer command stream to the scheduler. Returns `None` after the first call.
    pub(crate) fn take_timer_commands(&self) -> Option<mpsc::UnboundedReceiver<TimerCommand>> {
        self.timer_commands
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    fn send_timer(&self, command: TimerCommand) {
        // Nobody listening just means no scheduler is attached; the sweep is not needed either.
        let _ = self.timers.send(command);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.dispatcher.subscribe()
    }

    /// Create a tournament, or return the existing one for the same natural key and config.
    pub fn create_tournament(&self, config: TournamentConfig) -> Result<Tournament, ConfigError> {
        self.create(config).map(|created| created.tournament)
    }

    fn create(&self, config: TournamentConfig) -> Result<Created, ConfigError> {
        let created = self.store.create(config, self.now_ms())?;
        if created.created {
            let tournament = &created.tournament;
            self.ledger.open(tournament.id);
            self.send_timer(TimerCommand::Track {
                id: tournament.id,
                start_at_ms: tournament.start_at_ms,
                end_at_ms: tournament.end_at_ms,
            });
            self.dispatcher.emit(Event::TournamentCreated {
                tournament: tournament.clone(),
            });
        }
        Ok(created)
    }

    pub fn join_tournament(
        &self,
        id: TournamentId,
        participant_id: &str,
        paid_fee: u64,
    ) -> Result<JoinReceipt, JoinError> {
        let receipt = self.store.join(id, participant_id, paid_fee)?;
        self.dispatcher.emit(Event::ParticipantJoined {
            id,
            participant_id: ParticipantId::from(participant_id),
            participant_count: receipt.participant_count,
            prize_pool: receipt.prize_pool,
        });
        Ok(receipt)
    }

    /// Submit a score. The tournament's read lock is held across the status check and the ledger
    /// write, so a submission can never land after the ranking is frozen.
    pub fn submit_score(
        &self,
        id: TournamentId,
        participant_id: &str,
        score: u64,
        metadata: &str,
    ) -> Result<SubmitResult, ScoreError> {
        validate_submission(score, metadata)?;
        let now_ms = self.now_ms();
        let result = self.store.with_tournament(id, |tournament| {
            if tournament.status != TournamentStatus::Active {
                return Err(ScoreError::TournamentNotActive {
                    id,
                    status: tournament.status,
                });
            }
            if !tournament.contains_participant(participant_id) {
                return Err(ScoreError::NotAParticipant {
                    id,
                    participant_id: participant_id.to_string(),
                });
            }
            self.ledger
                .submit(id, participant_id, score, metadata, now_ms)
        })??;

        self.dispatcher.emit(Event::ScoreSubmitted {
            id,
            participant_id: ParticipantId::from(participant_id),
            score,
            rank: result.rank,
            is_new_best: result.is_new_best,
        });
        Ok(result)
    }

    /// Move `id` to `target`, running the side effects of the new status exactly once.
    pub fn advance(
        &self,
        id: TournamentId,
        target: TournamentStatus,
    ) -> Result<Transition, TransitionError> {
        let now_ms = self.now_ms();
        let (transition, tournament) = self.store.transition(id, target, now_ms)?;
        if transition.applied() {
            match target {
                TournamentStatus::Active => {
                    self.dispatcher.emit(Event::TournamentStarted {
                        id,
                        start_at_ms: tournament.start_at_ms,
                        participant_count: tournament.participant_count(),
                    });
                }
                TournamentStatus::Ended => {
                    self.settle(&tournament);
                }
                TournamentStatus::Scheduled => {}
            }
        }
        Ok(transition)
    }

    pub fn start_tournament(&self, id: TournamentId) -> Result<Transition, TransitionError> {
        self.advance(id, TournamentStatus::Active)
    }

    /// End a tournament ahead of its schedule (or cancel it while still scheduled).
    pub fn end_tournament(&self, id: TournamentId) -> Result<PrizeDistribution, TransitionError> {
        match self.advance(id, TournamentStatus::Ended)? {
            Transition::Applied { .. } => {
                self.send_timer(TimerCommand::Cancel(id));
                self.distribute_prizes(id).map_err(|err| match err {
                    SettlementError::NotFound(id) => TransitionError::NotFound(id),
                    SettlementError::NotEnded { id, status } => {
                        TransitionError::InvalidTransition {
                            id,
                            from: status,
                            to: TournamentStatus::Ended,
                        }
                    }
                })
            }
            Transition::Unchanged => Err(TransitionError::InvalidTransition {
                id,
                from: TournamentStatus::Ended,
                to: TournamentStatus::Ended,
            }),
        }
    }

    /// Freeze the ranking, compute payouts and emit `TournamentEnded`.
    ///
    /// Only reachable from an applied `-> Ended` transition, which the store hands out once per
    /// tournament.
    fn settle(&self, tournament: &Tournament) -> PrizeDistribution {
        let ranking = self.ledger.freeze(tournament.id);
        let distribution = prize::distribute(
            tournament.prize_pool,
            &ranking,
            &self.prize,
            &tournament.prize_weights,
        );
        info!(
            tournament_id = tournament.id,
            participants = tournament.participant_count(),
            ranked = ranking.len(),
            prize_pool = tournament.prize_pool,
            awarded = distribution.total_awarded(),
            undistributed = distribution.undistributed,
            curve = ?distribution.curve,
            "tournament settled"
        );
        self.dispatcher.emit(Event::TournamentEnded {
            id: tournament.id,
            final_ranking: ranking,
            distribution: distribution.clone(),
        });
        distribution
    }

    /// Recompute the settlement of an ended tournament from its frozen ranking.
    pub fn distribute_prizes(
        &self,
        id: TournamentId,
    ) -> Result<PrizeDistribution, SettlementError> {
        let tournament = self.store.get(id)?;
        let ranking = self.final_ranking_of(&tournament)?;
        Ok(prize::distribute(
            tournament.prize_pool,
            &ranking,
            &self.prize,
            &tournament.prize_weights,
        ))
    }

    pub fn final_ranking(&self, id: TournamentId) -> Result<Vec<RankedEntry>, SettlementError> {
        let tournament = self.store.get(id)?;
        self.final_ranking_of(&tournament)
    }

    fn final_ranking_of(
        &self,
        tournament: &Tournament,
    ) -> Result<Vec<RankedEntry>, SettlementError> {
        if tournament.status != TournamentStatus::Ended {
            return Err(SettlementError::NotEnded {
                id: tournament.id,
                status: tournament.status,
            });
        }
        Ok(self
            .ledger
            .final_ranking(tournament.id)
            .unwrap_or_else(|| self.ledger.freeze(tournament.id)))
    }

    pub fn get_tournament(&self, id: TournamentId) -> Result<Tournament, LookupError> {
        self.store.get(id)
    }

    pub fn get_tournament_info(&self, id: TournamentId) -> Result<TournamentInfo, LookupError> {
        let now_ms = self.now_ms();
        self.store.with_tournament(id, |tournament| tournament.info(now_ms))
    }

    /// Top `limit` entries (`0` for all).
    pub fn get_leaderboard(
        &self,
        id: TournamentId,
        limit: usize,
    ) -> Result<Vec<RankedEntry>, LookupError> {
        // Existence check first so an unknown id is reported by the store.
        self.store.with_tournament(id, |_| ())?;
        self.ledger.leaderboard(id, limit)
    }

    pub fn participant_best(
        &self,
        id: TournamentId,
        participant_id: &str,
    ) -> Option<ScoreEntry> {
        self.ledger.participant_best(id, participant_id)
    }

    /// Projected payouts for `participant_count` entrants at `entry_fee`. Display only.
    pub fn preview_prizes(&self, participant_count: u32, entry_fee: u64) -> PrizePreview {
        prize::preview(participant_count, entry_fee, &self.prize, &[])
    }

    /// Projected payouts for a tournament at its current size.
    pub fn preview_tournament_prizes(&self, id: TournamentId) -> Result<PrizePreview, LookupError> {
        self.store.with_tournament(id, |tournament| {
            prize::preview(
                tournament.participant_count(),
                tournament.entry_fee,
                &self.prize,
                &tournament.prize_weights,
            )
        })
    }

    /// Projected payouts under custom weights.
    pub fn preview_weighted_prizes(
        &self,
        participant_count: u32,
        entry_fee: u64,
        weights: &[f64],
    ) -> Result<PrizePreview, ConfigError> {
        validate_prize_weights(weights)?;
        Ok(prize::preview(participant_count, entry_fee, &self.prize, weights))
    }

    /// Step one tournament toward the status the clock says it should have, passing through
    /// `Active` on the way to `Ended`. Returns the transitions this call applied.
    pub fn advance_due(&self, id: TournamentId) -> Result<Vec<TournamentStatus>, TransitionError> {
        let mut applied = Vec::new();
        loop {
            let now_ms = self.now_ms();
            let (status, due) = self
                .store
                .with_tournament(id, |tournament| (tournament.status, tournament.due_status(now_ms)))?;
            if due <= status {
                return Ok(applied);
            }
            let next = match status {
                TournamentStatus::Scheduled => TournamentStatus::Active,
                _ => due,
            };
            match self.advance(id, next) {
                Ok(transition) if transition.applied() => applied.push(next),
                Ok(_) => {}
                // Another caller moved it past `next`; re-read and continue from there.
                Err(TransitionError::InvalidTransition { .. }) => {}
                Err(err) => return Err(err),
            }
        }
    }

    /// Apply every overdue transition. Returns the transitions this call applied.
    ///
    /// Safe to call concurrently with timers: each transition is applied by exactly one caller.
    pub fn run_due_transitions(&self) -> Vec<(TournamentId, TournamentStatus)> {
        let mut applied = Vec::new();
        // Two passes let a tournament whose window has already closed go scheduled -> active ->
        // ended in one sweep.
        for _ in 0..2 {
            let due = self.store.due_transitions(self.now_ms());
            if due.is_empty() {
                break;
            }
            for (id, target) in due {
                match self.advance(id, target) {
                    Ok(transition) if transition.applied() => applied.push((id, target)),
                    Ok(_) => {}
                    // A concurrent sweep or timer already moved it further.
                    Err(TransitionError::InvalidTransition { from, to, .. }) => debug!(
                        tournament_id = id,
                        %from,
                        %to,
                        "due transition already superseded"
                    ),
                    Err(err) => warn!(tournament_id = id, ?err, "due transition failed"),
                }
            }
        }
        applied
    }

    /// Create the current period's tournament for each recurring template.
    pub fn ensure_recurring(&self) -> Vec<Tournament> {
        let now_ms = self.now_ms();
        let mut created = Vec::new();
        for template in &self.templates {
            let Some(config) = template.config_for(now_ms) else {
                continue;
            };
            match self.create(config) {
                Ok(Created {
                    tournament,
                    created: true,
                }) => {
                    info!(
                        tournament_id = tournament.id,
                        kind = %tournament.kind,
                        game_id = %tournament.game_id,
                        "recurring tournament created"
                    );
                    created.push(tournament);
                }
                Ok(_) => {}
                Err(err) => warn!(
                    kind = %template.kind,
                    game_id = %template.game_id,
                    ?err,
                    "recurring tournament rejected"
                ),
            }
        }
        created
    }

    /// Move tournaments ended longer than the retention window into history and release their
    /// per-participant score slots. Final rankings stay readable.
    pub fn archive(&self) -> Vec<TournamentId> {
        let archived = self
            .store
            .archive_ended(self.now_ms(), self.archive_retention_ms);
        for id in &archived {
            self.ledger.compact(*id);
        }
        archived
    }

    pub fn active_ids(&self) -> Vec<TournamentId> {
        self.store.active_ids()
    }
}
