//! Time-driven tournament transitions.
//!
//! Two mechanisms drive the state machine forward:
//! 1. **Timers**: a min-heap of `(fire_at_ms, tournament_id, target)` entries, one per pending
//!    boundary. The loop sleeps until the earliest entry is due.
//! 2. **Sweep**: every `sweep_interval`, overdue transitions are re-derived from the store. This
//!    covers anything a timer missed and archives expired tournaments.
//!
//! Both paths go through the service, where the store's check-and-set on status guarantees each
//! transition (and its settlement) is applied once no matter how many times it fires. A separate
//! interval runs the recurring-tournament job.

use std::{
    cmp::Reverse,
    collections::BinaryHeap,
    sync::Arc,
    time::Duration,
};

use podium_types::{TournamentId, TournamentStatus};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{service::TournamentService, ValidatedConfig};

/// Requests from the service to the scheduler loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerCommand {
    Track {
        id: TournamentId,
        start_at_ms: u64,
        end_at_ms: u64,
    },
    Cancel(TournamentId),
}

type Timer = Reverse<(u64, TournamentId, TournamentStatus)>;

/// Pending boundary timers, earliest first.
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Timer>,
}

impl TimerQueue {
    pub fn track(&mut self, id: TournamentId, start_at_ms: u64, end_at_ms: u64) {
        self.heap
            .push(Reverse((start_at_ms, id, TournamentStatus::Active)));
        self.heap
            .push(Reverse((end_at_ms, id, TournamentStatus::Ended)));
    }

    pub fn cancel(&mut self, id: TournamentId) {
        self.heap.retain(|Reverse((_, timer_id, _))| *timer_id != id);
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse((fire_at_ms, _, _))| *fire_at_ms)
    }

    /// Remove and return every timer due at `now_ms`, earliest first.
    pub fn pop_due(&mut self, now_ms: u64) -> Vec<(TournamentId, TournamentStatus)> {
        let mut due = Vec::new();
        while let Some(Reverse((fire_at_ms, id, target))) = self.heap.peek().copied() {
            if fire_at_ms > now_ms {
                break;
            }
            self.heap.pop();
            due.push((id, target));
        }
        due
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

pub struct Scheduler {
    service: Arc<TournamentService>,
    commands: tokio::sync::mpsc::UnboundedReceiver<TimerCommand>,
    timers: TimerQueue,
    sweep_interval: Duration,
    recurring_interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl Scheduler {
    /// Start the scheduler loop for `service`. Only one scheduler may be attached to a service.
    pub fn spawn(
        service: Arc<TournamentService>,
        config: &ValidatedConfig,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<JoinHandle<()>> {
        let commands = service
            .take_timer_commands()
            .ok_or_else(|| anyhow::anyhow!("a scheduler is already attached to this service"))?;
        let scheduler = Self {
            service,
            commands,
            timers: TimerQueue::default(),
            sweep_interval: config.sweep_interval,
            recurring_interval: config.recurring_interval,
            shutdown,
        };
        Ok(tokio::spawn(scheduler.run()))
    }

    async fn run(mut self) {
        let mut sweep = time::interval(self.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut recurring = time::interval(self.recurring_interval);
        recurring.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            sweep_interval_ms = self.sweep_interval.as_millis() as u64,
            recurring_interval_ms = self.recurring_interval.as_millis() as u64,
            "scheduler started"
        );

        loop {
            let wait = self
                .timers
                .next_deadline()
                .map(|at| Duration::from_millis(at.saturating_sub(self.service.now_ms())))
                .unwrap_or(self.sweep_interval);

            tokio::select! {
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
                command = self.commands.recv() => match command {
                    Some(TimerCommand::Track { id, start_at_ms, end_at_ms }) => {
                        self.timers.track(id, start_at_ms, end_at_ms);
                    }
                    Some(TimerCommand::Cancel(id)) => self.timers.cancel(id),
                    None => break,
                },
                _ = time::sleep(wait) => self.fire_due_timers(),
                _ = sweep.tick() => self.sweep(),
                _ = recurring.tick() => {
                    self.service.ensure_recurring();
                }
            }
        }
        info!(pending_timers = self.timers.len(), "scheduler stopped");
    }

    fn fire_due_timers(&mut self) {
        for (id, target) in self.timers.pop_due(self.service.now_ms()) {
            match self.service.advance_due(id) {
                Ok(applied) => {
                    debug!(tournament_id = id, boundary = %target, ?applied, "timer fired")
                }
                Err(err) => warn!(tournament_id = id, ?err, "timer transition failed"),
            }
        }
    }

    fn sweep(&mut self) {
        let applied = self.service.run_due_transitions();
        if !applied.is_empty() {
            debug!(count = applied.len(), "sweep applied overdue transitions");
        }
        for id in self.service.archive() {
            self.timers.cancel(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_queue_orders_by_deadline() {
        let mut timers = TimerQueue::default();
        timers.track(2, 500, 900);
        timers.track(1, 100, 1_000);
        assert_eq!(timers.next_deadline(), Some(100));
        assert_eq!(timers.len(), 4);

        assert!(timers.pop_due(99).is_empty());
        assert_eq!(
            timers.pop_due(600),
            vec![(1, TournamentStatus::Active), (2, TournamentStatus::Active)]
        );
        assert_eq!(timers.next_deadline(), Some(900));
        assert_eq!(
            timers.pop_due(1_000),
            vec![(2, TournamentStatus::Ended), (1, TournamentStatus::Ended)]
        );
        assert!(timers.is_empty());
    }

    #[test]
    fn test_cancel_drops_all_timers_for_id() {
        let mut timers = TimerQueue::default();
        timers.track(1, 100, 200);
        timers.track(2, 150, 250);
        timers.cancel(1);
        assert_eq!(timers.len(), 2);
        assert_eq!(timers.next_deadline(), Some(150));
        assert_eq!(
            timers.pop_due(u64::MAX),
            vec![(2, TournamentStatus::Active), (2, TournamentStatus::Ended)]
        );
    }

    #[test]
    fn test_start_fires_before_end_at_same_instant() {
        let mut timers = TimerQueue::default();
        timers.track(7, 100, 100);
        assert_eq!(
            timers.pop_due(100),
            vec![(7, TournamentStatus::Active), (7, TournamentStatus::Ended)]
        );
    }
}
