//! Lifecycle event fan-out.
//!
//! [`Dispatcher::emit`] never blocks: events are queued on an unbounded channel and a dispatcher
//! task, running outside every tournament lock, publishes them to a broadcast bus and forwards
//! them to each registered [`EventSink`]. Every sink has its own delivery task so one slow or
//! failing collaborator cannot hold back the others. Delivery is best effort: a failing sink is
//! retried with jittered exponential backoff and the event is dropped once attempts run out.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use podium_types::Event;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::backoff::{exponential_backoff, jittered_backoff};

/// External collaborator receiving lifecycle events (payments, analytics, ...).
pub trait EventSink: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn deliver<'a>(&'a self, event: &'a Event) -> BoxFuture<'a, anyhow::Result<()>>;
}

/// Writes each event as a JSON line to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn deliver<'a>(&'a self, event: &'a Event) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            let line = event.to_json_line()?;
            info!(
                target: "podium::events",
                tournament_id = event.tournament_id(),
                kind = event.kind(),
                event = %line,
                "event"
            );
            Ok(())
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeliveryPolicy {
    /// Total attempts per event, including the first.
    pub attempts: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub backoff: Duration,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            attempts: crate::defaults::DEFAULT_DELIVERY_ATTEMPTS,
            backoff: Duration::from_millis(crate::defaults::DEFAULT_DELIVERY_BACKOFF_MS),
        }
    }
}

/// Deliver `event` to `sink`, retrying on failure. Returns whether delivery succeeded.
pub async fn deliver_with_retry(
    sink: &dyn EventSink,
    event: &Event,
    policy: DeliveryPolicy,
) -> bool {
    let attempts = policy.attempts.max(1);
    for attempt in 1..=attempts {
        match sink.deliver(event).await {
            Ok(()) => {
                if attempt > 1 {
                    debug!(
                        sink = sink.name(),
                        attempt,
                        kind = event.kind(),
                        "event delivered after retry"
                    );
                }
                return true;
            }
            Err(err) if attempt < attempts => {
                let delay = jittered_backoff(
                    &mut rand::thread_rng(),
                    exponential_backoff(policy.backoff, attempt),
                );
                debug!(
                    sink = sink.name(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    ?err,
                    "event delivery failed; retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                warn!(
                    sink = sink.name(),
                    attempts,
                    tournament_id = event.tournament_id(),
                    kind = event.kind(),
                    ?err,
                    "event delivery failed; dropping event"
                );
            }
        }
    }
    false
}

pub struct Dispatcher {
    queue: mpsc::UnboundedSender<Event>,
    bus: broadcast::Sender<Event>,
}

impl Dispatcher {
    /// Start the dispatcher task. Must be called from within a tokio runtime.
    ///
    /// The task exits once the returned dispatcher is dropped and the queue drains.
    pub fn spawn(
        buffer: usize,
        policy: DeliveryPolicy,
        sinks: Vec<Arc<dyn EventSink>>,
    ) -> (Self, JoinHandle<()>) {
        let (queue, mut receiver) = mpsc::unbounded_channel::<Event>();
        let (bus, _) = broadcast::channel(buffer.max(1));

        let mut outlets = Vec::with_capacity(sinks.len());
        for sink in sinks {
            let (tx, mut rx) = mpsc::unbounded_channel::<Arc<Event>>();
            outlets.push(tx);
            tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    deliver_with_retry(sink.as_ref(), &event, policy).await;
                }
            });
        }

        let publisher = bus.clone();
        let handle = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                let event = Arc::new(event);
                // No subscribers is not an error; lagging subscribers miss events.
                let _ = publisher.send(event.as_ref().clone());
                for outlet in &outlets {
                    let _ = outlet.send(Arc::clone(&event));
                }
            }
            debug!("event dispatcher stopped");
        });

        (Self { queue, bus }, handle)
    }

    /// Queue an event for publication.
    pub fn emit(&self, event: Event) {
        if let Err(err) = self.queue.send(event) {
            warn!(kind = err.0.kind(), "event dispatcher stopped; event dropped");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }
}
