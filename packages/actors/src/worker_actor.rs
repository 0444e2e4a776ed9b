//! Worker actor that drains the enrollment queue.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use db::EnrollmentStore;
use pipeline_core::{WorkerEvent, WorkerPhase};
use queue::QueueBackend;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::batch::{BatchOutcome, BatchProcessor, WorkerError};
use crate::messages::WorkerMessage;
use crate::rules::StatusRule;
use crate::settings::WorkerSettings;

/// State for the worker actor.
pub struct WorkerState<Q, S, R> {
    processor: BatchProcessor<Q, S, R>,
    settings: WorkerSettings,
    phase: WorkerPhase,
    /// Timer that will deliver the next `Poll` after a backoff.
    next_poll: Option<JoinHandle<()>>,
    event_tx: Option<broadcast::Sender<WorkerEvent>>,
}

impl<Q, S, R> WorkerState<Q, S, R> {
    pub fn phase(&self) -> WorkerPhase {
        self.phase
    }

    fn emit(&self, event: WorkerEvent) {
        tracing::trace!(event = %event.description(), "Worker event");
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(event);
        }
    }

    fn set_phase(&mut self, new_phase: WorkerPhase) {
        if self.phase == new_phase || self.phase.is_terminal() {
            return;
        }
        let old_phase = std::mem::replace(&mut self.phase, new_phase);
        tracing::debug!(from = %old_phase, to = %new_phase, "Worker phase changed");
        self.emit(WorkerEvent::PhaseChanged {
            old_phase,
            new_phase,
            timestamp: Utc::now(),
        });
    }

    /// Deliver a `Poll` to `myself` once `delay` has elapsed.
    fn schedule_poll(&mut self, myself: &ActorRef<WorkerMessage>, delay: Duration) {
        self.cancel_poll();
        let myself = myself.clone();
        self.next_poll = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = myself.send_message(WorkerMessage::Poll);
        }));
    }

    fn cancel_poll(&mut self) {
        if let Some(timer) = self.next_poll.take() {
            timer.abort();
        }
    }

    fn batch_done(&mut self, myself: &ActorRef<WorkerMessage>, outcome: BatchOutcome) {
        self.emit(WorkerEvent::BatchProcessed {
            dequeued: outcome.dequeued,
            processed: outcome.processed,
            skipped: outcome.skipped(),
            timestamp: Utc::now(),
        });
        self.set_phase(WorkerPhase::Idle);

        // Back through the mailbox so a pending Shutdown is seen first
        if myself.send_message(WorkerMessage::Poll).is_err() {
            tracing::debug!("Worker mailbox closed, not polling again");
        }
    }

    fn iteration_failed(&mut self, myself: &ActorRef<WorkerMessage>, error: WorkerError) {
        tracing::error!(
            error = %error,
            retry_in_ms = self.settings.error_backoff.as_millis() as u64,
            "Enrollment iteration failed"
        );
        self.emit(WorkerEvent::IterationFailed {
            error: error.to_string(),
            timestamp: Utc::now(),
        });
        self.set_phase(WorkerPhase::Idle);
        self.schedule_poll(myself, self.settings.error_backoff);
    }
}

/// Worker actor arguments.
pub struct WorkerArgs<Q, S, R> {
    pub queue: Arc<Q>,
    pub store: S,
    pub rule: R,
    pub settings: WorkerSettings,
    pub event_tx: Option<broadcast::Sender<WorkerEvent>>,
}

impl<Q, S, R> WorkerArgs<Q, S, R> {
    pub fn new(queue: Arc<Q>, store: S, rule: R) -> Self {
        Self {
            queue,
            store,
            rule,
            settings: WorkerSettings::default(),
            event_tx: None,
        }
    }

    pub fn with_settings(mut self, settings: WorkerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_event_tx(mut self, tx: broadcast::Sender<WorkerEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }
}

/// Worker actor that polls the queue and finalizes pending enrollments.
///
/// Each `Poll` runs one iteration. A non-empty batch is followed by another
/// `Poll` right away; an empty queue or a failed iteration schedules the next
/// one after the matching backoff. `Shutdown` is only ever handled between
/// iterations, so a batch that started always reaches its commit.
pub struct EnrollmentWorker<Q, S, R> {
    _marker: PhantomData<fn() -> (Q, S, R)>,
}

impl<Q, S, R> EnrollmentWorker<Q, S, R> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<Q, S, R> Default for EnrollmentWorker<Q, S, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q, S, R> Actor for EnrollmentWorker<Q, S, R>
where
    Q: QueueBackend,
    S: EnrollmentStore,
    R: StatusRule,
{
    type Msg = WorkerMessage;
    type State = WorkerState<Q, S, R>;
    type Arguments = WorkerArgs<Q, S, R>;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            batch_size = args.settings.batch_size,
            idle_backoff_ms = args.settings.idle_backoff.as_millis() as u64,
            "Starting enrollment worker"
        );

        if let Err(e) = args.queue.connect().await {
            tracing::warn!(error = %e, "Queue unreachable at startup, retrying on poll");
        }

        let mut processor = BatchProcessor::new(
            args.queue,
            args.store,
            args.rule,
            args.settings.batch_size,
        );
        if let Some(ref tx) = args.event_tx {
            processor = processor.with_event_tx(tx.clone());
        }

        let state = WorkerState {
            processor,
            settings: args.settings,
            phase: WorkerPhase::Idle,
            next_poll: None,
            event_tx: args.event_tx,
        };
        state.emit(WorkerEvent::Started {
            batch_size: state.settings.batch_size,
            timestamp: Utc::now(),
        });

        myself.send_message(WorkerMessage::Poll)?;

        Ok(state)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            WorkerMessage::Poll => {
                state.next_poll = None;
                if !state.phase.accepts_work() {
                    return Ok(());
                }

                let polled = state.processor.dequeue().await;
                match polled {
                    Ok(payloads) if payloads.is_empty() => {
                        state.set_phase(WorkerPhase::Idle);
                        let backoff = state.settings.idle_backoff;
                        state.schedule_poll(&myself, backoff);
                    }
                    Ok(payloads) => {
                        state.set_phase(WorkerPhase::Processing);
                        let processed = state.processor.process(payloads).await;
                        match processed {
                            Ok(outcome) => state.batch_done(&myself, outcome),
                            Err(e) => state.iteration_failed(&myself, e),
                        }
                    }
                    Err(e) => state.iteration_failed(&myself, e),
                }
            }

            WorkerMessage::Shutdown => {
                tracing::info!("Shutting down enrollment worker");
                state.cancel_poll();
                state.set_phase(WorkerPhase::ShuttingDown);
                myself.stop(None);
            }

            WorkerMessage::GetPhase { reply } => {
                let _ = reply.send(state.phase);
            }
        }

        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.cancel_poll();
        state.processor.queue().close().await;
        state.set_phase(WorkerPhase::Stopped);
        state.emit(WorkerEvent::Stopped {
            timestamp: Utc::now(),
        });
        tracing::info!("Enrollment worker stopped");
        Ok(())
    }
}

/// Spawn the enrollment worker.
///
/// The returned handle completes once the actor has stopped.
pub async fn start_worker<Q, S, R>(
    args: WorkerArgs<Q, S, R>,
) -> Result<(ActorRef<WorkerMessage>, JoinHandle<()>), ractor::SpawnErr>
where
    Q: QueueBackend,
    S: EnrollmentStore,
    R: StatusRule,
{
    Actor::spawn(None, EnrollmentWorker::new(), args).await
}
