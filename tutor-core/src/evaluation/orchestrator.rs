//! Per-session serialized, coalescing evaluation orchestrator
//!
//! Writes hand the orchestrator a trigger and return immediately. A single
//! dispatcher task owns the bookkeeping: each session has at most one worker
//! in flight, and triggers arriving meanwhile collapse into one pending batch
//! that runs when the worker finishes. Both evaluators for a session are
//! queued through the same worker, so their read-modify-writes never
//! interleave.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, trace, warn};

use super::evaluators::{self, EvaluationOutcome};
use crate::error::EngineError;
use crate::realtime::{RealtimeEvent, RealtimePublisher, Room};
use crate::store::SessionStore;

/// Which evaluator to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Evaluator {
    Attention,
    Pedagogy,
}

impl fmt::Display for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attention => f.write_str("attention"),
            Self::Pedagogy => f.write_str("pedagogy"),
        }
    }
}

type Reply = oneshot::Sender<Result<EvaluationOutcome, EngineError>>;

/// Messages handled by the dispatcher task
enum Command {
    Evaluate {
        session_id: String,
        evaluator: Evaluator,
        reply: Option<Reply>,
    },
    Finished {
        session_id: String,
    },
    Shutdown,
}

/// Work collected for one session
#[derive(Default)]
struct Batch {
    attention: bool,
    pedagogy: bool,
    waiters: Vec<(Evaluator, Reply)>,
}

impl Batch {
    fn add(&mut self, evaluator: Evaluator, reply: Option<Reply>) {
        match evaluator {
            Evaluator::Attention => self.attention = true,
            Evaluator::Pedagogy => self.pedagogy = true,
        }
        if let Some(reply) = reply {
            self.waiters.push((evaluator, reply));
        }
    }

    fn is_empty(&self) -> bool {
        !self.attention && !self.pedagogy
    }
}

/// Shared collaborators of every worker
struct Pipeline {
    store: Arc<dyn SessionStore>,
    publisher: Arc<dyn RealtimePublisher>,
}

/// Runs evaluations in the background, one session at a time
pub struct EvaluationOrchestrator {
    tx: mpsc::UnboundedSender<Command>,
    enabled: bool,
}

impl EvaluationOrchestrator {
    /// Create the orchestrator and spawn its dispatcher
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        store: Arc<dyn SessionStore>,
        publisher: Arc<dyn RealtimePublisher>,
        enabled: bool,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let pipeline = Arc::new(Pipeline { store, publisher });

        let dispatcher_tx = tx.clone();
        tokio::spawn(async move {
            Self::dispatcher(pipeline, rx, dispatcher_tx).await;
        });

        Self { tx, enabled }
    }

    /// Fire-and-forget re-evaluation after a write
    ///
    /// Never blocks and never fails the caller; failures are logged by the
    /// worker.
    pub fn trigger(&self, session_id: &str, evaluator: Evaluator) {
        if !self.enabled {
            trace!(session_id = %session_id, evaluator = %evaluator, "Evaluation disabled, dropping trigger");
            return;
        }

        let command = Command::Evaluate {
            session_id: session_id.to_string(),
            evaluator,
            reply: None,
        };
        if self.tx.send(command).is_err() {
            error!(session_id = %session_id, "Failed to queue evaluation - dispatcher stopped");
        }
    }

    /// Run the attention evaluator through the session's worker and wait
    pub async fn evaluate_attention(
        &self,
        session_id: &str,
    ) -> Result<super::AttentionEvaluation, EngineError> {
        match self.evaluate(session_id, Evaluator::Attention).await? {
            EvaluationOutcome::Attention(eval) => Ok(eval),
            EvaluationOutcome::Pedagogy(_) => Err(EngineError::PipelineStopped),
        }
    }

    /// Run the pedagogy evaluator through the session's worker and wait
    pub async fn evaluate_pedagogy(
        &self,
        session_id: &str,
    ) -> Result<super::PedagogyEvaluation, EngineError> {
        match self.evaluate(session_id, Evaluator::Pedagogy).await? {
            EvaluationOutcome::Pedagogy(eval) => Ok(eval),
            EvaluationOutcome::Attention(_) => Err(EngineError::PipelineStopped),
        }
    }

    async fn evaluate(
        &self,
        session_id: &str,
        evaluator: Evaluator,
    ) -> Result<EvaluationOutcome, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Evaluate {
                session_id: session_id.to_string(),
                evaluator,
                reply: Some(reply),
            })
            .map_err(|_| EngineError::PipelineStopped)?;

        rx.await.map_err(|_| EngineError::PipelineStopped)?
    }

    /// Stop accepting work; in-flight workers run to completion
    pub fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);
    }

    /// Dispatcher loop: owns in-flight and pending bookkeeping
    async fn dispatcher(
        pipeline: Arc<Pipeline>,
        mut rx: mpsc::UnboundedReceiver<Command>,
        tx: mpsc::UnboundedSender<Command>,
    ) {
        debug!("Evaluation dispatcher started");

        // Sessions with a worker running, mapped to work queued behind it
        let mut in_flight: HashMap<String, Batch> = HashMap::new();

        while let Some(command) = rx.recv().await {
            match command {
                Command::Evaluate {
                    session_id,
                    evaluator,
                    reply,
                } => {
                    if let Some(pending) = in_flight.get_mut(&session_id) {
                        trace!(session_id = %session_id, evaluator = %evaluator, "Coalescing evaluation behind running worker");
                        pending.add(evaluator, reply);
                        continue;
                    }

                    let mut batch = Batch::default();
                    batch.add(evaluator, reply);
                    in_flight.insert(session_id.clone(), Batch::default());
                    Self::spawn_worker(&pipeline, &tx, session_id, batch);
                }
                Command::Finished { session_id } => {
                    let next = in_flight.remove(&session_id).unwrap_or_default();
                    if !next.is_empty() {
                        in_flight.insert(session_id.clone(), Batch::default());
                        Self::spawn_worker(&pipeline, &tx, session_id, next);
                    }
                }
                Command::Shutdown => {
                    debug!("Evaluation dispatcher received shutdown signal");
                    break;
                }
            }
        }

        debug!("Evaluation dispatcher stopped");
    }

    fn spawn_worker(
        pipeline: &Arc<Pipeline>,
        tx: &mpsc::UnboundedSender<Command>,
        session_id: String,
        batch: Batch,
    ) {
        let pipeline = Arc::clone(pipeline);
        let tx = tx.clone();

        tokio::spawn(async move {
            let worker_session = session_id.clone();
            let worker = tokio::spawn(async move {
                Self::run_batch(&pipeline, &worker_session, batch).await;
            });
            // A panicking worker drops its waiters; the session must still be released
            if let Err(e) = worker.await {
                let failure = EngineError::evaluation(
                    session_id.as_str(),
                    EngineError::WorkerAborted(e.to_string()),
                );
                error!(session_id = %session_id, error = %failure, "Evaluation worker aborted");
            }
            // Dispatcher gone means shutdown; nothing left to schedule
            let _ = tx.send(Command::Finished { session_id });
        });
    }

    async fn run_batch(pipeline: &Pipeline, session_id: &str, batch: Batch) {
        let mut results: Vec<(Evaluator, Result<EvaluationOutcome, EngineError>)> = Vec::new();

        if batch.attention {
            let result = evaluators::evaluate_attention(pipeline.store.as_ref(), session_id)
                .await
                .map(EvaluationOutcome::Attention);
            results.push((Evaluator::Attention, result));
        }
        if batch.pedagogy {
            let result = evaluators::evaluate_pedagogy(pipeline.store.as_ref(), session_id)
                .await
                .map(EvaluationOutcome::Pedagogy);
            results.push((Evaluator::Pedagogy, result));
        }

        for (evaluator, result) in &results {
            match result {
                Ok(outcome) => Self::publish(pipeline, outcome).await,
                Err(e) => {
                    let failure = EngineError::evaluation(session_id, e.clone());
                    error!(session_id = %session_id, evaluator = %evaluator, error = %failure, "Evaluation failed");
                }
            }
        }

        for (evaluator, reply) in batch.waiters {
            let Some((_, result)) = results.iter().find(|(e, _)| *e == evaluator) else {
                continue;
            };
            if reply.send(result.clone()).is_err() {
                warn!(session_id = %session_id, evaluator = %evaluator, "Evaluation waiter went away");
            }
        }
    }

    async fn publish(pipeline: &Pipeline, outcome: &EvaluationOutcome) {
        let session_id = match outcome {
            EvaluationOutcome::Attention(eval) => &eval.session_id,
            EvaluationOutcome::Pedagogy(eval) => &eval.session_id,
        };

        let room = Room::session(session_id.as_str());
        pipeline.publisher.publish(&room, outcome.to_realtime()).await;

        if let EvaluationOutcome::Pedagogy(eval) = outcome
            && eval.opened_gap()
        {
            let alert = RealtimeEvent::PedagogyAlert {
                session_id: eval.session_id.clone(),
                alerts: eval.alerts.clone(),
            };
            pipeline
                .publisher
                .publish(&Room::user(eval.tutor_id.as_str()), alert)
                .await;
        }
    }
}

impl Drop for EvaluationOrchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::attention::{AttentionEvent, AttentionEventType, NewAttentionEvent};
    use crate::error::StoreError;
    use crate::phase::{PhaseTransition, SessionPhase};
    use crate::realtime::{Delivery, RoomHub};
    use crate::session::{AttentionStatus, DerivedUpdate, PedagogyStatus, Session, SessionStatus};
    use crate::store::{ChatMessage, MemorySessionStore};

    /// Store whose first session read panics
    struct PanicOnceStore {
        inner: MemorySessionStore,
        armed: AtomicBool,
    }

    #[async_trait]
    impl SessionStore for PanicOnceStore {
        async fn insert_session(&self, session: Session) -> Result<Session, StoreError> {
            self.inner.insert_session(session).await
        }

        async fn get_session(&self, session_id: &str) -> Result<Session, StoreError> {
            if self.armed.swap(false, Ordering::SeqCst) {
                panic!("store failure while reading {session_id}");
            }
            self.inner.get_session(session_id).await
        }

        async fn set_status(
            &self,
            session_id: &str,
            status: SessionStatus,
        ) -> Result<Session, StoreError> {
            self.inner.set_status(session_id, status).await
        }

        async fn append_event(&self, event: AttentionEvent) -> Result<AttentionEvent, StoreError> {
            self.inner.append_event(event).await
        }

        async fn list_events(&self, session_id: &str) -> Result<Vec<AttentionEvent>, StoreError> {
            self.inner.list_events(session_id).await
        }

        async fn advance_phase(
            &self,
            session_id: &str,
            next: SessionPhase,
        ) -> Result<(Session, PhaseTransition), StoreError> {
            self.inner.advance_phase(session_id, next).await
        }

        async fn apply_derived(
            &self,
            session_id: &str,
            update: DerivedUpdate,
        ) -> Result<Session, StoreError> {
            self.inner.apply_derived(session_id, update).await
        }

        async fn append_message(&self, message: ChatMessage) -> Result<ChatMessage, StoreError> {
            self.inner.append_message(message).await
        }

        async fn list_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
            self.inner.list_messages(session_id).await
        }

        async fn session_count(&self) -> usize {
            self.inner.session_count().await
        }
    }

    async fn setup() -> (Arc<MemorySessionStore>, Arc<RoomHub>, EvaluationOrchestrator) {
        let store = Arc::new(MemorySessionStore::new());
        store
            .insert_session(Session::new("s1", "stu", "tut"))
            .await
            .unwrap();
        let hub = Arc::new(RoomHub::default());
        let orchestrator = EvaluationOrchestrator::new(store.clone(), hub.clone(), true);
        (store, hub, orchestrator)
    }

    async fn next_event(rx: &mut tokio::sync::broadcast::Receiver<Delivery>) -> RealtimeEvent {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for realtime event")
            .unwrap()
            .event
    }

    #[tokio::test]
    async fn trigger_publishes_status_update() {
        let (_store, hub, orchestrator) = setup().await;
        let mut rx = hub.subscribe(&Room::session("s1")).await;

        orchestrator.trigger("s1", Evaluator::Attention);

        match next_event(&mut rx).await {
            RealtimeEvent::AttentionStatusUpdated { status, alerts, .. } => {
                assert_eq!(status, AttentionStatus::LowPersonalization);
                assert_eq!(alerts.len(), 3);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn evaluate_waits_for_result() {
        let (store, _hub, orchestrator) = setup().await;
        for _ in 0..3 {
            let event = NewAttentionEvent::new("s1", "stu", "tut", AttentionEventType::Response)
                .into_event(chrono::Utc::now())
                .unwrap();
            store.append_event(event).await.unwrap();
        }

        let eval = orchestrator.evaluate_attention("s1").await.unwrap();
        assert_eq!(eval.scores.response, 3);
        assert_eq!(eval.alerts.len(), 2);
    }

    #[tokio::test]
    async fn evaluate_reports_unknown_session() {
        let (_store, _hub, orchestrator) = setup().await;
        let result = orchestrator.evaluate_pedagogy("ghost").await;
        assert!(matches!(result, Err(EngineError::NotFound(_))));
    }

    #[tokio::test]
    async fn failed_trigger_does_not_stop_pipeline() {
        let (_store, _hub, orchestrator) = setup().await;
        orchestrator.trigger("ghost", Evaluator::Pedagogy);

        let eval = orchestrator.evaluate_pedagogy("s1").await.unwrap();
        assert_eq!(eval.status, PedagogyStatus::PedagogyGap);
    }

    #[tokio::test]
    async fn panicking_worker_releases_session() {
        let store = Arc::new(PanicOnceStore {
            inner: MemorySessionStore::new(),
            armed: AtomicBool::new(false),
        });
        store
            .insert_session(Session::new("s1", "stu", "tut"))
            .await
            .unwrap();
        store.armed.store(true, Ordering::SeqCst);
        let hub = Arc::new(RoomHub::default());
        let orchestrator = EvaluationOrchestrator::new(store.clone(), hub, true);

        let first = orchestrator.evaluate_pedagogy("s1").await;
        assert!(matches!(first, Err(EngineError::PipelineStopped)));

        let retry = orchestrator.evaluate_pedagogy("s1");
        let second = tokio::time::timeout(Duration::from_secs(2), retry)
            .await
            .expect("evaluation stuck after worker panic")
            .unwrap();
        assert_eq!(second.status, PedagogyStatus::PedagogyGap);
    }

    #[tokio::test]
    async fn gap_notifies_tutor_room() {
        let (_store, hub, orchestrator) = setup().await;
        let mut tutor = hub.subscribe(&Room::user("tut")).await;

        orchestrator.evaluate_pedagogy("s1").await.unwrap();

        match next_event(&mut tutor).await {
            RealtimeEvent::PedagogyAlert { session_id, alerts } => {
                assert_eq!(session_id, "s1");
                assert!(!alerts.is_empty());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn disabled_orchestrator_drops_triggers() {
        let store = Arc::new(MemorySessionStore::new());
        store
            .insert_session(Session::new("s1", "stu", "tut"))
            .await
            .unwrap();
        let hub = Arc::new(RoomHub::default());
        let orchestrator = EvaluationOrchestrator::new(store.clone(), hub.clone(), false);
        let mut rx = hub.subscribe(&Room::session("s1")).await;

        orchestrator.trigger("s1", Evaluator::Attention);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(rx.try_recv().is_err());
        assert!(store.get_session("s1").await.unwrap().evaluation_meta.is_empty());
    }

    #[tokio::test]
    async fn shutdown_rejects_foreground_evaluation() {
        let (_store, _hub, orchestrator) = setup().await;
        orchestrator.shutdown();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let result = orchestrator.evaluate_attention("s1").await;
        assert!(matches!(result, Err(EngineError::PipelineStopped)));
    }
}
