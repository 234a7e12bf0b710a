//! Terminal-event routing.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::notification::NotificationDispatcher;
use crate::recorder::{RecordOutcome, SessionRecorder};
use crate::store::SessionStore;

use super::engine::{TerminalRun, TimerEvent};

/// Consumes engine events: asks for notification permission on the first
/// start of a run, dispatches completion feedback and records terminated
/// runs.
///
/// Saves run on their own tasks, so a slow store never holds up the
/// event stream or the timer.
pub struct SessionPipeline<S> {
    recorder: Arc<SessionRecorder<S>>,
    dispatcher: Arc<NotificationDispatcher>,
    outcomes: Option<mpsc::UnboundedSender<RecordOutcome>>,
}

impl<S: SessionStore> SessionPipeline<S> {
    pub fn new(recorder: Arc<SessionRecorder<S>>, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self {
            recorder,
            dispatcher,
            outcomes: None,
        }
    }

    /// Reports every record outcome on `tx`.
    pub fn with_outcomes(mut self, tx: mpsc::UnboundedSender<RecordOutcome>) -> Self {
        self.outcomes = Some(tx);
        self
    }

    /// Runs the pipeline on a new task until the engine is dropped.
    pub fn spawn(self, events: mpsc::UnboundedReceiver<TimerEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }

    pub async fn run(self, mut events: mpsc::UnboundedReceiver<TimerEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        debug!("timer event stream closed");
    }

    /// Handles a single event.
    pub fn handle(&self, event: TimerEvent) {
        match event {
            TimerEvent::Started { new_run: true } => {
                self.dispatcher.ensure_permission();
            }
            TimerEvent::Completed(run) => {
                self.dispatcher.on_completion(&run);
                self.record(run);
            }
            TimerEvent::Stopped(Some(run)) => self.record(run),
            TimerEvent::Started { .. }
            | TimerEvent::Paused
            | TimerEvent::Tick { .. }
            | TimerEvent::Stopped(None)
            | TimerEvent::Reset => {}
        }
    }

    fn record(&self, run: TerminalRun) {
        let recorder = Arc::clone(&self.recorder);
        let outcomes = self.outcomes.clone();

        tokio::spawn(async move {
            let outcome = recorder.record(&run).await;
            if let Some(tx) = outcomes {
                let _ = tx.send(outcome);
            }
        });
    }
}
