use crate::config::{ConfigError, ServerConfig};
use reacter_alert::config::ThresholdConfig;
use reacter_alert::ThresholdEngine;
use reacter_common::types::{OutboundMessage, ValueList};
use reacter_notify::actions::exec::ExecAction;
use reacter_notify::actions::notify::NotifyAction;
use reacter_notify::dispatcher::{ActionDispatcher, DispatchHandle};
use reacter_notify::plugin::ActionRegistry;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub batches: u64,
    pub malformed: u64,
    pub dispatched: u64,
}

/// Ingestion path: value list → engine → dispatcher.
pub struct Pipeline {
    engine: Arc<ThresholdEngine>,
    dispatcher: Arc<ActionDispatcher>,
}

impl Pipeline {
    pub fn new(engine: Arc<ThresholdEngine>, dispatcher: Arc<ActionDispatcher>) -> Self {
        Self { engine, dispatcher }
    }

    /// Builds the engine and the action registry. `notify` is registered
    /// only when an outbound channel is available.
    pub fn build(
        config: &ServerConfig,
        thresholds: &ThresholdConfig,
        outbound: Option<mpsc::Sender<OutboundMessage>>,
    ) -> Result<Self, ConfigError> {
        let engine = ThresholdEngine::from_thresholds(&thresholds.thresholds)?;

        let mut registry = ActionRegistry::empty().with(Arc::new(ExecAction::new(config.exec.clone())));
        if let Some(sender) = outbound {
            registry.register(Arc::new(NotifyAction::new(sender)));
        }
        let dispatcher = ActionDispatcher::new(registry, thresholds.thresholds.params.clone());

        Ok(Self::new(Arc::new(engine), Arc::new(dispatcher)))
    }

    pub fn engine(&self) -> &Arc<ThresholdEngine> {
        &self.engine
    }

    pub fn dispatcher(&self) -> &Arc<ActionDispatcher> {
        &self.dispatcher
    }

    /// Evaluates one value list and dispatches every reportable transition.
    pub fn process(&self, vl: &ValueList) -> Vec<DispatchHandle> {
        self.engine
            .ingest(vl)
            .iter()
            .flat_map(|transition| self.dispatcher.dispatch(transition))
            .collect()
    }

    /// Parses and processes one JSON line. Blank lines are ignored.
    pub fn handle_line(&self, line: &str) -> Result<Vec<DispatchHandle>, serde_json::Error> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Vec::new());
        }
        let vl: ValueList = serde_json::from_str(line)?;
        Ok(self.process(&vl))
    }

    /// Reads JSON lines until end of input. Each dispatched action is
    /// watched by a task in `observers` that only logs its outcome.
    pub async fn run<R>(&self, reader: R, observers: &mut JoinSet<()>) -> std::io::Result<IngestSummary>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut summary = IngestSummary::default();
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            self.accept(&line, &mut summary, observers);
        }
        Ok(summary)
    }

    /// Like [`run`](Self::run), but takes lines already split by a reader
    /// thread (see [`crate::input::spawn_stdin_reader`]). Ends when every
    /// sender is gone.
    pub async fn run_lines(
        &self,
        mut lines: mpsc::Receiver<String>,
        observers: &mut JoinSet<()>,
    ) -> IngestSummary {
        let mut summary = IngestSummary::default();
        while let Some(line) = lines.recv().await {
            self.accept(&line, &mut summary, observers);
        }
        summary
    }

    fn accept(&self, line: &str, summary: &mut IngestSummary, observers: &mut JoinSet<()>) {
        if line.trim().is_empty() {
            return;
        }
        match self.handle_line(line) {
            Ok(handles) => {
                summary.batches += 1;
                summary.dispatched += handles.len() as u64;
                for handle in handles {
                    observers.spawn(observe(handle));
                }
            }
            Err(e) => {
                summary.malformed += 1;
                tracing::warn!(error = %e, "Skipping malformed input line");
            }
        }
        while observers.try_join_next().is_some() {}
    }
}

async fn observe(handle: DispatchHandle) {
    let kind = handle.kind;
    let host = handle.host.clone();
    let metric = handle.metric.clone();
    match handle.join().await {
        Ok(outcome) => tracing::debug!(
            kind = %kind,
            host = %host,
            metric = %metric,
            exit_code = outcome.exit_code,
            "Action completed"
        ),
        Err(e) => tracing::warn!(
            kind = %kind,
            host = %host,
            metric = %metric,
            error = %e,
            "Action failed"
        ),
    }
}
