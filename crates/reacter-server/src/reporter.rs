use reacter_alert::ThresholdEngine;
use reacter_common::types::OutboundMessage;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing;

/// Sends one round of stats. Returns how many value lists were sent, or
/// `None` once the outbound channel is closed.
pub async fn report_once(engine: &ThresholdEngine, tx: &mpsc::Sender<OutboundMessage>) -> Option<usize> {
    let stats = engine.report_stats();
    let count = stats.len();
    for vl in stats {
        if tx.send(OutboundMessage::Values(vl)).await.is_err() {
            return None;
        }
    }
    Some(count)
}

/// Reports stats every `every` until the outbound channel closes.
pub async fn run_stats_reporter(
    engine: Arc<ThresholdEngine>,
    every: Duration,
    tx: mpsc::Sender<OutboundMessage>,
) {
    let mut tick = interval(every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick completes immediately
    tick.tick().await;

    loop {
        tick.tick().await;
        match report_once(&engine, &tx).await {
            Some(count) => tracing::debug!(count, "Reported threshold stats"),
            None => {
                tracing::debug!("Outbound channel closed, stopping stats reporter");
                return;
            }
        }
    }
}
