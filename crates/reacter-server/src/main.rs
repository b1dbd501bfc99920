use anyhow::Result;
use reacter_server::config;
use reacter_server::input;
use reacter_server::output;
use reacter_server::pipeline::Pipeline;
use reacter_server::reporter;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{timeout, Duration};
use tracing_subscriber::EnvFilter;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  reacter-server [config.toml]                 Read value lists from stdin and react to thresholds");
    eprintln!("  reacter-server check-config <config.toml>    Validate the config and threshold file, then exit");
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries outbound messages, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("reacter=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("check-config") => {
            let config_path = args.get(2).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("check-config requires <config.toml> argument")
            })?;
            run_check_config(config_path)
        }
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        _ => {
            let config_path = args
                .get(1)
                .map(|s| s.as_str())
                .unwrap_or("config/reacter.toml");
            run_server(config_path).await
        }
    }
}

fn run_check_config(config_path: &str) -> Result<()> {
    let (config, thresholds) = config::load(config_path)?;
    tracing::info!(
        config = %config_path,
        hosts = thresholds.thresholds.hosts.len(),
        rules = thresholds.thresholds.rule_count(),
        report_stats = config.report_stats,
        "Configuration OK"
    );
    Ok(())
}

async fn run_server(config_path: &str) -> Result<()> {
    let (config, thresholds) = config::load(config_path)?;

    tracing::info!(
        config = %config_path,
        rules = thresholds.thresholds.rule_count(),
        report_stats = config.report_stats,
        stats_interval_secs = config.stats_interval_secs,
        "reacter starting"
    );

    let (tx, rx) = mpsc::channel(config.outbound_buffer.max(1));
    let writer_handle = tokio::spawn(output::run_writer(rx, tokio::io::stdout()));

    let pipeline = Pipeline::build(&config, &thresholds, Some(tx.clone()))?;

    let reporter_handle = if config.report_stats {
        tracing::info!(interval_secs = config.stats_interval_secs, "Stats reporter started");
        Some(tokio::spawn(reporter::run_stats_reporter(
            Arc::clone(pipeline.engine()),
            Duration::from_secs(config.stats_interval_secs),
            tx.clone(),
        )))
    } else {
        None
    };
    drop(tx);

    // Not tokio::io::stdin: runtime shutdown waits on its blocking read.
    let lines = input::spawn_stdin_reader(config.outbound_buffer)?;
    let mut observers = JoinSet::new();

    tokio::select! {
        summary = pipeline.run_lines(lines, &mut observers) => {
            tracing::info!(
                batches = summary.batches,
                malformed = summary.malformed,
                dispatched = summary.dispatched,
                "Input closed"
            );
        }
        _ = signal::ctrl_c() => {
            tracing::info!("Shutting down gracefully");
        }
    }

    if let Some(h) = reporter_handle {
        h.abort();
    }

    // Let in-flight actions finish before closing the outbound channel.
    let drained = timeout(SHUTDOWN_GRACE, async {
        while observers.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        tracing::warn!(
            pending = observers.len(),
            "Actions still running at shutdown, abandoning them"
        );
        observers.abort_all();
    }
    drop(pipeline);

    match timeout(SHUTDOWN_GRACE, writer_handle).await {
        Ok(Ok(Ok(written))) => tracing::debug!(written, "Outbound writer drained"),
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "Outbound writer failed"),
        Ok(Err(e)) => tracing::error!(error = %e, "Outbound writer panicked"),
        Err(_) => tracing::warn!("Outbound writer did not drain in time"),
    }

    tracing::info!("Stopping reacter");
    Ok(())
}
