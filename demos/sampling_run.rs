//! Wires the scheduler up to every sampler and prints each emitted batch.
//! Startup sequence: load `.env`, install a `tracing_subscriber::fmt`
//! layer with an `EnvFilter`, then build `AgentConfig` from the
//! environment — the same order a long-running service would use, just
//! bounded to a one-shot demo run.

use std::time::Duration;

use hostmetrics_core::config::AgentConfig;
use hostmetrics_core::heartbeat::HeartbeatSampler;
use hostmetrics_core::process::ProcessSampler;
use hostmetrics_core::scheduler::Scheduler;
use hostmetrics_core::system::SystemSampler;
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hostmetrics_core=info".into()),
        )
        .init();

    info!("starting hostmetrics-core demo sampling run");

    let config = AgentConfig::from_env();
    let scheduler = Scheduler::new();
    let sweeper = scheduler.spawn_listening_sockets_sweeper();

    let (tx, mut rx) = mpsc::channel(64);

    let system = scheduler.spawn(
        Box::new(SystemSampler::new(hostmetrics_core::platform::current(), &config)),
        tx.clone(),
    );
    let process = scheduler.spawn(
        Box::new(ProcessSampler::new(hostmetrics_core::platform::current(), &config)),
        tx.clone(),
    );
    let heartbeat = scheduler.spawn(
        Box::new(HeartbeatSampler::new(config.heartbeat_interval)),
        tx.clone(),
    );
    drop(tx);

    let run_for = Duration::from_secs(
        std::env::var("DEMO_RUN_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30),
    );

    let drain = tokio::spawn(async move {
        while let Some(batch) = rx.recv().await {
            for event in batch {
                match serde_json::to_string(&event) {
                    Ok(json) => println!("{json}"),
                    Err(err) => tracing::warn!(error = %err, "failed to serialize event"),
                }
            }
        }
    });

    tokio::time::sleep(run_for).await;

    system.stop().await;
    process.stop().await;
    heartbeat.stop().await;
    sweeper.stop().await;
    let _ = drain.await;

    info!("demo sampling run complete");
    Ok(())
}
