//! Enrollment worker process.
//!
//! Connects to the record store and the queue, then runs the enrollment
//! worker until SIGINT or SIGTERM. On a signal the worker finishes its
//! current batch, releases the queue connection and the process exits 0.

use std::sync::Arc;

use actors::{ActorRef, ApproveAll, WorkerArgs, WorkerMessage, start_worker};
use db::EnrollmentRepository;
use queue::QueueClient;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinHandle;

mod config;
mod logging;

use config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = AppConfig::from_env()?;

    let db = db::connect(&config.db).await?;
    let repo = EnrollmentRepository::new(db);

    let queue = Arc::new(QueueClient::new(config.queue)?);
    tracing::info!(backend = queue.kind().as_str(), "Queue client ready");

    let args = WorkerArgs::new(queue, repo, ApproveAll).with_settings(config.worker);
    let (worker, handle) = start_worker(args).await?;

    supervise(worker, handle, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Run until `signal` resolves, then stop the worker after its current batch.
///
/// A worker that stops before any signal is reported as an error so the
/// process exits non-zero.
async fn supervise<F>(
    worker: ActorRef<WorkerMessage>,
    mut handle: JoinHandle<()>,
    signal: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = std::io::Result<&'static str>>,
{
    let exited_early = tokio::select! {
        received = signal => {
            tracing::info!(signal = received?, "Received signal, shutting down");
            false
        }
        result = &mut handle => {
            result?;
            true
        }
    };

    if exited_early {
        tracing::error!("Enrollment worker exited without a shutdown signal");
        return Err("enrollment worker stopped unexpectedly".into());
    }

    worker.send_message(WorkerMessage::Shutdown)?;
    handle.await?;
    Ok(())
}

/// Resolve once SIGINT or SIGTERM arrives, naming the signal.
async fn shutdown_signal() -> std::io::Result<&'static str> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    Ok(tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    })
}
