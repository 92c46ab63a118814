//! Background scheduler for the stale-request reaper and the expiry notifier.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::state::AppState;

/// Handles of the running job loops
pub struct Scheduler {
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawn a loop for every job with a configured period
    pub fn start(state: &AppState) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let mut tasks = Vec::new();

        if let Some(period) = state.config.reaper_interval {
            let reaper = state.reaper.clone();
            let shutdown = shutdown_tx.subscribe();
            tasks.push(tokio::spawn(run_every("reaper", period, shutdown, move || {
                let reaper = reaper.clone();
                async move {
                    let outcome = reaper.reap().await?;
                    tracing::info!(expired = outcome.expired_count, "Scheduled reaper run finished");
                    Ok(())
                }
            })));
        } else {
            tracing::info!("Stale-request reaper disabled");
        }

        if let Some(period) = state.config.notifier_interval {
            let notifier = state.notifier.clone();
            let shutdown = shutdown_tx.subscribe();
            tasks.push(tokio::spawn(run_every("notifier", period, shutdown, move || {
                let notifier = notifier.clone();
                async move {
                    let outcome = notifier.check_and_notify().await?;
                    tracing::info!(
                        checked = outcome.checked,
                        sent = outcome.sent,
                        failed = outcome.failed,
                        "Scheduled notifier run finished"
                    );
                    Ok(())
                }
            })));
        } else {
            tracing::info!("Expiry notifier disabled");
        }

        Self { shutdown_tx, tasks }
    }

    /// Stop every loop and wait for in-flight runs to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!(error = ?e, "Scheduler task panicked");
            }
        }
    }
}

async fn run_every<F, Fut>(
    job: &'static str,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
    run: F,
) where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<(), spotter_core::SubscriptionError>>,
{
    tracing::info!(job, period_secs = period.as_secs(), "Starting scheduled job");

    // First run one period after startup
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = run().await {
                    tracing::error!(job, error = %e, "Scheduled job failed");
                }
            }
            _ = shutdown.recv() => {
                tracing::info!(job, "Scheduled job shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_run_every_ticks_until_shutdown() {
        let runs = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = broadcast::channel(1);

        let counter = runs.clone();
        let task = tokio::spawn(run_every("test", Duration::from_secs(60), rx, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        tx.send(()).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_every_survives_job_errors() {
        let runs = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = broadcast::channel(1);

        let counter = runs.clone();
        let task = tokio::spawn(run_every("failing", Duration::from_secs(10), rx, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(spotter_core::SubscriptionError::Internal("boom".into()))
            }
        }));

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        tx.send(()).unwrap();
        task.await.unwrap();
    }
}
