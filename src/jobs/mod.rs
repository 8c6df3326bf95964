use crate::{context::AppContext, error::HoaxResult};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<AppContext>,
}

/// Running background jobs
///
/// Dropping the handle without calling `shutdown` leaves the jobs running
/// until the runtime stops.
pub struct JobHandle {
    shutdown_tx: watch::Sender<bool>,
    jobs: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self) -> JobHandle {
        info!("Starting background job scheduler");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = self.context.config.clone();

        let jobs = vec![
            spawn_job(
                "expired session cleanup",
                config.session.sweep_interval,
                self.context.clone(),
                shutdown_rx.clone(),
                |ctx| async move { tasks::cleanup_expired_sessions(&ctx).await },
            ),
            spawn_job(
                "orphaned attachment cleanup",
                config.attachments.sweep_interval,
                self.context.clone(),
                shutdown_rx,
                |ctx| async move { tasks::cleanup_orphaned_attachments(&ctx).await },
            ),
        ];

        info!("Background jobs started");

        JobHandle { shutdown_tx, jobs }
    }
}

impl JobHandle {
    /// Signal every job to stop and wait for them to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);

        for job in self.jobs {
            if let Err(e) = job.await {
                error!("Background job ended abnormally: {}", e);
            }
        }

        info!("Background jobs stopped");
    }
}

/// Run `task` every `period` until shutdown is signalled
///
/// The first run happens immediately. A run in progress is allowed to finish
/// before the shutdown signal is observed.
fn spawn_job<F, Fut>(
    name: &'static str,
    period: Duration,
    ctx: Arc<AppContext>,
    mut shutdown: watch::Receiver<bool>,
    task: F,
) -> JoinHandle<()>
where
    F: Fn(Arc<AppContext>) -> Fut + Send + 'static,
    Fut: Future<Output = HoaxResult<u64>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("Running {}", name);

                    match task(ctx.clone()).await {
                        Ok(count) => debug!(count, "Finished {}", name),
                        Err(e) => error!("Failed to run {}: {}", name, e),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("Stopping {}", name);
                        break;
                    }
                }
            }
        }
    })
}
