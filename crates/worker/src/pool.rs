//! Worker pool
//!
//! Spawns the configured number of workers per lane. Workers build their own
//! [`WorkerContext`] once, then pull job ids until the lane is closed and
//! drained. A failed job is logged and dropped; the worker moves on.

use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use voice_render_config::WorkerSettings;
use voice_render_core::Result;

use crate::context::WorkerContext;
use crate::orchestrator::JobOrchestrator;
use crate::queue::{Lane, LaneReceiver, QueueReceivers};

/// Builds one worker's context; called once per worker at startup
pub type ContextFactory = Arc<dyn Fn() -> Result<WorkerContext> + Send + Sync>;

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(
        orchestrator: Arc<JobOrchestrator>,
        receivers: QueueReceivers,
        settings: &WorkerSettings,
        factory: ContextFactory,
    ) -> Self {
        let mut handles = Vec::new();
        for lane in Lane::ALL {
            let count = match lane {
                Lane::Preview => settings.preview,
                Lane::Train => settings.train,
                Lane::Render => settings.render,
            };
            for index in 0..count {
                handles.push(tokio::spawn(run_worker(
                    lane,
                    index,
                    orchestrator.clone(),
                    receivers.lane(lane),
                    factory.clone(),
                )));
            }
        }

        tracing::info!(
            preview = settings.preview,
            train = settings.train,
            render = settings.render,
            "Worker pool started"
        );
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every worker to exit; close the queue first
    pub async fn join(self) {
        for result in join_all(self.handles).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Worker task aborted");
            }
        }
        tracing::info!("Worker pool stopped");
    }
}

async fn run_worker(
    lane: Lane,
    index: usize,
    orchestrator: Arc<JobOrchestrator>,
    receiver: LaneReceiver,
    factory: ContextFactory,
) {
    let ctx = match factory() {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(lane = %lane, worker = index, error = %e, "Worker context failed to build");
            return;
        }
    };
    tracing::debug!(
        lane = %lane,
        worker = index,
        engine = ctx.engine.name(),
        accenter = ctx.frontend.accenter_name(),
        "Worker ready"
    );

    loop {
        let next = receiver.lock().await.recv().await;
        let Some(job_id) = next else {
            break;
        };

        if let Err(e) = orchestrator.process(&ctx, &job_id).await {
            tracing::warn!(lane = %lane, worker = index, job_id = %job_id, error = %e, "Job dropped after failure");
        }
    }

    tracing::debug!(lane = %lane, worker = index, "Worker exiting, lane drained");
}
