//! Voice render worker binary
//!
//! Reads newline-delimited job submissions from stdin:
//!
//! ```text
//! {"kind": "tts", "params": {"voice_id": "v1", "text": "Привет."}}
//! ```
//!
//! Prints each job id as it is submitted, drains the lanes once stdin
//! closes, then prints the final status of every job as JSON.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use voice_render_config::Settings;
use voice_render_core::{JobKind, Params};
use voice_render_worker::{init_tracing, ContextFactory, JobOrchestrator, JobQueue, WorkerContext, WorkerPool};

#[derive(Debug, Deserialize)]
struct Submission {
    kind: JobKind,
    #[serde(default)]
    params: Params,
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(settings.log_format);
    settings.ensure_dirs().context("creating data directories")?;

    let store = voice_render_persistence::init(&settings.store)
        .await
        .context("opening job store")?;
    tracing::info!(store = store.name(), "Job store ready");

    let (queue, receivers) = JobQueue::new();
    let orchestrator = Arc::new(JobOrchestrator::new(store, queue, &settings));

    let factory_settings = settings.clone();
    let factory: ContextFactory = Arc::new(move || WorkerContext::from_settings(&factory_settings));
    let pool = WorkerPool::spawn(orchestrator.clone(), receivers, &settings.workers, factory);

    let mut submitted = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let submission: Submission = match serde_json::from_str(line) {
            Ok(submission) => submission,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed submission");
                continue;
            }
        };
        let job_id = orchestrator
            .submit(submission.kind, submission.params)
            .await
            .context("submitting job")?;
        println!("{}", job_id);
        submitted.push(job_id);
    }

    orchestrator.close_queue();
    pool.join().await;

    for job_id in &submitted {
        let view = orchestrator.get_status(job_id).await?;
        println!(
            "{}",
            serde_json::json!({ "job_id": job_id, "status": view })
        );
    }
    Ok(())
}
