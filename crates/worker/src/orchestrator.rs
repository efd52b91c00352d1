//! Job orchestration
//!
//! Owns the job lifecycle:
//!
//! ```text
//! submit ──► pending ──pickup──► running ──► preprocess ──► resolve references
//!                                                 │
//!                      done ◄── assemble ◄── synthesize chunks
//! ```
//!
//! Every state change is a short, independently committed [`JobTxn`]. Any
//! error drops the in-flight transaction, reloads the job and records it as
//! failed, except persistence errors which are handed back untouched.

use metrics::{counter, histogram};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use voice_render_config::constants::progress;
use voice_render_config::{PathSettings, Settings};
use voice_render_core::voice::REFERENCES_KEY;
use voice_render_core::{
    Artifact, Error, Job, JobKind, JobStatus, JobStatusView, JobStore, JobUpdate, Params,
    PreviewRequest, ProfileStatus, ProfileUpdate, Result, SynthesisRequest, TextMode,
    TrainRequest, TtsRequest, VoiceProfile,
};
use voice_render_pipeline::{analyze_file, AssemblyItem, Pauses, SampleAnalysis};
use voice_render_text_processing::{
    split_poem, split_story, to_stress_hint_format, TextFrontend, Utterance,
};

use crate::context::WorkerContext;
use crate::queue::JobQueue;
use crate::references::{resolve_latest_sample, resolve_references, ProfileCache};
use crate::txn::JobTxn;

pub const ARTIFACT_TTS: &str = "tts";
pub const ARTIFACT_PREVIEW: &str = "preview";
pub const ARTIFACT_PROFILE: &str = "profile";

/// Derived job fields appended during processing
pub const PREPARED_TEXT_KEY: &str = "prepared_text";
pub const CHUNKS_KEY: &str = "chunks";
pub const PROFILE_ID_KEY: &str = "profile_id";

const PROFILE_STRATEGY: &str = "reference-cache";

/// Progress after `completed` of `total` chunks: `min(95, floor(completed / total * 90) + 5)`
pub fn synthesis_progress(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return progress::SYNTH_CAP;
    }
    let share = completed.min(total) * progress::SYNTH_SPAN as usize / total;
    (share as u8 + progress::SYNTH_BASE).min(progress::SYNTH_CAP)
}

pub struct JobOrchestrator {
    store: Arc<dyn JobStore>,
    queue: JobQueue,
    paths: PathSettings,
    cloning_mode: String,
    language: String,
    sample_rate: u32,
}

impl JobOrchestrator {
    pub fn new(store: Arc<dyn JobStore>, queue: JobQueue, settings: &Settings) -> Self {
        Self {
            store,
            queue,
            paths: settings.paths.clone(),
            cloning_mode: settings.synthesis.cloning_mode.clone(),
            language: settings.synthesis.language.clone(),
            sample_rate: settings.audio.sample_rate,
        }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// Stop accepting submissions; workers exit once the lanes drain
    pub fn close_queue(&self) {
        self.queue.close();
    }

    /// Create a pending job and enqueue it on its kind's lane
    pub async fn submit(&self, kind: JobKind, params: Params) -> Result<String> {
        self.submit_job(Job::new(kind, params)).await
    }

    pub async fn get_status(&self, job_id: &str) -> Result<JobStatusView> {
        self.store
            .get_job(job_id)
            .await?
            .map(|job| JobStatusView::from(&job))
            .ok_or_else(|| Error::JobNotFound(job_id.to_string()))
    }

    /// Submit a brand-new job with the original's input parameters
    pub async fn retry(&self, job_id: &str) -> Result<String> {
        let original = self
            .store
            .get_job(job_id)
            .await?
            .ok_or_else(|| Error::JobNotFound(job_id.to_string()))?;
        let new_id = self.submit_job(original.retry_clone()).await?;
        tracing::info!(job_id = %new_id, retry_of = job_id, "Job resubmitted");
        Ok(new_id)
    }

    async fn submit_job(&self, job: Job) -> Result<String> {
        let kind = job.kind;
        let job = self.store.create_job(job).await?;
        match self.queue.enqueue(kind, &job.id) {
            Ok(lane) => {
                counter!("voice_render_jobs_submitted_total", "kind" => kind.as_str()).increment(1);
                tracing::info!(job_id = %job.id, kind = %kind, lane = %lane, "Job submitted");
                Ok(job.id)
            }
            Err(e) => {
                // Never leave an undeliverable job pending
                if let Err(update_err) = self
                    .store
                    .update_job(&job.id, JobUpdate::failed(e.to_string()))
                    .await
                {
                    tracing::error!(job_id = %job.id, error = %update_err, "Could not fail undeliverable job");
                }
                Err(e)
            }
        }
    }

    /// Run one delivered job to a terminal state
    pub async fn process(&self, ctx: &WorkerContext, job_id: &str) -> Result<Job> {
        let started = Instant::now();
        let span = tracing::info_span!("job", job_id);

        let result = async {
            let job = self
                .store
                .get_job(job_id)
                .await?
                .ok_or_else(|| Error::JobNotFound(job_id.to_string()))?;
            match job.kind {
                JobKind::Preview => self.run_preview(ctx, &job).await,
                JobKind::Train => self.run_train(ctx, &job).await,
                JobKind::Tts => self.run_tts(ctx, &job).await,
            }
        }
        .instrument(span)
        .await;

        match result {
            Ok(job) => {
                let elapsed = started.elapsed().as_secs_f64();
                counter!("voice_render_jobs_total", "kind" => job.kind.as_str(), "status" => "done")
                    .increment(1);
                histogram!("voice_render_job_seconds", "kind" => job.kind.as_str()).record(elapsed);
                tracing::info!(
                    job_id,
                    kind = %job.kind,
                    output = ?job.output_path,
                    elapsed_secs = elapsed,
                    "Job done"
                );
                Ok(job)
            }
            Err(err) => {
                counter!("voice_render_jobs_total", "status" => "failed").increment(1);
                self.record_failure(job_id, err).await
            }
        }
    }

    /// Reload the job and mark it failed, then hand the error back
    async fn record_failure(&self, job_id: &str, err: Error) -> Result<Job> {
        if err.is_persistence() {
            tracing::error!(job_id, error = %err, "Store failure, job status left as committed");
            return Err(err);
        }

        match self.store.get_job(job_id).await {
            Ok(Some(job)) if job.is_terminal() => {
                tracing::debug!(job_id, status = %job.status, "Job already terminal");
            }
            Ok(Some(_)) => {
                let recorded = JobTxn::begin(self.store.as_ref(), job_id)
                    .stage(JobUpdate::failed(err.to_string()))
                    .commit()
                    .await;
                match recorded {
                    Ok(_) => tracing::warn!(job_id, error = %err, "Job failed"),
                    Err(e) => tracing::error!(job_id, error = %e, "Could not record job failure"),
                }
            }
            Ok(None) => tracing::warn!(job_id, error = %err, "Job not found while recording failure"),
            Err(e) => tracing::error!(job_id, error = %e, "Could not reload job to record failure"),
        }
        Err(err)
    }

    async fn pickup(&self, job: &Job, checkpoint: u8) -> Result<Job> {
        let job = JobTxn::begin(self.store.as_ref(), &job.id)
            .stage(JobUpdate::new().status(JobStatus::Running).progress(checkpoint))
            .commit()
            .await?;
        tracing::debug!(kind = %job.kind, progress = job.progress, "Job picked up");
        Ok(job)
    }

    async fn set_progress(&self, job_id: &str, value: u8) -> Result<Job> {
        JobTxn::begin(self.store.as_ref(), job_id)
            .stage(JobUpdate::new().progress(value))
            .commit()
            .await
    }

    async fn record_prepared(&self, job_id: &str, prepared: &str, chunks: usize) -> Result<Job> {
        JobTxn::begin(self.store.as_ref(), job_id)
            .stage(
                JobUpdate::new()
                    .derive(PREPARED_TEXT_KEY, prepared)
                    .derive(CHUNKS_KEY, chunks),
            )
            .commit()
            .await
    }

    /// Persist the artifact, then commit `done`
    async fn finish(
        &self,
        job: &Job,
        artifact_kind: &str,
        output: PathBuf,
        metadata: Params,
        extra: JobUpdate,
    ) -> Result<Job> {
        self.store
            .add_artifact(Artifact::new(job.id.clone(), artifact_kind, output.clone(), metadata))
            .await?;
        JobTxn::begin(self.store.as_ref(), &job.id)
            .stage(extra)
            .stage(JobUpdate::done(output))
            .commit()
            .await
    }

    async fn synthesize(
        &self,
        ctx: &WorkerContext,
        text: &str,
        output_path: &Path,
        speed: f32,
        references: &[PathBuf],
        language: &str,
    ) -> Result<()> {
        let started = Instant::now();
        ctx.engine
            .synthesize(SynthesisRequest {
                text,
                output_path,
                speed,
                references,
                language,
            })
            .await?;
        histogram!("voice_render_synthesis_seconds", "engine" => ctx.engine.name().to_string())
            .record(started.elapsed().as_secs_f64());
        Ok(())
    }

    async fn run_tts(&self, ctx: &WorkerContext, job: &Job) -> Result<Job> {
        self.pickup(job, progress::PICKUP).await?;
        let request = TtsRequest::from_params(&job.input_params)?;

        ctx.frontend.reload_overrides();
        let utterances = prepare_utterances(&ctx.frontend, &request).await;
        let total = utterances.iter().filter(|u| !u.is_stanza_break()).count();
        if total == 0 {
            return Err(Error::EmptyText);
        }
        self.record_prepared(&job.id, &joined_text(&utterances), total)
            .await?;

        let references = resolve_references(
            self.store.as_ref(),
            &request.voice_id,
            request.profile_id.as_deref(),
        )
        .await?;

        let chunk_dir = self.paths.jobs_dir.join(&job.id);
        tokio::fs::create_dir_all(&chunk_dir).await?;

        let mut items = Vec::with_capacity(utterances.len());
        let mut completed = 0;
        for utterance in &utterances {
            let text = match utterance {
                Utterance::Text(text) => text,
                Utterance::StanzaBreak => {
                    items.push(AssemblyItem::StanzaBreak);
                    continue;
                }
            };

            completed += 1;
            let chunk_path = chunk_dir.join(format!("chunk_{}.wav", completed));
            self.synthesize(
                ctx,
                text,
                &chunk_path,
                request.speed,
                &references,
                &request.language,
            )
            .await?;
            items.push(AssemblyItem::Chunk(chunk_path));

            let value = synthesis_progress(completed, total);
            self.set_progress(&job.id, value).await?;
            tracing::debug!(chunk = completed, total, progress = value, "Chunk synthesized");
        }

        let temp_wav = self.paths.outputs_dir.join(format!("{}.wav", job.id));
        let final_path = self
            .paths
            .outputs_dir
            .join(format!("{}.{}", job.id, request.format.extension()));
        ctx.assembler
            .assemble(&items, &temp_wav, Pauses::for_mode(request.mode))
            .await?;
        let delivered = ctx
            .assembler
            .transcode_if_needed(&temp_wav, &final_path)
            .await?;
        if delivered != temp_wav {
            tokio::fs::remove_file(&temp_wav).await?;
        }

        let mut metadata = Params::new();
        metadata.insert("mode".into(), json!(request.mode));
        self.finish(job, ARTIFACT_TTS, delivered, metadata, JobUpdate::new())
            .await
    }

    async fn run_preview(&self, ctx: &WorkerContext, job: &Job) -> Result<Job> {
        self.pickup(job, progress::PREVIEW_PICKUP).await?;
        let request = PreviewRequest::from_params(&job.input_params)?;

        ctx.frontend.reload_overrides();
        let text = ctx
            .frontend
            .preprocess(
                &request.text,
                request.use_accenting,
                request.use_user_overrides,
                request.accent_mode,
            )
            .await;
        if text.is_empty() {
            return Err(Error::EmptyText);
        }
        self.record_prepared(&job.id, &text, 1).await?;

        let references = resolve_latest_sample(
            self.store.as_ref(),
            &request.voice_id,
            request.profile_id.as_deref(),
        )
        .await?;

        let output = self
            .paths
            .outputs_dir
            .join(&request.voice_id)
            .join(format!("preview_{}.wav", job.id));
        self.synthesize(ctx, &text, &output, 1.0, &references, &request.language)
            .await?;

        let mut metadata = Params::new();
        metadata.insert(REFERENCES_KEY.into(), json!(references));
        self.finish(job, ARTIFACT_PREVIEW, output, metadata, JobUpdate::new())
            .await
    }

    async fn run_train(&self, ctx: &WorkerContext, job: &Job) -> Result<Job> {
        self.pickup(job, progress::PICKUP).await?;
        let request = TrainRequest::from_params(&job.input_params)?;

        let paths: Vec<PathBuf> = self
            .store
            .list_samples(&request.voice_id)
            .await?
            .into_iter()
            .map(|s| s.normalized_path)
            .collect();
        if paths.is_empty() {
            return Err(Error::NoReferences {
                voice_id: request.voice_id.clone(),
            });
        }
        let summary = analyze_samples(paths.clone(), self.sample_rate).await?;

        let profile = self
            .store
            .create_profile(VoiceProfile::new(
                request.voice_id.clone(),
                request.profile_name.clone(),
            ))
            .await?;
        let profile_dir = self
            .paths
            .profiles_dir
            .join(&request.voice_id)
            .join(&profile.id);
        let cache = ProfileCache::new(ctx.engine.name(), &self.cloning_mode, &self.language);
        let meta = cache.build(&paths, &profile_dir).await?;
        let descriptor = ProfileCache::descriptor_path(&profile_dir);

        let mut params = Params::new();
        params.insert(REFERENCES_KEY.into(), json!(meta.references));
        params.insert("cache".into(), json!(descriptor));
        params.insert("fingerprint".into(), json!(meta.fingerprint));
        params.insert("energy".into(), json!(summary.energy));
        params.insert("pitch_hint".into(), json!(summary.pitch_hint));
        params.insert("strategy".into(), json!(PROFILE_STRATEGY));

        self.store
            .update_profile(
                &profile.id,
                ProfileUpdate {
                    status: Some(ProfileStatus::Ready),
                    params: Some(params.clone()),
                    model_path: Some(descriptor.clone()),
                },
            )
            .await?;
        tracing::info!(
            profile_id = %profile.id,
            references = meta.references.len(),
            "Profile ready"
        );

        self.finish(
            job,
            ARTIFACT_PROFILE,
            descriptor,
            params,
            JobUpdate::new().derive(PROFILE_ID_KEY, profile.id.clone()),
        )
        .await
    }
}

/// Preprocess and split the request text into synthesis chunks
///
/// Poem text is split into lines first and each line preprocessed on its
/// own; whitespace collapse would otherwise erase the line structure.
async fn prepare_utterances(frontend: &TextFrontend, request: &TtsRequest) -> Vec<Utterance> {
    let mut utterances = Vec::new();
    match request.mode {
        TextMode::Story => {
            let prepared = preprocess_for(frontend, &request.text, request).await;
            utterances.extend(split_story(&prepared).into_iter().map(Utterance::Text));
        }
        TextMode::Poem => {
            for item in split_poem(&request.text) {
                match item {
                    Utterance::Text(line) => {
                        let prepared = preprocess_for(frontend, &line, request).await;
                        if !prepared.is_empty() {
                            utterances.push(Utterance::Text(prepared));
                        }
                    }
                    Utterance::StanzaBreak => utterances.push(Utterance::StanzaBreak),
                }
            }
        }
    }

    utterances
        .into_iter()
        .map(|u| match u {
            Utterance::Text(text) => {
                Utterance::Text(to_stress_hint_format(&text, request.stress_format))
            }
            Utterance::StanzaBreak => Utterance::StanzaBreak,
        })
        .collect()
}

async fn preprocess_for(frontend: &TextFrontend, text: &str, request: &TtsRequest) -> String {
    frontend
        .preprocess(
            text,
            request.use_accenting,
            request.use_user_overrides,
            request.accent_mode,
        )
        .await
}

/// Chunks one per line, stanza breaks as blank lines
fn joined_text(utterances: &[Utterance]) -> String {
    utterances
        .iter()
        .map(|u| u.text().unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Mean energy and pitch hint over all samples, total duration
async fn analyze_samples(paths: Vec<PathBuf>, sample_rate: u32) -> Result<SampleAnalysis> {
    let analyses = tokio::task::spawn_blocking(move || {
        paths
            .iter()
            .map(|path| analyze_file(path, sample_rate))
            .collect::<std::result::Result<Vec<_>, _>>()
    })
    .await
    .map_err(|e| Error::Audio(format!("sample analysis task failed: {}", e)))??;

    let n = analyses.len().max(1) as f32;
    Ok(SampleAnalysis {
        energy: analyses.iter().map(|a| a.energy).sum::<f32>() / n,
        pitch_hint: analyses.iter().map(|a| a.pitch_hint).sum::<f32>() / n,
        duration_sec: analyses.iter().map(|a| a.duration_sec).sum(),
    })
}
