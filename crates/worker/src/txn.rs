//! Scoped job transaction
//!
//! Changes are staged locally and written in one store call on
//! [`JobTxn::commit`]. A transaction dropped without committing discards its
//! staged changes, which is how every early `?` return rolls back.

use voice_render_core::{Job, JobStore, JobUpdate, Result};

pub struct JobTxn<'a> {
    store: &'a dyn JobStore,
    job_id: &'a str,
    staged: JobUpdate,
    finished: bool,
}

impl<'a> JobTxn<'a> {
    pub fn begin(store: &'a dyn JobStore, job_id: &'a str) -> Self {
        Self {
            store,
            job_id,
            staged: JobUpdate::new(),
            finished: false,
        }
    }

    /// Stage field changes; later values win
    pub fn stage(mut self, update: JobUpdate) -> Self {
        self.staged.merge(update);
        self
    }

    pub fn staged(&self) -> &JobUpdate {
        &self.staged
    }

    /// Write the staged changes and return the committed row
    pub async fn commit(mut self) -> Result<Job> {
        self.finished = true;
        let update = std::mem::take(&mut self.staged);
        self.store.update_job(self.job_id, update).await
    }

    /// Discard the staged changes explicitly
    pub fn rollback(mut self) {
        self.finished = true;
        if !self.staged.is_empty() {
            tracing::debug!(job_id = self.job_id, "Job transaction rolled back");
        }
    }
}

impl Drop for JobTxn<'_> {
    fn drop(&mut self) {
        if !self.finished && !self.staged.is_empty() {
            tracing::debug!(job_id = self.job_id, "Uncommitted job changes discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_render_core::{JobKind, JobStatus, Params};
    use voice_render_persistence::MemoryStore;

    async fn pending_job(store: &MemoryStore) -> Job {
        store
            .create_job(Job::new(JobKind::Tts, Params::new()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_commit_applies_merged_changes() {
        let store = MemoryStore::new();
        let job = pending_job(&store).await;

        let committed = JobTxn::begin(&store, &job.id)
            .stage(JobUpdate::new().status(JobStatus::Running).progress(5))
            .stage(JobUpdate::new().progress(7).derive("chunks", 2))
            .commit()
            .await
            .unwrap();
        assert_eq!(committed.status, JobStatus::Running);
        assert_eq!(committed.progress, 7);
        assert_eq!(committed.derived["chunks"], 2);
    }

    #[tokio::test]
    async fn test_drop_discards() {
        let store = MemoryStore::new();
        let job = pending_job(&store).await;
        {
            let _txn = JobTxn::begin(&store, &job.id)
                .stage(JobUpdate::new().status(JobStatus::Running));
        }
        JobTxn::begin(&store, &job.id)
            .stage(JobUpdate::new().progress(1))
            .rollback();

        let row = store.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(row.status, JobStatus::Pending);
        assert_eq!(row.progress, 0);
    }

    #[tokio::test]
    async fn test_rejected_commit_surfaces_error() {
        let store = MemoryStore::new();
        let job = pending_job(&store).await;
        let err = JobTxn::begin(&store, &job.id)
            .stage(JobUpdate::new().status(JobStatus::Done))
            .commit()
            .await
            .unwrap_err();
        assert!(matches!(err, voice_render_core::Error::Transition(_)));
    }
}
