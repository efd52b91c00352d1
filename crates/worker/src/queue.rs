//! Dispatch lanes
//!
//! Three logically separate lanes keep long renders from starving previews.
//! Each lane is an unbounded channel whose receiving half is shared by the
//! lane's workers, so every job id is delivered to exactly one worker.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use voice_render_core::{Error, JobKind, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    Preview,
    Train,
    Render,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Preview, Lane::Train, Lane::Render];

    pub fn for_kind(kind: JobKind) -> Self {
        match kind {
            JobKind::Preview => Lane::Preview,
            JobKind::Train => Lane::Train,
            JobKind::Tts => Lane::Render,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lane::Preview => "preview",
            Lane::Train => "train",
            Lane::Render => "render",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiving half of a lane, shared by that lane's workers
pub type LaneReceiver = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>>;

struct Senders {
    preview: mpsc::UnboundedSender<String>,
    train: mpsc::UnboundedSender<String>,
    render: mpsc::UnboundedSender<String>,
}

impl Senders {
    fn lane(&self, lane: Lane) -> &mpsc::UnboundedSender<String> {
        match lane {
            Lane::Preview => &self.preview,
            Lane::Train => &self.train,
            Lane::Render => &self.render,
        }
    }
}

/// Sending side of the three lanes
pub struct JobQueue {
    senders: Mutex<Option<Senders>>,
}

/// Receiving sides, handed to the worker pool
pub struct QueueReceivers {
    pub preview: LaneReceiver,
    pub train: LaneReceiver,
    pub render: LaneReceiver,
}

impl QueueReceivers {
    pub fn lane(&self, lane: Lane) -> LaneReceiver {
        match lane {
            Lane::Preview => self.preview.clone(),
            Lane::Train => self.train.clone(),
            Lane::Render => self.render.clone(),
        }
    }
}

impl JobQueue {
    pub fn new() -> (Self, QueueReceivers) {
        let (preview, preview_rx) = mpsc::unbounded_channel();
        let (train, train_rx) = mpsc::unbounded_channel();
        let (render, render_rx) = mpsc::unbounded_channel();

        let queue = Self {
            senders: Mutex::new(Some(Senders {
                preview,
                train,
                render,
            })),
        };
        let receivers = QueueReceivers {
            preview: Arc::new(tokio::sync::Mutex::new(preview_rx)),
            train: Arc::new(tokio::sync::Mutex::new(train_rx)),
            render: Arc::new(tokio::sync::Mutex::new(render_rx)),
        };
        (queue, receivers)
    }

    /// Route a job id to its kind's lane
    pub fn enqueue(&self, kind: JobKind, job_id: &str) -> Result<Lane> {
        let lane = Lane::for_kind(kind);
        let senders = self.senders.lock();
        let sender = senders
            .as_ref()
            .ok_or_else(|| Error::Queue("queue is closed".into()))?
            .lane(lane);
        sender
            .send(job_id.to_string())
            .map_err(|_| Error::Queue(format!("{} lane has no workers", lane)))?;
        Ok(lane)
    }

    /// Stop accepting jobs; workers exit once their lane is drained
    pub fn close(&self) {
        if self.senders.lock().take().is_some() {
            tracing::info!("Job queue closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.senders.lock().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_routing() {
        assert_eq!(Lane::for_kind(JobKind::Preview), Lane::Preview);
        assert_eq!(Lane::for_kind(JobKind::Train), Lane::Train);
        assert_eq!(Lane::for_kind(JobKind::Tts), Lane::Render);
    }

    #[tokio::test]
    async fn test_enqueue_and_drain_after_close() {
        let (queue, receivers) = JobQueue::new();
        assert_eq!(queue.enqueue(JobKind::Tts, "j1").unwrap(), Lane::Render);
        queue.enqueue(JobKind::Preview, "j2").unwrap();
        queue.close();
        assert!(queue.is_closed());
        assert!(matches!(
            queue.enqueue(JobKind::Tts, "j3").unwrap_err(),
            Error::Queue(_)
        ));

        let mut render = receivers.render.lock().await;
        assert_eq!(render.recv().await.as_deref(), Some("j1"));
        assert_eq!(render.recv().await, None);

        let mut preview = receivers.preview.lock().await;
        assert_eq!(preview.recv().await.as_deref(), Some("j2"));
    }
}
