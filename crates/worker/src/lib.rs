//! Voice render worker
//!
//! Drives preview, train and tts jobs from submission to a terminal state:
//! - [`JobQueue`]: three dispatch lanes keyed by job kind
//! - [`JobOrchestrator`]: per-kind flows, progress checkpoints, failure handling
//! - [`WorkerPool`]: long-lived workers pulling from the lanes
//! - [`JobTxn`]: staged job updates that commit or roll back as a unit

pub mod context;
pub mod orchestrator;
pub mod pool;
pub mod queue;
pub mod references;
pub mod telemetry;
pub mod txn;

pub use context::{build_accenter, WorkerContext};
pub use orchestrator::{synthesis_progress, JobOrchestrator};
pub use pool::{ContextFactory, WorkerPool};
pub use queue::{JobQueue, Lane, QueueReceivers};
pub use references::{fingerprint, resolve_latest_sample, resolve_references, ProfileCache, ProfileCacheMeta};
pub use telemetry::init_tracing;
pub use txn::JobTxn;
