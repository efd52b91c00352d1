//! Persistence layer for voice rendering
//!
//! Provides [`JobStore`] implementations for:
//! - Process-local state ([`MemoryStore`]), used by tests and single-process runs
//! - JSON documents on disk ([`FileStore`]), shareable by workers on one host

pub mod error;
pub mod file;
pub mod memory;

pub use error::PersistenceError;
pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;
use voice_render_config::{StoreKind, StoreSettings};
use voice_render_core::JobStore;

/// Open the configured store
pub async fn init(settings: &StoreSettings) -> Result<Arc<dyn JobStore>, PersistenceError> {
    let store: Arc<dyn JobStore> = match settings.kind {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::File => Arc::new(FileStore::open(&settings.dir).await?),
    };
    tracing::info!(store = store.name(), "Persistence layer ready");
    Ok(store)
}
