//! Automatic stress placement capability

use async_trait::async_trait;

use crate::error::Result;

/// Places combining acute accents (U+0301) on words that lack them
///
/// Optional: callers hold an `Option<Arc<dyn Accenter>>` and treat `None`
/// as the identity function.
#[async_trait]
pub trait Accenter: Send + Sync {
    async fn accent(&self, text: &str) -> Result<String>;

    fn name(&self) -> &str;
}
